//! # Submit Client
//!
//! The caller side of the protocol: put a request on a work queue and wait
//! for the reply on a response queue the caller owns.

use pr_01_queue_transport::{clamp_wait, QueueTransport, TransportError};
use shared_types::{CertificateRequest, CertificateResponse, Endpoint};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Why a submission did not produce a reply.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The request could not be serialized.
    #[error("failed to encode request: {0}")]
    Encode(String),

    /// The request could not be sent.
    #[error("failed to send request to {queue}: {source}")]
    Send {
        /// Work queue
        queue: String,
        /// Transport failure
        #[source]
        source: TransportError,
    },

    /// Polling or acknowledging the response queue failed.
    #[error("failed to read reply from {queue}: {source}")]
    Receive {
        /// Response queue
        queue: String,
        /// Transport failure
        #[source]
        source: TransportError,
    },

    /// Nothing arrived before the deadline.
    #[error("no reply on {queue} within {waited_secs}s")]
    TimedOut {
        /// Response queue
        queue: String,
        /// How long the client waited
        waited_secs: u64,
    },
}

/// Sends requests and waits for their replies.
pub struct SubmitClient {
    transport: Arc<dyn QueueTransport>,
    poll_wait: Duration,
}

impl SubmitClient {
    /// Client polling with `poll_wait` per receive.
    pub fn new(transport: Arc<dyn QueueTransport>, poll_wait: Duration) -> Self {
        Self {
            transport,
            poll_wait: clamp_wait(poll_wait),
        }
    }

    /// Send a request for `username` to `work_queue` and wait up to
    /// `deadline` for the reply on `response_queue`.
    ///
    /// Replies that do not decode are acknowledged and skipped.
    pub async fn submit(
        &self,
        work_queue: &Endpoint,
        username: &str,
        response_queue: &Endpoint,
        deadline: Duration,
    ) -> Result<CertificateResponse, SubmitError> {
        let request = CertificateRequest::new(username, response_queue.as_str());
        let body = request
            .encode()
            .map_err(|e| SubmitError::Encode(e.to_string()))?;

        self.transport
            .send(work_queue, &body)
            .await
            .map_err(|source| SubmitError::Send {
                queue: work_queue.to_string(),
                source,
            })?;
        info!(username, queue = %work_queue, "[worker] Request submitted");

        self.await_reply(response_queue, deadline).await
    }

    async fn await_reply(
        &self,
        response_queue: &Endpoint,
        deadline: Duration,
    ) -> Result<CertificateResponse, SubmitError> {
        let started = Instant::now();
        let give_up_at = started + deadline;
        let receive_error = |source| SubmitError::Receive {
            queue: response_queue.to_string(),
            source,
        };

        loop {
            let remaining = give_up_at.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SubmitError::TimedOut {
                    queue: response_queue.to_string(),
                    waited_secs: started.elapsed().as_secs(),
                });
            }

            let Some(message) = self
                .transport
                .receive(response_queue, remaining.min(self.poll_wait))
                .await
                .map_err(receive_error)?
            else {
                debug!(queue = %response_queue, "[worker] Still waiting for reply");
                continue;
            };

            self.transport
                .delete(response_queue, &message.receipt)
                .await
                .map_err(receive_error)?;

            match CertificateResponse::decode(&message.body) {
                Ok(response) => return Ok(response),
                Err(err) => warn!(error = %err, "[worker] Skipping undecodable reply"),
            }
        }
    }
}
