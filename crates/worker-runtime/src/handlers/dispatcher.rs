//! # Dispatcher
//!
//! Drives one work queue: Receive -> Process -> Reply -> Acknowledge.
//!
//! ## Ordering
//!
//! A message is deleted only after its reply was sent. If the worker dies
//! between the two, the message is redelivered and the processor's
//! existence check turns the retry into a duplicate reply instead of a
//! second certificate.
//!
//! ## Failure policy
//!
//! - Receive errors are retried forever with a capped backoff.
//! - Undecodable bodies with no reply address are logged and deleted.
//! - Anything that goes wrong while replying or acknowledging stops the loop.

use crate::handlers::{Backoff, BackoffConfig, WorkerError};
use pr_01_queue_transport::{clamp_wait, QueueTransport};
use pr_04_request_processor::RequestProcessing;
use relay_telemetry::{
    metric_inc, BACKOFF_DELAY_SECONDS, CYCLE_DURATION, MESSAGES_DROPPED, MESSAGES_RECEIVED,
    RECEIVE_FAILURES, REPLIES_SENT,
};
use shared_types::{DecodeError, Endpoint, QueueMessage};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The long-poll returned without a message.
    Idle,
    /// Receive failed; the cycle slept for `delay` before returning.
    ReceiveFailed {
        /// Backoff that was applied
        delay: Duration,
    },
    /// A reply was sent and the message acknowledged.
    Replied {
        /// Whether the reply reported success
        success: bool,
    },
    /// An undecodable message was acknowledged without a reply.
    Dropped,
}

/// Single-queue worker loop.
pub struct Dispatcher {
    transport: Arc<dyn QueueTransport>,
    processor: Arc<dyn RequestProcessing>,
    queue: Endpoint,
    wait: Duration,
    backoff: Backoff,
}

impl Dispatcher {
    /// Create a dispatcher for `queue`. `wait` is clamped to the long-poll
    /// maximum.
    pub fn new(
        transport: Arc<dyn QueueTransport>,
        processor: Arc<dyn RequestProcessing>,
        queue: Endpoint,
        wait: Duration,
        backoff: BackoffConfig,
    ) -> Self {
        Self {
            transport,
            processor,
            queue,
            wait: clamp_wait(wait),
            backoff: Backoff::new(backoff),
        }
    }

    /// Work queue being served.
    pub fn queue(&self) -> &Endpoint {
        &self.queue
    }

    /// Serve the queue until something fatal happens.
    pub async fn run(mut self) -> WorkerError {
        info!(
            role = %self.processor.role(),
            queue = %self.queue,
            wait_secs = self.wait.as_secs(),
            "[worker] Dispatcher started"
        );
        loop {
            if let Err(err) = self.run_cycle().await {
                error!(role = %self.processor.role(), error = %err, "[worker] Dispatcher stopped");
                return err;
            }
        }
    }

    /// Run one Receive -> Process -> Reply -> Acknowledge cycle.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, WorkerError> {
        let role = self.processor.role().as_str();

        let message = match self.transport.receive(&self.queue, self.wait).await {
            Ok(Some(message)) => {
                self.backoff.reset();
                message
            }
            Ok(None) => {
                self.backoff.reset();
                debug!(role, "[worker] No messages");
                return Ok(CycleOutcome::Idle);
            }
            Err(err) => {
                let delay = self.backoff.next_delay();
                metric_inc!(RECEIVE_FAILURES, &[role]);
                BACKOFF_DELAY_SECONDS.set(delay.as_secs_f64());
                warn!(
                    role,
                    attempt = self.backoff.failures(),
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "[worker] Failed to receive messages, backing off"
                );
                tokio::time::sleep(delay).await;
                return Ok(CycleOutcome::ReceiveFailed { delay });
            }
        };
        BACKOFF_DELAY_SECONDS.set(0.0);
        metric_inc!(MESSAGES_RECEIVED, &[role]);
        let started = Instant::now();

        let reply = match self.processor.process(&message.body).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(role, error = %err, "[worker] Dropping undecodable message");
                metric_inc!(MESSAGES_DROPPED, &[role, drop_reason(&err)]);
                self.acknowledge(&message).await?;
                return Ok(CycleOutcome::Dropped);
            }
        };

        let destination =
            Endpoint::parse(&reply.response_queue).map_err(|e| WorkerError::UndeliverableReply {
                address: reply.response_queue.clone(),
                reason: e.to_string(),
            })?;
        let body = reply
            .response
            .encode()
            .map_err(|e| WorkerError::Encode(e.to_string()))?;

        self.transport
            .send(&destination, &body)
            .await
            .map_err(|source| WorkerError::ReplyFailed {
                response_queue: destination.to_string(),
                source,
            })?;

        let success = reply.response.is_success();
        let outcome = if success { "success" } else { "failure" };
        metric_inc!(REPLIES_SENT, &[role, outcome]);
        info!(role, response_queue = %destination, outcome, "[worker] Reply sent");

        self.acknowledge(&message).await?;
        CYCLE_DURATION.observe(started.elapsed().as_secs_f64());

        Ok(CycleOutcome::Replied { success })
    }

    async fn acknowledge(&self, message: &QueueMessage) -> Result<(), WorkerError> {
        self.transport
            .delete(&self.queue, &message.receipt)
            .await
            .map_err(|source| WorkerError::AcknowledgeFailed {
                queue: self.queue.to_string(),
                source,
            })?;
        debug!(receipt = %message.receipt, "[worker] Message acknowledged");
        Ok(())
    }
}

fn drop_reason(err: &DecodeError) -> &'static str {
    match err {
        DecodeError::Malformed { .. } => "malformed",
        DecodeError::MissingResponseQueue => "missing_response_queue",
        DecodeError::MissingUsername { .. } => "missing_username",
    }
}
