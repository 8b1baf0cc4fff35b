//! # Inbound Ports (Driving Ports)
//!
//! The API every queue transport exposes.

use crate::domain::TransportError;
use async_trait::async_trait;
use shared_types::{Endpoint, QueueMessage, Receipt};
use std::time::Duration;

/// Queue transport API.
///
/// Implementations must be safe to share across tasks. Cancelling a pending
/// `receive` future must not lose a message: a message is only leased once
/// the future resolves with it.
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Wait up to `wait` for one message on `endpoint`.
    ///
    /// Returns `Ok(None)` when the wait elapsed without a message. The wait
    /// is clamped to [`crate::MAX_WAIT_SECONDS`].
    async fn receive(
        &self,
        endpoint: &Endpoint,
        wait: Duration,
    ) -> Result<Option<QueueMessage>, TransportError>;

    /// Deliver `body` to `endpoint`.
    async fn send(&self, endpoint: &Endpoint, body: &str) -> Result<(), TransportError>;

    /// Acknowledge a received message so it is never redelivered.
    ///
    /// Redeeming an already-redeemed or expired receipt succeeds.
    async fn delete(&self, endpoint: &Endpoint, receipt: &Receipt) -> Result<(), TransportError>;
}
