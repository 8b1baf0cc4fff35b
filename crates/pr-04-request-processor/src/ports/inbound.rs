//! # Inbound Ports

use async_trait::async_trait;
use shared_types::{DecodeError, QueueRole, Reply};

/// Request processing API.
#[async_trait]
pub trait RequestProcessing: Send + Sync {
    /// Which queue role this processor serves.
    fn role(&self) -> QueueRole;

    /// Process one raw message body.
    ///
    /// Returns `Err` only when no reply address can be recovered from the
    /// body; every other failure is carried inside the reply.
    async fn process(&self, raw_body: &str) -> Result<Reply, DecodeError>;
}
