//! # Worker Errors
//!
//! Everything that stops a worker. Business failures never appear here;
//! they travel inside the reply.

use crate::container::ConfigError;
use pr_01_queue_transport::TransportError;
use pr_02_queue_resolver::ResolveError;
use thiserror::Error;

/// Exit code for configuration and startup failures.
pub const EXIT_CONFIGURATION: i32 = 2;

/// Exit code for failures after a message was taken off the queue.
pub const EXIT_REPLY_PHASE: i32 = 3;

/// Terminal worker error.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The work queue could not be resolved.
    #[error(transparent)]
    Configuration(#[from] ResolveError),

    /// Flags and environment did not form a valid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A collaborator could not be constructed.
    #[error("startup failed: {0}")]
    Startup(String),

    /// The request named a reply address that is not a usable endpoint.
    #[error("reply address '{address}' is unusable: {reason}")]
    UndeliverableReply {
        /// Address taken from the request
        address: String,
        /// Why it was rejected
        reason: String,
    },

    /// The reply could not be serialized.
    #[error("failed to encode reply: {0}")]
    Encode(String),

    /// The reply could not be sent.
    #[error("failed to send reply to {response_queue}: {source}")]
    ReplyFailed {
        /// Destination of the reply
        response_queue: String,
        /// Transport failure
        #[source]
        source: TransportError,
    },

    /// The request was answered but could not be deleted.
    #[error("failed to acknowledge message from {queue}: {source}")]
    AcknowledgeFailed {
        /// Work queue the message came from
        queue: String,
        /// Transport failure
        #[source]
        source: TransportError,
    },
}

impl WorkerError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            WorkerError::Configuration(_)
            | WorkerError::InvalidConfig(_)
            | WorkerError::Startup(_) => EXIT_CONFIGURATION,
            WorkerError::UndeliverableReply { .. }
            | WorkerError::Encode(_)
            | WorkerError::ReplyFailed { .. }
            | WorkerError::AcknowledgeFailed { .. } => EXIT_REPLY_PHASE,
        }
    }
}
