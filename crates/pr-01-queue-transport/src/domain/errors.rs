//! # Domain Errors
//!
//! Error types for queue transport.

use thiserror::Error;

/// Queue transport error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request never produced a usable HTTP response.
    #[error("HTTP request to {endpoint} failed: {reason}")]
    Http {
        /// Service endpoint the request was sent to
        endpoint: String,
        /// Underlying client error
        reason: String,
    },

    /// The addressed queue does not exist.
    #[error("Queue does not exist: {0}")]
    QueueDoesNotExist(String),

    /// The caller is not allowed to perform the action.
    #[error("Access denied for {action}: {message}")]
    AccessDenied {
        /// Queue service action, e.g. `ListQueues`
        action: String,
        /// Service-provided explanation
        message: String,
    },

    /// The service returned an error not covered above.
    #[error("{action} rejected with {code}: {message}")]
    Service {
        /// Queue service action
        action: String,
        /// Short error code, e.g. `InvalidParameterValue`
        code: String,
        /// Service-provided explanation
        message: String,
    },

    /// The service answered with something we could not read.
    #[error("Failed to parse {action} response: {reason}")]
    Parse {
        /// Queue service action
        action: String,
        /// Deserializer error
        reason: String,
    },

    /// No credentials to sign with, or signing failed.
    #[error("Request signing failed: {0}")]
    Signing(String),

    /// The transport is temporarily unable to serve requests.
    #[error("Transport unavailable: {0}")]
    Unavailable(String),
}

impl TransportError {
    /// Whether discovery should give up on this transport and use a fallback.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, TransportError::AccessDenied { .. })
    }
}
