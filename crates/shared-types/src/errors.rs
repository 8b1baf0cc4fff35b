//! # Error Types
//!
//! Errors shared by the protocol and entity types.

use thiserror::Error;

/// An address failed the well-formedness check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EndpointError {
    /// Nothing to validate.
    #[error("endpoint address is empty")]
    Empty,

    /// Not an absolute URL with a host.
    #[error("endpoint address '{address}' is not a valid URL: {reason}")]
    Malformed {
        /// The rejected address.
        address: String,
        /// Parser explanation.
        reason: String,
    },
}

/// An inbound message body could not be turned into a request.
///
/// Carries the response address when one could still be read from the body,
/// so the caller can be told about the failure instead of silently dropping it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Body is not a JSON object.
    #[error("malformed request body: {reason}")]
    Malformed {
        /// Parser explanation.
        reason: String,
    },

    /// No `responseQueue` field, or it is empty.
    #[error("request is missing the responseQueue field")]
    MissingResponseQueue,

    /// No `username` field, or it is empty.
    #[error("request is missing the username field")]
    MissingUsername {
        /// Address the failure reply goes to.
        response_queue: String,
    },
}

impl DecodeError {
    /// The response address recovered from the body, if any.
    pub fn response_queue(&self) -> Option<&str> {
        match self {
            DecodeError::MissingUsername { response_queue } => Some(response_queue),
            DecodeError::Malformed { .. } | DecodeError::MissingResponseQueue => None,
        }
    }
}
