//! # Domain Errors

use thiserror::Error;

/// Certificate authority gateway errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// The authority refused the operation; the message is shown to the
    /// requester verbatim.
    #[error("{0}")]
    Rejected(String),

    /// The authority could not be reached or failed internally.
    #[error("certificate authority unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejected_is_verbatim() {
        let err = GatewayError::Rejected("invalid username 'a b'".to_string());
        assert_eq!(err.to_string(), "invalid username 'a b'");
    }

    #[test]
    fn test_unavailable_is_prefixed() {
        let err = GatewayError::Unavailable("disk full".to_string());
        assert_eq!(err.to_string(), "certificate authority unavailable: disk full");
    }
}
