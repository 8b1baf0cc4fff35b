//! # Domain Errors
//!
//! Error types for endpoint resolution. All of them are fatal at startup.

use shared_types::QueueRole;
use thiserror::Error;

/// Why a role could not be resolved to an endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// Discovery found no queue with the role's prefix.
    #[error("Could not find any SQS queues with the name prefix '{prefix}'.")]
    NotFound {
        /// Role being resolved
        role: QueueRole,
        /// Name prefix searched for
        prefix: String,
    },

    /// Discovery found more than one queue with the role's prefix.
    #[error(
        "Expected to find exactly one queue with prefix '{}' but found {}: [{}]. Please specify which queue URL to use using the {} argument.",
        .prefix,
        .candidates.len(),
        .candidates.join(" "),
        .flag
    )]
    Ambiguous {
        /// Role being resolved
        role: QueueRole,
        /// Name prefix searched for
        prefix: String,
        /// Every matching address
        candidates: Vec<String>,
        /// CLI flag the operator can use to pick one
        flag: &'static str,
    },

    /// An address was found but is not a well-formed URL.
    #[error("Invalid {role} queue URL '{address}': {reason}")]
    InvalidEndpoint {
        /// Role being resolved
        role: QueueRole,
        /// Offending address
        address: String,
        /// Why it was rejected
        reason: String,
    },

    /// Neither discovery nor the backup store could produce an address.
    #[error("Unable to discover the {role} queue: {reason}")]
    DiscoveryUnavailable {
        /// Role being resolved
        role: QueueRole,
        /// Collected failure reasons
        reason: String,
    },
}

impl ResolveError {
    /// Role the failed resolution was for.
    pub fn role(&self) -> QueueRole {
        match self {
            ResolveError::NotFound { role, .. }
            | ResolveError::Ambiguous { role, .. }
            | ResolveError::InvalidEndpoint { role, .. }
            | ResolveError::DiscoveryUnavailable { role, .. } => *role,
        }
    }
}

/// Queue enumeration could not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// Credentials lack permission to list queues.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The listing call failed.
    #[error("transport failure: {0}")]
    Transport(String),
}

/// Backup store lookup failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No container carries the configured tag.
    #[error("no backup container tagged {key}={value}")]
    ContainerNotFound {
        /// Tag key
        key: String,
        /// Tag value
        value: String,
    },

    /// The container exists but the object does not.
    #[error("object '{key}' not found in backup container '{container}'")]
    ObjectNotFound {
        /// Container searched
        container: String,
        /// Object key
        key: String,
    },

    /// The store could not be read.
    #[error("backup store I/O error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = ResolveError::NotFound {
            role: QueueRole::Request,
            prefix: "openvpn-requests-".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Could not find any SQS queues with the name prefix 'openvpn-requests-'."
        );
    }

    #[test]
    fn test_ambiguous_message_names_candidates() {
        let err = ResolveError::Ambiguous {
            role: QueueRole::Request,
            prefix: "openvpn-requests-".to_string(),
            candidates: vec![
                "q://openvpn-requests-a".to_string(),
                "q://openvpn-requests-b".to_string(),
            ],
            flag: "--request-url",
        };
        let text = err.to_string();
        assert!(text.contains("but found 2: [q://openvpn-requests-a q://openvpn-requests-b]"));
        assert!(text.ends_with("using the --request-url argument."));
        assert_eq!(err.role(), QueueRole::Request);
    }

    #[test]
    fn test_store_error_message() {
        let err = StoreError::ContainerNotFound {
            key: "OpenVPNRole".to_string(),
            value: "BackupBucket".to_string(),
        };
        assert_eq!(err.to_string(), "no backup container tagged OpenVPNRole=BackupBucket");
    }
}
