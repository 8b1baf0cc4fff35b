//! # Resolver Configuration

use serde::{Deserialize, Serialize};
use shared_types::QueueRole;

/// Default name prefix of request queues.
pub const REQUEST_QUEUE_PREFIX: &str = "openvpn-requests-";

/// Default name prefix of revocation queues.
pub const REVOKE_QUEUE_PREFIX: &str = "openvpn-revocations-";

/// Tag identifying the backup container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupTag {
    /// Tag key
    pub key: String,
    /// Tag value
    pub value: String,
}

impl BackupTag {
    /// Parse `key=value`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (key, value) = raw.split_once('=')?;
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

/// Queue resolver configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Name prefix of request queues.
    pub request_prefix: String,

    /// Name prefix of revocation queues.
    pub revoke_prefix: String,

    /// Only accept discovered queues owned by this account.
    pub account_scope: Option<String>,

    /// Tag of the backup container used when discovery cannot run.
    pub backup_tag: Option<BackupTag>,

    /// Object holding the request queue address in the backup container.
    pub request_object_key: String,

    /// Object holding the revocation queue address in the backup container.
    pub revoke_object_key: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            request_prefix: REQUEST_QUEUE_PREFIX.to_string(),
            revoke_prefix: REVOKE_QUEUE_PREFIX.to_string(),
            account_scope: None,
            backup_tag: None,
            request_object_key: "queues/request-queue-url".to_string(),
            revoke_object_key: "queues/revoke-queue-url".to_string(),
        }
    }
}

impl ResolverConfig {
    /// Create a config for testing with a backup tag configured.
    pub fn for_testing() -> Self {
        Self {
            backup_tag: Some(BackupTag {
                key: "relay-role".to_string(),
                value: "backup".to_string(),
            }),
            ..Self::default()
        }
    }

    /// Name prefix for `role`.
    pub fn prefix(&self, role: QueueRole) -> &str {
        match role {
            QueueRole::Request => &self.request_prefix,
            QueueRole::Revoke => &self.revoke_prefix,
        }
    }

    /// Backup object key for `role`.
    pub fn object_key(&self, role: QueueRole) -> &str {
        match role {
            QueueRole::Request => &self.request_object_key,
            QueueRole::Revoke => &self.revoke_object_key,
        }
    }

    /// Scope discovery to the account named in an IAM role ARN.
    ///
    /// `arn:aws:iam::123456789012:role/openvpn` yields `123456789012`.
    pub fn with_role_arn(mut self, role_arn: &str) -> Self {
        self.account_scope = account_from_role_arn(role_arn);
        self
    }
}

/// Account id field of an ARN, if it has one.
pub fn account_from_role_arn(arn: &str) -> Option<String> {
    let account = arn.trim().split(':').nth(4)?;
    let valid = account.len() == 12 && account.bytes().all(|b| b.is_ascii_digit());
    valid.then(|| account.to_string())
}
