//! # Core Queue Entities
//!
//! - **Roles**: `QueueRole` names the logical queue a worker serves.
//! - **Addresses**: `Endpoint` is a validated queue address.
//! - **Messages**: `QueueMessage` pairs a body with its receipt capability.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::EndpointError;

/// Logical queue role a worker is bound to for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueRole {
    /// Certificate issuance requests.
    Request,
    /// Certificate revocation requests.
    Revoke,
}

impl QueueRole {
    /// Lowercase role name as used in logs and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueRole::Request => "request",
            QueueRole::Revoke => "revoke",
        }
    }

    /// The command-line flag an operator uses to pin this role's endpoint.
    pub fn override_flag(&self) -> &'static str {
        match self {
            QueueRole::Request => "--request-url",
            QueueRole::Revoke => "--revoke-url",
        }
    }
}

impl fmt::Display for QueueRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A queue address that passed the well-formedness check.
///
/// The check is deliberately generic: the address must parse as an absolute
/// URL with a scheme and a non-empty host. Transport-specific validation is
/// left to the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint(String);

impl Endpoint {
    /// Validate `address` and wrap it.
    pub fn parse(address: &str) -> Result<Self, EndpointError> {
        let trimmed = address.trim();
        if trimmed.is_empty() {
            return Err(EndpointError::Empty);
        }

        let url = Url::parse(trimmed).map_err(|e| EndpointError::Malformed {
            address: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        match url.host_str() {
            Some(host) if !host.is_empty() => Ok(Self(trimmed.to_string())),
            _ => Err(EndpointError::Malformed {
                address: trimmed.to_string(),
                reason: "missing host".to_string(),
            }),
        }
    }

    /// Whether `address` would be accepted by [`Endpoint::parse`].
    pub fn is_well_formed(address: &str) -> bool {
        Self::parse(address).is_ok()
    }

    /// The raw address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The final path segment, which for SQS-style URLs is the queue name.
    pub fn queue_name(&self) -> &str {
        self.0
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Endpoint {
    type Error = EndpointError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.0
    }
}

/// Opaque token proving a message was received.
///
/// Must be redeemed with a delete before the visibility window closes, or the
/// message becomes visible to other receivers again.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Receipt(String);

impl Receipt {
    /// Wrap a transport-issued receipt handle.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// The raw handle, as the transport expects it back.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Receipt handles are long; the prefix is enough to correlate logs.
        let prefix: String = self.0.chars().take(12).collect();
        write!(f, "{prefix}…")
    }
}

/// A message taken off a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Capability to acknowledge this delivery.
    pub receipt: Receipt,
    /// Raw message body.
    pub body: String,
}

impl QueueMessage {
    /// Create a message from its parts.
    pub fn new(receipt: Receipt, body: impl Into<String>) -> Self {
        Self {
            receipt,
            body: body.into(),
        }
    }
}
