//! # Reply Protocol
//!
//! Wire schema for the request and reply queues.
//!
//! ```text
//! request queue:  {"username": "alice", "responseQueue": "https://.../reply-queue"}
//! reply queue:    {"success": true,  "body": "-----BEGIN CERTIFICATE-----...",
//!                  "errorMessage": ""}
//!                 {"success": false, "body": "",
//!                  "errorMessage": "a valid certificate for alice already exists"}
//! ```
//!
//! Exactly one of `body` and `errorMessage` is populated; the other is sent
//! as an empty string. Missing fields default to empty when decoding.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::DecodeError;

/// A PKI operation requested for one client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRequest {
    /// The PKI subject.
    pub username: String,
    /// Where the reply must be sent.
    #[serde(rename = "responseQueue")]
    pub response_queue: String,
}

impl CertificateRequest {
    /// Create a request.
    pub fn new(username: impl Into<String>, response_queue: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            response_queue: response_queue.into(),
        }
    }

    /// Decode an inbound message body.
    ///
    /// Missing or empty fields are errors, never defaults. The response
    /// address is recovered whenever possible so the failure can be reported.
    pub fn decode(body: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(body).map_err(|e| DecodeError::Malformed {
            reason: e.to_string(),
        })?;

        let Value::Object(fields) = value else {
            return Err(DecodeError::Malformed {
                reason: "expected a JSON object".to_string(),
            });
        };

        let text_field = |name: &str| {
            fields
                .get(name)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let response_queue =
            text_field("responseQueue").ok_or(DecodeError::MissingResponseQueue)?;
        let username =
            text_field("username").ok_or_else(|| DecodeError::MissingUsername {
                response_queue: response_queue.clone(),
            })?;

        Ok(Self {
            username,
            response_queue,
        })
    }

    /// Encode for the request queue.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Outcome of a PKI operation, as delivered on the reply queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateResponse {
    success: bool,
    #[serde(default)]
    body: String,
    #[serde(rename = "errorMessage", default)]
    error_message: String,
}

impl CertificateResponse {
    /// A successful outcome carrying `body` (a PEM bundle for issuance).
    pub fn success(body: impl Into<String>) -> Self {
        Self {
            success: true,
            body: body.into(),
            error_message: String::new(),
        }
    }

    /// A failed outcome carrying a human-readable reason.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            body: String::new(),
            error_message: message.into(),
        }
    }

    /// Whether the operation succeeded.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Success payload; empty on failure.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Failure reason; empty on success.
    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    /// Encode for the reply queue.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decode a reply body (used by the submitting client).
    pub fn decode(body: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(body).map_err(|e| DecodeError::Malformed {
            reason: e.to_string(),
        })
    }
}

/// A response paired with the address it must be delivered to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Raw `responseQueue` from the request; validated by the dispatcher.
    pub response_queue: String,
    /// What to deliver.
    pub response: CertificateResponse,
}

impl Reply {
    /// Pair a response with its destination.
    pub fn new(response_queue: impl Into<String>, response: CertificateResponse) -> Self {
        Self {
            response_queue: response_queue.into(),
            response,
        }
    }
}
