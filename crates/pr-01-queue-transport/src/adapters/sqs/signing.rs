//! # SigV4 Signing
//!
//! Signs SQS JSON-protocol POST requests.
//!
//! The canonical request always has the same shape for this protocol: path
//! `/`, no query string, and a fixed set of signed headers.

use crate::domain::TransportError;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Content type used by every JSON-protocol request.
pub const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.0";

/// Static credentials.
#[derive(Clone)]
pub struct Credentials {
    /// Access key id
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Session token for temporary credentials
    pub session_token: Option<String>,
}

impl Credentials {
    /// Build credentials from explicit values.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }

    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the optional
    /// `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self, TransportError> {
        let read = |name: &str| {
            std::env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let access_key_id = read("AWS_ACCESS_KEY_ID")
            .ok_or_else(|| TransportError::Signing("AWS_ACCESS_KEY_ID is not set".to_string()))?;
        let secret_access_key = read("AWS_SECRET_ACCESS_KEY").ok_or_else(|| {
            TransportError::Signing("AWS_SECRET_ACCESS_KEY is not set".to_string())
        })?;

        Ok(Self::new(
            access_key_id,
            secret_access_key,
            read("AWS_SESSION_TOKEN"),
        ))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// SigV4 signer bound to one region and service.
#[derive(Debug, Clone)]
pub struct SigV4Signer {
    credentials: Credentials,
    region: String,
    service: String,
}

impl SigV4Signer {
    /// Signer for the SQS service in `region`.
    pub fn new(credentials: Credentials, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: "sqs".to_string(),
        }
    }

    /// Compute the headers to add to a JSON-protocol request.
    ///
    /// Returns `x-amz-date`, `x-amz-security-token` when a session token is
    /// present, and `authorization`. The caller must send `content-type`
    /// and `x-amz-target` exactly as passed here.
    pub fn sign(
        &self,
        host: &str,
        target: &str,
        payload: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<(&'static str, String)>, TransportError> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();

        let mut canonical_headers = vec![
            ("content-type", JSON_CONTENT_TYPE.to_string()),
            ("host", host.to_string()),
            ("x-amz-date", amz_date.clone()),
        ];
        if let Some(token) = &self.credentials.session_token {
            canonical_headers.push(("x-amz-security-token", token.clone()));
        }
        canonical_headers.push(("x-amz-target", target.to_string()));

        let signed_headers = canonical_headers
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(";");
        let header_block: String = canonical_headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
            .collect();

        let canonical_request = format!(
            "POST\n/\n\n{}\n{}\n{}",
            header_block,
            signed_headers,
            sha256_hex(payload.as_bytes())
        );

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, self.service);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let key = derive_signing_key(
            &self.credentials.secret_access_key,
            &date,
            &self.region,
            &self.service,
        )?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.credentials.access_key_id, scope, signed_headers, signature
        );

        let mut headers = vec![("x-amz-date", amz_date)];
        if let Some(token) = &self.credentials.session_token {
            headers.push(("x-amz-security-token", token.clone()));
        }
        headers.push(("authorization", authorization));
        Ok(headers)
    }
}

/// Derive the SigV4 signing key for one day, region and service.
pub fn derive_signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, TransportError> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, TransportError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| TransportError::Signing(format!("invalid HMAC key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
