//! # Outbound Ports
//!
//! The certificate authority as seen by the processor.

use crate::domain::{missing_certificate_message, GatewayError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Certificate authority gateway - outbound port.
#[async_trait]
pub trait CertificateAuthorityGateway: Send + Sync {
    /// Whether `username` holds a valid, unexpired certificate.
    async fn has_valid_certificate(&self, username: &str) -> Result<bool, GatewayError>;

    /// Issue a certificate for `username`, returning it as PEM.
    async fn issue(&self, username: &str) -> Result<String, GatewayError>;

    /// Revoke the certificate held by `username`.
    async fn revoke(&self, username: &str) -> Result<(), GatewayError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock authority tracking issued identities in memory.
#[derive(Default)]
pub struct MockAuthority {
    pub(crate) valid: Mutex<HashSet<String>>,
    /// Fail every existence check.
    pub fail_checks: bool,
    /// Fail every issuance.
    pub fail_issue: bool,
    pub(crate) check_calls: AtomicUsize,
    pub(crate) issue_calls: AtomicUsize,
    pub(crate) revoke_calls: AtomicUsize,
}

impl MockAuthority {
    /// Authority with no certificates.
    pub fn new() -> Self {
        Self::default()
    }

    /// Authority where `usernames` already hold certificates.
    pub fn with_issued<I, S>(usernames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let authority = Self::default();
        authority
            .valid
            .lock()
            .extend(usernames.into_iter().map(Into::into));
        authority
    }

    /// PEM the mock returns for `username`.
    pub fn pem_for(username: &str) -> String {
        format!(
            "-----BEGIN CERTIFICATE-----\nMOCK-{}\n-----END CERTIFICATE-----\n",
            username
        )
    }

    /// Whether `username` currently holds a certificate.
    pub fn holds(&self, username: &str) -> bool {
        self.valid.lock().contains(username)
    }

    /// Number of `has_valid_certificate` calls.
    pub fn check_calls(&self) -> usize {
        self.check_calls.load(Ordering::SeqCst)
    }

    /// Number of `issue` calls.
    pub fn issue_calls(&self) -> usize {
        self.issue_calls.load(Ordering::SeqCst)
    }

    /// Number of `revoke` calls.
    pub fn revoke_calls(&self) -> usize {
        self.revoke_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CertificateAuthorityGateway for MockAuthority {
    async fn has_valid_certificate(&self, username: &str) -> Result<bool, GatewayError> {
        self.check_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_checks {
            return Err(GatewayError::Unavailable("mock check failure".to_string()));
        }
        Ok(self.holds(username))
    }

    async fn issue(&self, username: &str) -> Result<String, GatewayError> {
        self.issue_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_issue {
            return Err(GatewayError::Unavailable("mock issue failure".to_string()));
        }
        self.valid.lock().insert(username.to_string());
        Ok(Self::pem_for(username))
    }

    async fn revoke(&self, username: &str) -> Result<(), GatewayError> {
        self.revoke_calls.fetch_add(1, Ordering::SeqCst);
        if self.valid.lock().remove(username) {
            Ok(())
        } else {
            Err(GatewayError::Rejected(missing_certificate_message(username)))
        }
    }
}
