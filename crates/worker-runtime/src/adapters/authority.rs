//! # Authority Gateway Adapter
//!
//! Exposes the file-backed certificate authority (pr-03) to the request
//! processor (pr-04). The authority does blocking file and key work, so
//! every call runs on the blocking pool.

use async_trait::async_trait;
use pr_03_certificate_authority::{AuthorityError, CertificateAuthorityService};
use pr_04_request_processor::{CertificateAuthorityGateway, GatewayError};
use relay_telemetry::{metric_inc, CERTIFICATES_ISSUED, CERTIFICATES_REVOKED};
use std::sync::Arc;
use tracing::debug;

/// Adapter implementing [`CertificateAuthorityGateway`].
#[derive(Clone)]
pub struct AuthorityGatewayAdapter {
    authority: Arc<CertificateAuthorityService>,
}

impl AuthorityGatewayAdapter {
    /// Wrap an opened authority.
    pub fn new(authority: Arc<CertificateAuthorityService>) -> Self {
        Self { authority }
    }

    async fn run_blocking<T, F>(&self, op: F) -> Result<T, GatewayError>
    where
        T: Send + 'static,
        F: FnOnce(&CertificateAuthorityService) -> Result<T, AuthorityError> + Send + 'static,
    {
        let authority = Arc::clone(&self.authority);
        tokio::task::spawn_blocking(move || op(&authority))
            .await
            .map_err(|e| GatewayError::Unavailable(format!("authority task failed: {}", e)))?
            .map_err(into_gateway_error)
    }
}

/// Business refusals travel back to the caller verbatim; storage and
/// crypto faults are reported as the authority being unavailable.
fn into_gateway_error(err: AuthorityError) -> GatewayError {
    match err {
        AuthorityError::InvalidUsername { .. }
        | AuthorityError::AlreadyIssued(_)
        | AuthorityError::NotIssued(_) => GatewayError::Rejected(err.to_string()),
        AuthorityError::Storage { .. }
        | AuthorityError::CorruptIndex { .. }
        | AuthorityError::Crypto(_) => GatewayError::Unavailable(err.to_string()),
    }
}

#[async_trait]
impl CertificateAuthorityGateway for AuthorityGatewayAdapter {
    async fn has_valid_certificate(&self, username: &str) -> Result<bool, GatewayError> {
        let username = username.to_string();
        self.run_blocking(move |authority| authority.has_valid_certificate(&username))
            .await
    }

    async fn issue(&self, username: &str) -> Result<String, GatewayError> {
        let owned = username.to_string();
        let issued = self
            .run_blocking(move |authority| authority.issue(&owned))
            .await?;
        metric_inc!(CERTIFICATES_ISSUED);
        debug!(username, serial = %issued.serial, "[worker] Returning certificate bundle");
        Ok(issued.bundle_pem())
    }

    async fn revoke(&self, username: &str) -> Result<(), GatewayError> {
        let owned = username.to_string();
        let serials = self
            .run_blocking(move |authority| authority.revoke(&owned))
            .await?;
        metric_inc!(CERTIFICATES_REVOKED);
        debug!(username, serials = ?serials, "[worker] Certificate revoked");
        Ok(())
    }
}
