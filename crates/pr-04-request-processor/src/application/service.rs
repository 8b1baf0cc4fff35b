//! # Request Processor Service
//!
//! One decode, one existence check, at most one authority mutation.

use crate::domain::{
    duplicate_certificate_message, missing_certificate_message, revoked_confirmation,
    MISSING_USERNAME_MESSAGE,
};
use crate::ports::{CertificateAuthorityGateway, RequestProcessing};
use async_trait::async_trait;
use shared_types::{CertificateRequest, CertificateResponse, DecodeError, QueueRole, Reply};
use std::sync::Arc;
use tracing::{info, warn};

/// Processes request or revocation messages against a certificate authority.
pub struct RequestProcessor {
    role: QueueRole,
    authority: Arc<dyn CertificateAuthorityGateway>,
}

impl RequestProcessor {
    /// Processor for `role` backed by `authority`.
    pub fn new(role: QueueRole, authority: Arc<dyn CertificateAuthorityGateway>) -> Self {
        Self { role, authority }
    }

    /// Issue unless a valid certificate already exists.
    async fn handle_request(&self, username: &str) -> CertificateResponse {
        match self.authority.has_valid_certificate(username).await {
            Err(err) => {
                warn!(username, error = %err, "[pr-04] Existence check failed");
                CertificateResponse::failure(err.to_string())
            }
            Ok(true) => {
                info!(username, "[pr-04] Refusing duplicate certificate request");
                CertificateResponse::failure(duplicate_certificate_message(username))
            }
            Ok(false) => match self.authority.issue(username).await {
                Ok(pem) => {
                    info!(username, "[pr-04] Certificate issued");
                    CertificateResponse::success(pem)
                }
                Err(err) => {
                    warn!(username, error = %err, "[pr-04] Issuance failed");
                    CertificateResponse::failure(err.to_string())
                }
            },
        }
    }

    /// Revoke only when a valid certificate exists.
    async fn handle_revoke(&self, username: &str) -> CertificateResponse {
        match self.authority.has_valid_certificate(username).await {
            Err(err) => {
                warn!(username, error = %err, "[pr-04] Existence check failed");
                CertificateResponse::failure(err.to_string())
            }
            Ok(false) => {
                info!(username, "[pr-04] Nothing to revoke");
                CertificateResponse::failure(missing_certificate_message(username))
            }
            Ok(true) => match self.authority.revoke(username).await {
                Ok(()) => {
                    info!(username, "[pr-04] Certificate revoked");
                    CertificateResponse::success(revoked_confirmation(username))
                }
                Err(err) => {
                    warn!(username, error = %err, "[pr-04] Revocation failed");
                    CertificateResponse::failure(err.to_string())
                }
            },
        }
    }
}

#[async_trait]
impl RequestProcessing for RequestProcessor {
    fn role(&self) -> QueueRole {
        self.role
    }

    async fn process(&self, raw_body: &str) -> Result<Reply, DecodeError> {
        let request = match CertificateRequest::decode(raw_body) {
            Ok(request) => request,
            Err(DecodeError::MissingUsername { response_queue }) => {
                warn!(response_queue = %response_queue, "[pr-04] Request without username");
                return Ok(Reply::new(
                    response_queue,
                    CertificateResponse::failure(MISSING_USERNAME_MESSAGE),
                ));
            }
            Err(err) => return Err(err),
        };

        let response = match self.role {
            QueueRole::Request => self.handle_request(&request.username).await,
            QueueRole::Revoke => self.handle_revoke(&request.username).await,
        };

        Ok(Reply::new(request.response_queue, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GatewayError;
    use crate::ports::MockAuthority;

    const BODY: &str = r#"{"username":"alice","responseQueue":"q://resp-1"}"#;

    fn processor(role: QueueRole, authority: Arc<MockAuthority>) -> RequestProcessor {
        RequestProcessor::new(role, authority)
    }

    #[tokio::test]
    async fn test_issue_on_absent() {
        let authority = Arc::new(MockAuthority::new());
        let processor = processor(QueueRole::Request, authority.clone());

        let reply = processor.process(BODY).await.unwrap();

        assert_eq!(reply.response_queue, "q://resp-1");
        assert!(reply.response.is_success());
        assert_eq!(reply.response.body(), MockAuthority::pem_for("alice"));
        assert_eq!(reply.response.error_message(), "");
        assert_eq!(authority.issue_calls(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_on_present_never_issues() {
        let authority = Arc::new(MockAuthority::with_issued(["alice"]));
        let processor = processor(QueueRole::Request, authority.clone());

        let reply = processor.process(BODY).await.unwrap();

        assert!(!reply.response.is_success());
        assert_eq!(
            reply.response.error_message(),
            "a valid certificate for alice already exists"
        );
        assert_eq!(reply.response.body(), "");
        assert_eq!(authority.issue_calls(), 0);
    }

    #[tokio::test]
    async fn test_idempotent_across_redelivery() {
        let authority = Arc::new(MockAuthority::new());
        let processor = processor(QueueRole::Request, authority.clone());

        let first = processor.process(BODY).await.unwrap();
        let second = processor.process(BODY).await.unwrap();

        assert!(first.response.is_success());
        assert!(!second.response.is_success());
        assert_eq!(authority.issue_calls(), 1);
    }

    #[tokio::test]
    async fn test_check_failure_becomes_failure_response() {
        let authority = Arc::new(MockAuthority {
            fail_checks: true,
            ..Default::default()
        });
        let processor = processor(QueueRole::Request, authority.clone());

        let reply = processor.process(BODY).await.unwrap();

        assert!(!reply.response.is_success());
        assert_eq!(
            reply.response.error_message(),
            GatewayError::Unavailable("mock check failure".to_string()).to_string()
        );
        assert_eq!(authority.issue_calls(), 0);
    }

    #[tokio::test]
    async fn test_issue_failure_becomes_failure_response() {
        let authority = Arc::new(MockAuthority {
            fail_issue: true,
            ..Default::default()
        });
        let processor = processor(QueueRole::Request, authority);

        let reply = processor.process(BODY).await.unwrap();
        assert!(!reply.response.is_success());
        assert!(reply.response.error_message().contains("mock issue failure"));
    }

    #[tokio::test]
    async fn test_missing_username_with_address_replies() {
        let processor = processor(QueueRole::Request, Arc::new(MockAuthority::new()));

        let reply = processor
            .process(r#"{"responseQueue":"q://resp-9"}"#)
            .await
            .unwrap();

        assert_eq!(reply.response_queue, "q://resp-9");
        assert_eq!(reply.response.error_message(), MISSING_USERNAME_MESSAGE);
    }

    #[tokio::test]
    async fn test_unrecoverable_bodies_are_errors() {
        let authority = Arc::new(MockAuthority::new());
        let processor = processor(QueueRole::Request, authority.clone());

        assert!(matches!(
            processor.process("not json").await,
            Err(DecodeError::Malformed { .. })
        ));
        assert_eq!(
            processor.process(r#"{"username":"alice"}"#).await,
            Err(DecodeError::MissingResponseQueue)
        );
        assert_eq!(authority.check_calls(), 0);
    }

    #[tokio::test]
    async fn test_revoke_existing() {
        let authority = Arc::new(MockAuthority::with_issued(["alice"]));
        let processor = processor(QueueRole::Revoke, authority.clone());

        let reply = processor.process(BODY).await.unwrap();

        assert!(reply.response.is_success());
        assert_eq!(reply.response.body(), "certificate for alice revoked");
        assert!(!authority.holds("alice"));
        assert_eq!(processor.role(), QueueRole::Revoke);
    }

    #[tokio::test]
    async fn test_revoke_absent_never_calls_revoke() {
        let authority = Arc::new(MockAuthority::new());
        let processor = processor(QueueRole::Revoke, authority.clone());

        let reply = processor.process(BODY).await.unwrap();

        assert_eq!(
            reply.response.error_message(),
            "no valid certificate for alice exists"
        );
        assert_eq!(authority.revoke_calls(), 0);
    }
}
