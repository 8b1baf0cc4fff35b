//! # PR-04 Request Processor
//!
//! Turns one raw request body into one reply.
//!
//! **Subsystem ID:** 4
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Processing Cycle
//!
//! ```text
//! raw body ──decode──→ CertificateRequest
//!                          │
//!              has_valid_certificate(username)?
//!                 │                      │
//!              present                 absent
//!                 │                      │
//!   request: duplicate failure    request: issue → PEM body
//!   revoke:  revoke → confirm     revoke:  not-issued failure
//! ```
//!
//! Every business failure, including an unreachable authority, becomes a
//! failure response. Only a body with no recoverable reply address is
//! returned as an error.
//!
//! ## Module Structure
//!
//! ```text
//! pr-04-request-processor/
//! ├── domain/          # GatewayError, reply texts
//! ├── ports/
//! │   ├── inbound.rs   # RequestProcessing trait
//! │   └── outbound.rs  # CertificateAuthorityGateway (+ MockAuthority)
//! └── application/     # RequestProcessor
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod domain;
pub mod ports;

// Re-exports
pub use application::RequestProcessor;
pub use domain::{
    duplicate_certificate_message, missing_certificate_message, revoked_confirmation,
    GatewayError, MISSING_USERNAME_MESSAGE,
};
pub use ports::{CertificateAuthorityGateway, MockAuthority, RequestProcessing};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
