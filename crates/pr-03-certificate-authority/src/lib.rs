//! # PR-03 Certificate Authority
//!
//! File-backed certificate authority for VPN client certificates.
//!
//! **Subsystem ID:** 3
//!
//! ## Purpose
//!
//! - Keep a CA key and certificate in a PKI directory, creating them on first use
//! - Issue client certificates (ECDSA P-256, client-auth EKU) as a PEM bundle
//! - Track every issued certificate in an OpenSSL-compatible `index.txt`
//! - Revoke by common name
//!
//! ## PKI Directory Layout
//!
//! ```text
//! <pki_dir>/
//! ├── ca.crt
//! ├── ca.key
//! ├── index.txt
//! └── issued/<username>.crt
//! ```
//!
//! ## Module Structure
//!
//! ```text
//! pr-03-certificate-authority/
//! ├── domain/
//! │   ├── errors.rs      # AuthorityError
//! │   ├── index.rs       # CertificateIndex, IndexEntry
//! │   └── invariants.rs  # username rules
//! ├── application/       # CertificateAuthorityService
//! └── config.rs          # AuthorityConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod application;
pub mod config;
pub mod domain;

// Re-exports
pub use application::{CertificateAuthorityService, IssuedCertificate};
pub use config::AuthorityConfig;
pub use domain::{
    validate_username, AuthorityError, CertificateIndex, CertificateStatus, IndexEntry,
    MAX_USERNAME_LEN,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
