//! # Adapter Implementations
//!
//! Concrete implementations of the outbound ports declared by the
//! subsystem crates:
//!
//! ```text
//! pr-02 QueueDiscovery              <- SqsDiscoveryAdapter    (pr-01 SqsClient)
//! pr-04 CertificateAuthorityGateway <- AuthorityGatewayAdapter (pr-03 service)
//! ```

pub mod authority;
pub mod discovery;

pub use authority::AuthorityGatewayAdapter;
pub use discovery::SqsDiscoveryAdapter;
