//! # PR-02 Queue Resolver
//!
//! Maps a logical queue role (`request`, `revoke`) to a concrete endpoint.
//!
//! **Subsystem ID:** 2
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Resolution Strategy
//!
//! 1. **Override**: an explicit address wins. Discovery is never consulted.
//! 2. **Discovery**: list queues by the role's name prefix. Exactly one match
//!    is required; zero or several is a configuration error.
//! 3. **Backup store**: if discovery cannot run at all, read the address from
//!    a well-known object in the tagged backup container.
//!
//! Every address, whatever its source, must pass the endpoint
//! well-formedness check.
//!
//! ## Module Structure
//!
//! ```text
//! pr-02-queue-resolver/
//! ├── domain/          # ResolveError, DiscoveryError, StoreError
//! ├── ports/
//! │   ├── inbound.rs   # QueueResolution trait
//! │   └── outbound.rs  # QueueDiscovery, EndpointStore (+ mocks)
//! ├── application/     # QueueResolver
//! ├── adapters/        # DirectoryEndpointStore
//! └── config.rs        # ResolverConfig, BackupTag
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::DirectoryEndpointStore;
pub use application::QueueResolver;
pub use config::{BackupTag, ResolverConfig};
pub use domain::{DiscoveryError, ResolveError, StoreError};
pub use ports::{
    EndpointStore, InMemoryEndpointStore, MockDiscovery, QueueDiscovery, QueueResolution,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
