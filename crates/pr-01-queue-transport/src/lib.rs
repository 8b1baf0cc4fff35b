//! # PR-01 Queue Transport
//!
//! Primitive queue operations: long-poll receive, send, and acknowledge.
//!
//! **Subsystem ID:** 1
//! **Architecture:** Hexagonal (Ports/Adapters)
//!
//! ## Purpose
//!
//! Give the dispatcher a narrow, transport-agnostic view of a queue:
//! - `receive` blocks up to a bounded wait and returns at most one message
//! - `send` delivers a body to an endpoint
//! - `delete` redeems a receipt; redeeming a stale receipt is not an error
//!
//! ## Failure Semantics
//!
//! | Operation | Error meaning | Caller policy |
//! |-----------|---------------|---------------|
//! | `receive` | transient transport fault | back off and retry |
//! | `send` | reply cannot be delivered | fatal |
//! | `delete` | processed request cannot be acknowledged | fatal |
//!
//! ## Module Structure
//!
//! ```text
//! pr-01-queue-transport/
//! ├── domain/          # TransportError, wait/visibility bounds
//! ├── ports/           # QueueTransport trait
//! ├── adapters/        # InMemoryQueueBroker, SqsClient (JSON protocol + SigV4)
//! └── config.rs        # SqsConfig, BrokerConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{BrokerEvent, Credentials, InMemoryQueueBroker, SigV4Signer, SqsClient};
pub use config::{BrokerConfig, SqsConfig};
pub use domain::{
    clamp_wait, TransportError, DEFAULT_VISIBILITY_TIMEOUT_SECS, MAX_WAIT_SECONDS,
};
pub use ports::QueueTransport;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
