//! # Worker Runtime Library
//!
//! Everything behind the `pki-relay` binary, exposed for testing.
//!
//! ## Module Structure
//!
//! ```text
//! worker-runtime/
//! ├── adapters/        # SqsDiscoveryAdapter, AuthorityGatewayAdapter
//! ├── container/       # WorkerConfig, RelayContainer
//! ├── handlers/        # Dispatcher, Backoff, WorkerError
//! ├── client.rs        # SubmitClient (caller side of the protocol)
//! └── cli.rs           # clap definitions
//! ```
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | stopped by Ctrl+C, or a submit got a success reply |
//! | 1 | a submit got a failure reply or no reply |
//! | 2 | configuration or startup failure |
//! | 3 | a reply could not be sent or acknowledged |

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod cli;
pub mod client;
pub mod container;
pub mod handlers;

// Re-exports
pub use adapters::{AuthorityGatewayAdapter, SqsDiscoveryAdapter};
pub use cli::{Cli, Command, SubmitArgs, WorkerArgs};
pub use client::{SubmitClient, SubmitError};
pub use container::{ConfigError, RelayContainer, WorkerConfig};
pub use handlers::{Backoff, BackoffConfig, CycleOutcome, Dispatcher, WorkerError};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
