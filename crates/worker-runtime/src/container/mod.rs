//! # Relay Container
//!
//! Builds the collaborators a worker needs from a [`WorkerConfig`] and
//! hands out dispatchers and submit clients wired to them.
//!
//! ## Construction order
//!
//! ```text
//! Level 0: QueueTransport (pr-01)
//! Level 1: QueueResolver (pr-02), using the transport for discovery
//! Level 2: Certificate authority (pr-03), only for process-* commands
//! Level 3: RequestProcessor (pr-04) + Dispatcher
//! ```

pub mod config;
pub mod relay;

pub use config::{ConfigError, WorkerConfig};
pub use relay::RelayContainer;
