//! # Worker Handlers
//!
//! The dispatcher loop and the pieces it is built from.
//!
//! ```text
//!   ┌──────────┐   None / error+backoff
//!   │ Receive  │◄──────────────┐
//!   └────┬─────┘               │
//!        ↓ message             │
//!   ┌──────────┐               │
//!   │ Process  │ (pr-04)       │
//!   └────┬─────┘               │
//!        ↓ reply               │
//!   ┌──────────┐               │
//!   │  Reply   │ send to responseQueue (fatal on failure)
//!   └────┬─────┘               │
//!        ↓                     │
//!   ┌──────────┐               │
//!   │   Ack    │ delete receipt (fatal on failure)
//!   └────┬─────┘               │
//!        └─────────────────────┘
//! ```

pub mod backoff;
pub mod dispatcher;
pub mod errors;

pub use backoff::{Backoff, BackoffConfig};
pub use dispatcher::{CycleOutcome, Dispatcher};
pub use errors::WorkerError;
