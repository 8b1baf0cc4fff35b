//! # PKI Relay Test Suite
//!
//! End-to-end tests that run the real dispatcher against the in-memory
//! broker.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scenarios.rs    # Receive -> Process -> Reply -> Acknowledge scenarios
//!     └── relay_flow.rs   # Real CA, backup-store fallback, submit client
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p relay-tests
//! cargo test -p relay-tests integration::scenarios::
//! ```

pub mod integration;
