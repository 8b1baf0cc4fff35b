//! # Domain Module
//!
//! Errors and bounds for queue transport.

pub mod errors;
pub mod invariants;

pub use errors::*;
pub use invariants::*;
