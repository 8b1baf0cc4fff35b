//! # Domain Module
//!
//! Resolution errors.

pub mod errors;

pub use errors::*;
