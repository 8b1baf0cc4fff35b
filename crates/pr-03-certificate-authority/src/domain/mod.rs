//! # Domain Module
//!
//! The certificate index and the rules identities must follow.

pub mod errors;
pub mod index;
pub mod invariants;

pub use errors::*;
pub use index::*;
pub use invariants::*;
