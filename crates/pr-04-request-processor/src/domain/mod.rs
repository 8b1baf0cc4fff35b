//! # Domain Module

pub mod errors;
pub mod messages;

pub use errors::*;
pub use messages::*;
