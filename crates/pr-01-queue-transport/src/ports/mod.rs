//! # Ports Module
//!
//! The transport API consumed by the dispatcher, the resolver adapters and
//! the submit client.

pub mod inbound;

pub use inbound::*;
