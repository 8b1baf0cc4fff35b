//! # Ports Module
//!
//! - `inbound`: the processing API driven by the dispatcher
//! - `outbound`: the certificate authority dependency

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
