//! # Ports Module
//!
//! - `inbound`: the resolution API used by the runtime
//! - `outbound`: discovery and backup-store dependencies

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
