//! # Shared Types Crate
//!
//! Queue entities and the request/reply wire protocol used by the relay.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: the inbound and outbound message schemas are
//!   defined here and nowhere else.
//! - **Error as Data**: a [`CertificateResponse`] always carries either a body
//!   or an error message, never both, never neither.
//! - **Validated Addresses**: an [`Endpoint`] can only be built from an address
//!   that passed the URL well-formedness check.

pub mod entities;
pub mod errors;
pub mod protocol;

pub use entities::*;
pub use errors::*;
pub use protocol::*;
