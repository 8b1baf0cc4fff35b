//! # SQS Adapter
//!
//! Talks the SQS JSON protocol (`application/x-amz-json-1.0`) over HTTPS.
//!
//! - `client`: [`SqsClient`], the [`crate::QueueTransport`] implementation
//!   plus queue listing for discovery
//! - `wire`: request/response bodies and error classification
//! - `signing`: SigV4 request signing

pub mod client;
pub mod signing;
pub mod wire;

pub use client::SqsClient;
pub use signing::{Credentials, SigV4Signer};
