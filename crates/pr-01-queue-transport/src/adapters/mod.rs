//! # Adapters Module
//!
//! Concrete queue transports.
//!
//! - [`InMemoryQueueBroker`]: process-local broker with visibility leases,
//!   used by tests and the local demo
//! - [`SqsClient`]: SQS JSON protocol over HTTPS with SigV4 signing

pub mod in_memory;
pub mod sqs;

pub use in_memory::{BrokerEvent, InMemoryQueueBroker};
pub use sqs::{Credentials, SigV4Signer, SqsClient};
