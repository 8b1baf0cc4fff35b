//! # Application Layer
//!
//! The three-tier resolution service.

pub mod service;

pub use service::QueueResolver;
