//! # Adapters Module
//!
//! Backup store implementations.

pub mod directory_store;

pub use directory_store::DirectoryEndpointStore;
