//! Cross-subsystem tests.

mod relay_flow;
mod scenarios;
