//! # Domain Invariants
//!
//! Bounds every transport must respect.

use std::time::Duration;

/// Longest long-poll wait a single `receive` may block for.
///
/// Matches the SQS `WaitTimeSeconds` ceiling.
pub const MAX_WAIT_SECONDS: u64 = 20;

/// Default visibility lease granted to a received message.
pub const DEFAULT_VISIBILITY_TIMEOUT_SECS: u64 = 30;

/// Invariant: a receive wait is always bounded.
pub fn clamp_wait(wait: Duration) -> Duration {
    wait.min(Duration::from_secs(MAX_WAIT_SECONDS))
}
