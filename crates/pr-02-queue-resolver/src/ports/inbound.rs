//! # Inbound Ports

use crate::domain::ResolveError;
use async_trait::async_trait;
use shared_types::{Endpoint, QueueRole};

/// Queue resolution API.
#[async_trait]
pub trait QueueResolution: Send + Sync {
    /// Resolve `role` to an endpoint.
    ///
    /// A non-empty `explicit_override` is validated and used as-is.
    async fn resolve(
        &self,
        role: QueueRole,
        explicit_override: Option<&str>,
    ) -> Result<Endpoint, ResolveError>;
}
