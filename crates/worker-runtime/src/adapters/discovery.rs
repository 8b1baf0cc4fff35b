//! # Discovery Adapter
//!
//! Queue enumeration for the resolver, backed by `ListQueues`.

use async_trait::async_trait;
use pr_01_queue_transport::{SqsClient, TransportError};
use pr_02_queue_resolver::{DiscoveryError, QueueDiscovery};
use std::sync::Arc;
use tracing::debug;

/// Lists queues through the SQS client.
pub struct SqsDiscoveryAdapter {
    client: Arc<SqsClient>,
}

impl SqsDiscoveryAdapter {
    /// Wrap a shared client.
    pub fn new(client: Arc<SqsClient>) -> Self {
        Self { client }
    }
}

/// Access denied means "discovery cannot run here", anything else is a
/// transport fault. Both let the resolver fall back to the backup store.
fn into_discovery_error(err: TransportError) -> DiscoveryError {
    if err.is_access_denied() {
        DiscoveryError::AccessDenied(err.to_string())
    } else {
        DiscoveryError::Transport(err.to_string())
    }
}

#[async_trait]
impl QueueDiscovery for SqsDiscoveryAdapter {
    async fn find_queues_with_prefix(&self, prefix: &str) -> Result<Vec<String>, DiscoveryError> {
        debug!(prefix, region = self.client.region(), "[worker] Listing queues");
        self.client
            .list_queues(prefix)
            .await
            .map_err(into_discovery_error)
    }
}
