//! # Outbound Ports
//!
//! Traits for external dependencies (queue listing, backup store).

use crate::domain::{DiscoveryError, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Queue enumeration - outbound port.
#[async_trait]
pub trait QueueDiscovery: Send + Sync {
    /// Every queue address whose name starts with `prefix`.
    async fn find_queues_with_prefix(&self, prefix: &str) -> Result<Vec<String>, DiscoveryError>;
}

/// Tagged object store holding fallback addresses - outbound port.
#[async_trait]
pub trait EndpointStore: Send + Sync {
    /// Name of the first container tagged `key=value`, if any.
    async fn find_container_by_tag(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Option<String>, StoreError>;

    /// Contents of `key` in `container`.
    async fn read_object(&self, container: &str, key: &str) -> Result<String, StoreError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Mock discovery returning a fixed list of queue addresses.
#[derive(Default)]
pub struct MockDiscovery {
    /// Known queue addresses.
    pub queues: Vec<String>,
    /// Fail every call with this error.
    pub failure: Option<DiscoveryError>,
    calls: AtomicUsize,
}

impl MockDiscovery {
    /// Discovery over the given addresses.
    pub fn with_queues<I, S>(queues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queues: queues.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Discovery that always fails.
    pub fn failing(error: DiscoveryError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Number of discovery calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QueueDiscovery for MockDiscovery {
    async fn find_queues_with_prefix(&self, prefix: &str) -> Result<Vec<String>, DiscoveryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }
        // Queue name is the last path segment of the address.
        Ok(self
            .queues
            .iter()
            .filter(|url| {
                url.rsplit('/')
                    .next()
                    .is_some_and(|name| name.starts_with(prefix))
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
struct Container {
    tags: HashMap<String, String>,
    objects: HashMap<String, String>,
}

/// In-memory backup store.
#[derive(Default)]
pub struct InMemoryEndpointStore {
    containers: Vec<(String, Container)>,
    tag_lookups: AtomicUsize,
}

impl InMemoryEndpointStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a container carrying one tag.
    pub fn with_container(mut self, name: &str, tag_key: &str, tag_value: &str) -> Self {
        let mut container = Container::default();
        container
            .tags
            .insert(tag_key.to_string(), tag_value.to_string());
        self.containers.push((name.to_string(), container));
        self
    }

    /// Put an object into an existing container.
    pub fn with_object(mut self, container: &str, key: &str, contents: &str) -> Self {
        if let Some((_, c)) = self.containers.iter_mut().find(|(n, _)| n == container) {
            c.objects.insert(key.to_string(), contents.to_string());
        }
        self
    }

    /// Number of tag lookups made.
    pub fn tag_lookups(&self) -> usize {
        self.tag_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EndpointStore for InMemoryEndpointStore {
    async fn find_container_by_tag(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Option<String>, StoreError> {
        self.tag_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .containers
            .iter()
            .find(|(_, c)| c.tags.get(key).is_some_and(|v| v == value))
            .map(|(name, _)| name.clone()))
    }

    async fn read_object(&self, container: &str, key: &str) -> Result<String, StoreError> {
        self.containers
            .iter()
            .find(|(name, _)| name == container)
            .and_then(|(_, c)| c.objects.get(key).cloned())
            .ok_or_else(|| StoreError::ObjectNotFound {
                container: container.to_string(),
                key: key.to_string(),
            })
    }
}
