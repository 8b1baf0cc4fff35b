//! # Queue Resolver Service
//!
//! Override, then discovery, then backup store.

use crate::config::ResolverConfig;
use crate::domain::{ResolveError, StoreError};
use crate::ports::{EndpointStore, QueueDiscovery, QueueResolution};
use async_trait::async_trait;
use shared_types::{Endpoint, QueueRole};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// Resolves queue roles to endpoints.
///
/// The backup container name is looked up at most once per instance.
pub struct QueueResolver {
    discovery: Arc<dyn QueueDiscovery>,
    store: Option<Arc<dyn EndpointStore>>,
    config: ResolverConfig,
    backup_container: OnceCell<String>,
}

impl QueueResolver {
    /// Create a resolver without a backup store.
    pub fn new(discovery: Arc<dyn QueueDiscovery>, config: ResolverConfig) -> Self {
        Self {
            discovery,
            store: None,
            config,
            backup_container: OnceCell::new(),
        }
    }

    /// Attach a backup store used when discovery cannot run.
    ///
    /// The store is only consulted if the config carries a backup tag.
    pub fn with_endpoint_store(mut self, store: Arc<dyn EndpointStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Current configuration.
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn validate(role: QueueRole, address: &str) -> Result<Endpoint, ResolveError> {
        Endpoint::parse(address).map_err(|e| ResolveError::InvalidEndpoint {
            role,
            address: address.to_string(),
            reason: e.to_string(),
        })
    }

    fn in_scope(&self, address: &str) -> bool {
        match &self.config.account_scope {
            Some(account) => address.split('/').any(|segment| segment == account),
            None => true,
        }
    }

    async fn discover(&self, role: QueueRole) -> Result<Endpoint, ResolveError> {
        let prefix = self.config.prefix(role);
        debug!(%role, prefix, "[pr-02] Discovering queue by prefix");

        let candidates = match self.discovery.find_queues_with_prefix(prefix).await {
            Ok(found) => found,
            Err(err) => {
                warn!(%role, error = %err, "[pr-02] Queue discovery unavailable");
                return self.fall_back(role, err.to_string()).await;
            }
        };

        let mut candidates: Vec<String> = candidates
            .into_iter()
            .filter(|address| self.in_scope(address))
            .collect();

        match candidates.len() {
            0 => Err(ResolveError::NotFound {
                role,
                prefix: prefix.to_string(),
            }),
            1 => {
                let address = candidates.remove(0);
                Self::validate(role, &address)
            }
            _ => Err(ResolveError::Ambiguous {
                role,
                prefix: prefix.to_string(),
                candidates,
                flag: role.override_flag(),
            }),
        }
    }

    async fn fall_back(
        &self,
        role: QueueRole,
        discovery_failure: String,
    ) -> Result<Endpoint, ResolveError> {
        let (Some(store), Some(tag)) = (&self.store, &self.config.backup_tag) else {
            return Err(ResolveError::DiscoveryUnavailable {
                role,
                reason: discovery_failure,
            });
        };

        let address = async {
            let container = self
                .backup_container
                .get_or_try_init(|| async {
                    store
                        .find_container_by_tag(&tag.key, &tag.value)
                        .await?
                        .ok_or_else(|| StoreError::ContainerNotFound {
                            key: tag.key.clone(),
                            value: tag.value.clone(),
                        })
                })
                .await?;
            store
                .read_object(container, self.config.object_key(role))
                .await
        }
        .await
        .map_err(|err: StoreError| ResolveError::DiscoveryUnavailable {
            role,
            reason: format!("{}; backup store: {}", discovery_failure, err),
        })?;

        info!(%role, "[pr-02] Using queue address from backup store");
        Self::validate(role, address.trim())
    }
}

#[async_trait]
impl QueueResolution for QueueResolver {
    async fn resolve(
        &self,
        role: QueueRole,
        explicit_override: Option<&str>,
    ) -> Result<Endpoint, ResolveError> {
        if let Some(address) = explicit_override.filter(|a| !a.trim().is_empty()) {
            debug!(%role, address, "[pr-02] Using queue URL from flags");
            return Self::validate(role, address);
        }

        let endpoint = self.discover(role).await?;
        info!(%role, endpoint = %endpoint, "[pr-02] Resolved queue");
        Ok(endpoint)
    }
}
