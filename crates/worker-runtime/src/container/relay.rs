//! Holds the shared transport and resolver for one process.

use crate::adapters::{AuthorityGatewayAdapter, SqsDiscoveryAdapter};
use crate::client::SubmitClient;
use crate::container::WorkerConfig;
use crate::handlers::{Dispatcher, WorkerError};
use pr_01_queue_transport::{QueueTransport, SqsClient};
use pr_02_queue_resolver::{DirectoryEndpointStore, QueueResolution, QueueResolver};
use pr_03_certificate_authority::CertificateAuthorityService;
use pr_04_request_processor::{CertificateAuthorityGateway, RequestProcessor};
use shared_types::{Endpoint, QueueRole};
use std::sync::Arc;
use tracing::info;

/// Collaborators shared by every worker in the process.
pub struct RelayContainer {
    config: WorkerConfig,
    transport: Arc<dyn QueueTransport>,
    resolver: Arc<dyn QueueResolution>,
}

impl RelayContainer {
    /// Validate `config` and build the SQS-backed transport and resolver.
    pub fn connect(config: WorkerConfig) -> Result<Self, WorkerError> {
        config.validate()?;

        let client = Arc::new(
            SqsClient::new(config.sqs_config()).map_err(|e| WorkerError::Startup(e.to_string()))?,
        );
        let discovery = Arc::new(SqsDiscoveryAdapter::new(Arc::clone(&client)));
        let mut resolver = QueueResolver::new(discovery, config.resolver_config());
        if let Some(root) = &config.backup_root {
            resolver = resolver.with_endpoint_store(Arc::new(DirectoryEndpointStore::new(root)));
        }

        info!(region = %config.region, "[worker] Queue service client ready");
        Ok(Self::from_parts(config, client, Arc::new(resolver)))
    }

    /// Assemble from already-built parts.
    pub fn from_parts(
        config: WorkerConfig,
        transport: Arc<dyn QueueTransport>,
        resolver: Arc<dyn QueueResolution>,
    ) -> Self {
        Self {
            config,
            transport,
            resolver,
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Shared queue transport.
    pub fn transport(&self) -> Arc<dyn QueueTransport> {
        Arc::clone(&self.transport)
    }

    /// Resolve the queue for `role`, honouring the configured override.
    pub async fn resolve(&self, role: QueueRole) -> Result<Endpoint, WorkerError> {
        Ok(self
            .resolver
            .resolve(role, self.config.override_for(role))
            .await?)
    }

    /// Open the file-backed certificate authority and expire stale entries.
    pub fn open_authority(&self) -> Result<Arc<dyn CertificateAuthorityGateway>, WorkerError> {
        let authority = CertificateAuthorityService::open(self.config.authority_config())
            .map_err(|e| WorkerError::Startup(e.to_string()))?;
        let expired = authority
            .update_expired()
            .map_err(|e| WorkerError::Startup(e.to_string()))?;
        if expired > 0 {
            info!(expired, "[worker] Marked expired certificates");
        }
        Ok(Arc::new(AuthorityGatewayAdapter::new(Arc::new(authority))))
    }

    /// Resolve the queue for `role` and build a dispatcher serving it.
    pub async fn dispatcher(
        &self,
        role: QueueRole,
        authority: Arc<dyn CertificateAuthorityGateway>,
    ) -> Result<Dispatcher, WorkerError> {
        let queue = self.resolve(role).await?;
        let processor = Arc::new(RequestProcessor::new(role, authority));
        Ok(Dispatcher::new(
            self.transport(),
            processor,
            queue,
            self.config.wait,
            self.config.backoff,
        ))
    }

    /// Client for submitting requests over the shared transport.
    pub fn submit_client(&self) -> SubmitClient {
        SubmitClient::new(self.transport(), self.config.wait)
    }
}
