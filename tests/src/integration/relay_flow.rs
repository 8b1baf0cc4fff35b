//! # Relay Flow
//!
//! Full stack with the file-backed certificate authority (pr-03) behind the
//! gateway adapter, the directory backup store behind the resolver, and the
//! submit client on the caller side.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;
    use std::time::Duration;

    use pr_01_queue_transport::{BrokerConfig, InMemoryQueueBroker, QueueTransport};
    use pr_02_queue_resolver::{
        DirectoryEndpointStore, DiscoveryError, MockDiscovery, QueueResolution, QueueResolver,
        ResolverConfig,
    };
    use pr_03_certificate_authority::{
        AuthorityConfig, CertificateAuthorityService, CertificateStatus,
    };
    use shared_types::{CertificateRequest, CertificateResponse, Endpoint, QueueRole};
    use tempfile::TempDir;
    use worker_runtime::{CycleOutcome, RelayContainer, WorkerConfig};

    const REQUEST_QUEUE: &str =
        "https://sqs.us-east-1.amazonaws.com/123456789012/openvpn-requests-main";
    const REVOKE_QUEUE: &str =
        "https://sqs.us-east-1.amazonaws.com/123456789012/openvpn-revocations-main";
    const REPLY_QUEUE: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/ops-replies";

    fn endpoint(address: &str) -> Endpoint {
        Endpoint::parse(address).unwrap()
    }

    fn container(
        pki_dir: &Path,
        broker: Arc<InMemoryQueueBroker>,
        resolver: Arc<dyn QueueResolution>,
    ) -> RelayContainer {
        let config = WorkerConfig {
            region: "us-east-1".to_string(),
            wait: Duration::from_secs(1),
            pki_dir: pki_dir.to_path_buf(),
            ..WorkerConfig::default()
        };
        RelayContainer::from_parts(config, broker, resolver)
    }

    fn discovering(queues: &[&str]) -> Arc<dyn QueueResolution> {
        let discovery = Arc::new(MockDiscovery::with_queues(queues.iter().copied()));
        Arc::new(QueueResolver::new(discovery, ResolverConfig::default()))
    }

    async fn send_request(broker: &InMemoryQueueBroker, queue: &str, username: &str) {
        let body = CertificateRequest::new(username, REPLY_QUEUE).encode().unwrap();
        broker.send(&endpoint(queue), &body).await.unwrap();
    }

    fn replies(broker: &InMemoryQueueBroker) -> Vec<CertificateResponse> {
        broker
            .peek_bodies(&endpoint(REPLY_QUEUE))
            .iter()
            .map(|body| CertificateResponse::decode(body).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_issue_duplicate_and_revoke_with_file_authority() {
        let pki = TempDir::new().unwrap();
        let broker = Arc::new(InMemoryQueueBroker::new(BrokerConfig::for_testing()));
        let relay = container(
            pki.path(),
            broker.clone(),
            discovering(&[REQUEST_QUEUE, REVOKE_QUEUE]),
        );
        let authority = relay.open_authority().unwrap();

        let mut requests = relay
            .dispatcher(QueueRole::Request, authority.clone())
            .await
            .unwrap();
        let mut revokes = relay
            .dispatcher(QueueRole::Revoke, authority)
            .await
            .unwrap();

        send_request(&broker, REQUEST_QUEUE, "alice").await;
        send_request(&broker, REQUEST_QUEUE, "alice").await;
        assert_eq!(
            requests.run_cycle().await.unwrap(),
            CycleOutcome::Replied { success: true }
        );
        assert_eq!(
            requests.run_cycle().await.unwrap(),
            CycleOutcome::Replied { success: false }
        );

        send_request(&broker, REVOKE_QUEUE, "alice").await;
        assert_eq!(
            revokes.run_cycle().await.unwrap(),
            CycleOutcome::Replied { success: true }
        );

        let replies = replies(&broker);
        assert!(replies[0].body().starts_with("-----BEGIN CERTIFICATE-----"));
        assert_eq!(
            replies[1].error_message(),
            "a valid certificate for alice already exists"
        );
        assert_eq!(replies[2].body(), "certificate for alice revoked");

        // The index on disk reflects both operations.
        let reopened =
            CertificateAuthorityService::open(AuthorityConfig::with_pki_dir(pki.path())).unwrap();
        let index = reopened.index_snapshot();
        assert_eq!(index.entries().len(), 1);
        assert_eq!(index.entries()[0].status, CertificateStatus::Revoked);
        assert!(!reopened.has_valid_certificate("alice").unwrap());
    }

    #[tokio::test]
    async fn test_invalid_username_gets_failure_reply() {
        let pki = TempDir::new().unwrap();
        let broker = Arc::new(InMemoryQueueBroker::new(BrokerConfig::for_testing()));
        let relay = container(pki.path(), broker.clone(), discovering(&[REQUEST_QUEUE]));
        let mut dispatcher = relay
            .dispatcher(QueueRole::Request, relay.open_authority().unwrap())
            .await
            .unwrap();

        send_request(&broker, REQUEST_QUEUE, "../../etc/passwd").await;

        assert_eq!(
            dispatcher.run_cycle().await.unwrap(),
            CycleOutcome::Replied { success: false }
        );
        assert!(replies(&broker)[0]
            .error_message()
            .starts_with("invalid username"));
    }

    #[tokio::test]
    async fn test_backup_store_used_when_listing_is_denied() {
        let backup = TempDir::new().unwrap();
        let container_dir = backup.path().join("relay-backup");
        fs::create_dir_all(container_dir.join("queues")).unwrap();
        fs::write(container_dir.join(".tags"), "relay-role=backup\n").unwrap();
        fs::write(
            container_dir.join("queues").join("request-queue-url"),
            format!("{}\n", REQUEST_QUEUE),
        )
        .unwrap();

        let discovery = Arc::new(MockDiscovery::failing(DiscoveryError::AccessDenied(
            "not authorized to perform sqs:ListQueues".to_string(),
        )));
        let resolver = QueueResolver::new(discovery.clone(), ResolverConfig::for_testing())
            .with_endpoint_store(Arc::new(DirectoryEndpointStore::new(backup.path())));

        let pki = TempDir::new().unwrap();
        let broker = Arc::new(InMemoryQueueBroker::new(BrokerConfig::for_testing()));
        let relay = container(pki.path(), broker, Arc::new(resolver));

        let queue = relay.resolve(QueueRole::Request).await.unwrap();
        assert_eq!(queue.as_str(), REQUEST_QUEUE);
        assert_eq!(discovery.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_submit_client_against_running_worker() {
        let pki = TempDir::new().unwrap();
        let broker = Arc::new(InMemoryQueueBroker::new(BrokerConfig::for_testing()));
        let relay = container(pki.path(), broker.clone(), discovering(&[REQUEST_QUEUE]));
        let dispatcher = relay
            .dispatcher(QueueRole::Request, relay.open_authority().unwrap())
            .await
            .unwrap();
        let worker = tokio::spawn(dispatcher.run());

        let work_queue = relay.resolve(QueueRole::Request).await.unwrap();
        let response = relay
            .submit_client()
            .submit(
                &work_queue,
                "bob",
                &endpoint(REPLY_QUEUE),
                Duration::from_secs(10),
            )
            .await
            .unwrap();

        assert!(response.is_success());
        assert!(response.body().contains("BEGIN CERTIFICATE"));
        assert!(response.body().contains("PRIVATE KEY"));
        assert_eq!(broker.pending(&endpoint(REPLY_QUEUE)), 0);
        assert!(!worker.is_finished());
        worker.abort();
    }
}
