//! # Worker Scenarios
//!
//! The dispatcher wired through `RelayContainer` exactly as the binary
//! wires it, with the in-memory broker standing in for the queue service.
//!
//! - A: request for an identity with no certificate is issued and deleted
//! - B: request for an identity that already holds one gets the duplicate text
//! - C: receive failures back off and the worker keeps serving
//! - D: ambiguous discovery refuses to start and names every candidate

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use pr_01_queue_transport::{BrokerConfig, BrokerEvent, InMemoryQueueBroker, QueueTransport};
    use pr_02_queue_resolver::{MockDiscovery, QueueResolver, ResolveError, ResolverConfig};
    use pr_04_request_processor::MockAuthority;
    use shared_types::{CertificateRequest, CertificateResponse, Endpoint, QueueRole};
    use worker_runtime::{BackoffConfig, CycleOutcome, RelayContainer, WorkerConfig, WorkerError};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const REQUEST_QUEUE: &str =
        "https://sqs.us-east-1.amazonaws.com/123456789012/openvpn-requests-main";
    const OTHER_REQUEST_QUEUE: &str =
        "https://sqs.us-east-1.amazonaws.com/123456789012/openvpn-requests-old";
    const REPLY_QUEUE: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/alice-replies";

    struct Relay {
        broker: Arc<InMemoryQueueBroker>,
        container: RelayContainer,
    }

    fn relay(discovered: &[&str], backoff: BackoffConfig) -> Relay {
        let broker = Arc::new(InMemoryQueueBroker::new(BrokerConfig::for_testing()));
        let discovery = Arc::new(MockDiscovery::with_queues(discovered.iter().copied()));
        let resolver = Arc::new(QueueResolver::new(discovery, ResolverConfig::default()));
        let config = WorkerConfig {
            region: "us-east-1".to_string(),
            wait: Duration::from_secs(2),
            backoff,
            ..WorkerConfig::default()
        };
        let container = RelayContainer::from_parts(config, broker.clone(), resolver);
        Relay { broker, container }
    }

    fn endpoint(address: &str) -> Endpoint {
        Endpoint::parse(address).unwrap()
    }

    async fn submit(broker: &InMemoryQueueBroker, username: &str) {
        let body = CertificateRequest::new(username, REPLY_QUEUE).encode().unwrap();
        broker.send(&endpoint(REQUEST_QUEUE), &body).await.unwrap();
    }

    fn replies(broker: &InMemoryQueueBroker) -> Vec<CertificateResponse> {
        broker
            .peek_bodies(&endpoint(REPLY_QUEUE))
            .iter()
            .map(|body| CertificateResponse::decode(body).unwrap())
            .collect()
    }

    // =============================================================================
    // SCENARIOS
    // =============================================================================

    /// Scenario A: issue on absent, reply then delete.
    #[tokio::test(start_paused = true)]
    async fn test_scenario_a_issue_and_delete() {
        let relay = relay(&[REQUEST_QUEUE], BackoffConfig::for_testing());
        let authority = Arc::new(MockAuthority::new());
        let mut dispatcher = relay
            .container
            .dispatcher(QueueRole::Request, authority.clone())
            .await
            .unwrap();
        submit(&relay.broker, "alice").await;

        let outcome = dispatcher.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Replied { success: true });
        let replies = replies(&relay.broker);
        assert_eq!(replies.len(), 1);
        assert!(replies[0].is_success());
        assert_eq!(replies[0].body(), MockAuthority::pem_for("alice"));
        assert_eq!(replies[0].error_message(), "");
        assert!(authority.holds("alice"));

        // Request gone from the work queue, and only after the reply went out.
        assert_eq!(relay.broker.pending(&endpoint(REQUEST_QUEUE)), 0);
        assert_eq!(relay.broker.in_flight(&endpoint(REQUEST_QUEUE)), 0);
        let journal = relay.broker.journal();
        let reply_at = journal
            .iter()
            .position(|e| matches!(e, BrokerEvent::Sent { queue, .. } if queue == REPLY_QUEUE))
            .unwrap();
        let delete_at = journal
            .iter()
            .position(|e| matches!(e, BrokerEvent::Deleted { queue, .. } if queue == REQUEST_QUEUE))
            .unwrap();
        assert!(reply_at < delete_at);
    }

    /// Scenario B: duplicate request, `issue` never called.
    #[tokio::test(start_paused = true)]
    async fn test_scenario_b_duplicate_reply_text() {
        let relay = relay(&[REQUEST_QUEUE], BackoffConfig::for_testing());
        let authority = Arc::new(MockAuthority::with_issued(["alice"]));
        let mut dispatcher = relay
            .container
            .dispatcher(QueueRole::Request, authority.clone())
            .await
            .unwrap();
        submit(&relay.broker, "alice").await;

        let outcome = dispatcher.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Replied { success: false });
        let replies = replies(&relay.broker);
        assert_eq!(
            replies[0].error_message(),
            "a valid certificate for alice already exists"
        );
        assert_eq!(replies[0].body(), "");
        assert_eq!(authority.issue_calls(), 0);
        assert_eq!(relay.broker.in_flight(&endpoint(REQUEST_QUEUE)), 0);
    }

    /// Scenario C: three receive failures, then a request is served and the
    /// worker is still running.
    #[tokio::test(start_paused = true)]
    async fn test_scenario_c_receive_failures_then_success() {
        let relay = relay(&[REQUEST_QUEUE], BackoffConfig::default());
        let authority = Arc::new(MockAuthority::new());
        let dispatcher = relay
            .container
            .dispatcher(QueueRole::Request, authority)
            .await
            .unwrap();
        relay.broker.fail_next_receives(3);
        submit(&relay.broker, "alice").await;

        let worker = tokio::spawn(dispatcher.run());

        let mut waited = Duration::ZERO;
        while replies(&relay.broker).is_empty() {
            assert!(waited < Duration::from_secs(60), "no reply after backoff");
            tokio::time::sleep(Duration::from_millis(500)).await;
            waited += Duration::from_millis(500);
        }

        // 1s + 2s + 4s of backoff before the fourth receive succeeded.
        assert!(waited >= Duration::from_secs(7));
        assert!(replies(&relay.broker)[0].is_success());
        assert!(relay.broker.receive_attempts() >= 4);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!worker.is_finished());
        worker.abort();
    }

    /// Scenario D: two matching queues and no override.
    #[tokio::test]
    async fn test_scenario_d_ambiguous_discovery() {
        let relay = relay(
            &[REQUEST_QUEUE, OTHER_REQUEST_QUEUE],
            BackoffConfig::for_testing(),
        );

        let err = match relay
            .container
            .dispatcher(QueueRole::Request, Arc::new(MockAuthority::new()))
            .await
        {
            Ok(_) => panic!("ambiguous discovery must not start a worker"),
            Err(err) => err,
        };

        match &err {
            WorkerError::Configuration(ResolveError::Ambiguous { candidates, .. }) => {
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("unexpected error {:?}", other),
        }
        let message = err.to_string();
        assert!(message.contains(REQUEST_QUEUE));
        assert!(message.contains(OTHER_REQUEST_QUEUE));
        assert_eq!(err.exit_code(), 2);
    }

    // =============================================================================
    // DELIVERY SEMANTICS
    // =============================================================================

    /// A crash between reply and delete redelivers the request; the retry
    /// gets the duplicate reply instead of a second certificate.
    #[tokio::test(start_paused = true)]
    async fn test_redelivery_after_failed_delete_is_idempotent() {
        let relay = relay(&[REQUEST_QUEUE], BackoffConfig::for_testing());
        let authority = Arc::new(MockAuthority::new());
        submit(&relay.broker, "alice").await;

        let mut first = relay
            .container
            .dispatcher(QueueRole::Request, authority.clone())
            .await
            .unwrap();
        relay.broker.fail_next_deletes(1);
        assert!(matches!(
            first.run_cycle().await,
            Err(WorkerError::AcknowledgeFailed { .. })
        ));

        // Lease expires, a restarted worker picks the message up again.
        tokio::time::sleep(BrokerConfig::for_testing().visibility_timeout).await;
        let mut second = relay
            .container
            .dispatcher(QueueRole::Request, authority.clone())
            .await
            .unwrap();
        assert_eq!(
            second.run_cycle().await.unwrap(),
            CycleOutcome::Replied { success: false }
        );

        assert_eq!(authority.issue_calls(), 1);
        let replies = replies(&relay.broker);
        assert_eq!(replies.len(), 2);
        assert!(replies[0].is_success());
        assert!(!replies[1].is_success());
    }

    /// Revocation runs the same cycle against its own queue.
    #[tokio::test(start_paused = true)]
    async fn test_revoke_queue_round_trip() {
        const REVOKE_QUEUE: &str =
            "https://sqs.us-east-1.amazonaws.com/123456789012/openvpn-revocations-main";
        let relay = relay(&[REQUEST_QUEUE, REVOKE_QUEUE], BackoffConfig::for_testing());
        let authority = Arc::new(MockAuthority::with_issued(["alice"]));
        let mut dispatcher = relay
            .container
            .dispatcher(QueueRole::Revoke, authority.clone())
            .await
            .unwrap();
        assert_eq!(dispatcher.queue().as_str(), REVOKE_QUEUE);

        let body = CertificateRequest::new("alice", REPLY_QUEUE).encode().unwrap();
        relay
            .broker
            .send(&endpoint(REVOKE_QUEUE), &body)
            .await
            .unwrap();

        assert_eq!(
            dispatcher.run_cycle().await.unwrap(),
            CycleOutcome::Replied { success: true }
        );
        assert_eq!(
            replies(&relay.broker)[0].body(),
            "certificate for alice revoked"
        );
        assert!(!authority.holds("alice"));
    }
}
