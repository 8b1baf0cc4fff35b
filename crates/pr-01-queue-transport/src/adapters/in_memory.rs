//! # In-Memory Queue Broker
//!
//! Process-local queues with SQS-like visibility leases.
//!
//! A received message is moved to the in-flight set under a fresh receipt.
//! It is either deleted with that receipt or, once the lease expires,
//! returned to the front of the ready queue for redelivery.

use crate::config::BrokerConfig;
use crate::domain::{clamp_wait, TransportError};
use crate::ports::QueueTransport;
use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::{Endpoint, QueueMessage, Receipt};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

/// Observable broker side effects, in the order they happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerEvent {
    /// A message was received and leased.
    Received {
        /// Queue address
        queue: String,
        /// Receipt issued for the lease
        receipt: String,
    },
    /// A body was sent to a queue.
    Sent {
        /// Queue address
        queue: String,
        /// Message body
        body: String,
    },
    /// A receipt was redeemed.
    Deleted {
        /// Queue address
        queue: String,
        /// Receipt that was redeemed
        receipt: String,
    },
}

struct Lease {
    body: String,
    expires_at: Instant,
}

#[derive(Default)]
struct QueueState {
    ready: VecDeque<String>,
    in_flight: HashMap<String, Lease>,
}

impl QueueState {
    /// Return expired leases to the front of the queue, oldest first.
    fn reclaim_expired(&mut self, now: Instant) {
        let mut expired: Vec<(String, Lease)> = Vec::new();
        self.in_flight.retain(|receipt, lease| {
            if lease.expires_at <= now {
                expired.push((
                    receipt.clone(),
                    Lease {
                        body: std::mem::take(&mut lease.body),
                        expires_at: lease.expires_at,
                    },
                ));
                false
            } else {
                true
            }
        });
        expired.sort_by_key(|(_, lease)| lease.expires_at);
        for (receipt, lease) in expired.into_iter().rev() {
            debug!(receipt = %receipt, "[pr-01] Lease expired, message requeued");
            self.ready.push_front(lease.body);
        }
    }

    fn next_expiry(&self) -> Option<Instant> {
        self.in_flight.values().map(|lease| lease.expires_at).min()
    }
}

#[derive(Default)]
struct BrokerState {
    queues: HashMap<String, QueueState>,
    journal: Vec<BrokerEvent>,
    receive_failures: u32,
    send_failures: u32,
    delete_failures: u32,
    receive_attempts: u64,
}

impl BrokerState {
    fn queue_mut(
        &mut self,
        endpoint: &Endpoint,
        auto_create: bool,
    ) -> Result<&mut QueueState, TransportError> {
        let key = endpoint.as_str();
        if !self.queues.contains_key(key) {
            if !auto_create {
                return Err(TransportError::QueueDoesNotExist(key.to_string()));
            }
            self.queues.insert(key.to_string(), QueueState::default());
        }
        self.queues
            .get_mut(key)
            .ok_or_else(|| TransportError::QueueDoesNotExist(key.to_string()))
    }
}

/// In-memory [`QueueTransport`] with failure injection for tests.
pub struct InMemoryQueueBroker {
    config: BrokerConfig,
    state: Mutex<BrokerState>,
    arrivals: Notify,
}

impl InMemoryQueueBroker {
    /// Create a broker with the given settings.
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            state: Mutex::new(BrokerState::default()),
            arrivals: Notify::new(),
        }
    }

    /// Create an empty queue at `endpoint`. Existing queues are left alone.
    pub fn create_queue(&self, endpoint: &Endpoint) {
        self.state
            .lock()
            .queues
            .entry(endpoint.as_str().to_string())
            .or_default();
    }

    /// Names of all queues, sorted.
    pub fn queue_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().queues.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of messages waiting to be received.
    pub fn pending(&self, endpoint: &Endpoint) -> usize {
        self.state
            .lock()
            .queues
            .get(endpoint.as_str())
            .map_or(0, |queue| queue.ready.len())
    }

    /// Number of messages received but not yet deleted.
    pub fn in_flight(&self, endpoint: &Endpoint) -> usize {
        self.state
            .lock()
            .queues
            .get(endpoint.as_str())
            .map_or(0, |queue| queue.in_flight.len())
    }

    /// Bodies waiting on a queue, front first, without leasing them.
    pub fn peek_bodies(&self, endpoint: &Endpoint) -> Vec<String> {
        self.state
            .lock()
            .queues
            .get(endpoint.as_str())
            .map(|queue| queue.ready.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Snapshot of every side effect so far.
    pub fn journal(&self) -> Vec<BrokerEvent> {
        self.state.lock().journal.clone()
    }

    /// How many times `receive` has been called.
    pub fn receive_attempts(&self) -> u64 {
        self.state.lock().receive_attempts
    }

    /// Make the next `count` receives fail with `Unavailable`.
    pub fn fail_next_receives(&self, count: u32) {
        self.state.lock().receive_failures = count;
    }

    /// Make the next `count` sends fail with `Unavailable`.
    pub fn fail_next_sends(&self, count: u32) {
        self.state.lock().send_failures = count;
    }

    /// Make the next `count` deletes fail with `Unavailable`.
    pub fn fail_next_deletes(&self, count: u32) {
        self.state.lock().delete_failures = count;
    }

    /// Try to lease one message. Returns the next instant worth waking at
    /// when nothing is ready.
    fn try_lease(
        &self,
        endpoint: &Endpoint,
    ) -> Result<Result<QueueMessage, Option<Instant>>, TransportError> {
        let now = Instant::now();
        let mut state = self.state.lock();
        let visibility = self.config.visibility_timeout;
        let queue = state.queue_mut(endpoint, self.config.auto_create_queues)?;
        queue.reclaim_expired(now);

        let Some(body) = queue.ready.pop_front() else {
            return Ok(Err(queue.next_expiry()));
        };

        let receipt = Uuid::new_v4().to_string();
        queue.in_flight.insert(
            receipt.clone(),
            Lease {
                body: body.clone(),
                expires_at: now + visibility,
            },
        );
        state.journal.push(BrokerEvent::Received {
            queue: endpoint.as_str().to_string(),
            receipt: receipt.clone(),
        });

        Ok(Ok(QueueMessage::new(Receipt::new(receipt), body)))
    }
}

impl Default for InMemoryQueueBroker {
    fn default() -> Self {
        Self::new(BrokerConfig::default())
    }
}

#[async_trait]
impl QueueTransport for InMemoryQueueBroker {
    async fn receive(
        &self,
        endpoint: &Endpoint,
        wait: Duration,
    ) -> Result<Option<QueueMessage>, TransportError> {
        {
            let mut state = self.state.lock();
            state.receive_attempts += 1;
            if state.receive_failures > 0 {
                state.receive_failures -= 1;
                return Err(TransportError::Unavailable(
                    "injected receive failure".to_string(),
                ));
            }
        }

        let deadline = Instant::now() + clamp_wait(wait);
        loop {
            // Register interest before checking so a send between the check
            // and the await is not missed.
            let arrival = self.arrivals.notified();
            tokio::pin!(arrival);
            arrival.as_mut().enable();

            let next_expiry = match self.try_lease(endpoint)? {
                Ok(message) => return Ok(Some(message)),
                Err(next_expiry) => next_expiry,
            };

            if Instant::now() >= deadline {
                return Ok(None);
            }

            let wake_at = next_expiry.map_or(deadline, |expiry| expiry.min(deadline));
            let _ = tokio::time::timeout_at(wake_at, arrival).await;
        }
    }

    async fn send(&self, endpoint: &Endpoint, body: &str) -> Result<(), TransportError> {
        {
            let mut state = self.state.lock();
            if state.send_failures > 0 {
                state.send_failures -= 1;
                return Err(TransportError::Unavailable(
                    "injected send failure".to_string(),
                ));
            }
            let queue = state.queue_mut(endpoint, self.config.auto_create_queues)?;
            queue.ready.push_back(body.to_string());
            state.journal.push(BrokerEvent::Sent {
                queue: endpoint.as_str().to_string(),
                body: body.to_string(),
            });
        }
        self.arrivals.notify_waiters();
        Ok(())
    }

    async fn delete(&self, endpoint: &Endpoint, receipt: &Receipt) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        if state.delete_failures > 0 {
            state.delete_failures -= 1;
            return Err(TransportError::Unavailable(
                "injected delete failure".to_string(),
            ));
        }
        let queue = state.queue_mut(endpoint, self.config.auto_create_queues)?;
        if queue.in_flight.remove(receipt.as_str()).is_none() {
            debug!(receipt = %receipt, "[pr-01] Receipt already redeemed or expired");
        }
        state.journal.push(BrokerEvent::Deleted {
            queue: endpoint.as_str().to_string(),
            receipt: receipt.as_str().to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn endpoint(name: &str) -> Endpoint {
        Endpoint::parse(&format!("q://{}", name)).unwrap()
    }

    fn broker_with(queue: &Endpoint) -> InMemoryQueueBroker {
        let broker = InMemoryQueueBroker::default();
        broker.create_queue(queue);
        broker
    }

    #[tokio::test]
    async fn test_send_then_receive() {
        let queue = endpoint("requests");
        let broker = broker_with(&queue);

        broker.send(&queue, "hello").await.unwrap();
        let message = broker
            .receive(&queue, Duration::from_secs(1))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(message.body, "hello");
        assert_eq!(broker.pending(&queue), 0);
        assert_eq!(broker.in_flight(&queue), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_times_out_empty() {
        let queue = endpoint("requests");
        let broker = broker_with(&queue);

        let started = Instant::now();
        let message = broker.receive(&queue, Duration::from_secs(3)).await.unwrap();

        assert!(message.is_none());
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_wait_is_clamped() {
        let queue = endpoint("requests");
        let broker = broker_with(&queue);

        let started = Instant::now();
        let _ = broker
            .receive(&queue, Duration::from_secs(3600))
            .await
            .unwrap();

        assert!(started.elapsed() <= Duration::from_secs(21));
    }

    #[tokio::test(start_paused = true)]
    async fn test_receive_wakes_on_send() {
        let queue = endpoint("requests");
        let broker = Arc::new(broker_with(&queue));

        let receiver = {
            let broker = broker.clone();
            let queue = queue.clone();
            tokio::spawn(async move { broker.receive(&queue, Duration::from_secs(20)).await })
        };

        tokio::time::sleep(Duration::from_secs(2)).await;
        broker.send(&queue, "late").await.unwrap();

        let message = receiver.await.unwrap().unwrap().unwrap();
        assert_eq!(message.body, "late");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let queue = endpoint("requests");
        let broker = broker_with(&queue);
        broker.send(&queue, "once").await.unwrap();

        let message = broker
            .receive(&queue, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        broker.delete(&queue, &message.receipt).await.unwrap();
        broker.delete(&queue, &message.receipt).await.unwrap();
        broker
            .delete(&queue, &Receipt::new("never-issued"))
            .await
            .unwrap();

        assert_eq!(broker.in_flight(&queue), 0);
        assert_eq!(broker.pending(&queue), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_lease_is_redelivered() {
        let queue = endpoint("requests");
        let broker = InMemoryQueueBroker::new(BrokerConfig {
            visibility_timeout: Duration::from_secs(5),
            auto_create_queues: false,
        });
        broker.create_queue(&queue);
        broker.send(&queue, "retry-me").await.unwrap();

        let first = broker
            .receive(&queue, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();

        tokio::time::advance(Duration::from_secs(6)).await;

        let second = broker
            .receive(&queue, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.body, "retry-me");
        assert_ne!(first.receipt, second.receipt);

        // The stale receipt no longer matches a lease but is still accepted.
        broker.delete(&queue, &first.receipt).await.unwrap();
        assert_eq!(broker.in_flight(&queue), 1);
    }

    #[tokio::test]
    async fn test_unknown_queue_errors() {
        let broker = InMemoryQueueBroker::default();
        let missing = endpoint("missing");

        let err = broker.send(&missing, "x").await.unwrap_err();
        assert!(matches!(err, TransportError::QueueDoesNotExist(_)));

        let err = broker.receive(&missing, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, TransportError::QueueDoesNotExist(_)));
    }

    #[tokio::test]
    async fn test_auto_create_queues() {
        let broker = InMemoryQueueBroker::new(BrokerConfig::for_testing());
        let queue = endpoint("fresh");

        broker.send(&queue, "x").await.unwrap();
        assert_eq!(broker.pending(&queue), 1);
        assert_eq!(broker.queue_names(), vec!["q://fresh".to_string()]);
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let queue = endpoint("requests");
        let broker = broker_with(&queue);
        broker.fail_next_receives(2);

        assert!(broker.receive(&queue, Duration::ZERO).await.is_err());
        assert!(broker.receive(&queue, Duration::ZERO).await.is_err());
        assert!(broker.receive(&queue, Duration::ZERO).await.is_ok());
        assert_eq!(broker.receive_attempts(), 3);

        broker.fail_next_sends(1);
        assert!(broker.send(&queue, "x").await.is_err());
        assert!(broker.send(&queue, "x").await.is_ok());
    }

    #[tokio::test]
    async fn test_journal_records_order() {
        let requests = endpoint("requests");
        let replies = endpoint("replies");
        let broker = broker_with(&requests);
        broker.create_queue(&replies);

        broker.send(&requests, "req").await.unwrap();
        let message = broker
            .receive(&requests, Duration::ZERO)
            .await
            .unwrap()
            .unwrap();
        broker.send(&replies, "resp").await.unwrap();
        broker.delete(&requests, &message.receipt).await.unwrap();

        let journal = broker.journal();
        assert_eq!(journal.len(), 4);
        assert!(matches!(&journal[2], BrokerEvent::Sent { body, .. } if body == "resp"));
        assert!(matches!(&journal[3], BrokerEvent::Deleted { .. }));
        assert_eq!(broker.peek_bodies(&replies), vec!["resp".to_string()]);
    }
}
