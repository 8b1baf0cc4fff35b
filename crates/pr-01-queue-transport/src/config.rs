//! # Configuration
//!
//! Settings for the queue transport adapters.

use crate::domain::DEFAULT_VISIBILITY_TIMEOUT_SECS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the SQS JSON-protocol client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqsConfig {
    /// Region used for the default endpoint and the signing scope.
    pub region: String,
    /// Explicit service endpoint, e.g. a local emulator.
    ///
    /// Defaults to `https://sqs.<region>.amazonaws.com`.
    pub service_endpoint: Option<String>,
    /// Extra time allowed on top of the long-poll wait before an HTTP
    /// request is abandoned.
    pub request_slack: Duration,
    /// Sign requests with SigV4. Disable only for unauthenticated emulators.
    pub sign_requests: bool,
}

impl Default for SqsConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            service_endpoint: None,
            request_slack: Duration::from_secs(10),
            sign_requests: true,
        }
    }
}

impl SqsConfig {
    /// Config for a given region with default settings.
    pub fn for_region(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            ..Self::default()
        }
    }

    /// The endpoint requests are posted to.
    pub fn resolved_endpoint(&self) -> String {
        match &self.service_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://sqs.{}.amazonaws.com", self.region),
        }
    }

    /// Create config for testing against a local emulator.
    pub fn for_testing(endpoint: &str) -> Self {
        Self {
            region: "us-east-1".to_string(),
            service_endpoint: Some(endpoint.to_string()),
            request_slack: Duration::from_secs(1),
            sign_requests: false,
        }
    }
}

/// Settings for the in-memory broker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// How long a received message stays invisible before it is redelivered.
    pub visibility_timeout: Duration,
    /// Create queues on first use instead of failing with `QueueDoesNotExist`.
    pub auto_create_queues: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(DEFAULT_VISIBILITY_TIMEOUT_SECS),
            auto_create_queues: false,
        }
    }
}

impl BrokerConfig {
    /// Create config for testing (auto-created queues, short leases).
    pub fn for_testing() -> Self {
        Self {
            visibility_timeout: Duration::from_secs(5),
            auto_create_queues: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint_uses_region() {
        let config = SqsConfig::for_region("eu-west-1");
        assert_eq!(
            config.resolved_endpoint(),
            "https://sqs.eu-west-1.amazonaws.com"
        );
    }

    #[test]
    fn test_endpoint_override_trims_slash() {
        let config = SqsConfig::for_testing("http://localhost:9324/");
        assert_eq!(config.resolved_endpoint(), "http://localhost:9324");
        assert!(!config.sign_requests);
    }

    #[test]
    fn test_broker_defaults() {
        let config = BrokerConfig::default();
        assert_eq!(config.visibility_timeout, Duration::from_secs(30));
        assert!(!config.auto_create_queues);
    }
}
