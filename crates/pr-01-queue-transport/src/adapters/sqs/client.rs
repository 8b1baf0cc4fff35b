//! # SQS Client
//!
//! [`QueueTransport`] over the SQS JSON protocol.

use super::signing::{Credentials, SigV4Signer, JSON_CONTENT_TYPE};
use super::wire::{
    classify_error, DeleteMessageRequest, ListQueuesRequest, ListQueuesResponse,
    ReceiveMessageRequest, ReceiveMessageResponse, SendMessageRequest, RECEIPT_HANDLE_INVALID,
};
use crate::config::SqsConfig;
use crate::domain::{clamp_wait, TransportError};
use crate::ports::QueueTransport;
use async_trait::async_trait;
use chrono::Utc;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use shared_types::{Endpoint, QueueMessage, Receipt};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Timeout for calls that do not long-poll.
const SHORT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// SQS JSON-protocol client.
pub struct SqsClient {
    http: reqwest::Client,
    config: SqsConfig,
    service_url: Url,
    signer: Option<SigV4Signer>,
}

impl SqsClient {
    /// Create a client. Credentials are read from the environment when
    /// signing is enabled.
    pub fn new(config: SqsConfig) -> Result<Self, TransportError> {
        let credentials = if config.sign_requests {
            Some(Credentials::from_env()?)
        } else {
            None
        };
        Self::build(config, credentials)
    }

    /// Create a signing client with explicit credentials.
    pub fn with_credentials(
        config: SqsConfig,
        credentials: Credentials,
    ) -> Result<Self, TransportError> {
        Self::build(config, Some(credentials))
    }

    fn build(config: SqsConfig, credentials: Option<Credentials>) -> Result<Self, TransportError> {
        let endpoint = config.resolved_endpoint();
        let service_url = Url::parse(&endpoint).map_err(|e| TransportError::Http {
            endpoint: endpoint.clone(),
            reason: format!("invalid service endpoint: {}", e),
        })?;
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| TransportError::Http {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            })?;
        let signer = credentials.map(|c| SigV4Signer::new(c, config.region.clone()));

        Ok(Self {
            http,
            config,
            service_url,
            signer,
        })
    }

    /// Region the client signs for.
    pub fn region(&self) -> &str {
        &self.config.region
    }

    /// Every queue URL whose name starts with `prefix`, across all pages.
    pub async fn list_queues(&self, prefix: &str) -> Result<Vec<String>, TransportError> {
        let mut urls = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let request = ListQueuesRequest {
                queue_name_prefix: prefix,
                max_results: Some(1000),
                next_token: next_token.as_deref(),
            };
            let page: ListQueuesResponse = self
                .call("ListQueues", &request, SHORT_CALL_TIMEOUT, None)
                .await?;
            urls.extend(page.queue_urls);

            match page.next_token.filter(|token| !token.is_empty()) {
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        debug!(prefix, count = urls.len(), "[pr-01] Listed queues");
        Ok(urls)
    }

    fn host_header(&self) -> String {
        let host = self.service_url.host_str().unwrap_or_default();
        match self.service_url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    async fn call<Req, Resp>(
        &self,
        action: &str,
        request: &Req,
        timeout: Duration,
        queue: Option<&str>,
    ) -> Result<Resp, TransportError>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_string(request).map_err(|e| TransportError::Parse {
            action: action.to_string(),
            reason: format!("request encoding: {}", e),
        })?;
        let target = format!("AmazonSQS.{}", action);

        let mut builder = self
            .http
            .post(self.service_url.clone())
            .timeout(timeout)
            .header(reqwest::header::CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header("x-amz-target", &target);

        if let Some(signer) = &self.signer {
            for (name, value) in signer.sign(&self.host_header(), &target, &payload, Utc::now())? {
                builder = builder.header(name, value);
            }
        }

        let response = builder
            .body(payload)
            .send()
            .await
            .map_err(|e| self.http_error(e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| self.http_error(e))?;

        if !status.is_success() {
            return Err(classify_error(action, status.as_u16(), &text, queue));
        }

        let text = if text.trim().is_empty() { "{}" } else { text.as_str() };
        serde_json::from_str(text).map_err(|e| TransportError::Parse {
            action: action.to_string(),
            reason: e.to_string(),
        })
    }

    fn http_error(&self, err: reqwest::Error) -> TransportError {
        TransportError::Http {
            endpoint: self.service_url.to_string(),
            reason: err.to_string(),
        }
    }
}

#[async_trait]
impl QueueTransport for SqsClient {
    async fn receive(
        &self,
        endpoint: &Endpoint,
        wait: Duration,
    ) -> Result<Option<QueueMessage>, TransportError> {
        let wait = clamp_wait(wait);
        let request = ReceiveMessageRequest {
            queue_url: endpoint.as_str(),
            max_number_of_messages: 1,
            wait_time_seconds: wait.as_secs(),
        };
        let response: ReceiveMessageResponse = self
            .call(
                "ReceiveMessage",
                &request,
                wait + self.config.request_slack,
                Some(endpoint.as_str()),
            )
            .await?;

        Ok(response.messages.into_iter().next().map(|message| {
            debug!(
                queue = %endpoint.queue_name(),
                message_id = message.message_id.as_deref().unwrap_or("-"),
                "[pr-01] Received message"
            );
            QueueMessage::new(Receipt::new(message.receipt_handle), message.body)
        }))
    }

    async fn send(&self, endpoint: &Endpoint, body: &str) -> Result<(), TransportError> {
        let request = SendMessageRequest {
            queue_url: endpoint.as_str(),
            message_body: body,
        };
        let _: IgnoredAny = self
            .call(
                "SendMessage",
                &request,
                SHORT_CALL_TIMEOUT,
                Some(endpoint.as_str()),
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, endpoint: &Endpoint, receipt: &Receipt) -> Result<(), TransportError> {
        let request = DeleteMessageRequest {
            queue_url: endpoint.as_str(),
            receipt_handle: receipt.as_str(),
        };
        let result: Result<IgnoredAny, TransportError> = self
            .call(
                "DeleteMessage",
                &request,
                SHORT_CALL_TIMEOUT,
                Some(endpoint.as_str()),
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(TransportError::Service { code, .. }) if code == RECEIPT_HANDLE_INVALID => {
                warn!(receipt = %receipt, "[pr-01] Receipt no longer valid, treating as deleted");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}

impl std::fmt::Debug for SqsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqsClient")
            .field("service_url", &self.service_url.as_str())
            .field("region", &self.config.region)
            .field("signed", &self.signer.is_some())
            .finish()
    }
}
