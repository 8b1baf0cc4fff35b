//! # Wire Format
//!
//! JSON bodies for the SQS actions the relay uses, and mapping of service
//! error bodies onto [`TransportError`].

use crate::domain::TransportError;
use serde::{Deserialize, Serialize};

/// `ReceiveMessage` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiveMessageRequest<'a> {
    /// Queue to poll
    pub queue_url: &'a str,
    /// Always 1: the relay handles one request at a time
    pub max_number_of_messages: u32,
    /// Long-poll wait, at most 20
    pub wait_time_seconds: u64,
}

/// `ReceiveMessage` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ReceiveMessageResponse {
    /// Absent when the wait elapsed with no message
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

/// One received message.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireMessage {
    /// Service message id
    #[serde(default)]
    pub message_id: Option<String>,
    /// Handle to redeem with `DeleteMessage`
    pub receipt_handle: String,
    /// Raw body
    #[serde(default)]
    pub body: String,
}

/// `SendMessage` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SendMessageRequest<'a> {
    /// Destination queue
    pub queue_url: &'a str,
    /// Raw body
    pub message_body: &'a str,
}

/// `DeleteMessage` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteMessageRequest<'a> {
    /// Queue the message came from
    pub queue_url: &'a str,
    /// Handle from `ReceiveMessage`
    pub receipt_handle: &'a str,
}

/// `ListQueues` request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListQueuesRequest<'a> {
    /// Queue name prefix filter
    pub queue_name_prefix: &'a str,
    /// Page size
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    /// Continuation token from the previous page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<&'a str>,
}

/// `ListQueues` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListQueuesResponse {
    /// Matching queue URLs, absent when none match
    #[serde(default)]
    pub queue_urls: Vec<String>,
    /// Present when more pages follow
    #[serde(default)]
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(rename = "__type", default)]
    kind: String,
    #[serde(alias = "Message", default)]
    message: Option<String>,
}

/// Service error code that `DeleteMessage` returns for an unknown handle.
pub const RECEIPT_HANDLE_INVALID: &str = "ReceiptHandleIsInvalid";

/// Short error code from a service error body.
///
/// `__type` may be namespaced (`com.amazonaws.sqs#QueueDoesNotExist`); only
/// the part after `#` is kept.
pub fn error_code(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    let code = parsed.kind.rsplit('#').next().unwrap_or_default().trim();
    (!code.is_empty()).then(|| code.to_string())
}

/// Map a non-2xx response onto a [`TransportError`].
pub fn classify_error(
    action: &str,
    status: u16,
    body: &str,
    queue: Option<&str>,
) -> TransportError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|b| b.message.clone())
        .unwrap_or_else(|| body.trim().to_string());

    let Some(code) = error_code(body) else {
        return TransportError::Service {
            action: action.to_string(),
            code: format!("HTTP {}", status),
            message,
        };
    };

    match code.as_str() {
        "QueueDoesNotExist" | "AWS.SimpleQueueService.NonExistentQueue" => {
            TransportError::QueueDoesNotExist(queue.unwrap_or("<unknown>").to_string())
        }
        "AccessDenied" | "AccessDeniedException" => TransportError::AccessDenied {
            action: action.to_string(),
            message,
        },
        "ServiceUnavailable" | "ThrottlingException" | "RequestThrottled" => {
            TransportError::Unavailable(format!("{}: {}", code, message))
        }
        _ => TransportError::Service {
            action: action.to_string(),
            code,
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receive_request_field_names() {
        let request = ReceiveMessageRequest {
            queue_url: "https://sqs/1/q",
            max_number_of_messages: 1,
            wait_time_seconds: 20,
        };
        let json: serde_json::Value = serde_json::to_value(&request).unwrap();
        assert_eq!(json["QueueUrl"], "https://sqs/1/q");
        assert_eq!(json["MaxNumberOfMessages"], 1);
        assert_eq!(json["WaitTimeSeconds"], 20);
    }

    #[test]
    fn test_receive_response_without_messages() {
        let parsed: ReceiveMessageResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.messages.is_empty());
    }

    #[test]
    fn test_receive_response_with_message() {
        let body = r#"{"Messages":[{"MessageId":"m1","ReceiptHandle":"rh-1","Body":"{}","MD5OfBody":"x"}]}"#;
        let parsed: ReceiveMessageResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.messages.len(), 1);
        assert_eq!(parsed.messages[0].receipt_handle, "rh-1");
        assert_eq!(parsed.messages[0].body, "{}");
    }

    #[test]
    fn test_list_queues_request_skips_empty_token() {
        let request = ListQueuesRequest {
            queue_name_prefix: "openvpn-requests-",
            max_results: None,
            next_token: None,
        };
        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json, r#"{"QueueNamePrefix":"openvpn-requests-"}"#);
    }

    #[test]
    fn test_error_code_strips_namespace() {
        let body = r#"{"__type":"com.amazonaws.sqs#QueueDoesNotExist","message":"gone"}"#;
        assert_eq!(error_code(body).as_deref(), Some("QueueDoesNotExist"));
        assert_eq!(error_code("not json"), None);
    }

    #[test]
    fn test_classify_queue_does_not_exist() {
        let body = r#"{"__type":"com.amazonaws.sqs#QueueDoesNotExist","message":"gone"}"#;
        let err = classify_error("SendMessage", 400, body, Some("https://sqs/1/q"));
        assert_eq!(err, TransportError::QueueDoesNotExist("https://sqs/1/q".to_string()));
    }

    #[test]
    fn test_classify_access_denied() {
        let body = r#"{"__type":"com.amazon.coral.service#AccessDeniedException","Message":"no"}"#;
        let err = classify_error("ListQueues", 400, body, None);
        assert!(err.is_access_denied());
    }

    #[test]
    fn test_classify_unstructured_body() {
        let err = classify_error("ReceiveMessage", 502, "Bad Gateway", None);
        assert_eq!(
            err,
            TransportError::Service {
                action: "ReceiveMessage".to_string(),
                code: "HTTP 502".to_string(),
                message: "Bad Gateway".to_string(),
            }
        );
    }
}
