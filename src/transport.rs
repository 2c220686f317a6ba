//! Transport trait and delivery receipt types.
//!
//! Uses `#[async_trait]` rather than native async traits because the
//! controller holds an `Arc<dyn Transport>` picked at runtime. Delivery is
//! network-bound, so the per-call box is noise next to relay latency.
//! Callers who want static dispatch can invoke a concrete transport
//! directly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;

/// One rendered message addressed to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Message {
    pub fn new(
        to: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// Result of a successful delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    /// Message ID assigned by the relay.
    pub message_id: String,
    /// Optional relay-specific response data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_response: Option<serde_json::Value>,
}

impl DeliveryReceipt {
    pub fn new(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            provider_response: None,
        }
    }

    pub fn with_response(message_id: impl Into<String>, response: serde_json::Value) -> Self {
        Self {
            message_id: message_id.into(),
            provider_response: Some(response),
        }
    }
}

/// A mail relay the dispatcher hands rendered messages to.
///
/// The transport owns its own per-call timeout; a timeout surfaces as
/// [`DeliveryError::Transient`] and is retried. Permanent rejections
/// (e.g. malformed-mailbox responses) surface as
/// [`DeliveryError::Permanent`] and fail the recipient immediately.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Hand one message to the relay.
    async fn send(&self, message: &Message) -> Result<DeliveryReceipt, DeliveryError>;

    /// Transport name for logging and health reporting.
    fn name(&self) -> &'static str {
        "unknown"
    }

    /// Verify required configuration is present.
    ///
    /// Called by health probes; override in transports that need
    /// credentials or a reachable relay.
    fn validate_config(&self) -> Result<(), DeliveryError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_with_response() {
        let receipt =
            DeliveryReceipt::with_response("abc-123", serde_json::json!({ "code": 250 }));
        assert_eq!(receipt.message_id, "abc-123");
        assert!(receipt.provider_response.is_some());
    }

    #[test]
    fn test_receipt_serializes_without_empty_response() {
        let json = serde_json::to_value(DeliveryReceipt::new("id")).unwrap();
        assert!(json.get("provider_response").is_none());
    }
}
