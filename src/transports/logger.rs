//! Logger transport that only logs messages.
//!
//! Useful for staging environments or dry runs where you want to see what a
//! campaign would send without handing anything to a relay.

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::transport::{DeliveryReceipt, Message, Transport};

/// Transport that emits tracing events instead of sending.
pub struct LoggerTransport {
    /// If true, log the body as well as the envelope summary.
    log_full: bool,
}

impl LoggerTransport {
    /// Create a logger transport with brief output (recipient and subject).
    pub fn new() -> Self {
        Self { log_full: false }
    }

    /// Create a logger transport that also logs bodies at debug level.
    pub fn full() -> Self {
        Self { log_full: true }
    }
}

impl Default for LoggerTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for LoggerTransport {
    async fn send(&self, message: &Message) -> Result<DeliveryReceipt, DeliveryError> {
        let message_id = uuid::Uuid::new_v4().to_string();

        tracing::info!(
            message_id = %message_id,
            to = %message.to,
            subject = %message.subject,
            "Message logged"
        );
        if self.log_full {
            tracing::debug!(body = %message.body, "Message body");
        }

        Ok(DeliveryReceipt::new(message_id))
    }

    fn name(&self) -> &'static str {
        "logger"
    }
}
