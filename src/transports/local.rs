//! Local transport for development and testing.
//!
//! Captures delivered messages in memory and lets tests script failures per
//! recipient, so retry and partial-failure paths can be exercised without a
//! relay.
//!
//! # Testing Usage
//!
//! ```rust,ignore
//! use broadside::transports::LocalTransport;
//!
//! let transport = LocalTransport::new();
//! transport.fail_transient("flaky@example.com", 2); // succeed on 3rd attempt
//! transport.fail_permanent("rejected@example.com");
//!
//! // ... run a campaign against the transport ...
//!
//! assert!(transport.sent_to("ok@example.com"));
//! assert_eq!(transport.send_count(), 2);
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::DeliveryError;
use crate::transport::{DeliveryReceipt, Message, Transport};

/// A message the transport accepted, with capture metadata.
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Message id assigned on capture.
    pub id: String,
    pub message: Message,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
enum FailurePlan {
    /// Fail the next `remaining` attempts with a transient error.
    Transient { remaining: u32 },
    /// Reject every attempt permanently.
    Permanent,
}

#[derive(Debug, Default)]
struct Inner {
    sent: Vec<SentMessage>,
    plans: HashMap<String, FailurePlan>,
    /// If set, every send fails transiently with this message.
    fail_all: Option<String>,
}

/// Transport that stores messages in memory.
///
/// Cloning shares the captured mailbox and failure scripts.
#[derive(Debug, Default, Clone)]
pub struct LocalTransport {
    inner: Arc<Mutex<Inner>>,
}

impl LocalTransport {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Failure Scripting (for testing)
    // =========================================================================

    /// Fail the next `times` attempts to `address` with a transient error,
    /// then deliver normally.
    pub fn fail_transient(&self, address: impl Into<String>, times: u32) {
        self.inner
            .lock()
            .plans
            .insert(address.into(), FailurePlan::Transient { remaining: times });
    }

    /// Reject every attempt to `address` permanently.
    pub fn fail_permanent(&self, address: impl Into<String>) {
        self.inner
            .lock()
            .plans
            .insert(address.into(), FailurePlan::Permanent);
    }

    /// Fail every send with a transient error until cleared.
    pub fn fail_all(&self, message: impl Into<String>) {
        self.inner.lock().fail_all = Some(message.into());
    }

    /// Clear the blanket failure and all per-address scripts.
    pub fn clear_failures(&self) {
        let mut inner = self.inner.lock();
        inner.fail_all = None;
        inner.plans.clear();
    }

    // =========================================================================
    // Capture Access (for assertions)
    // =========================================================================

    /// All captured messages, oldest first.
    pub fn messages(&self) -> Vec<SentMessage> {
        self.inner.lock().sent.clone()
    }

    /// Count of captured messages.
    pub fn send_count(&self) -> usize {
        self.inner.lock().sent.len()
    }

    /// Whether any message was delivered to `address`.
    pub fn sent_to(&self, address: &str) -> bool {
        self.inner
            .lock()
            .sent
            .iter()
            .any(|m| m.message.to.eq_ignore_ascii_case(address))
    }

    /// The most recently captured message.
    pub fn last_message(&self) -> Option<SentMessage> {
        self.inner.lock().sent.last().cloned()
    }

    /// Messages matching a predicate.
    pub fn find_messages<F>(&self, predicate: F) -> Vec<SentMessage>
    where
        F: Fn(&Message) -> bool,
    {
        self.inner
            .lock()
            .sent
            .iter()
            .filter(|m| predicate(&m.message))
            .cloned()
            .collect()
    }

    /// Drop all captured messages.
    pub fn clear(&self) {
        self.inner.lock().sent.clear();
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&self, message: &Message) -> Result<DeliveryReceipt, DeliveryError> {
        let mut inner = self.inner.lock();

        if let Some(ref reason) = inner.fail_all {
            return Err(DeliveryError::Transient(reason.clone()));
        }

        match inner.plans.get_mut(&message.to) {
            Some(FailurePlan::Permanent) => {
                return Err(DeliveryError::Permanent(format!(
                    "mailbox rejected: {}",
                    message.to
                )));
            }
            Some(FailurePlan::Transient { remaining }) if *remaining > 0 => {
                *remaining -= 1;
                return Err(DeliveryError::Transient(format!(
                    "simulated timeout for {}",
                    message.to
                )));
            }
            _ => {}
        }

        let id = uuid::Uuid::new_v4().to_string();
        inner.sent.push(SentMessage {
            id: id.clone(),
            message: message.clone(),
            sent_at: Utc::now(),
        });
        Ok(DeliveryReceipt::new(id))
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
