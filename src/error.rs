//! Error types for broadside.

use thiserror::Error;

use crate::campaign::CampaignStatus;

/// Errors surfaced to callers of the campaign controller.
///
/// Per-recipient delivery failures never show up here; they are recorded as
/// outcomes on the campaign instead. Only control operations (`create`,
/// `send`, `stop`, reads) fail with an `EngineError`.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// No campaign with the given id.
    #[error("Campaign not found: {0}")]
    NotFound(String),

    /// Operation requested against a campaign in the wrong state.
    #[error("Campaign is {actual}, expected {expected}")]
    InvalidState {
        expected: CampaignStatus,
        actual: CampaignStatus,
    },

    /// The campaign store failed; fatal for the in-flight operation.
    #[error("Store failure: {0}")]
    Store(#[from] StoreError),

    /// Configuration error (invalid env var, zero batch size, etc.)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// The campaign store is unavailable or rejected an operation.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors returned by a [`Transport`](crate::Transport) send attempt.
///
/// The distinction drives the retry policy: transient errors are retried up
/// to the configured limit, permanent errors fail the recipient immediately.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// Network/timeout/rate-limit response; eligible for retry.
    #[error("Transient delivery error: {0}")]
    Transient(String),

    /// Rejected recipient or other non-retryable response.
    #[error("Permanent delivery error: {0}")]
    Permanent(String),
}

impl DeliveryError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
