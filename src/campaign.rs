//! Campaign data model: one bulk-send job plus its per-recipient outcomes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a campaign.
///
/// `Completed`, `Stopped` and `Failed` are terminal: the campaign is never
/// resumed, a new one is created instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    /// Validated and persisted, not yet sent.
    Draft,
    /// Address validation in progress during creation.
    Verifying,
    /// Dispatch task running.
    Sending,
    /// Every verified recipient has a recorded outcome.
    Completed,
    /// Stopped on request; unattempted recipients remain unsent.
    Stopped,
    /// Dispatch aborted or outcome accounting was lost to a store failure.
    Failed,
}

impl CampaignStatus {
    /// Whether no further sends will occur for this campaign.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Stopped | Self::Failed)
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Draft => "draft",
            Self::Verifying => "verifying",
            Self::Sending => "sending",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One bulk-send job.
///
/// Counters hold the invariants `verified <= total` and
/// `sent + failed <= verified` at all times, with equality of the latter
/// once the campaign reaches `Completed` or `Stopped` with nothing in
/// flight. Mutated only through the controller and the store's
/// [`record_outcome`](crate::CampaignStore::record_outcome) path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    /// Opaque unique id (UUID v4 string).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Subject template; may contain `{{placeholders}}`.
    pub subject: String,
    /// Body template; may contain `{{placeholders}}`.
    pub body: String,
    /// Count of addresses supplied at creation.
    #[serde(rename = "totalEmails")]
    pub total: u64,
    /// Count that passed validation.
    #[serde(rename = "verifiedEmails")]
    pub verified: u64,
    /// Count successfully delivered.
    #[serde(rename = "sentEmails")]
    pub sent: u64,
    /// Count that exhausted all retries or failed permanently.
    #[serde(rename = "failedEmails")]
    pub failed: u64,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Campaign {
    /// Create a new campaign record in the `Verifying` state.
    pub fn new(
        name: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
        total: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            subject: subject.into(),
            body: body.into(),
            total,
            verified: 0,
            sent: 0,
            failed: 0,
            status: CampaignStatus::Verifying,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
        }
    }

    /// Whether every verified recipient has a recorded outcome.
    pub fn is_resolved(&self) -> bool {
        self.sent + self.failed == self.verified
    }
}

/// Final disposition of one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Sent,
    Failed,
}

/// Per-recipient outcome, recorded once the worker pool finishes
/// (successfully or exhaustively) processing one recipient. Immutable
/// afterward; owned by the campaign it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipientOutcome {
    pub email: String,
    #[serde(rename = "status")]
    pub disposition: Disposition,
    /// Total send attempts made for this recipient.
    pub attempts: u32,
    /// Last error message; present only when failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecipientOutcome {
    /// A successful delivery after `attempts` attempts.
    pub fn sent(email: impl Into<String>, attempts: u32) -> Self {
        Self {
            email: email.into(),
            disposition: Disposition::Sent,
            attempts,
            error: None,
        }
    }

    /// A failed delivery with the last error observed.
    pub fn failed(email: impl Into<String>, attempts: u32, error: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            disposition: Disposition::Failed,
            attempts,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_campaign_starts_verifying() {
        let campaign = Campaign::new("Launch", "Hi {{name}}", "Welcome!", 10);
        assert_eq!(campaign.status, CampaignStatus::Verifying);
        assert_eq!(campaign.total, 10);
        assert_eq!(campaign.verified, 0);
        assert_eq!(campaign.sent, 0);
        assert_eq!(campaign.failed, 0);
        assert!(campaign.started_at.is_none());
        assert!(!campaign.id.is_empty());
    }

    #[test]
    fn test_terminal_states() {
        assert!(CampaignStatus::Completed.is_terminal());
        assert!(CampaignStatus::Stopped.is_terminal());
        assert!(CampaignStatus::Failed.is_terminal());
        assert!(!CampaignStatus::Draft.is_terminal());
        assert!(!CampaignStatus::Verifying.is_terminal());
        assert!(!CampaignStatus::Sending.is_terminal());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&CampaignStatus::Sending).unwrap();
        assert_eq!(json, "\"sending\"");
    }

    #[test]
    fn test_campaign_wire_shape() {
        let mut campaign = Campaign::new("Launch", "Subject", "Body", 3);
        campaign.verified = 2;
        campaign.status = CampaignStatus::Draft;

        let json = serde_json::to_value(&campaign).unwrap();
        assert_eq!(json["totalEmails"], 3);
        assert_eq!(json["verifiedEmails"], 2);
        assert_eq!(json["sentEmails"], 0);
        assert_eq!(json["status"], "draft");
        assert!(json.get("startedAt").is_none());
    }

    #[test]
    fn test_outcome_wire_shape() {
        let outcome = RecipientOutcome::failed("a@example.com", 4, "timeout");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["email"], "a@example.com");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["attempts"], 4);
        assert_eq!(json["error"], "timeout");

        let sent = serde_json::to_value(RecipientOutcome::sent("b@example.com", 1)).unwrap();
        assert!(sent.get("error").is_none());
    }
}
