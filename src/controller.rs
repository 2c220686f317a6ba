//! Campaign controller: lifecycle state machine and the engine's API surface.
//!
//! The controller owns the injected transport and store, runs the validator
//! on creation, launches one dispatch task per sending campaign, and
//! answers progress/stop queries. The presentation layer talks only to this
//! type and renders what it returns; per-recipient failures never surface
//! here, only in the results view.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::campaign::{Campaign, CampaignStatus, RecipientOutcome};
use crate::config::DispatchConfig;
use crate::dispatch::{DispatchEnd, DispatchJob};
use crate::error::EngineError;
use crate::store::CampaignStore;
use crate::transport::Transport;
use crate::validator::{verify_addresses, ValidationResult};

/// Response to campaign creation: the new id plus validation detail.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateReport {
    pub campaign_id: String,
    pub total_emails: u64,
    pub valid_emails: u64,
    pub invalid_emails: u64,
    pub verification: Vec<ValidationResult>,
}

/// Health probe over the engine's collaborators.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub transport: &'static str,
    pub transport_ok: bool,
    pub store_ok: bool,
}

struct ActiveDispatch {
    cancel: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

/// Owns campaign lifecycle state and orchestrates validation, rendering and
/// dispatch.
pub struct CampaignController {
    transport: Arc<dyn Transport>,
    store: Arc<dyn CampaignStore>,
    config: DispatchConfig,
    active: Arc<Mutex<HashMap<String, Arc<ActiveDispatch>>>>,
}

impl CampaignController {
    /// Create a controller with default dispatch settings.
    pub fn new(transport: Arc<dyn Transport>, store: Arc<dyn CampaignStore>) -> Self {
        Self::with_config(transport, store, DispatchConfig::default())
    }

    /// Create a controller with explicit dispatch settings.
    pub fn with_config(
        transport: Arc<dyn Transport>,
        store: Arc<dyn CampaignStore>,
        config: DispatchConfig,
    ) -> Self {
        Self {
            transport,
            store,
            config,
            active: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The dispatch settings in effect, read-only for display.
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Validate the address list and persist a new draft campaign.
    ///
    /// Per-address validation failures are recorded in the report, never an
    /// error; an entirely invalid list still creates a campaign with
    /// `verified = 0`.
    pub fn create(
        &self,
        name: &str,
        addresses: &[impl AsRef<str>],
        subject: &str,
        body: &str,
    ) -> Result<CreateReport, EngineError> {
        let mut campaign = Campaign::new(name, subject, body, addresses.len() as u64);
        let id = campaign.id.clone();

        let report = verify_addresses(addresses);
        campaign.verified = report.verified;
        campaign.status = CampaignStatus::Draft;

        self.store
            .insert(campaign, report.verified_addresses())?;

        tracing::info!(
            campaign_id = %id,
            total = report.total,
            verified = report.verified,
            invalid = report.invalid(),
            "Campaign created"
        );

        Ok(CreateReport {
            campaign_id: id,
            total_emails: report.total,
            valid_emails: report.verified,
            invalid_emails: report.invalid(),
            verification: report.results,
        })
    }

    /// Transition a draft campaign to `Sending` and start dispatch.
    ///
    /// Returns as soon as the dispatch task is launched; poll
    /// [`status`](Self::status) for progress.
    pub async fn send(&self, id: &str) -> Result<(), EngineError> {
        let campaign = self.require(id)?;
        let recipients = self.store.verified_recipients(id)?;
        let cancel = CancellationToken::new();

        let mut active = self.active.lock();
        if active.contains_key(id) {
            return Err(EngineError::InvalidState {
                expected: CampaignStatus::Draft,
                actual: CampaignStatus::Sending,
            });
        }

        // Check-and-transition in one store update, under the active-map
        // lock, so concurrent sends cannot both observe Draft.
        let started_at = Utc::now();
        let mut previous = None;
        self.store.update(id, &mut |c| {
            previous = Some(c.status);
            if c.status == CampaignStatus::Draft {
                c.status = CampaignStatus::Sending;
                c.started_at = Some(started_at);
            }
        })?;
        let Some(previous) = previous else {
            return Err(EngineError::NotFound(id.to_string()));
        };
        if previous != CampaignStatus::Draft {
            return Err(EngineError::InvalidState {
                expected: CampaignStatus::Draft,
                actual: previous,
            });
        }

        let job = DispatchJob {
            campaign_id: id.to_string(),
            subject: campaign.subject,
            body: campaign.body,
            recipients,
            transport: Arc::clone(&self.transport),
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            cancel: cancel.clone(),
        };

        let entry = Arc::new(ActiveDispatch {
            cancel,
            handle: Mutex::new(None),
        });
        active.insert(id.to_string(), Arc::clone(&entry));

        let store = Arc::clone(&self.store);
        let registry = Arc::clone(&self.active);
        let campaign_id = id.to_string();
        let handle = tokio::spawn(async move {
            let end = job.run().await;
            finalize(&*store, &campaign_id, end);
            registry.lock().remove(&campaign_id);
        });
        *entry.handle.lock() = Some(handle);

        tracing::info!(campaign_id = %id, "Campaign dispatch launched");
        Ok(())
    }

    /// Signal cancellation and wait for the worker pool to drain.
    ///
    /// Returns once the campaign has reached `Stopped`. Stopping a campaign
    /// that is not sending is an explicit error, not a silent no-op.
    pub async fn stop(&self, id: &str) -> Result<(), EngineError> {
        let entry = {
            let mut active = self.active.lock();
            let campaign = self.require(id)?;
            if campaign.status != CampaignStatus::Sending {
                return Err(EngineError::InvalidState {
                    expected: CampaignStatus::Sending,
                    actual: campaign.status,
                });
            }
            active.remove(id)
        };

        let Some(entry) = entry else {
            // Dispatch finished between the status read and here.
            tracing::warn!(campaign_id = %id, "No active dispatch to stop");
            return Ok(());
        };

        entry.cancel.cancel();
        let handle = entry.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::error!(campaign_id = %id, error = %err, "Dispatch task failed to join");
            }
        }

        tracing::info!(campaign_id = %id, "Campaign stopped");
        Ok(())
    }

    /// Current counters and status; a consistent snapshot, never a counter
    /// observed mid-increment.
    pub fn status(&self, id: &str) -> Result<Campaign, EngineError> {
        self.require(id)
    }

    /// All campaigns, most recently created first.
    pub fn list(&self) -> Result<Vec<Campaign>, EngineError> {
        Ok(self.store.list()?)
    }

    /// Per-recipient outcomes recorded so far.
    ///
    /// Meaningful once the campaign is terminal, but callable any time.
    pub fn results(&self, id: &str) -> Result<Vec<RecipientOutcome>, EngineError> {
        self.require(id)?;
        Ok(self.store.outcomes(id)?)
    }

    /// Probe the injected collaborators for display on a health page.
    pub fn check_services(&self) -> ServiceHealth {
        ServiceHealth {
            transport: self.transport.name(),
            transport_ok: self.transport.validate_config().is_ok(),
            store_ok: self.store.list().is_ok(),
        }
    }

    fn require(&self, id: &str) -> Result<Campaign, EngineError> {
        self.store
            .get(id)?
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }
}

/// Persist the terminal status once the pool has drained.
fn finalize(store: &dyn CampaignStore, campaign_id: &str, end: DispatchEnd) {
    let status = match end {
        DispatchEnd::Completed => CampaignStatus::Completed,
        DispatchEnd::Cancelled => CampaignStatus::Stopped,
        DispatchEnd::Degraded => CampaignStatus::Failed,
    };
    let completed_at = Utc::now();

    let result = store.update(campaign_id, &mut |c| {
        c.status = status;
        c.completed_at = Some(completed_at);
    });
    if let Err(err) = result {
        tracing::error!(
            campaign_id = %campaign_id,
            error = %err,
            "Failed to persist terminal status"
        );
    }

    #[cfg(feature = "metrics")]
    {
        let label = match status {
            CampaignStatus::Completed => "completed",
            CampaignStatus::Stopped => "stopped",
            _ => "failed",
        };
        metrics::counter!("broadside_campaigns_total", "status" => label).increment(1);
    }

    tracing::info!(campaign_id = %campaign_id, status = %status, "Campaign finished");
}
