//! Campaign store trait and the in-memory implementation.
//!
//! The store is the durable record of campaigns and per-recipient outcomes.
//! The engine reads and writes through the [`CampaignStore`] seam and never
//! assumes a particular backend; [`MemoryStore`] is the bundled
//! implementation used in development and tests.

use parking_lot::RwLock;
use std::collections::HashMap;

use crate::campaign::{Campaign, Disposition, RecipientOutcome};
use crate::error::StoreError;

/// Durable get/put for campaigns and their outcomes.
///
/// `record_outcome` must append the outcome and bump the campaign's
/// matching counter as one atomic unit, so readers never observe an
/// outcome without its count (or the reverse). A failure anywhere is an
/// explicit [`StoreError`]; the engine never silently drops accounting on
/// store failure.
pub trait CampaignStore: Send + Sync {
    /// Persist a new campaign together with its verified recipient list.
    fn insert(&self, campaign: Campaign, verified_recipients: Vec<String>)
        -> Result<(), StoreError>;

    /// Fetch a campaign snapshot by id.
    fn get(&self, id: &str) -> Result<Option<Campaign>, StoreError>;

    /// All campaigns, most recently created first.
    fn list(&self) -> Result<Vec<Campaign>, StoreError>;

    /// Apply a mutation to a campaign under the store's lock.
    ///
    /// Returns `false` when the id is unknown.
    fn update(
        &self,
        id: &str,
        mutator: &mut dyn FnMut(&mut Campaign),
    ) -> Result<bool, StoreError>;

    /// The verified recipient list captured at creation.
    fn verified_recipients(&self, id: &str) -> Result<Vec<String>, StoreError>;

    /// Append one recipient outcome and increment the matching
    /// `sent`/`failed` counter atomically.
    fn record_outcome(&self, id: &str, outcome: RecipientOutcome) -> Result<(), StoreError>;

    /// All outcomes recorded so far, in completion order.
    fn outcomes(&self, id: &str) -> Result<Vec<RecipientOutcome>, StoreError>;
}

#[derive(Debug, Clone)]
struct CampaignRecord {
    campaign: Campaign,
    recipients: Vec<String>,
    outcomes: Vec<RecipientOutcome>,
}

/// Thread-safe in-memory campaign store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, CampaignRecord>>,
    /// Campaign ids in creation order.
    order: RwLock<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store wrapped in an Arc for sharing.
    pub fn shared() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::new())
    }
}

impl CampaignStore for MemoryStore {
    fn insert(
        &self,
        campaign: Campaign,
        verified_recipients: Vec<String>,
    ) -> Result<(), StoreError> {
        let id = campaign.id.clone();
        let mut records = self.records.write();
        let mut order = self.order.write();

        records.insert(
            id.clone(),
            CampaignRecord {
                campaign,
                recipients: verified_recipients,
                outcomes: Vec::new(),
            },
        );
        order.push(id);
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Campaign>, StoreError> {
        let records = self.records.read();
        Ok(records.get(id).map(|r| r.campaign.clone()))
    }

    fn list(&self) -> Result<Vec<Campaign>, StoreError> {
        let records = self.records.read();
        let order = self.order.read();

        // Newest first.
        Ok(order
            .iter()
            .rev()
            .filter_map(|id| records.get(id).map(|r| r.campaign.clone()))
            .collect())
    }

    fn update(
        &self,
        id: &str,
        mutator: &mut dyn FnMut(&mut Campaign),
    ) -> Result<bool, StoreError> {
        let mut records = self.records.write();
        match records.get_mut(id) {
            Some(record) => {
                mutator(&mut record.campaign);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn verified_recipients(&self, id: &str) -> Result<Vec<String>, StoreError> {
        let records = self.records.read();
        records
            .get(id)
            .map(|r| r.recipients.clone())
            .ok_or_else(|| StoreError::new(format!("unknown campaign {}", id)))
    }

    fn record_outcome(&self, id: &str, outcome: RecipientOutcome) -> Result<(), StoreError> {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| StoreError::new(format!("unknown campaign {}", id)))?;

        // Counter bump and outcome append happen under one write lock.
        match outcome.disposition {
            Disposition::Sent => record.campaign.sent += 1,
            Disposition::Failed => record.campaign.failed += 1,
        }
        record.outcomes.push(outcome);
        Ok(())
    }

    fn outcomes(&self, id: &str) -> Result<Vec<RecipientOutcome>, StoreError> {
        let records = self.records.read();
        records
            .get(id)
            .map(|r| r.outcomes.clone())
            .ok_or_else(|| StoreError::new(format!("unknown campaign {}", id)))
    }
}
