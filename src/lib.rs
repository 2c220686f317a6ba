//! # Broadside
//!
//! Validate, render, and dispatch bulk email campaigns in Rust.
//!
//! A campaign is one bulk-send job: a recipient list, a subject/body
//! template, and a lifecycle (`draft → sending → completed | stopped`).
//! The [`CampaignController`] validates addresses on creation, then fans
//! delivery out over a paced worker pool that retries transient relay
//! failures, records one outcome per recipient, and stops cleanly on
//! request without losing accounting of messages already sent.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use broadside::{CampaignController, MemoryStore};
//! use broadside::transports::SmtpTransport;
//! use std::sync::Arc;
//!
//! let transport = Arc::new(
//!     SmtpTransport::new("smtp.example.com", 587)
//!         .credentials("user", "password")
//!         .build(),
//! );
//! let controller = CampaignController::new(transport, MemoryStore::shared());
//!
//! let report = controller.create(
//!     "Launch",
//!     &["ann@example.com", "bob@example.com"],
//!     "Welcome {{name}}!",
//!     "Hi {{name}}, thanks for signing up.",
//! )?;
//!
//! controller.send(&report.campaign_id).await?;
//!
//! // Poll progress, stop mid-flight, or fetch per-recipient results:
//! let status = controller.status(&report.campaign_id)?;
//! let results = controller.results(&report.campaign_id)?;
//! ```
//!
//! ## Environment Variables
//!
//! [`DispatchConfig::from_env`] reads the deployment-level settings:
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MAX_BATCH_SIZE` | 50 | Concurrent delivery workers per campaign |
//! | `BATCH_DELAY_MS` | 500 | Per-worker spacing between send attempts |
//! | `MAX_RETRIES` | 3 | Extra attempts after a transient failure |
//!
//! ## Feature Flags
//!
//! - `smtp` - SMTP transport via lettre
//! - `metrics` - Prometheus-style counters (recipients/campaigns)
//!
//! ## Metrics
//!
//! Enable `features = ["metrics"]` to emit:
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `broadside_recipients_total` | Counter | status | Recipients resolved |
//! | `broadside_campaigns_total` | Counter | status | Campaigns finished |
//!
//! Install a recorder (e.g., `metrics-exporter-prometheus`) in your app to
//! collect them.

/// The version of the broadside crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

mod campaign;
mod config;
mod controller;
mod dispatch;
mod error;
mod store;
mod transport;

pub mod template;
pub mod testing;
pub mod transports;
pub mod validator;

// Re-exports
pub use campaign::{Campaign, CampaignStatus, Disposition, RecipientOutcome};
pub use config::DispatchConfig;
pub use controller::{CampaignController, CreateReport, ServiceHealth};
pub use error::{DeliveryError, EngineError, StoreError};
pub use store::{CampaignStore, MemoryStore};
pub use transport::{DeliveryReceipt, Message, Transport};
pub use validator::{verify_addresses, ValidationResult, VerificationReport};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::Campaign;
    pub use crate::CampaignController;
    pub use crate::CampaignStatus;
    pub use crate::CampaignStore;
    pub use crate::DeliveryError;
    pub use crate::DispatchConfig;
    pub use crate::EngineError;
    pub use crate::MemoryStore;
    pub use crate::Message;
    pub use crate::RecipientOutcome;
    pub use crate::Transport;
}
