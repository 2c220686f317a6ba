//! Delivery worker pool: paced, bounded-concurrency campaign dispatch.
//!
//! One [`DispatchJob`] runs per sending campaign. Verified recipients are
//! distributed round-robin over a fixed set of workers; each worker
//! processes its assignment in order, pacing every send attempt against its
//! own previous attempt so no single channel to the relay bursts. Transient
//! failures are retried with a fixed `batch_delay` backoff; permanent
//! failures are recorded immediately. Cancellation is cooperative: workers
//! observe the token before each recipient and before each retry, let any
//! in-flight send resolve, and abandon unattempted recipients without
//! recording outcomes for them.

use std::cmp;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinSet;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::campaign::RecipientOutcome;
use crate::config::DispatchConfig;
use crate::store::CampaignStore;
use crate::template::{recipient_bindings, render_message};
use crate::transport::{Message, Transport};

/// How a dispatch run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DispatchEnd {
    /// Every verified recipient has a recorded outcome.
    Completed,
    /// Stop was requested; the pool drained cleanly.
    Cancelled,
    /// At least one outcome could not be persisted at all.
    Degraded,
}

/// Everything a campaign dispatch needs, detached from the controller.
pub(crate) struct DispatchJob {
    pub campaign_id: String,
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
    pub transport: Arc<dyn Transport>,
    pub store: Arc<dyn CampaignStore>,
    pub config: DispatchConfig,
    pub cancel: CancellationToken,
}

struct WorkerCtx {
    campaign_id: String,
    subject: String,
    body: String,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CampaignStore>,
    config: DispatchConfig,
    cancel: CancellationToken,
    degraded: AtomicBool,
}

impl DispatchJob {
    /// Run the pool to completion and report how it ended.
    pub(crate) async fn run(self) -> DispatchEnd {
        let worker_count = cmp::max(
            1,
            cmp::min(self.config.max_batch_size, self.recipients.len()),
        );

        tracing::info!(
            campaign_id = %self.campaign_id,
            recipients = self.recipients.len(),
            workers = worker_count,
            "Dispatch started"
        );

        let ctx = Arc::new(WorkerCtx {
            campaign_id: self.campaign_id,
            subject: self.subject,
            body: self.body,
            transport: self.transport,
            store: self.store,
            config: self.config,
            cancel: self.cancel,
            degraded: AtomicBool::new(false),
        });

        // Round-robin assignment; each worker owns its slice in order.
        let mut assignments: Vec<Vec<String>> = vec![Vec::new(); worker_count];
        for (i, recipient) in self.recipients.into_iter().enumerate() {
            assignments[i % worker_count].push(recipient);
        }

        let mut workers = JoinSet::new();
        for assigned in assignments.into_iter().filter(|a| !a.is_empty()) {
            let ctx = Arc::clone(&ctx);
            workers.spawn(async move { run_worker(ctx, assigned).await });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                tracing::error!(
                    campaign_id = %ctx.campaign_id,
                    error = %err,
                    "Dispatch worker panicked"
                );
                ctx.degraded.store(true, Ordering::Relaxed);
            }
        }

        if ctx.cancel.is_cancelled() {
            DispatchEnd::Cancelled
        } else if ctx.degraded.load(Ordering::Relaxed) {
            DispatchEnd::Degraded
        } else {
            DispatchEnd::Completed
        }
    }
}

/// Process one worker's assignment sequentially.
async fn run_worker(ctx: Arc<WorkerCtx>, recipients: Vec<String>) {
    // Pace the first attempt too; the worker's start counts as its
    // previous attempt.
    let mut next_attempt_at = Instant::now() + ctx.config.batch_delay;

    for email in recipients {
        if ctx.cancel.is_cancelled() {
            tracing::debug!(
                campaign_id = %ctx.campaign_id,
                "Stop observed; abandoning remaining recipients"
            );
            return;
        }

        match process_recipient(&ctx, &mut next_attempt_at, &email).await {
            Some(outcome) => record_outcome(&ctx, outcome),
            // Cancelled while pacing or between retries: the recipient is
            // abandoned unsent, with no outcome.
            None => return,
        }
    }
}

/// Drive one recipient to resolution: render, send, retry transient
/// failures up to the budget. Returns `None` only when cancelled.
async fn process_recipient(
    ctx: &WorkerCtx,
    next_attempt_at: &mut Instant,
    email: &str,
) -> Option<RecipientOutcome> {
    let max_attempts = ctx.config.max_retries + 1;
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        if !pace(ctx, *next_attempt_at).await {
            return None;
        }
        // Pacing spaces send *starts*; mark this attempt's start now.
        *next_attempt_at = Instant::now() + ctx.config.batch_delay;

        // Re-render each attempt so a retry picks up current state.
        let rendered = render_message(&ctx.subject, &ctx.body, &recipient_bindings(email));
        let message = Message::new(email, rendered.subject, rendered.body);

        match ctx.transport.send(&message).await {
            Ok(receipt) => {
                tracing::debug!(
                    campaign_id = %ctx.campaign_id,
                    to = %email,
                    message_id = %receipt.message_id,
                    attempt,
                    "Delivered"
                );
                return Some(RecipientOutcome::sent(email, attempt));
            }
            Err(err) if err.is_transient() && attempt < max_attempts => {
                tracing::debug!(
                    campaign_id = %ctx.campaign_id,
                    to = %email,
                    attempt,
                    error = %err,
                    "Transient failure, will retry"
                );
            }
            Err(err) => {
                tracing::warn!(
                    campaign_id = %ctx.campaign_id,
                    to = %email,
                    attempt,
                    error = %err,
                    "Delivery failed"
                );
                return Some(RecipientOutcome::failed(email, attempt, err.to_string()));
            }
        }
    }
}

/// Wait out the pacing interval, or bail early on cancellation.
async fn pace(ctx: &WorkerCtx, until: Instant) -> bool {
    tokio::select! {
        _ = ctx.cancel.cancelled() => false,
        _ = sleep_until(until) => true,
    }
}

/// Persist one outcome. A lost outcome never vanishes silently: a failed
/// persist is retried as a `failed` outcome carrying the store error, and
/// a second failure marks the campaign degraded.
fn record_outcome(ctx: &WorkerCtx, outcome: RecipientOutcome) {
    #[cfg(feature = "metrics")]
    {
        let status = match outcome.disposition {
            crate::campaign::Disposition::Sent => "sent",
            crate::campaign::Disposition::Failed => "failed",
        };
        metrics::counter!("broadside_recipients_total", "status" => status).increment(1);
    }

    if let Err(err) = ctx.store.record_outcome(&ctx.campaign_id, outcome.clone()) {
        tracing::error!(
            campaign_id = %ctx.campaign_id,
            to = %outcome.email,
            error = %err,
            "Failed to persist outcome; recording recipient as failed"
        );
        let fallback = RecipientOutcome::failed(
            &outcome.email,
            outcome.attempts,
            format!("store failure: {}", err),
        );
        if let Err(err) = ctx.store.record_outcome(&ctx.campaign_id, fallback) {
            tracing::error!(
                campaign_id = %ctx.campaign_id,
                to = %outcome.email,
                error = %err,
                "Outcome lost to store failure"
            );
            ctx.degraded.store(true, Ordering::Relaxed);
        }
    }
}
