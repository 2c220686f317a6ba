//! End-to-end campaign lifecycle tests against the in-memory transport
//! and store.

use std::sync::Arc;

use broadside::testing::*;
use broadside::transports::LocalTransport;
use broadside::{
    CampaignController, CampaignStatus, DispatchConfig, Disposition, EngineError, MemoryStore,
};

fn controller_with(transport: &LocalTransport) -> CampaignController {
    CampaignController::with_config(
        Arc::new(transport.clone()),
        MemoryStore::shared(),
        DispatchConfig::new().max_batch_size(4),
    )
}

/// Poll until the campaign leaves `Sending`; panics if it never settles.
async fn wait_terminal(controller: &CampaignController, id: &str) -> broadside::Campaign {
    for _ in 0..100_000 {
        let campaign = controller.status(id).unwrap();
        if campaign.status.is_terminal() {
            return campaign;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("campaign never reached a terminal state");
}

// ============================================================================
// Create
// ============================================================================

#[tokio::test]
async fn create_reports_validation_detail() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    let report = controller
        .create(
            "Launch",
            &["ann@example.com", "not-an-address", "ann@example.com"],
            "Hello",
            "Body",
        )
        .unwrap();

    assert_eq!(report.total_emails, 3);
    assert_eq!(report.valid_emails, 1);
    assert_eq!(report.invalid_emails, 2);
    assert!(report.verification[0].is_valid);
    assert_eq!(
        report.verification[2].error.as_deref(),
        Some("duplicate")
    );
}

#[tokio::test]
async fn create_with_no_valid_addresses_still_creates_draft() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    let report = controller.create("Empty", &["bad"], "S", "B").unwrap();
    let campaign = controller.status(&report.campaign_id).unwrap();

    assert_eq!(campaign.status, CampaignStatus::Draft);
    assert_eq!(campaign.verified, 0);
}

// ============================================================================
// Send to completion
// ============================================================================

#[tokio::test(start_paused = true)]
async fn campaign_completes_and_counts_balance() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    let report = controller
        .create(
            "Launch",
            &["ann@example.com", "bob@example.com", "cat@example.com"],
            "Hi {{name}}",
            "Your address is {{email}}",
        )
        .unwrap();
    let id = report.campaign_id;

    controller.send(&id).await.unwrap();
    let campaign = wait_terminal(&controller, &id).await;

    assert_eq!(campaign.status, CampaignStatus::Completed);
    assert_eq!(campaign.sent, 3);
    assert_eq!(campaign.failed, 0);
    assert!(campaign.started_at.is_some());
    assert!(campaign.completed_at.is_some());
    assert_terminal_accounting(&campaign);

    assert_send_count(&transport, 3);
    assert_sent_to(&transport, "ann@example.com");
    assert_sent_to(&transport, "bob@example.com");
    assert_sent_to(&transport, "cat@example.com");
}

#[tokio::test(start_paused = true)]
async fn templates_render_per_recipient() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    let report = controller
        .create(
            "Launch",
            &["ann@example.com"],
            "Hi {{name}}",
            "Sent to {{email}} from {{company}}",
        )
        .unwrap();

    controller.send(&report.campaign_id).await.unwrap();
    wait_terminal(&controller, &report.campaign_id).await;

    let message = transport.last_message().unwrap().message;
    assert_eq!(message.subject, "Hi ann");
    // Unbound placeholders pass through verbatim.
    assert_eq!(message.body, "Sent to ann@example.com from {{company}}");
}

#[tokio::test(start_paused = true)]
async fn invalid_addresses_are_never_attempted() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    let report = controller
        .create("Launch", &["ann@example.com", "bad"], "S", "B")
        .unwrap();

    controller.send(&report.campaign_id).await.unwrap();
    let campaign = wait_terminal(&controller, &report.campaign_id).await;

    assert_eq!(campaign.sent, 1);
    assert_send_count(&transport, 1);
    refute_sent_to(&transport, "bad");
}

#[tokio::test(start_paused = true)]
async fn campaign_with_zero_verified_completes_immediately() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    let report = controller.create("Empty", &["bad"], "S", "B").unwrap();
    controller.send(&report.campaign_id).await.unwrap();

    let campaign = wait_terminal(&controller, &report.campaign_id).await;
    assert_eq!(campaign.status, CampaignStatus::Completed);
    assert_eq!(campaign.sent, 0);
    assert_send_count(&transport, 0);
}

// ============================================================================
// Results
// ============================================================================

#[tokio::test(start_paused = true)]
async fn results_carry_per_recipient_dispositions() {
    let transport = LocalTransport::new();
    transport.fail_permanent("bad@example.com");
    let controller = controller_with(&transport);

    let report = controller
        .create(
            "Launch",
            &["ok@example.com", "bad@example.com"],
            "S",
            "B",
        )
        .unwrap();

    controller.send(&report.campaign_id).await.unwrap();
    wait_terminal(&controller, &report.campaign_id).await;

    let results = controller.results(&report.campaign_id).unwrap();
    assert_eq!(results.len(), 2);

    let ok = results.iter().find(|r| r.email == "ok@example.com").unwrap();
    assert_eq!(ok.disposition, Disposition::Sent);
    assert!(ok.error.is_none());

    let bad = results.iter().find(|r| r.email == "bad@example.com").unwrap();
    assert_eq!(bad.disposition, Disposition::Failed);
    assert!(bad.error.as_deref().unwrap().contains("rejected"));
}

#[tokio::test]
async fn results_before_send_are_empty() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    let report = controller.create("Launch", &["a@example.com"], "S", "B").unwrap();
    assert!(controller.results(&report.campaign_id).unwrap().is_empty());
}

// ============================================================================
// State machine errors
// ============================================================================

#[tokio::test]
async fn send_unknown_campaign_is_not_found() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    assert!(matches!(
        controller.send("missing").await,
        Err(EngineError::NotFound(_))
    ));
}

#[tokio::test(start_paused = true)]
async fn send_twice_is_invalid_state() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    let report = controller.create("Launch", &["a@example.com"], "S", "B").unwrap();
    controller.send(&report.campaign_id).await.unwrap();
    wait_terminal(&controller, &report.campaign_id).await;

    // Terminal states are final; the campaign must be recreated to retry.
    assert!(matches!(
        controller.send(&report.campaign_id).await,
        Err(EngineError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn stop_draft_campaign_is_invalid_state() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    let report = controller.create("Launch", &["a@example.com"], "S", "B").unwrap();
    assert!(matches!(
        controller.stop(&report.campaign_id).await,
        Err(EngineError::InvalidState { .. })
    ));
}

#[tokio::test]
async fn stop_unknown_campaign_is_not_found() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    assert!(matches!(
        controller.stop("missing").await,
        Err(EngineError::NotFound(_))
    ));
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn status_is_idempotent_without_concurrent_sends() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    let report = controller
        .create("Launch", &["a@example.com", "b@example.com"], "S", "B")
        .unwrap();

    let first = controller.status(&report.campaign_id).unwrap();
    let second = controller.status(&report.campaign_id).unwrap();
    assert_eq!(first.sent, second.sent);
    assert_eq!(first.failed, second.failed);
    assert_eq!(first.status, second.status);
}

#[tokio::test]
async fn list_orders_newest_first() {
    let transport = LocalTransport::new();
    let controller = controller_with(&transport);

    let first = controller.create("First", &["a@example.com"], "S", "B").unwrap();
    let second = controller.create("Second", &["b@example.com"], "S", "B").unwrap();

    let all = controller.list().unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, second.campaign_id);
    assert_eq!(all[1].id, first.campaign_id);
}
