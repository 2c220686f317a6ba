//! Testing utilities and assertion helpers.
//!
//! Pairs with [`LocalTransport`](crate::transports::LocalTransport) and the
//! in-memory store to assert on campaign behavior.
//!
//! # Example
//!
//! ```rust,ignore
//! use broadside::testing::*;
//!
//! #[tokio::test]
//! async fn test_campaign_flow() {
//!     // ... create and send a campaign against a LocalTransport ...
//!
//!     assert_sent_to(&transport, "user@example.com");
//!     assert_send_count(&transport, 3);
//!     assert_terminal_accounting(&campaign);
//! }
//! ```

use crate::campaign::Campaign;
use crate::transports::{LocalTransport, SentMessage};

fn format_message_summary(messages: &[SentMessage]) -> String {
    if messages.is_empty() {
        return "  (no messages sent)".to_string();
    }

    messages
        .iter()
        .enumerate()
        .map(|(i, m)| {
            format!(
                "  {}. To: {}, Subject: \"{}\"",
                i + 1,
                m.message.to,
                m.message.subject
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Assert that a message was delivered to a specific address.
///
/// # Panics
///
/// Panics if nothing was delivered to the address.
pub fn assert_sent_to(transport: &LocalTransport, address: &str) {
    assert!(
        transport.sent_to(address),
        "Expected a message to be delivered to '{}'.\n\nMessages sent:\n{}",
        address,
        format_message_summary(&transport.messages())
    );
}

/// Assert that no message was delivered to a specific address.
///
/// # Panics
///
/// Panics if a message was delivered to the address.
pub fn refute_sent_to(transport: &LocalTransport, address: &str) {
    assert!(
        !transport.sent_to(address),
        "Expected no message to be delivered to '{}'.\n\nMessages sent:\n{}",
        address,
        format_message_summary(&transport.messages())
    );
}

/// Assert that exactly N messages were delivered.
///
/// # Panics
///
/// Panics if the count doesn't match.
pub fn assert_send_count(transport: &LocalTransport, expected: usize) {
    let actual = transport.send_count();
    assert!(
        actual == expected,
        "Expected {} message(s) to be delivered, but {} were.\n\nMessages sent:\n{}",
        expected,
        actual,
        format_message_summary(&transport.messages())
    );
}

/// Assert the terminal accounting invariant: the campaign is terminal and
/// every counter balances (`sent + failed <= verified <= total`).
///
/// # Panics
///
/// Panics if the campaign is not terminal or a counter is out of balance.
pub fn assert_terminal_accounting(campaign: &Campaign) {
    assert!(
        campaign.status.is_terminal(),
        "Expected a terminal campaign, but status is {}",
        campaign.status
    );
    assert!(
        campaign.verified <= campaign.total,
        "verified ({}) exceeds total ({})",
        campaign.verified,
        campaign.total
    );
    assert!(
        campaign.sent + campaign.failed <= campaign.verified,
        "sent ({}) + failed ({}) exceeds verified ({})",
        campaign.sent,
        campaign.failed,
        campaign.verified
    );
}
