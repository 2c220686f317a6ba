//! Address validation for campaign creation.
//!
//! Pure, synchronous, no I/O. Given the raw address list submitted with a
//! campaign, produces one [`ValidationResult`] per entry plus derived
//! counts. Deliverability checks (DNS/MX) are deliberately out of scope;
//! this is syntax and intra-batch duplicate detection only.

use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Outcome of validating one submitted address.
///
/// Ephemeral: returned from campaign creation for display, persisted only
/// as aggregate counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// The address as submitted (trimmed).
    pub email: String,
    pub is_valid: bool,
    /// Reason the address was rejected; present only when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    fn valid(email: String) -> Self {
        Self {
            email,
            is_valid: true,
            error: None,
        }
    }

    fn invalid(email: String, reason: impl Into<String>) -> Self {
        Self {
            email,
            is_valid: false,
            error: Some(reason.into()),
        }
    }
}

/// Validation results for one submitted batch, in submission order.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub results: Vec<ValidationResult>,
    /// Count supplied.
    pub total: u64,
    /// Count of valid, unique addresses.
    pub verified: u64,
}

impl VerificationReport {
    /// `total - verified`.
    pub fn invalid(&self) -> u64 {
        self.total - self.verified
    }

    /// The valid, unique addresses in submission order.
    pub fn verified_addresses(&self) -> Vec<String> {
        self.results
            .iter()
            .filter(|r| r.is_valid)
            .map(|r| r.email.clone())
            .collect()
    }
}

/// Validate an ordered batch of raw address strings.
///
/// Checks, per address: non-empty after trimming, RFC-compliant grammar
/// with at least one dot in the domain, and uniqueness within the batch.
/// Duplicate detection is case-insensitive; the first occurrence wins and
/// later ones are marked invalid with reason `duplicate`.
///
/// An empty batch yields an empty report with zero counts, not an error.
pub fn verify_addresses<S: AsRef<str>>(addresses: &[S]) -> VerificationReport {
    let mut seen: HashSet<String> = HashSet::with_capacity(addresses.len());
    let mut report = VerificationReport::default();

    for raw in addresses {
        let email = raw.as_ref().trim().to_string();
        report.total += 1;

        let result = if email.is_empty() {
            ValidationResult::invalid(email, "empty")
        } else if !is_well_formed(&email) {
            ValidationResult::invalid(email, "invalid syntax")
        } else if !seen.insert(email.to_ascii_lowercase()) {
            ValidationResult::invalid(email, "duplicate")
        } else {
            report.verified += 1;
            ValidationResult::valid(email)
        };

        report.results.push(result);
    }

    report
}

/// Syntactic check: RFC 5321/5322 grammar plus a dotted domain.
///
/// `EmailAddress` accepts dotless domains like `user@localhost`; a bulk
/// campaign never wants those, so require at least one dot after the `@`.
fn is_well_formed(email: &str) -> bool {
    if !EmailAddress::is_valid(email) {
        return false;
    }
    email
        .rsplit_once('@')
        .is_some_and(|(_, domain)| domain.contains('.'))
}
