//! Compliance gate
//!
//! Evaluates a proposed exchange against the client's tier limits, KYC
//! status and latest AML check. All rules run; every failing rule adds an
//! issue to the decision.
//!
//! Checks performed (in order):
//! 1. Amount within the single-transaction limit
//! 2. Amount within the remaining daily allowance
//! 3. KYC cleared, when the tier requires it
//! 4. A latest AML check exists and is not high/critical, when required

use rust_decimal::Decimal;
use types::client::Client;
use types::compliance::{AmlCheck, ComplianceIssue, Decision, ExchangeLimitTier};

/// Evaluate a proposed exchange of `proposed_usd`.
///
/// `limits` must be the row for `client.tier()`; `daily_used` is the
/// client's usage over the trailing window.
pub fn evaluate(
    client: &Client,
    limits: &ExchangeLimitTier,
    daily_used: Decimal,
    latest_aml: Option<&AmlCheck>,
    proposed_usd: Decimal,
) -> Decision {
    let daily_remaining = limits.daily_limit_usd - daily_used;
    let mut issues = Vec::new();

    if proposed_usd > limits.single_transaction_limit_usd {
        issues.push(ComplianceIssue::SingleTransactionLimit {
            limit: limits.single_transaction_limit_usd,
        });
    }

    if proposed_usd > daily_remaining {
        issues.push(ComplianceIssue::DailyLimit {
            remaining: daily_remaining,
        });
    }

    if limits.requires_kyc && !client.kyc_status.is_cleared() {
        issues.push(ComplianceIssue::KycRequired);
    }

    if limits.requires_aml && !aml_cleared(latest_aml) {
        issues.push(ComplianceIssue::AmlRequired);
    }

    Decision {
        can_proceed: issues.is_empty(),
        issues,
        verification_level: client.tier(),
        limits: limits.clone(),
        daily_used,
        daily_remaining,
    }
}

fn aml_cleared(latest: Option<&AmlCheck>) -> bool {
    latest.is_some_and(|check| !check.risk_level.is_elevated())
}
