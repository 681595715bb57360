//! Automatic AML risk scoring
//!
//! Score is additive: a sanctioned residence country contributes a fixed
//! block, failed exchanges contribute per failure up to a cap. PEP and
//! adverse-media screening are not wired to any provider and never hit.

use types::client::RiskLevel;
use types::compliance::AmlResult;

use crate::config::ComplianceConfig;

/// Map a score to its risk band
pub fn risk_level(score: f64) -> RiskLevel {
    if score < 30.0 {
        RiskLevel::Low
    } else if score < 60.0 {
        RiskLevel::Medium
    } else if score < 80.0 {
        RiskLevel::High
    } else {
        RiskLevel::Critical
    }
}

/// Failed-exchange contribution, capped
pub fn failure_contribution(failed_count: i64, config: &ComplianceConfig) -> f64 {
    let raw = failed_count.max(0) as f64 * config.failed_exchange_score;
    raw.min(config.failed_exchange_cap)
}

/// Score a client from residence country and failed-exchange history.
///
/// Pure: the same inputs always produce the same result.
pub fn score_risk(
    country_code: Option<&str>,
    failed_count: i64,
    config: &ComplianceConfig,
) -> AmlResult {
    let mut risk_score = 0.0;

    let sanctions_hit = country_code.is_some_and(|code| config.is_sanctioned(code));
    if sanctions_hit {
        risk_score += config.sanctions_score;
    }

    risk_score += failure_contribution(failed_count, config);

    let risk_level = risk_level(risk_score);
    AmlResult {
        risk_score,
        risk_level,
        sanctions_hit,
        pep_hit: false,
        adverse_media_hit: false,
        passed: !risk_level.is_elevated(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bands() {
        assert_eq!(risk_level(0.0), RiskLevel::Low);
        assert_eq!(risk_level(29.9), RiskLevel::Low);
        assert_eq!(risk_level(30.0), RiskLevel::Medium);
        assert_eq!(risk_level(60.0), RiskLevel::High);
        assert_eq!(risk_level(80.0), RiskLevel::Critical);
    }

    #[test]
    fn test_sanctioned_country_scores_exactly_80() {
        let config = ComplianceConfig::default();
        for code in ["IR", "KP", "SY"] {
            let result = score_risk(Some(code), 0, &config);
            assert!(result.sanctions_hit);
            assert_eq!(result.risk_score, 80.0);
            assert_eq!(result.risk_level, RiskLevel::Critical);
            assert!(!result.passed);
        }
    }

    #[test]
    fn test_failure_contribution_capped() {
        let config = ComplianceConfig::default();
        assert_eq!(failure_contribution(10, &config), 20.0);
        assert_eq!(failure_contribution(3, &config), 15.0);
        assert_eq!(score_risk(Some("DE"), 10, &config).risk_score, 20.0);
    }

    #[test]
    fn test_clean_client_passes() {
        let result = score_risk(None, 0, &ComplianceConfig::default());
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.passed);
        assert!(!result.pep_hit);
        assert!(!result.adverse_media_hit);
    }

    proptest! {
        #[test]
        fn prop_score_deterministic(failed in 0i64..1_000, sanctioned in any::<bool>()) {
            let config = ComplianceConfig::default();
            let country = if sanctioned { "IR" } else { "FR" };
            let a = score_risk(Some(country), failed, &config);
            let b = score_risk(Some(country), failed, &config);
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_score_bounded(failed in 0i64..1_000, sanctioned in any::<bool>()) {
            let config = ComplianceConfig::default();
            let country = if sanctioned { "SY" } else { "JP" };
            let result = score_risk(Some(country), failed, &config);
            prop_assert!(result.risk_score >= 0.0);
            prop_assert!(result.risk_score <= 100.0);
            prop_assert_eq!(result.passed, result.risk_score < 60.0);
        }
    }
}
