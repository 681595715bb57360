//! KYC/AML records and compliance gate results

use crate::client::{RiskLevel, VerificationLevel};
use crate::ids::{AmlCheckId, ClientId, ExchangeId, KycId, WalletVerificationId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Per-tier exchange limits (static reference data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeLimitTier {
    pub verification_level: VerificationLevel,
    pub single_transaction_limit_usd: Decimal,
    pub daily_limit_usd: Decimal,
    pub requires_kyc: bool,
    pub requires_aml: bool,
}

impl ExchangeLimitTier {
    pub fn new(
        verification_level: VerificationLevel,
        single_transaction_limit_usd: Decimal,
        daily_limit_usd: Decimal,
        requires_kyc: bool,
        requires_aml: bool,
    ) -> Self {
        Self {
            verification_level,
            single_transaction_limit_usd,
            daily_limit_usd,
            requires_kyc,
            requires_aml,
        }
    }

    /// Reference table seeded into fresh databases
    pub fn defaults() -> Vec<ExchangeLimitTier> {
        vec![
            Self::new(
                VerificationLevel::None,
                Decimal::from(1_000),
                Decimal::from(2_000),
                false,
                false,
            ),
            Self::new(
                VerificationLevel::Basic,
                Decimal::from(10_000),
                Decimal::from(20_000),
                true,
                false,
            ),
            Self::new(
                VerificationLevel::Verified,
                Decimal::from(50_000),
                Decimal::from(100_000),
                true,
                true,
            ),
            Self::new(
                VerificationLevel::Premium,
                Decimal::from(250_000),
                Decimal::from(500_000),
                true,
                true,
            ),
        ]
    }
}

/// Reason the compliance gate refused a transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplianceIssue {
    SingleTransactionLimit { limit: Decimal },
    DailyLimit { remaining: Decimal },
    KycRequired,
    AmlRequired,
}

impl fmt::Display for ComplianceIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComplianceIssue::SingleTransactionLimit { limit } => {
                write!(f, "Amount exceeds single transaction limit of ${}", limit)
            }
            ComplianceIssue::DailyLimit { remaining } => {
                write!(f, "Amount exceeds remaining daily limit of ${}", remaining)
            }
            ComplianceIssue::KycRequired => f.write_str("KYC verification required"),
            ComplianceIssue::AmlRequired => {
                f.write_str("AML check required or high risk detected")
            }
        }
    }
}

// Issues go over the wire as their human-readable message.
impl Serialize for ComplianceIssue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of evaluating one proposed transaction against the gate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub can_proceed: bool,
    pub issues: Vec<ComplianceIssue>,
    pub verification_level: VerificationLevel,
    pub limits: ExchangeLimitTier,
    pub daily_used: Decimal,
    pub daily_remaining: Decimal,
}

impl Decision {
    pub fn requires_kyc(&self) -> bool {
        self.limits.requires_kyc
    }

    pub fn requires_aml(&self) -> bool {
        self.limits.requires_aml
    }

    /// Whether any amount-limit rule (single or daily) was triggered
    pub fn exceeds_limits(&self) -> bool {
        self.issues.iter().any(|issue| {
            matches!(
                issue,
                ComplianceIssue::SingleTransactionLimit { .. } | ComplianceIssue::DailyLimit { .. }
            )
        })
    }
}

/// Result of automatic AML risk scoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmlResult {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub sanctions_hit: bool,
    pub pep_hit: bool,
    pub adverse_media_hit: bool,
    pub passed: bool,
}

/// Persisted AML check; append-only, newest record is authoritative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmlCheck {
    pub id: AmlCheckId,
    pub client_id: ClientId,
    pub exchange_id: Option<ExchangeId>,
    pub check_type: String,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub sanctions_hit: bool,
    pub pep_hit: bool,
    pub adverse_media_hit: bool,
    pub check_result: serde_json::Value,
    pub checked_by: String,
    pub created_at: DateTime<Utc>,
}

impl AmlCheck {
    /// Record an automatic (system) check from a scoring result
    pub fn automatic(
        client_id: ClientId,
        exchange_id: Option<ExchangeId>,
        result: &AmlResult,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AmlCheckId::new(),
            client_id,
            exchange_id,
            check_type: "automatic".to_string(),
            risk_level: result.risk_level,
            risk_score: result.risk_score,
            sanctions_hit: result.sanctions_hit,
            pep_hit: result.pep_hit,
            adverse_media_hit: result.adverse_media_hit,
            check_result: serde_json::json!({ "timestamp": now.to_rfc3339() }),
            checked_by: "system".to_string(),
            created_at: now,
        }
    }
}

/// KYC verification status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycVerificationStatus {
    Reviewing,
    Approved,
    Rejected,
}

text_enum!(KycVerificationStatus, "KYC verification status" {
    Reviewing => "reviewing",
    Approved => "approved",
    Rejected => "rejected",
});

/// Documents submitted for KYC review
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KycDocuments {
    pub document_type: Option<String>,
    pub document_number: Option<String>,
    pub document_front_url: Option<String>,
    pub document_back_url: Option<String>,
    pub selfie_url: Option<String>,
    pub address_proof_url: Option<String>,
}

/// One KYC submission and its review outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KycVerification {
    pub id: KycId,
    pub client_id: ClientId,
    /// Requested tier while reviewing, granted tier once approved
    pub verification_level: VerificationLevel,
    pub status: KycVerificationStatus,
    #[serde(flatten)]
    pub documents: KycDocuments,
    pub rejection_reason: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl KycVerification {
    /// New submission awaiting review
    pub fn submitted(
        client_id: ClientId,
        verification_level: VerificationLevel,
        documents: KycDocuments,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: KycId::new(),
            client_id,
            verification_level,
            status: KycVerificationStatus::Reviewing,
            documents,
            rejection_reason: None,
            verified_at: None,
            expires_at: None,
            created_at: now,
        }
    }
}

/// Review decision applied to a KYC verification
#[derive(Debug, Clone, PartialEq)]
pub enum KycReview {
    Approve {
        verification_level: VerificationLevel,
        verified_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
    Reject {
        reason: String,
    },
}

/// Proof-of-ownership challenge for a client wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletVerification {
    pub id: WalletVerificationId,
    pub client_id: ClientId,
    pub wallet_address: String,
    pub currency: String,
    pub verification_code: String,
    pub verification_method: String,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_messages() {
        let issue = ComplianceIssue::SingleTransactionLimit {
            limit: Decimal::from(100),
        };
        assert_eq!(
            issue.to_string(),
            "Amount exceeds single transaction limit of $100"
        );
        assert_eq!(
            ComplianceIssue::KycRequired.to_string(),
            "KYC verification required"
        );
        assert_eq!(
            ComplianceIssue::AmlRequired.to_string(),
            "AML check required or high risk detected"
        );
    }

    #[test]
    fn test_issue_serializes_as_message() {
        let json = serde_json::to_string(&vec![ComplianceIssue::KycRequired]).unwrap();
        assert_eq!(json, r#"["KYC verification required"]"#);
    }

    #[test]
    fn test_default_tiers_cover_every_level() {
        let tiers = ExchangeLimitTier::defaults();
        for level in [
            VerificationLevel::None,
            VerificationLevel::Basic,
            VerificationLevel::Verified,
            VerificationLevel::Premium,
        ] {
            assert!(tiers.iter().any(|t| t.verification_level == level));
        }
        assert!(tiers
            .iter()
            .all(|t| t.single_transaction_limit_usd <= t.daily_limit_usd));
    }

    #[test]
    fn test_automatic_aml_check() {
        let result = AmlResult {
            risk_score: 80.0,
            risk_level: RiskLevel::Critical,
            sanctions_hit: true,
            pep_hit: false,
            adverse_media_hit: false,
            passed: false,
        };
        let check = AmlCheck::automatic(ClientId::new(), None, &result, Utc::now());
        assert_eq!(check.check_type, "automatic");
        assert_eq!(check.checked_by, "system");
        assert_eq!(check.risk_level, RiskLevel::Critical);
        assert!(check.check_result.get("timestamp").is_some());
    }
}
