//! Client records and compliance status

use crate::ids::ClientId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Verification tier controlling a client's exchange limits
///
/// A client with no approved KYC verification sits in `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationLevel {
    #[default]
    None,
    Basic,
    Verified,
    Premium,
}

text_enum!(VerificationLevel, "verification level" {
    None => "none",
    Basic => "basic",
    Verified => "verified",
    Premium => "premium",
});

/// KYC status cached on the client row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    #[default]
    None,
    Reviewing,
    Approved,
    Verified,
    Rejected,
}

text_enum!(KycStatus, "KYC status" {
    None => "none",
    Reviewing => "reviewing",
    Approved => "approved",
    Verified => "verified",
    Rejected => "rejected",
});

impl KycStatus {
    /// Whether this status satisfies a tier that requires KYC
    pub fn is_cleared(&self) -> bool {
        matches!(self, KycStatus::Approved | KycStatus::Verified)
    }
}

/// AML status cached on the client row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmlStatus {
    #[default]
    Pending,
    Checked,
}

text_enum!(AmlStatus, "AML status" {
    Pending => "pending",
    Checked => "checked",
});

/// Risk band derived from an AML risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

text_enum!(RiskLevel, "risk level" {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

impl RiskLevel {
    /// High and critical bands block tiers that require AML clearance
    pub fn is_elevated(&self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

/// Client record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub telegram_username: Option<String>,
    pub wallet_addresses: serde_json::Value,
    /// ISO 3166-1 alpha-2
    pub country_code: Option<String>,
    pub verification_level: Option<VerificationLevel>,
    pub kyc_status: KycStatus,
    pub aml_status: AmlStatus,
    pub risk_level: RiskLevel,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Create a fresh client with no verification history
    pub fn new(email: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: ClientId::new(),
            email: email.into(),
            full_name: None,
            phone: None,
            telegram_username: None,
            wallet_addresses: serde_json::Value::Object(Default::default()),
            country_code: None,
            verification_level: None,
            kyc_status: KycStatus::None,
            aml_status: AmlStatus::Pending,
            risk_level: RiskLevel::Low,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Effective tier; clients never approved fall back to `none`
    pub fn tier(&self) -> VerificationLevel {
        self.verification_level.unwrap_or_default()
    }
}

/// Fields accepted when creating or upserting a client (keyed by email)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewClient {
    pub email: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub telegram_username: Option<String>,
    pub country_code: Option<String>,
    #[serde(default)]
    pub wallet_addresses: Option<serde_json::Value>,
}

/// Client listing row with exchange counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientSummary {
    #[serde(flatten)]
    pub client: Client,
    pub total_exchanges: i64,
    pub completed_exchanges: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_defaults_to_none() {
        let client = Client::new("a@example.com", Utc::now());
        assert_eq!(client.tier(), VerificationLevel::None);
    }

    #[test]
    fn test_kyc_status_cleared() {
        assert!(KycStatus::Approved.is_cleared());
        assert!(KycStatus::Verified.is_cleared());
        assert!(!KycStatus::Reviewing.is_cleared());
        assert!(!KycStatus::Rejected.is_cleared());
        assert!(!KycStatus::None.is_cleared());
    }

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::High < RiskLevel::Critical);
        assert!(RiskLevel::High.is_elevated());
        assert!(!RiskLevel::Medium.is_elevated());
    }

    #[test]
    fn test_text_enum_round_trip_matches_serde() {
        let level: VerificationLevel = "verified".parse().unwrap();
        assert_eq!(level, VerificationLevel::Verified);
        assert_eq!(
            serde_json::to_string(&level).unwrap(),
            format!("\"{}\"", level.as_str())
        );
        assert!("gold".parse::<VerificationLevel>().is_err());
    }
}
