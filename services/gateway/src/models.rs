//! Request and response records for every gateway operation

use chrono::{DateTime, Utc};
use compliance::WalletChallenge;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use types::client::{ClientSummary, RiskLevel, VerificationLevel};
use types::compliance::{AmlCheck, ComplianceIssue, Decision, KycVerification};
use types::exchange::{ExchangeRate, ExchangeStatus, ExchangeView};
use types::ids::{
    AmlCheckId, ClientId, ExchangeId, KycId, LimitOrderId, PriceAlertId, ReferralCodeId,
    WalletVerificationId,
};
use types::trading::{AlertCondition, LimitOrder, PriceAlert, ReferralCode, ReferralStats, TradingAnalytics};

/// Plain acknowledgement
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self {
            success: true,
            message,
        }
    }
}

// ---------------------------------------------------------------------------
// /exchange
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ListExchangesQuery {
    pub client_id: Option<ClientId>,
    pub status: Option<ExchangeStatus>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GetExchangeQuery {
    pub id: Option<ExchangeId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExchangeResponse {
    pub exchange: ExchangeView,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientsResponse {
    pub clients: Vec<ClientSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RatesResponse {
    pub rates: Vec<ExchangeRate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExchangeRequest {
    pub client_id: Option<ClientId>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub telegram: Option<String>,
    pub from_currency: String,
    pub to_currency: String,
    pub from_amount: Decimal,
    pub to_amount: Decimal,
    pub exchange_rate: Decimal,
    /// USD price of one unit of `from_currency`
    pub from_rate_usd: Option<Decimal>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateExchangeResponse {
    pub success: bool,
    pub exchange_id: ExchangeId,
    pub client_id: ClientId,
    pub status: ExchangeStatus,
    pub created_at: DateTime<Utc>,
}

/// Body of a 400 returned when the amount breaks the tier limits
#[derive(Debug, Clone, Serialize)]
pub struct LimitRejection {
    pub success: bool,
    pub error: &'static str,
    pub issues: Vec<ComplianceIssue>,
    pub limit: Decimal,
    pub verification_level: VerificationLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateClientResponse {
    pub success: bool,
    pub client_id: ClientId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateRateRequest {
    pub from_currency: String,
    pub to_currency: String,
    pub rate: Decimal,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateExchangeStatusRequest {
    pub id: ExchangeId,
    pub status: ExchangeStatus,
    pub transaction_hash: Option<String>,
}

// ---------------------------------------------------------------------------
// /kyc-aml
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ClientQuery {
    pub client_id: ClientId,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckLimitsQuery {
    pub client_id: ClientId,
    pub amount_usd: Option<Decimal>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyWalletQuery {
    pub verification_id: WalletVerificationId,
    pub code: String,
}

/// Gate decision with the tier's requirement flags surfaced
#[derive(Debug, Clone, Serialize)]
pub struct DecisionResponse {
    #[serde(flatten)]
    pub decision: Decision,
    pub requires_kyc: bool,
    pub requires_aml: bool,
}

impl From<Decision> for DecisionResponse {
    fn from(decision: Decision) -> Self {
        Self {
            requires_kyc: decision.requires_kyc(),
            requires_aml: decision.requires_aml(),
            decision,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct KycStatusResponse {
    pub kyc: Option<KycVerification>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AmlStatusResponse {
    pub aml_checks: Vec<AmlCheck>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitKycResponse {
    pub success: bool,
    pub kyc_id: KycId,
    pub message: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformAmlCheckRequest {
    pub client_id: ClientId,
    pub exchange_id: Option<ExchangeId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AmlCheckResponse {
    pub success: bool,
    pub aml_check_id: AmlCheckId,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyExchangeRequest {
    pub exchange_id: ExchangeId,
    pub client_id: ClientId,
    pub amount_usd: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WalletVerificationRequest {
    pub client_id: ClientId,
    pub wallet_address: String,
    pub currency: String,
    pub verification_method: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletChallengeResponse {
    pub success: bool,
    #[serde(flatten)]
    pub challenge: WalletChallenge,
}

#[derive(Debug, Clone, Serialize)]
pub struct WalletVerifiedResponse {
    pub success: bool,
    pub verified: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApproveKycRequest {
    pub kyc_id: KycId,
    pub verification_level: Option<VerificationLevel>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RejectKycRequest {
    pub kyc_id: KycId,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectKycResponse {
    pub success: bool,
    pub message: &'static str,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// /trading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CodeQuery {
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralCodeResponse {
    pub referral_code: Option<ReferralCode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralCheckResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount_percent: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReferralStatsResponse {
    pub stats: Option<ReferralStats>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListLimitOrdersQuery {
    pub client_id: ClientId,
    /// Order status, `all` for every status; `active` when absent
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LimitOrdersResponse {
    pub orders: Vec<LimitOrder>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceAlertsResponse {
    pub alerts: Vec<PriceAlert>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnalyticsQuery {
    pub currency_pair: Option<String>,
    pub days: Option<u32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsResponse {
    pub analytics: Vec<TradingAnalytics>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReferralCodeRequest {
    pub client_id: ClientId,
    pub discount_percent: Option<Decimal>,
    pub commission_percent: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExistingReferralResponse {
    pub success: bool,
    pub code: String,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedReferralResponse {
    pub success: bool,
    pub referral_id: ReferralCodeId,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UseReferralCodeRequest {
    pub code: String,
    pub exchange_id: ExchangeId,
    pub commission_usd: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct UseReferralResponse {
    pub success: bool,
    pub commission_earned: Decimal,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLimitOrderRequest {
    pub client_id: ClientId,
    pub from_currency: String,
    pub to_currency: String,
    pub from_amount: Decimal,
    pub target_rate: Decimal,
    pub expiry_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LimitOrderCreatedResponse {
    pub success: bool,
    pub order_id: LimitOrderId,
    pub message: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePriceAlertRequest {
    pub client_id: ClientId,
    pub currency: String,
    pub target_price: Decimal,
    pub condition: AlertCondition,
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceAlertCreatedResponse {
    pub success: bool,
    pub alert_id: PriceAlertId,
    pub message: &'static str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelLimitOrderRequest {
    pub order_id: LimitOrderId,
}

#[derive(Debug, Clone, Serialize)]
pub struct CancelLimitOrderResponse {
    pub success: bool,
    pub cancelled: bool,
    pub message: &'static str,
}
