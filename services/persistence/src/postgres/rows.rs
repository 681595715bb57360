//! Raw row shapes and their conversion into domain records
//!
//! Keyword columns are stored as TEXT; an unknown keyword surfaces as
//! `StoreError::CorruptRow` rather than a panic.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use std::str::FromStr;
use types::client::{Client, ClientSummary, VerificationLevel};
use types::compliance::{AmlCheck, ExchangeLimitTier, KycDocuments, KycVerification, WalletVerification};
use types::errors::{ParseEnumError, StoreError};
use types::exchange::{Exchange, ExchangeRate, ExchangeView};
use types::trading::{LimitOrder, PriceAlert, ReferralCode, ReferralLookup, ReferralStats, TradingAnalytics};
use uuid::Uuid;

use crate::store::StoreResult;

fn keyword<T>(table: &'static str, value: &str) -> StoreResult<T>
where
    T: FromStr<Err = ParseEnumError>,
{
    value.parse().map_err(|e: ParseEnumError| StoreError::CorruptRow {
        table,
        reason: e.to_string(),
    })
}

#[derive(Debug, FromRow)]
pub(crate) struct ClientRow {
    id: Uuid,
    email: String,
    full_name: Option<String>,
    phone: Option<String>,
    telegram_username: Option<String>,
    wallet_addresses: serde_json::Value,
    country_code: Option<String>,
    verification_level: Option<String>,
    kyc_status: String,
    aml_status: String,
    risk_level: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ClientRow> for Client {
    type Error = StoreError;

    fn try_from(row: ClientRow) -> StoreResult<Self> {
        let verification_level = row
            .verification_level
            .as_deref()
            .map(|level| keyword::<VerificationLevel>("clients", level))
            .transpose()?;

        Ok(Client {
            id: row.id.into(),
            email: row.email,
            full_name: row.full_name,
            phone: row.phone,
            telegram_username: row.telegram_username,
            wallet_addresses: row.wallet_addresses,
            country_code: row.country_code,
            verification_level,
            kyc_status: keyword("clients", &row.kyc_status)?,
            aml_status: keyword("clients", &row.aml_status)?,
            risk_level: keyword("clients", &row.risk_level)?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ClientSummaryRow {
    #[sqlx(flatten)]
    client: ClientRow,
    total_exchanges: i64,
    completed_exchanges: i64,
}

impl TryFrom<ClientSummaryRow> for ClientSummary {
    type Error = StoreError;

    fn try_from(row: ClientSummaryRow) -> StoreResult<Self> {
        Ok(ClientSummary {
            client: row.client.try_into()?,
            total_exchanges: row.total_exchanges,
            completed_exchanges: row.completed_exchanges,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ExchangeRow {
    id: Uuid,
    client_id: Uuid,
    from_currency: String,
    to_currency: String,
    from_amount: Decimal,
    to_amount: Decimal,
    exchange_rate: Decimal,
    from_wallet: String,
    to_wallet: String,
    status: String,
    notes: String,
    transaction_hash: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ExchangeRow> for Exchange {
    type Error = StoreError;

    fn try_from(row: ExchangeRow) -> StoreResult<Self> {
        Ok(Exchange {
            id: row.id.into(),
            client_id: row.client_id.into(),
            from_currency: row.from_currency,
            to_currency: row.to_currency,
            from_amount: row.from_amount,
            to_amount: row.to_amount,
            exchange_rate: row.exchange_rate,
            from_wallet: row.from_wallet,
            to_wallet: row.to_wallet,
            status: keyword("exchanges", &row.status)?,
            notes: row.notes,
            transaction_hash: row.transaction_hash,
            created_at: row.created_at,
            completed_at: row.completed_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ExchangeViewRow {
    #[sqlx(flatten)]
    exchange: ExchangeRow,
    email: Option<String>,
    full_name: Option<String>,
    telegram_username: Option<String>,
    phone: Option<String>,
}

impl TryFrom<ExchangeViewRow> for ExchangeView {
    type Error = StoreError;

    fn try_from(row: ExchangeViewRow) -> StoreResult<Self> {
        Ok(ExchangeView {
            exchange: row.exchange.try_into()?,
            email: row.email,
            full_name: row.full_name,
            telegram_username: row.telegram_username,
            phone: row.phone,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct RateRow {
    from_currency: String,
    to_currency: String,
    rate: Decimal,
    source: String,
    updated_at: DateTime<Utc>,
}

impl From<RateRow> for ExchangeRate {
    fn from(row: RateRow) -> Self {
        ExchangeRate {
            from_currency: row.from_currency,
            to_currency: row.to_currency,
            rate: row.rate,
            source: row.source,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct LimitTierRow {
    verification_level: String,
    single_transaction_limit_usd: Decimal,
    daily_limit_usd: Decimal,
    requires_kyc: bool,
    requires_aml: bool,
}

impl TryFrom<LimitTierRow> for ExchangeLimitTier {
    type Error = StoreError;

    fn try_from(row: LimitTierRow) -> StoreResult<Self> {
        Ok(ExchangeLimitTier {
            verification_level: keyword("exchange_limits", &row.verification_level)?,
            single_transaction_limit_usd: row.single_transaction_limit_usd,
            daily_limit_usd: row.daily_limit_usd,
            requires_kyc: row.requires_kyc,
            requires_aml: row.requires_aml,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AmlCheckRow {
    id: Uuid,
    client_id: Uuid,
    exchange_id: Option<Uuid>,
    check_type: String,
    risk_level: String,
    risk_score: f64,
    sanctions_hit: bool,
    pep_hit: bool,
    adverse_media_hit: bool,
    check_result: serde_json::Value,
    checked_by: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AmlCheckRow> for AmlCheck {
    type Error = StoreError;

    fn try_from(row: AmlCheckRow) -> StoreResult<Self> {
        Ok(AmlCheck {
            id: row.id.into(),
            client_id: row.client_id.into(),
            exchange_id: row.exchange_id.map(Into::into),
            check_type: row.check_type,
            risk_level: keyword("aml_checks", &row.risk_level)?,
            risk_score: row.risk_score,
            sanctions_hit: row.sanctions_hit,
            pep_hit: row.pep_hit,
            adverse_media_hit: row.adverse_media_hit,
            check_result: row.check_result,
            checked_by: row.checked_by,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct KycRow {
    id: Uuid,
    client_id: Uuid,
    verification_level: String,
    status: String,
    document_type: Option<String>,
    document_number: Option<String>,
    document_front_url: Option<String>,
    document_back_url: Option<String>,
    selfie_url: Option<String>,
    address_proof_url: Option<String>,
    rejection_reason: Option<String>,
    verified_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<KycRow> for KycVerification {
    type Error = StoreError;

    fn try_from(row: KycRow) -> StoreResult<Self> {
        Ok(KycVerification {
            id: row.id.into(),
            client_id: row.client_id.into(),
            verification_level: keyword("kyc_verifications", &row.verification_level)?,
            status: keyword("kyc_verifications", &row.status)?,
            documents: KycDocuments {
                document_type: row.document_type,
                document_number: row.document_number,
                document_front_url: row.document_front_url,
                document_back_url: row.document_back_url,
                selfie_url: row.selfie_url,
                address_proof_url: row.address_proof_url,
            },
            rejection_reason: row.rejection_reason,
            verified_at: row.verified_at,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct WalletRow {
    id: Uuid,
    client_id: Uuid,
    wallet_address: String,
    currency: String,
    verification_code: String,
    verification_method: String,
    is_verified: bool,
    verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<WalletRow> for WalletVerification {
    fn from(row: WalletRow) -> Self {
        WalletVerification {
            id: row.id.into(),
            client_id: row.client_id.into(),
            wallet_address: row.wallet_address,
            currency: row.currency,
            verification_code: row.verification_code,
            verification_method: row.verification_method,
            is_verified: row.is_verified,
            verified_at: row.verified_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReferralRow {
    id: Uuid,
    client_id: Uuid,
    code: String,
    discount_percent: Decimal,
    commission_percent: Decimal,
    is_active: bool,
    total_referrals: i64,
    total_earnings_usd: Decimal,
    created_at: DateTime<Utc>,
}

impl From<ReferralRow> for ReferralCode {
    fn from(row: ReferralRow) -> Self {
        ReferralCode {
            id: row.id.into(),
            client_id: row.client_id.into(),
            code: row.code,
            discount_percent: row.discount_percent,
            commission_percent: row.commission_percent,
            is_active: row.is_active,
            total_referrals: row.total_referrals,
            total_earnings_usd: row.total_earnings_usd,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReferralLookupRow {
    #[sqlx(flatten)]
    referral: ReferralRow,
    referrer_name: Option<String>,
    referrer_email: String,
}

impl From<ReferralLookupRow> for ReferralLookup {
    fn from(row: ReferralLookupRow) -> Self {
        ReferralLookup {
            referral: row.referral.into(),
            referrer_name: row.referrer_name,
            referrer_email: row.referrer_email,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReferralStatsRow {
    #[sqlx(flatten)]
    referral: ReferralRow,
    usage_count: i64,
    total_commission: Option<Decimal>,
}

impl From<ReferralStatsRow> for ReferralStats {
    fn from(row: ReferralStatsRow) -> Self {
        ReferralStats {
            referral: row.referral.into(),
            usage_count: row.usage_count,
            total_commission: row.total_commission,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct LimitOrderRow {
    id: Uuid,
    client_id: Uuid,
    from_currency: String,
    to_currency: String,
    from_amount: Decimal,
    target_rate: Decimal,
    expiry_date: Option<DateTime<Utc>>,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<LimitOrderRow> for LimitOrder {
    type Error = StoreError;

    fn try_from(row: LimitOrderRow) -> StoreResult<Self> {
        Ok(LimitOrder {
            id: row.id.into(),
            client_id: row.client_id.into(),
            from_currency: row.from_currency,
            to_currency: row.to_currency,
            from_amount: row.from_amount,
            target_rate: row.target_rate,
            expiry_date: row.expiry_date,
            status: keyword("limit_orders", &row.status)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct PriceAlertRow {
    id: Uuid,
    client_id: Uuid,
    currency: String,
    target_price: Decimal,
    condition: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<PriceAlertRow> for PriceAlert {
    type Error = StoreError;

    fn try_from(row: PriceAlertRow) -> StoreResult<Self> {
        Ok(PriceAlert {
            id: row.id.into(),
            client_id: row.client_id.into(),
            currency: row.currency,
            target_price: row.target_price,
            condition: keyword("price_alerts", &row.condition)?,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct AnalyticsRow {
    currency_pair: String,
    date: NaiveDate,
    volume_usd: Decimal,
    exchange_count: i64,
    avg_rate: Option<Decimal>,
    min_rate: Option<Decimal>,
    max_rate: Option<Decimal>,
}

impl From<AnalyticsRow> for TradingAnalytics {
    fn from(row: AnalyticsRow) -> Self {
        TradingAnalytics {
            currency_pair: row.currency_pair,
            date: row.date,
            volume_usd: row.volume_usd,
            exchange_count: row.exchange_count,
            avg_rate: row.avg_rate,
            min_rate: row.min_rate,
            max_rate: row.max_rate,
        }
    }
}

/// Convert a batch of rows, failing on the first corrupt one
pub(crate) fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::client::{KycStatus, RiskLevel};

    fn client_row(level: Option<&str>, risk: &str) -> ClientRow {
        ClientRow {
            id: Uuid::now_v7(),
            email: "row@example.com".to_string(),
            full_name: None,
            phone: None,
            telegram_username: None,
            wallet_addresses: serde_json::json!({}),
            country_code: Some("DE".to_string()),
            verification_level: level.map(str::to_string),
            kyc_status: "approved".to_string(),
            aml_status: "checked".to_string(),
            risk_level: risk.to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_client_row_conversion() {
        let client = Client::try_from(client_row(Some("basic"), "medium")).unwrap();
        assert_eq!(client.verification_level, Some(VerificationLevel::Basic));
        assert_eq!(client.kyc_status, KycStatus::Approved);
        assert_eq!(client.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_null_level_stays_none() {
        let client = Client::try_from(client_row(None, "low")).unwrap();
        assert_eq!(client.verification_level, None);
    }

    #[test]
    fn test_unknown_keyword_is_corrupt_row() {
        let err = Client::try_from(client_row(Some("basic"), "extreme")).unwrap_err();
        assert!(matches!(err, StoreError::CorruptRow { table: "clients", .. }));
    }
}
