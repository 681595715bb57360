//! Database-access capability injected into every handler
//!
//! Handlers never open connections themselves; they receive an
//! `Arc<dyn Store>` and call these methods. Each method is one logical
//! statement (or a short fixed sequence) against the current database
//! state. No method holds locks across calls, so read-then-write
//! sequences built on top of them are not isolated from concurrent
//! requests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use types::client::{AmlStatus, Client, ClientSummary, KycStatus, NewClient, RiskLevel, VerificationLevel};
use types::compliance::{AmlCheck, ExchangeLimitTier, KycReview, KycVerification, WalletVerification};
use types::errors::StoreError;
use types::exchange::{
    Exchange, ExchangeFilter, ExchangePage, ExchangeRate, ExchangeStatusUpdate, ExchangeView,
    NewExchange, Notification, TransactionLog,
};
use types::ids::{ClientId, ExchangeId, KycId, LimitOrderId, WalletVerificationId};
use types::trading::{
    LimitOrder, LimitOrderStatus, PriceAlert, ReferralCode, ReferralLookup, ReferralStats,
    ReferralUsage, TradingAnalytics,
};

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn get_client(&self, id: ClientId) -> StoreResult<Option<Client>>;

    async fn find_client_by_email(&self, email: &str) -> StoreResult<Option<Client>>;

    /// Insert a client, or refresh contact fields of the one holding `email`
    async fn upsert_client(&self, client: NewClient) -> StoreResult<Client>;

    /// All clients, newest first, with exchange counters
    async fn list_clients(&self) -> StoreResult<Vec<ClientSummary>>;

    /// Update the cached KYC status; `level` replaces the tier when present
    async fn set_kyc_status(
        &self,
        id: ClientId,
        status: KycStatus,
        level: Option<VerificationLevel>,
    ) -> StoreResult<()>;

    async fn set_aml_status(
        &self,
        id: ClientId,
        status: AmlStatus,
        risk_level: RiskLevel,
    ) -> StoreResult<()>;
}

#[async_trait]
pub trait ExchangeStore: Send + Sync {
    /// Insert in `pending` state
    async fn insert_exchange(&self, exchange: NewExchange) -> StoreResult<Exchange>;

    async fn get_exchange(&self, id: ExchangeId) -> StoreResult<Option<ExchangeView>>;

    /// Newest first, paged; `total` counts every row matching the filter
    async fn list_exchanges(&self, filter: &ExchangeFilter) -> StoreResult<ExchangePage>;

    /// Apply a status transition; `completed` stamps `completed_at`
    async fn update_exchange_status(
        &self,
        id: ExchangeId,
        update: &ExchangeStatusUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Exchange>;

    /// Sum of `from_amount` for exchanges created after `since` whose
    /// status counts toward daily usage
    async fn daily_volume(&self, client_id: ClientId, since: DateTime<Utc>) -> StoreResult<Decimal>;

    /// All-time count of the client's `failed` exchanges
    async fn count_failed_exchanges(&self, client_id: ClientId) -> StoreResult<i64>;

    async fn append_transaction_log(&self, entry: TransactionLog) -> StoreResult<()>;

    async fn insert_notification(&self, notification: Notification) -> StoreResult<()>;

    /// Rates updated after `since`, newest first
    async fn recent_rates(&self, since: DateTime<Utc>) -> StoreResult<Vec<ExchangeRate>>;

    /// Insert or replace the rate for (from, to, source)
    async fn upsert_rate(&self, rate: ExchangeRate) -> StoreResult<()>;
}

#[async_trait]
pub trait ComplianceStore: Send + Sync {
    async fn limit_tier(&self, level: VerificationLevel) -> StoreResult<Option<ExchangeLimitTier>>;

    async fn insert_aml_check(&self, check: &AmlCheck) -> StoreResult<()>;

    /// Up to `limit` checks for the client, newest first
    async fn recent_aml_checks(&self, client_id: ClientId, limit: u32) -> StoreResult<Vec<AmlCheck>>;

    async fn latest_aml_check(&self, client_id: ClientId) -> StoreResult<Option<AmlCheck>> {
        Ok(self.recent_aml_checks(client_id, 1).await?.into_iter().next())
    }

    async fn insert_kyc(&self, verification: &KycVerification) -> StoreResult<()>;

    async fn latest_kyc(&self, client_id: ClientId) -> StoreResult<Option<KycVerification>>;

    /// Record a review outcome; fails with `NotFound` for unknown ids
    async fn review_kyc(&self, id: KycId, review: KycReview) -> StoreResult<KycVerification>;

    /// Create the challenge for (client, address, currency) or replace its code
    async fn upsert_wallet_verification(
        &self,
        verification: WalletVerification,
    ) -> StoreResult<WalletVerification>;

    async fn get_wallet_verification(
        &self,
        id: WalletVerificationId,
    ) -> StoreResult<Option<WalletVerification>>;

    async fn mark_wallet_verified(
        &self,
        id: WalletVerificationId,
        now: DateTime<Utc>,
    ) -> StoreResult<()>;
}

#[async_trait]
pub trait TradingStore: Send + Sync {
    async fn active_referral_code(&self, client_id: ClientId) -> StoreResult<Option<ReferralCode>>;

    async fn insert_referral_code(&self, code: &ReferralCode) -> StoreResult<()>;

    async fn find_active_referral(&self, code: &str) -> StoreResult<Option<ReferralLookup>>;

    /// Record the usage and bump the code's referral and earnings totals
    async fn record_referral_usage(&self, usage: &ReferralUsage) -> StoreResult<()>;

    async fn referral_stats(&self, client_id: ClientId) -> StoreResult<Option<ReferralStats>>;

    async fn insert_limit_order(&self, order: &LimitOrder) -> StoreResult<()>;

    /// Newest first; `None` returns every status
    async fn list_limit_orders(
        &self,
        client_id: ClientId,
        status: Option<LimitOrderStatus>,
    ) -> StoreResult<Vec<LimitOrder>>;

    /// Cancel an `active` order; returns whether a row transitioned
    async fn cancel_limit_order(&self, id: LimitOrderId) -> StoreResult<bool>;

    async fn insert_price_alert(&self, alert: &PriceAlert) -> StoreResult<()>;

    /// Active alerts, newest first
    async fn active_price_alerts(&self, client_id: ClientId) -> StoreResult<Vec<PriceAlert>>;

    /// Rows for `currency_pair` dated on or after `since`, newest first
    async fn trading_analytics(
        &self,
        currency_pair: &str,
        since: NaiveDate,
    ) -> StoreResult<Vec<TradingAnalytics>>;
}

/// Full database capability handed to the gateway
pub trait Store: ClientStore + ExchangeStore + ComplianceStore + TradingStore {}

impl<T> Store for T where T: ClientStore + ExchangeStore + ComplianceStore + TradingStore {}
