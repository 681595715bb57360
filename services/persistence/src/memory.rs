//! In-memory store
//!
//! Implements every store trait over `DashMap` tables. Used by the test
//! suites and by the gateway when no `DATABASE_URL` is configured.
//! Ordering rules match the Postgres queries: "newest first" sorts on
//! `created_at` and breaks ties on the time-sortable id.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;
use std::cmp::Reverse;
use types::client::{
    AmlStatus, Client, ClientSummary, KycStatus, NewClient, RiskLevel, VerificationLevel,
};
use types::compliance::{
    AmlCheck, ExchangeLimitTier, KycReview, KycVerification, KycVerificationStatus,
    WalletVerification,
};
use types::errors::StoreError;
use types::exchange::{
    Exchange, ExchangeFilter, ExchangePage, ExchangeRate, ExchangeStatus, ExchangeStatusUpdate,
    ExchangeView, NewExchange, Notification, TransactionLog,
};
use types::ids::{
    AmlCheckId, ClientId, ExchangeId, KycId, LimitOrderId, PriceAlertId, ReferralCodeId,
    WalletVerificationId,
};
use types::trading::{
    LimitOrder, LimitOrderStatus, PriceAlert, ReferralCode, ReferralLookup, ReferralStats,
    ReferralUsage, TradingAnalytics,
};
use uuid::Uuid;

use crate::store::{ClientStore, ComplianceStore, ExchangeStore, StoreResult, TradingStore};

#[derive(Default)]
pub struct MemoryStore {
    clients: DashMap<ClientId, Client>,
    exchanges: DashMap<ExchangeId, Exchange>,
    transaction_logs: DashMap<Uuid, TransactionLog>,
    notifications: DashMap<Uuid, Notification>,
    rates: DashMap<(String, String, String), ExchangeRate>,
    limits: DashMap<VerificationLevel, ExchangeLimitTier>,
    aml_checks: DashMap<AmlCheckId, AmlCheck>,
    kyc: DashMap<KycId, KycVerification>,
    wallets: DashMap<WalletVerificationId, WalletVerification>,
    referral_codes: DashMap<ReferralCodeId, ReferralCode>,
    referral_usage: DashMap<Uuid, ReferralUsage>,
    limit_orders: DashMap<LimitOrderId, LimitOrder>,
    price_alerts: DashMap<PriceAlertId, PriceAlert>,
    analytics: DashMap<(String, NaiveDate), TradingAnalytics>,
}

impl MemoryStore {
    /// Create an empty store with no limit tiers
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with the default limit table
    pub fn with_default_limits() -> Self {
        let store = Self::new();
        for tier in ExchangeLimitTier::defaults() {
            store.set_limit_tier(tier);
        }
        store
    }

    pub fn set_limit_tier(&self, tier: ExchangeLimitTier) {
        self.limits.insert(tier.verification_level, tier);
    }

    pub fn remove_limit_tier(&self, level: VerificationLevel) {
        self.limits.remove(&level);
    }

    /// Insert a fully-formed client row
    pub fn put_client(&self, client: Client) {
        self.clients.insert(client.id, client);
    }

    /// Insert a fully-formed exchange row (any status, any timestamp)
    pub fn put_exchange(&self, exchange: Exchange) {
        self.exchanges.insert(exchange.id, exchange);
    }

    pub fn put_analytics(&self, row: TradingAnalytics) {
        self.analytics
            .insert((row.currency_pair.clone(), row.date), row);
    }

    /// Transaction logs for one exchange, oldest first
    pub fn transaction_logs(&self, exchange_id: ExchangeId) -> Vec<TransactionLog> {
        let mut logs: Vec<(Uuid, TransactionLog)> = self
            .transaction_logs
            .iter()
            .filter(|e| e.value().exchange_id == exchange_id)
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        logs.sort_by_key(|(key, _)| *key);
        logs.into_iter().map(|(_, log)| log).collect()
    }

    pub fn notifications(&self, client_id: ClientId) -> Vec<Notification> {
        let mut items: Vec<(Uuid, Notification)> = self
            .notifications
            .iter()
            .filter(|e| e.value().client_id == client_id)
            .map(|e| (*e.key(), e.value().clone()))
            .collect();
        items.sort_by_key(|(key, _)| *key);
        items.into_iter().map(|(_, n)| n).collect()
    }

    fn view(&self, exchange: Exchange) -> ExchangeView {
        let client = self.clients.get(&exchange.client_id);
        ExchangeView {
            email: client.as_ref().map(|c| c.email.clone()),
            full_name: client.as_ref().and_then(|c| c.full_name.clone()),
            telegram_username: client.as_ref().and_then(|c| c.telegram_username.clone()),
            phone: client.as_ref().and_then(|c| c.phone.clone()),
            exchange,
        }
    }

    fn matches(filter: &ExchangeFilter, exchange: &Exchange) -> bool {
        filter.client_id.map_or(true, |id| exchange.client_id == id)
            && filter.status.map_or(true, |s| exchange.status == s)
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn get_client(&self, id: ClientId) -> StoreResult<Option<Client>> {
        Ok(self.clients.get(&id).map(|c| c.clone()))
    }

    async fn find_client_by_email(&self, email: &str) -> StoreResult<Option<Client>> {
        Ok(self
            .clients
            .iter()
            .find(|c| c.email == email)
            .map(|c| c.value().clone()))
    }

    async fn upsert_client(&self, new: NewClient) -> StoreResult<Client> {
        let now = Utc::now();
        let existing = self
            .clients
            .iter()
            .find(|c| c.email == new.email)
            .map(|c| *c.key());

        if let Some(id) = existing {
            let mut client = self
                .clients
                .get_mut(&id)
                .ok_or_else(|| StoreError::not_found("Client", id))?;
            client.phone = new.phone;
            client.full_name = new.full_name;
            client.telegram_username = new.telegram_username;
            client.updated_at = now;
            return Ok(client.clone());
        }

        let mut client = Client::new(new.email, now);
        client.full_name = new.full_name;
        client.phone = new.phone;
        client.telegram_username = new.telegram_username;
        client.country_code = new.country_code;
        if let Some(wallets) = new.wallet_addresses {
            client.wallet_addresses = wallets;
        }
        self.clients.insert(client.id, client.clone());
        Ok(client)
    }

    async fn list_clients(&self) -> StoreResult<Vec<ClientSummary>> {
        let clients: Vec<Client> = self.clients.iter().map(|c| c.value().clone()).collect();
        let mut summaries: Vec<ClientSummary> = clients
            .into_iter()
            .map(|client| {
                let (total, completed) = self
                    .exchanges
                    .iter()
                    .filter(|e| e.client_id == client.id)
                    .fold((0i64, 0i64), |(t, c), e| {
                        (t + 1, c + i64::from(e.status == ExchangeStatus::Completed))
                    });
                ClientSummary {
                    client,
                    total_exchanges: total,
                    completed_exchanges: completed,
                }
            })
            .collect();
        summaries.sort_by_key(|s| Reverse((s.client.created_at, s.client.id)));
        Ok(summaries)
    }

    async fn set_kyc_status(
        &self,
        id: ClientId,
        status: KycStatus,
        level: Option<VerificationLevel>,
    ) -> StoreResult<()> {
        let mut client = self
            .clients
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Client", id))?;
        client.kyc_status = status;
        if let Some(level) = level {
            client.verification_level = Some(level);
        }
        client.updated_at = Utc::now();
        Ok(())
    }

    async fn set_aml_status(
        &self,
        id: ClientId,
        status: AmlStatus,
        risk_level: RiskLevel,
    ) -> StoreResult<()> {
        let mut client = self
            .clients
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Client", id))?;
        client.aml_status = status;
        client.risk_level = risk_level;
        client.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl ExchangeStore for MemoryStore {
    async fn insert_exchange(&self, new: NewExchange) -> StoreResult<Exchange> {
        let exchange = new.into_exchange(ExchangeId::new(), Utc::now());
        self.exchanges.insert(exchange.id, exchange.clone());
        Ok(exchange)
    }

    async fn get_exchange(&self, id: ExchangeId) -> StoreResult<Option<ExchangeView>> {
        let exchange = self.exchanges.get(&id).map(|e| e.clone());
        Ok(exchange.map(|e| self.view(e)))
    }

    async fn list_exchanges(&self, filter: &ExchangeFilter) -> StoreResult<ExchangePage> {
        let mut matching: Vec<Exchange> = self
            .exchanges
            .iter()
            .filter(|e| Self::matches(filter, e.value()))
            .map(|e| e.value().clone())
            .collect();
        matching.sort_by_key(|e| Reverse((e.created_at, e.id)));

        let total = matching.len() as i64;
        let exchanges = matching
            .into_iter()
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .map(|e| self.view(e))
            .collect();

        Ok(ExchangePage {
            exchanges,
            total,
            limit: filter.limit,
            offset: filter.offset,
        })
    }

    async fn update_exchange_status(
        &self,
        id: ExchangeId,
        update: &ExchangeStatusUpdate,
        now: DateTime<Utc>,
    ) -> StoreResult<Exchange> {
        let mut exchange = self
            .exchanges
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Exchange", id))?;
        exchange.status = update.status;
        if let Some(hash) = &update.transaction_hash {
            exchange.transaction_hash = Some(hash.clone());
        }
        if update.status == ExchangeStatus::Completed {
            exchange.completed_at = Some(now);
        }
        Ok(exchange.clone())
    }

    async fn daily_volume(&self, client_id: ClientId, since: DateTime<Utc>) -> StoreResult<Decimal> {
        Ok(self
            .exchanges
            .iter()
            .filter(|e| {
                e.client_id == client_id
                    && e.created_at > since
                    && e.status.counts_toward_daily_usage()
            })
            .map(|e| e.from_amount)
            .sum())
    }

    async fn count_failed_exchanges(&self, client_id: ClientId) -> StoreResult<i64> {
        Ok(self
            .exchanges
            .iter()
            .filter(|e| e.client_id == client_id && e.status == ExchangeStatus::Failed)
            .count() as i64)
    }

    async fn append_transaction_log(&self, entry: TransactionLog) -> StoreResult<()> {
        self.transaction_logs.insert(Uuid::now_v7(), entry);
        Ok(())
    }

    async fn insert_notification(&self, notification: Notification) -> StoreResult<()> {
        self.notifications.insert(Uuid::now_v7(), notification);
        Ok(())
    }

    async fn recent_rates(&self, since: DateTime<Utc>) -> StoreResult<Vec<ExchangeRate>> {
        let mut rates: Vec<ExchangeRate> = self
            .rates
            .iter()
            .filter(|r| r.updated_at > since)
            .map(|r| r.value().clone())
            .collect();
        rates.sort_by_key(|r| Reverse(r.updated_at));
        Ok(rates)
    }

    async fn upsert_rate(&self, rate: ExchangeRate) -> StoreResult<()> {
        let key = (
            rate.from_currency.clone(),
            rate.to_currency.clone(),
            rate.source.clone(),
        );
        self.rates.insert(key, rate);
        Ok(())
    }
}

#[async_trait]
impl ComplianceStore for MemoryStore {
    async fn limit_tier(&self, level: VerificationLevel) -> StoreResult<Option<ExchangeLimitTier>> {
        Ok(self.limits.get(&level).map(|t| t.clone()))
    }

    async fn insert_aml_check(&self, check: &AmlCheck) -> StoreResult<()> {
        self.aml_checks.insert(check.id, check.clone());
        Ok(())
    }

    async fn recent_aml_checks(&self, client_id: ClientId, limit: u32) -> StoreResult<Vec<AmlCheck>> {
        let mut checks: Vec<AmlCheck> = self
            .aml_checks
            .iter()
            .filter(|c| c.client_id == client_id)
            .map(|c| c.value().clone())
            .collect();
        checks.sort_by_key(|c| Reverse((c.created_at, c.id)));
        checks.truncate(limit as usize);
        Ok(checks)
    }

    async fn insert_kyc(&self, verification: &KycVerification) -> StoreResult<()> {
        self.kyc.insert(verification.id, verification.clone());
        Ok(())
    }

    async fn latest_kyc(&self, client_id: ClientId) -> StoreResult<Option<KycVerification>> {
        Ok(self
            .kyc
            .iter()
            .filter(|k| k.client_id == client_id)
            .max_by_key(|k| (k.created_at, k.id))
            .map(|k| k.value().clone()))
    }

    async fn review_kyc(&self, id: KycId, review: KycReview) -> StoreResult<KycVerification> {
        let mut verification = self
            .kyc
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("KYC verification", id))?;
        match review {
            KycReview::Approve {
                verification_level,
                verified_at,
                expires_at,
            } => {
                verification.status = KycVerificationStatus::Approved;
                verification.verification_level = verification_level;
                verification.verified_at = Some(verified_at);
                verification.expires_at = Some(expires_at);
            }
            KycReview::Reject { reason } => {
                verification.status = KycVerificationStatus::Rejected;
                verification.rejection_reason = Some(reason);
            }
        }
        Ok(verification.clone())
    }

    async fn upsert_wallet_verification(
        &self,
        verification: WalletVerification,
    ) -> StoreResult<WalletVerification> {
        let existing = self
            .wallets
            .iter()
            .find(|w| {
                w.client_id == verification.client_id
                    && w.wallet_address == verification.wallet_address
                    && w.currency == verification.currency
            })
            .map(|w| *w.key());

        if let Some(id) = existing {
            let mut stored = self
                .wallets
                .get_mut(&id)
                .ok_or_else(|| StoreError::not_found("Wallet verification", id))?;
            stored.verification_code = verification.verification_code;
            return Ok(stored.clone());
        }

        self.wallets.insert(verification.id, verification.clone());
        Ok(verification)
    }

    async fn get_wallet_verification(
        &self,
        id: WalletVerificationId,
    ) -> StoreResult<Option<WalletVerification>> {
        Ok(self.wallets.get(&id).map(|w| w.clone()))
    }

    async fn mark_wallet_verified(
        &self,
        id: WalletVerificationId,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut wallet = self
            .wallets
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("Wallet verification", id))?;
        wallet.is_verified = true;
        wallet.verified_at = Some(now);
        Ok(())
    }
}

#[async_trait]
impl TradingStore for MemoryStore {
    async fn active_referral_code(&self, client_id: ClientId) -> StoreResult<Option<ReferralCode>> {
        Ok(self
            .referral_codes
            .iter()
            .find(|r| r.client_id == client_id && r.is_active)
            .map(|r| r.value().clone()))
    }

    async fn insert_referral_code(&self, code: &ReferralCode) -> StoreResult<()> {
        if self.referral_codes.iter().any(|r| r.code == code.code) {
            return Err(StoreError::Conflict(format!(
                "referral code {} already exists",
                code.code
            )));
        }
        self.referral_codes.insert(code.id, code.clone());
        Ok(())
    }

    async fn find_active_referral(&self, code: &str) -> StoreResult<Option<ReferralLookup>> {
        let referral = self
            .referral_codes
            .iter()
            .find(|r| r.code == code && r.is_active)
            .map(|r| r.value().clone());

        // Inner join: a code whose owner is gone is not a valid code
        Ok(referral.and_then(|referral| {
            self.clients.get(&referral.client_id).map(|owner| ReferralLookup {
                referrer_name: owner.full_name.clone(),
                referrer_email: owner.email.clone(),
                referral,
            })
        }))
    }

    async fn record_referral_usage(&self, usage: &ReferralUsage) -> StoreResult<()> {
        let mut code = self
            .referral_codes
            .get_mut(&usage.referral_code_id)
            .ok_or_else(|| StoreError::not_found("Referral code", usage.referral_code_id))?;
        code.total_referrals += 1;
        code.total_earnings_usd += usage.commission_usd;
        drop(code);

        self.referral_usage.insert(Uuid::now_v7(), usage.clone());
        Ok(())
    }

    async fn referral_stats(&self, client_id: ClientId) -> StoreResult<Option<ReferralStats>> {
        let referral = self
            .referral_codes
            .iter()
            .filter(|r| r.client_id == client_id)
            .max_by_key(|r| (r.created_at, r.id))
            .map(|r| r.value().clone());

        Ok(referral.map(|referral| {
            let amounts: Vec<Decimal> = self
                .referral_usage
                .iter()
                .filter(|u| u.referral_code_id == referral.id)
                .map(|u| u.commission_usd)
                .collect();
            ReferralStats {
                usage_count: amounts.len() as i64,
                total_commission: if amounts.is_empty() {
                    None
                } else {
                    Some(amounts.into_iter().sum())
                },
                referral,
            }
        }))
    }

    async fn insert_limit_order(&self, order: &LimitOrder) -> StoreResult<()> {
        self.limit_orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn list_limit_orders(
        &self,
        client_id: ClientId,
        status: Option<LimitOrderStatus>,
    ) -> StoreResult<Vec<LimitOrder>> {
        let mut orders: Vec<LimitOrder> = self
            .limit_orders
            .iter()
            .filter(|o| o.client_id == client_id && status.map_or(true, |s| o.status == s))
            .map(|o| o.value().clone())
            .collect();
        orders.sort_by_key(|o| Reverse((o.created_at, o.id)));
        Ok(orders)
    }

    async fn cancel_limit_order(&self, id: LimitOrderId) -> StoreResult<bool> {
        match self.limit_orders.get_mut(&id) {
            Some(mut order) if order.status == LimitOrderStatus::Active => {
                order.status = LimitOrderStatus::Cancelled;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_price_alert(&self, alert: &PriceAlert) -> StoreResult<()> {
        self.price_alerts.insert(alert.id, alert.clone());
        Ok(())
    }

    async fn active_price_alerts(&self, client_id: ClientId) -> StoreResult<Vec<PriceAlert>> {
        let mut alerts: Vec<PriceAlert> = self
            .price_alerts
            .iter()
            .filter(|a| a.client_id == client_id && a.is_active)
            .map(|a| a.value().clone())
            .collect();
        alerts.sort_by_key(|a| Reverse((a.created_at, a.id)));
        Ok(alerts)
    }

    async fn trading_analytics(
        &self,
        currency_pair: &str,
        since: NaiveDate,
    ) -> StoreResult<Vec<TradingAnalytics>> {
        let mut rows: Vec<TradingAnalytics> = self
            .analytics
            .iter()
            .filter(|a| a.currency_pair == currency_pair && a.date >= since)
            .map(|a| a.value().clone())
            .collect();
        rows.sort_by_key(|a| Reverse(a.date));
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn exchange(client_id: ClientId, amount: i64, status: ExchangeStatus, age: Duration) -> Exchange {
        let mut exchange = NewExchange {
            client_id,
            from_currency: "USDT".to_string(),
            to_currency: "BTC".to_string(),
            from_amount: Decimal::from(amount),
            to_amount: Decimal::ONE,
            exchange_rate: Decimal::ONE,
            from_wallet: String::new(),
            to_wallet: String::new(),
            notes: String::new(),
        }
        .into_exchange(ExchangeId::new(), Utc::now() - age);
        exchange.status = status;
        exchange
    }

    #[tokio::test]
    async fn test_daily_volume_window_and_statuses() {
        let store = MemoryStore::new();
        let client = ClientId::new();
        store.put_exchange(exchange(client, 100, ExchangeStatus::Pending, Duration::hours(1)));
        store.put_exchange(exchange(client, 200, ExchangeStatus::Completed, Duration::hours(2)));
        store.put_exchange(exchange(client, 400, ExchangeStatus::Failed, Duration::hours(1)));
        store.put_exchange(exchange(client, 800, ExchangeStatus::Processing, Duration::hours(30)));
        store.put_exchange(exchange(ClientId::new(), 1600, ExchangeStatus::Pending, Duration::hours(1)));

        let since = Utc::now() - Duration::hours(24);
        let volume = store.daily_volume(client, since).await.unwrap();
        assert_eq!(volume, Decimal::from(300));
        assert_eq!(store.count_failed_exchanges(client).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_client_by_email() {
        let store = MemoryStore::new();
        let first = store
            .upsert_client(NewClient {
                email: "alice@example.com".to_string(),
                full_name: Some("Alice".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        let second = store
            .upsert_client(NewClient {
                email: "alice@example.com".to_string(),
                full_name: Some("Alice B.".to_string()),
                phone: Some("+100".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.full_name.as_deref(), Some("Alice B."));
        assert_eq!(store.list_clients().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_exchanges_filters_and_pages() {
        let store = MemoryStore::new();
        let client = ClientId::new();
        for _ in 0..3 {
            store.put_exchange(exchange(client, 10, ExchangeStatus::Pending, Duration::minutes(5)));
        }
        store.put_exchange(exchange(client, 10, ExchangeStatus::Failed, Duration::minutes(5)));

        let filter = ExchangeFilter {
            client_id: Some(client),
            status: Some(ExchangeStatus::Pending),
            limit: 2,
            offset: 0,
        };
        let page = store.list_exchanges(&filter).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.exchanges.len(), 2);
    }

    #[tokio::test]
    async fn test_review_unknown_kyc_is_not_found() {
        let store = MemoryStore::new();
        let err = store
            .review_kyc(
                KycId::new(),
                KycReview::Reject {
                    reason: "blurry".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_only_active_orders() {
        let store = MemoryStore::new();
        let order = LimitOrder {
            id: LimitOrderId::new(),
            client_id: ClientId::new(),
            from_currency: "BTC".to_string(),
            to_currency: "USDT".to_string(),
            from_amount: Decimal::ONE,
            target_rate: Decimal::from(70_000),
            expiry_date: None,
            status: LimitOrderStatus::Active,
            created_at: Utc::now(),
        };
        store.insert_limit_order(&order).await.unwrap();

        assert!(store.cancel_limit_order(order.id).await.unwrap());
        assert!(!store.cancel_limit_order(order.id).await.unwrap());
    }
}
