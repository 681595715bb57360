//! Postgres store
//!
//! Every statement is parameterized; list filters bind `NULL` for absent
//! criteria instead of splicing SQL text. Connections come from a shared
//! `PgPool` and return to it when each query future completes, including
//! on error.

mod rows;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, info};
use types::client::{
    AmlStatus, Client, ClientSummary, KycStatus, NewClient, RiskLevel, VerificationLevel,
};
use types::compliance::{AmlCheck, ExchangeLimitTier, KycReview, KycVerification, WalletVerification};
use types::errors::StoreError;
use types::exchange::{
    Exchange, ExchangeFilter, ExchangePage, ExchangeRate, ExchangeStatus, ExchangeStatusUpdate,
    ExchangeView, NewExchange, Notification, TransactionLog,
};
use types::ids::{ClientId, ExchangeId, KycId, LimitOrderId, WalletVerificationId};
use types::trading::{
    LimitOrder, LimitOrderStatus, PriceAlert, ReferralCode, ReferralLookup, ReferralStats,
    ReferralUsage, TradingAnalytics,
};
use uuid::Uuid;

use self::rows::{
    convert_all, AmlCheckRow, AnalyticsRow, ClientRow, ClientSummaryRow, ExchangeRow,
    ExchangeViewRow, KycRow, LimitOrderRow, LimitTierRow, PriceAlertRow, RateRow,
    ReferralLookupRow, ReferralRow, ReferralStatsRow, WalletRow,
};
use crate::store::{ClientStore, ComplianceStore, ExchangeStore, StoreResult, TradingStore};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

fn db_err(err: sqlx::Error) -> StoreError {
    if let Some(db) = err.as_database_error() {
        match db.code().as_deref() {
            Some(UNIQUE_VIOLATION) => return StoreError::Conflict(db.message().to_string()),
            // A row pointing at a client, exchange or code that does not exist
            Some(FOREIGN_KEY_VIOLATION) => {
                return StoreError::not_found(
                    "Referenced record",
                    db.constraint().unwrap_or_default(),
                )
            }
            _ => {}
        }
    }
    StoreError::Database(err.to_string())
}

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(db_err)?;
        info!(max_connections, "Connected to Postgres");
        Ok(Self::new(pool))
    }

    /// Apply the bundled schema migrations
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))
    }
}

#[async_trait]
impl ClientStore for PgStore {
    async fn get_client(&self, id: ClientId) -> StoreResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Client::try_from).transpose()
    }

    async fn find_client_by_email(&self, email: &str) -> StoreResult<Option<Client>> {
        let row = sqlx::query_as::<_, ClientRow>("SELECT * FROM clients WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.map(Client::try_from).transpose()
    }

    async fn upsert_client(&self, client: NewClient) -> StoreResult<Client> {
        let wallets = client
            .wallet_addresses
            .unwrap_or_else(|| serde_json::json!({}));

        let row = sqlx::query_as::<_, ClientRow>(
            r#"
            INSERT INTO clients
                (id, email, full_name, phone, telegram_username, country_code, wallet_addresses)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (email) DO UPDATE SET
                phone = EXCLUDED.phone,
                full_name = EXCLUDED.full_name,
                telegram_username = EXCLUDED.telegram_username,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(ClientId::new().as_uuid())
        .bind(&client.email)
        .bind(&client.full_name)
        .bind(&client.phone)
        .bind(&client.telegram_username)
        .bind(&client.country_code)
        .bind(&wallets)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row.try_into()
    }

    async fn list_clients(&self) -> StoreResult<Vec<ClientSummary>> {
        let rows = sqlx::query_as::<_, ClientSummaryRow>(
            r#"
            SELECT c.*,
                   COUNT(e.id) AS total_exchanges,
                   COALESCE(SUM(CASE WHEN e.status = 'completed' THEN 1 ELSE 0 END), 0)::BIGINT
                       AS completed_exchanges
            FROM clients c
            LEFT JOIN exchanges e ON c.id = e.client_id
            GROUP BY c.id
            ORDER BY c.created_at DESC, c.id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        convert_all(rows)
    }

    async fn set_kyc_status(
        &self,
        id: ClientId,
        status: KycStatus,
        level: Option<VerificationLevel>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE clients
            SET kyc_status = $2,
                verification_level = COALESCE($3, verification_level),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(level.map(|l| l.as_str()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Client", id));
        }
        Ok(())
    }

    async fn set_aml_status(
        &self,
        id: ClientId,
        status: AmlStatus,
        risk_level: RiskLevel,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE clients SET aml_status = $2, risk_level = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(risk_level.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Client", id));
        }
        Ok(())
    }
}

#[async_trait]
impl ExchangeStore for PgStore {
    async fn insert_exchange(&self, exchange: NewExchange) -> StoreResult<Exchange> {
        let row = sqlx::query_as::<_, ExchangeRow>(
            r#"
            INSERT INTO exchanges
                (id, client_id, from_currency, to_currency, from_amount, to_amount,
                 exchange_rate, from_wallet, to_wallet, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', $10)
            RETURNING *
            "#,
        )
        .bind(ExchangeId::new().as_uuid())
        .bind(exchange.client_id.as_uuid())
        .bind(&exchange.from_currency)
        .bind(&exchange.to_currency)
        .bind(exchange.from_amount)
        .bind(exchange.to_amount)
        .bind(exchange.exchange_rate)
        .bind(&exchange.from_wallet)
        .bind(&exchange.to_wallet)
        .bind(&exchange.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row.try_into()
    }

    async fn get_exchange(&self, id: ExchangeId) -> StoreResult<Option<ExchangeView>> {
        let row = sqlx::query_as::<_, ExchangeViewRow>(
            r#"
            SELECT e.*, c.email, c.full_name, c.telegram_username, c.phone
            FROM exchanges e
            LEFT JOIN clients c ON e.client_id = c.id
            WHERE e.id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(ExchangeView::try_from).transpose()
    }

    async fn list_exchanges(&self, filter: &ExchangeFilter) -> StoreResult<ExchangePage> {
        let client_id: Option<Uuid> = filter.client_id.map(|id| *id.as_uuid());
        let status: Option<&str> = filter.status.map(|s| s.as_str());

        let rows = sqlx::query_as::<_, ExchangeViewRow>(
            r#"
            SELECT e.*, c.email, c.full_name, c.telegram_username, c.phone
            FROM exchanges e
            LEFT JOIN clients c ON e.client_id = c.id
            WHERE ($1::UUID IS NULL OR e.client_id = $1)
              AND ($2::TEXT IS NULL OR e.status = $2)
            ORDER BY e.created_at DESC, e.id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(client_id)
        .bind(status)
        .bind(i64::from(filter.limit))
        .bind(i64::from(filter.offset))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM exchanges e
            WHERE ($1::UUID IS NULL OR e.client_id = $1)
              AND ($2::TEXT IS NULL OR e.status = $2)
            "#,
        )
        .bind(client_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        debug!(total, returned = rows.len(), "Listed exchanges");

        Ok(ExchangePage {
            exchanges: convert_all(rows)?,
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
        let row = sqlx::query_as::<_, ExchangeRow>(
            r#"
            UPDATE exchanges
            SET status = $2,
                transaction_hash = COALESCE($3, transaction_hash),
                completed_at = CASE WHEN $2 = 'completed' THEN $4 ELSE completed_at END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(update.status.as_str())
        .bind(&update.transaction_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.ok_or_else(|| StoreError::not_found("Exchange", id))?
            .try_into()
    }

    async fn daily_volume(&self, client_id: ClientId, since: DateTime<Utc>) -> StoreResult<Decimal> {
        let statuses: Vec<String> = ExchangeStatus::DAILY_USAGE
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();

        sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(from_amount), 0)
            FROM exchanges
            WHERE client_id = $1
              AND created_at > $2
              AND status = ANY($3)
            "#,
        )
        .bind(client_id.as_uuid())
        .bind(since)
        .bind(&statuses)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn count_failed_exchanges(&self, client_id: ClientId) -> StoreResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM exchanges WHERE client_id = $1 AND status = 'failed'",
        )
        .bind(client_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)
    }

    async fn append_transaction_log(&self, entry: TransactionLog) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transaction_logs
                (exchange_id, action, status_to, notes, performed_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(entry.exchange_id.as_uuid())
        .bind(&entry.action)
        .bind(entry.status_to.map(|s| s.as_str()))
        .bind(&entry.notes)
        .bind(&entry.performed_by)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn insert_notification(&self, notification: Notification) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (client_id, type, title, message, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(notification.client_id.as_uuid())
        .bind(&notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn recent_rates(&self, since: DateTime<Utc>) -> StoreResult<Vec<ExchangeRate>> {
        let rows = sqlx::query_as::<_, RateRow>(
            r#"
            SELECT from_currency, to_currency, rate, source, updated_at
            FROM exchange_rates
            WHERE updated_at > $1
            ORDER BY updated_at DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn upsert_rate(&self, rate: ExchangeRate) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO exchange_rates (from_currency, to_currency, rate, source, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (from_currency, to_currency, source)
            DO UPDATE SET rate = EXCLUDED.rate, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(&rate.from_currency)
        .bind(&rate.to_currency)
        .bind(rate.rate)
        .bind(&rate.source)
        .bind(rate.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}

#[async_trait]
impl ComplianceStore for PgStore {
    async fn limit_tier(&self, level: VerificationLevel) -> StoreResult<Option<ExchangeLimitTier>> {
        let row = sqlx::query_as::<_, LimitTierRow>(
            "SELECT * FROM exchange_limits WHERE verification_level = $1",
        )
        .bind(level.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(ExchangeLimitTier::try_from).transpose()
    }

    async fn insert_aml_check(&self, check: &AmlCheck) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO aml_checks
                (id, client_id, exchange_id, check_type, risk_level, risk_score,
                 sanctions_hit, pep_hit, adverse_media_hit, check_result, checked_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(check.id.as_uuid())
        .bind(check.client_id.as_uuid())
        .bind(check.exchange_id.map(|id| *id.as_uuid()))
        .bind(&check.check_type)
        .bind(check.risk_level.as_str())
        .bind(check.risk_score)
        .bind(check.sanctions_hit)
        .bind(check.pep_hit)
        .bind(check.adverse_media_hit)
        .bind(&check.check_result)
        .bind(&check.checked_by)
        .bind(check.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn recent_aml_checks(&self, client_id: ClientId, limit: u32) -> StoreResult<Vec<AmlCheck>> {
        let rows = sqlx::query_as::<_, AmlCheckRow>(
            r#"
            SELECT * FROM aml_checks
            WHERE client_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(client_id.as_uuid())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        convert_all(rows)
    }

    async fn insert_kyc(&self, verification: &KycVerification) -> StoreResult<()> {
        let docs = &verification.documents;
        sqlx::query(
            r#"
            INSERT INTO kyc_verifications
                (id, client_id, verification_level, status, document_type, document_number,
                 document_front_url, document_back_url, selfie_url, address_proof_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(verification.id.as_uuid())
        .bind(verification.client_id.as_uuid())
        .bind(verification.verification_level.as_str())
        .bind(verification.status.as_str())
        .bind(&docs.document_type)
        .bind(&docs.document_number)
        .bind(&docs.document_front_url)
        .bind(&docs.document_back_url)
        .bind(&docs.selfie_url)
        .bind(&docs.address_proof_url)
        .bind(verification.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn latest_kyc(&self, client_id: ClientId) -> StoreResult<Option<KycVerification>> {
        let row = sqlx::query_as::<_, KycRow>(
            r#"
            SELECT * FROM kyc_verifications
            WHERE client_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(client_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(KycVerification::try_from).transpose()
    }

    async fn review_kyc(&self, id: KycId, review: KycReview) -> StoreResult<KycVerification> {
        let row = match review {
            KycReview::Approve {
                verification_level,
                verified_at,
                expires_at,
            } => {
                sqlx::query_as::<_, KycRow>(
                    r#"
                    UPDATE kyc_verifications
                    SET status = 'approved',
                        verification_level = $2,
                        verified_at = $3,
                        expires_at = $4
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(id.as_uuid())
                .bind(verification_level.as_str())
                .bind(verified_at)
                .bind(expires_at)
                .fetch_optional(&self.pool)
                .await
            }
            KycReview::Reject { reason } => {
                sqlx::query_as::<_, KycRow>(
                    r#"
                    UPDATE kyc_verifications
                    SET status = 'rejected', rejection_reason = $2
                    WHERE id = $1
                    RETURNING *
                    "#,
                )
                .bind(id.as_uuid())
                .bind(reason)
                .fetch_optional(&self.pool)
                .await
            }
        }
        .map_err(db_err)?;

        row.ok_or_else(|| StoreError::not_found("KYC verification", id))?
            .try_into()
    }

    async fn upsert_wallet_verification(
        &self,
        verification: WalletVerification,
    ) -> StoreResult<WalletVerification> {
        let row = sqlx::query_as::<_, WalletRow>(
            r#"
            INSERT INTO wallet_verifications
                (id, client_id, wallet_address, currency, verification_code,
                 verification_method, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (client_id, wallet_address, currency)
            DO UPDATE SET verification_code = EXCLUDED.verification_code
            RETURNING *
            "#,
        )
        .bind(verification.id.as_uuid())
        .bind(verification.client_id.as_uuid())
        .bind(&verification.wallet_address)
        .bind(&verification.currency)
        .bind(&verification.verification_code)
        .bind(&verification.verification_method)
        .bind(verification.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.into())
    }

    async fn get_wallet_verification(
        &self,
        id: WalletVerificationId,
    ) -> StoreResult<Option<WalletVerification>> {
        let row = sqlx::query_as::<_, WalletRow>("SELECT * FROM wallet_verifications WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn mark_wallet_verified(
        &self,
        id: WalletVerificationId,
        now: DateTime<Utc>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE wallet_verifications SET is_verified = TRUE, verified_at = $2 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Wallet verification", id));
        }
        Ok(())
    }
}

#[async_trait]
impl TradingStore for PgStore {
    async fn active_referral_code(&self, client_id: ClientId) -> StoreResult<Option<ReferralCode>> {
        let row = sqlx::query_as::<_, ReferralRow>(
            "SELECT * FROM referral_codes WHERE client_id = $1 AND is_active = TRUE LIMIT 1",
        )
        .bind(client_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn insert_referral_code(&self, code: &ReferralCode) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO referral_codes
                (id, client_id, code, discount_percent, commission_percent, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(code.id.as_uuid())
        .bind(code.client_id.as_uuid())
        .bind(&code.code)
        .bind(code.discount_percent)
        .bind(code.commission_percent)
        .bind(code.is_active)
        .bind(code.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_active_referral(&self, code: &str) -> StoreResult<Option<ReferralLookup>> {
        let row = sqlx::query_as::<_, ReferralLookupRow>(
            r#"
            SELECT rc.*, c.full_name AS referrer_name, c.email AS referrer_email
            FROM referral_codes rc
            JOIN clients c ON rc.client_id = c.id
            WHERE rc.code = $1 AND rc.is_active = TRUE
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn record_referral_usage(&self, usage: &ReferralUsage) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            r#"
            INSERT INTO referral_usage
                (referral_code_id, referred_client_id, exchange_id, commission_usd, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(usage.referral_code_id.as_uuid())
        .bind(usage.referred_client_id.as_uuid())
        .bind(usage.exchange_id.as_uuid())
        .bind(usage.commission_usd)
        .bind(usage.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let result = sqlx::query(
            r#"
            UPDATE referral_codes
            SET total_referrals = total_referrals + 1,
                total_earnings_usd = total_earnings_usd + $2
            WHERE id = $1
            "#,
        )
        .bind(usage.referral_code_id.as_uuid())
        .bind(usage.commission_usd)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        if result.rows_affected() == 0 {
            // Dropping `tx` rolls back the usage insert
            return Err(StoreError::not_found("Referral code", usage.referral_code_id));
        }

        tx.commit().await.map_err(db_err)
    }

    async fn referral_stats(&self, client_id: ClientId) -> StoreResult<Option<ReferralStats>> {
        let row = sqlx::query_as::<_, ReferralStatsRow>(
            r#"
            SELECT rc.*,
                   COUNT(ru.id) AS usage_count,
                   SUM(ru.commission_usd) AS total_commission
            FROM referral_codes rc
            LEFT JOIN referral_usage ru ON rc.id = ru.referral_code_id
            WHERE rc.client_id = $1
            GROUP BY rc.id
            ORDER BY rc.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(client_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(row.map(Into::into))
    }

    async fn insert_limit_order(&self, order: &LimitOrder) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO limit_orders
                (id, client_id, from_currency, to_currency, from_amount, target_rate,
                 expiry_date, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.client_id.as_uuid())
        .bind(&order.from_currency)
        .bind(&order.to_currency)
        .bind(order.from_amount)
        .bind(order.target_rate)
        .bind(order.expiry_date)
        .bind(order.status.as_str())
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_limit_orders(
        &self,
        client_id: ClientId,
        status: Option<LimitOrderStatus>,
    ) -> StoreResult<Vec<LimitOrder>> {
        let rows = sqlx::query_as::<_, LimitOrderRow>(
            r#"
            SELECT * FROM limit_orders
            WHERE client_id = $1
              AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(client_id.as_uuid())
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        convert_all(rows)
    }

    async fn cancel_limit_order(&self, id: LimitOrderId) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE limit_orders SET status = 'cancelled' WHERE id = $1 AND status = 'active'",
        )
        .bind(id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_price_alert(&self, alert: &PriceAlert) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO price_alerts
                (id, client_id, currency, target_price, condition, is_active, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(alert.id.as_uuid())
        .bind(alert.client_id.as_uuid())
        .bind(&alert.currency)
        .bind(alert.target_price)
        .bind(alert.condition.as_str())
        .bind(alert.is_active)
        .bind(alert.created_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn active_price_alerts(&self, client_id: ClientId) -> StoreResult<Vec<PriceAlert>> {
        let rows = sqlx::query_as::<_, PriceAlertRow>(
            r#"
            SELECT * FROM price_alerts
            WHERE client_id = $1 AND is_active = TRUE
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(client_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        convert_all(rows)
    }

    async fn trading_analytics(
        &self,
        currency_pair: &str,
        since: NaiveDate,
    ) -> StoreResult<Vec<TradingAnalytics>> {
        let rows = sqlx::query_as::<_, AnalyticsRow>(
            r#"
            SELECT * FROM trading_analytics
            WHERE currency_pair = $1 AND date >= $2
            ORDER BY date DESC
            "#,
        )
        .bind(currency_pair)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
