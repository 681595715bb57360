//! Compliance service: orchestrator
//!
//! Ties the pure gate and scorer to an injected store. Every operation is
//! a short read-then-write sequence; nothing here takes row locks, so two
//! concurrent evaluations for one client can jointly exceed the daily
//! allowance.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use types::client::{AmlStatus, Client, KycStatus, VerificationLevel};
use types::compliance::{
    AmlCheck, Decision, ExchangeLimitTier, KycDocuments, KycReview, KycVerification,
    WalletVerification,
};
use types::errors::{ComplianceError, StoreError};
use types::exchange::TransactionLog;
use types::ids::{ClientId, ExchangeId, KycId, WalletVerificationId};

use persistence::{ClientStore, ComplianceStore, ExchangeStore};

use crate::codes;
use crate::config::ComplianceConfig;
use crate::gate;
use crate::scoring;

pub type ComplianceResult<T> = Result<T, ComplianceError>;

const DEFAULT_REJECTION_REASON: &str = "Documents verification failed";
const DEFAULT_WALLET_METHOD: &str = "signature";

/// Documents and requested tier for a KYC submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KycSubmission {
    pub client_id: ClientId,
    /// Requested tier, `basic` when absent
    pub verification_level: Option<VerificationLevel>,
    #[serde(flatten)]
    pub documents: KycDocuments,
}

/// Challenge issued for a wallet ownership proof
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletChallenge {
    pub verification_id: WalletVerificationId,
    pub verification_code: String,
    pub message: String,
}

/// Persisted AML check and whether it clears the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmlOutcome {
    pub check: AmlCheck,
    pub passed: bool,
}

/// Compliance service over any store that can serve clients, exchanges
/// and compliance records
pub struct ComplianceService<S: ?Sized> {
    store: Arc<S>,
    config: Arc<ComplianceConfig>,
}

impl<S: ?Sized> Clone for ComplianceService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
        }
    }
}

impl<S> ComplianceService<S>
where
    S: ClientStore + ExchangeStore + ComplianceStore + ?Sized,
{
    pub fn new(store: Arc<S>, config: Arc<ComplianceConfig>) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &ComplianceConfig {
        &self.config
    }

    async fn client(&self, client_id: ClientId) -> ComplianceResult<Client> {
        self.store
            .get_client(client_id)
            .await?
            .ok_or_else(|| ComplianceError::ClientNotFound {
                client_id: client_id.to_string(),
            })
    }

    async fn limits_for(&self, client: &Client) -> ComplianceResult<ExchangeLimitTier> {
        let level = client.tier();
        self.store.limit_tier(level).await?.ok_or_else(|| {
            error!(verification_level = %level, "No limit tier configured");
            ComplianceError::MissingLimitTier { level }
        })
    }

    async fn evaluate_client(
        &self,
        client: &Client,
        proposed_usd: Decimal,
    ) -> ComplianceResult<Decision> {
        let limits = self.limits_for(client).await?;
        let since = Utc::now() - self.config.daily_window();
        let daily_used = self.store.daily_volume(client.id, since).await?;
        let latest_aml = if limits.requires_aml {
            self.store.latest_aml_check(client.id).await?
        } else {
            None
        };

        Ok(gate::evaluate(
            client,
            &limits,
            daily_used,
            latest_aml.as_ref(),
            proposed_usd,
        ))
    }

    /// Evaluate a proposed exchange for a client without recording anything
    pub async fn check_limits(
        &self,
        client_id: ClientId,
        amount_usd: Decimal,
    ) -> ComplianceResult<Decision> {
        let client = self.client(client_id).await?;
        self.evaluate_client(&client, amount_usd).await
    }

    /// Evaluate against a client record already in hand
    pub async fn check_client(
        &self,
        client: &Client,
        amount_usd: Decimal,
    ) -> ComplianceResult<Decision> {
        self.evaluate_client(client, amount_usd).await
    }

    /// Evaluate an existing exchange and append a `compliance_check` log
    /// whose notes are the JSON list of issues
    pub async fn verify_exchange(
        &self,
        exchange_id: ExchangeId,
        client_id: ClientId,
        amount_usd: Decimal,
    ) -> ComplianceResult<Decision> {
        if self.store.get_exchange(exchange_id).await?.is_none() {
            return Err(StoreError::not_found("Exchange", exchange_id).into());
        }

        let client = self.client(client_id).await?;
        let decision = self.evaluate_client(&client, amount_usd).await?;

        let issues: Vec<String> = decision.issues.iter().map(ToString::to_string).collect();
        let notes = serde_json::Value::from(issues).to_string();
        self.store
            .append_transaction_log(TransactionLog::system(
                exchange_id,
                "compliance_check",
                None,
                notes,
                Utc::now(),
            ))
            .await?;

        if !decision.can_proceed {
            info!(
                %exchange_id,
                %client_id,
                issues = decision.issues.len(),
                "Exchange failed compliance verification"
            );
        }

        Ok(decision)
    }

    /// Score the client, persist an automatic AML check and cache the
    /// resulting risk level on the client
    pub async fn perform_aml_check(
        &self,
        client_id: ClientId,
        exchange_id: Option<ExchangeId>,
    ) -> ComplianceResult<AmlOutcome> {
        let client = self.client(client_id).await?;
        let failed = self.store.count_failed_exchanges(client_id).await?;
        let result = scoring::score_risk(client.country_code.as_deref(), failed, &self.config);

        let check = AmlCheck::automatic(client_id, exchange_id, &result, Utc::now());
        self.store.insert_aml_check(&check).await?;
        self.store
            .set_aml_status(client_id, AmlStatus::Checked, result.risk_level)
            .await?;

        info!(
            %client_id,
            risk_score = result.risk_score,
            risk_level = %result.risk_level,
            sanctions_hit = result.sanctions_hit,
            "AML check completed"
        );

        Ok(AmlOutcome {
            check,
            passed: result.passed,
        })
    }

    /// Latest KYC submission, if any
    pub async fn kyc_status(
        &self,
        client_id: ClientId,
    ) -> ComplianceResult<Option<KycVerification>> {
        Ok(self.store.latest_kyc(client_id).await?)
    }

    /// Most recent AML checks, newest first
    pub async fn aml_status(&self, client_id: ClientId) -> ComplianceResult<Vec<AmlCheck>> {
        Ok(self
            .store
            .recent_aml_checks(client_id, self.config.aml_history_limit)
            .await?)
    }

    /// Record a KYC submission and mark the client as under review
    pub async fn submit_kyc(&self, submission: KycSubmission) -> ComplianceResult<KycVerification> {
        let client = self.client(submission.client_id).await?;
        let level = submission
            .verification_level
            .unwrap_or(VerificationLevel::Basic);

        let verification =
            KycVerification::submitted(client.id, level, submission.documents, Utc::now());
        self.store.insert_kyc(&verification).await?;
        self.store
            .set_kyc_status(client.id, KycStatus::Reviewing, None)
            .await?;

        info!(client_id = %client.id, kyc_id = %verification.id, requested = %level, "KYC submitted");
        Ok(verification)
    }

    /// Approve a submission and grant the tier to its client
    pub async fn approve_kyc(
        &self,
        kyc_id: KycId,
        level: Option<VerificationLevel>,
    ) -> ComplianceResult<KycVerification> {
        let level = level.unwrap_or(VerificationLevel::Basic);
        let now = Utc::now();
        let review = KycReview::Approve {
            verification_level: level,
            verified_at: now,
            expires_at: now + self.config.kyc_validity(),
        };

        let verification = self.review(kyc_id, review).await?;
        self.store
            .set_kyc_status(verification.client_id, KycStatus::Approved, Some(level))
            .await?;

        info!(%kyc_id, client_id = %verification.client_id, granted = %level, "KYC approved");
        Ok(verification)
    }

    /// Reject a submission; the client's KYC status becomes `rejected`
    pub async fn reject_kyc(
        &self,
        kyc_id: KycId,
        reason: Option<String>,
    ) -> ComplianceResult<KycVerification> {
        let reason = reason.unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());
        let verification = self.review(kyc_id, KycReview::Reject { reason }).await?;
        self.store
            .set_kyc_status(verification.client_id, KycStatus::Rejected, None)
            .await?;

        info!(%kyc_id, client_id = %verification.client_id, "KYC rejected");
        Ok(verification)
    }

    async fn review(&self, kyc_id: KycId, review: KycReview) -> ComplianceResult<KycVerification> {
        self.store
            .review_kyc(kyc_id, review)
            .await
            .map_err(|err| match err {
                StoreError::NotFound { .. } => ComplianceError::KycNotFound {
                    kyc_id: kyc_id.to_string(),
                },
                other => other.into(),
            })
    }

    /// Issue (or reissue) an ownership challenge for a wallet
    pub async fn request_wallet_verification(
        &self,
        client_id: ClientId,
        wallet_address: String,
        currency: String,
        method: Option<String>,
    ) -> ComplianceResult<WalletChallenge> {
        self.client(client_id).await?;
        let code = codes::random_code();
        let verification = self
            .store
            .upsert_wallet_verification(WalletVerification {
                id: WalletVerificationId::new(),
                client_id,
                wallet_address,
                currency,
                verification_code: code.clone(),
                verification_method: method
                    .unwrap_or_else(|| DEFAULT_WALLET_METHOD.to_string()),
                is_verified: false,
                verified_at: None,
                created_at: Utc::now(),
            })
            .await?;

        Ok(WalletChallenge {
            verification_id: verification.id,
            message: format!("Send {} from your wallet to verify ownership", code),
            verification_code: code,
        })
    }

    /// Mark a wallet verified when `code` matches its challenge
    pub async fn verify_wallet(
        &self,
        verification_id: WalletVerificationId,
        code: &str,
    ) -> ComplianceResult<()> {
        let verification = self
            .store
            .get_wallet_verification(verification_id)
            .await?
            .ok_or_else(|| ComplianceError::WalletVerificationNotFound {
                verification_id: verification_id.to_string(),
            })?;

        if verification.verification_code != code {
            return Err(ComplianceError::InvalidVerificationCode);
        }

        self.store
            .mark_wallet_verified(verification_id, Utc::now())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use persistence::MemoryStore;
    use types::client::RiskLevel;
    use types::compliance::{ComplianceIssue, KycVerificationStatus};
    use types::exchange::{ExchangeStatus, NewExchange};

    fn service(store: Arc<MemoryStore>) -> ComplianceService<MemoryStore> {
        ComplianceService::new(store, Arc::new(ComplianceConfig::default()))
    }

    fn seeded_client(store: &MemoryStore, country: Option<&str>) -> Client {
        let mut client = Client::new("client@example.com", Utc::now());
        client.country_code = country.map(str::to_string);
        store.put_client(client.clone());
        client
    }

    fn put_exchange(store: &MemoryStore, client_id: ClientId, amount: i64, status: ExchangeStatus) -> ExchangeId {
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
        .into_exchange(ExchangeId::new(), Utc::now());
        exchange.status = status;
        let id = exchange.id;
        store.put_exchange(exchange);
        id
    }

    #[tokio::test]
    async fn test_check_limits_unknown_client() {
        let svc = service(Arc::new(MemoryStore::with_default_limits()));
        let err = svc
            .check_limits(ClientId::new(), Decimal::from(10))
            .await
            .unwrap_err();
        assert!(matches!(err, ComplianceError::ClientNotFound { .. }));
    }

    #[tokio::test]
    async fn test_check_limits_missing_tier() {
        let store = Arc::new(MemoryStore::new());
        let client = seeded_client(&store, None);
        let err = service(store)
            .check_limits(client.id, Decimal::from(10))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ComplianceError::MissingLimitTier {
                level: VerificationLevel::None
            }
        );
    }

    #[tokio::test]
    async fn test_check_limits_counts_daily_usage() {
        let store = Arc::new(MemoryStore::with_default_limits());
        let client = seeded_client(&store, None);
        put_exchange(&store, client.id, 900, ExchangeStatus::Completed);
        put_exchange(&store, client.id, 900, ExchangeStatus::Pending);
        put_exchange(&store, client.id, 900, ExchangeStatus::Failed);

        let decision = service(store)
            .check_limits(client.id, Decimal::from(500))
            .await
            .unwrap();
        assert_eq!(decision.daily_used, Decimal::from(1_800));
        assert_eq!(decision.daily_remaining, Decimal::from(200));
        assert!(!decision.can_proceed);
        assert_eq!(
            decision.issues,
            vec![ComplianceIssue::DailyLimit {
                remaining: Decimal::from(200)
            }]
        );
    }

    #[tokio::test]
    async fn test_verify_exchange_logs_issues() {
        let store = Arc::new(MemoryStore::with_default_limits());
        let client = seeded_client(&store, None);
        let exchange_id = put_exchange(&store, client.id, 10, ExchangeStatus::Pending);

        let decision = service(store.clone())
            .verify_exchange(exchange_id, client.id, Decimal::from(5_000))
            .await
            .unwrap();
        assert!(!decision.can_proceed);

        let logs = store.transaction_logs(exchange_id);
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "compliance_check");
        assert_eq!(
            logs[0].notes,
            r#"["Amount exceeds single transaction limit of $1000"]"#
        );
    }

    #[tokio::test]
    async fn test_verify_unknown_exchange() {
        let store = Arc::new(MemoryStore::with_default_limits());
        let client = seeded_client(&store, None);
        let err = service(store)
            .verify_exchange(ExchangeId::new(), client.id, Decimal::ONE)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ComplianceError::Store(StoreError::NotFound { entity: "Exchange", .. })
        ));
    }

    #[tokio::test]
    async fn test_aml_check_sanctioned_client() {
        let store = Arc::new(MemoryStore::with_default_limits());
        let client = seeded_client(&store, Some("KP"));
        let svc = service(store.clone());

        let outcome = svc.perform_aml_check(client.id, None).await.unwrap();
        assert!(!outcome.passed);
        assert_eq!(outcome.check.risk_score, 80.0);
        assert_eq!(outcome.check.check_type, "automatic");
        assert_eq!(outcome.check.checked_by, "system");

        let updated = store.get_client(client.id).await.unwrap().unwrap();
        assert_eq!(updated.aml_status, AmlStatus::Checked);
        assert_eq!(updated.risk_level, RiskLevel::Critical);
        assert_eq!(svc.aml_status(client.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_aml_check_counts_failed_exchanges() {
        let store = Arc::new(MemoryStore::with_default_limits());
        let client = seeded_client(&store, Some("DE"));
        for _ in 0..3 {
            put_exchange(&store, client.id, 10, ExchangeStatus::Failed);
        }

        let outcome = service(store)
            .perform_aml_check(client.id, None)
            .await
            .unwrap();
        assert_eq!(outcome.check.risk_score, 15.0);
        assert_eq!(outcome.check.risk_level, RiskLevel::Low);
        assert!(outcome.passed);
    }

    #[tokio::test]
    async fn test_aml_status_limited_to_history() {
        let store = Arc::new(MemoryStore::with_default_limits());
        let client = seeded_client(&store, None);
        let svc = service(store);
        for _ in 0..7 {
            svc.perform_aml_check(client.id, None).await.unwrap();
        }
        assert_eq!(svc.aml_status(client.id).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_kyc_submit_and_approve() {
        let store = Arc::new(MemoryStore::with_default_limits());
        let client = seeded_client(&store, None);
        let svc = service(store.clone());

        let submitted = svc
            .submit_kyc(KycSubmission {
                client_id: client.id,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(submitted.status, KycVerificationStatus::Reviewing);
        assert_eq!(submitted.verification_level, VerificationLevel::Basic);
        let reviewing = store.get_client(client.id).await.unwrap().unwrap();
        assert_eq!(reviewing.kyc_status, KycStatus::Reviewing);

        let approved = svc
            .approve_kyc(submitted.id, Some(VerificationLevel::Verified))
            .await
            .unwrap();
        assert_eq!(approved.status, KycVerificationStatus::Approved);
        let verified_at = approved.verified_at.unwrap();
        assert_eq!(approved.expires_at.unwrap() - verified_at, Duration::days(365));

        let updated = store.get_client(client.id).await.unwrap().unwrap();
        assert_eq!(updated.kyc_status, KycStatus::Approved);
        assert_eq!(updated.verification_level, Some(VerificationLevel::Verified));

        let latest = svc.kyc_status(client.id).await.unwrap().unwrap();
        assert_eq!(latest.id, submitted.id);
    }

    #[tokio::test]
    async fn test_kyc_reject_default_reason() {
        let store = Arc::new(MemoryStore::with_default_limits());
        let client = seeded_client(&store, None);
        let svc = service(store.clone());

        let submitted = svc
            .submit_kyc(KycSubmission {
                client_id: client.id,
                ..Default::default()
            })
            .await
            .unwrap();
        let rejected = svc.reject_kyc(submitted.id, None).await.unwrap();
        assert_eq!(rejected.status, KycVerificationStatus::Rejected);
        assert_eq!(
            rejected.rejection_reason.as_deref(),
            Some("Documents verification failed")
        );
        let updated = store.get_client(client.id).await.unwrap().unwrap();
        assert_eq!(updated.kyc_status, KycStatus::Rejected);
    }

    #[tokio::test]
    async fn test_approve_unknown_kyc() {
        let svc = service(Arc::new(MemoryStore::with_default_limits()));
        let err = svc.approve_kyc(KycId::new(), None).await.unwrap_err();
        assert!(matches!(err, ComplianceError::KycNotFound { .. }));
    }

    #[tokio::test]
    async fn test_wallet_challenge_flow() {
        let store = Arc::new(MemoryStore::with_default_limits());
        let client = seeded_client(&store, None);
        let svc = service(store.clone());

        let challenge = svc
            .request_wallet_verification(client.id, "0xabc".to_string(), "ETH".to_string(), None)
            .await
            .unwrap();
        assert_eq!(challenge.verification_code.len(), codes::CODE_LENGTH);
        assert_eq!(
            challenge.message,
            format!("Send {} from your wallet to verify ownership", challenge.verification_code)
        );

        let err = svc
            .verify_wallet(challenge.verification_id, "WRONG")
            .await
            .unwrap_err();
        assert_eq!(err, ComplianceError::InvalidVerificationCode);

        svc.verify_wallet(challenge.verification_id, &challenge.verification_code)
            .await
            .unwrap();
        let stored = store
            .get_wallet_verification(challenge.verification_id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.is_verified);
        assert_eq!(stored.verification_method, "signature");
    }

    #[tokio::test]
    async fn test_wallet_challenge_unknown_client() {
        let svc = service(Arc::new(MemoryStore::with_default_limits()));
        let err = svc
            .request_wallet_verification(ClientId::new(), "0xabc".to_string(), "ETH".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ComplianceError::ClientNotFound { .. }));
    }
}
