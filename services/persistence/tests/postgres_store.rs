//! Postgres store tests. They need a live database:
//!
//! ```text
//! DATABASE_URL=postgres://localhost/exchange_test cargo test -p persistence -- --ignored
//! ```
//!
//! Every test creates its own clients with unique emails so runs can share
//! one database.

use chrono::{Duration, Utc};
use persistence::{ClientStore, ExchangeStore, PgStore, StoreError, TradingStore};
use rust_decimal::Decimal;
use types::client::{Client, NewClient};
use types::exchange::{ExchangeFilter, ExchangeStatus, ExchangeStatusUpdate, NewExchange};
use types::ids::{ClientId, ExchangeId, LimitOrderId, ReferralCodeId};
use types::trading::{LimitOrder, LimitOrderStatus, ReferralCode, ReferralUsage};
use uuid::Uuid;

async fn store() -> PgStore {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store = PgStore::connect(&url, 2).await.unwrap();
    store.migrate().await.unwrap();
    store
}

async fn new_client(store: &PgStore) -> Client {
    store
        .upsert_client(NewClient {
            email: format!("{}@example.com", Uuid::now_v7().simple()),
            full_name: Some("Postgres Client".to_string()),
            phone: None,
            telegram_username: None,
            country_code: Some("DE".to_string()),
            wallet_addresses: None,
        })
        .await
        .unwrap()
}

async fn new_exchange(store: &PgStore, client_id: ClientId, amount: i64) -> ExchangeId {
    store
        .insert_exchange(NewExchange {
            client_id,
            from_currency: "USDT".to_string(),
            to_currency: "BTC".to_string(),
            from_amount: Decimal::from(amount),
            to_amount: Decimal::new(1, 2),
            exchange_rate: Decimal::new(1, 5),
            from_wallet: "TWallet".to_string(),
            to_wallet: "bc1wallet".to_string(),
            notes: String::new(),
        })
        .await
        .unwrap()
        .id
}

async fn set_status(store: &PgStore, id: ExchangeId, status: ExchangeStatus) {
    store
        .update_exchange_status(
            id,
            &ExchangeStatusUpdate {
                status,
                transaction_hash: None,
            },
            Utc::now(),
        )
        .await
        .unwrap();
}

fn referral_code(client_id: ClientId, code: &str) -> ReferralCode {
    ReferralCode {
        id: ReferralCodeId::new(),
        client_id,
        code: code.to_string(),
        discount_percent: Decimal::ZERO,
        commission_percent: Decimal::from(10),
        is_active: true,
        total_referrals: 0,
        total_earnings_usd: Decimal::ZERO,
        created_at: Utc::now(),
    }
}

fn unique_code() -> String {
    Uuid::now_v7().simple().to_string()[24..].to_uppercase()
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_daily_volume_counts_open_and_completed() {
    let store = store().await;
    let client = new_client(&store).await;
    let since = Utc::now() - Duration::hours(1);

    new_exchange(&store, client.id, 100).await;
    let processing = new_exchange(&store, client.id, 200).await;
    let completed = new_exchange(&store, client.id, 300).await;
    let failed = new_exchange(&store, client.id, 400).await;
    let cancelled = new_exchange(&store, client.id, 500).await;
    set_status(&store, processing, ExchangeStatus::Processing).await;
    set_status(&store, completed, ExchangeStatus::Completed).await;
    set_status(&store, failed, ExchangeStatus::Failed).await;
    set_status(&store, cancelled, ExchangeStatus::Cancelled).await;

    let used = store.daily_volume(client.id, since).await.unwrap();
    assert_eq!(used, Decimal::from(600));

    let later = Utc::now() + Duration::minutes(1);
    assert_eq!(store.daily_volume(client.id, later).await.unwrap(), Decimal::ZERO);
    assert_eq!(store.count_failed_exchanges(client.id).await.unwrap(), 1);
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_list_exchanges_filters() {
    let store = store().await;
    let client = new_client(&store).await;
    let other = new_client(&store).await;

    let first = new_exchange(&store, client.id, 10).await;
    let second = new_exchange(&store, client.id, 20).await;
    let third = new_exchange(&store, client.id, 30).await;
    new_exchange(&store, other.id, 40).await;
    set_status(&store, second, ExchangeStatus::Completed).await;

    let page = store
        .list_exchanges(&ExchangeFilter {
            client_id: Some(client.id),
            ..ExchangeFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    let ids: Vec<ExchangeId> = page.exchanges.iter().map(|e| e.exchange.id).collect();
    assert_eq!(ids, vec![third, second, first]);
    assert_eq!(page.exchanges[0].email.as_deref(), Some(client.email.as_str()));

    let completed = store
        .list_exchanges(&ExchangeFilter {
            client_id: Some(client.id),
            status: Some(ExchangeStatus::Completed),
            ..ExchangeFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(completed.total, 1);
    assert_eq!(completed.exchanges[0].exchange.id, second);

    let paged = store
        .list_exchanges(&ExchangeFilter {
            client_id: Some(client.id),
            limit: 1,
            offset: 1,
            ..ExchangeFilter::default()
        })
        .await
        .unwrap();
    assert_eq!(paged.total, 3);
    assert_eq!(paged.exchanges.len(), 1);
    assert_eq!(paged.exchanges[0].exchange.id, second);
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_referral_usage_updates_totals() {
    let store = store().await;
    let referrer = new_client(&store).await;
    let referred = new_client(&store).await;
    let exchange = new_exchange(&store, referred.id, 1000).await;

    let code = referral_code(referrer.id, &unique_code());
    store.insert_referral_code(&code).await.unwrap();

    store
        .record_referral_usage(&ReferralUsage {
            referral_code_id: code.id,
            referred_client_id: referred.id,
            exchange_id: exchange,
            commission_usd: Decimal::new(1250, 2),
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let found = store.find_active_referral(&code.code).await.unwrap().unwrap();
    assert_eq!(found.referral.total_referrals, 1);
    assert_eq!(found.referral.total_earnings_usd, Decimal::new(1250, 2));

    let stats = store.referral_stats(referrer.id).await.unwrap().unwrap();
    assert_eq!(stats.usage_count, 1);
    assert_eq!(stats.total_commission, Some(Decimal::new(1250, 2)));
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_duplicate_referral_code_is_conflict() {
    let store = store().await;
    let client = new_client(&store).await;
    let other = new_client(&store).await;
    let code = unique_code();

    store.insert_referral_code(&referral_code(client.id, &code)).await.unwrap();
    let err = store
        .insert_referral_code(&referral_code(other.id, &code))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)), "{err:?}");
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_rows_for_unknown_client_are_not_found() {
    let store = store().await;
    let order = LimitOrder {
        id: LimitOrderId::new(),
        client_id: ClientId::new(),
        from_currency: "USDT".to_string(),
        to_currency: "BTC".to_string(),
        from_amount: Decimal::from(500),
        target_rate: Decimal::new(15, 6),
        expiry_date: None,
        status: LimitOrderStatus::Active,
        created_at: Utc::now(),
    };
    let err = store.insert_limit_order(&order).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }), "{err:?}");

    let err = store
        .insert_referral_code(&referral_code(ClientId::new(), &unique_code()))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }), "{err:?}");
}
