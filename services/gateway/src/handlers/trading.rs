use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, Uri},
    response::Response,
};
use chrono::{Days, Utc};
use compliance::codes;
use rust_decimal::Decimal;
use tracing::{info, warn};
use types::errors::StoreError;
use types::ids::{ClientId, LimitOrderId, PriceAlertId, ReferralCodeId};
use types::trading::{LimitOrder, LimitOrderStatus, PriceAlert, ReferralCode, ReferralUsage};

use crate::action;
use crate::error::AppError;
use crate::models::{
    AnalyticsQuery, AnalyticsResponse, CancelLimitOrderRequest, CancelLimitOrderResponse,
    ClientQuery, CodeQuery, CreateLimitOrderRequest, CreatePriceAlertRequest,
    CreateReferralCodeRequest, CreatedReferralResponse, ExistingReferralResponse,
    LimitOrderCreatedResponse, LimitOrdersResponse, ListLimitOrdersQuery,
    PriceAlertCreatedResponse, PriceAlertsResponse, ReferralCheckResponse, ReferralCodeResponse,
    ReferralStatsResponse, UseReferralCodeRequest, UseReferralResponse,
};
use crate::state::AppState;

const DEFAULT_CURRENCY_PAIR: &str = "BTC-USDT";
const DEFAULT_ANALYTICS_DAYS: u32 = 7;
const DEFAULT_COMMISSION_PERCENT: i64 = 10;
const CODE_ATTEMPTS: usize = 3;

pub async fn get(State(state): State<AppState>, uri: Uri) -> Result<Response, AppError> {
    match action::query_action(&uri)?.as_deref() {
        Some("get_referral_code") => {
            let query: ClientQuery = action::query(&uri)?;
            let referral_code = state.store.active_referral_code(query.client_id).await?;
            Ok(action::ok(ReferralCodeResponse { referral_code }))
        }
        Some("check_referral_code") => check_referral_code(&state, action::query(&uri)?).await,
        Some("get_referral_stats") => {
            let query: ClientQuery = action::query(&uri)?;
            let stats = state.store.referral_stats(query.client_id).await?;
            Ok(action::ok(ReferralStatsResponse { stats }))
        }
        Some("list_limit_orders") => list_limit_orders(&state, action::query(&uri)?).await,
        Some("get_price_alerts") => {
            let query: ClientQuery = action::query(&uri)?;
            let alerts = state.store.active_price_alerts(query.client_id).await?;
            Ok(action::ok(PriceAlertsResponse { alerts }))
        }
        Some("get_trading_analytics") => trading_analytics(&state, action::query(&uri)?).await,
        _ => Err(AppError::InvalidAction),
    }
}

pub async fn post(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let (action, payload) = action::parse_body(&body)?;
    match action.as_deref() {
        Some("create_referral_code") => create_referral_code(&state, payload.into_request()?).await,
        Some("use_referral_code") => use_referral_code(&state, payload.into_request()?).await,
        Some("create_limit_order") => create_limit_order(&state, payload.into_request()?).await,
        Some("create_price_alert") => create_price_alert(&state, payload.into_request()?).await,
        _ => Err(AppError::InvalidAction),
    }
}

pub async fn put(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let (action, payload) = action::parse_body(&body)?;
    match action.as_deref() {
        Some("cancel_limit_order") => {
            let request: CancelLimitOrderRequest = payload.into_request()?;
            let cancelled = state.store.cancel_limit_order(request.order_id).await?;
            info!(order_id = %request.order_id, cancelled, "Limit order cancel requested");
            Ok(action::ok(CancelLimitOrderResponse {
                success: true,
                cancelled,
                message: "Order cancelled",
            }))
        }
        _ => Err(AppError::InvalidAction),
    }
}

async fn check_referral_code(state: &AppState, query: CodeQuery) -> Result<Response, AppError> {
    match state.store.find_active_referral(&query.code).await? {
        Some(lookup) => Ok(action::ok(ReferralCheckResponse {
            valid: true,
            discount_percent: Some(lookup.referral.discount_percent),
            referrer_name: lookup.referrer_name,
            error: None,
        })),
        None => Ok(action::with_status(
            StatusCode::NOT_FOUND,
            ReferralCheckResponse {
                valid: false,
                discount_percent: None,
                referrer_name: None,
                error: Some("Invalid referral code"),
            },
        )),
    }
}

async fn list_limit_orders(state: &AppState, query: ListLimitOrdersQuery) -> Result<Response, AppError> {
    let status = match query.status.as_deref().unwrap_or("active") {
        "all" => None,
        keyword => Some(
            keyword
                .parse::<LimitOrderStatus>()
                .map_err(|e| AppError::validation(e.to_string()))?,
        ),
    };

    let orders = state.store.list_limit_orders(query.client_id, status).await?;
    Ok(action::ok(LimitOrdersResponse { orders }))
}

async fn trading_analytics(state: &AppState, query: AnalyticsQuery) -> Result<Response, AppError> {
    let pair = query
        .currency_pair
        .unwrap_or_else(|| DEFAULT_CURRENCY_PAIR.to_string());
    let days = query.days.unwrap_or(DEFAULT_ANALYTICS_DAYS);
    let today = Utc::now().date_naive();
    let since = today
        .checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| AppError::validation("days is out of range"))?;

    let analytics = state.store.trading_analytics(&pair, since).await?;
    Ok(action::ok(AnalyticsResponse { analytics }))
}

async fn require_client(state: &AppState, client_id: ClientId) -> Result<(), AppError> {
    match state.store.get_client(client_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound("Client not found".into())),
    }
}

async fn create_referral_code(
    state: &AppState,
    request: CreateReferralCodeRequest,
) -> Result<Response, AppError> {
    require_client(state, request.client_id).await?;

    if let Some(existing) = state.store.active_referral_code(request.client_id).await? {
        return Ok(action::ok(ExistingReferralResponse {
            success: true,
            code: existing.code,
            message: "Referral code already exists",
        }));
    }

    let mut referral = ReferralCode {
        id: ReferralCodeId::new(),
        client_id: request.client_id,
        code: String::new(),
        discount_percent: request.discount_percent.unwrap_or(Decimal::ZERO),
        commission_percent: request
            .commission_percent
            .unwrap_or(Decimal::from(DEFAULT_COMMISSION_PERCENT)),
        is_active: true,
        total_referrals: 0,
        total_earnings_usd: Decimal::ZERO,
        created_at: Utc::now(),
    };

    // Codes are random; a collision with an existing code just draws again.
    let mut attempt = 0;
    loop {
        attempt += 1;
        referral.code = codes::random_code();
        match state.store.insert_referral_code(&referral).await {
            Ok(()) => break,
            Err(StoreError::Conflict(msg)) if attempt < CODE_ATTEMPTS => {
                warn!(attempt, %msg, "Referral code collision");
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(client_id = %referral.client_id, referral_id = %referral.id, "Referral code created");
    Ok(action::created(CreatedReferralResponse {
        success: true,
        referral_id: referral.id,
        code: referral.code,
    }))
}

async fn use_referral_code(state: &AppState, request: UseReferralCodeRequest) -> Result<Response, AppError> {
    let lookup = state
        .store
        .find_active_referral(&request.code)
        .await?
        .ok_or_else(|| AppError::NotFound("Invalid referral code".into()))?;

    let exchange = state
        .store
        .get_exchange(request.exchange_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exchange not found".into()))?;

    state
        .store
        .record_referral_usage(&ReferralUsage {
            referral_code_id: lookup.referral.id,
            referred_client_id: exchange.exchange.client_id,
            exchange_id: exchange.exchange.id,
            commission_usd: request.commission_usd,
            created_at: Utc::now(),
        })
        .await?;

    info!(
        referral_id = %lookup.referral.id,
        exchange_id = %exchange.exchange.id,
        commission_usd = %request.commission_usd,
        "Referral code used"
    );

    Ok(action::ok(UseReferralResponse {
        success: true,
        commission_earned: request.commission_usd,
    }))
}

async fn create_limit_order(state: &AppState, request: CreateLimitOrderRequest) -> Result<Response, AppError> {
    if request.from_amount <= Decimal::ZERO || request.target_rate <= Decimal::ZERO {
        return Err(AppError::validation("from_amount and target_rate must be positive"));
    }
    require_client(state, request.client_id).await?;

    let order = LimitOrder {
        id: LimitOrderId::new(),
        client_id: request.client_id,
        from_currency: request.from_currency,
        to_currency: request.to_currency,
        from_amount: request.from_amount,
        target_rate: request.target_rate,
        expiry_date: request.expiry_date,
        status: LimitOrderStatus::Active,
        created_at: Utc::now(),
    };
    state.store.insert_limit_order(&order).await?;

    Ok(action::created(LimitOrderCreatedResponse {
        success: true,
        order_id: order.id,
        message: "Limit order created",
    }))
}

async fn create_price_alert(state: &AppState, request: CreatePriceAlertRequest) -> Result<Response, AppError> {
    require_client(state, request.client_id).await?;

    let alert = PriceAlert {
        id: PriceAlertId::new(),
        client_id: request.client_id,
        currency: request.currency,
        target_price: request.target_price,
        condition: request.condition,
        is_active: true,
        created_at: Utc::now(),
    };
    state.store.insert_price_alert(&alert).await?;

    Ok(action::created(PriceAlertCreatedResponse {
        success: true,
        alert_id: alert.id,
        message: "Price alert created",
    }))
}
