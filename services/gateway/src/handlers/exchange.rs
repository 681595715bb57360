use axum::{
    body::Bytes,
    extract::State,
    http::{StatusCode, Uri},
    response::Response,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::info;
use types::client::{Client, NewClient};
use types::compliance::ComplianceIssue;
use types::exchange::{
    ExchangeFilter, ExchangeRate, ExchangeStatus, ExchangeStatusUpdate, NewExchange, Notification,
    TransactionLog,
};

use crate::action;
use crate::error::AppError;
use crate::models::{
    ClientsResponse, CreateClientResponse, CreateExchangeRequest, CreateExchangeResponse,
    ExchangeResponse, GetExchangeQuery, LimitRejection, ListExchangesQuery, MessageResponse,
    RatesResponse, UpdateExchangeStatusRequest, UpdateRateRequest,
};
use crate::state::AppState;

const ANONYMOUS_EMAIL: &str = "anonymous@exchange.com";
const ANONYMOUS_NAME: &str = "Anonymous";
const RATE_FRESHNESS_HOURS: i64 = 1;

pub async fn get(State(state): State<AppState>, uri: Uri) -> Result<Response, AppError> {
    let action = action::query_action(&uri)?;
    match action.as_deref().unwrap_or("list_exchanges") {
        "list_exchanges" => list_exchanges(&state, action::query(&uri)?).await,
        "get_exchange" => get_exchange(&state, action::query(&uri)?).await,
        "list_clients" => list_clients(&state).await,
        "get_rates" => get_rates(&state).await,
        _ => Err(AppError::InvalidAction),
    }
}

pub async fn post(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let (action, payload) = action::parse_body(&body)?;
    match action.as_deref() {
        Some("create_exchange") => create_exchange(&state, payload.into_request()?).await,
        Some("create_client") => create_client(&state, payload.into_request()?).await,
        Some("update_rate") => update_rate(&state, payload.into_request()?).await,
        _ => Err(AppError::InvalidAction),
    }
}

/// Status transition for an existing exchange
pub async fn put(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let (_, payload) = action::parse_body(&body)?;
    let request: UpdateExchangeStatusRequest = payload.into_request()?;
    let update = ExchangeStatusUpdate {
        status: request.status,
        transaction_hash: request.transaction_hash,
    };

    let now = Utc::now();
    let exchange = state
        .store
        .update_exchange_status(request.id, &update, now)
        .await?;

    state
        .store
        .append_transaction_log(TransactionLog::system(
            exchange.id,
            "status_changed",
            Some(exchange.status),
            format!("Status changed to {}", exchange.status),
            now,
        ))
        .await?;

    info!(exchange_id = %exchange.id, status = %exchange.status, "Exchange status updated");
    Ok(action::ok(MessageResponse::new("Exchange updated")))
}

async fn list_exchanges(state: &AppState, query: ListExchangesQuery) -> Result<Response, AppError> {
    let defaults = ExchangeFilter::default();
    let filter = ExchangeFilter {
        client_id: query.client_id,
        status: query.status,
        limit: query.limit.unwrap_or(defaults.limit),
        offset: query.offset.unwrap_or(defaults.offset),
    };

    let page = state.store.list_exchanges(&filter).await?;
    Ok(action::ok(page))
}

async fn get_exchange(state: &AppState, query: GetExchangeQuery) -> Result<Response, AppError> {
    let id = query
        .id
        .ok_or_else(|| AppError::validation("Exchange ID required"))?;

    let exchange = state
        .store
        .get_exchange(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Exchange not found".into()))?;

    Ok(action::ok(ExchangeResponse { exchange }))
}

async fn list_clients(state: &AppState) -> Result<Response, AppError> {
    let clients = state.store.list_clients().await?;
    Ok(action::ok(ClientsResponse { clients }))
}

async fn get_rates(state: &AppState) -> Result<Response, AppError> {
    let since = Utc::now() - Duration::hours(RATE_FRESHNESS_HOURS);
    let rates = state.store.recent_rates(since).await?;
    Ok(action::ok(RatesResponse { rates }))
}

/// Resolve the owning client: by id when given, else find-or-create by email
async fn resolve_client(state: &AppState, request: &CreateExchangeRequest) -> Result<Client, AppError> {
    if let Some(id) = request.client_id {
        return state
            .store
            .get_client(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Client not found".into()));
    }

    let email = request.email.as_deref().unwrap_or(ANONYMOUS_EMAIL);
    if let Some(client) = state.store.find_client_by_email(email).await? {
        return Ok(client);
    }

    let client = state
        .store
        .upsert_client(NewClient {
            email: email.to_string(),
            full_name: Some(
                request
                    .name
                    .clone()
                    .unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
            ),
            telegram_username: request.telegram.clone(),
            ..Default::default()
        })
        .await?;

    info!(client_id = %client.id, "Client created for exchange request");
    Ok(client)
}

async fn create_exchange(state: &AppState, request: CreateExchangeRequest) -> Result<Response, AppError> {
    if request.from_amount <= Decimal::ZERO {
        return Err(AppError::validation("from_amount must be positive"));
    }

    let client = resolve_client(state, &request).await?;
    let amount_usd = request.from_amount * request.from_rate_usd.unwrap_or(Decimal::ONE);

    // Only the amount rules block creation; KYC/AML is reported by verify_exchange.
    let decision = state.compliance().check_client(&client, amount_usd).await?;
    if decision.exceeds_limits() {
        let issues: Vec<ComplianceIssue> = decision
            .issues
            .into_iter()
            .filter(|issue| {
                matches!(
                    issue,
                    ComplianceIssue::SingleTransactionLimit { .. } | ComplianceIssue::DailyLimit { .. }
                )
            })
            .collect();

        info!(
            client_id = %client.id,
            %amount_usd,
            verification_level = %decision.verification_level,
            "Exchange rejected by limits"
        );

        return Ok(action::with_status(
            StatusCode::BAD_REQUEST,
            LimitRejection {
                success: false,
                error: "Amount exceeds limit",
                issues,
                limit: decision.limits.single_transaction_limit_usd,
                verification_level: decision.verification_level,
            },
        ));
    }

    let exchange = state
        .store
        .insert_exchange(NewExchange {
            client_id: client.id,
            from_currency: request.from_currency,
            to_currency: request.to_currency,
            from_amount: request.from_amount,
            to_amount: request.to_amount,
            exchange_rate: request.exchange_rate,
            from_wallet: request.from_address.unwrap_or_default(),
            to_wallet: request.to_address.unwrap_or_default(),
            notes: request.comment.unwrap_or_default(),
        })
        .await?;

    state
        .store
        .append_transaction_log(TransactionLog::system(
            exchange.id,
            "created",
            Some(ExchangeStatus::Pending),
            "Exchange created",
            exchange.created_at,
        ))
        .await?;

    state
        .store
        .insert_notification(Notification {
            client_id: client.id,
            kind: "exchange_created".to_string(),
            title: "Exchange Created".to_string(),
            message: format!(
                "Exchange {}: {} {} -> {} {}",
                exchange.id,
                exchange.from_amount,
                exchange.from_currency,
                exchange.to_amount,
                exchange.to_currency
            ),
            created_at: exchange.created_at,
        })
        .await?;

    info!(
        exchange_id = %exchange.id,
        client_id = %client.id,
        %amount_usd,
        "Exchange created"
    );

    Ok(action::created(CreateExchangeResponse {
        success: true,
        exchange_id: exchange.id,
        client_id: client.id,
        status: exchange.status,
        created_at: exchange.created_at,
    }))
}

async fn create_client(state: &AppState, request: NewClient) -> Result<Response, AppError> {
    if request.email.trim().is_empty() {
        return Err(AppError::validation("email is required"));
    }

    let client = state.store.upsert_client(request).await?;
    Ok(action::created(CreateClientResponse {
        success: true,
        client_id: client.id,
        created_at: client.created_at,
    }))
}

async fn update_rate(state: &AppState, request: UpdateRateRequest) -> Result<Response, AppError> {
    if request.rate <= Decimal::ZERO {
        return Err(AppError::validation("rate must be positive"));
    }

    state
        .store
        .upsert_rate(ExchangeRate {
            from_currency: request.from_currency,
            to_currency: request.to_currency,
            rate: request.rate,
            source: request.source.unwrap_or_else(|| "manual".to_string()),
            updated_at: Utc::now(),
        })
        .await?;

    Ok(action::ok(MessageResponse::new("Rate updated")))
}
