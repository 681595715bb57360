pub mod exchange;
pub mod kyc_aml;
pub mod trading;

use axum::Json;
use serde_json::json;

use crate::error::AppError;

/// Methods an API route does not serve
pub async fn invalid_method() -> AppError {
    AppError::InvalidAction
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
