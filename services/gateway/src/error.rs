use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use types::errors::{ComplianceError, StoreError};

/// Central error type for the Gateway application
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid action")]
    InvalidAction,

    /// Reference data the server needs is missing; the caller cannot fix it
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, .. } => AppError::NotFound(format!("{} not found", entity)),
            StoreError::Conflict(msg) => AppError::Validation(msg),
            other => AppError::Internal(other.into()),
        }
    }
}

impl From<ComplianceError> for AppError {
    fn from(err: ComplianceError) -> Self {
        match err {
            ComplianceError::ClientNotFound { .. } => AppError::NotFound("Client not found".into()),
            ComplianceError::KycNotFound { .. } => {
                AppError::NotFound("KYC verification not found".into())
            }
            ComplianceError::WalletVerificationNotFound { .. } => {
                AppError::NotFound("Wallet verification not found".into())
            }
            ComplianceError::InvalidVerificationCode => {
                AppError::Validation("Invalid verification code".into())
            }
            ComplianceError::MissingLimitTier { .. } => AppError::Config(err.to_string()),
            ComplianceError::Store(store) => store.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, code) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
            AppError::InvalidAction => (
                StatusCode::BAD_REQUEST,
                "Invalid action".to_string(),
                "INVALID_ACTION",
            ),
            AppError::Config(msg) => {
                tracing::error!(error = %msg, "Server misconfiguration");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server configuration error".to_string(),
                    "CONFIG_ERROR",
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "INTERNAL_ERROR",
                )
            }
        };

        let body = Json(json!({
            "error": error_message,
            "code": code
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use types::client::VerificationLevel;

    #[test]
    fn test_store_not_found_names_entity() {
        let err: AppError = StoreError::not_found("Exchange", "abc").into();
        assert!(matches!(err, AppError::NotFound(ref msg) if msg == "Exchange not found"));
    }

    #[test]
    fn test_missing_tier_is_server_fault() {
        let err: AppError = ComplianceError::MissingLimitTier {
            level: VerificationLevel::Premium,
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_database_error_is_internal() {
        let err: AppError = StoreError::Database("connection reset".into()).into();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_code_is_validation() {
        let err: AppError = ComplianceError::InvalidVerificationCode.into();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
