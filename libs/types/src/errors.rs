//! Error types shared across the platform
//!
//! Comprehensive error taxonomy using thiserror

use crate::client::VerificationLevel;
use thiserror::Error;

/// A stored or submitted keyword did not match any known enum variant
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {kind}: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

/// Errors raised by the database-access layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: &'static str, reason: String },

    #[error("Database error: {0}")]
    Database(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StoreError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

/// Errors raised by the compliance gate and KYC/AML workflow
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComplianceError {
    #[error("Client not found: {client_id}")]
    ClientNotFound { client_id: String },

    #[error("KYC verification not found: {kyc_id}")]
    KycNotFound { kyc_id: String },

    #[error("Wallet verification not found: {verification_id}")]
    WalletVerificationNotFound { verification_id: String },

    #[error("Invalid verification code")]
    InvalidVerificationCode,

    /// Reference data defect: every tier a client can hold must have a limit row
    #[error("No exchange limits configured for verification level {level}")]
    MissingLimitTier { level: VerificationLevel },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_enum_error_display() {
        let err = ParseEnumError {
            kind: "risk level",
            value: "extreme".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown risk level: extreme");
    }

    #[test]
    fn test_store_error_not_found() {
        let err = StoreError::not_found("Exchange", 42);
        assert_eq!(err.to_string(), "Exchange not found: 42");
    }

    #[test]
    fn test_missing_limit_tier_names_level() {
        let err = ComplianceError::MissingLimitTier {
            level: VerificationLevel::Premium,
        };
        assert!(err.to_string().contains("premium"));
    }

    #[test]
    fn test_compliance_error_from_store_error() {
        let store_err = StoreError::Database("connection reset".to_string());
        let err: ComplianceError = store_err.into();
        assert!(matches!(err, ComplianceError::Store(_)));
    }
}
