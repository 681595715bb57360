use axum::{body::Bytes, extract::State, http::Uri, response::Response};
use compliance::KycSubmission;
use rust_decimal::Decimal;

use crate::action;
use crate::error::AppError;
use crate::models::{
    AmlCheckResponse, AmlStatusResponse, ApproveKycRequest, CheckLimitsQuery, ClientQuery,
    DecisionResponse, KycStatusResponse, MessageResponse, PerformAmlCheckRequest,
    RejectKycRequest, RejectKycResponse, SubmitKycResponse, VerifyExchangeRequest,
    VerifyWalletQuery, WalletChallengeResponse, WalletVerificationRequest, WalletVerifiedResponse,
};
use crate::state::AppState;

pub async fn get(State(state): State<AppState>, uri: Uri) -> Result<Response, AppError> {
    match action::query_action(&uri)?.as_deref() {
        Some("check_limits") => {
            let query: CheckLimitsQuery = action::query(&uri)?;
            let decision = state
                .compliance()
                .check_limits(query.client_id, query.amount_usd.unwrap_or(Decimal::ZERO))
                .await?;
            Ok(action::ok(DecisionResponse::from(decision)))
        }
        Some("get_kyc_status") => {
            let query: ClientQuery = action::query(&uri)?;
            let kyc = state.compliance().kyc_status(query.client_id).await?;
            Ok(action::ok(KycStatusResponse { kyc }))
        }
        Some("get_aml_status") => {
            let query: ClientQuery = action::query(&uri)?;
            let aml_checks = state.compliance().aml_status(query.client_id).await?;
            Ok(action::ok(AmlStatusResponse { aml_checks }))
        }
        Some("verify_wallet") => {
            let query: VerifyWalletQuery = action::query(&uri)?;
            state
                .compliance()
                .verify_wallet(query.verification_id, &query.code)
                .await?;
            Ok(action::ok(WalletVerifiedResponse {
                success: true,
                verified: true,
            }))
        }
        _ => Err(AppError::InvalidAction),
    }
}

pub async fn post(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let (action, payload) = action::parse_body(&body)?;
    match action.as_deref() {
        Some("submit_kyc") => {
            let submission: KycSubmission = payload.into_request()?;
            let verification = state.compliance().submit_kyc(submission).await?;
            Ok(action::created(SubmitKycResponse {
                success: true,
                kyc_id: verification.id,
                message: "KYC documents submitted for review",
            }))
        }
        Some("perform_aml_check") => {
            let request: PerformAmlCheckRequest = payload.into_request()?;
            let outcome = state
                .compliance()
                .perform_aml_check(request.client_id, request.exchange_id)
                .await?;
            Ok(action::ok(AmlCheckResponse {
                success: true,
                aml_check_id: outcome.check.id,
                risk_level: outcome.check.risk_level,
                risk_score: outcome.check.risk_score,
                passed: outcome.passed,
            }))
        }
        Some("verify_exchange") => {
            let request: VerifyExchangeRequest = payload.into_request()?;
            let decision = state
                .compliance()
                .verify_exchange(request.exchange_id, request.client_id, request.amount_usd)
                .await?;
            Ok(action::ok(DecisionResponse::from(decision)))
        }
        Some("request_wallet_verification") => {
            let request: WalletVerificationRequest = payload.into_request()?;
            let challenge = state
                .compliance()
                .request_wallet_verification(
                    request.client_id,
                    request.wallet_address,
                    request.currency,
                    request.verification_method,
                )
                .await?;
            Ok(action::ok(WalletChallengeResponse {
                success: true,
                challenge,
            }))
        }
        _ => Err(AppError::InvalidAction),
    }
}

/// KYC review decisions
pub async fn put(State(state): State<AppState>, body: Bytes) -> Result<Response, AppError> {
    let (action, payload) = action::parse_body(&body)?;
    match action.as_deref() {
        Some("approve_kyc") => {
            let request: ApproveKycRequest = payload.into_request()?;
            state
                .compliance()
                .approve_kyc(request.kyc_id, request.verification_level)
                .await?;
            Ok(action::ok(MessageResponse::new("KYC approved")))
        }
        Some("reject_kyc") => {
            let request: RejectKycRequest = payload.into_request()?;
            let verification = state
                .compliance()
                .reject_kyc(request.kyc_id, request.reason)
                .await?;
            Ok(action::ok(RejectKycResponse {
                success: true,
                message: "KYC rejected",
                reason: verification.rejection_reason.unwrap_or_default(),
            }))
        }
        _ => Err(AppError::InvalidAction),
    }
}
