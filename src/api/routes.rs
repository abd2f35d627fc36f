//! API Route Handlers
//!
//! Request/response types and handlers. Every failure returns a structured
//! reason with a stable error code; validation failures never perform
//! side effects.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::server::AppState;
use crate::common::PrivacyError;
use crate::tokens::{to_micro, SupportedToken};

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositRequest {
    pub wallet: String,
    pub amount: f64,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub wallet: String,
    pub recipient: Option<String>,
    pub amount: f64,
    pub token: String,
    /// Hex note secret from the matching deposit; required for real
    /// withdrawals, optional in simulated mode
    pub secret: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaultDepositRequest {
    pub wallet: String,
    pub vault_id: String,
    pub amount: f64,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionRequest {
    pub from_wallet: String,
    pub to_wallet: String,
    pub amount: f64,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MilestoneProofRequest {
    pub milestone: u64,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub wallet: String,
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
}

impl<T: Serialize> SuccessResponse<T> {
    fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: &'static str,
}

fn error_response(err: PrivacyError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &err {
        PrivacyError::Validation(_)
        | PrivacyError::AmountOutOfRange(_)
        | PrivacyError::ThresholdNotConfigured(_) => StatusCode::BAD_REQUEST,
        PrivacyError::DuplicateCommitment(_) | PrivacyError::NullifierAlreadySpent(_) => {
            StatusCode::CONFLICT
        }
        PrivacyError::VaultLocked(_) => StatusCode::LOCKED,
        PrivacyError::BackendUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = ErrorResponse {
        success: false,
        error: err.to_string(),
        code: err.error_code(),
    };

    (status, Json(body))
}

fn parse_token(token: &str) -> Result<SupportedToken, PrivacyError> {
    token.parse().map_err(PrivacyError::Validation)
}

fn parse_token_opt(token: &Option<String>) -> Result<SupportedToken, PrivacyError> {
    match token {
        Some(t) => parse_token(t),
        None => Ok(SupportedToken::Usdc),
    }
}

fn parse_amount(amount: f64) -> Result<u64, PrivacyError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(PrivacyError::validation("amount must be a positive number"));
    }
    Ok(to_micro(amount))
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
    pub network: String,
}

/// GET /api/health
pub async fn handle_health(State(service): State<AppState>) -> impl IntoResponse {
    let config = service.config();
    Json(HealthResponse {
        status: "ok",
        backend: match config.backend {
            crate::config::BackendMode::Simulated => "simulated",
            crate::config::BackendMode::Real => "real",
        },
        network: format!("{:?}", config.network).to_lowercase(),
    })
}

/// POST /api/privacy/deposit
pub async fn handle_deposit(
    State(service): State<AppState>,
    Json(req): Json<DepositRequest>,
) -> impl IntoResponse {
    let result = async {
        let token = parse_token(&req.token)?;
        let amount = parse_amount(req.amount)?;
        service.deposit(&req.wallet, amount, token).await
    }
    .await;

    match result {
        Ok(outcome) => (StatusCode::OK, Json(SuccessResponse::new(outcome))).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

/// POST /api/privacy/withdraw
pub async fn handle_withdraw(
    State(service): State<AppState>,
    Json(req): Json<WithdrawRequest>,
) -> impl IntoResponse {
    let result = async {
        let token = parse_token(&req.token)?;
        let amount = parse_amount(req.amount)?;
        service
            .withdraw(
                &req.wallet,
                req.recipient.as_deref(),
                amount,
                token,
                req.secret.as_deref(),
            )
            .await
    }
    .await;

    match result {
        Ok(outcome) => (StatusCode::OK, Json(SuccessResponse::new(outcome))).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

/// POST /api/privacy/vault-deposit
pub async fn handle_vault_deposit(
    State(service): State<AppState>,
    Json(req): Json<VaultDepositRequest>,
) -> impl IntoResponse {
    let result = async {
        let token = parse_token(&req.token)?;
        let amount = parse_amount(req.amount)?;
        service
            .vault_deposit(&req.wallet, &req.vault_id, amount, token)
            .await
    }
    .await;

    match result {
        Ok(outcome) => (StatusCode::OK, Json(SuccessResponse::new(outcome))).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

/// POST /api/privacy/commission
pub async fn handle_commission(
    State(service): State<AppState>,
    Json(req): Json<CommissionRequest>,
) -> impl IntoResponse {
    let result = async {
        let token = parse_token_opt(&req.token)?;
        let amount = parse_amount(req.amount)?;
        service
            .pay_commission(&req.from_wallet, &req.to_wallet, amount, token)
            .await
    }
    .await;

    match result {
        Ok(outcome) => (StatusCode::OK, Json(SuccessResponse::new(outcome))).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestonesResponse {
    pub token: SupportedToken,
    pub milestones: Vec<crate::milestone::MilestoneStatus>,
    pub reached_count: usize,
    pub total_count: usize,
}

/// GET /api/privacy/milestones
pub async fn handle_check_milestones(
    State(service): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> impl IntoResponse {
    let result = async {
        let token = parse_token_opt(&query.token)?;
        let milestones = service.check_milestones(token).await?;
        let reached_count = milestones.iter().filter(|m| m.reached).count();
        Ok::<_, PrivacyError>(MilestonesResponse {
            token,
            total_count: milestones.len(),
            reached_count,
            milestones,
        })
    }
    .await;

    match result {
        Ok(body) => (StatusCode::OK, Json(SuccessResponse::new(body))).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

/// POST /api/privacy/milestones
pub async fn handle_milestone_proof(
    State(service): State<AppState>,
    Json(req): Json<MilestoneProofRequest>,
) -> impl IntoResponse {
    let result = async {
        let token = parse_token_opt(&req.token)?;
        service.milestone_proof(req.milestone, token).await
    }
    .await;

    match result {
        Ok(proof) => (StatusCode::OK, Json(SuccessResponse::new(proof))).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub wallet: String,
    pub token: SupportedToken,
    pub available: u64,
    pub deposited: u64,
}

/// GET /api/privacy/balance
pub async fn handle_balance(
    State(service): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> impl IntoResponse {
    let result = async {
        let token = parse_token_opt(&query.token)?;
        let balance = service.balance(&query.wallet, token).await?;
        Ok::<_, PrivacyError>(BalanceResponse {
            wallet: query.wallet.clone(),
            token,
            available: balance.available,
            deposited: balance.deposited,
        })
    }
    .await;

    match result {
        Ok(body) => (StatusCode::OK, Json(SuccessResponse::new(body))).into_response(),
        Err(err) => error_response(err).into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct VaultListResponse {
    pub vaults: Vec<crate::vault::VaultInfo>,
}

/// GET /api/privacy/vaults
pub async fn handle_vaults(State(service): State<AppState>) -> impl IntoResponse {
    let vaults = service.vaults().await;
    (
        StatusCode::OK,
        Json(SuccessResponse::new(VaultListResponse { vaults })),
    )
}
