//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use utoipa::OpenApi;

use atm_types::{
    Account, AccountId, AccountResponse, AppError, AtmBalanceResponse, AtmRepository,
    BalanceResponse, ChangePinRequest, DepositRequest, InventoryResponse, LoginRequest,
    MessageResponse, RegisterRequest, WithdrawRequest, WithdrawResponse,
};

use crate::AtmService;
use crate::openapi::ApiDoc;

/// Application state shared across handlers.
pub struct AppState<R: AtmRepository> {
    pub service: AtmService<R>,
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_)
            | AppError::InsufficientFunds { .. }
            | AppError::InsufficientCash { .. } => StatusCode::CONFLICT,
            AppError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            AppError::Reconciliation(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(kind = self.0.kind(), error = %self.0, "Request failed");
        }

        let body = serde_json::json!({
            "error": self.0.to_string(),
            "kind": self.0.kind(),
            "code": status.as_u16()
        });

        (status, Json(body)).into_response()
    }
}

fn parse_account_id(id: &str) -> Result<AccountId, ApiError> {
    id.parse()
        .map_err(|_| AppError::BadRequest("Invalid account ID".into()).into())
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// OpenAPI document.
pub async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, req), fields(mobile = %req.mobile))]
pub async fn login<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let login = state.service.login(&req.mobile, &req.pin).await?;
    Ok(Json(login))
}

#[tracing::instrument(skip(state, req), fields(mobile = %req.mobile))]
pub async fn register<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.service.register(req).await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

#[tracing::instrument(skip(state, req))]
pub async fn change_pin<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(mobile): Path<String>,
    Json(req): Json<ChangePinRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.change_pin(&mobile, req).await?;
    Ok(Json(MessageResponse {
        message: "PIN changed successfully".into(),
    }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Customer
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state))]
pub async fn balance<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(mobile): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state.service.balance(&mobile).await?;
    Ok(Json(BalanceResponse {
        balance: balance.amount(),
    }))
}

#[tracing::instrument(skip(state, req), fields(amount = req.amount))]
pub async fn deposit<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(mobile): Path<String>,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let balance = state.service.deposit(&mobile, req).await?;
    Ok(Json(BalanceResponse {
        balance: balance.amount(),
    }))
}

#[tracing::instrument(skip(state, req), fields(amount = req.amount))]
pub async fn withdraw<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(mobile): Path<String>,
    Json(req): Json<WithdrawRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let withdrawal = state.service.withdraw(&mobile, req.amount).await?;
    Ok(Json(WithdrawResponse::from(withdrawal)))
}

#[tracing::instrument(skip(state))]
pub async fn transactions<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(mobile): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = state.service.transactions(&mobile).await?;
    Ok(Json(transactions))
}

// ─────────────────────────────────────────────────────────────────────────────
// Admin (the caller is resolved by `admin_guard`)
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip(state, admin, req), fields(admin = %admin.mobile, mobile = %req.mobile))]
pub async fn add_user<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(admin): Extension<Account>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let account = state.service.add_user(req).await?;
    Ok((StatusCode::CREATED, Json(AccountResponse::from(account))))
}

#[tracing::instrument(skip(state, admin), fields(admin = %admin.mobile))]
pub async fn delete_user<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(admin): Extension<Account>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_account_id(&id)?;
    state.service.delete_user(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[tracing::instrument(skip_all)]
pub async fn list_users<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<impl IntoResponse, ApiError> {
    let users: Vec<AccountResponse> = state
        .service
        .list_users()
        .await?
        .into_iter()
        .map(AccountResponse::from)
        .collect();
    Ok(Json(users))
}

#[tracing::instrument(skip(state))]
pub async fn user_transactions<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_account_id(&id)?;
    let transactions = state.service.user_transactions(id).await?;
    Ok(Json(transactions))
}

#[tracing::instrument(skip_all)]
pub async fn all_transactions<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<impl IntoResponse, ApiError> {
    let transactions = state.service.all_transactions().await?;
    Ok(Json(transactions))
}

#[tracing::instrument(skip(state, admin, req), fields(admin = %admin.mobile, amount = req.amount))]
pub async fn load_cash<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
    Extension(admin): Extension<Account>,
    Json(req): Json<DepositRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let total = state.service.load_cash(&admin, req).await?;
    Ok(Json(AtmBalanceResponse {
        atm_balance: total.amount(),
    }))
}

pub async fn atm_balance<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> impl IntoResponse {
    Json(AtmBalanceResponse {
        atm_balance: state.service.atm_balance().await.amount(),
    })
}

pub async fn atm_inventory<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<impl IntoResponse, ApiError> {
    let denominations = state.service.atm_inventory().await;
    let total = denominations.total_value().map_err(AppError::from)?;
    Ok(Json(InventoryResponse {
        denominations,
        total,
    }))
}

#[tracing::instrument(skip_all)]
pub async fn reconcile<R: AtmRepository>(
    State(state): State<Arc<AppState<R>>>,
) -> Result<impl IntoResponse, ApiError> {
    let report = state.service.reconcile().await?;
    Ok(Json(report))
}
