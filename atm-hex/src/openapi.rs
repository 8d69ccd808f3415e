//! OpenAPI specification, served at `/api-docs/openapi.json`.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use atm_types::domain::{AccountId, Role};
use atm_types::dto::{
    AccountResponse, AtmBalanceResponse, BalanceResponse, ChangePinRequest, DepositRequest,
    InventoryResponse, LoginRequest, MessageResponse, RegisterRequest, WithdrawRequest,
    WithdrawResponse,
};
use utoipa::OpenApi;

// Stand-ins carrying the path documentation; the real handlers live in
// `inbound::handlers`.

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = inline(serde_json::Value), example = json!({"status": "healthy"}))
    )
)]
async fn health() {}

/// Log in with mobile number and PIN
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session tagged by role", body = inline(serde_json::Value),
            example = json!({"role": "customer", "id": "123e4567-e89b-12d3-a456-426614174000", "name": "Asha", "email": "asha@example.com", "mobile": "9876543210"})),
        (status = 401, description = "Invalid mobile number or PIN"),
        (status = 429, description = "Too many login attempts")
    )
)]
async fn login() {}

/// Register a customer account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 409, description = "Mobile number or email already registered"),
        (status = 422, description = "Invalid name, email, mobile or PIN")
    )
)]
async fn register() {}

/// Change the PIN
#[utoipa::path(
    post,
    path = "/api/auth/{mobile}/changepin",
    tag = "auth",
    request_body = ChangePinRequest,
    params(("mobile" = String, Path, description = "Ten-digit mobile number")),
    responses(
        (status = 200, description = "PIN changed", body = MessageResponse),
        (status = 401, description = "Old PIN is wrong"),
        (status = 422, description = "New PIN is invalid")
    )
)]
async fn change_pin() {}

/// Current balance
#[utoipa::path(
    get,
    path = "/api/auth/{mobile}/balance",
    tag = "customer",
    params(("mobile" = String, Path, description = "Ten-digit mobile number")),
    responses(
        (status = 200, description = "Balance", body = BalanceResponse),
        (status = 404, description = "No account for this mobile number")
    )
)]
async fn balance() {}

/// Deposit notes
#[utoipa::path(
    post,
    path = "/api/auth/{mobile}/deposit",
    tag = "customer",
    request_body = DepositRequest,
    params(("mobile" = String, Path, description = "Ten-digit mobile number")),
    responses(
        (status = 200, description = "New balance", body = BalanceResponse),
        (status = 422, description = "Amount, denominations or note sum invalid")
    )
)]
async fn deposit() {}

/// Withdraw cash
#[utoipa::path(
    post,
    path = "/api/auth/{mobile}/withdraw",
    tag = "customer",
    request_body = WithdrawRequest,
    params(("mobile" = String, Path, description = "Ten-digit mobile number")),
    responses(
        (status = 200, description = "New balance and the notes dispensed", body = WithdrawResponse),
        (status = 409, description = "Insufficient funds or insufficient cash in the machine"),
        (status = 422, description = "Amount is not positive")
    )
)]
async fn withdraw() {}

/// Transaction history, newest first
#[utoipa::path(
    get,
    path = "/api/auth/{mobile}/transactions",
    tag = "customer",
    params(("mobile" = String, Path, description = "Ten-digit mobile number")),
    responses(
        (status = 200, description = "Transactions", body = inline(Vec<serde_json::Value>))
    )
)]
async fn transactions() {}

/// Add a customer account
#[utoipa::path(
    post,
    path = "/api/admin/add-user",
    tag = "admin",
    request_body = RegisterRequest,
    params(("adminMobile" = String, Query, description = "Administrator mobile number")),
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 403, description = "Caller is not an administrator")
    )
)]
async fn add_user() {}

/// Delete a customer account
#[utoipa::path(
    delete,
    path = "/api/admin/delete-user/{id}",
    tag = "admin",
    params(
        ("id" = AccountId, Path, description = "Account ID (UUID)"),
        ("adminMobile" = String, Query, description = "Administrator mobile number")
    ),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Caller is not an administrator, or target is one"),
        (status = 404, description = "Account not found")
    )
)]
async fn delete_user() {}

/// List accounts
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "admin",
    params(("adminMobile" = String, Query, description = "Administrator mobile number")),
    responses(
        (status = 200, description = "Accounts", body = Vec<AccountResponse>)
    )
)]
async fn list_users() {}

/// Transactions of one account
#[utoipa::path(
    get,
    path = "/api/admin/user/{id}/transactions",
    tag = "admin",
    params(
        ("id" = AccountId, Path, description = "Account ID (UUID)"),
        ("adminMobile" = String, Query, description = "Administrator mobile number")
    ),
    responses(
        (status = 200, description = "Transactions", body = inline(Vec<serde_json::Value>)),
        (status = 404, description = "Account not found")
    )
)]
async fn user_transactions() {}

/// Every transaction
#[utoipa::path(
    get,
    path = "/api/admin/transactions",
    tag = "admin",
    params(("adminMobile" = String, Query, description = "Administrator mobile number")),
    responses(
        (status = 200, description = "Transactions", body = inline(Vec<serde_json::Value>))
    )
)]
async fn all_transactions() {}

/// Load notes into the machine
#[utoipa::path(
    post,
    path = "/api/admin/deposit",
    tag = "admin",
    request_body = DepositRequest,
    params(("adminMobile" = String, Query, description = "Administrator mobile number")),
    responses(
        (status = 200, description = "New cash total", body = AtmBalanceResponse),
        (status = 422, description = "Amount, denominations or note sum invalid")
    )
)]
async fn load_cash() {}

/// Cash held by the machine
#[utoipa::path(
    get,
    path = "/api/admin/atm-balance",
    tag = "admin",
    params(("adminMobile" = String, Query, description = "Administrator mobile number")),
    responses(
        (status = 200, description = "Cash total", body = AtmBalanceResponse)
    )
)]
async fn atm_balance() {}

/// Notes held by the machine
#[utoipa::path(
    get,
    path = "/api/admin/atm-inventory",
    tag = "admin",
    params(("adminMobile" = String, Query, description = "Administrator mobile number")),
    responses(
        (status = 200, description = "Note counts and total", body = InventoryResponse)
    )
)]
async fn atm_inventory() {}

/// Compare the cash pool with its saved copy
#[utoipa::path(
    get,
    path = "/api/admin/reconcile",
    tag = "admin",
    params(("adminMobile" = String, Query, description = "Administrator mobile number")),
    responses(
        (status = 200, description = "Inventory is consistent", body = inline(serde_json::Value),
            example = json!({"consistent": true, "computed_total": 24500, "persisted_total": 24500, "mismatched": []})),
        (status = 500, description = "Drift detected")
    )
)]
async fn reconcile() {}

/// OpenAPI documentation for the ATM API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "ATM Service API",
        version = "1.0.0",
        description = "Denomination-aware ATM: customer deposits and withdrawals, administrator cash loading and reconciliation.\n\nErrors are returned as `{\"error\": message, \"kind\": kind, \"code\": status}`; `kind` is one of `validation_error`, `insufficient_funds`, `insufficient_cash`, `reconciliation_error`, `unauthorized`, `forbidden`, `not_found`, `conflict`, `too_many_requests`, `internal_error`.",
        license(name = "MIT"),
    ),
    paths(
        health,
        login,
        register,
        change_pin,
        balance,
        deposit,
        withdraw,
        transactions,
        add_user,
        delete_user,
        list_users,
        user_transactions,
        all_transactions,
        load_cash,
        atm_balance,
        atm_inventory,
        reconcile,
    ),
    components(
        schemas(
            LoginRequest,
            RegisterRequest,
            ChangePinRequest,
            DepositRequest,
            WithdrawRequest,
            BalanceResponse,
            WithdrawResponse,
            AtmBalanceResponse,
            InventoryResponse,
            AccountResponse,
            MessageResponse,
            AccountId,
            Role,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Login, registration and PIN management"),
        (name = "customer", description = "Balance, deposits, withdrawals and history"),
        (name = "admin", description = "Account administration and cash management"),
    )
)]
pub struct ApiDoc;
