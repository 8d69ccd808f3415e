//! # ATM Client SDK
//!
//! A typed Rust client for the ATM API.
//!
//! Customer calls are addressed by mobile number. Administrator calls need
//! the administrator's mobile number, set once with
//! [`AtmClient::with_admin_mobile`].

use atm_types::{
    AccountId, AccountResponse, AtmBalanceResponse, BalanceResponse, ChangePinRequest,
    DepositRequest, InventoryResponse, LoginRequest, LoginResult, MessageResponse,
    ReconciliationReport, RegisterRequest, Transaction, WithdrawRequest, WithdrawResponse,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

/// Error type for client operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} ({kind}) - {message}")]
    Api {
        status: u16,
        kind: String,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No administrator mobile number configured")]
    NoAdmin,
}

impl ClientError {
    /// Machine-readable error kind reported by the server, if any.
    pub fn kind(&self) -> Option<&str> {
        match self {
            ClientError::Api { kind, .. } => Some(kind),
            _ => None,
        }
    }
}

/// ATM API client.
pub struct AtmClient {
    base_url: String,
    admin_mobile: Option<String>,
    http: Client,
}

impl AtmClient {
    /// Creates a new client.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            admin_mobile: None,
            http: Client::new(),
        }
    }

    /// Sets the administrator mobile number used for admin routes.
    pub fn with_admin_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.admin_mobile = Some(mobile.into());
        self
    }

    /// Checks if the API is healthy.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        Ok(resp.status().is_success())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Auth
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn login(&self, mobile: &str, pin: &str) -> Result<LoginResult, ClientError> {
        let req = LoginRequest {
            mobile: mobile.to_string(),
            pin: pin.to_string(),
        };
        self.send(self.http.post(self.url("/api/auth/login")).json(&req))
            .await
    }

    pub async fn register(&self, req: &RegisterRequest) -> Result<AccountResponse, ClientError> {
        self.send(self.http.post(self.url("/api/auth/register")).json(req))
            .await
    }

    pub async fn change_pin(
        &self,
        mobile: &str,
        old_pin: &str,
        new_pin: &str,
    ) -> Result<MessageResponse, ClientError> {
        let req = ChangePinRequest {
            old_pin: old_pin.to_string(),
            new_pin: new_pin.to_string(),
        };
        let url = self.url(&format!("/api/auth/{mobile}/changepin"));
        self.send(self.http.post(url).json(&req)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Customer
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn balance(&self, mobile: &str) -> Result<i64, ClientError> {
        let url = self.url(&format!("/api/auth/{mobile}/balance"));
        let resp: BalanceResponse = self.send(self.http.get(url)).await?;
        Ok(resp.balance)
    }

    /// Deposits notes; returns the new balance.
    pub async fn deposit(&self, mobile: &str, req: &DepositRequest) -> Result<i64, ClientError> {
        let url = self.url(&format!("/api/auth/{mobile}/deposit"));
        let resp: BalanceResponse = self.send(self.http.post(url).json(req)).await?;
        Ok(resp.balance)
    }

    pub async fn withdraw(&self, mobile: &str, amount: i64) -> Result<WithdrawResponse, ClientError> {
        let url = self.url(&format!("/api/auth/{mobile}/withdraw"));
        self.send(self.http.post(url).json(&WithdrawRequest { amount }))
            .await
    }

    /// Transactions of the account, newest first.
    pub async fn transactions(&self, mobile: &str) -> Result<Vec<Transaction>, ClientError> {
        let url = self.url(&format!("/api/auth/{mobile}/transactions"));
        self.send(self.http.get(url)).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Admin
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn add_user(&self, req: &RegisterRequest) -> Result<AccountResponse, ClientError> {
        let builder = self.http.post(self.url("/api/admin/add-user")).json(req);
        self.send(self.as_admin(builder)?).await
    }

    pub async fn delete_user(&self, id: AccountId) -> Result<(), ClientError> {
        let url = self.url(&format!("/api/admin/delete-user/{id}"));
        let resp = self.as_admin(self.http.delete(url))?.send().await?;
        if resp.status().is_success() {
            return Ok(());
        }
        Err(api_error(resp).await)
    }

    pub async fn list_users(&self) -> Result<Vec<AccountResponse>, ClientError> {
        let builder = self.http.get(self.url("/api/admin/users"));
        self.send(self.as_admin(builder)?).await
    }

    pub async fn user_transactions(&self, id: AccountId) -> Result<Vec<Transaction>, ClientError> {
        let url = self.url(&format!("/api/admin/user/{id}/transactions"));
        self.send(self.as_admin(self.http.get(url))?).await
    }

    pub async fn all_transactions(&self) -> Result<Vec<Transaction>, ClientError> {
        let builder = self.http.get(self.url("/api/admin/transactions"));
        self.send(self.as_admin(builder)?).await
    }

    /// Loads notes into the machine; returns the new cash total.
    pub async fn load_cash(&self, req: &DepositRequest) -> Result<i64, ClientError> {
        let builder = self.http.post(self.url("/api/admin/deposit")).json(req);
        let resp: AtmBalanceResponse = self.send(self.as_admin(builder)?).await?;
        Ok(resp.atm_balance)
    }

    pub async fn atm_balance(&self) -> Result<i64, ClientError> {
        let builder = self.http.get(self.url("/api/admin/atm-balance"));
        let resp: AtmBalanceResponse = self.send(self.as_admin(builder)?).await?;
        Ok(resp.atm_balance)
    }

    pub async fn atm_inventory(&self) -> Result<InventoryResponse, ClientError> {
        let builder = self.http.get(self.url("/api/admin/atm-inventory"));
        self.send(self.as_admin(builder)?).await
    }

    /// Drift is reported as an `Api` error of kind `reconciliation_error`.
    pub async fn reconcile(&self) -> Result<ReconciliationReport, ClientError> {
        let builder = self.http.get(self.url("/api/admin/reconcile"));
        self.send(self.as_admin(builder)?).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn as_admin(&self, builder: RequestBuilder) -> Result<RequestBuilder, ClientError> {
        let mobile = self.admin_mobile.as_deref().ok_or(ClientError::NoAdmin)?;
        Ok(builder.query(&[("adminMobile", mobile)]))
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let resp = builder.send().await?;
        if resp.status().is_success() {
            let body = resp.text().await?;
            Ok(serde_json::from_str(&body)?)
        } else {
            Err(api_error(resp).await)
        }
    }
}

async fn api_error(resp: reqwest::Response) -> ClientError {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    parse_error(status, &body)
}

/// Builds an `Api` error from an error body, falling back to the raw text.
fn parse_error(status: u16, body: &str) -> ClientError {
    let json = serde_json::from_str::<serde_json::Value>(body).ok();
    let field = |name: &str| {
        json.as_ref()
            .and_then(|v| v.get(name))
            .and_then(|v| v.as_str())
            .map(String::from)
    };

    ClientError::Api {
        status,
        kind: field("kind").unwrap_or_else(|| "unknown".into()),
        message: field("error").unwrap_or_else(|| body.to_string()),
    }
}
