//! ATM Application Service
//!
//! Orchestrates customer and administrator operations through the ports.
//! Every cash movement is delegated to the [`CashPool`].

use std::sync::Arc;

use atm_repo::security::{hash_pin, verify_pin};
use atm_types::domain::{validate_mobile, validate_pin};
use atm_types::{
    Account, AccountId, AppError, AtmRepository, CashPolicy, ChangePinRequest,
    DenominationCount, DepositRequest, DomainError, LoginResult, Money, ReconciliationReport,
    RegisterRequest, Role, Transaction, Withdrawal,
};

use crate::cash_pool::CashPool;
use crate::rate_limit::RateLimiterState;

/// Application service for the ATM.
///
/// Generic over `R: AtmRepository`; the adapter is injected at compile time.
pub struct AtmService<R: AtmRepository> {
    repo: Arc<R>,
    pool: CashPool<R>,
    login_limiter: RateLimiterState,
}

impl<R: AtmRepository> AtmService<R> {
    /// Creates the service, restoring the cash pool from the vault.
    pub async fn new(repo: Arc<R>, policy: CashPolicy) -> Result<Self, AppError> {
        let pool = CashPool::load(Arc::clone(&repo), policy).await?;
        Ok(Self {
            repo,
            pool,
            login_limiter: RateLimiterState::default(),
        })
    }

    /// Replaces the login throttle.
    pub fn with_login_limiter(mut self, limiter: RateLimiterState) -> Self {
        self.login_limiter = limiter;
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn cash_pool(&self) -> &CashPool<R> {
        &self.pool
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Authentication
    // ─────────────────────────────────────────────────────────────────────────────

    /// Checks a mobile number and PIN.
    ///
    /// Unknown numbers and wrong PINs fail the same way. Malformed numbers
    /// are rejected before they reach the throttle.
    #[tracing::instrument(skip(self, pin))]
    pub async fn login(&self, mobile: &str, pin: &str) -> Result<LoginResult, AppError> {
        if validate_mobile(mobile).is_err() {
            return Err(DomainError::InvalidCredentials.into());
        }
        if !self.login_limiter.check(mobile) {
            tracing::warn!("Login throttled");
            return Err(AppError::TooManyRequests(
                "Too many login attempts. Please try again later.".into(),
            ));
        }

        let account = self
            .repo
            .find_by_mobile(mobile)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;
        let stored = self
            .repo
            .pin_hash(account.id)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        if !verify_pin(mobile, pin, &stored) {
            tracing::info!("Login rejected");
            return Err(DomainError::InvalidCredentials.into());
        }

        self.login_limiter.reset(mobile);
        tracing::info!(role = %account.role, "Login succeeded");
        Ok(LoginResult::from(&account))
    }

    /// Opens a customer account with a zero balance.
    #[tracing::instrument(skip(self, req), fields(mobile = %req.mobile))]
    pub async fn register(&self, req: RegisterRequest) -> Result<Account, AppError> {
        self.create_account(req, Role::Customer).await
    }

    async fn create_account(&self, req: RegisterRequest, role: Role) -> Result<Account, AppError> {
        validate_pin(&req.pin)?;
        let account = Account::new(req.name, req.email, req.mobile, role)?;
        let pin_hash = hash_pin(&account.mobile, &req.pin);

        let account = self.repo.create_account(account, pin_hash).await?;
        tracing::info!(account_id = %account.id, role = %account.role, "Account created");
        Ok(account)
    }

    /// Replaces the PIN after checking the old one.
    #[tracing::instrument(skip(self, req))]
    pub async fn change_pin(&self, mobile: &str, req: ChangePinRequest) -> Result<(), AppError> {
        let account = self.account_by_mobile(mobile).await?;
        let stored = self
            .repo
            .pin_hash(account.id)
            .await?
            .ok_or(DomainError::InvalidCredentials)?;

        if !verify_pin(mobile, &req.old_pin, &stored) {
            return Err(DomainError::InvalidCredentials.into());
        }
        validate_pin(&req.new_pin)?;

        self.repo
            .update_pin_hash(account.id, hash_pin(mobile, &req.new_pin))
            .await?;
        tracing::info!(account_id = %account.id, "PIN changed");
        Ok(())
    }

    /// Creates the administrator account unless the mobile number is taken.
    #[tracing::instrument(skip(self, req), fields(mobile = %req.mobile))]
    pub async fn ensure_admin(&self, req: RegisterRequest) -> Result<Account, AppError> {
        if let Some(existing) = self.repo.find_by_mobile(&req.mobile).await? {
            if !existing.is_admin() {
                return Err(DomainError::NotAdmin(existing.mobile).into());
            }
            return Ok(existing);
        }
        self.create_account(req, Role::Admin).await
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Customer operations
    // ─────────────────────────────────────────────────────────────────────────────

    async fn account_by_mobile(&self, mobile: &str) -> Result<Account, AppError> {
        validate_mobile(mobile)?;
        self.repo
            .find_by_mobile(mobile)
            .await?
            .ok_or_else(|| DomainError::MobileNotFound(mobile.to_string()).into())
    }

    pub async fn balance(&self, mobile: &str) -> Result<Money, AppError> {
        let account = self.account_by_mobile(mobile).await?;
        self.pool.current_balance(account.id).await
    }

    pub async fn deposit(&self, mobile: &str, req: DepositRequest) -> Result<Money, AppError> {
        let account = self.account_by_mobile(mobile).await?;
        self.pool.deposit(account.id, req).await
    }

    pub async fn withdraw(&self, mobile: &str, amount: i64) -> Result<Withdrawal, AppError> {
        let account = self.account_by_mobile(mobile).await?;
        self.pool.withdraw(account.id, amount).await
    }

    /// Transactions of the account, newest first.
    pub async fn transactions(&self, mobile: &str) -> Result<Vec<Transaction>, AppError> {
        let account = self.account_by_mobile(mobile).await?;
        Ok(self.repo.list_for_account(account.id).await?)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Administrator operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Resolves `mobile` to an administrator account.
    pub async fn require_admin(&self, mobile: &str) -> Result<Account, AppError> {
        match self.repo.find_by_mobile(mobile).await? {
            Some(account) if account.is_admin() => Ok(account),
            _ => Err(DomainError::NotAdmin(mobile.to_string()).into()),
        }
    }

    pub async fn add_user(&self, req: RegisterRequest) -> Result<Account, AppError> {
        self.create_account(req, Role::Customer).await
    }

    /// Removes a customer account. Its transactions stay in the ledger.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: AccountId) -> Result<(), AppError> {
        let account = self
            .repo
            .get_account(id)
            .await?
            .ok_or(DomainError::AccountNotFound(id))?;
        if account.is_admin() {
            return Err(AppError::Forbidden(
                "Administrator accounts cannot be deleted".into(),
            ));
        }

        if !self.repo.delete_account(id).await? {
            return Err(DomainError::AccountNotFound(id).into());
        }
        tracing::info!(account_id = %id, "Account deleted");
        Ok(())
    }

    pub async fn list_users(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.repo.list_accounts().await?)
    }

    pub async fn user_transactions(&self, id: AccountId) -> Result<Vec<Transaction>, AppError> {
        self.repo
            .get_account(id)
            .await?
            .ok_or(DomainError::AccountNotFound(id))?;
        Ok(self.repo.list_for_account(id).await?)
    }

    pub async fn all_transactions(&self) -> Result<Vec<Transaction>, AppError> {
        Ok(self.repo.list_all().await?)
    }

    /// Loads notes into the machine; returns the new cash total.
    pub async fn load_cash(&self, admin: &Account, req: DepositRequest) -> Result<Money, AppError> {
        self.pool.load_cash(admin.id, req).await
    }

    pub async fn atm_balance(&self) -> Money {
        self.pool.current_total().await
    }

    pub async fn atm_inventory(&self) -> DenominationCount {
        self.pool.current_inventory().await
    }

    /// Checks the cash pool against its saved copy; drift is an error.
    pub async fn reconcile(&self) -> Result<ReconciliationReport, AppError> {
        let report = self.pool.reconcile().await?;
        Ok(report.into_result()?)
    }
}
