//! The machine's shared cash pool.
//!
//! `CashPool` owns the denomination inventory and is the only place where
//! notes and balances move together. Every movement runs as one critical
//! section under the inventory lock:
//!
//! 1. validate and plan against the current inventory (no mutation),
//! 2. adjust the account balance,
//! 3. persist the new inventory, rolling the balance back if that fails,
//! 4. swap the new inventory in.
//!
//! The ledger is written after the lock is released; a failed record is
//! logged and does not undo the movement.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use atm_types::{
    AccountId, AppError, AtmRepository, CashInventory, CashPolicy, DenominationCount,
    DepositRequest, DispenseStrategy, DomainError, Money, ReconciliationReport, Transaction,
    Withdrawal,
};

/// Authoritative owner of the ATM's notes.
///
/// Cloning is cheap and every clone shares the same inventory.
pub struct CashPool<R: AtmRepository> {
    repo: Arc<R>,
    policy: Arc<CashPolicy>,
    inventory: Arc<Mutex<CashInventory>>,
}

impl<R: AtmRepository> Clone for CashPool<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            policy: Arc::clone(&self.policy),
            inventory: Arc::clone(&self.inventory),
        }
    }
}

/// Waits for a spawned cash movement.
///
/// The movement runs on its own task so that dropping the caller's future
/// cannot stop it between the balance update and the inventory commit.
async fn settle<T>(handle: JoinHandle<Result<T, AppError>>) -> Result<T, AppError> {
    handle
        .await
        .map_err(|e| AppError::Internal(format!("Cash movement aborted: {e}")))?
}

impl<R: AtmRepository> CashPool<R> {
    /// Restores the pool from the vault, or starts empty if nothing was saved.
    ///
    /// Fails if the saved inventory holds a denomination outside the policy.
    #[tracing::instrument(skip_all, fields(denominations = %policy.denominations, strategy = %policy.strategy))]
    pub async fn load(repo: Arc<R>, policy: CashPolicy) -> Result<Self, AppError> {
        let inventory = match repo.load_inventory().await? {
            Some(saved) => CashInventory::from_counts(policy.denominations.clone(), &saved)?,
            None => CashInventory::empty(policy.denominations.clone()),
        };
        tracing::info!(total = %inventory.total_value(), "Cash pool loaded");

        Ok(Self {
            repo,
            policy: Arc::new(policy),
            inventory: Arc::new(Mutex::new(inventory)),
        })
    }

    pub fn policy(&self) -> &CashPolicy {
        &self.policy
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Cash movements
    // ─────────────────────────────────────────────────────────────────────────

    /// Accepts notes for `account` and credits the claimed amount.
    ///
    /// The request is validated before the lock is taken; a rejected request
    /// never touches the inventory or the balance.
    #[tracing::instrument(skip(self, req), fields(account = %account, amount = req.amount))]
    pub async fn deposit(&self, account: AccountId, req: DepositRequest) -> Result<Money, AppError> {
        let amount = req.validate(&self.policy.denominations)?;
        let notes = req.denominations.without_zeros();

        let pool = self.clone();
        settle(tokio::spawn(async move {
            pool.apply_deposit(account, amount, notes).await
        }))
        .await
    }

    /// Debits `amount` from `account` and hands out notes for it.
    ///
    /// Fails with insufficient funds before looking at the notes, and with
    /// insufficient cash when the inventory cannot make the amount exactly.
    #[tracing::instrument(skip(self), fields(account = %account))]
    pub async fn withdraw(&self, account: AccountId, amount: i64) -> Result<Withdrawal, AppError> {
        let amount = Money::positive(amount)?;

        let pool = self.clone();
        settle(tokio::spawn(async move {
            pool.apply_withdrawal(account, amount).await
        }))
        .await
    }

    /// Adds notes to the machine without crediting any account.
    ///
    /// Returns the new cash total.
    #[tracing::instrument(skip(self, req), fields(admin = %admin, amount = req.amount))]
    pub async fn load_cash(&self, admin: AccountId, req: DepositRequest) -> Result<Money, AppError> {
        let amount = req.validate(&self.policy.denominations)?;
        let notes = req.denominations.without_zeros();

        let pool = self.clone();
        settle(tokio::spawn(async move {
            pool.apply_cash_load(admin, amount, notes).await
        }))
        .await
    }

    async fn apply_deposit(
        &self,
        account: AccountId,
        amount: Money,
        notes: DenominationCount,
    ) -> Result<Money, AppError> {
        let mut inventory = self.inventory.lock().await;
        let next = inventory.with_deposit(&notes)?;

        let balance = self.repo.adjust_balance(account, amount.amount()).await?;
        if let Err(e) = self.repo.save_inventory(next.notes()).await {
            self.compensate(account, -amount.amount()).await;
            return Err(e.into());
        }
        *inventory = next;
        drop(inventory);

        tracing::info!(%account, %amount, %balance, notes = %notes, "Deposit applied");
        self.record(Transaction::deposit(account, amount, notes)).await;
        Ok(balance)
    }

    async fn apply_withdrawal(&self, account: AccountId, amount: Money) -> Result<Withdrawal, AppError> {
        let mut inventory = self.inventory.lock().await;

        let available = self.repo.get_balance(account).await?;
        if available.amount() < amount.amount() {
            return Err(DomainError::InsufficientFunds {
                available: available.amount(),
                requested: amount.amount(),
            }
            .into());
        }

        if self.policy.strategy == DispenseStrategy::Exact
            && self
                .policy
                .strategy
                .uses_greedy_for(inventory.notes(), amount.amount())
        {
            tracing::debug!(%amount, "Exact search too large; using greedy selection");
        }
        let dispensed = inventory.plan_withdrawal(amount, self.policy.strategy)?;
        let next = inventory.with_withdrawal(&dispensed)?;

        let balance = self.repo.adjust_balance(account, -amount.amount()).await?;
        if let Err(e) = self.repo.save_inventory(next.notes()).await {
            self.compensate(account, amount.amount()).await;
            return Err(e.into());
        }
        *inventory = next;
        drop(inventory);

        let dispensed = dispensed.without_zeros();
        tracing::info!(%account, %amount, %balance, notes = %dispensed, "Withdrawal dispensed");
        self.record(Transaction::withdrawal(account, amount, dispensed.clone()))
            .await;
        Ok(Withdrawal { balance, dispensed })
    }

    async fn apply_cash_load(
        &self,
        admin: AccountId,
        amount: Money,
        notes: DenominationCount,
    ) -> Result<Money, AppError> {
        let mut inventory = self.inventory.lock().await;
        let next = inventory.with_deposit(&notes)?;

        self.repo.save_inventory(next.notes()).await?;
        let total = next.total_value();
        *inventory = next;
        drop(inventory);

        tracing::info!(%admin, %amount, %total, notes = %notes, "Cash loaded into machine");
        self.record(Transaction::cash_load(Some(admin), amount, notes))
            .await;
        Ok(total)
    }

    /// Undoes a balance change whose inventory half could not be saved.
    async fn compensate(&self, account: AccountId, delta: i64) {
        match self.repo.adjust_balance(account, delta).await {
            Ok(balance) => {
                tracing::warn!(%account, delta, %balance, "Balance rolled back after vault write failure");
            }
            Err(e) => {
                tracing::error!(%account, delta, error = %e, "Balance rollback failed; account needs manual correction");
            }
        }
    }

    async fn record(&self, tx: Transaction) {
        if let Err(e) = self.repo.record(&tx).await {
            tracing::warn!(tx_id = %tx.id, kind = %tx.kind, error = %e, "Failed to record transaction");
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Note counts right now, one entry per configured denomination.
    pub async fn current_inventory(&self) -> DenominationCount {
        self.inventory.lock().await.notes().clone()
    }

    /// Σ denomination × count of the current inventory.
    pub async fn current_total(&self) -> Money {
        self.inventory.lock().await.total_value()
    }

    /// Balance of `account`; does not take the inventory lock.
    pub async fn current_balance(&self, account: AccountId) -> Result<Money, AppError> {
        Ok(self.repo.get_balance(account).await?)
    }

    /// Compares the live inventory with the vault copy. Never mutates.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<ReconciliationReport, AppError> {
        let inventory = self.inventory.lock().await;
        let persisted = self.repo.load_inventory().await?;
        let report = ReconciliationReport::compare(&inventory, persisted.as_ref());
        drop(inventory);

        if report.consistent {
            tracing::debug!(total = report.computed_total, "Cash inventory reconciled");
        } else {
            tracing::error!(
                computed = report.computed_total,
                persisted = ?report.persisted_total,
                mismatched = ?report.mismatched,
                "Cash inventory drift detected"
            );
        }
        Ok(report)
    }
}
