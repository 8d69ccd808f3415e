//! In-memory repository adapter.
//!
//! Used for `memory://` database URLs, demos and tests. Nothing survives a
//! restart.

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use atm_types::{
    Account, AccountId, AccountStore, DenominationCount, DomainError, Ledger, Money, RepoError,
    Transaction, VaultStore,
};

struct StoredAccount {
    account: Account,
    pin_hash: String,
}

/// Accounts in a concurrent map, the ledger and vault behind async mutexes.
#[derive(Default)]
pub struct InMemoryRepo {
    accounts: DashMap<AccountId, StoredAccount>,
    // Serializes uniqueness checks with inserts.
    registry: Mutex<()>,
    ledger: Mutex<Vec<Transaction>>,
    vault: Mutex<Option<DenominationCount>>,
}

impl InMemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn id_for_mobile(&self, mobile: &str) -> Option<AccountId> {
        self.accounts
            .iter()
            .find(|entry| entry.account.mobile == mobile)
            .map(|entry| *entry.key())
    }
}

#[async_trait]
impl AccountStore for InMemoryRepo {
    async fn create_account(
        &self,
        account: Account,
        pin_hash: String,
    ) -> Result<Account, RepoError> {
        let _guard = self.registry.lock().await;

        for entry in self.accounts.iter() {
            if entry.account.mobile == account.mobile {
                return Err(DomainError::DuplicateAccount("mobile number".into()).into());
            }
            if entry.account.email == account.email {
                return Err(DomainError::DuplicateAccount("email".into()).into());
            }
        }

        self.accounts.insert(
            account.id,
            StoredAccount {
                account: account.clone(),
                pin_hash,
            },
        );
        Ok(account)
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, RepoError> {
        Ok(self.accounts.get(&id).map(|entry| entry.account.clone()))
    }

    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<Account>, RepoError> {
        let Some(id) = self.id_for_mobile(mobile) else {
            return Ok(None);
        };
        self.get_account(id).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, RepoError> {
        let mut accounts: Vec<Account> = self
            .accounts
            .iter()
            .map(|entry| entry.account.clone())
            .collect();
        accounts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(accounts)
    }

    async fn delete_account(&self, id: AccountId) -> Result<bool, RepoError> {
        let _guard = self.registry.lock().await;
        Ok(self.accounts.remove(&id).is_some())
    }

    async fn pin_hash(&self, id: AccountId) -> Result<Option<String>, RepoError> {
        Ok(self.accounts.get(&id).map(|entry| entry.pin_hash.clone()))
    }

    async fn update_pin_hash(&self, id: AccountId, pin_hash: String) -> Result<(), RepoError> {
        let mut entry = self.accounts.get_mut(&id).ok_or(RepoError::NotFound)?;
        entry.pin_hash = pin_hash;
        Ok(())
    }

    async fn get_balance(&self, id: AccountId) -> Result<Money, RepoError> {
        self.accounts
            .get(&id)
            .map(|entry| entry.account.balance)
            .ok_or(RepoError::Domain(DomainError::AccountNotFound(id)))
    }

    async fn adjust_balance(&self, id: AccountId, delta: i64) -> Result<Money, RepoError> {
        let mut entry = self
            .accounts
            .get_mut(&id)
            .ok_or(RepoError::Domain(DomainError::AccountNotFound(id)))?;
        Ok(entry.account.adjust(delta)?)
    }
}

#[async_trait]
impl Ledger for InMemoryRepo {
    async fn record(&self, tx: &Transaction) -> Result<(), RepoError> {
        self.ledger.lock().await.push(tx.clone());
        Ok(())
    }

    async fn list_for_account(&self, account: AccountId) -> Result<Vec<Transaction>, RepoError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger
            .iter()
            .rev()
            .filter(|tx| tx.account_id == Some(account))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Transaction>, RepoError> {
        let ledger = self.ledger.lock().await;
        Ok(ledger.iter().rev().cloned().collect())
    }
}

#[async_trait]
impl VaultStore for InMemoryRepo {
    async fn load_inventory(&self) -> Result<Option<DenominationCount>, RepoError> {
        Ok(self.vault.lock().await.clone())
    }

    async fn save_inventory(&self, notes: &DenominationCount) -> Result<(), RepoError> {
        *self.vault.lock().await = Some(notes.clone());
        Ok(())
    }
}
