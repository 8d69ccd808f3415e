//! Account storage port.

use crate::domain::{Account, AccountId, Money};
use crate::error::RepoError;

/// Accounts, their PIN hashes and their balances.
///
/// Balance changes MUST be atomic per call: `adjust_balance` either applies
/// the whole delta or nothing, and never leaves a negative balance behind.
#[async_trait::async_trait]
pub trait AccountStore: Send + Sync + 'static {
    /// Stores a new account. Fails with `DomainError::DuplicateAccount` when
    /// the mobile number or email is taken.
    async fn create_account(&self, account: Account, pin_hash: String)
    -> Result<Account, RepoError>;

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, RepoError>;

    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<Account>, RepoError>;

    async fn list_accounts(&self) -> Result<Vec<Account>, RepoError>;

    /// Removes an account. Returns false when it did not exist.
    async fn delete_account(&self, id: AccountId) -> Result<bool, RepoError>;

    async fn pin_hash(&self, id: AccountId) -> Result<Option<String>, RepoError>;

    async fn update_pin_hash(&self, id: AccountId, pin_hash: String) -> Result<(), RepoError>;

    async fn get_balance(&self, id: AccountId) -> Result<Money, RepoError>;

    /// Applies a signed change to the balance and returns the new balance.
    ///
    /// Fails with `DomainError::InsufficientFunds` if the result would be
    /// negative, in which case the balance is unchanged.
    async fn adjust_balance(&self, id: AccountId, delta: i64) -> Result<Money, RepoError>;
}
