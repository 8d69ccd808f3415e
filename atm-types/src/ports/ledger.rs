//! Transaction ledger port.

use crate::domain::{AccountId, Transaction};
use crate::error::RepoError;

/// Append-only history of cash movements.
///
/// Recording happens after the money has moved; callers log a failed
/// `record` and carry on.
#[async_trait::async_trait]
pub trait Ledger: Send + Sync + 'static {
    async fn record(&self, tx: &Transaction) -> Result<(), RepoError>;

    /// Transactions of one account, newest first.
    async fn list_for_account(&self, account: AccountId) -> Result<Vec<Transaction>, RepoError>;

    /// Every transaction, newest first.
    async fn list_all(&self) -> Result<Vec<Transaction>, RepoError>;
}
