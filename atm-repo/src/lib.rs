//! # ATM Repository
//!
//! Concrete adapters for the ATM service ports (`AccountStore`, `Ledger`,
//! `VaultStore`). The in-memory adapter is always available; the SQLite
//! adapter sits behind the `sqlite` feature.

use async_trait::async_trait;
use atm_types::{
    Account, AccountId, AccountStore, DenominationCount, Ledger, Money, RepoError, Transaction,
    VaultStore,
};

pub mod memory;
pub mod security;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "sqlite")]
mod types;


pub use memory::InMemoryRepo;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRepo;

/// URL prefix selecting the in-memory adapter.
pub const MEMORY_URL: &str = "memory://";

/// Repository chosen at start-up from the database URL.
pub enum Repo {
    Memory(InMemoryRepo),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteRepo),
}

/// Build and initialize a repository from a database URL.
///
/// ```ignore
/// let repo = build_repo("memory://").await?;
///
/// // With the `sqlite` feature
/// let repo = build_repo("sqlite://atm.db?mode=rwc").await?;
/// ```
pub async fn build_repo(database_url: &str) -> anyhow::Result<Repo> {
    Repo::new(database_url).await
}

impl Repo {
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        if database_url.starts_with(MEMORY_URL) {
            tracing::info!("Using in-memory repository");
            return Ok(Repo::Memory(InMemoryRepo::new()));
        }

        if database_url.starts_with("sqlite:") {
            #[cfg(feature = "sqlite")]
            {
                tracing::info!("Using SQLite repository");
                return Ok(Repo::Sqlite(SqliteRepo::new(database_url).await?));
            }
            #[cfg(not(feature = "sqlite"))]
            anyhow::bail!("SQLite support is not compiled in; enable the `sqlite` feature");
        }

        anyhow::bail!("Unsupported DATABASE_URL: {database_url}")
    }

    /// Short name of the active adapter, for logs.
    pub fn backend(&self) -> &'static str {
        match self {
            Repo::Memory(_) => "memory",
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(_) => "sqlite",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Port implementations for Repo (delegation)
// ─────────────────────────────────────────────────────────────────────────────

macro_rules! delegate {
    ($self:ident, $method:ident($($arg:expr),*)) => {
        match $self {
            Repo::Memory(inner) => inner.$method($($arg),*).await,
            #[cfg(feature = "sqlite")]
            Repo::Sqlite(inner) => inner.$method($($arg),*).await,
        }
    };
}

#[async_trait]
impl AccountStore for Repo {
    async fn create_account(
        &self,
        account: Account,
        pin_hash: String,
    ) -> Result<Account, RepoError> {
        delegate!(self, create_account(account, pin_hash))
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, RepoError> {
        delegate!(self, get_account(id))
    }

    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<Account>, RepoError> {
        delegate!(self, find_by_mobile(mobile))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, RepoError> {
        delegate!(self, list_accounts())
    }

    async fn delete_account(&self, id: AccountId) -> Result<bool, RepoError> {
        delegate!(self, delete_account(id))
    }

    async fn pin_hash(&self, id: AccountId) -> Result<Option<String>, RepoError> {
        delegate!(self, pin_hash(id))
    }

    async fn update_pin_hash(&self, id: AccountId, pin_hash: String) -> Result<(), RepoError> {
        delegate!(self, update_pin_hash(id, pin_hash))
    }

    async fn get_balance(&self, id: AccountId) -> Result<Money, RepoError> {
        delegate!(self, get_balance(id))
    }

    async fn adjust_balance(&self, id: AccountId, delta: i64) -> Result<Money, RepoError> {
        delegate!(self, adjust_balance(id, delta))
    }
}

#[async_trait]
impl Ledger for Repo {
    async fn record(&self, tx: &Transaction) -> Result<(), RepoError> {
        delegate!(self, record(tx))
    }

    async fn list_for_account(&self, account: AccountId) -> Result<Vec<Transaction>, RepoError> {
        delegate!(self, list_for_account(account))
    }

    async fn list_all(&self) -> Result<Vec<Transaction>, RepoError> {
        delegate!(self, list_all())
    }
}

#[async_trait]
impl VaultStore for Repo {
    async fn load_inventory(&self) -> Result<Option<DenominationCount>, RepoError> {
        delegate!(self, load_inventory())
    }

    async fn save_inventory(&self, notes: &DenominationCount) -> Result<(), RepoError> {
        delegate!(self, save_inventory(notes))
    }
}
