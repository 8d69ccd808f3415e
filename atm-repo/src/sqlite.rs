//! SQLite repository adapter.
#![allow(clippy::collapsible_if)]

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

use atm_types::{
    Account, AccountId, AccountStore, DenominationCount, DomainError, Ledger, Money, RepoError,
    Transaction, VaultStore,
};

use crate::types::{DbAccount, DbBalance, DbCashRow, DbPinHash, DbTransaction, counts_from_rows};

const ACCOUNT_COLUMNS: &str = "id, name, email, mobile, role, balance, created_at";
const TRANSACTION_COLUMNS: &str = "id, account_id, kind, amount, notes, created_at";

fn db_err(e: sqlx::Error) -> RepoError {
    RepoError::Database(e.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite repository implementation.
pub struct SqliteRepo {
    pool: SqlitePool,
}

impl SqliteRepo {
    /// Creates a new SQLite repository with automatic migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let in_memory = database_url.contains(":memory:");

        // Ensure the on-disk target directory exists.
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if !in_memory {
                if let Some(parent) = std::path::Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool_options = if in_memory {
            // Every connection to `:memory:` opens its own database, and the
            // database dies with its connection.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        let repo = Self { pool };
        repo.create_schema().await?;
        Ok(repo)
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Creates the database schema.
    pub async fn create_schema(&self) -> Result<(), RepoError> {
        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl).execute(&self.pool).await.map_err(db_err)?;
        Ok(())
    }
}

fn duplicate_field(err: &sqlx::Error) -> Option<&'static str> {
    let sqlx::Error::Database(db) = err else {
        return None;
    };
    if !db.is_unique_violation() {
        return None;
    }
    if db.message().contains("accounts.email") {
        Some("email")
    } else {
        Some("mobile number")
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Accounts
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl AccountStore for SqliteRepo {
    async fn create_account(
        &self,
        account: Account,
        pin_hash: String,
    ) -> Result<Account, RepoError> {
        let result = sqlx::query(
            r#"INSERT INTO accounts (id, name, email, mobile, role, pin_hash, balance, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(account.id.to_string())
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.mobile)
        .bind(account.role.as_str())
        .bind(&pin_hash)
        .bind(account.balance.amount())
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(account),
            Err(e) => match duplicate_field(&e) {
                Some(field) => Err(DomainError::DuplicateAccount(field.into()).into()),
                None => Err(db_err(e)),
            },
        }
    }

    async fn get_account(&self, id: AccountId) -> Result<Option<Account>, RepoError> {
        let row: Option<DbAccount> =
            sqlx::query_as(&format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(db_err)?;

        row.map(DbAccount::into_domain).transpose()
    }

    async fn find_by_mobile(&self, mobile: &str) -> Result<Option<Account>, RepoError> {
        let row: Option<DbAccount> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE mobile = ?"
        ))
        .bind(mobile)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(DbAccount::into_domain).transpose()
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, RepoError> {
        let rows: Vec<DbAccount> = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbAccount::into_domain).collect()
    }

    async fn delete_account(&self, id: AccountId) -> Result<bool, RepoError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    async fn pin_hash(&self, id: AccountId) -> Result<Option<String>, RepoError> {
        let row: Option<DbPinHash> = sqlx::query_as("SELECT pin_hash FROM accounts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.map(|r| r.pin_hash))
    }

    async fn update_pin_hash(&self, id: AccountId, pin_hash: String) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE accounts SET pin_hash = ? WHERE id = ?")
            .bind(&pin_hash)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn get_balance(&self, id: AccountId) -> Result<Money, RepoError> {
        let row: Option<DbBalance> = sqlx::query_as("SELECT balance FROM accounts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        let row = row.ok_or(RepoError::Domain(DomainError::AccountNotFound(id)))?;
        Money::new(row.balance).map_err(|e| RepoError::Database(e.to_string()))
    }

    async fn adjust_balance(&self, id: AccountId, delta: i64) -> Result<Money, RepoError> {
        let id_str = id.to_string();

        // Single statement: the guard and the update cannot interleave.
        let row: Option<DbBalance> = sqlx::query_as(
            r#"UPDATE accounts SET balance = balance + ?1
               WHERE id = ?2 AND balance + ?1 >= 0
               RETURNING balance"#,
        )
        .bind(delta)
        .bind(&id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        if let Some(row) = row {
            return Money::new(row.balance).map_err(|e| RepoError::Database(e.to_string()));
        }

        // Nothing changed: either the account is missing or funds are short.
        let available = self.get_balance(id).await?;
        Err(DomainError::InsufficientFunds {
            available: available.amount(),
            requested: delta.saturating_neg(),
        }
        .into())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ledger
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Ledger for SqliteRepo {
    async fn record(&self, tx: &Transaction) -> Result<(), RepoError> {
        let notes = serde_json::to_string(&tx.notes.without_zeros())
            .map_err(|e| RepoError::Database(e.to_string()))?;

        sqlx::query(
            r#"INSERT INTO transactions (id, account_id, kind, amount, notes, created_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(tx.id.to_string())
        .bind(tx.account_id.map(|id| id.to_string()))
        .bind(tx.kind.as_str())
        .bind(tx.amount.amount())
        .bind(notes)
        .bind(tx.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn list_for_account(&self, account: AccountId) -> Result<Vec<Transaction>, RepoError> {
        let rows: Vec<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE account_id = ? \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .bind(account.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }

    async fn list_all(&self) -> Result<Vec<Transaction>, RepoError> {
        let rows: Vec<DbTransaction> = sqlx::query_as(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(DbTransaction::into_domain).collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Vault
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl VaultStore for SqliteRepo {
    async fn load_inventory(&self) -> Result<Option<DenominationCount>, RepoError> {
        let rows: Vec<DbCashRow> =
            sqlx::query_as("SELECT denomination, count FROM cash_inventory ORDER BY denomination")
                .fetch_all(&self.pool)
                .await
                .map_err(db_err)?;

        if rows.is_empty() {
            return Ok(None);
        }
        counts_from_rows(rows).map(Some)
    }

    async fn save_inventory(&self, notes: &DenominationCount) -> Result<(), RepoError> {
        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;

        sqlx::query("DELETE FROM cash_inventory")
            .execute(&mut *db_tx)
            .await
            .map_err(db_err)?;

        for (denomination, count) in notes.iter() {
            sqlx::query("INSERT INTO cash_inventory (denomination, count) VALUES (?, ?)")
                .bind(i64::from(denomination.value()))
                .bind(i64::from(count))
                .execute(&mut *db_tx)
                .await
                .map_err(db_err)?;
        }

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Transaction(e.to_string()))?;
        Ok(())
    }
}
