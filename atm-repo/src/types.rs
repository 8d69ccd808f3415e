//! Database row types and their conversion into domain types.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use atm_types::{
    Account, AccountId, Denomination, DenominationCount, Money, RepoError, Role, Transaction,
    TransactionId, TransactionKind,
};

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs
// ─────────────────────────────────────────────────────────────────────────────

/// Account row from database.
#[derive(FromRow)]
pub struct DbAccount {
    pub id: String,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub role: String,
    pub balance: i64,
    pub created_at: String,
}

/// Transaction row from database. `notes` holds the note counts as JSON.
#[derive(FromRow)]
pub struct DbTransaction {
    pub id: String,
    pub account_id: Option<String>,
    pub kind: String,
    pub amount: i64,
    pub notes: String,
    pub created_at: String,
}

/// One denomination of the stored cash inventory.
#[derive(FromRow)]
pub struct DbCashRow {
    pub denomination: i64,
    pub count: i64,
}

/// Balance-only row for queries.
#[derive(FromRow)]
pub struct DbBalance {
    pub balance: i64,
}

/// PIN-hash-only row for queries.
#[derive(FromRow)]
pub struct DbPinHash {
    pub pin_hash: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing helpers
// ─────────────────────────────────────────────────────────────────────────────

fn db_err(e: impl std::fmt::Display) -> RepoError {
    RepoError::Database(e.to_string())
}

fn parse_uuid(s: &str) -> Result<Uuid, RepoError> {
    Uuid::parse_str(s).map_err(db_err)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, RepoError> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(db_err)?
        .with_timezone(&Utc))
}

// ─────────────────────────────────────────────────────────────────────────────
// Domain conversion
// ─────────────────────────────────────────────────────────────────────────────

impl DbAccount {
    /// Convert database row to domain Account.
    pub fn into_domain(self) -> Result<Account, RepoError> {
        let role: Role = self.role.parse().map_err(db_err)?;
        let balance = Money::new(self.balance).map_err(db_err)?;

        Ok(Account::from_parts(
            AccountId::from_uuid(parse_uuid(&self.id)?),
            self.name,
            self.email,
            self.mobile,
            role,
            balance,
            parse_timestamp(&self.created_at)?,
        ))
    }
}

impl DbTransaction {
    /// Convert database row to domain Transaction.
    pub fn into_domain(self) -> Result<Transaction, RepoError> {
        let kind: TransactionKind = self.kind.parse().map_err(RepoError::Database)?;
        let amount = Money::new(self.amount).map_err(db_err)?;
        let notes: DenominationCount = serde_json::from_str(&self.notes).map_err(db_err)?;
        let account_id = self
            .account_id
            .as_deref()
            .map(parse_uuid)
            .transpose()?
            .map(AccountId::from_uuid);

        Ok(Transaction::from_parts(
            TransactionId::from_uuid(parse_uuid(&self.id)?),
            account_id,
            kind,
            amount,
            notes,
            parse_timestamp(&self.created_at)?,
        ))
    }
}

/// Rebuilds note counts from stored rows.
pub fn counts_from_rows(rows: Vec<DbCashRow>) -> Result<DenominationCount, RepoError> {
    rows.into_iter()
        .map(|row| -> Result<(Denomination, u32), RepoError> {
            let value = u32::try_from(row.denomination).map_err(db_err)?;
            let count = u32::try_from(row.count).map_err(db_err)?;
            Ok((Denomination::new(value).map_err(db_err)?, count))
        })
        .collect()
}
