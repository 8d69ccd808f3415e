//! Transaction domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::AccountId;
use super::denomination::DenominationCount;
use super::money::Money;

/// Unique identifier for a Transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    /// Creates a new random TransactionId.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a TransactionId from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// The kind of cash movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Customer pays notes in; balance goes up
    Deposit,
    /// Customer takes notes out; balance goes down
    Withdraw,
    /// Administrator loads notes into the machine; no balance changes
    CashLoad,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
            TransactionKind::CashLoad => "cash_load",
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(TransactionKind::Deposit),
            "withdraw" => Ok(TransactionKind::Withdraw),
            "cash_load" => Ok(TransactionKind::CashLoad),
            other => Err(format!("Unknown transaction kind: {other}")),
        }
    }
}

/// A recorded cash movement.
///
/// Transactions are immutable once created - they represent
/// a historical record of what happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Account whose balance moved; for cash loads, the administrator
    pub account_id: Option<AccountId>,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: Money,
    /// Notes paid in or handed out
    pub notes: DenominationCount,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    fn new(
        kind: TransactionKind,
        account_id: Option<AccountId>,
        amount: Money,
        notes: DenominationCount,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            account_id,
            kind,
            amount,
            notes,
            created_at: Utc::now(),
        }
    }

    /// Creates a new deposit transaction.
    pub fn deposit(account: AccountId, amount: Money, notes: DenominationCount) -> Self {
        Self::new(TransactionKind::Deposit, Some(account), amount, notes)
    }

    /// Creates a new withdrawal transaction.
    pub fn withdrawal(account: AccountId, amount: Money, dispensed: DenominationCount) -> Self {
        Self::new(TransactionKind::Withdraw, Some(account), amount, dispensed)
    }

    /// Creates a new cash-load transaction.
    pub fn cash_load(admin: Option<AccountId>, amount: Money, notes: DenominationCount) -> Self {
        Self::new(TransactionKind::CashLoad, admin, amount, notes)
    }

    /// Reconstructs a transaction from database fields.
    pub fn from_parts(
        id: TransactionId,
        account_id: Option<AccountId>,
        kind: TransactionKind,
        amount: Money,
        notes: DenominationCount,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            account_id,
            kind,
            amount,
            notes,
            created_at,
        }
    }
}
