//! Domain models for the ATM service.

pub mod accumulator;
pub mod account;
pub mod cash;
pub mod denomination;
pub mod dispense;
pub mod money;
pub mod session;
pub mod transaction;

pub use accumulator::DepositAccumulator;
pub use account::{Account, AccountId, Role, validate_email, validate_mobile, validate_pin};
pub use cash::{CashInventory, CashPolicy, ReconciliationReport, Withdrawal};
pub use denomination::{Denomination, DenominationCount, DenominationSet};
pub use dispense::DispenseStrategy;
pub use money::Money;
pub use session::{AdminSession, LoginResult, UserSession};
pub use transaction::{Transaction, TransactionId, TransactionKind};
