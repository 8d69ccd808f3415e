//! # ATM Types
//!
//! Domain types and port traits for the ATM service.
//! This crate has no IO dependencies: only data structures, cash-handling
//! rules and trait definitions.
//!
//! ## Architecture
//!
//! This crate is the innermost core of the hexagonal architecture:
//! - `domain/` - Notes, inventories, dispensing, accounts and transactions
//! - `ports/` - Trait definitions that adapters must implement
//! - `dto/` - Data Transfer Objects for API boundaries
//! - `error/` - Validation, domain, repository and application errors

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

// Re-export commonly used types
pub use domain::{
    Account, AccountId, AdminSession, CashInventory, CashPolicy, Denomination, DenominationCount,
    DenominationSet, DepositAccumulator, DispenseStrategy, LoginResult, Money,
    ReconciliationReport, Role, Transaction, TransactionId, TransactionKind, UserSession,
    Withdrawal,
};
pub use dto::*;
pub use error::{AppError, DomainError, RepoError, ValidationError};
pub use ports::{AccountStore, AtmRepository, Ledger, VaultStore};
