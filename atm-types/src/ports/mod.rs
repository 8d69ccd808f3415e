//! Port traits (interfaces for adapters).
//!
//! The service layer depends on these traits, not on concrete storage.
//! Balances, the transaction ledger and the machine's vault are separate
//! concerns so an adapter can fail one without touching the others.

mod accounts;
mod ledger;
mod vault;

pub use accounts::AccountStore;
pub use ledger::Ledger;
pub use vault::VaultStore;

/// Everything the ATM service needs from storage.
///
/// Implemented automatically for any adapter providing all three ports.
pub trait AtmRepository: AccountStore + Ledger + VaultStore {}

impl<T> AtmRepository for T where T: AccountStore + Ledger + VaultStore {}
