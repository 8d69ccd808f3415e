//! # ATM Hex
//!
//! Application service layer and HTTP adapter for the ATM service.
//!
//! ## Architecture
//!
//! - `cash_pool` - Shared note inventory; the only place cash moves
//! - `service` - Application service (auth, customer and admin operations)
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! Both are generic over `R: AtmRepository`, so any adapter providing the
//! account, ledger and vault ports can be injected.

pub mod cash_pool;
pub mod inbound;
pub mod openapi;
pub mod rate_limit;
pub mod service;

#[cfg(test)]
mod cash_pool_tests;

pub use cash_pool::CashPool;
pub use rate_limit::RateLimiterState;
pub use service::AtmService;
