//! Error types for the ATM service.

use crate::domain::AccountId;

/// A malformed or inconsistent request, rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    #[error("Denomination {0} is not accepted by this machine")]
    DenominationNotAllowed(u32),

    #[error("Notes add up to {counted} but the request claims {claimed}")]
    SumMismatch { claimed: i64, counted: i64 },

    #[error("Amount is too large to be handled")]
    Overflow,

    #[error("{0}")]
    InvalidField(String),
}

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("ATM cannot dispense {requested} from the notes it holds (cash on hand {available})")]
    InsufficientCash { requested: i64, available: i64 },

    #[error("Cash inventory out of balance: computed {computed}, persisted {persisted}")]
    Reconciliation { computed: i64, persisted: i64 },

    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("No account registered for mobile {0}")]
    MobileNotFound(String),

    #[error("Invalid mobile number or PIN")]
    InvalidCredentials,

    #[error("Account {0} is not an administrator")]
    NotAdmin(String),

    #[error("An account with this {0} already exists")]
    DuplicateAccount(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Application-level errors (for HTTP responses).
///
/// Every variant keeps the underlying cause visible; `kind()` gives callers a
/// stable discriminator that survives the trip over the wire.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: i64, requested: i64 },

    #[error("ATM cannot dispense {requested} from the notes it holds (cash on hand {available})")]
    InsufficientCash { requested: i64, available: i64 },

    #[error("Reconciliation failed: {0}")]
    Reconciliation(String),

    #[error("{0}")]
    TooManyRequests(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Machine-readable error discriminator.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::BadRequest(_) => "bad_request",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Conflict(_) => "conflict",
            AppError::InsufficientFunds { .. } => "insufficient_funds",
            AppError::InsufficientCash { .. } => "insufficient_cash",
            AppError::Reconciliation(_) => "reconciliation_error",
            AppError::TooManyRequests(_) => "too_many_requests",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(e) => e.into(),
            DomainError::InsufficientFunds {
                available,
                requested,
            } => AppError::InsufficientFunds {
                available,
                requested,
            },
            DomainError::InsufficientCash {
                requested,
                available,
            } => AppError::InsufficientCash {
                requested,
                available,
            },
            e @ DomainError::Reconciliation { .. } => AppError::Reconciliation(e.to_string()),
            e @ (DomainError::AccountNotFound(_) | DomainError::MobileNotFound(_)) => {
                AppError::NotFound(e.to_string())
            }
            e @ DomainError::InvalidCredentials => AppError::Unauthorized(e.to_string()),
            e @ DomainError::NotAdmin(_) => AppError::Forbidden(e.to_string()),
            e @ DomainError::DuplicateAccount(_) => AppError::Conflict(e.to_string()),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => e.into(),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            RepoError::Database(e) => AppError::Internal(e),
            RepoError::Transaction(e) => AppError::Internal(e),
            RepoError::Conflict(e) => AppError::Conflict(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_keeps_cause() {
        let err: AppError = DomainError::from(ValidationError::SumMismatch {
            claimed: 300,
            counted: 200,
        })
        .into();
        assert_eq!(err.kind(), "validation_error");
        assert!(err.to_string().contains("300"));
        assert!(err.to_string().contains("200"));
    }

    #[test]
    fn test_cash_and_funds_stay_distinct() {
        let funds: AppError = RepoError::Domain(DomainError::InsufficientFunds {
            available: 100,
            requested: 200,
        })
        .into();
        let cash: AppError = RepoError::Domain(DomainError::InsufficientCash {
            requested: 200,
            available: 500,
        })
        .into();
        assert_eq!(funds.kind(), "insufficient_funds");
        assert_eq!(cash.kind(), "insufficient_cash");
    }

    #[test]
    fn test_database_error_is_internal() {
        let err: AppError = RepoError::Database("disk I/O error".into()).into();
        assert!(matches!(err, AppError::Internal(ref m) if m == "disk I/O error"));
    }
}
