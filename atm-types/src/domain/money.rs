//! Non-negative rupee amounts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DomainError, ValidationError};

/// A non-negative amount of money in whole rupees.
///
/// Notes are the smallest unit the machine handles, so there is no minor unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Money(i64);

impl Money {
    /// Creates a new Money value.
    pub fn new(amount: i64) -> Result<Self, DomainError> {
        if amount < 0 {
            return Err(ValidationError::NonPositiveAmount(amount).into());
        }
        Ok(Self(amount))
    }

    /// Creates a positive amount, as required for every cash movement.
    pub fn positive(amount: i64) -> Result<Self, ValidationError> {
        if amount <= 0 {
            return Err(ValidationError::NonPositiveAmount(amount));
        }
        Ok(Self(amount))
    }

    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in rupees.
    pub fn amount(&self) -> i64 {
        self.0
    }

    /// Checked addition.
    pub fn checked_add(&self, other: Money) -> Result<Money, DomainError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| ValidationError::Overflow.into())
    }

    /// Checked subtraction - fails if the result would be negative.
    pub fn checked_sub(&self, other: Money) -> Result<Money, DomainError> {
        if self.0 < other.0 {
            return Err(DomainError::InsufficientFunds {
                available: self.0,
                requested: other.0,
            });
        }
        Ok(Money(self.0 - other.0))
    }

    /// Applies a signed delta, failing if the balance would go negative.
    pub fn apply_delta(&self, delta: i64) -> Result<Money, DomainError> {
        let next = self.0.checked_add(delta).ok_or(ValidationError::Overflow)?;
        if next < 0 {
            return Err(DomainError::InsufficientFunds {
                available: self.0,
                requested: delta.saturating_neg(),
            });
        }
        Ok(Money(next))
    }
}

impl TryFrom<i64> for Money {
    type Error = DomainError;

    fn try_from(amount: i64) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Money> for i64 {
    fn from(money: Money) -> Self {
        money.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "₹{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_creation() {
        let money = Money::new(1000).unwrap();
        assert_eq!(money.amount(), 1000);
    }

    #[test]
    fn test_negative_money_fails() {
        let result = Money::new(-100);
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::NonPositiveAmount(-100)))
        ));
    }

    #[test]
    fn test_positive_rejects_zero() {
        assert_eq!(
            Money::positive(0),
            Err(ValidationError::NonPositiveAmount(0))
        );
    }

    #[test]
    fn test_money_subtraction_insufficient() {
        let a = Money::new(100).unwrap();
        let b = Money::new(150).unwrap();
        assert!(matches!(
            a.checked_sub(b),
            Err(DomainError::InsufficientFunds {
                available: 100,
                requested: 150
            })
        ));
    }

    #[test]
    fn test_apply_delta() {
        let balance = Money::new(250).unwrap();
        assert_eq!(balance.apply_delta(-150).unwrap().amount(), 100);
        assert_eq!(balance.apply_delta(50).unwrap().amount(), 300);
        assert!(matches!(
            balance.apply_delta(-300),
            Err(DomainError::InsufficientFunds { requested: 300, .. })
        ));
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::new(1050).unwrap().to_string(), "₹1050");
    }
}
