//! Tap-to-build deposit composition.

use super::denomination::{Denomination, DenominationCount, DenominationSet};
use crate::dto::DepositRequest;
use crate::error::ValidationError;

/// Builds a [`DepositRequest`] one note at a time.
///
/// The running total and the note counts change together on every call, so a
/// snapshot always satisfies Σ denomination × count == amount.
#[derive(Debug, Clone)]
pub struct DepositAccumulator {
    allowed: DenominationSet,
    notes: DenominationCount,
    total: i64,
}

impl DepositAccumulator {
    pub fn new(allowed: DenominationSet) -> Self {
        Self {
            allowed,
            notes: DenominationCount::new(),
            total: 0,
        }
    }

    /// Adds one note of face value `value` and returns the new total.
    pub fn add_note(&mut self, value: u32) -> Result<i64, ValidationError> {
        let denomination = self.allowed.resolve(value)?;
        let total = denomination
            .worth(1)
            .and_then(|worth| self.total.checked_add(worth))
            .ok_or(ValidationError::Overflow)?;
        self.notes.add(denomination, 1)?;
        self.total = total;
        Ok(total)
    }

    /// Removes one note of face value `value`. Returns false if none was added.
    pub fn remove_note(&mut self, value: u32) -> Result<bool, ValidationError> {
        let denomination = self.allowed.resolve(value)?;
        let held = self.notes.count(denomination);
        if held == 0 {
            return Ok(false);
        }
        self.notes.set(denomination, held - 1);
        self.total -= i64::from(denomination.value());
        Ok(true)
    }

    /// Resets every count and the total to zero.
    pub fn clear(&mut self) {
        self.notes = DenominationCount::new();
        self.total = 0;
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn count(&self, denomination: Denomination) -> u32 {
        self.notes.count(denomination)
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    /// The request as it stands now.
    pub fn snapshot(&self) -> DepositRequest {
        DepositRequest {
            amount: self.total,
            denominations: self.notes.without_zeros(),
        }
    }
}
