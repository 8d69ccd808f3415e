//! The machine's physical cash inventory.

use serde::{Deserialize, Serialize};

use super::denomination::{Denomination, DenominationCount, DenominationSet};
use super::dispense::DispenseStrategy;
use super::money::Money;
use crate::error::DomainError;

/// Which notes the machine accepts and how it picks notes for withdrawals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CashPolicy {
    pub denominations: DenominationSet,
    pub strategy: DispenseStrategy,
}

/// Notes currently held by the machine.
///
/// Every key belongs to the configured set and Σ denomination × count always
/// fits an `i64`; both are checked on every transition, so the total is
/// derived on demand rather than stored next to the counts. Transitions
/// return a new inventory and leave `self` untouched, which lets the caller
/// commit only once every side effect has succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashInventory {
    allowed: DenominationSet,
    notes: DenominationCount,
}

impl CashInventory {
    /// An inventory with no notes.
    pub fn empty(allowed: DenominationSet) -> Self {
        let notes = DenominationCount::zeroed(&allowed);
        Self { allowed, notes }
    }

    /// Restores an inventory from stored counts.
    pub fn from_counts(
        allowed: DenominationSet,
        counts: &DenominationCount,
    ) -> Result<Self, DomainError> {
        counts.ensure_within(&allowed)?;
        let notes = DenominationCount::zeroed(&allowed).checked_merge(counts)?;
        notes.total_value()?;
        Ok(Self { allowed, notes })
    }

    pub fn allowed(&self) -> &DenominationSet {
        &self.allowed
    }

    /// Current counts, one entry per configured denomination.
    pub fn notes(&self) -> &DenominationCount {
        &self.notes
    }

    pub fn count(&self, denomination: Denomination) -> u32 {
        self.notes.count(denomination)
    }

    /// Σ denomination × count.
    pub fn total_value(&self) -> Money {
        // Transitions reject any state whose total would not fit.
        self.notes
            .total_value()
            .ok()
            .and_then(|total| Money::new(total).ok())
            .unwrap_or_default()
    }

    /// The inventory after accepting `deposit`.
    pub fn with_deposit(&self, deposit: &DenominationCount) -> Result<Self, DomainError> {
        deposit.ensure_within(&self.allowed)?;
        let notes = self.notes.checked_merge(deposit)?;
        notes.total_value()?;
        Ok(Self {
            allowed: self.allowed.clone(),
            notes,
        })
    }

    /// The inventory after handing out `dispensed`.
    pub fn with_withdrawal(&self, dispensed: &DenominationCount) -> Result<Self, DomainError> {
        let requested = dispensed.total_value()?;
        let notes =
            self.notes
                .checked_remove(dispensed)
                .ok_or_else(|| DomainError::InsufficientCash {
                    requested,
                    available: self.total_value().amount(),
                })?;
        Ok(Self {
            allowed: self.allowed.clone(),
            notes,
        })
    }

    /// Chooses notes for `amount` without changing the inventory.
    pub fn plan_withdrawal(
        &self,
        amount: Money,
        strategy: DispenseStrategy,
    ) -> Result<DenominationCount, DomainError> {
        strategy
            .plan(&self.notes, amount.amount())
            .ok_or_else(|| DomainError::InsufficientCash {
                requested: amount.amount(),
                available: self.total_value().amount(),
            })
    }

    /// Checks the structural invariants: every key is an allowed
    /// denomination and Σ denomination × count is representable.
    pub fn reconcile(&self) -> bool {
        self.notes.ensure_within(&self.allowed).is_ok() && self.notes.total_value().is_ok()
    }
}

/// Result of a successful withdrawal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    /// Account balance after the withdrawal.
    pub balance: Money,
    /// Notes handed out.
    pub dispensed: DenominationCount,
}

/// Outcome of comparing the live cash inventory with its persisted copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationReport {
    pub consistent: bool,
    /// Σ denomination × count of the live inventory.
    pub computed_total: i64,
    /// Total of the persisted snapshot, if one exists.
    pub persisted_total: Option<i64>,
    /// Denominations whose live and persisted counts differ.
    pub mismatched: Vec<Denomination>,
}

impl ReconciliationReport {
    /// Compares the live inventory with a persisted snapshot.
    pub fn compare(live: &CashInventory, persisted: Option<&DenominationCount>) -> Self {
        let computed_total = live.total_value().amount();
        let Some(persisted) = persisted else {
            return Self {
                consistent: live.reconcile() && live.notes().is_empty(),
                computed_total,
                persisted_total: None,
                mismatched: live.notes().without_zeros().denominations().collect(),
            };
        };

        let mut mismatched: Vec<Denomination> = live
            .notes()
            .denominations()
            .chain(persisted.denominations())
            .filter(|d| live.count(*d) != persisted.count(*d))
            .collect();
        mismatched.sort_unstable();
        mismatched.dedup();

        let persisted_total = persisted.total_value().ok();
        Self {
            consistent: live.reconcile()
                && mismatched.is_empty()
                && persisted_total == Some(computed_total),
            computed_total,
            persisted_total,
            mismatched,
        }
    }

    /// Converts a failed report into a typed error.
    pub fn into_result(self) -> Result<Self, DomainError> {
        if self.consistent {
            Ok(self)
        } else {
            Err(DomainError::Reconciliation {
                computed: self.computed_total,
                persisted: self.persisted_total.unwrap_or_default(),
            })
        }
    }
}
