//! Note selection for withdrawals.
//!
//! A strategy answers one question: which notes, taken from what the machine
//! holds, add up to exactly the requested amount? Neither strategy ever
//! returns a breakdown that differs from the amount; when no breakdown is
//! found the withdrawal must be refused.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::denomination::{Denomination, DenominationCount};
use crate::error::ValidationError;

/// Upper bound on the exact search target (amount divided by the smallest
/// common note unit). Larger requests fall back to the greedy pass.
const MAX_EXACT_UNITS: usize = 1_000_000;

/// Upper bound on the exact search's choice table, in bits (8 MiB). The table
/// is built while the caller holds the inventory lock.
const MAX_EXACT_CELLS: usize = 1 << 26;

/// How the machine chooses notes for a withdrawal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispenseStrategy {
    /// Largest notes first, bounded by stock. Can miss combinations that exist.
    Greedy,
    /// Fewest-notes exact search over the available stock.
    #[default]
    Exact,
}

impl DispenseStrategy {
    /// Selects notes from `available` totalling exactly `amount`.
    ///
    /// Returns `None` when the stock cannot make the amount.
    pub fn plan(&self, available: &DenominationCount, amount: i64) -> Option<DenominationCount> {
        if amount <= 0 {
            return None;
        }
        match available.total_value() {
            Ok(total) if total >= amount => {}
            _ => return None,
        }

        match self {
            DispenseStrategy::Greedy => greedy(available, amount),
            DispenseStrategy::Exact => match ExactSearch::prepare(available, amount)? {
                Some(search) => search.run(),
                None => greedy(available, amount),
            },
        }
    }

    /// True when planning `amount` would run the greedy pass, either because
    /// it was configured or because the exact search would be too large.
    pub fn uses_greedy_for(&self, available: &DenominationCount, amount: i64) -> bool {
        match self {
            DispenseStrategy::Greedy => true,
            DispenseStrategy::Exact => {
                amount > 0 && matches!(ExactSearch::prepare(available, amount), Some(None))
            }
        }
    }
}

impl fmt::Display for DispenseStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispenseStrategy::Greedy => write!(f, "greedy"),
            DispenseStrategy::Exact => write!(f, "exact"),
        }
    }
}

impl FromStr for DispenseStrategy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "greedy" => Ok(DispenseStrategy::Greedy),
            "exact" | "dp" => Ok(DispenseStrategy::Exact),
            other => Err(ValidationError::InvalidField(format!(
                "Unknown dispense strategy: {other}. Supported: greedy, exact"
            ))),
        }
    }
}

fn greedy(available: &DenominationCount, amount: i64) -> Option<DenominationCount> {
    let mut remaining = amount;
    let mut plan = DenominationCount::new();

    for (denomination, held) in available.iter().rev() {
        if remaining == 0 {
            break;
        }
        let value = i64::from(denomination.value());
        let take = (remaining / value).min(i64::from(held));
        if take > 0 {
            plan.set(denomination, u32::try_from(take).ok()?);
            remaining -= take * value;
        }
    }

    (remaining == 0).then_some(plan)
}

/// Bounded change-making by dynamic programming.
///
/// Each denomination's stock is split into power-of-two bundles so the search
/// runs as a 0/1 knapsack over `O(Σ log count)` items instead of one item per
/// note. `best[v]` holds the fewest notes reaching `v` units; bit `v` of
/// `taken[i]` records whether bundle `i` improved `v`, which is enough to walk
/// the choice back from the target.
struct ExactSearch {
    target: usize,
    bundles: Vec<Bundle>,
}

impl ExactSearch {
    /// Returns `None` when no note combination can make the amount,
    /// `Some(None)` when the search would exceed its bounds.
    fn prepare(available: &DenominationCount, amount: i64) -> Option<Option<Self>> {
        let unit = available
            .iter()
            .filter(|(_, held)| *held > 0)
            .map(|(d, _)| d.value())
            .fold(0, gcd);
        if unit == 0 || amount % i64::from(unit) != 0 {
            return None;
        }

        let target = usize::try_from(amount / i64::from(unit)).ok()?;
        if target > MAX_EXACT_UNITS {
            return Some(None);
        }

        let bundles = bundles(available, unit, target);
        if bundles.len().saturating_mul(target + 1) > MAX_EXACT_CELLS {
            return Some(None);
        }

        Some(Some(Self { target, bundles }))
    }

    fn run(self) -> Option<DenominationCount> {
        let target = self.target;

        const UNREACHABLE: u64 = u64::MAX;
        let mut best = vec![UNREACHABLE; target + 1];
        best[0] = 0;
        let mut taken: Vec<Vec<u64>> = Vec::with_capacity(self.bundles.len());

        for bundle in &self.bundles {
            let mut row = vec![0u64; target / 64 + 1];
            for v in (bundle.units..=target).rev() {
                let prev = best[v - bundle.units];
                if prev == UNREACHABLE {
                    continue;
                }
                let candidate = prev + u64::from(bundle.notes);
                if candidate < best[v] {
                    best[v] = candidate;
                    row[v / 64] |= 1 << (v % 64);
                }
            }
            taken.push(row);
        }

        if best[target] == UNREACHABLE {
            return None;
        }

        let mut plan = DenominationCount::new();
        let mut v = target;
        for (bundle, row) in self.bundles.iter().zip(&taken).rev() {
            if (row[v / 64] >> (v % 64)) & 1 == 1 {
                plan.add(bundle.denomination, bundle.notes).ok()?;
                v -= bundle.units;
            }
        }
        debug_assert_eq!(v, 0);

        Some(plan)
    }
}

struct Bundle {
    denomination: Denomination,
    notes: u32,
    units: usize,
}

fn bundles(available: &DenominationCount, unit: u32, target: usize) -> Vec<Bundle> {
    let mut out = Vec::new();
    for (denomination, held) in available.iter() {
        let per_note = (denomination.value() / unit) as usize;
        let mut left = held;
        let mut size = 1u32;
        while left > 0 {
            let notes = size.min(left);
            let units = per_note.saturating_mul(notes as usize);
            if units <= target {
                out.push(Bundle {
                    denomination,
                    notes,
                    units,
                });
            }
            left -= notes;
            size = size.saturating_mul(2);
        }
    }
    out
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}
