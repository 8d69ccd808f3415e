//! Banknote denominations and per-denomination note counts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A banknote face value.
///
/// Whether a value is accepted by the machine is decided by the configured
/// [`DenominationSet`], not by this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Denomination(u32);

impl Denomination {
    /// Creates a denomination; zero is rejected.
    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if value == 0 {
            return Err(ValidationError::InvalidField(
                "Denomination must be a positive note value".into(),
            ));
        }
        Ok(Self(value))
    }

    /// Returns the face value.
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Face value of `count` notes of this denomination, `None` on overflow.
    pub fn worth(&self, count: u32) -> Option<i64> {
        i64::from(self.0).checked_mul(i64::from(count))
    }
}

impl TryFrom<u32> for Denomination {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Denomination> for u32 {
    fn from(d: Denomination) -> Self {
        d.0
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Denomination {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .parse()
            .map_err(|_| ValidationError::InvalidField(format!("Invalid denomination: {s}")))?;
        Self::new(value)
    }
}

/// The denominations a machine accepts, held largest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DenominationSet(Vec<Denomination>);

impl DenominationSet {
    /// Builds a set from raw note values. Duplicates collapse; an empty set is rejected.
    pub fn new(values: impl IntoIterator<Item = u32>) -> Result<Self, ValidationError> {
        let mut set = values
            .into_iter()
            .map(Denomination::new)
            .collect::<Result<Vec<_>, _>>()?;
        set.sort_unstable_by(|a, b| b.cmp(a));
        set.dedup();

        if set.is_empty() {
            return Err(ValidationError::InvalidField(
                "At least one denomination must be configured".into(),
            ));
        }
        Ok(Self(set))
    }

    pub fn contains(&self, denomination: Denomination) -> bool {
        self.0.contains(&denomination)
    }

    /// Resolves a raw note value against the set.
    pub fn resolve(&self, value: u32) -> Result<Denomination, ValidationError> {
        Denomination::new(value)
            .ok()
            .filter(|d| self.contains(*d))
            .ok_or(ValidationError::DenominationNotAllowed(value))
    }

    /// Iterates from the largest to the smallest denomination.
    pub fn descending(&self) -> impl Iterator<Item = Denomination> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for DenominationSet {
    fn default() -> Self {
        Self(
            [500, 200, 100, 50]
                .into_iter()
                .map(Denomination)
                .collect(),
        )
    }
}

impl FromStr for DenominationSet {
    type Err = ValidationError;

    /// Parses a comma-separated list such as `50,100,200,500`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .filter(|part| !part.trim().is_empty())
            .map(|part| part.parse::<Denomination>().map(u32::from))
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(values)
    }
}

impl fmt::Display for DenominationSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().rev().map(|d| d.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

/// Note counts keyed by denomination.
///
/// Serialized as a JSON object such as `{"100": 2, "50": 1}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DenominationCount(BTreeMap<Denomination, u32>);

impl DenominationCount {
    pub fn new() -> Self {
        Self::default()
    }

    /// A count holding every denomination of `set` at zero.
    pub fn zeroed(set: &DenominationSet) -> Self {
        Self(set.descending().map(|d| (d, 0)).collect())
    }

    /// Builds a count from raw `(value, count)` pairs. Repeated values accumulate.
    pub fn from_pairs(pairs: &[(u32, u32)]) -> Result<Self, ValidationError> {
        let mut notes = Self::new();
        for &(value, count) in pairs {
            notes.add(Denomination::new(value)?, count)?;
        }
        Ok(notes)
    }

    /// Number of notes held for `denomination` (zero when absent).
    pub fn count(&self, denomination: Denomination) -> u32 {
        self.0.get(&denomination).copied().unwrap_or(0)
    }

    /// Sets the count for `denomination`, replacing any previous value.
    pub fn set(&mut self, denomination: Denomination, count: u32) {
        self.0.insert(denomination, count);
    }

    /// Adds `count` notes of `denomination`.
    pub fn add(&mut self, denomination: Denomination, count: u32) -> Result<(), ValidationError> {
        let slot = self.0.entry(denomination).or_insert(0);
        *slot = slot.checked_add(count).ok_or(ValidationError::Overflow)?;
        Ok(())
    }

    /// Iterates `(denomination, count)` pairs from the smallest denomination up.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Denomination, u32)> + '_ {
        self.0.iter().map(|(d, c)| (*d, *c))
    }

    /// Denominations present in the map, including those at zero.
    pub fn denominations(&self) -> impl Iterator<Item = Denomination> + '_ {
        self.0.keys().copied()
    }

    /// Total number of notes.
    pub fn note_count(&self) -> u64 {
        self.0.values().map(|c| u64::from(*c)).sum()
    }

    /// True when no notes are held.
    pub fn is_empty(&self) -> bool {
        self.0.values().all(|c| *c == 0)
    }

    /// Σ denomination × count, failing if the sum does not fit an `i64`.
    pub fn total_value(&self) -> Result<i64, ValidationError> {
        self.iter().try_fold(0i64, |acc, (d, c)| {
            d.worth(c)
                .and_then(|worth| acc.checked_add(worth))
                .ok_or(ValidationError::Overflow)
        })
    }

    /// Fails with the first denomination that is not part of `set`.
    pub fn ensure_within(&self, set: &DenominationSet) -> Result<(), ValidationError> {
        match self.denominations().find(|d| !set.contains(*d)) {
            Some(d) => Err(ValidationError::DenominationNotAllowed(d.value())),
            None => Ok(()),
        }
    }

    /// Returns `self + other`, failing on count overflow.
    pub fn checked_merge(&self, other: &DenominationCount) -> Result<Self, ValidationError> {
        let mut merged = self.clone();
        for (d, c) in other.iter() {
            merged.add(d, c)?;
        }
        Ok(merged)
    }

    /// Returns `self - other`, or `None` if any count would go negative.
    pub fn checked_remove(&self, other: &DenominationCount) -> Option<Self> {
        let mut remaining = self.clone();
        for (d, c) in other.iter() {
            let left = remaining.count(d).checked_sub(c)?;
            remaining.set(d, left);
        }
        Some(remaining)
    }

    /// The same counts with zero entries dropped.
    pub fn without_zeros(&self) -> Self {
        Self(self.0.iter().filter(|(_, c)| **c > 0).map(|(d, c)| (*d, *c)).collect())
    }
}

impl FromIterator<(Denomination, u32)> for DenominationCount {
    fn from_iter<I: IntoIterator<Item = (Denomination, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for DenominationCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .iter()
            .rev()
            .filter(|(_, c)| *c > 0)
            .map(|(d, c)| format!("{c}x{d}"))
            .collect();
        if parts.is_empty() {
            write!(f, "no notes")
        } else {
            write!(f, "{}", parts.join(" + "))
        }
    }
}
