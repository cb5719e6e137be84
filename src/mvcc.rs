//! MVCC primitives: cell timestamps and time-range visibility.

use std::{cmp::Ordering, fmt};

use crate::error::ScanError;

/// Logical timestamp carried by every cell version (larger = newer).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Least possible timestamp.
    pub const MIN: Self = Self(0);
    /// Greatest possible timestamp (used for open-ended visibility).
    pub const MAX: Self = Self(u64::MAX);

    /// Construct a timestamp from a raw `u64`.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw `u64` value backing this timestamp.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns the next timestamp after `self`, saturating on overflow.
    #[inline]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Subtract `delta` while saturating at zero.
    #[inline]
    pub const fn saturating_sub(self, delta: u64) -> Self {
        Self(self.0.saturating_sub(delta))
    }
}

impl From<u64> for Timestamp {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Timestamp").field(&self.0).finish()
    }
}

/// Half-open `[min, max)` interval over [`Timestamp`]s.
///
/// The default range covers all time. `min == max` is a legal, empty range;
/// `min > max` is rejected at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeRange {
    min: Timestamp,
    max: Timestamp,
    all_time: bool,
}

impl TimeRange {
    /// Build a `[min, max)` range, rejecting inverted bounds.
    pub fn new(min: Timestamp, max: Timestamp) -> Result<Self, ScanError> {
        if min > max {
            return Err(ScanError::InvalidTimeRange { min, max });
        }
        Ok(Self {
            min,
            max,
            all_time: min == Timestamp::MIN && max == Timestamp::MAX,
        })
    }

    /// Range covering exactly one instant: `[ts, ts + 1)`.
    pub fn at(ts: Timestamp) -> Self {
        Self {
            min: ts,
            max: ts.next(),
            all_time: false,
        }
    }

    /// Lower bound (inclusive).
    #[inline]
    pub const fn min(&self) -> Timestamp {
        self.min
    }

    /// Upper bound (exclusive).
    #[inline]
    pub const fn max(&self) -> Timestamp {
        self.max
    }

    /// Whether `ts` falls inside `[min, max)`.
    #[inline]
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.all_time || (self.min <= ts && ts < self.max)
    }

    /// Whether `ts` is at or after the lower bound (upper bound ignored).
    #[inline]
    pub fn contains_or_after(&self, ts: Timestamp) -> bool {
        self.all_time || ts >= self.min
    }

    /// Position of `ts` relative to the range: `Less` before `min`,
    /// `Greater` at or past `max`, `Equal` inside.
    #[inline]
    pub fn compare(&self, ts: Timestamp) -> Ordering {
        if ts < self.min {
            Ordering::Less
        } else if ts >= self.max {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            min: Timestamp::MIN,
            max: Timestamp::MAX,
            all_time: true,
        }
    }
}
