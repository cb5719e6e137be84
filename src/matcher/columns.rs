//! Per-row column and version tracking.
//!
//! Two strategies share one contract: [`ExplicitColumnTracker`] walks a
//! caller-supplied sorted qualifier set, [`WildcardColumnTracker`] accepts
//! every qualifier of the family. Both count emitted versions newest-first
//! and apply the min-version/TTL retention rules.

use bytes::Bytes;

use crate::{
    cell::CellType,
    error::ScanError,
    matcher::MatchCode,
    mvcc::Timestamp,
};

/// Version/column bookkeeping consulted by the matcher for every cell that
/// survives tombstone and time-range checks.
pub trait ColumnTracker {
    /// Judge one cell of the current row.
    ///
    /// Returns `Include`, `Skip`, `SeekNextCol` or `SeekNextRow`; counting
    /// happens on `Include`. A repeated timestamp for the current qualifier
    /// is `Skip`ped without counting.
    fn check_column(
        &mut self,
        qualifier: &Bytes,
        ts: Timestamp,
        kind: CellType,
    ) -> Result<MatchCode, ScanError>;

    /// Cheap pre-check: the timestamp alone already rules the cell out.
    fn is_done(&self, ts: Timestamp) -> bool;

    /// Leave `qualifier` behind and report whether the scan should move to
    /// the next column or the next row.
    fn next_row_or_next_column(&mut self, qualifier: &Bytes) -> MatchCode;

    /// No column of this row can produce further includes.
    fn done(&self) -> bool;

    /// Next qualifier worth seeking to, if the strategy knows one.
    fn column_hint(&self) -> Option<Bytes>;

    /// Forget per-row state; called at row boundaries.
    fn reset(&mut self);
}

/// Version counter for one explicit target qualifier.
#[derive(Clone, Debug)]
struct ColumnCount {
    qualifier: Bytes,
    count: u32,
}

impl ColumnCount {
    fn new(qualifier: Bytes) -> Self {
        Self {
            qualifier,
            count: 0,
        }
    }
}

/// Tracks an explicit, sorted set of target qualifiers.
///
/// Targets are retired once their version budget is spent; retiring the last
/// target makes [`ColumnTracker::done`] true for the rest of the row.
#[derive(Debug)]
pub struct ExplicitColumnTracker {
    targets: Vec<Bytes>,
    columns: Vec<ColumnCount>,
    current: Option<usize>,
    min_versions: u32,
    max_versions: u32,
    latest_ts: Timestamp,
    oldest_unexpired: Timestamp,
}

impl ExplicitColumnTracker {
    /// Build a tracker over a sorted, non-empty qualifier set.
    pub fn new(
        targets: impl IntoIterator<Item = Bytes>,
        min_versions: u32,
        max_versions: u32,
        oldest_unexpired: Timestamp,
    ) -> Self {
        let targets: Vec<Bytes> = targets.into_iter().collect();
        debug_assert!(!targets.is_empty());
        debug_assert!(targets.windows(2).all(|pair| pair[0] < pair[1]));

        let mut tracker = Self {
            targets,
            columns: Vec::new(),
            current: None,
            min_versions,
            max_versions,
            latest_ts: Timestamp::MAX,
            oldest_unexpired,
        };
        tracker.reset();
        tracker
    }

    fn is_expired(&self, ts: Timestamp) -> bool {
        ts < self.oldest_unexpired
    }

    /// Retire the target at `index`, repositioning the cursor on whatever
    /// target now occupies that slot.
    fn retire(&mut self, index: usize) {
        self.columns.remove(index);
        self.latest_ts = Timestamp::MAX;
        self.current = (index < self.columns.len()).then_some(index);
    }

    /// Walk the cursor until it stands at or past `qualifier`, retiring an
    /// exact match.
    fn done_with_column(&mut self, qualifier: &Bytes) {
        while let Some(index) = self.current {
            let target = &self.columns[index].qualifier;
            self.latest_ts = Timestamp::MAX;
            match target.cmp(qualifier) {
                std::cmp::Ordering::Equal => {
                    self.retire(index);
                    return;
                }
                std::cmp::Ordering::Less => {
                    let next = index + 1;
                    self.current = (next < self.columns.len()).then_some(next);
                }
                std::cmp::Ordering::Greater => return,
            }
        }
    }
}

impl ColumnTracker for ExplicitColumnTracker {
    fn check_column(
        &mut self,
        qualifier: &Bytes,
        ts: Timestamp,
        _kind: CellType,
    ) -> Result<MatchCode, ScanError> {
        // Tombstones that fall through to an explicit tracker are version
        // counted like the puts they protect.
        loop {
            if self.columns.is_empty() {
                return Ok(MatchCode::SeekNextRow);
            }
            let Some(index) = self.current else {
                return Ok(MatchCode::SeekNextRow);
            };

            match self.columns[index].qualifier.cmp(qualifier) {
                std::cmp::Ordering::Equal => {
                    if ts == self.latest_ts {
                        return Ok(MatchCode::Skip);
                    }
                    self.columns[index].count += 1;
                    let count = self.columns[index].count;
                    if count >= self.max_versions
                        || (count >= self.min_versions && self.is_expired(ts))
                    {
                        self.retire(index);
                    } else {
                        self.latest_ts = ts;
                    }
                    return Ok(MatchCode::Include);
                }
                std::cmp::Ordering::Greater => {
                    // Cell sorts before the target: seek forward to it.
                    self.latest_ts = Timestamp::MAX;
                    return Ok(MatchCode::SeekNextCol);
                }
                std::cmp::Ordering::Less => {
                    // No more data for this target; advance and re-check.
                    self.latest_ts = Timestamp::MAX;
                    let next = index + 1;
                    if next >= self.columns.len() {
                        self.current = None;
                        return Ok(MatchCode::SeekNextRow);
                    }
                    self.current = Some(next);
                }
            }
        }
    }

    fn is_done(&self, ts: Timestamp) -> bool {
        self.min_versions == 0 && self.is_expired(ts)
    }

    fn next_row_or_next_column(&mut self, qualifier: &Bytes) -> MatchCode {
        self.done_with_column(qualifier);
        if self.column_hint().is_none() {
            MatchCode::SeekNextRow
        } else {
            MatchCode::SeekNextCol
        }
    }

    fn done(&self) -> bool {
        self.columns.is_empty()
    }

    fn column_hint(&self) -> Option<Bytes> {
        self.current
            .map(|index| self.columns[index].qualifier.clone())
    }

    fn reset(&mut self) {
        self.columns = self
            .targets
            .iter()
            .cloned()
            .map(ColumnCount::new)
            .collect();
        self.current = Some(0);
        self.latest_ts = Timestamp::MAX;
    }
}

/// Tracks every qualifier of the family in arrival order.
#[derive(Debug)]
pub struct WildcardColumnTracker {
    column: Option<Bytes>,
    current_count: u32,
    min_versions: u32,
    max_versions: u32,
    latest_ts: Timestamp,
    oldest_unexpired: Timestamp,
}

impl WildcardColumnTracker {
    /// Build a tracker with the given retention bounds.
    pub fn new(min_versions: u32, max_versions: u32, oldest_unexpired: Timestamp) -> Self {
        Self {
            column: None,
            current_count: 0,
            min_versions,
            max_versions,
            latest_ts: Timestamp::MAX,
            oldest_unexpired,
        }
    }

    fn is_expired(&self, ts: Timestamp) -> bool {
        ts < self.oldest_unexpired
    }

    /// Count (data cells only) and apply the retention rules.
    fn check_version(&mut self, kind: CellType, ts: Timestamp) -> MatchCode {
        if !kind.is_delete() {
            self.current_count += 1;
        }
        if self.current_count > self.max_versions {
            return MatchCode::SeekNextCol;
        }
        if self.current_count <= self.min_versions || !self.is_expired(ts) {
            self.latest_ts = ts;
            MatchCode::Include
        } else {
            MatchCode::SeekNextCol
        }
    }
}

impl ColumnTracker for WildcardColumnTracker {
    fn check_column(
        &mut self,
        qualifier: &Bytes,
        ts: Timestamp,
        kind: CellType,
    ) -> Result<MatchCode, ScanError> {
        let Some(column) = &self.column else {
            self.column = Some(qualifier.clone());
            self.current_count = 0;
            return Ok(self.check_version(kind, ts));
        };

        match qualifier.cmp(column) {
            std::cmp::Ordering::Equal => {
                if ts == self.latest_ts {
                    return Ok(MatchCode::Skip);
                }
                Ok(self.check_version(kind, ts))
            }
            std::cmp::Ordering::Greater => {
                self.latest_ts = Timestamp::MAX;
                self.column = Some(qualifier.clone());
                self.current_count = 0;
                Ok(self.check_version(kind, ts))
            }
            std::cmp::Ordering::Less => Err(ScanError::OutOfOrderCell {
                context: "wildcard column tracker",
                qualifier: qualifier.clone(),
            }),
        }
    }

    fn is_done(&self, ts: Timestamp) -> bool {
        self.min_versions == 0 && self.is_expired(ts)
    }

    fn next_row_or_next_column(&mut self, _qualifier: &Bytes) -> MatchCode {
        MatchCode::SeekNextCol
    }

    fn done(&self) -> bool {
        false
    }

    fn column_hint(&self) -> Option<Bytes> {
        None
    }

    fn reset(&mut self) {
        self.column = None;
        self.current_count = 0;
        self.latest_ts = Timestamp::MAX;
    }
}
