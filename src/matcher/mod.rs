//! Per-cell match decisions for one scan.
//!
//! [`CellMatcher`] owns the visibility state of the row being scanned and
//! turns each candidate cell into a [`MatchCode`] for the driver to act on.
//! Checks run in a fixed order, each able to short-circuit: scan-wide
//! predicate cutoff, row identity, retired columns, timestamp early-out,
//! tombstone handling, time range, predicate, then version counting.

pub mod columns;
pub mod deletes;

use std::cmp::Ordering;

use bytes::Bytes;

use crate::{
    cell::{Cell, SeekKey},
    error::ScanError,
    logging::basalt_log,
    matcher::{
        columns::{ColumnTracker, ExplicitColumnTracker, WildcardColumnTracker},
        deletes::{DeleteClass, DeleteTracker},
    },
    mvcc::{TimeRange, Timestamp},
    scan::{
        predicate::{PredicateDecision, ScanPredicate},
        DeletePolicy, RetentionConfig, ScanKind, ScanSpec,
    },
};

/// Verdict on a single cell, instructing the scan driver how to proceed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatchCode {
    /// Emit the cell into the scan result.
    Include,
    /// Drop the cell and advance to the next one.
    Skip,
    /// Drop the cell and advance to the next source in merge order.
    Next,
    /// The cell belongs to a row that was already consumed; a correctly
    /// merged stream never produces this.
    Done,
    /// Done with the current row, seek past it.
    SeekNextRow,
    /// Done with the current column, seek past it.
    SeekNextCol,
    /// The whole scan is finished.
    DoneScan,
    /// Seek to the key supplied by the predicate hint.
    SeekNextUsingHint,
    /// Emit the cell, then seek past its column.
    IncludeAndSeekNextCol,
    /// Emit the cell, then seek past its row.
    IncludeAndSeekNextRow,
}

/// Decides, cell by cell, what a scan keeps, skips and seeks over.
///
/// Constructed once per scan; [`CellMatcher::set_row`] rebinds it to each
/// row in turn and clears all per-row state.
pub struct CellMatcher {
    current_row: Option<Bytes>,
    /// Cached decision that the rest of the current row is skippable.
    sticky_next_row: bool,
    time_range: TimeRange,
    deletes: DeleteTracker,
    columns: Box<dyn ColumnTracker>,
    predicate: Option<Box<dyn ScanPredicate>>,
    policy: DeletePolicy,
    /// Oldest put in any participating source. A retained tombstone older
    /// than this cannot cover anything and may be dropped.
    earliest_put_ts: Timestamp,
    start_row: Bytes,
    stop_row: Bytes,
}

impl CellMatcher {
    /// Build a matcher for one scan over a store with the given retention
    /// schema.
    ///
    /// `earliest_put_ts` is the oldest put timestamp across the sources the
    /// scan reads; pass [`Timestamp::MAX`] when unknown. `now` anchors TTL
    /// expiry.
    pub fn new(
        spec: ScanSpec,
        retention: &RetentionConfig,
        kind: ScanKind,
        predicate: Option<Box<dyn ScanPredicate>>,
        earliest_put_ts: Timestamp,
        now: Timestamp,
    ) -> Self {
        let policy = DeletePolicy::derive(retention, kind, spec.raw);
        let max_versions = spec.max_versions.min(retention.max_versions);
        let oldest_unexpired = match retention.ttl {
            Some(ttl) => now.saturating_sub(ttl),
            None => Timestamp::MIN,
        };

        // Explicit targets get the shared tracker; anything else scans the
        // whole family.
        let columns: Box<dyn ColumnTracker> = match spec.columns {
            Some(targets) if !targets.is_empty() => Box::new(ExplicitColumnTracker::new(
                targets,
                retention.min_versions,
                max_versions,
                oldest_unexpired,
            )),
            _ => Box::new(WildcardColumnTracker::new(
                retention.min_versions,
                max_versions,
                oldest_unexpired,
            )),
        };

        basalt_log!(
            log::Level::Debug,
            "matcher_new",
            "kind={:?} keep_deleted={} retain_deletes={} see_past={} max_versions={} oldest_unexpired={:?}",
            kind,
            policy.keep_deleted_cells,
            policy.retain_deletes_in_output,
            policy.see_past_delete_markers,
            max_versions,
            oldest_unexpired,
        );

        Self {
            current_row: None,
            sticky_next_row: false,
            time_range: spec.time_range,
            deletes: DeleteTracker::new(),
            columns,
            predicate,
            policy,
            earliest_put_ts,
            start_row: spec.start_row,
            stop_row: spec.stop_row,
        }
    }

    /// Judge one cell of the current row.
    ///
    /// Requires a prior [`CellMatcher::set_row`]; cells must arrive in scan
    /// order within the row.
    pub fn match_cell(&mut self, cell: &Cell) -> Result<MatchCode, ScanError> {
        if self
            .predicate
            .as_ref()
            .is_some_and(|predicate| predicate.filter_all_remaining())
        {
            return Ok(MatchCode::DoneScan);
        }

        let current_row = self.current_row.as_ref().ok_or(ScanError::RowUnset)?;
        match cell.row().cmp(current_row) {
            Ordering::Less => return Ok(MatchCode::Done),
            Ordering::Greater => return Ok(MatchCode::SeekNextRow),
            Ordering::Equal => {}
        }

        if self.sticky_next_row {
            return Ok(MatchCode::SeekNextRow);
        }

        if self.columns.done() {
            self.sticky_next_row = true;
            return Ok(MatchCode::SeekNextRow);
        }

        let ts = cell.timestamp();
        if self.columns.is_done(ts) {
            return Ok(self.columns.next_row_or_next_column(cell.qualifier()));
        }

        if cell.kind().is_delete() {
            if !self.policy.keep_deleted_cells {
                // ts + 1 so a range can sit between a marker and a put at
                // the same instant.
                let record = if self.policy.see_past_delete_markers {
                    self.time_range.contains(ts.next())
                } else {
                    self.time_range.contains_or_after(ts)
                };
                if record {
                    self.deletes.add(cell.qualifier(), ts, cell.kind());
                }
                // No early out; family markers precede every other cell of
                // the row.
            }
            if self.policy.retain_deletes_in_output {
                return Ok(MatchCode::Include);
            } else if self.policy.keep_deleted_cells {
                if ts < self.earliest_put_ts {
                    // Nothing this marker could cover remains in any source.
                    return Ok(self.columns.next_row_or_next_column(cell.qualifier()));
                }
                // Fall through: the marker is version counted like the puts
                // it protects.
            } else {
                return Ok(MatchCode::Skip);
            }
            // Markers are not subject to other markers.
        } else if !self.deletes.is_empty() {
            match self.deletes.is_deleted(cell.qualifier(), ts)? {
                DeleteClass::FamilyDeleted | DeleteClass::ColumnDeleted => {
                    return Ok(self.columns.next_row_or_next_column(cell.qualifier()));
                }
                DeleteClass::VersionDeleted => return Ok(MatchCode::Skip),
                DeleteClass::NotDeleted => {}
            }
        }

        match self.time_range.compare(ts) {
            Ordering::Greater => return Ok(MatchCode::Skip),
            Ordering::Less => {
                return Ok(self.columns.next_row_or_next_column(cell.qualifier()));
            }
            Ordering::Equal => {}
        }

        // The predicate runs before version counting so a discarded cell
        // cannot consume a version slot.
        if let Some(predicate) = self.predicate.as_mut() {
            match predicate.filter_cell(cell) {
                PredicateDecision::Skip => return Ok(MatchCode::Skip),
                PredicateDecision::NextColumn => {
                    return Ok(self.columns.next_row_or_next_column(cell.qualifier()));
                }
                PredicateDecision::NextRow => {
                    self.sticky_next_row = true;
                    return Ok(MatchCode::SeekNextRow);
                }
                PredicateDecision::SeekUsingHint => {
                    return Ok(MatchCode::SeekNextUsingHint);
                }
                PredicateDecision::Include => {}
            }
        }

        let code = self.columns.check_column(cell.qualifier(), ts, cell.kind())?;
        if code == MatchCode::SeekNextRow {
            self.sticky_next_row = true;
        }
        Ok(code)
    }

    /// Bind the matcher to `row` and clear all per-row state.
    pub fn set_row(&mut self, row: Bytes) {
        self.current_row = Some(row);
        self.reset();
    }

    /// Clear per-row state without changing the bound row.
    pub fn reset(&mut self) {
        self.deletes.reset();
        self.columns.reset();
        self.sticky_next_row = false;
    }

    /// Row the matcher is currently bound to.
    pub fn current_row(&self) -> Option<&Bytes> {
        self.current_row.as_ref()
    }

    /// Whether any row at or after `cell`'s row can still be within bounds.
    pub fn more_rows_may_exist_after(&self, cell: &Cell) -> bool {
        self.stop_row.is_empty() || cell.row() < &self.stop_row
    }

    /// Where the scan should position itself before the first cell, if the
    /// scan is bounded below.
    pub fn start_key(&self) -> Option<SeekKey> {
        (!self.start_row.is_empty()).then(|| SeekKey::AtRow {
            row: self.start_row.clone(),
        })
    }

    /// Seek target leaving `cell`'s column: the next explicit target when
    /// one is known, otherwise just past the column itself.
    pub fn key_for_next_column(&self, cell: &Cell) -> SeekKey {
        match self.columns.column_hint() {
            Some(qualifier) => SeekKey::AtColumn {
                row: cell.row().clone(),
                family: cell.family().clone(),
                qualifier,
            },
            None => SeekKey::PastColumn {
                row: cell.row().clone(),
                family: cell.family().clone(),
                qualifier: cell.qualifier().clone(),
            },
        }
    }

    /// Seek target leaving `cell`'s row entirely.
    pub fn key_for_next_row(&self, cell: &Cell) -> SeekKey {
        SeekKey::PastRow {
            row: cell.row().clone(),
        }
    }

    /// Predicate-supplied seek target backing
    /// [`MatchCode::SeekNextUsingHint`].
    pub fn next_key_hint(&self, cell: &Cell) -> Option<SeekKey> {
        self.predicate
            .as_ref()
            .and_then(|predicate| predicate.next_key_hint(cell))
    }
}
