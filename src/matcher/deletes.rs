//! Per-row tombstone tracking.

use bytes::Bytes;

use crate::{
    cell::CellType,
    error::ScanError,
    mvcc::Timestamp,
};

/// Classification of a data cell against the tombstones recorded so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeleteClass {
    /// No recorded tombstone covers the cell.
    NotDeleted,
    /// An exact-version tombstone covers the cell.
    VersionDeleted,
    /// A column-scope tombstone covers the cell.
    ColumnDeleted,
    /// A family-scope tombstone covers the cell.
    FamilyDeleted,
}

#[derive(Debug)]
struct ColumnDelete {
    qualifier: Bytes,
    ts: Timestamp,
    kind: CellType,
}

/// Tracks the tombstones of the current row.
///
/// Sorted input keeps the representation small: family markers arrive first
/// (one watermark timestamp suffices), and qualifiers arrive ascending, so
/// only the latest column-scoped marker can still cover the cells ahead.
#[derive(Debug, Default)]
pub struct DeleteTracker {
    family_stamp: Option<Timestamp>,
    column: Option<ColumnDelete>,
}

impl DeleteTracker {
    /// An empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a tombstone cell.
    ///
    /// Markers wholly covered by the family watermark are not recorded, and
    /// a less specific marker never displaces a more specific one already
    /// tracked for the same qualifier.
    pub fn add(&mut self, qualifier: &Bytes, ts: Timestamp, kind: CellType) {
        debug_assert!(kind.is_delete());

        if self.family_stamp.is_some_and(|stamp| ts <= stamp) {
            return;
        }
        if kind == CellType::DeleteFamily {
            self.family_stamp = Some(ts);
            return;
        }
        if let Some(tracked) = &self.column {
            if kind.code() < tracked.kind.code() && tracked.qualifier == *qualifier {
                return;
            }
        }
        self.column = Some(ColumnDelete {
            qualifier: qualifier.clone(),
            ts,
            kind,
        });
    }

    /// Classify a data cell against the recorded tombstones.
    ///
    /// Sorted input means any cell judged here carries a timestamp at or
    /// below the tracked markers'; a qualifier ordered before the tracked
    /// column marker is a regression in the merged stream.
    pub fn is_deleted(&mut self, qualifier: &Bytes, ts: Timestamp) -> Result<DeleteClass, ScanError> {
        if self.family_stamp.is_some_and(|stamp| ts <= stamp) {
            return Ok(DeleteClass::FamilyDeleted);
        }

        if let Some(tracked) = &self.column {
            match tracked.qualifier.cmp(qualifier) {
                std::cmp::Ordering::Equal => {
                    if tracked.kind == CellType::DeleteColumn {
                        return Ok(DeleteClass::ColumnDeleted);
                    }
                    if ts == tracked.ts {
                        return Ok(DeleteClass::VersionDeleted);
                    }
                }
                std::cmp::Ordering::Less => {
                    // The scan moved past the tracked qualifier.
                    self.column = None;
                }
                std::cmp::Ordering::Greater => {
                    return Err(ScanError::OutOfOrderCell {
                        context: "delete tracker",
                        qualifier: qualifier.clone(),
                    });
                }
            }
        }
        Ok(DeleteClass::NotDeleted)
    }

    /// Whether any tombstone is currently recorded.
    pub fn is_empty(&self) -> bool {
        self.family_stamp.is_none() && self.column.is_none()
    }

    /// Forget everything; called at row boundaries.
    pub fn reset(&mut self) {
        self.family_stamp = None;
        self.column = None;
    }
}
