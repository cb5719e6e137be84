//! In-memory sorted cell store and its scan cursor.
//!
//! [`MemStore`] keeps cells in a lock-free skip list ordered by scan order:
//! row, family and qualifier ascending, then timestamp descending, then
//! tombstones before data at the same instant. [`MemStoreScanner`] walks a
//! store and resolves [`SeekKey`] targets against it.

pub mod scanner;

use std::{cmp::Ordering, ops::Bound};

use bytes::Bytes;
use crossbeam_skiplist::{map::Entry, SkipMap};

use crate::{
    cell::{Cell, CellType, SeekKey},
    mvcc::Timestamp,
};

/// Sort key of a stored cell; the value travels separately.
#[derive(Clone, Debug, PartialEq, Eq)]
struct CellKey {
    row: Bytes,
    family: Bytes,
    qualifier: Bytes,
    ts: Timestamp,
    kind: CellType,
}

impl CellKey {
    /// Least key of `row`: sorts at or before every real cell of the row.
    fn first_on_row(row: Bytes) -> Self {
        Self {
            row,
            family: Bytes::new(),
            qualifier: Bytes::new(),
            ts: Timestamp::MAX,
            kind: CellType::DeleteFamily,
        }
    }

    /// Least key of one column.
    fn first_on_column(row: Bytes, family: Bytes, qualifier: Bytes) -> Self {
        Self {
            row,
            family,
            qualifier,
            ts: Timestamp::MAX,
            kind: CellType::DeleteFamily,
        }
    }

    /// Greatest key of one column: no real cell of the column sorts after
    /// it.
    fn last_on_column(row: Bytes, family: Bytes, qualifier: Bytes) -> Self {
        Self {
            row,
            family,
            qualifier,
            ts: Timestamp::MIN,
            kind: CellType::Put,
        }
    }

    fn from_cell(cell: &Cell) -> Self {
        Self {
            row: cell.row().clone(),
            family: cell.family().clone(),
            qualifier: cell.qualifier().clone(),
            ts: cell.timestamp(),
            kind: cell.kind(),
        }
    }
}

impl Ord for CellKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.family.cmp(&other.family))
            .then_with(|| self.qualifier.cmp(&other.qualifier))
            .then_with(|| other.ts.cmp(&self.ts))
            .then_with(|| other.kind.code().cmp(&self.kind.code()))
    }
}

impl PartialOrd for CellKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Smallest row key sorting strictly after every cell of `row`.
fn next_row_key(row: &Bytes) -> Bytes {
    let mut next = Vec::with_capacity(row.len() + 1);
    next.extend_from_slice(row);
    next.push(0);
    Bytes::from(next)
}

fn materialize(entry: &Entry<'_, CellKey, Bytes>) -> Cell {
    let key = entry.key();
    Cell::new(
        key.row.clone(),
        key.family.clone(),
        key.qualifier.clone(),
        key.ts,
        key.kind,
        entry.value().clone(),
    )
}

/// An ordered stream of cells that supports positioning by [`SeekKey`].
///
/// Implementations stay on one cell until advanced; `peek` is free of side
/// effects.
pub trait CellSource {
    /// Cell the source is positioned on, if any remain.
    fn peek(&self) -> Option<&Cell>;

    /// Take the current cell and advance to the next one.
    fn next_cell(&mut self) -> Option<Cell>;

    /// Reposition at the first cell at or after `target`, possibly past the
    /// end.
    fn seek(&mut self, target: &SeekKey);
}

/// Lock-free in-memory cell store in scan order.
///
/// Writes go through `&self`; scanners opened concurrently observe a live
/// view of the map.
pub struct MemStore {
    cells: SkipMap<CellKey, Bytes>,
}

impl MemStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            cells: SkipMap::new(),
        }
    }

    /// Insert one cell, replacing any cell with identical coordinates.
    pub fn insert(&self, cell: Cell) {
        let value = cell.value().clone();
        self.cells.insert(CellKey::from_cell(&cell), value);
    }

    /// Number of stored cells.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the store holds no cells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Open a cursor positioned on the first cell.
    pub fn scanner(&self) -> MemStoreScanner<'_> {
        let mut scanner = MemStoreScanner {
            store: self,
            cursor: None,
            peeked: None,
        };
        scanner.position(self.cells.front());
        scanner
    }
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Cursor over one [`MemStore`].
pub struct MemStoreScanner<'m> {
    store: &'m MemStore,
    cursor: Option<Entry<'m, CellKey, Bytes>>,
    /// Materialized copy of the cell under `cursor`.
    peeked: Option<Cell>,
}

impl<'m> MemStoreScanner<'m> {
    fn position(&mut self, cursor: Option<Entry<'m, CellKey, Bytes>>) {
        self.peeked = cursor.as_ref().map(materialize);
        self.cursor = cursor;
    }
}

impl CellSource for MemStoreScanner<'_> {
    fn peek(&self) -> Option<&Cell> {
        self.peeked.as_ref()
    }

    fn next_cell(&mut self) -> Option<Cell> {
        let cell = self.peeked.take()?;
        let next = self.cursor.as_ref().and_then(|entry| entry.next());
        self.position(next);
        Some(cell)
    }

    fn seek(&mut self, target: &SeekKey) {
        let cursor = match target {
            SeekKey::AtRow { row } => {
                let key = CellKey::first_on_row(row.clone());
                self.store.cells.lower_bound(Bound::Included(&key))
            }
            SeekKey::AtColumn {
                row,
                family,
                qualifier,
            } => {
                let key =
                    CellKey::first_on_column(row.clone(), family.clone(), qualifier.clone());
                self.store.cells.lower_bound(Bound::Included(&key))
            }
            SeekKey::PastColumn {
                row,
                family,
                qualifier,
            } => {
                let key = CellKey::last_on_column(row.clone(), family.clone(), qualifier.clone());
                self.store.cells.lower_bound(Bound::Excluded(&key))
            }
            SeekKey::PastRow { row } => {
                let key = CellKey::first_on_row(next_row_key(row));
                self.store.cells.lower_bound(Bound::Included(&key))
            }
        };
        self.position(cursor);
    }
}
