//! Caller-supplied predicate hook evaluated inside the matcher.

use crate::cell::{Cell, SeekKey};

/// Decision returned by [`ScanPredicate::filter_cell`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PredicateDecision {
    /// Keep evaluating the cell (version counting still applies).
    Include,
    /// Drop this cell only.
    Skip,
    /// Drop this cell and the rest of its column.
    NextColumn,
    /// Drop this cell and the rest of its row.
    NextRow,
    /// Seek to the key returned by [`ScanPredicate::next_key_hint`].
    SeekUsingHint,
}

/// External row/column predicate consulted before version counting.
///
/// Implementations may carry state across cells of a scan; the matcher calls
/// them in strict cell order.
pub trait ScanPredicate {
    /// Whether the whole scan is finished regardless of remaining cells.
    fn filter_all_remaining(&self) -> bool {
        false
    }

    /// Judge one cell.
    fn filter_cell(&mut self, cell: &Cell) -> PredicateDecision;

    /// Seek target backing a [`PredicateDecision::SeekUsingHint`] decision.
    fn next_key_hint(&self, _cell: &Cell) -> Option<SeekKey> {
        None
    }
}
