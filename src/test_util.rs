//! Test-only helpers for building cells and running scans.

use bytes::Bytes;

use crate::{
    cell::{Cell, CellType},
    error::ScanError,
    matcher::CellMatcher,
    mvcc::Timestamp,
    scan::{RetentionConfig, ScanKind, ScanSpec},
    store::{scanner::StoreScanner, MemStore},
};

/// Column family shared by all fixture cells.
pub(crate) const FAMILY: &str = "f";

pub(crate) fn put(row: &'static str, qualifier: &'static str, ts: u64, value: &'static str) -> Cell {
    Cell::put(row, FAMILY, qualifier, ts.into(), value)
}

pub(crate) fn delete(row: &'static str, qualifier: &'static str, ts: u64) -> Cell {
    Cell::delete(row, FAMILY, qualifier, ts.into())
}

pub(crate) fn delete_column(row: &'static str, qualifier: &'static str, ts: u64) -> Cell {
    Cell::delete_column(row, FAMILY, qualifier, ts.into())
}

pub(crate) fn delete_family(row: &'static str, ts: u64) -> Cell {
    Cell::delete_family(row, FAMILY, ts.into())
}

pub(crate) fn store_of(cells: impl IntoIterator<Item = Cell>) -> MemStore {
    let store = MemStore::new();
    for cell in cells {
        store.insert(cell);
    }
    store
}

/// Matcher for a plain user read with no predicate and TTL anchored at the
/// far future.
pub(crate) fn user_matcher(spec: ScanSpec, retention: &RetentionConfig) -> CellMatcher {
    CellMatcher::new(
        spec,
        retention,
        ScanKind::User,
        None,
        Timestamp::MAX,
        Timestamp::MAX,
    )
}

/// Run a full scan over `stores` merged in order and collect what it keeps.
pub(crate) fn scan(stores: &[&MemStore], matcher: CellMatcher) -> Result<Vec<Cell>, ScanError> {
    let sources: Vec<_> = stores.iter().map(|store| store.scanner()).collect();
    StoreScanner::merged(sources, matcher).collect()
}

/// Cell values, for compact assertions.
pub(crate) fn values(cells: &[Cell]) -> Vec<Bytes> {
    cells.iter().map(|cell| cell.value().clone()).collect()
}

/// `(qualifier, timestamp, kind)` triples, for assertions that care about
/// markers.
pub(crate) fn coords(cells: &[Cell]) -> Vec<(Bytes, u64, CellType)> {
    cells
        .iter()
        .map(|cell| (cell.qualifier().clone(), cell.timestamp().get(), cell.kind()))
        .collect()
}
