#![deny(missing_docs)]
//! Cell-matching engine for the scan path of a versioned wide-column store.
//!
//! A scan merges one or more sorted cell sources into a single stream and
//! judges every candidate cell against tombstones, time range, TTL, column
//! selection, and version limits. [`matcher::CellMatcher`] renders that
//! judgement as a [`matcher::MatchCode`]; [`store::scanner::StoreScanner`]
//! drives a cell source by it, emitting, skipping, seeking, or stopping as
//! instructed.

mod logging;

// Re-export the scan surface so callers can do `basalt::CellMatcher`.
pub use crate::{
    cell::Cell,
    error::ScanError,
    matcher::{CellMatcher, MatchCode},
    store::{scanner::StoreScanner, MemStore},
};

#[cfg(test)]
mod test_util;


/// Cells, their coordinates, and seek targets.
pub mod cell;

/// Error type shared across the scan path.
pub mod error;

/// Per-cell match decisions: tombstones, column selection, version counting.
pub mod matcher;

/// Timestamps and time ranges.
pub mod mvcc;

/// Scan requests, store retention, and the tombstone policy derived from both.
pub mod scan;

/// Sorted in-memory cell store, merge heap, and the scan driver.
pub mod store;
