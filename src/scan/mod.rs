//! Scan-side configuration: per-scan requests, store retention, and the
//! tombstone policy derived from both.

use std::collections::BTreeSet;

use bytes::Bytes;

use crate::mvcc::TimeRange;

pub mod predicate;

/// Per-scan request.
///
/// Built with consuming setters; the default value is a raw-free, full-row,
/// all-time scan returning one version per column.
#[derive(Clone, Debug)]
pub struct ScanSpec {
    pub(crate) start_row: Bytes,
    pub(crate) stop_row: Bytes,
    pub(crate) time_range: TimeRange,
    pub(crate) columns: Option<BTreeSet<Bytes>>,
    pub(crate) max_versions: u32,
    pub(crate) raw: bool,
}

impl Default for ScanSpec {
    fn default() -> Self {
        Self {
            start_row: Bytes::new(),
            stop_row: Bytes::new(),
            time_range: TimeRange::default(),
            columns: None,
            max_versions: 1,
            raw: false,
        }
    }
}

impl ScanSpec {
    /// Start with the default full scan.
    pub fn new() -> Self {
        Self::default()
    }

    /// First row to return (empty = start of table).
    pub fn start_row(self, start_row: impl Into<Bytes>) -> Self {
        Self {
            start_row: start_row.into(),
            ..self
        }
    }

    /// Exclusive upper row bound (empty = unbounded).
    pub fn stop_row(self, stop_row: impl Into<Bytes>) -> Self {
        Self {
            stop_row: stop_row.into(),
            ..self
        }
    }

    /// Restrict visible timestamps to `time_range`.
    pub fn time_range(self, time_range: TimeRange) -> Self {
        Self { time_range, ..self }
    }

    /// Restrict the scan to an explicit qualifier set. An empty iterator
    /// leaves the scan in wildcard mode.
    pub fn columns<I, B>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let set: BTreeSet<Bytes> = columns.into_iter().map(Into::into).collect();
        Self {
            columns: if set.is_empty() { None } else { Some(set) },
            ..self
        }
    }

    /// Cap on returned versions per column (clamped to the store's cap).
    pub fn max_versions(self, max_versions: u32) -> Self {
        Self {
            max_versions,
            ..self
        }
    }

    /// Raw mode: return tombstones and deleted data as stored.
    pub fn raw(self, raw: bool) -> Self {
        Self { raw, ..self }
    }
}

/// Store-side retention configuration for one column family.
#[derive(Clone, Debug)]
pub struct RetentionConfig {
    pub(crate) min_versions: u32,
    pub(crate) max_versions: u32,
    pub(crate) ttl: Option<u64>,
    pub(crate) keep_deleted_cells: bool,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            min_versions: 0,
            max_versions: 1,
            ttl: None,
            keep_deleted_cells: false,
        }
    }
}

impl RetentionConfig {
    /// Start from the defaults: one version, no TTL, deletes not kept.
    pub fn new() -> Self {
        Self::default()
    }

    /// Versions never expired by TTL, per column.
    pub fn min_versions(self, min_versions: u32) -> Self {
        Self {
            min_versions,
            ..self
        }
    }

    /// Versions retained per column.
    pub fn max_versions(self, max_versions: u32) -> Self {
        Self {
            max_versions,
            ..self
        }
    }

    /// Maximum cell age, in timestamp units (`None` = live forever).
    pub fn ttl(self, ttl: u64) -> Self {
        Self {
            ttl: Some(ttl),
            ..self
        }
    }

    /// Keep deleted cells readable until they expire or are compacted away.
    pub fn keep_deleted_cells(self, keep_deleted_cells: bool) -> Self {
        Self {
            keep_deleted_cells,
            ..self
        }
    }
}

/// What kind of read is driving the matcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanKind {
    /// Client-issued read.
    User,
    /// Minor compaction: rewrites a subset of sources, must retain markers.
    MinorCompaction,
    /// Major compaction: rewrites every source, may drop covered data.
    MajorCompaction,
}

/// The three tombstone policy flags, derived once per scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeletePolicy {
    /// Deleted cells stay visible to version counting.
    pub keep_deleted_cells: bool,
    /// Tombstones themselves are emitted.
    pub retain_deletes_in_output: bool,
    /// The scan may read versions behind a tombstone.
    pub see_past_delete_markers: bool,
}

impl DeletePolicy {
    /// Pure derivation from retention, scan kind and the raw flag.
    pub fn derive(retention: &RetentionConfig, kind: ScanKind, raw: bool) -> Self {
        Self {
            keep_deleted_cells: (retention.keep_deleted_cells && kind != ScanKind::User) || raw,
            retain_deletes_in_output: kind == ScanKind::MinorCompaction || raw,
            see_past_delete_markers: retention.keep_deleted_cells && kind == ScanKind::User,
        }
    }
}
