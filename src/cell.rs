//! Cell model: the (row, family, qualifier, timestamp, type, value) record
//! and its scan ordering.
//!
//! Cells sort by row, family and qualifier ascending, then timestamp
//! descending, then type code descending. The type ranks make delete markers
//! sort ahead of data values written at the same timestamp, and family-wide
//! markers (empty qualifier, highest code) the first keys of their row.
//! The matcher's record-before-judge rule for tombstones depends on this.

use std::cmp::Ordering;

use bytes::Bytes;

use crate::mvcc::Timestamp;

/// Discriminates data values from the three tombstone scopes.
///
/// The numeric codes are the canonical sort ranks; at otherwise equal keys a
/// higher code sorts first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellType {
    /// A data value.
    Put,
    /// Tombstone for exactly one (qualifier, timestamp) version.
    Delete,
    /// Tombstone for every version of a qualifier at or before its timestamp.
    DeleteColumn,
    /// Tombstone for every qualifier of the family at or before its timestamp.
    DeleteFamily,
}

impl CellType {
    /// Canonical sort code of this type.
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            CellType::Put => 4,
            CellType::Delete => 8,
            CellType::DeleteColumn => 12,
            CellType::DeleteFamily => 14,
        }
    }

    /// Whether this type is any of the tombstone scopes.
    #[inline]
    pub const fn is_delete(self) -> bool {
        !matches!(self, CellType::Put)
    }
}

/// A single versioned cell.
///
/// Byte components are shared buffers, so cloning a cell is cheap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cell {
    row: Bytes,
    family: Bytes,
    qualifier: Bytes,
    ts: Timestamp,
    kind: CellType,
    value: Bytes,
}

impl Cell {
    /// Build a cell from its components.
    pub fn new(
        row: impl Into<Bytes>,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        ts: Timestamp,
        kind: CellType,
        value: impl Into<Bytes>,
    ) -> Self {
        Self {
            row: row.into(),
            family: family.into(),
            qualifier: qualifier.into(),
            ts,
            kind,
            value: value.into(),
        }
    }

    /// A data value.
    pub fn put(
        row: impl Into<Bytes>,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        ts: Timestamp,
        value: impl Into<Bytes>,
    ) -> Self {
        Self::new(row, family, qualifier, ts, CellType::Put, value)
    }

    /// A tombstone covering exactly `(qualifier, ts)`.
    pub fn delete(
        row: impl Into<Bytes>,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        ts: Timestamp,
    ) -> Self {
        Self::new(row, family, qualifier, ts, CellType::Delete, Bytes::new())
    }

    /// A tombstone covering every version of `qualifier` at or before `ts`.
    pub fn delete_column(
        row: impl Into<Bytes>,
        family: impl Into<Bytes>,
        qualifier: impl Into<Bytes>,
        ts: Timestamp,
    ) -> Self {
        Self::new(
            row,
            family,
            qualifier,
            ts,
            CellType::DeleteColumn,
            Bytes::new(),
        )
    }

    /// A tombstone covering every qualifier of the family at or before `ts`.
    /// Family markers carry an empty qualifier so they sort first in the row.
    pub fn delete_family(row: impl Into<Bytes>, family: impl Into<Bytes>, ts: Timestamp) -> Self {
        Self::new(
            row,
            family,
            Bytes::new(),
            ts,
            CellType::DeleteFamily,
            Bytes::new(),
        )
    }

    /// Row key.
    #[inline]
    pub fn row(&self) -> &Bytes {
        &self.row
    }

    /// Column family.
    #[inline]
    pub fn family(&self) -> &Bytes {
        &self.family
    }

    /// Column qualifier (empty for family-wide tombstones).
    #[inline]
    pub fn qualifier(&self) -> &Bytes {
        &self.qualifier
    }

    /// Cell timestamp.
    #[inline]
    pub fn timestamp(&self) -> Timestamp {
        self.ts
    }

    /// Cell type.
    #[inline]
    pub fn kind(&self) -> CellType {
        self.kind
    }

    /// Value payload (empty for tombstones).
    #[inline]
    pub fn value(&self) -> &Bytes {
        &self.value
    }

    /// Scan-order comparison.
    ///
    /// Not an `Ord` impl: two cells with equal keys but different values
    /// compare `Equal` here, which would break the `Ord`/`Eq` contract.
    pub fn scan_cmp(&self, other: &Cell) -> Ordering {
        self.row
            .cmp(&other.row)
            .then_with(|| self.family.cmp(&other.family))
            .then_with(|| self.qualifier.cmp(&other.qualifier))
            .then_with(|| other.ts.cmp(&self.ts))
            .then_with(|| other.kind.code().cmp(&self.kind.code()))
    }
}

/// A boundary position in scan order, used as a seek target.
///
/// Targets are structural rather than sentinel byte keys: the consumer
/// resolves each variant against its own index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeekKey {
    /// First possible position of a row.
    AtRow {
        /// Target row key.
        row: Bytes,
    },
    /// First possible position of a qualifier within (row, family).
    AtColumn {
        /// Target row key.
        row: Bytes,
        /// Target column family.
        family: Bytes,
        /// Target qualifier.
        qualifier: Bytes,
    },
    /// Just past every version of a qualifier within (row, family).
    PastColumn {
        /// Row key of the column being left.
        row: Bytes,
        /// Column family of the column being left.
        family: Bytes,
        /// Qualifier being left.
        qualifier: Bytes,
    },
    /// Just past every cell of a row.
    PastRow {
        /// Row key being left.
        row: Bytes,
    },
}

impl SeekKey {
    /// Row component of the target, whichever variant it is.
    pub fn row(&self) -> &Bytes {
        match self {
            SeekKey::AtRow { row }
            | SeekKey::AtColumn { row, .. }
            | SeekKey::PastColumn { row, .. }
            | SeekKey::PastRow { row } => row,
        }
    }
}
