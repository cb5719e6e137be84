//! Crate-wide error type for the scan path.

use bytes::Bytes;

use crate::mvcc::Timestamp;

/// Error raised by scan configuration or by the matching engine.
///
/// Everything except `InvalidTimeRange` signals a broken input-order
/// invariant and is fatal to the scan that observed it.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Time range constructed with `min > max`.
    #[error("invalid time range: min {min:?} > max {max:?}")]
    InvalidTimeRange {
        /// Requested lower bound.
        min: Timestamp,
        /// Requested upper bound.
        max: Timestamp,
    },
    /// The merged cell stream regressed in sort order.
    #[error("cell order regressed in {context}: qualifier {qualifier:?}")]
    OutOfOrderCell {
        /// Component that observed the regression.
        context: &'static str,
        /// Qualifier of the offending cell.
        qualifier: Bytes,
    },
    /// A cell was matched before any row was set on the matcher.
    #[error("no current row: set_row must be called before matching")]
    RowUnset,
}
