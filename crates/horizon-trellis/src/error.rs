//! Error types for the list engine.
//!
//! Everything here is a usage error: a contract violation in the request
//! an application handed to the list. Requests are validated before any
//! mutation is applied, so a returned error never leaves the list
//! partially modified. Internal consistency violations are not errors;
//! they panic.

/// Result type alias for list operations.
pub type Result<T> = std::result::Result<T, ListError>;

/// Errors produced by validating list requests.
#[derive(Debug, thiserror::Error)]
pub enum ListError {
    /// The number of cell values does not fill a whole number of rows.
    #[error("{values} cell value(s) do not divide into rows of {columns} column(s)")]
    UnevenItemCount { values: usize, columns: usize },

    /// Row metadata appeared after the row's cell values, or at the end of
    /// the request with no cell value following it.
    #[error("row metadata must precede the cell values of its row")]
    MisplacedMetadata,

    /// A separator shares its row with other values or metadata.
    #[error("a separator fills its whole row and cannot carry other values or metadata")]
    SeparatorNotAlone,

    /// An item attribute the active list style does not support.
    #[error("the {style} list style does not support {attribute}")]
    IllegalAttribute {
        style: &'static str,
        attribute: &'static str,
    },

    /// A row index beyond the end of the list.
    #[error("row {index} is out of range for a list of {rows} row(s)")]
    RowOutOfRange { index: usize, rows: usize },

    /// A row range extending beyond the end of the list.
    #[error("rows {index}..{} are out of range for a list of {rows} row(s)", .index + .count)]
    RangeOutOfRange {
        index: usize,
        count: usize,
        rows: usize,
    },

    /// A resort order that is not a permutation of the row numbers.
    #[error("resort order must be a permutation of 0..{rows}")]
    InvalidPermutation { rows: usize },

    /// A list configured with no columns.
    #[error("a list needs at least one column")]
    NoColumns,

    /// A list configured to show no rows.
    #[error("a list must be configured to show at least one row")]
    ZeroVisibleRows,

    /// Visible-row bounds where the minimum exceeds the maximum.
    #[error("visible row bounds are inconsistent: minimum {min} exceeds maximum {max}")]
    InvalidRowBounds { min: usize, max: usize },

    /// A requested column width percentage above 100.
    #[error("column {column} requests {percent}% of the list width")]
    InvalidWidthPercent { column: usize, percent: u32 },

    /// Configuration referring to a column the list does not have.
    #[error("column {column} is out of range for a list of {columns} column(s)")]
    ColumnOutOfRange { column: usize, columns: usize },
}
