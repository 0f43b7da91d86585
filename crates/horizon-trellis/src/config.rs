//! List configuration.
//!
//! [`ListConfig`] fixes a list's shape at construction: its style, data
//! column count, per-column width requests and alignments, padding, and
//! how many rows of height it asks its container for. Configuration is
//! validated before any list machinery is built; a bad configuration is
//! a usage error, never a half-constructed list.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::column_widths::SyncAxis;
use crate::error::{ListError, Result};
use crate::row::DEFAULT_HOVER_ACTION_DELAY;
use crate::selection::{self, SelectionPolicy};
use crate::style::{self, ListStyle};
use crate::types::HAlign;

/// Configuration of one list instance.
#[derive(Clone)]
pub struct ListConfig {
    pub(crate) style: Arc<dyn ListStyle>,
    /// Number of data columns (synthetic style columns not included).
    pub(crate) columns: usize,
    /// Data-column index -> requested percentage of the list width.
    pub(crate) requested_col_widths: HashMap<usize, u32>,
    /// Data-column index -> horizontal alignment.
    pub(crate) col_alignments: HashMap<usize, HAlign>,
    /// Horizontal padding inside each column, each side.
    pub(crate) h_padding: u32,
    /// Vertical padding inside each row, each side.
    pub(crate) v_padding: u32,
    /// Pixels per hierarchical indentation level.
    pub(crate) indent_width: u32,
    /// Minimum height of the list, in rows.
    pub(crate) min_rows: usize,
    /// Maximum height of the list, in rows.
    pub(crate) max_rows: usize,
    /// Debounce before a hovered submenu row opens its popup.
    pub(crate) hover_action_delay: Duration,
    pub(crate) selection_policy: SelectionPolicy,
    /// Shared column-width negotiation, for aligned list instances.
    pub(crate) synchronized_axis: Option<SyncAxis>,
}

impl ListConfig {
    /// A single-selection highlighted list with `columns` data columns.
    pub fn new(columns: usize) -> Self {
        Self {
            style: style::highlighted(),
            columns,
            requested_col_widths: HashMap::new(),
            col_alignments: HashMap::new(),
            h_padding: 4,
            v_padding: 2,
            indent_width: 16,
            min_rows: 4,
            max_rows: 4,
            hover_action_delay: DEFAULT_HOVER_ACTION_DELAY,
            selection_policy: selection::single(),
            synchronized_axis: None,
        }
    }

    /// Use a different list style.
    pub fn with_style(mut self, style: Arc<dyn ListStyle>) -> Self {
        self.style = style;
        self
    }

    /// Request a column take a percentage of the list width.
    pub fn with_requested_col_width(mut self, column: usize, percent: u32) -> Self {
        self.requested_col_widths.insert(column, percent);
        self
    }

    /// Set a column's horizontal alignment.
    pub fn with_col_alignment(mut self, column: usize, align: HAlign) -> Self {
        self.col_alignments.insert(column, align);
        self
    }

    /// Set the per-side horizontal and vertical cell padding.
    pub fn with_padding(mut self, horizontal: u32, vertical: u32) -> Self {
        self.h_padding = horizontal;
        self.v_padding = vertical;
        self
    }

    /// Set the list's height bounds, in rows.
    pub fn with_visible_rows(mut self, min_rows: usize, max_rows: usize) -> Self {
        self.min_rows = min_rows;
        self.max_rows = max_rows;
        self
    }

    /// Set the submenu hover debounce delay.
    pub fn with_hover_action_delay(mut self, delay: Duration) -> Self {
        self.hover_action_delay = delay;
        self
    }

    /// Set the selection-type policy.
    pub fn with_selection_policy(mut self, policy: SelectionPolicy) -> Self {
        self.selection_policy = policy;
        self
    }

    /// Negotiate column widths with the other lists on the axis.
    pub fn with_synchronized_axis(mut self, axis: SyncAxis) -> Self {
        self.synchronized_axis = Some(axis);
        self
    }

    /// The active style.
    pub fn style(&self) -> &Arc<dyn ListStyle> {
        &self.style
    }

    /// The data column count.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Check the configuration's internal contracts.
    pub fn validate(&self) -> Result<()> {
        if self.columns == 0 {
            return Err(ListError::NoColumns);
        }
        if self.min_rows == 0 || self.max_rows == 0 {
            return Err(ListError::ZeroVisibleRows);
        }
        if self.min_rows > self.max_rows {
            return Err(ListError::InvalidRowBounds {
                min: self.min_rows,
                max: self.max_rows,
            });
        }
        for (&column, &percent) in &self.requested_col_widths {
            if column >= self.columns {
                return Err(ListError::ColumnOutOfRange {
                    column,
                    columns: self.columns,
                });
            }
            if percent > 100 {
                return Err(ListError::InvalidWidthPercent { column, percent });
            }
        }
        for &column in self.col_alignments.keys() {
            if column >= self.columns {
                return Err(ListError::ColumnOutOfRange {
                    column,
                    columns: self.columns,
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ListConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListConfig")
            .field("style", &self.style.name())
            .field("columns", &self.columns)
            .field("min_rows", &self.min_rows)
            .field("max_rows", &self.max_rows)
            .field("hover_action_delay", &self.hover_action_delay)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ListConfig::new(1).validate().is_ok());
        assert!(ListConfig::new(5).validate().is_ok());
    }

    #[test]
    fn test_zero_columns_rejected() {
        assert!(matches!(
            ListConfig::new(0).validate().unwrap_err(),
            ListError::NoColumns
        ));
    }

    #[test]
    fn test_zero_visible_rows_rejected() {
        let config = ListConfig::new(1).with_visible_rows(0, 4);
        assert!(matches!(
            config.validate().unwrap_err(),
            ListError::ZeroVisibleRows
        ));
    }

    #[test]
    fn test_inverted_row_bounds_rejected() {
        let config = ListConfig::new(1).with_visible_rows(6, 2);
        assert!(matches!(
            config.validate().unwrap_err(),
            ListError::InvalidRowBounds { min: 6, max: 2 }
        ));
    }

    #[test]
    fn test_width_requests_validated() {
        let config = ListConfig::new(2).with_requested_col_width(1, 101);
        assert!(matches!(
            config.validate().unwrap_err(),
            ListError::InvalidWidthPercent {
                column: 1,
                percent: 101
            }
        ));

        let config = ListConfig::new(2).with_requested_col_width(7, 50);
        assert!(matches!(
            config.validate().unwrap_err(),
            ListError::ColumnOutOfRange {
                column: 7,
                columns: 2
            }
        ));
    }
}
