//! Item descriptors and row batch validation.
//!
//! Callers describe new rows as a flat sequence of [`ListItemParam`]
//! values: cell values (text, images, separators) interleaved with
//! row metadata (shortcuts, callbacks, indentation, menu payloads).
//! Metadata annotates the row whose cell values follow it.
//!
//! [`RowBatch::build`] turns such a sequence into validated rows. All
//! contract checking happens here, in the calling thread, before
//! anything is marshaled to the dispatch thread — a rejected request
//! leaves the list untouched.

use crate::cell::Cell;
use crate::error::{ListError, Result};
use crate::input::KeyCombination;
use crate::row::{MenuItemKind, RowClass, RowId, StatusChangeFn, SubmenuCallback};
use crate::style::ListStyle;

/// One element of a row-construction request.
#[derive(Clone)]
pub enum ListItemParam {
    /// A text cell value.
    Text(String),
    /// An image cell value, by theme image name.
    Image(String),
    /// A separator row. Fills its whole row slot; accepts no metadata.
    Separator,
    /// Metadata: install a global keyboard shortcut on the row.
    Shortcut(KeyCombination),
    /// Metadata: per-row status-change callback.
    StatusCallback(StatusChangeFn),
    /// Metadata: hierarchical indentation level.
    HierIndent(usize),
    /// Metadata: the row is a menu option, optionally in a radio group.
    MenuOption { radio_group: Option<String> },
    /// Metadata: the row opens a submenu popup.
    Submenu(SubmenuCallback),
    /// Metadata: the row starts out selected.
    InitiallySelected,
    /// Trailing marker: return opaque item handles for the new rows.
    ///
    /// Handles are only constructed when asked for.
    ReturnHandles,
}

impl ListItemParam {
    /// Shorthand for [`ListItemParam::MenuOption`] without a radio group.
    pub fn menu_option() -> Self {
        Self::MenuOption { radio_group: None }
    }

    /// Shorthand for a radio-grouped [`ListItemParam::MenuOption`].
    pub fn menu_option_in_group(group: impl Into<String>) -> Self {
        Self::MenuOption {
            radio_group: Some(group.into()),
        }
    }
}

impl From<&str> for ListItemParam {
    fn from(text: &str) -> Self {
        Self::Text(text.into())
    }
}

impl From<String> for ListItemParam {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl std::fmt::Debug for ListItemParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Image(name) => f.debug_tuple("Image").field(name).finish(),
            Self::Separator => f.write_str("Separator"),
            Self::Shortcut(combo) => f.debug_tuple("Shortcut").field(combo).finish(),
            Self::StatusCallback(_) => f.write_str("StatusCallback(..)"),
            Self::HierIndent(level) => f.debug_tuple("HierIndent").field(level).finish(),
            Self::MenuOption { radio_group } => f
                .debug_struct("MenuOption")
                .field("radio_group", radio_group)
                .finish(),
            Self::Submenu(_) => f.write_str("Submenu(..)"),
            Self::InitiallySelected => f.write_str("InitiallySelected"),
            Self::ReturnHandles => f.write_str("ReturnHandles"),
        }
    }
}

/// Metadata accumulated for one row while its descriptors are parsed.
///
/// Styles receive this when synthesizing their leading/trailing cells,
/// so custom [`ListStyle`] implementations see everything the row was
/// created with.
#[derive(Clone, Default)]
pub struct RowMeta {
    pub indent: usize,
    pub shortcut: Option<KeyCombination>,
    pub status_callback: Option<StatusChangeFn>,
    pub menu_item: Option<MenuItemKind>,
    pub initially_selected: bool,
    pub class: RowClass,
}

impl RowMeta {
    fn separator() -> Self {
        Self {
            class: RowClass::Separator,
            ..Self::default()
        }
    }

    fn has_any(&self) -> bool {
        self.indent != 0
            || self.shortcut.is_some()
            || self.status_callback.is_some()
            || self.menu_item.is_some()
            || self.initially_selected
    }
}

/// One validated row: its real data cells plus its metadata.
///
/// The active style's synthetic leading/trailing cells are added when the
/// row lands in the store, not here.
pub(crate) struct RowSpec {
    pub cells: Vec<Cell>,
    pub meta: RowMeta,
    /// Identity pre-created so an asynchronous caller could be handed an
    /// item handle up front; `None` means the store mints one.
    pub preassigned: Option<RowId>,
}

/// A fully validated row-construction request.
pub(crate) struct RowBatch {
    pub rows: Vec<RowSpec>,
    pub return_handles: bool,
}

impl std::fmt::Debug for RowBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowBatch")
            .field("rows", &self.rows.len())
            .field("return_handles", &self.return_handles)
            .finish()
    }
}

impl RowBatch {
    /// Validate a descriptor sequence against the active style and real
    /// column count.
    ///
    /// See the module docs for the contract; any violation returns a
    /// descriptive error and produces no rows.
    pub fn build(
        style: &dyn ListStyle,
        columns: usize,
        params: Vec<ListItemParam>,
    ) -> Result<RowBatch> {
        let mut rows = Vec::new();
        let mut current_cells: Vec<Cell> = Vec::new();
        let mut pending = RowMeta::default();
        let mut total_values = 0usize;
        let mut return_handles = false;

        let mut push_value = |cell: Cell,
                              current_cells: &mut Vec<Cell>,
                              pending: &mut RowMeta,
                              rows: &mut Vec<RowSpec>| {
            current_cells.push(cell);
            if current_cells.len() == columns {
                rows.push(RowSpec {
                    cells: std::mem::take(current_cells),
                    meta: std::mem::take(pending),
                    preassigned: None,
                });
            }
        };

        for param in params {
            if return_handles {
                // ReturnHandles is a trailing marker only.
                return Err(ListError::MisplacedMetadata);
            }
            match param {
                ListItemParam::Text(text) => {
                    total_values += 1;
                    push_value(Cell::text(text), &mut current_cells, &mut pending, &mut rows);
                }
                ListItemParam::Image(name) => {
                    total_values += 1;
                    push_value(Cell::image(name), &mut current_cells, &mut pending, &mut rows);
                }
                ListItemParam::Separator => {
                    if !current_cells.is_empty() || pending.has_any() {
                        return Err(ListError::SeparatorNotAlone);
                    }
                    let mut cells = vec![Cell::separator()];
                    cells.resize_with(columns, Cell::empty);
                    rows.push(RowSpec {
                        cells,
                        meta: RowMeta::separator(),
                        preassigned: None,
                    });
                }
                ListItemParam::Shortcut(combo) => {
                    Self::expect_row_start(&current_cells)?;
                    pending.shortcut = Some(combo);
                }
                ListItemParam::StatusCallback(callback) => {
                    Self::expect_row_start(&current_cells)?;
                    pending.status_callback = Some(callback);
                }
                ListItemParam::HierIndent(level) => {
                    if !style.allows_hier_indent() {
                        return Err(ListError::IllegalAttribute {
                            style: style.name(),
                            attribute: "hierarchical indentation",
                        });
                    }
                    Self::expect_row_start(&current_cells)?;
                    pending.indent = level;
                }
                ListItemParam::MenuOption { radio_group } => {
                    if !style.allows_menu_items() {
                        return Err(ListError::IllegalAttribute {
                            style: style.name(),
                            attribute: "menu options",
                        });
                    }
                    Self::expect_row_start(&current_cells)?;
                    pending.menu_item = Some(MenuItemKind::Option { radio_group });
                }
                ListItemParam::Submenu(open) => {
                    if !style.allows_menu_items() {
                        return Err(ListError::IllegalAttribute {
                            style: style.name(),
                            attribute: "submenus",
                        });
                    }
                    Self::expect_row_start(&current_cells)?;
                    pending.menu_item = Some(MenuItemKind::Submenu { open });
                }
                ListItemParam::InitiallySelected => {
                    Self::expect_row_start(&current_cells)?;
                    pending.initially_selected = true;
                }
                ListItemParam::ReturnHandles => {
                    if !current_cells.is_empty() || pending.has_any() {
                        return Err(ListError::MisplacedMetadata);
                    }
                    return_handles = true;
                }
            }
        }

        if !current_cells.is_empty() {
            return Err(ListError::UnevenItemCount {
                values: total_values,
                columns,
            });
        }
        if pending.has_any() {
            // Metadata with no cell value following it.
            return Err(ListError::MisplacedMetadata);
        }

        Ok(RowBatch {
            rows,
            return_handles,
        })
    }

    /// Number of rows the batch will create.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn expect_row_start(current_cells: &[Cell]) -> Result<()> {
        if current_cells.is_empty() {
            Ok(())
        } else {
            Err(ListError::MisplacedMetadata)
        }
    }
}
