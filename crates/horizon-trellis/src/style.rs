//! List style strategies.
//!
//! A style decides what a list variant looks like beyond its data
//! columns: which synthetic leading/trailing columns exist, how a row
//! shows its selection state, and which item attributes are legal. The
//! row/cell mutation machinery is style-agnostic; it asks the active
//! style for the synthetic cells and for attribute legality and is done.
//!
//! Four strategies cover the toolkit's list variants:
//!
//! | style       | leading        | trailing                  | selection display |
//! |-------------|----------------|---------------------------|-------------------|
//! | highlighted | —              | —                         | background swap   |
//! | bulleted    | bullet icon    | —                         | bullet swap       |
//! | menu        | bullet icon    | shortcut label or submenu arrow | bullet swap |
//! | combo-box   | —              | —                         | background swap   |
//!
//! The combo-box style additionally rejects hierarchical indentation;
//! menus reject it too, and they are the only style accepting menu
//! options and submenus.

use std::sync::Arc;

use crate::cell::{Cell, CellContent};
use crate::item::RowMeta;
use crate::row::{MenuItemKind, RowClass};
use crate::types::VAlign;

/// Theme image shown in the bullet column of an unselected row.
pub const BULLET_OFF_IMAGE: &str = "bullet-off";

/// Theme image shown in the bullet column of a selected row.
pub const BULLET_ON_IMAGE: &str = "bullet-on";

/// Theme image marking a row that opens a submenu.
pub const SUBMENU_ARROW_IMAGE: &str = "submenu-arrow";

/// Policy object for one list variant.
pub trait ListStyle: Send + Sync {
    /// The style's name, used in error messages.
    fn name(&self) -> &'static str;

    /// Number of synthetic columns before the data columns.
    fn leading_columns(&self) -> usize {
        0
    }

    /// Number of synthetic columns after the data columns.
    fn trailing_columns(&self) -> usize {
        0
    }

    /// Total column count for a list with `real_columns` data columns.
    fn actual_columns(&self, real_columns: usize) -> usize {
        self.leading_columns() + real_columns + self.trailing_columns()
    }

    /// Map a data-column index to its actual column index.
    fn shift_column_index(&self, real_column: usize) -> usize {
        real_column + self.leading_columns()
    }

    /// Whether rows may request hierarchical indentation.
    fn allows_hier_indent(&self) -> bool {
        true
    }

    /// Whether rows may carry menu options and submenus.
    fn allows_menu_items(&self) -> bool {
        false
    }

    /// Whether selection is shown by swapping the row background.
    fn highlights_background(&self) -> bool {
        true
    }

    /// Synthetic cells preceding a row's data cells.
    fn leading_cells(&self, meta: &RowMeta) -> Vec<Cell> {
        let _ = meta;
        Vec::new()
    }

    /// Synthetic cells following a row's data cells.
    fn trailing_cells(&self, meta: &RowMeta) -> Vec<Cell> {
        let _ = meta;
        Vec::new()
    }

    /// Refresh a row's synthetic cells after its selection state changed.
    ///
    /// `row_cells` is the row's full cell slice, synthetic columns
    /// included. Returns `true` if any cell content changed (the caller
    /// then owes a remeasure of the row).
    fn refresh_selected(&self, row_cells: &mut [Cell], selected: bool) -> bool {
        let _ = (row_cells, selected);
        false
    }
}

fn bullet_cell(selected: bool) -> Cell {
    let name = if selected {
        BULLET_ON_IMAGE
    } else {
        BULLET_OFF_IMAGE
    };
    Cell::image(name).with_valign(VAlign::Middle)
}

fn swap_bullet(row_cells: &mut [Cell], selected: bool) -> bool {
    let Some(cell) = row_cells.first_mut() else {
        return false;
    };
    let name = if selected {
        BULLET_ON_IMAGE
    } else {
        BULLET_OFF_IMAGE
    };
    match cell.content() {
        CellContent::Image(current) if current != name => {
            cell.set_content(CellContent::Image(name.into()));
            true
        }
        _ => false,
    }
}

/// Plain lists: selection is shown by swapping the row background.
#[derive(Debug, Default)]
pub struct HighlightedStyle;

impl ListStyle for HighlightedStyle {
    fn name(&self) -> &'static str {
        "highlighted"
    }
}

/// Lists with a leading two-state bullet column.
#[derive(Debug, Default)]
pub struct BulletedStyle;

impl ListStyle for BulletedStyle {
    fn name(&self) -> &'static str {
        "bulleted"
    }

    fn leading_columns(&self) -> usize {
        1
    }

    fn highlights_background(&self) -> bool {
        false
    }

    fn leading_cells(&self, meta: &RowMeta) -> Vec<Cell> {
        if meta.class == RowClass::Separator {
            vec![Cell::empty()]
        } else {
            vec![bullet_cell(meta.initially_selected)]
        }
    }

    fn refresh_selected(&self, row_cells: &mut [Cell], selected: bool) -> bool {
        swap_bullet(row_cells, selected)
    }
}

/// Menu popups: bulleted, plus a trailing column showing the row's
/// shortcut or its submenu arrow.
#[derive(Debug, Default)]
pub struct MenuStyle;

impl ListStyle for MenuStyle {
    fn name(&self) -> &'static str {
        "menu"
    }

    fn leading_columns(&self) -> usize {
        1
    }

    fn trailing_columns(&self) -> usize {
        1
    }

    fn allows_hier_indent(&self) -> bool {
        false
    }

    fn allows_menu_items(&self) -> bool {
        true
    }

    fn highlights_background(&self) -> bool {
        false
    }

    fn leading_cells(&self, meta: &RowMeta) -> Vec<Cell> {
        if meta.class == RowClass::Separator {
            vec![Cell::empty()]
        } else {
            vec![bullet_cell(meta.initially_selected)]
        }
    }

    fn trailing_cells(&self, meta: &RowMeta) -> Vec<Cell> {
        if meta.class == RowClass::Separator {
            return vec![Cell::empty()];
        }
        if matches!(meta.menu_item, Some(MenuItemKind::Submenu { .. })) {
            return vec![Cell::image(SUBMENU_ARROW_IMAGE).with_valign(VAlign::Middle)];
        }
        if let Some(shortcut) = meta.shortcut {
            return vec![Cell::text(shortcut.to_string()).with_valign(VAlign::Middle)];
        }
        vec![Cell::empty()]
    }

    fn refresh_selected(&self, row_cells: &mut [Cell], selected: bool) -> bool {
        swap_bullet(row_cells, selected)
    }
}

/// Combo-box popups: a highlighted flat list; hierarchical indentation
/// is rejected.
#[derive(Debug, Default)]
pub struct ComboBoxStyle;

impl ListStyle for ComboBoxStyle {
    fn name(&self) -> &'static str {
        "combo-box"
    }

    fn allows_hier_indent(&self) -> bool {
        false
    }
}

/// The plain highlighted style.
pub fn highlighted() -> Arc<dyn ListStyle> {
    Arc::new(HighlightedStyle)
}

/// The bulleted style.
pub fn bulleted() -> Arc<dyn ListStyle> {
    Arc::new(BulletedStyle)
}

/// The menu style.
pub fn menu() -> Arc<dyn ListStyle> {
    Arc::new(MenuStyle)
}

/// The combo-box style.
pub fn combo_box() -> Arc<dyn ListStyle> {
    Arc::new(ComboBoxStyle)
}
