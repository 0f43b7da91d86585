//! Selection policies and the editor they drive.
//!
//! What "selecting row i" means depends on the list variant: a plain
//! list keeps one selection, a combo-box allows none, a checklist keeps
//! many. Rather than an enum of modes, the policy is a closure invoked
//! by [`autoselect`](crate::ListLayoutManager::autoselect) with a
//! [`SelectionEditor`] scoped to the activation; applications can plug
//! in their own semantics.
//!
//! The editor queues all application callbacks; nothing is invoked
//! until the data lock is released.

use std::sync::Arc;

use crate::host::ElementSurface;
use crate::row::{ActivationSource, ItemStatus, RowClass};
use crate::store::{DeferredCall, StoreData};
use crate::style::ListStyle;
use crate::types::Rect;

/// Payload of the whole-list selection-changed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    /// The row whose selection state changed.
    pub row: usize,
    /// The row's new selection state.
    pub selected: bool,
    /// What caused the change.
    pub source: ActivationSource,
}

/// Whole-list selection-changed callback.
pub type SelectionChangedFn = Arc<dyn Fn(&SelectionChange) + Send + Sync>;

/// Current-highlighted-item-changed callback.
pub type CurrentChangedFn = Arc<dyn Fn(Option<usize>) + Send + Sync>;

/// A selection-type policy: the strategy invoked when a row is
/// activated by pointer, keyboard, shortcut, or `autoselect`.
pub type SelectionPolicy = Arc<dyn Fn(&mut SelectionEditor<'_>, usize) + Send + Sync>;

/// Mutation surface handed to a [`SelectionPolicy`].
///
/// All operations validate the row: separators and out-of-range rows
/// are silently skipped, matching the engine's treatment of stale
/// references as benign.
pub struct SelectionEditor<'a> {
    data: &'a mut StoreData,
    style: &'a dyn ListStyle,
    surface: &'a Arc<dyn ElementSurface>,
    deferred: &'a mut Vec<DeferredCall>,
    source: ActivationSource,
}

impl<'a> SelectionEditor<'a> {
    pub(crate) fn new(
        data: &'a mut StoreData,
        style: &'a dyn ListStyle,
        surface: &'a Arc<dyn ElementSurface>,
        deferred: &'a mut Vec<DeferredCall>,
        source: ActivationSource,
    ) -> Self {
        Self {
            data,
            style,
            surface,
            deferred,
            source,
        }
    }

    /// Number of rows in the list.
    pub fn rows(&self) -> usize {
        self.data.row_infos.len()
    }

    /// Whether a row is currently selected.
    pub fn is_selected(&self, row: usize) -> bool {
        self.data.is_selected(row)
    }

    /// All currently selected row numbers, ascending.
    pub fn selected_rows(&self) -> Vec<usize> {
        self.data.all_selected()
    }

    /// Select a row. No-op if already selected, disabled as a separator,
    /// or out of range. Returns `true` if the state changed.
    ///
    /// Selecting a radio-grouped menu option deselects the other
    /// members of its group first.
    pub fn select(&mut self, row: usize) -> bool {
        self.radio_group_clear(row);
        self.apply(row, true)
    }

    /// Deselect a row. No-op if not selected. Returns `true` if the
    /// state changed.
    pub fn unselect(&mut self, row: usize) -> bool {
        self.apply(row, false)
    }

    fn radio_group_clear(&mut self, row: usize) {
        let Some(info) = self.data.row_infos.get(row) else {
            return;
        };
        let Some(group) = self
            .data
            .identities
            .get(info.id)
            .and_then(|identity| identity.radio_group().map(String::from))
        else {
            return;
        };
        let siblings: Vec<usize> = self
            .data
            .row_infos
            .iter()
            .enumerate()
            .filter(|(other, info)| {
                *other != row
                    && self
                        .data
                        .identities
                        .get(info.id)
                        .is_some_and(|identity| {
                            identity.selected && identity.radio_group() == Some(group.as_str())
                        })
            })
            .map(|(other, _)| other)
            .collect();
        for sibling in siblings {
            self.apply(sibling, false);
        }
    }

    /// The one state transition: flips the identity, refreshes the
    /// style's synthetic cells, queues the notifications, and requests a
    /// redraw of just the affected row.
    fn apply(&mut self, row: usize, selected: bool) -> bool {
        let Some(info) = self.data.row_infos.get(row).cloned() else {
            return false;
        };
        let Some(identity) = self.data.identities.get_mut(info.id) else {
            return false;
        };
        if identity.class == RowClass::Separator || identity.selected == selected {
            return false;
        }
        identity.selected = selected;
        let status_callback = identity.status_callback.clone();

        let columns = self.data.columns;
        let cell_range = row * columns..(row + 1) * columns;
        if self.style.refresh_selected(&mut self.data.cells[cell_range], selected) {
            // A synthetic cell changed content; its size must be
            // re-queried and its width contribution re-recorded.
            self.data.relink_row(row);
            self.data.row_infos[row].size_computed = false;
            self.data.row_infos_modified = true;
        }

        let status = ItemStatus {
            row,
            selected,
            source: self.source,
        };
        if let Some(callback) = status_callback {
            self.deferred
                .push(Box::new(move || callback(&status)));
        }
        let change = SelectionChange {
            row,
            selected,
            source: self.source,
        };
        if let Some(callback) = self.data.selection_changed.clone() {
            self.deferred
                .push(Box::new(move || callback(&change)));
        }
        self.data.queue_selection_signal(self.deferred, change);

        let region = Rect::new(
            0,
            info.y as i32,
            self.surface.width().max(self.data.total_width()),
            info.height,
        );
        let surface = self.surface.clone();
        self.deferred
            .push(Box::new(move || surface.schedule_redraw(region)));

        true
    }
}

/// Single selection: selecting a row deselects everything else first.
/// Idempotent when the row is already the sole selection.
pub fn single() -> SelectionPolicy {
    Arc::new(|editor, row| {
        for other in editor.selected_rows() {
            if other != row {
                editor.unselect(other);
            }
        }
        editor.select(row);
    })
}

/// Single selection where activating the selected row toggles it off.
pub fn single_optional() -> SelectionPolicy {
    Arc::new(|editor, row| {
        if editor.is_selected(row) {
            editor.unselect(row);
            return;
        }
        for other in editor.selected_rows() {
            editor.unselect(other);
        }
        editor.select(row);
    })
}

/// Independent per-row toggling.
pub fn multiple() -> SelectionPolicy {
    Arc::new(|editor, row| {
        if editor.is_selected(row) {
            editor.unselect(row);
        } else {
            editor.select(row);
        }
    })
}

/// Activation never changes selection (display-only lists).
pub fn no_selection() -> SelectionPolicy {
    Arc::new(|_editor, _row| {})
}
