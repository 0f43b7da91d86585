//! Global keyboard shortcut dispatch.
//!
//! Rows created with a [`Shortcut`](crate::item::ListItemParam::Shortcut)
//! descriptor install their key combination here. The registry holds weak
//! references only: a shortcut never keeps its list alive, and dispatch
//! re-validates that the element and the row both still exist before
//! activating anything. A stale entry is pruned, not reported.
//!
//! Installation happens when a row lands in its list; the entry is
//! removed again when the row is permanently removed.

use std::sync::{Arc, Weak};

use horizon_trellis_core::DispatchToken;
use parking_lot::Mutex;

use crate::element::ListElement;
use crate::input::{Key, KeyCombination, KeyboardModifiers};
use crate::row::RowId;

struct ShortcutEntry {
    combo: KeyCombination,
    element: Weak<ListElement>,
    row: RowId,
}

/// The process-wide shortcut lookup table.
///
/// One registry is shared by every list in a window (or application);
/// the host feeds it key events it did not consume elsewhere.
#[derive(Default)]
pub struct ShortcutRegistry {
    entries: Mutex<Vec<ShortcutEntry>>,
}

impl ShortcutRegistry {
    /// Create an empty registry.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn install(&self, combo: KeyCombination, element: &Arc<ListElement>, row: RowId) {
        tracing::debug!(
            target: "horizon_trellis::shortcut",
            %combo,
            "shortcut installed"
        );
        self.entries.lock().push(ShortcutEntry {
            combo,
            element: Arc::downgrade(element),
            row,
        });
    }

    pub(crate) fn uninstall(&self, element: &Arc<ListElement>, row: RowId) {
        self.entries.lock().retain(|entry| {
            entry.row != row
                || entry
                    .element
                    .upgrade()
                    .is_none_or(|live| !Arc::ptr_eq(&live, element))
        });
    }

    /// Number of live installed shortcuts. Prunes dead entries.
    pub fn len(&self) -> usize {
        let mut entries = self.entries.lock();
        entries.retain(|entry| entry.element.strong_count() > 0);
        entries.len()
    }

    /// Returns `true` if no shortcuts are installed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether any installed shortcut matches `combo` and its row is
    /// currently able to activate. Callable from any thread.
    pub fn is_enabled(&self, combo: KeyCombination) -> bool {
        for (element, row) in self.candidates(combo) {
            if element.shortcut_enabled(row) {
                return true;
            }
        }
        false
    }

    /// Dispatch a key press against the table.
    ///
    /// The first matching shortcut whose row is still present and enabled
    /// activates that row, exactly as a pointer click would. Returns
    /// `true` if a shortcut consumed the key.
    pub fn process_key(
        &self,
        token: &DispatchToken,
        key: Key,
        modifiers: KeyboardModifiers,
    ) -> bool {
        for (element, row) in self.candidates(KeyCombination::new(key, modifiers)) {
            if element.activate_shortcut(token, row) {
                tracing::debug!(
                    target: "horizon_trellis::shortcut",
                    combo = %KeyCombination::new(key, modifiers),
                    "shortcut activated"
                );
                return true;
            }
        }
        false
    }

    /// Matching live entries, collected so no element lock is taken while
    /// the registry lock is held.
    fn candidates(&self, combo: KeyCombination) -> Vec<(Arc<ListElement>, RowId)> {
        let mut entries = self.entries.lock();
        entries.retain(|entry| entry.element.strong_count() > 0);
        entries
            .iter()
            .filter(|entry| entry.combo == combo)
            .filter_map(|entry| entry.element.upgrade().map(|element| (element, entry.row)))
            .collect()
    }
}

impl std::fmt::Debug for ShortcutRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortcutRegistry")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}
