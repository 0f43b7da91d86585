//! Row records and durable row identity.
//!
//! A row's *number* is purely positional: inserting, removing, or
//! resorting renumbers everything after it. Anything that needs to refer
//! to "this row" beyond a single lock scope holds a [`RowId`] instead, a
//! generation-checked key into the identity arena. Identities travel with
//! their data through reorders, and a `RowId` held past removal simply
//! fails lookup.

use std::sync::Arc;
use std::time::Duration;

use horizon_trellis_core::DispatchToken;
use slotmap::new_key_type;

use crate::input::KeyCombination;

new_key_type! {
    /// Durable identity of one list row.
    ///
    /// Stays valid through renumbering; becomes a benign dangling key when
    /// the row is permanently removed.
    pub struct RowId;
}

/// Sentinel for an identity that has not been placed into the list yet
/// (pre-created when the caller asked for item handles up front).
pub(crate) const ROW_NUMBER_UNPLACED: usize = usize::MAX;

/// What made a selection or activation happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationSource {
    /// A direct API call.
    Api,
    /// Keyboard navigation (Enter/Space on the current row).
    Keyboard,
    /// A pointer click.
    Pointer,
    /// A global keyboard shortcut installed on the row.
    Shortcut,
}

/// Payload of a per-row status-change callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemStatus {
    /// The row's number at the time of the change.
    pub row: usize,
    /// The row's new selection state.
    pub selected: bool,
    /// What caused the change.
    pub source: ActivationSource,
}

/// Per-row status-change callback, installed at row creation.
pub type StatusChangeFn = Arc<dyn Fn(&ItemStatus) + Send + Sync>;

/// Callback opening a submenu popup; runs on the dispatch thread.
pub type SubmenuCallback = Arc<dyn Fn(&DispatchToken) + Send + Sync>;

/// How long the pointer must rest on a submenu row before its popup
/// opens.
pub const DEFAULT_HOVER_ACTION_DELAY: Duration = Duration::from_millis(500);

/// A row's activation classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowClass {
    /// Selectable by pointer, keyboard, and API.
    #[default]
    Enabled,
    /// Skipped by keyboard navigation; ignores pointer activation.
    Disabled,
    /// A separator rule; never current, never selected.
    Separator,
}

/// Menu-item payload attached to a row under the menu style.
#[derive(Clone)]
pub enum MenuItemKind {
    /// A selectable menu option, optionally part of a radio group.
    Option {
        /// Selecting one member of a radio group deselects the others.
        radio_group: Option<String>,
    },
    /// A row that opens a submenu popup.
    Submenu { open: SubmenuCallback },
}

impl std::fmt::Debug for MenuItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Option { radio_group } => f
                .debug_struct("Option")
                .field("radio_group", radio_group)
                .finish(),
            Self::Submenu { .. } => f.debug_struct("Submenu").finish_non_exhaustive(),
        }
    }
}

/// The durable, reference-counted record behind one list row.
///
/// Exactly one identity exists per live row. The cached `row_number` is
/// only meaningful under the lock-plus-recalculation invariant; holders
/// outside it must re-validate through the identity arena.
pub(crate) struct RowIdentity {
    pub selected: bool,
    pub class: RowClass,
    pub status_callback: Option<StatusChangeFn>,
    pub shortcut: Option<KeyCombination>,
    pub menu_item: Option<MenuItemKind>,
    pub row_number: usize,
}

impl RowIdentity {
    /// An identity not yet attached to a row.
    pub fn unplaced() -> Self {
        Self {
            selected: false,
            class: RowClass::Enabled,
            status_callback: None,
            shortcut: None,
            menu_item: None,
            row_number: ROW_NUMBER_UNPLACED,
        }
    }

    /// Returns `true` if the row takes part in selection and navigation.
    pub fn is_enabled(&self) -> bool {
        self.class == RowClass::Enabled
    }

    /// The submenu-open callback, if this row has one.
    pub fn submenu(&self) -> Option<&SubmenuCallback> {
        match &self.menu_item {
            Some(MenuItemKind::Submenu { open }) => Some(open),
            _ => None,
        }
    }

    /// The radio group name, if this row is a grouped menu option.
    pub fn radio_group(&self) -> Option<&str> {
        match &self.menu_item {
            Some(MenuItemKind::Option {
                radio_group: Some(group),
            }) => Some(group),
            _ => None,
        }
    }
}

/// The positional record of one row.
///
/// Heights come from the measurement service, which only runs on the
/// dispatch thread, so freshly inserted rows start with
/// `size_computed == false` and get measured by the next recalculation.
#[derive(Debug, Clone)]
pub(crate) struct RowInfo {
    pub id: RowId,
    pub height: u32,
    pub y: u32,
    pub size_computed: bool,
    /// Hierarchical indentation level; shifts the first data column.
    pub indent: usize,
}

impl RowInfo {
    pub fn new(id: RowId, indent: usize) -> Self {
        Self {
            id,
            height: 0,
            y: 0,
            size_computed: false,
            indent,
        }
    }
}
