//! The list layout manager: the public operation surface.
//!
//! A [`ListLayoutManager`] wraps one [`ListElement`] and exposes its row
//! mutation and selection API in two forms:
//!
//! - plain methods validate the request synchronously, marshal the
//!   validated intent to the dispatch thread, and return immediately.
//!   The mutation is asynchronous: it may not be visible yet when the
//!   call returns, but requests from one thread apply in FIFO order.
//! - `*_with_token` methods take a [`DispatchToken`] and execute on the
//!   spot, for callers already running on the dispatch thread (event
//!   handlers, other callbacks).
//!
//! Contract violations in the request itself — uneven item counts,
//! misplaced metadata, attributes the style forbids, a non-permutation
//! resort order — are caught synchronously in both forms, before
//! anything is queued. Row *indices*, however, are checked against the
//! list as it exists when the operation runs; a marshaled operation
//! whose index has gone stale by then is reported through the log and
//! applies nothing.
//!
//! Read queries ([`size`](ListLayoutManager::size),
//! [`selected`](ListLayoutManager::selected), [`lock`](ListLayoutManager::lock))
//! take the data lock directly from any thread and never round-trip
//! through the dispatch queue.

use std::sync::{Arc, Weak};

use horizon_trellis_core::{DispatchToken, Dispatcher};

use crate::config::ListConfig;
use crate::element::ListElement;
use crate::error::Result;
use crate::host::{CellMeasure, ElementSurface, ThemeLookup};
use crate::item::{ListItemParam, RowBatch};
use crate::row::{RowId, RowIdentity};
use crate::selection::{CurrentChangedFn, SelectionChangedFn};
use crate::shortcut::ShortcutRegistry;
use crate::store::{ListLock, ListSignals};

/// The public handle to one list.
///
/// Cheap to clone; all clones drive the same list element.
#[derive(Clone)]
pub struct ListLayoutManager {
    element: Arc<ListElement>,
}

impl ListLayoutManager {
    /// Create a list from its configuration and the host's services.
    pub fn new(
        config: ListConfig,
        measure: Arc<dyn CellMeasure>,
        surface: Arc<dyn ElementSurface>,
        theme: Arc<dyn ThemeLookup>,
        dispatcher: Dispatcher,
        shortcuts: Arc<ShortcutRegistry>,
    ) -> Result<Self> {
        Ok(Self {
            element: ListElement::new(config, measure, surface, theme, dispatcher, shortcuts)?,
        })
    }

    /// The underlying element, for hosts that feed it input and draw it.
    pub fn element(&self) -> &Arc<ListElement> {
        &self.element
    }

    /// Number of rows, as of this instant.
    pub fn size(&self) -> usize {
        self.element.rows()
    }

    /// Number of data columns.
    pub fn columns(&self) -> usize {
        self.element.columns()
    }

    /// Freeze the list for several consistent reads.
    ///
    /// Holding the lock blocks the dispatch thread; keep the hold time
    /// short.
    pub fn lock(&self) -> ListLock<'_> {
        ListLock::new(self.element.store.lock_data())
    }

    /// The element's notification signals.
    pub fn signals(&self) -> &Arc<ListSignals> {
        self.element.signals()
    }

    // -------------------------------------------------------------------------
    // Row mutation
    // -------------------------------------------------------------------------

    /// Append rows built from `items` to the end of the list.
    ///
    /// Returns item handles if `items` ends with
    /// [`ListItemParam::ReturnHandles`]; handles are not constructed
    /// otherwise.
    pub fn append_items(&self, items: Vec<ListItemParam>) -> Result<Option<Vec<ItemHandle>>> {
        let mut batch = self.build_batch(items)?;
        let handles = self.mint_handles(&mut batch);
        self.marshal_batch(batch, "append", move |element, token, batch| {
            let rows = element.rows();
            element.insert_batch(token, rows, batch).map(|_| ())
        });
        Ok(handles)
    }

    /// Append rows, executing directly on the dispatch thread.
    pub fn append_items_with_token(
        &self,
        token: &DispatchToken,
        items: Vec<ListItemParam>,
    ) -> Result<Option<Vec<ItemHandle>>> {
        let mut batch = self.build_batch(items)?;
        let handles = self.mint_handles(&mut batch);
        let rows = self.element.rows();
        self.run_batch(token, batch, |element, token, batch| {
            element.insert_batch(token, rows, batch).map(|_| ())
        })?;
        Ok(handles)
    }

    /// Insert rows built from `items` before row `at`.
    pub fn insert_items(
        &self,
        at: usize,
        items: Vec<ListItemParam>,
    ) -> Result<Option<Vec<ItemHandle>>> {
        let mut batch = self.build_batch(items)?;
        let handles = self.mint_handles(&mut batch);
        self.marshal_batch(batch, "insert", move |element, token, batch| {
            element.insert_batch(token, at, batch).map(|_| ())
        });
        Ok(handles)
    }

    /// Insert rows, executing directly on the dispatch thread.
    pub fn insert_items_with_token(
        &self,
        token: &DispatchToken,
        at: usize,
        items: Vec<ListItemParam>,
    ) -> Result<Option<Vec<ItemHandle>>> {
        let mut batch = self.build_batch(items)?;
        let handles = self.mint_handles(&mut batch);
        self.run_batch(token, batch, |element, token, batch| {
            element.insert_batch(token, at, batch).map(|_| ())
        })?;
        Ok(handles)
    }

    /// Replace the row at `at` with the rows built from `items`.
    ///
    /// The replaced row's durable identity is retired; identities of the
    /// rows after it keep their objects and get renumbered.
    pub fn replace_items(
        &self,
        at: usize,
        items: Vec<ListItemParam>,
    ) -> Result<Option<Vec<ItemHandle>>> {
        let mut batch = self.build_batch(items)?;
        let handles = self.mint_handles(&mut batch);
        self.marshal_batch(batch, "replace", move |element, token, batch| {
            element.replace_batch(token, at, batch).map(|_| ())
        });
        Ok(handles)
    }

    /// Replace one row, executing directly on the dispatch thread.
    pub fn replace_items_with_token(
        &self,
        token: &DispatchToken,
        at: usize,
        items: Vec<ListItemParam>,
    ) -> Result<Option<Vec<ItemHandle>>> {
        let mut batch = self.build_batch(items)?;
        let handles = self.mint_handles(&mut batch);
        self.run_batch(token, batch, |element, token, batch| {
            element.replace_batch(token, at, batch).map(|_| ())
        })?;
        Ok(handles)
    }

    /// Replace the entire list contents.
    pub fn replace_all_items(&self, items: Vec<ListItemParam>) -> Result<Option<Vec<ItemHandle>>> {
        let mut batch = self.build_batch(items)?;
        let handles = self.mint_handles(&mut batch);
        self.marshal_batch(batch, "replace_all", move |element, token, batch| {
            element.replace_all_batch(token, batch);
            Ok(())
        });
        Ok(handles)
    }

    /// Replace the entire list, executing directly on the dispatch thread.
    pub fn replace_all_items_with_token(
        &self,
        token: &DispatchToken,
        items: Vec<ListItemParam>,
    ) -> Result<Option<Vec<ItemHandle>>> {
        let mut batch = self.build_batch(items)?;
        let handles = self.mint_handles(&mut batch);
        self.run_batch(token, batch, |element, token, batch| {
            element.replace_all_batch(token, batch);
            Ok(())
        })?;
        Ok(handles)
    }

    /// Remove `count` rows starting at `at`.
    pub fn remove_items(&self, at: usize, count: usize) {
        self.post("remove", move |element, token| {
            element.remove_rows(token, at, count)
        });
    }

    /// Remove rows, executing directly on the dispatch thread.
    pub fn remove_items_with_token(
        &self,
        token: &DispatchToken,
        at: usize,
        count: usize,
    ) -> Result<()> {
        self.element.remove_rows(token, at, count)
    }

    /// Reorder the list: the row at index `i` moves to index `order[i]`.
    ///
    /// `order` must be a permutation; a malformed order is rejected here
    /// and nothing moves. A length that no longer matches the list when
    /// the marshaled operation runs is reported through the log.
    pub fn resort_items(&self, order: Vec<usize>) -> Result<()> {
        Self::check_permutation(&order)?;
        self.post("resort", move |element, token| {
            element.resort(token, &order)
        });
        Ok(())
    }

    /// Reorder the list, executing directly on the dispatch thread.
    pub fn resort_items_with_token(&self, token: &DispatchToken, order: &[usize]) -> Result<()> {
        self.element.resort(token, order)
    }

    // -------------------------------------------------------------------------
    // Selection and enablement
    // -------------------------------------------------------------------------

    /// Whether row `row` is selected. Out-of-range rows report `false`.
    pub fn selected(&self, row: usize) -> bool {
        self.lock().selected(row)
    }

    /// The first selected row — *the* selection under the single and
    /// single-optional policies.
    pub fn selected_row(&self) -> Option<usize> {
        self.lock().selected_row()
    }

    /// All selected rows, ascending.
    pub fn all_selected(&self) -> Vec<usize> {
        self.lock().all_selected()
    }

    /// Set a row's selection state directly, bypassing the selection
    /// policy.
    pub fn set_selected(&self, row: usize, selected: bool) {
        self.post("set_selected", move |element, token| {
            element.set_selected_with_token(token, row, selected)
        });
    }

    /// Set a row's selection state on the dispatch thread.
    pub fn set_selected_with_token(
        &self,
        token: &DispatchToken,
        row: usize,
        selected: bool,
    ) -> Result<()> {
        self.element.set_selected_with_token(token, row, selected)
    }

    /// Activate a row as if it were clicked: the installed selection
    /// policy decides what "selecting" it means.
    pub fn autoselect(&self, row: usize) {
        self.post("autoselect", move |element, token| {
            element.autoselect_with_token(token, row)
        });
    }

    /// Activate a row on the dispatch thread.
    pub fn autoselect_with_token(&self, token: &DispatchToken, row: usize) -> Result<()> {
        self.element.autoselect_with_token(token, row)
    }

    /// Whether a row accepts activation.
    pub fn enabled(&self, row: usize) -> bool {
        self.lock().enabled(row)
    }

    /// Enable or disable a row. Disabled rows are skipped by keyboard
    /// navigation and ignore the pointer.
    pub fn set_enabled(&self, row: usize, enabled: bool) {
        self.post("set_enabled", move |element, token| {
            element.set_enabled_with_token(token, row, enabled)
        });
    }

    /// Enable or disable a row on the dispatch thread.
    pub fn set_enabled_with_token(
        &self,
        token: &DispatchToken,
        row: usize,
        enabled: bool,
    ) -> Result<()> {
        self.element.set_enabled_with_token(token, row, enabled)
    }

    // -------------------------------------------------------------------------
    // Current element
    // -------------------------------------------------------------------------

    /// The current (highlighted) row, if any.
    pub fn current_row(&self) -> Option<usize> {
        self.element.current_row()
    }

    /// Ask for the highlight to move, from any thread. Reconciled on the
    /// dispatch thread; `None` clears it.
    pub fn set_current_row(&self, row: Option<usize>) {
        self.element.request_current(row);
    }

    // -------------------------------------------------------------------------
    // Callbacks and theme
    // -------------------------------------------------------------------------

    /// Install the whole-list selection-changed callback, replacing any
    /// previous one.
    pub fn on_selection_changed<F>(&self, callback: F)
    where
        F: Fn(&crate::selection::SelectionChange) + Send + Sync + 'static,
    {
        let callback: SelectionChangedFn = Arc::new(callback);
        self.element.store.lock_data().selection_changed = Some(callback);
    }

    /// Install the current-item-changed callback, replacing any previous
    /// one.
    pub fn on_current_changed<F>(&self, callback: F)
    where
        F: Fn(Option<usize>) + Send + Sync + 'static,
    {
        let callback: CurrentChangedFn = Arc::new(callback);
        self.element.store.lock_data().current_changed = Some(callback);
    }

    /// The active theme changed: re-resolve style tokens, re-measure
    /// everything, redraw in full.
    pub fn theme_updated(&self) {
        self.post("theme_updated", move |element, token| {
            element.theme_updated_with_token(token);
            Ok(())
        });
    }

    /// Theme change handling on the dispatch thread.
    pub fn theme_updated_with_token(&self, token: &DispatchToken) {
        self.element.theme_updated_with_token(token);
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn build_batch(&self, items: Vec<ListItemParam>) -> Result<RowBatch> {
        RowBatch::build(&**self.element.style(), self.element.columns(), items)
    }

    /// Pre-create identities for a handle-requesting batch so the caller
    /// gets its handles before the rows land.
    fn mint_handles(&self, batch: &mut RowBatch) -> Option<Vec<ItemHandle>> {
        if !batch.return_handles {
            return None;
        }
        let mut data = self.element.store.lock_data();
        let handles = batch
            .rows
            .iter_mut()
            .map(|spec| {
                let id = data.identities.insert(RowIdentity::unplaced());
                spec.preassigned = Some(id);
                ItemHandle {
                    element: Arc::downgrade(&self.element),
                    id,
                }
            })
            .collect();
        Some(handles)
    }

    /// Queue a closure; a stopped dispatcher makes the operation a
    /// benign no-op (the window is going away).
    fn post<F>(&self, op: &'static str, f: F)
    where
        F: FnOnce(&Arc<ListElement>, &DispatchToken) -> Result<()> + Send + 'static,
    {
        let element = self.element.clone();
        let posted = self.element.dispatcher().post(move |token| {
            if let Err(err) = f(&element, token) {
                tracing::error!(
                    target: "horizon_trellis::layout",
                    %err,
                    op,
                    "marshaled list operation failed"
                );
            }
        });
        if posted.is_err() {
            tracing::trace!(
                target: "horizon_trellis::layout",
                op,
                "list operation dropped: dispatcher stopped"
            );
        }
    }

    /// Marshal a batch operation, retiring pre-created identities if it
    /// fails when it finally runs.
    fn marshal_batch<F>(&self, batch: RowBatch, op: &'static str, f: F)
    where
        F: FnOnce(&Arc<ListElement>, &DispatchToken, RowBatch) -> Result<()> + Send + 'static,
    {
        let pre_ids: Vec<RowId> = batch.rows.iter().filter_map(|spec| spec.preassigned).collect();
        self.post(op, move |element, token| {
            let result = f(element, token, batch);
            if result.is_err() {
                let mut data = element.store.lock_data();
                for id in &pre_ids {
                    data.identities.remove(*id);
                }
            }
            result
        });
    }

    /// Run a batch operation now, retiring pre-created identities on
    /// failure.
    fn run_batch<F>(&self, token: &DispatchToken, batch: RowBatch, f: F) -> Result<()>
    where
        F: FnOnce(&Arc<ListElement>, &DispatchToken, RowBatch) -> Result<()>,
    {
        let pre_ids: Vec<RowId> = batch.rows.iter().filter_map(|spec| spec.preassigned).collect();
        let result = f(&self.element, token, batch);
        if result.is_err() {
            let mut data = self.element.store.lock_data();
            for id in &pre_ids {
                data.identities.remove(*id);
            }
        }
        result
    }

    /// A resort order must be a permutation of `0..order.len()`; the
    /// length itself is checked against the list when the resort runs.
    fn check_permutation(order: &[usize]) -> Result<()> {
        let mut seen = vec![false; order.len()];
        for &target in order {
            if target >= order.len() || seen[target] {
                return Err(crate::error::ListError::InvalidPermutation { rows: order.len() });
            }
            seen[target] = true;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ListLayoutManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListLayoutManager")
            .field("element", &self.element)
            .finish()
    }
}

/// An opaque, durable handle to one list row.
///
/// The handle refers to the row's identity, not its position: it stays
/// valid through renumbering and reordering. Once the row (or its list)
/// is gone, every operation becomes a benign no-op and
/// [`current_row_number`](ItemHandle::current_row_number) answers `None`.
#[derive(Clone)]
pub struct ItemHandle {
    element: Weak<ListElement>,
    id: RowId,
}

impl ItemHandle {
    /// The row's number right now, or `None` once it is gone.
    pub fn current_row_number(&self) -> Option<usize> {
        let element = self.element.upgrade()?;
        element.row_of(self.id)
    }

    /// Whether the row is currently selected.
    pub fn is_selected(&self) -> bool {
        self.element
            .upgrade()
            .and_then(|element| element.selected_of(self.id))
            .unwrap_or(false)
    }

    /// Whether the row currently accepts activation.
    pub fn is_enabled(&self) -> bool {
        self.element
            .upgrade()
            .and_then(|element| {
                let row = element.row_of(self.id)?;
                Some(element.store.lock_data().is_enabled(row))
            })
            .unwrap_or(false)
    }

    /// Set the row's selection state, bypassing the selection policy.
    pub fn set_selected(&self, selected: bool) {
        self.dispatch(move |element, token, row| {
            element.set_selected_with_token(token, row, selected).ok();
        });
    }

    /// Enable or disable the row.
    pub fn set_enabled(&self, enabled: bool) {
        self.dispatch(move |element, token, row| {
            element.set_enabled_with_token(token, row, enabled).ok();
        });
    }

    /// Activate the row through the selection policy.
    pub fn autoselect(&self) {
        self.dispatch(move |element, token, row| {
            element.autoselect_with_token(token, row).ok();
        });
    }

    /// Marshal an operation that resolves the row at execution time.
    fn dispatch<F>(&self, f: F)
    where
        F: FnOnce(&Arc<ListElement>, &DispatchToken, usize) + Send + 'static,
    {
        let Some(element) = self.element.upgrade() else {
            return;
        };
        let weak = self.element.clone();
        let id = self.id;
        element
            .dispatcher()
            .post(move |token| {
                let Some(element) = weak.upgrade() else {
                    return;
                };
                let Some(row) = element.row_of(id) else {
                    return;
                };
                f(&element, token, row);
            })
            .ok();
    }
}

impl std::fmt::Debug for ItemHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemHandle")
            .field("row", &self.current_row_number())
            .finish_non_exhaustive()
    }
}
