//! The list data store and its locking protocol.
//!
//! One [`StoreData`] holds everything a list instance knows: row records,
//! the row-major cell grid, per-column width multisets, the calculated
//! layout, and the registered callbacks. It is guarded by one mutex and
//! is the only list state touchable from any thread — read snapshots
//! ([`ListLock`]) do not round-trip through the dispatch thread.
//!
//! Mutations are cheap: they splice vectors, keep the width multisets
//! balanced, and set `row_infos_modified`. The expensive part — measuring
//! new rows, renegotiating column widths, recomputing positions and
//! metrics — is [`StoreData::recalculate`], run by the dispatch thread
//! the next time it acquires the store through
//! [`ListElement`](crate::element::ListElement). Many mutations coalesce
//! into one recalculation, and every dispatch-thread accessor observes
//! metrically consistent data.
//!
//! Application callbacks are never invoked under the lock. They are
//! queued as deferred calls on the guard and drained after the guard
//! releases the mutex; a panicking callback is caught and logged, never
//! allowed into the layout machinery.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use slotmap::SlotMap;

use horizon_trellis_core::Signal;

use crate::cell::{Cell, CellContent};
use crate::column_widths::{ColumnWidthSet, SyncAxisMember};
use crate::config::ListConfig;
use crate::host::{CellMeasure, ElementSurface};
use crate::input::KeyCombination;
use crate::item::RowSpec;
use crate::row::{RowClass, RowId, RowIdentity, RowInfo};
use crate::selection::{CurrentChangedFn, SelectionChange, SelectionChangedFn, SelectionPolicy};
use crate::style::ListStyle;
use crate::types::{HAlign, Metrics, Rect};

/// Fallback row-height estimate for an empty list's metrics.
const DEFAULT_ROW_HEIGHT: u32 = 16;

/// A callback invocation queued to run after the store lock is released.
pub(crate) type DeferredCall = Box<dyn FnOnce() + Send>;

/// Signals a list element emits alongside its closure callbacks.
pub struct ListSignals {
    /// Emitted after any row's selection state changes.
    pub selection_changed: Signal<SelectionChange>,
    /// Emitted after the current (highlighted) row changes.
    pub current_changed: Signal<Option<usize>>,
}

impl ListSignals {
    pub(crate) fn new() -> Self {
        Self {
            selection_changed: Signal::new(),
            current_changed: Signal::new(),
        }
    }
}

/// Layout constants derived from a validated [`ListConfig`], with
/// column maps shifted to actual (synthetic-inclusive) indices.
pub(crate) struct LayoutParams {
    pub real_columns: usize,
    pub leading: usize,
    pub indent_width: u32,
    pub h_padding: u32,
    pub v_padding: u32,
    /// Actual column index -> requested percentage of the list width.
    pub requested_percents: HashMap<usize, u32>,
    /// Actual column index -> horizontal alignment.
    pub alignments: HashMap<usize, HAlign>,
    pub min_rows: usize,
    pub max_rows: usize,
}

impl LayoutParams {
    pub fn from_config(config: &ListConfig) -> Self {
        let style = &*config.style;
        Self {
            real_columns: config.columns,
            leading: style.leading_columns(),
            indent_width: config.indent_width,
            h_padding: config.h_padding,
            v_padding: config.v_padding,
            requested_percents: config
                .requested_col_widths
                .iter()
                .map(|(&col, &pct)| (style.shift_column_index(col), pct))
                .collect(),
            alignments: config
                .col_alignments
                .iter()
                .map(|(&col, &align)| (style.shift_column_index(col), align))
                .collect(),
            min_rows: config.min_rows,
            max_rows: config.max_rows,
        }
    }
}

/// The mutable table behind one list instance.
pub(crate) struct StoreData {
    /// Actual column count, synthetic style columns included.
    pub columns: usize,
    pub params: LayoutParams,
    pub row_infos: Vec<RowInfo>,
    /// Row-major cell grid; `cells.len() == row_infos.len() * columns`
    /// always.
    pub cells: Vec<Cell>,
    pub identities: SlotMap<RowId, RowIdentity>,
    /// One width multiset per column, one entry per cell in the column.
    pub column_widths: Vec<ColumnWidthSet>,
    /// Raw per-column widths: each column's widest cell.
    pub calculated_column_widths: Vec<u32>,
    /// Final per-column (x, width), padded and scaled to the widget.
    pub columns_poswidths: Vec<(u32, u32)>,
    /// X offsets of the borders between columns.
    pub border_positions: Vec<u32>,
    pub row_infos_modified: bool,
    pub full_redraw_needed: bool,
    /// Total height after the last recalculation, for damage tracking.
    last_total_height: u32,
    pub selection_policy: SelectionPolicy,
    pub selection_changed: Option<SelectionChangedFn>,
    pub current_changed: Option<CurrentChangedFn>,
    pub signals: Arc<ListSignals>,
}

impl StoreData {
    pub fn new(
        columns: usize,
        params: LayoutParams,
        selection_policy: SelectionPolicy,
        signals: Arc<ListSignals>,
    ) -> Self {
        Self {
            columns,
            params,
            row_infos: Vec::new(),
            cells: Vec::new(),
            identities: SlotMap::with_key(),
            column_widths: (0..columns).map(|_| ColumnWidthSet::new()).collect(),
            calculated_column_widths: vec![0; columns],
            columns_poswidths: Vec::new(),
            border_positions: Vec::new(),
            row_infos_modified: false,
            full_redraw_needed: false,
            last_total_height: 0,
            selection_policy,
            selection_changed: None,
            current_changed: None,
            signals,
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn rows(&self) -> usize {
        self.row_infos.len()
    }

    pub fn identity(&self, row: usize) -> Option<&RowIdentity> {
        self.row_infos
            .get(row)
            .and_then(|info| self.identities.get(info.id))
    }

    pub fn is_selected(&self, row: usize) -> bool {
        self.identity(row).is_some_and(|identity| identity.selected)
    }

    pub fn is_enabled(&self, row: usize) -> bool {
        self.identity(row).is_some_and(RowIdentity::is_enabled)
    }

    pub fn all_selected(&self) -> Vec<usize> {
        self.row_infos
            .iter()
            .enumerate()
            .filter(|(_, info)| {
                self.identities
                    .get(info.id)
                    .is_some_and(|identity| identity.selected)
            })
            .map(|(row, _)| row)
            .collect()
    }

    pub fn selected_row(&self) -> Option<usize> {
        self.row_infos.iter().position(|info| {
            self.identities
                .get(info.id)
                .is_some_and(|identity| identity.selected)
        })
    }

    /// The row whose vertical extent contains `y`, if any.
    pub fn row_at_y(&self, y: u32) -> Option<usize> {
        let row = self
            .row_infos
            .partition_point(|info| info.y + info.height <= y);
        (row < self.row_infos.len() && self.row_infos[row].y <= y).then_some(row)
    }

    /// Total laid-out width of all columns.
    pub fn total_width(&self) -> u32 {
        self.columns_poswidths
            .last()
            .map(|&(x, width)| x + width)
            .unwrap_or(0)
    }

    /// Total laid-out height of all rows.
    pub fn total_height(&self) -> u32 {
        self.row_infos
            .last()
            .map(|info| info.y + info.height)
            .unwrap_or(0)
    }

    /// The full-width rectangle of one row, for damage regions.
    pub fn row_rect(&self, row: usize, min_width: u32) -> Rect {
        let Some(info) = self.row_infos.get(row) else {
            return Rect::ZERO;
        };
        Rect::new(
            0,
            info.y as i32,
            self.total_width().max(min_width),
            info.height,
        )
    }

    // -------------------------------------------------------------------------
    // Width tracking
    // -------------------------------------------------------------------------

    fn cell_index(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }

    /// A cell's width contribution: its natural width, plus the row's
    /// indentation if the cell starts the data columns.
    fn effective_cell_width(&self, column: usize, indent: usize, natural: u32) -> u32 {
        let indent_extra = if column == self.params.leading {
            indent as u32 * self.params.indent_width
        } else {
            0
        };
        natural + indent_extra
    }

    fn link_cell(&mut self, row: usize, column: usize, width: u32) {
        let index = self.cell_index(row, column);
        debug_assert!(self.cells[index].recorded_width.is_none());
        self.column_widths[column].insert(width);
        self.cells[index].recorded_width = Some(width);
    }

    fn unlink_cell(&mut self, row: usize, column: usize) {
        let index = self.cell_index(row, column);
        if let Some(width) = self.cells[index].recorded_width.take() {
            self.column_widths[column].remove(width);
        }
    }

    /// Re-record a whole row's width contributions from its cells'
    /// cached sizes.
    pub fn relink_row(&mut self, row: usize) {
        let indent = self.row_infos[row].indent;
        for column in 0..self.columns {
            self.unlink_cell(row, column);
            let natural = self.cells[self.cell_index(row, column)].cached_size().width;
            let width = self.effective_cell_width(column, indent, natural);
            self.link_cell(row, column, width);
        }
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Splice a validated batch of rows in at `at`.
    ///
    /// Returns the new rows' identities, in order.
    pub fn insert_rows(&mut self, style: &dyn ListStyle, at: usize, rows: Vec<RowSpec>) -> Vec<RowId> {
        let mut new_ids = Vec::with_capacity(rows.len());
        let mut new_infos = Vec::with_capacity(rows.len());
        let mut new_cells = Vec::with_capacity(rows.len() * self.columns);

        for spec in rows {
            let mut full_cells = style.leading_cells(&spec.meta);
            full_cells.extend(spec.cells);
            full_cells.extend(style.trailing_cells(&spec.meta));
            assert_eq!(
                full_cells.len(),
                self.columns,
                "style produced a row of {} cell(s) for a {}-column list",
                full_cells.len(),
                self.columns,
            );

            let selected = spec.meta.initially_selected && spec.meta.class == RowClass::Enabled;
            let id = match spec.preassigned {
                Some(id) if self.identities.contains_key(id) => id,
                _ => self.identities.insert(RowIdentity::unplaced()),
            };
            {
                let identity = &mut self.identities[id];
                identity.selected = selected;
                identity.class = spec.meta.class;
                identity.status_callback = spec.meta.status_callback.clone();
                identity.shortcut = spec.meta.shortcut;
                identity.menu_item = spec.meta.menu_item.clone();
            }

            new_ids.push(id);
            new_infos.push(RowInfo::new(id, spec.meta.indent));
            new_cells.extend(full_cells);
        }

        self.row_infos.splice(at..at, new_infos);
        self.cells
            .splice(at * self.columns..at * self.columns, new_cells);

        // Record the new cells' (still unmeasured) width contributions so
        // the multisets stay one-entry-per-cell at all times.
        for row in at..at + new_ids.len() {
            let indent = self.row_infos[row].indent;
            for column in 0..self.columns {
                let natural = self.cells[self.cell_index(row, column)].cached_size().width;
                let width = self.effective_cell_width(column, indent, natural);
                self.link_cell(row, column, width);
            }
        }

        self.row_infos_modified = true;
        self.check_consistency();
        tracing::trace!(
            target: "horizon_trellis::store",
            at,
            count = new_ids.len(),
            rows = self.rows(),
            "rows inserted"
        );
        new_ids
    }

    /// Remove `count` rows starting at `at`.
    ///
    /// Returns the removed identities with their installed shortcuts, so
    /// the caller can uninstall them from the global shortcut table.
    pub fn remove_rows(&mut self, at: usize, count: usize) -> Vec<(RowId, Option<KeyCombination>)> {
        for row in at..at + count {
            for column in 0..self.columns {
                self.unlink_cell(row, column);
            }
        }

        let removed: Vec<(RowId, Option<KeyCombination>)> = self
            .row_infos
            .drain(at..at + count)
            .map(|info| {
                let shortcut = self
                    .identities
                    .remove(info.id)
                    .and_then(|identity| identity.shortcut);
                (info.id, shortcut)
            })
            .collect();
        self.cells
            .drain(at * self.columns..(at + count) * self.columns);

        self.row_infos_modified = true;
        self.check_consistency();
        tracing::trace!(
            target: "horizon_trellis::store",
            at,
            count,
            rows = self.rows(),
            "rows removed"
        );
        removed
    }

    /// Reorder rows so the row at old index `i` lands at `order[i]`,
    /// as if the order vector were sorted. The caller has validated the
    /// permutation.
    pub fn resort_rows(&mut self, order: &[usize]) {
        debug_assert_eq!(order.len(), self.rows());

        let old_infos = std::mem::take(&mut self.row_infos);
        let mut new_infos: Vec<Option<RowInfo>> = (0..old_infos.len()).map(|_| None).collect();

        let mut old_cells: Vec<Vec<Cell>> = Vec::with_capacity(old_infos.len());
        for _ in 0..old_infos.len() {
            let rest = self.cells.split_off(self.cells.len() - self.columns);
            old_cells.push(rest);
        }
        old_cells.reverse();
        let mut new_cells: Vec<Option<Vec<Cell>>> = (0..old_cells.len()).map(|_| None).collect();

        for (from, (info, cells)) in old_infos.into_iter().zip(old_cells).enumerate() {
            let to = order[from];
            new_infos[to] = Some(info);
            new_cells[to] = Some(cells);
        }

        self.row_infos
            .extend(new_infos.into_iter().map(Option::unwrap));
        for cells in new_cells {
            self.cells.extend(cells.unwrap());
        }

        // Width multisets are untouched: every cell keeps its recorded
        // width, it just moved to a different row index.
        self.row_infos_modified = true;
        self.check_consistency();
    }

    /// Drop every cached cell size and relayout from scratch, for theme
    /// and font changes.
    pub fn invalidate_all_sizes(&mut self) {
        for cell in &mut self.cells {
            cell.invalidate_size();
        }
        for row in 0..self.rows() {
            self.relink_row(row);
            self.row_infos[row].size_computed = false;
        }
        self.row_infos_modified = true;
        self.full_redraw_needed = true;
    }

    /// The fatal internal-consistency trap: the cell grid must match the
    /// row records at every mutation boundary.
    pub fn check_consistency(&self) {
        assert_eq!(
            self.cells.len(),
            self.row_infos.len() * self.columns,
            "cell grid out of step: {} cell(s) for {} row(s) x {} column(s)",
            self.cells.len(),
            self.row_infos.len(),
            self.columns,
        );
    }

    // -------------------------------------------------------------------------
    // Notification queueing
    // -------------------------------------------------------------------------

    pub fn queue_selection_signal(&self, deferred: &mut Vec<DeferredCall>, change: SelectionChange) {
        let signals = self.signals.clone();
        deferred.push(Box::new(move || {
            signals.selection_changed.emit(change);
        }));
    }

    // -------------------------------------------------------------------------
    // Recalculation
    // -------------------------------------------------------------------------

    /// Run [`recalculate`](Self::recalculate) if any mutation happened
    /// since the last pass.
    pub fn recalculate_if_modified(
        &mut self,
        measure: &dyn CellMeasure,
        axis: Option<&SyncAxisMember>,
        surface: &dyn ElementSurface,
    ) {
        if self.row_infos_modified || self.full_redraw_needed {
            self.recalculate(measure, axis, surface);
        }
    }

    /// Rebuild the layout from the current row contents:
    ///
    /// 1. measure rows whose sizes are unknown,
    /// 2. recompute per-column widths from the multisets,
    /// 3. reconcile with the synchronized axis,
    /// 4. compute padded (x, width) pairs scaled to the widget width,
    /// 5. recompute row heights and y offsets (and cached row numbers),
    /// 6. publish metrics,
    /// 7. schedule a redraw of the shifted region only.
    pub fn recalculate(
        &mut self,
        measure: &dyn CellMeasure,
        axis: Option<&SyncAxisMember>,
        surface: &dyn ElementSurface,
    ) {
        self.row_infos_modified = false;

        // Rows never placed before damage from their new position only;
        // their stored y is meaningless.
        let fresh: Vec<bool> = self
            .row_infos
            .iter()
            .map(|info| !info.size_computed)
            .collect();

        // 1. Measure rows the dispatch thread has not seen yet.
        for row in 0..self.rows() {
            if self.row_infos[row].size_computed {
                continue;
            }
            let indent = self.row_infos[row].indent;
            let mut height = 0u32;
            for column in 0..self.columns {
                let hint = self
                    .calculated_column_widths
                    .get(column)
                    .copied()
                    .filter(|&width| width > 0);
                let index = self.cell_index(row, column);
                let size = self.cells[index].measure(measure, hint);
                height = height.max(size.height);

                self.unlink_cell(row, column);
                let width = self.effective_cell_width(column, indent, size.width);
                self.link_cell(row, column, width);
            }
            let info = &mut self.row_infos[row];
            info.height = height + 2 * self.params.v_padding;
            info.size_computed = true;
        }

        // 2. Per-column width: the widest recorded cell.
        for column in 0..self.columns {
            self.calculated_column_widths[column] =
                self.column_widths[column].widest().unwrap_or(0);
        }

        // 3. The widest width across all synchronized instances wins.
        if let Some(member) = axis {
            member.publish(&self.calculated_column_widths);
            for (column, negotiated) in member.negotiated().into_iter().enumerate() {
                if column < self.columns
                    && negotiated > self.calculated_column_widths[column]
                {
                    self.calculated_column_widths[column] = negotiated;
                }
            }
        }

        // 4. Positions and widths, scaled to the widget's actual width.
        self.compute_poswidths(surface.width());

        // 5. Row offsets, plus the cached row numbers durable identities
        // report.
        let mut y = 0u32;
        let mut first_shifted: Option<u32> = None;
        for row in 0..self.rows() {
            let info = &mut self.row_infos[row];
            if info.y != y {
                let from = if fresh[row] { y } else { y.min(info.y) };
                first_shifted = Some(first_shifted.map_or(from, |f| f.min(from)));
                info.y = y;
            }
            y += info.height;
            let id = info.id;
            if let Some(identity) = self.identities.get_mut(id) {
                identity.row_number = row;
            }
        }
        let total_height = y;

        // 6. Reported metrics.
        let total_width = self.total_width();
        let rows = self.rows();
        let estimate = if rows > 0 {
            (total_height / rows as u32).max(1)
        } else {
            DEFAULT_ROW_HEIGHT
        };
        let vertical_min = estimate * self.params.min_rows as u32;
        let vertical_max = estimate * self.params.max_rows as u32;
        let preferred = total_height.clamp(vertical_min, vertical_max.max(vertical_min));
        let vertical = Metrics::new(
            vertical_min.min(preferred),
            preferred,
            vertical_max.max(preferred),
        );
        let horizontal = Metrics::new(total_width, total_width, u32::MAX);
        surface.metrics_updated(horizontal, vertical);

        // 7. Damage only what moved, unless a full redraw was requested.
        let width = total_width.max(surface.width());
        if self.full_redraw_needed {
            self.full_redraw_needed = false;
            surface.schedule_redraw(Rect::new(0, 0, width, total_height.max(self.last_total_height)));
        } else {
            let shrank_or_grew = total_height != self.last_total_height;
            let damage_from = match (first_shifted, shrank_or_grew) {
                (Some(from), _) => Some(from.min(total_height.min(self.last_total_height))),
                (None, true) => Some(total_height.min(self.last_total_height)),
                (None, false) => None,
            };
            if let Some(from) = damage_from {
                let to = total_height.max(self.last_total_height);
                surface.schedule_redraw(Rect::new(0, from as i32, width, to - from));
            }
        }
        self.last_total_height = total_height;

        tracing::trace!(
            target: "horizon_trellis::store",
            rows,
            total_width,
            total_height,
            "recalculated"
        );
    }

    fn compute_poswidths(&mut self, target: u32) {
        let columns = self.columns;
        let mut widths: Vec<u32> = (0..columns)
            .map(|column| self.calculated_column_widths[column] + 2 * self.params.h_padding)
            .collect();

        if target > 0 {
            // Columns with a requested percentage treat it as a minimum
            // share of the actual width.
            for (&column, &percent) in &self.params.requested_percents {
                widths[column] = widths[column].max(percent * target / 100);
            }

            let sum: u32 = widths.iter().sum();
            if target > sum {
                // Extra space goes to the percentage columns, or to
                // everyone when no column asked.
                let mut recipients: Vec<usize> = if self.params.requested_percents.is_empty() {
                    (0..columns).collect()
                } else {
                    let mut cols: Vec<usize> =
                        self.params.requested_percents.keys().copied().collect();
                    cols.sort_unstable();
                    cols
                };
                if recipients.is_empty() {
                    recipients.push(0);
                }
                let extra = target - sum;
                let share = extra / recipients.len() as u32;
                let remainder = extra % recipients.len() as u32;
                for (i, column) in recipients.into_iter().enumerate() {
                    widths[column] += share + u32::from((i as u32) < remainder);
                }
            } else if target < sum {
                // Shortfall comes out of the columns without an explicit
                // width request, left to right.
                let mut shortfall = sum - target;
                for (column, width) in widths.iter_mut().enumerate() {
                    if shortfall == 0 {
                        break;
                    }
                    if self.params.requested_percents.contains_key(&column) {
                        continue;
                    }
                    let take = (*width).min(shortfall);
                    *width -= take;
                    shortfall -= take;
                }
            }
        }

        self.columns_poswidths.clear();
        self.border_positions.clear();
        let mut x = 0u32;
        for (column, width) in widths.into_iter().enumerate() {
            if column > 0 {
                self.border_positions.push(x);
            }
            self.columns_poswidths.push((x, width));
            x += width;
        }
    }
}

/// The mutex-wrapped store one list element owns.
pub(crate) struct ListStore {
    data: Mutex<StoreData>,
}

impl ListStore {
    pub fn new(data: StoreData) -> Self {
        Self {
            data: Mutex::new(data),
        }
    }

    pub fn lock_data(&self) -> MutexGuard<'_, StoreData> {
        self.data.lock()
    }
}

/// Run deferred callbacks after the lock is released, isolating the
/// layout machinery from panicking application code.
pub(crate) fn run_deferred(calls: Vec<DeferredCall>) {
    for call in calls {
        if let Err(panic) = std::panic::catch_unwind(std::panic::AssertUnwindSafe(call)) {
            let message = panic
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("non-string panic payload");
            tracing::error!(
                target: "horizon_trellis::store",
                "list callback panicked: {message}"
            );
        }
    }
}

/// Dispatch-thread write access to the store, with the deferred
/// notification queue. Dropping the guard releases the mutex first,
/// then runs the queued notifications.
pub(crate) struct StoreGuard<'a> {
    data: Option<MutexGuard<'a, StoreData>>,
    pub deferred: Vec<DeferredCall>,
}

impl<'a> StoreGuard<'a> {
    pub fn new(data: MutexGuard<'a, StoreData>) -> Self {
        Self {
            data: Some(data),
            deferred: Vec::new(),
        }
    }

    /// Borrow the store and the deferred queue together for a selection
    /// policy invocation.
    pub fn selection_editor<'g>(
        &'g mut self,
        style: &'g dyn ListStyle,
        surface: &'g Arc<dyn ElementSurface>,
        source: crate::row::ActivationSource,
    ) -> crate::selection::SelectionEditor<'g> {
        let data = self.data.as_mut().expect("store guard already released");
        crate::selection::SelectionEditor::new(&mut **data, style, surface, &mut self.deferred, source)
    }

    /// Queue the current-item-changed notifications.
    pub fn queue_current_notifications(&mut self, current: Option<usize>) {
        let data = self.data.as_ref().expect("store guard already released");
        let callback = data.current_changed.clone();
        let signals = data.signals.clone();
        if let Some(callback) = callback {
            self.deferred.push(Box::new(move || callback(current)));
        }
        self.deferred.push(Box::new(move || {
            signals.current_changed.emit(current);
        }));
    }

    /// Queue a redraw of a region after the lock is released.
    pub fn queue_redraw(&mut self, surface: &Arc<dyn ElementSurface>, region: Rect) {
        if region.is_empty() {
            return;
        }
        let surface = surface.clone();
        self.deferred
            .push(Box::new(move || surface.schedule_redraw(region)));
    }
}

impl std::ops::Deref for StoreGuard<'_> {
    type Target = StoreData;

    fn deref(&self) -> &StoreData {
        self.data.as_ref().expect("store guard already released")
    }
}

impl std::ops::DerefMut for StoreGuard<'_> {
    fn deref_mut(&mut self) -> &mut StoreData {
        self.data.as_mut().expect("store guard already released")
    }
}

impl Drop for StoreGuard<'_> {
    fn drop(&mut self) {
        let calls = std::mem::take(&mut self.deferred);
        self.data.take();
        run_deferred(calls);
    }
}

/// A consistent read snapshot of a list, acquirable from any thread.
///
/// Holding the lock blocks the dispatch thread from mutating the list,
/// so several queries observe one state. Keep the hold time short: a
/// long-held lock stalls the UI.
pub struct ListLock<'a> {
    data: MutexGuard<'a, StoreData>,
}

impl<'a> ListLock<'a> {
    pub(crate) fn new(data: MutexGuard<'a, StoreData>) -> Self {
        Self { data }
    }

    /// Number of rows.
    pub fn size(&self) -> usize {
        self.data.rows()
    }

    /// Number of data columns (synthetic style columns not counted).
    pub fn columns(&self) -> usize {
        self.data.params.real_columns
    }

    /// Whether a row is selected. Out-of-range rows report `false`.
    pub fn selected(&self, row: usize) -> bool {
        self.data.is_selected(row)
    }

    /// The first selected row, if any — *the* selection under the
    /// single and single-optional policies.
    pub fn selected_row(&self) -> Option<usize> {
        self.data.selected_row()
    }

    /// All selected rows, ascending.
    pub fn all_selected(&self) -> Vec<usize> {
        self.data.all_selected()
    }

    /// Whether a row accepts activation. Separators and out-of-range
    /// rows report `false`.
    pub fn enabled(&self, row: usize) -> bool {
        self.data.is_enabled(row)
    }

    /// The calculated raw column widths, synthetic columns included.
    ///
    /// Metrically consistent when read on the dispatch thread; other
    /// threads may observe widths one recalculation behind the rows.
    pub fn calculated_column_widths(&self) -> &[u32] {
        &self.data.calculated_column_widths
    }

    /// The content of one cell, by actual column index (the style's
    /// synthetic columns count). `None` for out-of-range positions.
    pub fn cell_content(&self, row: usize, column: usize) -> Option<&CellContent> {
        if row >= self.data.rows() || column >= self.data.columns {
            return None;
        }
        Some(self.data.cells[row * self.data.columns + column].content())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::RowBatch;
    use crate::selection;
    use crate::style;
    use crate::types::Size;

    struct FixedMeasure;

    impl CellMeasure for FixedMeasure {
        fn text_size(&self, text: &str, _width_hint: Option<u32>) -> Size {
            Size::new(8 * text.chars().count() as u32, 16)
        }

        fn image_size(&self, _name: &str) -> Size {
            Size::new(12, 12)
        }
    }

    #[derive(Default)]
    struct NullSurface;

    impl ElementSurface for NullSurface {
        fn width(&self) -> u32 {
            0
        }

        fn schedule_redraw(&self, _region: Rect) {}

        fn metrics_updated(&self, _horizontal: Metrics, _vertical: Metrics) {}
    }

    fn store(columns: usize) -> StoreData {
        let config = ListConfig::new(columns).with_padding(0, 0);
        StoreData::new(
            config.style().actual_columns(columns),
            LayoutParams::from_config(&config),
            selection::single(),
            Arc::new(ListSignals::new()),
        )
    }

    fn batch(columns: usize, values: &[&str]) -> Vec<RowSpec> {
        let style = style::highlighted();
        RowBatch::build(
            &*style,
            columns,
            values.iter().map(|v| (*v).into()).collect(),
        )
        .unwrap()
        .rows
    }

    #[test]
    fn test_cell_grid_invariant_across_mutations() {
        let style = style::highlighted();
        let mut data = store(2);

        data.insert_rows(&*style, 0, batch(2, &["a", "b", "c", "d"]));
        assert_eq!(data.rows(), 2);
        assert_eq!(data.cells.len(), 4);

        data.insert_rows(&*style, 1, batch(2, &["e", "f"]));
        assert_eq!(data.rows(), 3);
        assert_eq!(data.cells.len(), 6);

        data.remove_rows(0, 2);
        assert_eq!(data.rows(), 1);
        assert_eq!(data.cells.len(), 2);
        assert_eq!(data.column_widths[0].len(), 1);
        assert_eq!(data.column_widths[1].len(), 1);
    }

    #[test]
    fn test_recalculate_measures_and_positions() {
        let style = style::highlighted();
        let mut data = store(1);
        data.insert_rows(&*style, 0, batch(1, &["aa", "eeee"]));

        assert!(data.row_infos_modified);
        data.recalculate(&FixedMeasure, None, &NullSurface);
        assert!(!data.row_infos_modified);

        assert_eq!(data.calculated_column_widths, vec![32]);
        assert_eq!(data.row_infos[0].y, 0);
        assert_eq!(data.row_infos[0].height, 16);
        assert_eq!(data.row_infos[1].y, 16);
        assert_eq!(data.total_height(), 32);
        assert_eq!(data.columns_poswidths, vec![(0, 32)]);
    }

    #[test]
    fn test_column_width_shrinks_when_widest_removed() {
        let style = style::highlighted();
        let mut data = store(1);
        data.insert_rows(&*style, 0, batch(1, &["short", "the longest row", "mid"]));
        data.recalculate(&FixedMeasure, None, &NullSurface);
        assert_eq!(data.calculated_column_widths[0], 8 * 15);

        data.remove_rows(1, 1);
        data.recalculate(&FixedMeasure, None, &NullSurface);
        assert_eq!(data.calculated_column_widths[0], 8 * 5);
    }

    #[test]
    fn test_row_numbers_refresh_after_removal() {
        let style = style::highlighted();
        let mut data = store(1);
        data.insert_rows(&*style, 0, batch(1, &["a", "b", "c", "d", "e"]));
        data.recalculate(&FixedMeasure, None, &NullSurface);

        let id = data.row_infos[3].id;
        assert_eq!(data.identities[id].row_number, 3);

        data.remove_rows(2, 1);
        data.recalculate(&FixedMeasure, None, &NullSurface);
        assert_eq!(data.identities[id].row_number, 2);
    }

    #[test]
    fn test_resort_moves_identities_with_rows() {
        let style = style::highlighted();
        let mut data = store(1);
        data.insert_rows(&*style, 0, batch(1, &["A", "B", "C"]));
        data.recalculate(&FixedMeasure, None, &NullSurface);
        let id_a = data.row_infos[0].id;

        // As if [2, 0, 1] were sorted: A goes to index 2, B to 0, C to 1.
        data.resort_rows(&[2, 0, 1]);
        data.recalculate(&FixedMeasure, None, &NullSurface);

        assert_eq!(data.row_infos[2].id, id_a);
        assert_eq!(data.identities[id_a].row_number, 2);
        let texts: Vec<_> = (0..3)
            .map(|row| match data.cells[row].content() {
                crate::cell::CellContent::Text(text) => text.clone(),
                other => panic!("unexpected cell {other:?}"),
            })
            .collect();
        assert_eq!(texts, vec!["B", "C", "A"]);
    }

    #[test]
    fn test_row_at_y() {
        let style = style::highlighted();
        let mut data = store(1);
        data.insert_rows(&*style, 0, batch(1, &["a", "b", "c"]));
        data.recalculate(&FixedMeasure, None, &NullSurface);

        assert_eq!(data.row_at_y(0), Some(0));
        assert_eq!(data.row_at_y(15), Some(0));
        assert_eq!(data.row_at_y(16), Some(1));
        assert_eq!(data.row_at_y(47), Some(2));
        assert_eq!(data.row_at_y(48), None);
    }

    #[test]
    fn test_shortfall_spares_requested_columns() {
        let style = style::highlighted();
        let config = ListConfig::new(2)
            .with_padding(0, 0)
            .with_requested_col_width(1, 50);
        let mut data = StoreData::new(
            2,
            LayoutParams::from_config(&config),
            selection::single(),
            Arc::new(ListSignals::new()),
        );
        data.insert_rows(&*style, 0, batch(2, &["aaaaaaaaaa", "bb"]));

        struct NarrowSurface;
        impl ElementSurface for NarrowSurface {
            fn width(&self) -> u32 {
                60
            }
            fn schedule_redraw(&self, _region: Rect) {}
            fn metrics_updated(&self, _h: Metrics, _v: Metrics) {}
        }

        data.recalculate(&FixedMeasure, None, &NarrowSurface);
        // Column 1 asked for 50% of 60 = 30 and keeps it; the shortfall
        // comes out of column 0 (natural 80).
        assert_eq!(data.columns_poswidths[1].1, 30);
        assert_eq!(data.columns_poswidths[0].1, 30);
    }

    #[test]
    #[should_panic(expected = "cell grid out of step")]
    fn test_consistency_trap() {
        let style = style::highlighted();
        let mut data = store(1);
        data.insert_rows(&*style, 0, batch(1, &["a"]));
        data.cells.push(Cell::empty());
        data.check_consistency();
    }
}
