//! The list element implementation.
//!
//! [`ListElement`] is the widget-facing façade over the list data store.
//! It owns the store, the host service handles, and the navigation state,
//! and it implements everything the layout manager and the host widget
//! need: row mutation, the selection engine, keyboard and pointer
//! handling, the submenu hover debounce, and drawing.
//!
//! Every dispatch-thread entry point goes through [`ListElement::grab`],
//! which composes lock acquisition with the deferred recalculation pass:
//! if any mutation happened since the last pass, the layout is rebuilt
//! before the caller sees the data. Accessors therefore never observe a
//! structurally valid but metrically stale store.
//!
//! # Current element
//!
//! The *current* row — the one highlighted under the pointer or the
//! keyboard cursor — is tracked by durable [`RowId`], not by position, so
//! it travels with its row through renumbering. Requests to change it may
//! arrive from any thread ([`request_current`](ListElement::request_current)
//! records the wish and posts a reconciliation); the authoritative state
//! advances only on the dispatch thread, in
//! [`reconcile_current`](ListElement::reconcile_current), which every
//! mutation path that can renumber rows runs before releasing the store.

use std::sync::Arc;
use std::time::Duration;

use horizon_trellis_core::{DispatchToken, Dispatcher, TimerId};
use parking_lot::Mutex;

use crate::column_widths::{SyncAxis, SyncAxisMember};
use crate::config::ListConfig;
use crate::error::{ListError, Result};
use crate::host::{CellMeasure, CellPainter, Color, ElementSurface, ThemeLookup, tokens};
use crate::input::{Key, KeyboardModifiers};
use crate::item::RowBatch;
use crate::row::{ActivationSource, RowClass, RowId};
use crate::shortcut::ShortcutRegistry;
use crate::store::{ListSignals, ListStore, StoreData, StoreGuard};
use crate::style::ListStyle;
use crate::types::{HAlign, Rect, VAlign};

/// Theme values the draw path needs, resolved once per theme.
#[derive(Clone, Copy)]
struct ThemePalette {
    background: Color,
    highlight: Color,
    current: Color,
    foreground: Color,
    disabled: Color,
    border: Color,
    border_width: u32,
}

impl ThemePalette {
    fn resolve(theme: &dyn ThemeLookup) -> Self {
        Self {
            background: theme.color(tokens::BACKGROUND),
            highlight: theme.color(tokens::HIGHLIGHT),
            current: theme.color(tokens::CURRENT),
            foreground: theme.color(tokens::FOREGROUND),
            disabled: theme.color(tokens::DISABLED),
            border: theme.color(tokens::BORDER),
            border_width: theme.border_width(tokens::BORDER_WIDTH),
        }
    }
}

/// Keyboard/pointer navigation state.
///
/// `current` is authoritative and only advances on the dispatch thread.
/// `pending` is the eventually-consistent "what should be current"
/// request, writable from anywhere; the next reconciliation consumes it.
#[derive(Default)]
struct NavState {
    current: Option<RowId>,
    pending: Option<Option<RowId>>,
    /// The row number last reported through the current-changed
    /// notifications, for change detection across renumbering.
    reported: Option<usize>,
    /// Pending submenu hover debounce, and the row it was armed for.
    hover_timer: Option<TimerId>,
    hover_target: Option<RowId>,
}

/// One list widget instance: the data store plus everything needed to
/// mutate, navigate, and draw it.
pub struct ListElement {
    pub(crate) store: ListStore,
    style: Arc<dyn ListStyle>,
    real_columns: usize,
    measure: Arc<dyn CellMeasure>,
    surface: Arc<dyn ElementSurface>,
    theme: Arc<dyn ThemeLookup>,
    palette: Mutex<ThemePalette>,
    dispatcher: Dispatcher,
    shortcuts: Arc<ShortcutRegistry>,
    axis: Option<SyncAxisMember>,
    hover_action_delay: Duration,
    nav: Mutex<NavState>,
    signals: Arc<ListSignals>,
}

impl ListElement {
    /// Build an element from a validated configuration and the host's
    /// services.
    pub fn new(
        config: ListConfig,
        measure: Arc<dyn CellMeasure>,
        surface: Arc<dyn ElementSurface>,
        theme: Arc<dyn ThemeLookup>,
        dispatcher: Dispatcher,
        shortcuts: Arc<ShortcutRegistry>,
    ) -> Result<Arc<Self>> {
        config.validate()?;
        let style = config.style.clone();
        let columns = style.actual_columns(config.columns);
        let signals = Arc::new(ListSignals::new());
        let data = StoreData::new(
            columns,
            crate::store::LayoutParams::from_config(&config),
            config.selection_policy.clone(),
            signals.clone(),
        );
        let palette = ThemePalette::resolve(&*theme);
        Ok(Arc::new(Self {
            store: ListStore::new(data),
            real_columns: config.columns,
            axis: config.synchronized_axis.as_ref().map(SyncAxis::join),
            hover_action_delay: config.hover_action_delay,
            style,
            measure,
            surface,
            theme,
            palette: Mutex::new(palette),
            dispatcher,
            shortcuts,
            nav: Mutex::new(NavState::default()),
            signals,
        }))
    }

    /// The style this element was built with.
    pub fn style(&self) -> &Arc<dyn ListStyle> {
        &self.style
    }

    /// The data column count.
    pub fn columns(&self) -> usize {
        self.real_columns
    }

    /// Number of rows. Callable from any thread.
    pub fn rows(&self) -> usize {
        self.store.lock_data().rows()
    }

    pub(crate) fn signals(&self) -> &Arc<ListSignals> {
        &self.signals
    }

    pub(crate) fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Acquire the store for dispatch-thread work, recalculating first if
    /// any mutation happened since the last pass.
    pub(crate) fn grab(&self, _token: &DispatchToken) -> StoreGuard<'_> {
        let mut data = self.store.lock_data();
        data.recalculate_if_modified(&*self.measure, self.axis.as_ref(), &*self.surface);
        StoreGuard::new(data)
    }

    fn position_of(data: &StoreData, id: RowId) -> Option<usize> {
        data.row_infos.iter().position(|info| info.id == id)
    }

    /// The row number a durable identity currently occupies, if it is
    /// still placed. Callable from any thread.
    pub(crate) fn row_of(&self, id: RowId) -> Option<usize> {
        let data = self.store.lock_data();
        Self::position_of(&data, id)
    }

    /// A durable identity's selection state; `None` once it is gone.
    pub(crate) fn selected_of(&self, id: RowId) -> Option<bool> {
        let data = self.store.lock_data();
        data.identities.get(id).map(|identity| identity.selected)
    }

    // -------------------------------------------------------------------------
    // Row mutation
    // -------------------------------------------------------------------------

    pub(crate) fn insert_batch(
        self: &Arc<Self>,
        token: &DispatchToken,
        at: usize,
        batch: RowBatch,
    ) -> Result<Vec<RowId>> {
        let mut guard = self.grab(token);
        let rows = guard.rows();
        if at > rows {
            return Err(ListError::RowOutOfRange { index: at, rows });
        }
        let ids = guard.insert_rows(&*self.style, at, batch.rows);
        self.install_shortcuts(&guard, &ids);
        self.reconcile_current(token, &mut guard);
        Ok(ids)
    }

    pub(crate) fn remove_rows(
        self: &Arc<Self>,
        token: &DispatchToken,
        at: usize,
        count: usize,
    ) -> Result<()> {
        let mut guard = self.grab(token);
        let rows = guard.rows();
        if count == 0 {
            return Ok(());
        }
        if at >= rows || count > rows - at {
            return Err(ListError::RangeOutOfRange {
                index: at,
                count,
                rows,
            });
        }
        for (id, shortcut) in guard.remove_rows(at, count) {
            if shortcut.is_some() {
                self.shortcuts.uninstall(self, id);
            }
        }
        self.reconcile_current(token, &mut guard);
        Ok(())
    }

    /// Replace the row at `at` with the batch's rows.
    pub(crate) fn replace_batch(
        self: &Arc<Self>,
        token: &DispatchToken,
        at: usize,
        batch: RowBatch,
    ) -> Result<Vec<RowId>> {
        let mut guard = self.grab(token);
        let rows = guard.rows();
        if at >= rows {
            return Err(ListError::RowOutOfRange { index: at, rows });
        }
        for (id, shortcut) in guard.remove_rows(at, 1) {
            if shortcut.is_some() {
                self.shortcuts.uninstall(self, id);
            }
        }
        let ids = guard.insert_rows(&*self.style, at, batch.rows);
        self.install_shortcuts(&guard, &ids);
        self.reconcile_current(token, &mut guard);
        Ok(ids)
    }

    pub(crate) fn replace_all_batch(
        self: &Arc<Self>,
        token: &DispatchToken,
        batch: RowBatch,
    ) -> Vec<RowId> {
        let mut guard = self.grab(token);
        let rows = guard.rows();
        for (id, shortcut) in guard.remove_rows(0, rows) {
            if shortcut.is_some() {
                self.shortcuts.uninstall(self, id);
            }
        }
        let ids = guard.insert_rows(&*self.style, 0, batch.rows);
        self.install_shortcuts(&guard, &ids);
        self.reconcile_current(token, &mut guard);
        ids
    }

    /// Reorder rows so the row at old index `i` lands at `order[i]`.
    ///
    /// The order vector must be a permutation of `0..rows`; anything else
    /// is rejected before any row moves.
    pub(crate) fn resort(
        self: &Arc<Self>,
        token: &DispatchToken,
        order: &[usize],
    ) -> Result<()> {
        let mut guard = self.grab(token);
        let rows = guard.rows();
        if order.len() != rows {
            return Err(ListError::InvalidPermutation { rows });
        }
        let mut seen = vec![false; rows];
        for &target in order {
            if target >= rows || seen[target] {
                return Err(ListError::InvalidPermutation { rows });
            }
            seen[target] = true;
        }
        guard.resort_rows(order);
        self.reconcile_current(token, &mut guard);
        Ok(())
    }

    fn install_shortcuts(self: &Arc<Self>, guard: &StoreGuard<'_>, ids: &[RowId]) {
        for &id in ids {
            if let Some(combo) = guard.identities.get(id).and_then(|identity| identity.shortcut) {
                self.shortcuts.install(combo, self, id);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Selection
    // -------------------------------------------------------------------------

    fn run_policy(&self, guard: &mut StoreGuard<'_>, row: usize, source: ActivationSource) {
        let policy = guard.selection_policy.clone();
        let mut editor = guard.selection_editor(&*self.style, &self.surface, source);
        policy(&mut editor, row);
    }

    /// Activate a row exactly as a pointer click or keyboard Enter would,
    /// running the installed selection-type policy.
    pub fn autoselect_with_token(
        self: &Arc<Self>,
        token: &DispatchToken,
        row: usize,
    ) -> Result<()> {
        let mut guard = self.grab(token);
        let rows = guard.rows();
        if row >= rows {
            return Err(ListError::RowOutOfRange { index: row, rows });
        }
        self.run_policy(&mut guard, row, ActivationSource::Api);
        Ok(())
    }

    /// Set a row's selection state directly, bypassing the policy.
    pub fn set_selected_with_token(
        self: &Arc<Self>,
        token: &DispatchToken,
        row: usize,
        selected: bool,
    ) -> Result<()> {
        let mut guard = self.grab(token);
        let rows = guard.rows();
        if row >= rows {
            return Err(ListError::RowOutOfRange { index: row, rows });
        }
        let mut editor =
            guard.selection_editor(&*self.style, &self.surface, ActivationSource::Api);
        if selected {
            editor.select(row);
        } else {
            editor.unselect(row);
        }
        Ok(())
    }

    /// Enable or disable a row. Separator rows are left alone.
    pub fn set_enabled_with_token(
        self: &Arc<Self>,
        token: &DispatchToken,
        row: usize,
        enabled: bool,
    ) -> Result<()> {
        let mut guard = self.grab(token);
        let rows = guard.rows();
        if row >= rows {
            return Err(ListError::RowOutOfRange { index: row, rows });
        }
        let id = guard.row_infos[row].id;
        let width = self.surface.width();
        let Some(identity) = guard.identities.get_mut(id) else {
            return Ok(());
        };
        if identity.class == RowClass::Separator {
            return Ok(());
        }
        let class = if enabled {
            RowClass::Enabled
        } else {
            RowClass::Disabled
        };
        if identity.class != class {
            identity.class = class;
            let rect = guard.row_rect(row, width);
            guard.queue_redraw(&self.surface, rect);
            // A disabled row cannot stay current.
            self.reconcile_current(token, &mut guard);
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Current element
    // -------------------------------------------------------------------------

    /// The current (highlighted) row, if any. Callable from any thread;
    /// off the dispatch thread the answer may trail a pending request.
    pub fn current_row(&self) -> Option<usize> {
        let data = self.store.lock_data();
        let nav = self.nav.lock();
        nav.current.and_then(|id| Self::position_of(&data, id))
    }

    /// Ask for the current row to change, from any thread.
    ///
    /// The request is recorded immediately and reconciled on the dispatch
    /// thread; `None` (and any out-of-range row) clears the highlight.
    pub fn request_current(self: &Arc<Self>, row: Option<usize>) {
        {
            let data = self.store.lock_data();
            let id = row.and_then(|row| data.row_infos.get(row).map(|info| info.id));
            self.nav.lock().pending = Some(id);
        }
        let weak = Arc::downgrade(self);
        let posted = self.dispatcher.post(move |token| {
            if let Some(element) = weak.upgrade() {
                let mut guard = element.grab(token);
                element.reconcile_current(token, &mut guard);
            }
        });
        if posted.is_err() {
            tracing::trace!(
                target: "horizon_trellis::element",
                "current-row request dropped: dispatcher stopped"
            );
        }
    }

    /// Advance the authoritative current element: consume any pending
    /// request, drop an id whose row is gone or disabled, report the new
    /// row number if it changed, and re-arm the submenu hover debounce.
    ///
    /// Runs inside every mutation path that can renumber rows.
    fn reconcile_current(self: &Arc<Self>, _token: &DispatchToken, guard: &mut StoreGuard<'_>) {
        let mut nav = self.nav.lock();
        if let Some(request) = nav.pending.take() {
            nav.current = request;
        }

        let mut resolved: Option<(RowId, usize)> = None;
        if let Some(id) = nav.current {
            match Self::position_of(guard, id) {
                Some(row) if guard.is_enabled(row) => resolved = Some((id, row)),
                _ => nav.current = None,
            }
        }

        let row_number = resolved.map(|(_, row)| row);
        if row_number != nav.reported {
            let width = self.surface.width();
            if let Some(old) = nav.reported {
                let rect = guard.row_rect(old, width);
                guard.queue_redraw(&self.surface, rect);
            }
            if let Some(new) = row_number {
                let rect = guard.row_rect(new, width);
                guard.queue_redraw(&self.surface, rect);
            }
            nav.reported = row_number;
            guard.queue_current_notifications(row_number);
        }

        // Hover debounce follows the current *identity*: renumbering alone
        // neither cancels nor restarts it.
        let current_id = resolved.map(|(id, _)| id);
        if current_id != nav.hover_target {
            if let Some(timer) = nav.hover_timer.take() {
                self.dispatcher.cancel_timer(timer).ok();
            }
            nav.hover_target = current_id;
            if let Some((id, row)) = resolved {
                let has_submenu = guard
                    .identity(row)
                    .is_some_and(|identity| identity.submenu().is_some());
                if has_submenu {
                    let weak = Arc::downgrade(self);
                    if let Ok(timer) =
                        self.dispatcher
                            .post_delayed(self.hover_action_delay, move |token| {
                                if let Some(element) = weak.upgrade() {
                                    element.hover_action(token, id);
                                }
                            })
                    {
                        nav.hover_timer = Some(timer);
                    }
                }
            }
        }
    }

    /// The hover debounce fired: open the submenu if the row is still
    /// current.
    fn hover_action(self: &Arc<Self>, token: &DispatchToken, id: RowId) {
        {
            let mut nav = self.nav.lock();
            if nav.current != Some(id) {
                return;
            }
            nav.hover_timer = None;
        }
        let open = {
            let guard = self.grab(token);
            Self::position_of(&guard, id)
                .and_then(|row| guard.identity(row))
                .and_then(|identity| identity.submenu().cloned())
        };
        if let Some(open) = open {
            tracing::debug!(target: "horizon_trellis::element", "submenu hover action");
            open(token);
        }
    }

    // -------------------------------------------------------------------------
    // Keyboard and pointer
    // -------------------------------------------------------------------------

    /// Handle a key press. Returns `true` if the list consumed it.
    ///
    /// Up/Down step the current element across enabled rows, skipping
    /// disabled rows and separators; Home/End jump to the first/last
    /// enabled row; Enter and Space activate the current element through
    /// the selection policy.
    pub fn key_press(
        self: &Arc<Self>,
        token: &DispatchToken,
        key: Key,
        modifiers: KeyboardModifiers,
    ) -> bool {
        if !modifiers.is_none() {
            return false;
        }
        let mut guard = self.grab(token);
        let rows = guard.rows();
        if rows == 0 {
            return false;
        }
        let current = {
            let nav = self.nav.lock();
            nav.current.and_then(|id| Self::position_of(&guard, id))
        };

        let target = match key {
            Key::Down => {
                let start = current.map_or(0, |row| row + 1);
                (start..rows).find(|&row| guard.is_enabled(row))
            }
            Key::Up => {
                let end = current.unwrap_or(rows);
                (0..end).rev().find(|&row| guard.is_enabled(row))
            }
            Key::Home => (0..rows).find(|&row| guard.is_enabled(row)),
            Key::End => (0..rows).rev().find(|&row| guard.is_enabled(row)),
            Key::Enter | Key::Space => {
                let Some(row) = current else {
                    return false;
                };
                self.run_policy(&mut guard, row, ActivationSource::Keyboard);
                return true;
            }
            _ => return false,
        };

        if let Some(row) = target {
            let id = guard.row_infos[row].id;
            self.nav.lock().pending = Some(Some(id));
            self.reconcile_current(token, &mut guard);
        }
        // No enabled row in that direction: the key was still ours.
        true
    }

    /// Track the pointer: the enabled row under it becomes current; a
    /// disabled row, separator, or empty space clears the highlight.
    pub fn pointer_motion(self: &Arc<Self>, token: &DispatchToken, _x: i32, y: i32) {
        let mut guard = self.grab(token);
        let id = u32::try_from(y)
            .ok()
            .and_then(|y| guard.row_at_y(y))
            .filter(|&row| guard.is_enabled(row))
            .map(|row| guard.row_infos[row].id);
        self.nav.lock().pending = Some(id);
        self.reconcile_current(token, &mut guard);
    }

    /// A button press: move the highlight, then activate the row under
    /// the pointer through the selection policy.
    pub fn pointer_press(self: &Arc<Self>, token: &DispatchToken, x: i32, y: i32) {
        self.pointer_motion(token, x, y);
        let mut guard = self.grab(token);
        let current = {
            let nav = self.nav.lock();
            nav.current.and_then(|id| Self::position_of(&guard, id))
        };
        if let Some(row) = current {
            self.run_policy(&mut guard, row, ActivationSource::Pointer);
        }
    }

    /// The pointer left the widget.
    pub fn pointer_leave(self: &Arc<Self>, token: &DispatchToken) {
        let mut guard = self.grab(token);
        self.nav.lock().pending = Some(None);
        self.reconcile_current(token, &mut guard);
    }

    /// Keyboard focus moved away.
    pub fn focus_lost(self: &Arc<Self>, token: &DispatchToken) {
        self.pointer_leave(token);
    }

    // -------------------------------------------------------------------------
    // Shortcut dispatch
    // -------------------------------------------------------------------------

    /// Whether the row behind a shortcut entry is present and enabled.
    pub(crate) fn shortcut_enabled(&self, id: RowId) -> bool {
        let data = self.store.lock_data();
        Self::position_of(&data, id).is_some_and(|row| data.is_enabled(row))
    }

    /// Activate a row through its installed shortcut. Returns `false`
    /// when the row is gone or cannot activate, so the dispatcher can try
    /// the next candidate.
    pub(crate) fn activate_shortcut(self: &Arc<Self>, token: &DispatchToken, id: RowId) -> bool {
        let mut guard = self.grab(token);
        let Some(row) = Self::position_of(&guard, id) else {
            return false;
        };
        if !guard.is_enabled(row) {
            return false;
        }
        self.run_policy(&mut guard, row, ActivationSource::Shortcut);
        true
    }

    // -------------------------------------------------------------------------
    // Theme and drawing
    // -------------------------------------------------------------------------

    /// The theme changed: re-resolve every token, drop every cached cell
    /// size, and relayout with a full redraw.
    pub fn theme_updated_with_token(&self, token: &DispatchToken) {
        *self.palette.lock() = ThemePalette::resolve(&*self.theme);
        let mut guard = self.grab(token);
        guard.invalidate_all_sizes();
        guard.recalculate(&*self.measure, self.axis.as_ref(), &*self.surface);
    }

    /// Draw the rows intersecting `clip`.
    pub fn draw(&self, token: &DispatchToken, painter: &mut dyn CellPainter, clip: Rect) {
        let guard = self.grab(token);
        let palette = *self.palette.lock();
        let current = {
            let nav = self.nav.lock();
            nav.current.and_then(|id| Self::position_of(&guard, id))
        };
        let width = guard.total_width().max(self.surface.width());
        let columns = guard.columns;
        let h_pad = guard.params.h_padding;
        let v_pad = guard.params.v_padding;
        let leading = guard.params.leading;
        let indent_width = guard.params.indent_width;

        for row in 0..guard.rows() {
            let info = guard.row_infos[row].clone();
            let row_rect = Rect::new(0, info.y as i32, width, info.height);
            if !row_rect.intersects(&clip) {
                continue;
            }
            let (selected, enabled, separator) = guard
                .identity(row)
                .map(|identity| {
                    (
                        identity.selected,
                        identity.is_enabled(),
                        identity.class == RowClass::Separator,
                    )
                })
                .unwrap_or((false, false, false));

            let background = if current == Some(row) {
                palette.current
            } else if selected && self.style.highlights_background() {
                palette.highlight
            } else {
                palette.background
            };
            painter.fill_row(row_rect, background);

            if separator {
                let rule = Rect::new(
                    h_pad as i32,
                    (info.y + v_pad) as i32,
                    width.saturating_sub(2 * h_pad),
                    info.height.saturating_sub(2 * v_pad),
                );
                painter.draw_separator(rule, palette.border);
                continue;
            }

            let foreground = if enabled {
                palette.foreground
            } else {
                palette.disabled
            };
            let inner_height = info.height.saturating_sub(2 * v_pad);
            for column in 0..columns {
                let Some(&(col_x, col_width)) = guard.columns_poswidths.get(column) else {
                    break;
                };
                let cell = &guard.cells[row * columns + column];
                let natural = cell.cached_size();
                if natural.is_empty() {
                    continue;
                }
                let indent = if column == leading {
                    info.indent as u32 * indent_width
                } else {
                    0
                };
                let avail = col_width.saturating_sub(2 * h_pad + indent);
                let halign = guard
                    .params
                    .alignments
                    .get(&column)
                    .copied()
                    .unwrap_or_default();
                let free_x = avail.saturating_sub(natural.width);
                let x_off = match halign {
                    HAlign::Left => 0,
                    HAlign::Center => free_x / 2,
                    HAlign::Right => free_x,
                };
                let free_y = inner_height.saturating_sub(natural.height);
                let y_off = match cell.valign() {
                    VAlign::Top => 0,
                    VAlign::Middle => free_y / 2,
                    VAlign::Bottom => free_y,
                };
                let rect = Rect::new(
                    (col_x + h_pad + indent + x_off) as i32,
                    (info.y + v_pad + y_off) as i32,
                    natural.width.min(avail),
                    natural.height.min(inner_height),
                );
                cell.draw(painter, rect, foreground);
            }
        }

        if palette.border_width > 0 {
            for &x in &guard.border_positions {
                painter.draw_border(x as i32, clip, palette.border);
            }
        }
    }
}

impl std::fmt::Debug for ListElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListElement")
            .field("style", &self.style.name())
            .field("columns", &self.real_columns)
            .field("rows", &self.rows())
            .finish_non_exhaustive()
    }
}
