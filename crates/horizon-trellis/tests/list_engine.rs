//! End-to-end tests driving the list engine the way a host toolkit
//! would: a dispatch thread, a fake measurement service, a recording
//! surface, and the public layout-manager API.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use horizon_trellis::SubmenuCallback;
use horizon_trellis::prelude::*;

/// 8 pixels per character, 16 pixels tall.
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
struct RecordingSurface {
    width: u32,
    redraws: Mutex<Vec<Rect>>,
    metrics: Mutex<Option<(Metrics, Metrics)>>,
}

impl ElementSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn schedule_redraw(&self, region: Rect) {
        self.redraws.lock().push(region);
    }

    fn metrics_updated(&self, horizontal: Metrics, vertical: Metrics) {
        *self.metrics.lock() = Some((horizontal, vertical));
    }
}

struct FlatTheme;

impl ThemeLookup for FlatTheme {
    fn color(&self, _token: &str) -> Color {
        Color::WHITE
    }

    fn border_width(&self, _token: &str) -> u32 {
        1
    }
}

struct Fixture {
    list: ListLayoutManager,
    dispatcher: Dispatcher,
    surface: Arc<RecordingSurface>,
}

fn fixture(config: ListConfig) -> Fixture {
    let dispatcher = Dispatcher::new();
    let surface = Arc::new(RecordingSurface::default());
    let list = ListLayoutManager::new(
        config,
        Arc::new(FixedMeasure),
        surface.clone(),
        Arc::new(FlatTheme),
        dispatcher.clone(),
        ShortcutRegistry::new(),
    )
    .unwrap();
    Fixture {
        list,
        dispatcher,
        surface,
    }
}

fn texts(values: &[&str]) -> Vec<ListItemParam> {
    values.iter().map(|v| ListItemParam::from(*v)).collect()
}

#[test]
fn append_then_select() {
    let f = fixture(ListConfig::new(1));
    let token = f.dispatcher.token();

    assert_eq!(f.list.size(), 0);
    f.list.append_items(texts(&["A", "B", "C"])).unwrap();
    f.dispatcher.run_pending(&token);
    assert_eq!(f.list.size(), 3);

    f.list.set_selected(1, true);
    f.dispatcher.run_pending(&token);

    assert!(f.list.selected(1));
    assert_eq!(f.list.selected_row(), Some(1));
    assert_eq!(f.list.all_selected(), vec![1]);
    // The selection change damaged the row's region.
    assert!(!f.surface.redraws.lock().is_empty());
}

#[test]
fn replace_one_row_with_two_preserves_selection_identity() {
    let f = fixture(ListConfig::new(1));
    let token = f.dispatcher.token();

    let log: Arc<Mutex<Vec<(usize, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    let l = log.clone();
    f.list.on_selection_changed(move |change| {
        l.lock().push((change.row, change.selected));
    });

    f.list.append_items(texts(&["A", "B", "C"])).unwrap();
    f.list.autoselect(1);
    f.dispatcher.run_pending(&token);
    assert_eq!(*log.lock(), vec![(1, true)]);

    // Replacing row 0 with two rows renumbers the selected row to 2.
    f.list.replace_items(0, texts(&["X", "Y"])).unwrap();
    f.dispatcher.run_pending(&token);

    assert_eq!(f.list.size(), 4);
    assert_eq!(f.list.selected_row(), Some(2));
    {
        let lock = f.list.lock();
        assert_eq!(lock.cell_content(0, 0), Some(&CellContent::Text("X".into())));
        assert_eq!(lock.cell_content(1, 0), Some(&CellContent::Text("Y".into())));
        assert_eq!(lock.cell_content(2, 0), Some(&CellContent::Text("B".into())));
    }
}

#[test]
fn column_width_never_stale_after_widest_removed() {
    let f = fixture(ListConfig::new(1).with_padding(0, 0));
    let token = f.dispatcher.token();

    f.list
        .append_items(texts(&["short", "the longest row", "mid"]))
        .unwrap();
    f.dispatcher.run_pending(&token);
    // Force a recalculation pass through a dispatch-thread accessor.
    f.list.element().key_press(&token, Key::Home, KeyboardModifiers::NONE);
    assert_eq!(f.list.lock().calculated_column_widths()[0], 8 * 15);

    f.list.remove_items(1, 1);
    f.dispatcher.run_pending(&token);
    f.list.element().key_press(&token, Key::Home, KeyboardModifiers::NONE);
    assert_eq!(f.list.lock().calculated_column_widths()[0], 8 * 5);
}

#[test]
fn handles_report_renumbered_positions() {
    let f = fixture(ListConfig::new(1));
    let token = f.dispatcher.token();

    let mut items = texts(&["a", "b", "c", "d", "e"]);
    items.push(ListItemParam::ReturnHandles);
    let handles = f.list.append_items(items).unwrap().unwrap();
    assert_eq!(handles.len(), 5);
    f.dispatcher.run_pending(&token);
    assert_eq!(handles[3].current_row_number(), Some(3));

    f.list.remove_items(2, 1);
    f.dispatcher.run_pending(&token);
    assert_eq!(handles[3].current_row_number(), Some(2));
    // The removed row's handle is a dead reference, not an error.
    assert_eq!(handles[2].current_row_number(), None);
    assert!(!handles[2].is_selected());
    handles[2].set_selected(true);
    f.dispatcher.run_pending(&token);
    assert_eq!(f.list.all_selected(), Vec::<usize>::new());
}

#[test]
fn resort_moves_rows_and_identities_together() {
    let f = fixture(ListConfig::new(1));
    let token = f.dispatcher.token();

    let mut items = texts(&["A", "B", "C"]);
    items.push(ListItemParam::ReturnHandles);
    let handles = f.list.append_items(items).unwrap().unwrap();
    f.dispatcher.run_pending(&token);

    // Row at old index i moves to index order[i]: A->2, B->0, C->1.
    f.list.resort_items(vec![2, 0, 1]).unwrap();
    f.dispatcher.run_pending(&token);

    let lock = f.list.lock();
    assert_eq!(lock.cell_content(0, 0), Some(&CellContent::Text("B".into())));
    assert_eq!(lock.cell_content(1, 0), Some(&CellContent::Text("C".into())));
    assert_eq!(lock.cell_content(2, 0), Some(&CellContent::Text("A".into())));
    drop(lock);
    assert_eq!(handles[0].current_row_number(), Some(2));
    assert_eq!(handles[1].current_row_number(), Some(0));
    assert_eq!(handles[2].current_row_number(), Some(1));
}

#[test]
fn malformed_permutations_rejected() {
    let f = fixture(ListConfig::new(1));
    let token = f.dispatcher.token();
    f.list.append_items(texts(&["A", "B", "C"])).unwrap();
    f.dispatcher.run_pending(&token);

    assert!(matches!(
        f.list.resort_items(vec![0, 0, 1]),
        Err(ListError::InvalidPermutation { .. })
    ));
    assert!(matches!(
        f.list.resort_items(vec![0, 1, 5]),
        Err(ListError::InvalidPermutation { .. })
    ));
    // Wrong length is caught when the resort runs; nothing moves.
    f.list.resort_items(vec![1, 0]).unwrap();
    f.dispatcher.run_pending(&token);
    let lock = f.list.lock();
    assert_eq!(lock.cell_content(0, 0), Some(&CellContent::Text("A".into())));
}

#[test]
fn metadata_must_precede_its_row() {
    let f = fixture(ListConfig::new(1));

    let err = f
        .list
        .append_items(vec![
            "text".into(),
            ListItemParam::Shortcut(KeyCombination::ctrl(Key::Char('x'))),
        ])
        .unwrap_err();
    assert!(matches!(err, ListError::MisplacedMetadata));

    f.list
        .append_items(vec![
            ListItemParam::Shortcut(KeyCombination::ctrl(Key::Char('x'))),
            "text".into(),
        ])
        .unwrap();
}

#[test]
fn submenu_attribute_requires_menu_style() {
    let open: SubmenuCallback = Arc::new(|_| {});
    let f = fixture(ListConfig::new(1));
    let err = f
        .list
        .append_items(vec![ListItemParam::Submenu(open.clone()), "More".into()])
        .unwrap_err();
    assert!(matches!(err, ListError::IllegalAttribute { .. }));

    let f = fixture(ListConfig::new(1).with_style(style::menu()));
    let token = f.dispatcher.token();
    f.list
        .append_items(vec![ListItemParam::Submenu(open), "More".into()])
        .unwrap();
    f.dispatcher.run_pending(&token);

    // Menu rows are bullet + data + indicator; the trailing cell shows
    // the submenu arrow.
    let lock = f.list.lock();
    assert_eq!(
        lock.cell_content(0, 2),
        Some(&CellContent::Image("submenu-arrow".into()))
    );
}

#[test]
fn single_selection_is_idempotent() {
    let f = fixture(ListConfig::new(1));
    let token = f.dispatcher.token();
    f.list.append_items(texts(&["A", "B", "C"])).unwrap();
    f.dispatcher.run_pending(&token);

    f.list.autoselect_with_token(&token, 2).unwrap();
    f.list.autoselect_with_token(&token, 2).unwrap();
    assert_eq!(f.list.all_selected(), vec![2]);

    f.list.autoselect_with_token(&token, 0).unwrap();
    assert_eq!(f.list.all_selected(), vec![0]);
}

#[test]
fn single_optional_round_trips() {
    let f = fixture(ListConfig::new(1).with_selection_policy(selection::single_optional()));
    let token = f.dispatcher.token();
    f.list.append_items(texts(&["A", "B"])).unwrap();
    f.dispatcher.run_pending(&token);

    f.list.autoselect_with_token(&token, 0).unwrap();
    assert_eq!(f.list.all_selected(), vec![0]);
    f.list.autoselect_with_token(&token, 0).unwrap();
    assert_eq!(f.list.all_selected(), Vec::<usize>::new());
    f.list.autoselect_with_token(&token, 0).unwrap();
    assert_eq!(f.list.all_selected(), vec![0]);
}

#[test]
fn multiple_selection_toggles_rows_independently() {
    let f = fixture(ListConfig::new(1).with_selection_policy(selection::multiple()));
    let token = f.dispatcher.token();
    f.list.append_items(texts(&["A", "B", "C"])).unwrap();
    f.dispatcher.run_pending(&token);

    f.list.autoselect_with_token(&token, 0).unwrap();
    f.list.autoselect_with_token(&token, 2).unwrap();
    assert_eq!(f.list.all_selected(), vec![0, 2]);
    f.list.autoselect_with_token(&token, 0).unwrap();
    assert_eq!(f.list.all_selected(), vec![2]);
}

#[test]
fn radio_group_deselects_siblings() {
    let f = fixture(
        ListConfig::new(1)
            .with_style(style::menu())
            .with_selection_policy(selection::multiple()),
    );
    let token = f.dispatcher.token();
    f.list
        .append_items(vec![
            ListItemParam::menu_option_in_group("view-mode"),
            "Icons".into(),
            ListItemParam::menu_option_in_group("view-mode"),
            "Details".into(),
            ListItemParam::menu_option(),
            "Status Bar".into(),
        ])
        .unwrap();
    f.dispatcher.run_pending(&token);

    f.list.autoselect_with_token(&token, 0).unwrap();
    f.list.autoselect_with_token(&token, 2).unwrap();
    assert_eq!(f.list.all_selected(), vec![0, 2]);

    // Selecting the other group member drops row 0, not the ungrouped row.
    f.list.autoselect_with_token(&token, 1).unwrap();
    assert_eq!(f.list.all_selected(), vec![1, 2]);
}

#[test]
fn keyboard_navigation_skips_disabled_rows() {
    let f = fixture(ListConfig::new(1));
    let token = f.dispatcher.token();
    f.list.append_items(texts(&["A", "B", "C", "D"])).unwrap();
    f.dispatcher.run_pending(&token);
    f.list.set_enabled_with_token(&token, 1, false).unwrap();
    f.list.set_enabled_with_token(&token, 3, false).unwrap();

    let element = f.list.element();
    assert!(element.key_press(&token, Key::Down, KeyboardModifiers::NONE));
    assert_eq!(f.list.current_row(), Some(0));

    // B is disabled; Down lands on C.
    assert!(element.key_press(&token, Key::Down, KeyboardModifiers::NONE));
    assert_eq!(f.list.current_row(), Some(2));

    // D is disabled; Down finds nothing and stays put.
    assert!(element.key_press(&token, Key::Down, KeyboardModifiers::NONE));
    assert_eq!(f.list.current_row(), Some(2));

    assert!(element.key_press(&token, Key::Up, KeyboardModifiers::NONE));
    assert_eq!(f.list.current_row(), Some(0));

    assert!(element.key_press(&token, Key::End, KeyboardModifiers::NONE));
    assert_eq!(f.list.current_row(), Some(2));
    assert!(element.key_press(&token, Key::Home, KeyboardModifiers::NONE));
    assert_eq!(f.list.current_row(), Some(0));

    // Enter activates the current row through the selection policy.
    assert!(element.key_press(&token, Key::Enter, KeyboardModifiers::NONE));
    assert_eq!(f.list.all_selected(), vec![0]);
}

#[test]
fn pointer_tracks_current_and_selects_on_press() {
    let f = fixture(ListConfig::new(1).with_padding(0, 0));
    let token = f.dispatcher.token();

    let reported: Arc<Mutex<Vec<Option<usize>>>> = Arc::new(Mutex::new(Vec::new()));
    let r = reported.clone();
    f.list.on_current_changed(move |row| r.lock().push(row));

    f.list.append_items(texts(&["A", "B", "C"])).unwrap();
    f.dispatcher.run_pending(&token);

    let element = f.list.element().clone();
    // Rows are 16px tall with no padding.
    element.pointer_motion(&token, 4, 20);
    assert_eq!(f.list.current_row(), Some(1));

    element.pointer_press(&token, 4, 20);
    assert_eq!(f.list.selected_row(), Some(1));

    element.pointer_leave(&token);
    assert_eq!(f.list.current_row(), None);

    assert_eq!(*reported.lock(), vec![Some(1), None]);
}

#[test]
fn pointer_ignores_disabled_rows_and_separators() {
    let f = fixture(ListConfig::new(1).with_padding(0, 0));
    let token = f.dispatcher.token();
    f.list
        .append_items(vec!["A".into(), ListItemParam::Separator, "B".into()])
        .unwrap();
    f.dispatcher.run_pending(&token);

    let element = f.list.element().clone();
    element.pointer_motion(&token, 0, 4);
    assert_eq!(f.list.current_row(), Some(0));

    // The separator cannot become current; the highlight clears.
    let separator_y = {
        let lock = f.list.lock();
        assert!(!lock.enabled(1));
        17
    };
    element.pointer_motion(&token, 0, separator_y);
    assert_eq!(f.list.current_row(), None);
}

#[test]
fn submenu_opens_after_hover_delay() {
    let f = fixture(
        ListConfig::new(1)
            .with_style(style::menu())
            .with_padding(0, 0)
            .with_hover_action_delay(Duration::from_millis(5)),
    );
    let token = f.dispatcher.token();

    let opened = Arc::new(Mutex::new(0usize));
    let o = opened.clone();
    let open: SubmenuCallback = Arc::new(move |_| *o.lock() += 1);
    f.list
        .append_items(vec![
            "New".into(),
            ListItemParam::Submenu(open),
            "Recent Files".into(),
        ])
        .unwrap();
    f.dispatcher.run_pending(&token);

    let element = f.list.element().clone();
    element.pointer_motion(&token, 0, 20);
    assert_eq!(f.list.current_row(), Some(1));
    assert_eq!(*opened.lock(), 0);

    std::thread::sleep(Duration::from_millis(15));
    f.dispatcher.run_pending(&token);
    assert_eq!(*opened.lock(), 1);
}

#[test]
fn leaving_the_row_cancels_the_hover_action() {
    let f = fixture(
        ListConfig::new(1)
            .with_style(style::menu())
            .with_padding(0, 0)
            .with_hover_action_delay(Duration::from_millis(20)),
    );
    let token = f.dispatcher.token();

    let opened = Arc::new(Mutex::new(0usize));
    let o = opened.clone();
    let open: SubmenuCallback = Arc::new(move |_| *o.lock() += 1);
    f.list
        .append_items(vec![
            "New".into(),
            ListItemParam::Submenu(open),
            "Recent Files".into(),
        ])
        .unwrap();
    f.dispatcher.run_pending(&token);

    let element = f.list.element().clone();
    element.pointer_motion(&token, 0, 20);
    element.pointer_motion(&token, 0, 4);

    std::thread::sleep(Duration::from_millis(40));
    f.dispatcher.run_pending(&token);
    assert_eq!(*opened.lock(), 0);
}

#[test]
fn shortcuts_activate_rows_until_removed() {
    let dispatcher = Dispatcher::new();
    let token = dispatcher.token();
    let shortcuts = ShortcutRegistry::new();
    let surface = Arc::new(RecordingSurface::default());
    let list = ListLayoutManager::new(
        ListConfig::new(1),
        Arc::new(FixedMeasure),
        surface,
        Arc::new(FlatTheme),
        dispatcher.clone(),
        shortcuts.clone(),
    )
    .unwrap();

    list.append_items(vec![
        "Open".into(),
        ListItemParam::Shortcut(KeyCombination::ctrl(Key::Char('o'))),
        "Close".into(),
    ])
    .unwrap();
    dispatcher.run_pending(&token);

    let combo = KeyCombination::ctrl(Key::Char('o'));
    assert!(shortcuts.is_enabled(combo));
    assert!(shortcuts.process_key(&token, Key::Char('o'), KeyboardModifiers::CTRL));
    assert_eq!(list.all_selected(), vec![1]);

    // A disabled row's shortcut stops activating.
    list.set_enabled_with_token(&token, 1, false).unwrap();
    assert!(!shortcuts.is_enabled(combo));
    assert!(!shortcuts.process_key(&token, Key::Char('o'), KeyboardModifiers::CTRL));

    // Removing the row uninstalls it.
    list.set_enabled_with_token(&token, 1, true).unwrap();
    list.remove_items_with_token(&token, 1, 1).unwrap();
    assert!(shortcuts.is_empty());
    assert!(!shortcuts.process_key(&token, Key::Char('o'), KeyboardModifiers::CTRL));
}

#[test]
fn mutations_marshal_from_other_threads_in_order() {
    let f = fixture(ListConfig::new(1));
    let token = f.dispatcher.token();

    let list = f.list.clone();
    std::thread::spawn(move || {
        list.append_items(texts(&["first"])).unwrap();
        list.append_items(texts(&["second"])).unwrap();
    })
    .join()
    .unwrap();

    // Not applied until the dispatch thread runs.
    assert_eq!(f.list.size(), 0);
    f.dispatcher.run_pending(&token);
    assert_eq!(f.list.size(), 2);
    let lock = f.list.lock();
    assert_eq!(
        lock.cell_content(0, 0),
        Some(&CellContent::Text("first".into()))
    );
    assert_eq!(
        lock.cell_content(1, 0),
        Some(&CellContent::Text("second".into()))
    );
}

#[test]
fn current_row_requests_reconcile_on_the_dispatch_thread() {
    let f = fixture(ListConfig::new(1));
    let token = f.dispatcher.token();
    f.list.append_items(texts(&["A", "B"])).unwrap();
    f.dispatcher.run_pending(&token);

    let list = f.list.clone();
    std::thread::spawn(move || list.set_current_row(Some(1)))
        .join()
        .unwrap();

    f.dispatcher.run_pending(&token);
    assert_eq!(f.list.current_row(), Some(1));

    // The highlighted row's identity survives renumbering.
    f.list.insert_items(0, texts(&["Z"])).unwrap();
    f.dispatcher.run_pending(&token);
    assert_eq!(f.list.current_row(), Some(2));
}

#[test]
fn initially_selected_and_status_callbacks() {
    let f = fixture(ListConfig::new(1));
    let token = f.dispatcher.token();

    let statuses: Arc<Mutex<Vec<ItemStatus>>> = Arc::new(Mutex::new(Vec::new()));
    let s = statuses.clone();
    f.list
        .append_items(vec![
            ListItemParam::InitiallySelected,
            "A".into(),
            ListItemParam::StatusCallback(Arc::new(move |status| s.lock().push(*status))),
            "B".into(),
        ])
        .unwrap();
    f.dispatcher.run_pending(&token);
    assert_eq!(f.list.all_selected(), vec![0]);

    f.list.autoselect_with_token(&token, 1).unwrap();
    let recorded = statuses.lock();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].row, 1);
    assert!(recorded[0].selected);
}

#[test]
fn synchronized_lists_agree_on_column_widths() {
    let axis = SyncAxis::new();
    let dispatcher = Dispatcher::new();
    let token = dispatcher.token();

    let make = |dispatcher: &Dispatcher| {
        ListLayoutManager::new(
            ListConfig::new(1)
                .with_padding(0, 0)
                .with_synchronized_axis(axis.clone()),
            Arc::new(FixedMeasure),
            Arc::new(RecordingSurface::default()),
            Arc::new(FlatTheme),
            dispatcher.clone(),
            ShortcutRegistry::new(),
        )
        .unwrap()
    };
    let a = make(&dispatcher);
    let b = make(&dispatcher);

    a.append_items(texts(&["wide entry"])).unwrap();
    b.append_items(texts(&["x"])).unwrap();
    dispatcher.run_pending(&token);
    // Recalculate both under their dispatch-thread accessors.
    a.list_recalc(&token);
    b.list_recalc(&token);

    assert_eq!(a.lock().calculated_column_widths()[0], 8 * 10);
    assert_eq!(b.lock().calculated_column_widths()[0], 8 * 10);
}

/// Touching any dispatch-thread accessor forces the deferred
/// recalculation; keyboard focus queries are the cheapest.
trait Recalc {
    fn list_recalc(&self, token: &DispatchToken);
}

impl Recalc for ListLayoutManager {
    fn list_recalc(&self, token: &DispatchToken) {
        self.element()
            .key_press(token, Key::Escape, KeyboardModifiers::NONE);
    }
}

#[test]
fn hierarchical_indentation_widens_the_data_column() {
    let f = fixture(ListConfig::new(1).with_padding(0, 0));
    let token = f.dispatcher.token();

    f.list
        .append_items(vec![
            "top".into(),
            ListItemParam::HierIndent(2),
            "child".into(),
        ])
        .unwrap();
    f.dispatcher.run_pending(&token);
    f.list.list_recalc(&token);

    // Two levels of the default 16px indent ride on the 5-char cell.
    assert_eq!(f.list.lock().calculated_column_widths()[0], 8 * 5 + 32);
}

#[test]
fn zero_and_inverted_row_bounds_rejected_at_construction() {
    let dispatcher = Dispatcher::new();
    let build = |config: ListConfig| {
        ListLayoutManager::new(
            config,
            Arc::new(FixedMeasure),
            Arc::new(RecordingSurface::default()),
            Arc::new(FlatTheme),
            dispatcher.clone(),
            ShortcutRegistry::new(),
        )
    };

    assert!(matches!(
        build(ListConfig::new(0)),
        Err(ListError::NoColumns)
    ));
    assert!(matches!(
        build(ListConfig::new(1).with_visible_rows(0, 3)),
        Err(ListError::ZeroVisibleRows)
    ));
    assert!(matches!(
        build(ListConfig::new(1).with_visible_rows(5, 2)),
        Err(ListError::InvalidRowBounds { min: 5, max: 2 })
    ));
}

#[test]
fn metrics_follow_row_contents() {
    let f = fixture(ListConfig::new(1).with_padding(0, 0).with_visible_rows(2, 4));
    let token = f.dispatcher.token();

    f.list.append_items(texts(&["aaaa", "bb", "c"])).unwrap();
    f.dispatcher.run_pending(&token);
    f.list.list_recalc(&token);

    let (horizontal, vertical) = f.surface.metrics.lock().unwrap();
    assert_eq!(horizontal.minimum, 32);
    assert_eq!(horizontal.preferred, 32);
    // Three 16px rows, bounded to 2..4 visible rows of 16px.
    assert_eq!(vertical.minimum, 32);
    assert_eq!(vertical.preferred, 48);
    assert_eq!(vertical.maximum, 64);
}

#[test]
fn signals_mirror_the_closure_callbacks() {
    let f = fixture(ListConfig::new(1));
    let token = f.dispatcher.token();
    f.list.append_items(texts(&["A", "B"])).unwrap();
    f.dispatcher.run_pending(&token);

    let selections: Arc<Mutex<Vec<(usize, bool)>>> = Arc::new(Mutex::new(Vec::new()));
    let s = selections.clone();
    f.list
        .signals()
        .selection_changed
        .connect(move |change| s.lock().push((change.row, change.selected)));

    let currents: Arc<Mutex<Vec<Option<usize>>>> = Arc::new(Mutex::new(Vec::new()));
    let c = currents.clone();
    f.list
        .signals()
        .current_changed
        .connect(move |row| c.lock().push(*row));

    f.list.autoselect_with_token(&token, 0).unwrap();
    f.list.set_current_row(Some(1));
    f.dispatcher.run_pending(&token);

    assert_eq!(*selections.lock(), vec![(0, true)]);
    assert_eq!(*currents.lock(), vec![Some(1)]);
}

#[test]
fn panicking_callbacks_do_not_poison_the_list() {
    let f = fixture(ListConfig::new(1));
    let token = f.dispatcher.token();
    f.list.append_items(texts(&["A", "B"])).unwrap();
    f.dispatcher.run_pending(&token);

    f.list
        .on_selection_changed(|_| panic!("application bug"));
    f.list.autoselect_with_token(&token, 0).unwrap();

    // The panic was confined to the callback boundary.
    assert_eq!(f.list.all_selected(), vec![0]);
    f.list.autoselect_with_token(&token, 1).unwrap();
    assert_eq!(f.list.all_selected(), vec![1]);
}
