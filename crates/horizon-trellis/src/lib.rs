//! Horizon Trellis - a list/combo-box layout engine.
//!
//! Trellis implements the tabular machinery behind list boxes, combo-box
//! popups, and menus: a mutable multi-column data store with negotiated
//! column widths, durable row identities, pluggable selection policies,
//! keyboard/pointer navigation, and synchronized column layout across
//! independent widget instances. The host toolkit supplies text
//! measurement, drawing, theming, and a widget surface through traits;
//! the engine supplies everything between "append these items" and
//! "draw these rows".
//!
//! # Threading
//!
//! All widget mutation runs on a single dispatch thread (see
//! [`Dispatcher`]). Plain [`ListLayoutManager`] methods validate
//! synchronously, queue the operation, and return; `*_with_token`
//! variants execute immediately for callers already on that thread.
//! Read queries take the data lock directly from any thread.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_trellis::prelude::*;
//!
//! struct Measure;
//! impl CellMeasure for Measure {
//!     fn text_size(&self, text: &str, _hint: Option<u32>) -> Size {
//!         Size::new(7 * text.chars().count() as u32, 14)
//!     }
//!     fn image_size(&self, _name: &str) -> Size {
//!         Size::new(12, 12)
//!     }
//! }
//!
//! struct Surface;
//! impl ElementSurface for Surface {
//!     fn width(&self) -> u32 { 200 }
//!     fn schedule_redraw(&self, _region: Rect) {}
//!     fn metrics_updated(&self, _horizontal: Metrics, _vertical: Metrics) {}
//! }
//!
//! struct Theme;
//! impl ThemeLookup for Theme {
//!     fn color(&self, _token: &str) -> Color { Color::BLACK }
//! }
//!
//! # fn main() -> horizon_trellis::Result<()> {
//! let dispatcher = Dispatcher::new();
//! let token = dispatcher.token();
//!
//! let list = ListLayoutManager::new(
//!     ListConfig::new(1),
//!     Arc::new(Measure),
//!     Arc::new(Surface),
//!     Arc::new(Theme),
//!     dispatcher.clone(),
//!     ShortcutRegistry::new(),
//! )?;
//!
//! // Queued from any thread; applied on the dispatch thread.
//! list.append_items(vec!["Cut".into(), "Copy".into(), "Paste".into()])?;
//! dispatcher.run_pending(&token);
//!
//! list.autoselect_with_token(&token, 1)?;
//! assert_eq!(list.selected_row(), Some(1));
//! # Ok(())
//! # }
//! ```

mod cell;
mod column_widths;
mod config;
mod element;
mod error;
pub mod host;
mod input;
mod item;
mod layout;
mod row;
pub mod selection;
mod shortcut;
mod store;
pub mod style;
mod types;

pub use horizon_trellis_core::{ConnectionId, DispatchToken, Dispatcher, Signal, TimerId};

pub use cell::{Cell, CellContent};
pub use column_widths::{SyncAxis, SyncAxisMember};
pub use config::ListConfig;
pub use element::ListElement;
pub use error::{ListError, Result};
pub use host::{CellMeasure, CellPainter, Color, ElementSurface, ThemeLookup};
pub use input::{Key, KeyCombination, KeyboardModifiers};
pub use item::{ListItemParam, RowMeta};
pub use layout::{ItemHandle, ListLayoutManager};
pub use row::{
    ActivationSource, DEFAULT_HOVER_ACTION_DELAY, ItemStatus, MenuItemKind, RowClass, RowId,
    StatusChangeFn, SubmenuCallback,
};
pub use selection::{
    CurrentChangedFn, SelectionChange, SelectionChangedFn, SelectionEditor, SelectionPolicy,
};
pub use shortcut::ShortcutRegistry;
pub use store::{ListLock, ListSignals};
pub use style::ListStyle;
pub use types::{HAlign, Metrics, Rect, Size, VAlign};

/// Everything an application needs to build and drive lists.
pub mod prelude {
    pub use crate::host::{CellMeasure, CellPainter, Color, ElementSurface, ThemeLookup};
    pub use crate::{
        ActivationSource, Cell, CellContent, DispatchToken, Dispatcher, HAlign, ItemHandle,
        ItemStatus, Key, KeyCombination, KeyboardModifiers, ListConfig, ListError, ListItemParam,
        ListLayoutManager, ListLock, ListStyle, Metrics, Rect, Result, SelectionChange,
        ShortcutRegistry, Size, SyncAxis, VAlign, selection, style,
    };
}
