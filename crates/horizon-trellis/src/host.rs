//! Services consumed from the host toolkit.
//!
//! The list engine does not measure text, rasterize anything, or own a
//! window. Those jobs belong to the host toolkit, which plugs in through
//! the traits here:
//!
//! - [`CellMeasure`] — the text/image measurement service
//! - [`CellPainter`] — the drawing service a cell renders itself through
//! - [`ThemeLookup`] — named style token resolution for the current theme
//! - [`ElementSurface`] — the owning widget: redraw scheduling and
//!   reported-metrics updates
//!
//! Implementations must not call back into the list synchronously; the
//! engine may hold its data lock while talking to them.

use crate::types::{Metrics, Rect, Size};

/// An RGBA color resolved from a theme token.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// Create a new color.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
}

/// Theme tokens the list engine resolves through [`ThemeLookup`].
pub mod tokens {
    /// Row background.
    pub const BACKGROUND: &str = "list.background";
    /// Background of a selected row under background-highlighting styles.
    pub const HIGHLIGHT: &str = "list.highlight";
    /// Background of the current (keyboard/pointer highlighted) row.
    pub const CURRENT: &str = "list.current";
    /// Text of an enabled row.
    pub const FOREGROUND: &str = "list.foreground";
    /// Text of a disabled row.
    pub const DISABLED: &str = "list.disabled";
    /// Separator rules and column borders.
    pub const BORDER: &str = "list.border";
    /// Width of the border between columns.
    pub const BORDER_WIDTH: &str = "list.border-width";
}

/// Text and image measurement, supplied by the host's font engine.
///
/// `width_hint` is the column width the caller currently prefers; the
/// measurement service may use it to wrap text, or ignore it.
pub trait CellMeasure: Send + Sync {
    /// Natural size of a text run under the current font and theme.
    fn text_size(&self, text: &str, width_hint: Option<u32>) -> Size;

    /// Natural size of a named theme image.
    fn image_size(&self, name: &str) -> Size;

    /// Height of a separator rule.
    fn separator_size(&self) -> Size {
        Size::new(0, 2)
    }
}

/// The drawing service cells render themselves through.
///
/// Rectangles are in widget coordinates, already clipped to the caller's
/// damage region. Colors arrive pre-resolved from the current theme.
pub trait CellPainter {
    /// Fill a row's background.
    fn fill_row(&mut self, rect: Rect, color: Color);

    /// Draw a text run.
    fn draw_text(&mut self, text: &str, rect: Rect, color: Color);

    /// Draw a named theme image.
    fn draw_image(&mut self, name: &str, rect: Rect);

    /// Draw a separator rule across the rectangle.
    fn draw_separator(&mut self, rect: Rect, color: Color);

    /// Draw a vertical column border at the given x offset.
    fn draw_border(&mut self, x: i32, rect: Rect, color: Color) {
        let _ = (x, rect, color);
    }
}

/// Named style token resolution for the current theme.
///
/// Resolved values are only valid for the current theme; the host calls
/// [`ListLayoutManager::theme_updated`](crate::ListLayoutManager::theme_updated)
/// when the theme changes and everything is re-resolved.
pub trait ThemeLookup: Send + Sync {
    /// Resolve a color token such as `"list.highlight"`.
    fn color(&self, token: &str) -> Color;

    /// Resolve a border width token.
    fn border_width(&self, token: &str) -> u32 {
        let _ = token;
        0
    }
}

/// The owning widget, as far as the list engine can see it.
pub trait ElementSurface: Send + Sync {
    /// Current actual width of the widget, in pixels.
    ///
    /// Zero means the widget has not been sized yet; columns then lay out
    /// at their natural widths.
    fn width(&self) -> u32;

    /// Schedule a redraw of a region of the widget.
    fn schedule_redraw(&self, region: Rect);

    /// Publish recalculated axis metrics to the layout above.
    fn metrics_updated(&self, horizontal: Metrics, vertical: Metrics);
}
