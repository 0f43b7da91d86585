//! The cell model.
//!
//! A cell is one renderable unit at one (row, column) position: a text
//! run, a theme image, a separator rule, or nothing. Cells own no row or
//! column identity; they report their own metrics and draw themselves.
//! Position and state come from the layout at draw time.

use crate::host::{CellMeasure, CellPainter, Color};
use crate::types::{Rect, Size, VAlign};

/// What a cell renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellContent {
    /// A text run.
    Text(String),
    /// A named theme image.
    Image(String),
    /// A separator rule spanning the row.
    Separator,
    /// Nothing; occupies the grid slot of a synthetic or padding column.
    Empty,
}

/// One (row, column) renderable unit.
#[derive(Debug, Clone)]
pub struct Cell {
    content: CellContent,
    valign: VAlign,
    /// Measured natural size; `None` until the measurement service has
    /// seen the current content.
    size: Option<Size>,
    /// The width this cell last contributed to its column's width
    /// multiset. `None` when the cell is not linked into a column.
    pub(crate) recorded_width: Option<u32>,
}

impl Cell {
    /// Create a text cell.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_content(CellContent::Text(text.into()))
    }

    /// Create an image cell.
    pub fn image(name: impl Into<String>) -> Self {
        Self::with_content(CellContent::Image(name.into()))
    }

    /// Create a separator cell.
    pub fn separator() -> Self {
        Self::with_content(CellContent::Separator)
    }

    /// Create an empty cell.
    pub fn empty() -> Self {
        Self::with_content(CellContent::Empty)
    }

    fn with_content(content: CellContent) -> Self {
        Self {
            content,
            valign: VAlign::default(),
            size: None,
            recorded_width: None,
        }
    }

    /// Set the requested vertical alignment.
    pub fn with_valign(mut self, valign: VAlign) -> Self {
        self.valign = valign;
        self
    }

    /// The cell's content.
    pub fn content(&self) -> &CellContent {
        &self.content
    }

    /// The requested vertical alignment.
    pub fn valign(&self) -> VAlign {
        self.valign
    }

    /// Returns `true` for separator cells.
    pub fn is_separator(&self) -> bool {
        matches!(self.content, CellContent::Separator)
    }

    /// Replace the cell's content, invalidating its cached size.
    ///
    /// The caller is responsible for relinking the cell into its column's
    /// width tracking afterwards.
    pub(crate) fn set_content(&mut self, content: CellContent) {
        if self.content != content {
            self.content = content;
            self.size = None;
        }
    }

    /// Drop the cached size so the next measurement pass re-queries the
    /// measurement service (theme or font change).
    pub(crate) fn invalidate_size(&mut self) {
        self.size = None;
    }

    /// Returns `true` once the measurement service has seen the current
    /// content.
    pub(crate) fn is_measured(&self) -> bool {
        self.size.is_some()
    }

    /// Measure the cell's natural size, caching the result.
    pub(crate) fn measure(&mut self, measure: &dyn CellMeasure, width_hint: Option<u32>) -> Size {
        if let Some(size) = self.size {
            return size;
        }
        let size = match &self.content {
            CellContent::Text(text) => measure.text_size(text, width_hint),
            CellContent::Image(name) => measure.image_size(name),
            CellContent::Separator => measure.separator_size(),
            CellContent::Empty => Size::ZERO,
        };
        self.size = Some(size);
        size
    }

    /// The cached natural size; zero until measured.
    pub(crate) fn cached_size(&self) -> Size {
        self.size.unwrap_or(Size::ZERO)
    }

    /// Draw the cell's content into `rect`. `color` is the resolved
    /// foreground for text and separator rules.
    pub(crate) fn draw(&self, painter: &mut dyn CellPainter, rect: Rect, color: Color) {
        match &self.content {
            CellContent::Text(text) => painter.draw_text(text, rect, color),
            CellContent::Image(name) => painter.draw_image(name, rect),
            CellContent::Separator => painter.draw_separator(rect, color),
            CellContent::Empty => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedMeasure;

    impl CellMeasure for FixedMeasure {
        fn text_size(&self, text: &str, _width_hint: Option<u32>) -> Size {
            Size::new(8 * text.chars().count() as u32, 16)
        }

        fn image_size(&self, _name: &str) -> Size {
            Size::new(12, 12)
        }
    }

    #[test]
    fn test_measure_caches() {
        let mut cell = Cell::text("abc");
        assert!(!cell.is_measured());
        assert_eq!(cell.measure(&FixedMeasure, None), Size::new(24, 16));
        assert!(cell.is_measured());
        assert_eq!(cell.cached_size(), Size::new(24, 16));
    }

    #[test]
    fn test_set_content_invalidates_size() {
        let mut cell = Cell::image("bullet-off");
        cell.measure(&FixedMeasure, None);
        cell.set_content(CellContent::Image("bullet-on".into()));
        assert!(!cell.is_measured());
        assert_eq!(cell.cached_size(), Size::ZERO);
    }

    #[test]
    fn test_same_content_keeps_size() {
        let mut cell = Cell::text("abc");
        cell.measure(&FixedMeasure, None);
        cell.set_content(CellContent::Text("abc".into()));
        assert!(cell.is_measured());
    }

    #[test]
    fn test_empty_and_separator_sizes() {
        let mut empty = Cell::empty();
        assert_eq!(empty.measure(&FixedMeasure, None), Size::ZERO);

        let mut separator = Cell::separator();
        assert_eq!(separator.measure(&FixedMeasure, None), Size::new(0, 2));
        assert!(separator.is_separator());
    }
}
