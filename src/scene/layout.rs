//! Shelf grid layout. Pure: the same viewport and item count always give
//! the same slots.

use crate::ui::{Rect, Size};

/// Widths below this use the compact two-column grid.
pub const MOBILE_BREAKPOINT: f32 = 768.0;
pub const MAX_COLUMNS: usize = 4;
/// One desktop column per this many pixels of width.
const COLUMN_STEP: f32 = 200.0;
/// Cartridge height / width.
pub const ITEM_ASPECT: f32 = 1.4;
/// Gap between a row's shelf line and the top of its items.
const ROW_INSET: f32 = 20.0;

#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub viewport: Size,
    pub columns: usize,
    pub item_width: f32,
    pub item_height: f32,
    pub spacing: f32,
    /// Y of the first shelf line.
    pub top: f32,
    pub row_height: f32,
    slots: Vec<Rect>,
}

impl GridLayout {
    pub fn compute(viewport: Size, count: usize) -> Self {
        let width = sanitize(viewport.width);
        let height = sanitize(viewport.height);
        let mobile = width < MOBILE_BREAKPOINT;

        let columns = if mobile {
            2
        } else {
            ((width / COLUMN_STEP).ceil() as usize).clamp(1, MAX_COLUMNS)
        };
        let (item_width, spacing) = if mobile { (80.0, 20.0) } else { (120.0, 40.0) };
        let item_height = item_width * ITEM_ASPECT;
        let top = height * 0.3;
        let row_height = (height * 0.25).max(item_height + spacing);

        let slots = (0..count)
            .map(|index| {
                let row = index / columns;
                let col = index % columns;
                let in_row = columns.min(count - row * columns);
                let row_width =
                    in_row as f32 * item_width + in_row.saturating_sub(1) as f32 * spacing;
                let start_x = (width - row_width) / 2.0;
                Rect::new(
                    start_x + col as f32 * (item_width + spacing),
                    top + row as f32 * row_height + ROW_INSET,
                    item_width,
                    item_height,
                )
            })
            .collect();

        Self {
            viewport: Size::new(width, height),
            columns,
            item_width,
            item_height,
            spacing,
            top,
            row_height,
            slots,
        }
    }

    /// Push every row down so the first shelf line sits at or below
    /// `floor`. Used to keep shelves clear of the navbar.
    pub fn clear_of(mut self, floor: f32) -> Self {
        let shift = floor - self.top;
        if shift > 0.0 {
            self.top += shift;
            for slot in self.slots.iter_mut() {
                *slot = slot.translated(0.0, shift);
            }
        }
        self
    }

    pub fn slot(&self, index: usize) -> Option<Rect> {
        self.slots.get(index).copied()
    }

    pub fn slots(&self) -> &[Rect] {
        &self.slots
    }

    pub fn rows(&self) -> usize {
        self.slots.len().div_ceil(self.columns)
    }

    /// Y of the shelf plank under `row`.
    pub fn shelf_y(&self, row: usize) -> f32 {
        self.top + row as f32 * self.row_height + ROW_INSET + self.item_height
    }

    /// Bottom of the last row plus one spacing of breathing room.
    pub fn content_height(&self) -> f32 {
        match self.rows() {
            0 => self.viewport.height,
            rows => self.shelf_y(rows - 1) + self.spacing * 2.0,
        }
    }
}

fn sanitize(v: f32) -> f32 {
    if v.is_finite() { v.max(0.0) } else { 0.0 }
}
