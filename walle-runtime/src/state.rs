//! The pen ("Wall-E") driven by a program.

use walle_value::Color;

/// Mutable pen state of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallEState {
    /// Pen position. May lie outside the canvas between moves.
    pub x: i64,
    pub y: i64,
    pub color: Color,
    /// Always a positive odd number.
    brush_size: i64,
    /// Whether circles and rectangles are drawn filled.
    pub filling: bool,
}

impl WallEState {
    pub fn new() -> Self {
        Self {
            x: 0,
            y: 0,
            color: Color::default(),
            brush_size: 1,
            filling: false,
        }
    }

    pub fn brush_size(&self) -> i64 {
        self.brush_size
    }

    /// Sets the brush size. Sizes below 1 become 1 and even sizes are rounded down to the
    /// previous odd number.
    pub fn set_brush_size(&mut self, size: i64) {
        self.brush_size = if size <= 0 {
            1
        } else if size % 2 == 0 {
            size - 1
        } else {
            size
        };
    }

    pub fn move_to(&mut self, x: i64, y: i64) {
        self.x = x;
        self.y = y;
    }
}

impl Default for WallEState {
    fn default() -> Self {
        Self::new()
    }
}
