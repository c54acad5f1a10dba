//! 1-bit raster engine: bitmap plane, width-aware line drawing, and the
//! sketch canvas with its single undo slot.

pub mod bitmap;
pub mod canvas;
pub mod line;

pub use bitmap::{Bitmap, PixelOp, BITMAP_BYTES, CANVAS_HEIGHT, CANVAS_WIDTH, ROW_STRIDE_BYTES};
pub use canvas::{DrawMode, SketchCanvas};

/// A location on (or just off) the canvas.
///
/// Cursor coordinates are clamped to `[0, CANVAS_WIDTH] x [0, CANVAS_HEIGHT]`
/// inclusive, so a point may sit one past the last drawable pixel; drawing
/// primitives clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Point {
    pub x: i16,
    pub y: i16,
}

impl Point {
    /// Create a point
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }

    /// The canvas center, where the cursor starts
    pub const fn canvas_center() -> Self {
        Self {
            x: CANVAS_WIDTH / 2,
            y: CANVAS_HEIGHT / 2,
        }
    }
}
