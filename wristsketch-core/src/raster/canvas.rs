//! The sketch canvas: owned image, single undo slot, and stroke logic.
//!
//! The canvas owns its raster buffer outright. Strokes mutate the buffer at
//! cursor-move time; redraw blits the buffer onto the caller's display
//! surface and composites the cursor overlay there, never the other way
//! around. The image is allocated lazily on the first stroke and discarded
//! entirely on clear, so "no drawing" is a real state, distinct from a
//! blank page.

use super::bitmap::{Bitmap, CANVAS_HEIGHT, CANVAS_WIDTH};
use super::line;
use super::{PixelOp, Point};
use crate::settings::Settings;

/// Current drawing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DrawMode {
    /// Cursor moves without marking
    Idle,
    /// Cursor lays down ink
    Pen,
    /// Cursor restores background
    Eraser,
}

impl DrawMode {
    /// Check if this mode marks the canvas as the cursor moves
    pub fn is_drawing(self) -> bool {
        matches!(self, DrawMode::Pen | DrawMode::Eraser)
    }
}

/// Sketch canvas with one-level undo.
///
/// At most one undo snapshot exists at any time; it is captured when a
/// drawing mode is entered from idle and consumed (or, with double-undo,
/// exchanged) by [`SketchCanvas::undo`].
pub struct SketchCanvas {
    image: Option<Bitmap>,
    undo: Option<Bitmap>,
    mode: DrawMode,
    cursor: Point,
    last: Point,
    pen_width: u8,
    eraser_width: u8,
    cursor_while_drawing: bool,
    double_undo: bool,
    dirty: bool,
}

impl SketchCanvas {
    /// Create an empty canvas with the cursor at center
    pub fn new() -> Self {
        Self {
            image: None,
            undo: None,
            mode: DrawMode::Idle,
            cursor: Point::canvas_center(),
            last: Point::canvas_center(),
            pen_width: 1,
            eraser_width: 3,
            cursor_while_drawing: true,
            double_undo: false,
            dirty: false,
        }
    }

    /// Adopt style and behavior settings
    pub fn apply_settings(&mut self, settings: &Settings) {
        self.pen_width = settings.pen_width;
        self.eraser_width = settings.eraser_width;
        self.cursor_while_drawing = settings.cursor_while_drawing;
        self.double_undo = settings.double_undo;
    }

    /// Current drawing mode
    pub fn mode(&self) -> DrawMode {
        self.mode
    }

    /// Current cursor location
    pub fn cursor(&self) -> Point {
        self.cursor
    }

    /// The image, or `None` when there is no drawing
    pub fn image(&self) -> Option<&Bitmap> {
        self.image.as_ref()
    }

    /// Read-only image bytes, or `None` when there is no drawing
    pub fn image_bytes(&self) -> Option<&[u8]> {
        self.image.as_ref().map(|image| image.bytes())
    }

    /// The image buffer, allocated blank if absent
    pub fn ensure_image(&mut self) -> &mut Bitmap {
        self.image.get_or_insert_with(Bitmap::new)
    }

    /// Check whether the image changed since the last save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Mark the image as persisted
    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Install a freshly loaded image (or none) without marking it dirty
    pub fn restore_image(&mut self, image: Option<Bitmap>) {
        self.image = image;
    }

    /// Move the cursor, applying a stroke if a drawing mode is active.
    ///
    /// Coordinates clamp to the canvas bounds; a move to the current
    /// location is ignored so repeated sensor reads at rest neither mark
    /// nor invalidate anything.
    pub fn set_cursor(&mut self, location: Point) {
        let location = Point::new(
            location.x.clamp(0, CANVAS_WIDTH),
            location.y.clamp(0, CANVAS_HEIGHT),
        );
        if location == self.cursor {
            return;
        }
        self.last = self.cursor;
        self.cursor = location;
        match self.mode {
            DrawMode::Pen => self.pen_stroke(),
            DrawMode::Eraser => self.erase_at_cursor(),
            DrawMode::Idle => {}
        }
    }

    /// Apply a pen stroke from the previous to the current cursor location
    fn pen_stroke(&mut self) {
        let (from, to, width) = (self.last, self.cursor, self.pen_width);
        let small_move = (to.x - from.x).abs() <= 1 && (to.y - from.y).abs() <= 1;
        let image = self.image.get_or_insert_with(Bitmap::new);

        if width <= 1 {
            if small_move {
                image.apply(to.x, to.y, PixelOp::Set);
            } else {
                line::draw_segment(image, from, to, 1, PixelOp::Set);
            }
        } else {
            if !small_move {
                line::draw_segment(image, from, to, width, PixelOp::Set);
            }
            // Round the stroke end
            line::fill_circle(image, to, (width / 2) as i16, PixelOp::Set);
        }
        self.dirty = true;
    }

    /// Erase the configured square footprint at the cursor.
    ///
    /// With no image there is nothing to erase; the result would be
    /// indistinguishable from allocating and clearing, so no allocation
    /// happens.
    fn erase_at_cursor(&mut self) {
        let (center, width) = (self.cursor, self.eraser_width);
        if let Some(image) = self.image.as_mut() {
            line::fill_square(image, center, width, PixelOp::Clear);
            self.dirty = true;
        }
    }

    /// Toggle pen mode.
    ///
    /// Entering from idle snapshots for undo first; switching over from
    /// eraser transitions directly without re-snapshotting; toggling while
    /// pen is active returns to idle.
    pub fn toggle_pen(&mut self) -> DrawMode {
        self.mode = match self.mode {
            DrawMode::Pen => DrawMode::Idle,
            DrawMode::Eraser => DrawMode::Pen,
            DrawMode::Idle => {
                self.snapshot_for_undo();
                DrawMode::Pen
            }
        };
        self.mode
    }

    /// Toggle eraser mode; same transition rules as [`Self::toggle_pen`].
    ///
    /// Entering eraser immediately erases at the cursor, so the footprint
    /// takes effect even before the first move.
    pub fn toggle_eraser(&mut self) -> DrawMode {
        self.mode = match self.mode {
            DrawMode::Eraser => DrawMode::Idle,
            DrawMode::Pen => DrawMode::Eraser,
            DrawMode::Idle => {
                self.snapshot_for_undo();
                DrawMode::Eraser
            }
        };
        if self.mode == DrawMode::Eraser {
            self.erase_at_cursor();
        }
        self.mode
    }

    /// Force idle (pause, focus loss); never snapshots
    pub fn set_idle(&mut self) {
        self.mode = DrawMode::Idle;
    }

    /// Capture the undo snapshot.
    ///
    /// With an image, overwrite the slot with a copy; without one, discard
    /// any existing slot; there is no undo for an empty canvas.
    pub fn snapshot_for_undo(&mut self) {
        self.undo = self.image.clone();
    }

    /// Restore the undo snapshot; returns whether anything happened.
    ///
    /// With double-undo enabled the live image and the slot are exchanged,
    /// so a second consecutive undo restores the pre-undo state. Otherwise
    /// the slot moves over the live image and is consumed.
    pub fn undo(&mut self) -> bool {
        if self.undo.is_none() {
            return false;
        }
        if self.double_undo {
            core::mem::swap(&mut self.image, &mut self.undo);
        } else {
            self.image = self.undo.take();
        }
        self.dirty = true;
        true
    }

    /// Discard the image entirely (absent, not zero-filled); returns
    /// whether there was one.
    pub fn clear(&mut self) -> bool {
        if self.image.is_none() {
            return false;
        }
        self.image = None;
        self.dirty = true;
        true
    }

    /// Render onto a display surface: blit the image (or background), then
    /// composite the cursor overlay by inversion.
    ///
    /// Eraser mode shows its footprint outline; pen mode shows the
    /// crosshair only when cursor-while-drawing is enabled; idle always
    /// shows the crosshair. Rendering never mutates the canvas.
    pub fn render(&self, surface: &mut Bitmap) {
        match &self.image {
            Some(image) => surface.bytes_mut().copy_from_slice(image.bytes()),
            None => surface.bytes_mut().fill(0),
        }
        match self.mode {
            DrawMode::Eraser => {
                line::outline_square(surface, self.cursor, self.eraser_width, PixelOp::Toggle)
            }
            DrawMode::Pen if !self.cursor_while_drawing => {}
            _ => line::draw_crosshair(surface, self.cursor, PixelOp::Toggle),
        }
    }
}

impl Default for SketchCanvas {
    fn default() -> Self {
        Self::new()
    }
}
