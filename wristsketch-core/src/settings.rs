//! User-adjustable settings.
//!
//! The settings menu itself is chrome and lives outside the core; it edits
//! a copy of this struct through the cycle helpers and hands the result to
//! the controller, which applies and persists it.

use serde::{Deserialize, Serialize};

use crate::motion::Sensitivity;

/// Narrowest pen stroke in pixels
pub const MIN_PEN_WIDTH: u8 = 1;

/// Widest pen stroke in pixels
pub const MAX_PEN_WIDTH: u8 = 9;

/// Narrowest eraser footprint in pixels
pub const MIN_ERASER_WIDTH: u8 = 1;

/// Widest eraser footprint in pixels
pub const MAX_ERASER_WIDTH: u8 = 15;

/// Application settings.
///
/// Widths are odd so strokes and footprints center on the cursor pixel;
/// the cycle helpers step by two to preserve that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    /// Pen stroke width in pixels (odd, 1..=9)
    pub pen_width: u8,
    /// Eraser footprint width in pixels (odd, 1..=15)
    pub eraser_width: u8,
    /// Tilt sensitivity preset
    pub sensitivity: Sensitivity,
    /// Undo exchanges instead of consuming, so a second undo undoes the
    /// undo
    pub double_undo: bool,
    /// Show the crosshair while the pen is down
    pub cursor_while_drawing: bool,
    /// Hold the backlight on while a drawing mode is active
    pub backlight_always_on: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pen_width: 1,
            eraser_width: 3,
            sensitivity: Sensitivity::Medium,
            double_undo: false,
            cursor_while_drawing: true,
            backlight_always_on: false,
        }
    }
}

impl Settings {
    /// Step to the next pen width, wrapping from the widest to the
    /// narrowest
    pub fn cycle_pen_width(&mut self) {
        self.pen_width = if self.pen_width >= MAX_PEN_WIDTH {
            MIN_PEN_WIDTH
        } else {
            self.pen_width + 2
        };
    }

    /// Step to the next eraser width, wrapping from the widest to the
    /// narrowest
    pub fn cycle_eraser_width(&mut self) {
        self.eraser_width = if self.eraser_width >= MAX_ERASER_WIDTH {
            MIN_ERASER_WIDTH
        } else {
            self.eraser_width + 2
        };
    }

    /// Step to the next sensitivity preset
    pub fn cycle_sensitivity(&mut self) {
        self.sensitivity = self.sensitivity.cycle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.pen_width, 1);
        assert_eq!(settings.eraser_width, 3);
        assert_eq!(settings.sensitivity, Sensitivity::Medium);
        assert!(!settings.double_undo);
        assert!(settings.cursor_while_drawing);
        assert!(!settings.backlight_always_on);
    }

    #[test]
    fn test_pen_width_cycle_stays_odd_and_bounded() {
        let mut settings = Settings::default();
        let mut widths = Vec::new();
        for _ in 0..10 {
            widths.push(settings.pen_width);
            settings.cycle_pen_width();
        }
        assert_eq!(&widths[..6], &[1, 3, 5, 7, 9, 1]);
        assert!(widths.iter().all(|w| w % 2 == 1));
    }

    #[test]
    fn test_eraser_width_cycle_wraps_at_fifteen() {
        let mut settings = Settings::default();
        settings.eraser_width = MAX_ERASER_WIDTH;
        settings.cycle_eraser_width();
        assert_eq!(settings.eraser_width, MIN_ERASER_WIDTH);
        settings.cycle_eraser_width();
        assert_eq!(settings.eraser_width, 3);
    }
}
