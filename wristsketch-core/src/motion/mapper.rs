//! Accelerometer batches to cursor locations.
//!
//! The device is held at some arbitrary resting attitude when drawing
//! starts, so absolute orientation is useless; everything is measured
//! against a captured reference. The first valid batch after a reset
//! becomes the "center": its gravity vector is converted to a pair of
//! pseudo-angles (one per tilt plane) and stored. Every later batch is
//! low-pass filtered, converted the same way, and the wrapping angular
//! difference from center is mapped linearly onto the canvas.

use super::{AccelSample, Sensitivity};
use crate::intmath::{angle_diff, atan2_lookup, divide, isqrt};
use crate::raster::{Point, CANVAS_HEIGHT, CANVAS_WIDTH};

/// Single-pole IIR smoothing: filtered = filtered * 0.9 + raw * 0.1.
///
/// Batch averages of a handful of samples are still jittery at rest; one
/// decade of smoothing settles the cursor without noticeable lag at the
/// 25 Hz-ish batch rate.
const FILTER_NUM: i32 = 9;
const FILTER_DEN: i32 = 10;

/// Maps averaged tilt angles onto canvas cursor locations
pub struct CursorMapper {
    centered: bool,
    center_x: u16,
    center_y: u16,
    /// Last raw per-axis batch average, milli-g
    raw: [i32; 3],
    /// Low-pass filtered vector, same shape as `raw`
    filtered: [i32; 3],
    max_tilt: i16,
}

impl CursorMapper {
    /// Create a mapper; the first valid batch will center it
    pub fn new(sensitivity: Sensitivity) -> Self {
        Self {
            centered: false,
            center_x: 0,
            center_y: 0,
            raw: [0; 3],
            filtered: [0; 3],
            max_tilt: sensitivity.max_tilt(),
        }
    }

    /// Adopt a new sensitivity preset; the current center is kept
    pub fn set_sensitivity(&mut self, sensitivity: Sensitivity) {
        self.max_tilt = sensitivity.max_tilt();
    }

    /// Drop the center; the next valid batch re-centers.
    ///
    /// Wired to the re-center button, focus regain, and overlay dismissal.
    pub fn reset(&mut self) {
        self.centered = false;
    }

    /// Check whether a center reference is held
    pub fn is_centered(&self) -> bool {
        self.centered
    }

    /// Process one sensor batch.
    ///
    /// A batch containing any vibration-flagged sample is discarded whole
    /// with no state change. The centering batch produces no output; every
    /// later valid batch yields a clamped cursor location.
    pub fn handle_batch(&mut self, samples: &[AccelSample]) -> Option<Point> {
        if samples.is_empty() {
            return None;
        }

        let mut total = [0i32; 3];
        for sample in samples {
            if sample.vibration {
                return None;
            }
            total[0] += sample.x as i32;
            // Sensor y grows toward the wearer; canvas y grows downward
            total[1] += -(sample.y as i32);
            total[2] += sample.z as i32;
        }

        let count = samples.len() as i32;
        let avg = [
            divide(total[0], count),
            divide(total[1], count),
            divide(total[2], count),
        ];
        self.raw = avg;

        if !self.centered {
            let (angle_x, angle_y) = tilt_angles(avg[0], avg[1], avg[2]);
            self.center_x = angle_x;
            self.center_y = angle_y;
            self.filtered = avg;
            self.centered = true;
            #[cfg(feature = "defmt")]
            defmt::debug!("tilt centered - x: {}, y: {}", angle_x, angle_y);
            return None;
        }

        for axis in 0..3 {
            self.filtered[axis] =
                divide(self.filtered[axis] * FILTER_NUM + avg[axis], FILTER_DEN);
        }

        let (angle_x, angle_y) = tilt_angles(self.filtered[0], self.filtered[1], self.filtered[2]);
        let diff_x = angle_diff(angle_x, self.center_x);
        let diff_y = angle_diff(angle_y, self.center_y);

        Some(Point::new(
            tilt_to_coord(diff_x, self.max_tilt, CANVAS_WIDTH),
            tilt_to_coord(diff_y, self.max_tilt, CANVAS_HEIGHT),
        ))
    }
}

/// Convert an acceleration vector to per-plane pseudo-angles.
///
/// Each plane's angle is the arctangent of its axis against the magnitude
/// of the other two; a positive z negates that adjacent term, flipping the
/// projection so the angle keeps advancing (rather than folding back) as
/// the device rotates past face-down.
fn tilt_angles(x: i32, y: i32, z: i32) -> (u16, u16) {
    let mut adj = isqrt((y * y + z * z) as u32) as i32;
    if z > 0 {
        adj = -adj;
    }
    let angle_x = atan2_lookup(x, adj);

    let mut adj = isqrt((x * x + z * z) as u32) as i32;
    if z > 0 {
        adj = -adj;
    }
    let angle_y = atan2_lookup(y, adj);

    (angle_x, angle_y)
}

/// Map a clamped tilt difference onto a canvas axis: [-max, max] linearly
/// onto [0, extent] around the midpoint, saturating beyond the preset.
fn tilt_to_coord(diff: i16, max_tilt: i16, extent: i16) -> i16 {
    if diff < -max_tilt {
        return 0;
    }
    if diff > max_tilt {
        return extent;
    }
    let half = (extent / 2) as i32;
    (half + divide(diff as i32 * half, max_tilt as i32)) as i16
}
