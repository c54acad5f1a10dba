//! Integer math primitives for the tilt pipeline.
//!
//! Everything downstream of the accelerometer runs on integers: division
//! rounds the remainder away from zero (plain `/` truncates toward zero,
//! which would bias the cursor toward center), the square root rounds to
//! nearest, and angles live in a 16-bit circular domain where 0 is 0° and
//! the wraparound at 65536 is 360°. Wrapping arithmetic in that domain is a
//! feature, not an accident: subtracting two angles as `u16` and
//! reinterpreting the result as `i16` yields the signed shortest-path
//! difference even across the 0°/360° seam.

/// Integer division with the remainder rounded away from zero.
///
/// `divide(7, 2)` is 4 and `divide(-7, 2)` is -4, where truncating division
/// would give 3 and -3.
pub fn divide(n: i32, d: i32) -> i32 {
    if (n < 0) != (d < 0) {
        (n - d / 2) / d
    } else {
        (n + d / 2) / d
    }
}

/// Integer square root, rounded to nearest.
///
/// Bit-by-bit method: digit-by-digit extraction over base-4 place values,
/// then one comparison against the remainder to round.
pub fn isqrt(input: u32) -> u32 {
    if input == 0 {
        return 0;
    }

    let mut op = input;
    let mut result = 0u32;

    // Find the highest power of four <= the input
    let mut one = 1u32 << 30;
    while one > op {
        one >>= 2;
    }

    // Extract the root
    while one != 0 {
        if op >= result + one {
            op -= result + one;
            result += 2 * one;
        }
        result >>= 1;
        one >>= 2;
    }

    // Round to nearest
    if op > result {
        result += 1;
    }

    result
}

/// One sixteenth of a turn (22.5°) in angle units
const EIGHTH_TURN: u16 = 8192;

/// A quarter turn (90°) in angle units
const QUARTER_TURN: u16 = 16384;

/// A half turn (180°) in angle units
const HALF_TURN: u16 = 32768;

/// atan(i/32) for i in 0..=32, in 16-bit circular angle units.
///
/// Covers the first octant; [`atan2_lookup`] folds every other octant onto
/// this table.
const ATAN_TABLE: [u16; 33] = [
    0, 326, 651, 975, 1297, 1617, 1933, 2246, 2555, 2860, 3159, 3453, 3742, 4025, 4302, 4572,
    4836, 5094, 5344, 5589, 5826, 6058, 6282, 6500, 6712, 6917, 7117, 7310, 7498, 7679, 7856,
    8026, 8192,
];

/// Interpolated table lookup of atan(num/1024) for num in 0..=1024
fn atan_lookup(num: u32) -> u16 {
    let index = (num >> 5) as usize;
    let frac = (num & 31) as u32;
    if index >= 32 {
        return EIGHTH_TURN;
    }
    let a = ATAN_TABLE[index] as u32;
    let b = ATAN_TABLE[index + 1] as u32;
    (a + (((b - a) * frac + 16) >> 5)) as u16
}

/// Integer arctangent of `y/x` over the full 16-bit circular domain.
///
/// Returns the angle of the point `(x, y)` measured counterclockwise from
/// the positive x axis: 0 = 0°, 16384 = 90°, 32768 = 180°, 49152 = 270°.
/// `atan2_lookup(0, 0)` is 0.
pub fn atan2_lookup(y: i32, x: i32) -> u16 {
    let ax = x.unsigned_abs();
    let ay = y.unsigned_abs();
    if ax == 0 && ay == 0 {
        return 0;
    }

    // First-quadrant angle via octant folding
    let base = if ay <= ax {
        atan_lookup((((ay as u64) << 10) / ax as u64) as u32)
    } else {
        QUARTER_TURN - atan_lookup((((ax as u64) << 10) / ay as u64) as u32)
    };

    // Place into the correct quadrant; wrapping handles the 360° seam
    match (x < 0, y < 0) {
        (false, false) => base,
        (true, false) => HALF_TURN - base,
        (true, true) => HALF_TURN + base,
        (false, true) => 0u16.wrapping_sub(base),
    }
}

/// Signed difference between two circular angles.
///
/// Subtracts as `u16` and reinterprets as `i16`, so the result is the
/// shortest signed path from `center` to `angle` and inverts correctly when
/// the device rotates past 180°.
pub fn angle_diff(angle: u16, center: u16) -> i16 {
    angle.wrapping_sub(center) as i16
}
