//! Geometry of the fixed 10x10 board.

use std::ops::RangeInclusive;

/// Width and height of the board.
pub const SIZE: i32 = 10;

/// Returns true if `v` is a valid coordinate component, i.e. within `[0, 9]`.
pub fn in_grid(v: i32) -> bool {
    v >= 0 && v < SIZE
}

/// Clamp an inclusive range to the bounds of the grid. Used when enumerating
/// candidate cells around a known hit.
pub fn clamp_range(min: i32, max: i32) -> RangeInclusive<i32> {
    min.max(0)..=max.min(SIZE - 1)
}
