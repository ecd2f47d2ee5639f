//! Ordered dithering pattern.
//!
//! This module defines the fixed 4x4 Bayer threshold matrix and the
//! per-position offset derived from it. Ordered dithering adds a
//! position-dependent offset to each channel before quantization so that
//! smooth gradients break into spatial patterns instead of hard bands.

/// The 4x4 Bayer ordered-dither matrix.
///
/// Values 0-15, each appearing exactly once, tiling every 4x4 pixel
/// block with 16 distinct threshold offsets:
///
/// ```text
///  0  8  2 10
/// 12  4 14  6
///  3 11  1  9
/// 15  7 13  5
/// ```
///
/// The matrix is indexed `BAYER_4X4[y % 4][x % 4]`. Because the pattern
/// is fixed and position-dependent, dithered output is bit-exact
/// reproducible for a given input and configuration.
pub const BAYER_4X4: [[u8; 4]; 4] = [
    [0, 8, 2, 10],
    [12, 4, 14, 6],
    [3, 11, 1, 9],
    [15, 7, 13, 5],
];

/// Normalized dither offset for the pixel at (x, y), in [-0.5, 0.5).
///
/// Computed as `(bayer + 0.5) / 16 - 0.5`, which centres the 16 threshold
/// steps on zero: the offsets average out to exactly 0 over any 4x4 tile,
/// so dithering never shifts the mean brightness of a region. Callers
/// scale the result by the shade step before adding it to a channel.
#[inline]
pub fn threshold_offset(x: u32, y: u32) -> f32 {
    let t = BAYER_4X4[(y % 4) as usize][(x % 4) as usize];
    (t as f32 + 0.5) / 16.0 - 0.5
}
