//! The quantization pass.
//!
//! [`quantize`] rewrites a frame in place: every pixel's RGB channels are
//! replaced by their quantized, palette-mapped values while alpha passes
//! through untouched. The pass is stateless and total -- any valid buffer
//! and options produce a result, and a zero-area buffer is a no-op.

use crate::buffer::PixelBuffer;
use crate::dither::threshold_offset;
use crate::options::QuantizeOptions;
use crate::palette::{green_shade, luminance, sepia_tone, PaletteStyle};

/// Quantize a frame in place.
///
/// For each pixel, the channel values are optionally nudged by the
/// ordered-dither offset for that position, clamped to [0, 255], and
/// snapped to the nearest multiple of `step = 255 / (levels - 1)`.
/// The palette decides what feeds the snap:
///
/// - [`PaletteStyle::FullColor`]: R, G and B snap independently, all
///   three sharing the pixel's single dither offset.
/// - [`PaletteStyle::Sepia`]: a fixed warm weighting is applied first,
///   then the channels snap as in full color.
/// - [`PaletteStyle::Grayscale`]: the Rec. 709 luminance snaps once and
///   lands on all three channels.
/// - [`PaletteStyle::GameBoy`]: the snapped luminance indexes into the
///   dark-green..yellow-green ramp.
///
/// Determinism: the dither pattern depends only on pixel position, so
/// two calls with the same buffer and options produce byte-identical
/// output. Rounding is round-half-away-from-zero (`f32::round`)
/// throughout.
pub fn quantize(frame: &mut PixelBuffer, options: &QuantizeOptions) {
    if frame.is_empty() {
        return;
    }

    let step = options.levels.step();
    let (width, height) = (frame.width(), frame.height());

    for y in 0..height {
        for x in 0..width {
            let [r, g, b, a] = frame.pixel(x, y);
            let offset = if options.dither {
                threshold_offset(x, y) * step
            } else {
                0.0
            };

            let rgb = match options.palette {
                PaletteStyle::FullColor => [
                    snap(r as f32 + offset, step),
                    snap(g as f32 + offset, step),
                    snap(b as f32 + offset, step),
                ],
                PaletteStyle::Sepia => {
                    let toned = sepia_tone(r, g, b);
                    [
                        snap(toned[0] + offset, step),
                        snap(toned[1] + offset, step),
                        snap(toned[2] + offset, step),
                    ]
                }
                PaletteStyle::Grayscale => {
                    let q = snap(luminance(r, g, b) + offset, step);
                    [q, q, q]
                }
                PaletteStyle::GameBoy => {
                    let q = snap(luminance(r, g, b) + offset, step);
                    green_shade(q)
                }
            };

            frame.set_pixel(x, y, [rgb[0], rgb[1], rgb[2], a]);
        }
    }
}

/// Clamp to [0, 255] and snap to the nearest multiple of `step`.
#[inline]
fn snap(value: f32, step: f32) -> u8 {
    let clamped = value.clamp(0.0, 255.0);
    ((clamped / step).round() * step).round().clamp(0.0, 255.0) as u8
}
