//! Frame resizing.
//!
//! Two samplers, one per direction of travel through the pipeline:
//!
//! - [`resize_box`] -- area-average downsampling to the processing
//!   resolution. Averaging keeps the low-res frame faithful to the
//!   source instead of aliasing on whatever pixels a point sampler hits.
//! - [`resize_nearest`] -- nearest-neighbor for every upscale (preview
//!   display, photo output, export). No blending, so the quantized
//!   pixels stay hard-edged, which is the retro aesthetic.

use crate::buffer::PixelBuffer;

/// Height matching `target_w` at the source's aspect ratio, rounded to
/// the nearest integer. A degenerate source (zero width) yields 0.
#[inline]
pub fn aspect_height(src_w: u32, src_h: u32, target_w: u32) -> u32 {
    if src_w == 0 {
        return 0;
    }
    (src_h as f64 / src_w as f64 * target_w as f64).round() as u32
}

/// Resize with nearest-neighbor sampling.
///
/// Each destination pixel copies the source pixel whose index is
/// `floor(dst_index * src_dim / dst_dim)` -- no interpolation, hard
/// edges preserved. Works for both up- and downscaling; a zero-area
/// target returns an empty buffer.
pub fn resize_nearest(src: &PixelBuffer, dst_w: u32, dst_h: u32) -> PixelBuffer {
    if src.is_empty() || dst_w == 0 || dst_h == 0 {
        return PixelBuffer::new(dst_w, dst_h);
    }

    let mut dst = PixelBuffer::new(dst_w, dst_h);
    let (src_w, src_h) = (src.width() as u64, src.height() as u64);
    for y in 0..dst_h {
        let sy = (y as u64 * src_h / dst_h as u64) as u32;
        for x in 0..dst_w {
            let sx = (x as u64 * src_w / dst_w as u64) as u32;
            dst.set_pixel(x, y, src.pixel(sx, sy));
        }
    }
    dst
}

/// Resize by an integer factor with nearest-neighbor sampling.
///
/// Convenience wrapper used by the exporter; `factor` must be >= 1
/// (enforced by the caller's config validation).
pub fn scale_nearest(src: &PixelBuffer, factor: u32) -> PixelBuffer {
    resize_nearest(src, src.width() * factor, src.height() * factor)
}

/// Downsample with a box filter (area average).
///
/// Each destination pixel averages the rectangular block of source
/// pixels it covers, per channel (alpha included). Block boundaries are
/// `floor(i * src / dst)`, widened to at least one pixel, so the blocks
/// tile the source exactly. Shrinking is the intended use; for targets
/// at or above the source size the blocks collapse to single pixels and
/// the result matches nearest-neighbor.
pub fn resize_box(src: &PixelBuffer, dst_w: u32, dst_h: u32) -> PixelBuffer {
    if src.is_empty() || dst_w == 0 || dst_h == 0 {
        return PixelBuffer::new(dst_w, dst_h);
    }

    let mut dst = PixelBuffer::new(dst_w, dst_h);
    let (src_w, src_h) = (src.width() as u64, src.height() as u64);

    for y in 0..dst_h {
        let y0 = (y as u64 * src_h / dst_h as u64) as u32;
        let y1 = (((y + 1) as u64 * src_h) / dst_h as u64).max(y0 as u64 + 1) as u32;
        for x in 0..dst_w {
            let x0 = (x as u64 * src_w / dst_w as u64) as u32;
            let x1 = (((x + 1) as u64 * src_w) / dst_w as u64).max(x0 as u64 + 1) as u32;

            let mut sums = [0u64; 4];
            for sy in y0..y1.min(src.height()) {
                for sx in x0..x1.min(src.width()) {
                    let px = src.pixel(sx, sy);
                    for (sum, channel) in sums.iter_mut().zip(px.iter()) {
                        *sum += *channel as u64;
                    }
                }
            }

            let count = ((y1.min(src.height()) - y0) as u64 * (x1.min(src.width()) - x0) as u64)
                .max(1);
            let mut out = [0u8; 4];
            for (o, sum) in out.iter_mut().zip(sums.iter()) {
                *o = ((*sum as f64 / count as f64).round() as i64).clamp(0, 255) as u8;
            }
            dst.set_pixel(x, y, out);
        }
    }
    dst
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkerboard(size: u32) -> PixelBuffer {
        let mut buf = PixelBuffer::new(size, size);
        for y in 0..size {
            for x in 0..size {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                buf.set_pixel(x, y, [v, v, v, 255]);
            }
        }
        buf
    }

    #[test]
    fn test_aspect_height_rounds() {
        // 1280x720 at width 320 -> 180 exactly.
        assert_eq!(aspect_height(1280, 720, 320), 180);
        // 640x479 at width 160 -> 119.75 -> 120.
        assert_eq!(aspect_height(640, 479, 160), 120);
        assert_eq!(aspect_height(0, 480, 160), 0);
    }

    #[test]
    fn test_nearest_identity() {
        let src = checkerboard(4);
        let dst = resize_nearest(&src, 4, 4);
        assert_eq!(dst.data(), src.data());
    }

    #[test]
    fn test_nearest_upscale_preserves_blocks() {
        let mut src = PixelBuffer::new(2, 1);
        src.set_pixel(0, 0, [255, 0, 0, 255]);
        src.set_pixel(1, 0, [0, 0, 255, 255]);

        let dst = resize_nearest(&src, 4, 2);
        assert_eq!(dst.pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(dst.pixel(1, 0), [255, 0, 0, 255]);
        assert_eq!(dst.pixel(2, 1), [0, 0, 255, 255]);
        assert_eq!(dst.pixel(3, 1), [0, 0, 255, 255]);
    }

    #[test]
    fn test_nearest_never_blends() {
        let src = checkerboard(8);
        let dst = resize_nearest(&src, 24, 24);
        for y in 0..24 {
            for x in 0..24 {
                let [r, _, _, _] = dst.pixel(x, y);
                assert!(r == 0 || r == 255, "blended value {} at ({}, {})", r, x, y);
            }
        }
    }

    #[test]
    fn test_scale_nearest_factor() {
        let src = checkerboard(3);
        let dst = scale_nearest(&src, 4);
        assert_eq!(dst.width(), 12);
        assert_eq!(dst.height(), 12);
        assert_eq!(dst.pixel(0, 0), src.pixel(0, 0));
        assert_eq!(dst.pixel(11, 11), src.pixel(2, 2));
    }

    #[test]
    fn test_box_averages_blocks() {
        // A 2x2 checkerboard shrunk to 1x1 averages to mid-gray.
        let src = checkerboard(2);
        let dst = resize_box(&src, 1, 1);
        assert_eq!(dst.pixel(0, 0), [128, 128, 128, 255]);
    }

    #[test]
    fn test_box_uneven_blocks_cover_source() {
        // 5 -> 2: blocks of width 2 and 3; all source pixels contribute.
        let mut src = PixelBuffer::new(5, 1);
        for x in 0..5 {
            src.set_pixel(x, 0, [(x * 50) as u8, 0, 0, 255]);
        }
        let dst = resize_box(&src, 2, 1);
        // Block 0: pixels 0,1 -> (0+50)/2 = 25. Block 1: 2,3,4 -> 150.
        assert_eq!(dst.pixel(0, 0)[0], 25);
        assert_eq!(dst.pixel(1, 0)[0], 150);
    }

    #[test]
    fn test_zero_area_targets() {
        let src = checkerboard(4);
        assert!(resize_nearest(&src, 0, 4).is_empty());
        assert!(resize_box(&src, 4, 0).is_empty());
    }
}
