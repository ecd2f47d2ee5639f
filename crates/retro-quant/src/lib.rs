//! retro-quant: palette quantization and ordered dithering for retro
//! camera frames.
//!
//! This library is the algorithmic core of retrocam. It turns a full-color
//! RGBA frame into a limited-shade, limited-palette image the way a vintage
//! handheld camera would: posterize to a small number of shades, optionally
//! spread the quantization error with a fixed ordered-dither pattern, and
//! map the result through one of four retro palettes.
//!
//! # Quick Start
//!
//! ```
//! use retro_quant::{quantize, PixelBuffer, QuantizeOptions, PaletteStyle};
//!
//! let mut frame = PixelBuffer::filled(4, 4, [128, 128, 128, 255]);
//! let options = QuantizeOptions::new().palette(PaletteStyle::Grayscale);
//! quantize(&mut frame, &options);
//! ```
//!
//! # Pipeline Overview
//!
//! ```text
//! RGBA input               (one frame from the capture pipeline)
//!     |
//!     v
//! [Palette branch]
//!     FullColor  -> keep R, G, B as-is
//!     Sepia      -> fixed weighted sums per channel
//!     Grayscale  -> Rec. 709 luminance
//!     GameBoy    -> Rec. 709 luminance
//!     |
//!     v
//! [Ordered dither]          (optional; Bayer 4x4 threshold offset,
//!     |                      one offset scalar shared by R/G/B)
//!     v
//! [Snap to shade grid]      (round(value / step) * step,
//!     |                      step = 255 / (levels - 1))
//!     v
//! [Palette mapping]
//!     Grayscale  -> quantized luminance on all channels
//!     GameBoy    -> lerp dark-green..yellow-green by luminance
//!     others     -> quantized channels directly
//! ```
//!
//! # Why Ordered Dithering
//!
//! With 2-16 shades, hard posterization flattens smooth gradients into
//! visible bands. The Bayer matrix tiles every 4x4 pixel block with 16
//! distinct threshold offsets, so neighbouring pixels snap to different
//! sides of a shade boundary and the eye averages them back into an
//! intermediate tone. The pattern is fixed and position-dependent, which
//! keeps the whole pass bit-exact reproducible -- the same frame and
//! options always produce the same bytes, unlike error diffusion whose
//! output depends on scan order, or noise dithering which needs an RNG.
//!
//! The offset for a pixel is `((bayer + 0.5) / 16 - 0.5) * step`: centred
//! on zero so dithering never shifts the mean brightness, and scaled by
//! the shade step so the pattern stays equally visible at every level
//! count. For [`PaletteStyle::FullColor`] and [`PaletteStyle::Sepia`] the
//! same offset scalar is applied to R, G and B of a pixel; independent
//! per-channel phases would decorrelate the channels and tint the
//! dither pattern.
//!
//! # Scaling
//!
//! The [`scale`] module carries the resolution half of the retro look:
//! box-filter downsampling to the processing resolution and
//! nearest-neighbor upscaling that preserves the hard pixel edges.

pub mod buffer;
pub mod dither;
pub mod options;
pub mod palette;
pub mod quantize;
pub mod scale;


pub use buffer::PixelBuffer;
pub use dither::{threshold_offset, BAYER_4X4};
pub use options::{QuantizeOptions, ShadeLevels};
pub use palette::PaletteStyle;
pub use quantize::quantize;
