//! Quantization options.
//!
//! [`QuantizeOptions`] bundles everything [`quantize`](crate::quantize)
//! needs to know about a frame transform: how many shades, which palette,
//! and whether to dither. [`ShadeLevels`] restricts the shade count to
//! the four supported values so an invalid count is unrepresentable.

use std::fmt;

use crate::palette::PaletteStyle;

/// Number of quantization shades per channel.
///
/// Only 2, 4, 8 and 16 are supported -- the menu a vintage handheld
/// offered. The minimum of 2 guarantees `step = 255 / (levels - 1)`
/// never divides by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShadeLevels {
    /// Pure black and white (plus palette mapping).
    Two,
    /// The classic 4-shade look.
    #[default]
    Four,
    Eight,
    Sixteen,
}

impl ShadeLevels {
    /// The shade count as an integer.
    #[inline]
    pub fn count(&self) -> u32 {
        match self {
            ShadeLevels::Two => 2,
            ShadeLevels::Four => 4,
            ShadeLevels::Eight => 8,
            ShadeLevels::Sixteen => 16,
        }
    }

    /// Distance between adjacent shades on the 0-255 scale:
    /// `255 / (count - 1)`.
    ///
    /// `Two` yields 255.0 (output snaps to 0 or 255), `Four` yields 85.0.
    #[inline]
    pub fn step(&self) -> f32 {
        255.0 / (self.count() - 1) as f32
    }
}

impl fmt::Display for ShadeLevels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

/// Error returned when converting an unsupported shade count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidShadeCount(pub u32);

impl fmt::Display for InvalidShadeCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unsupported shade count {} (expected 2, 4, 8 or 16)", self.0)
    }
}

impl std::error::Error for InvalidShadeCount {}

impl TryFrom<u32> for ShadeLevels {
    type Error = InvalidShadeCount;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            2 => Ok(ShadeLevels::Two),
            4 => Ok(ShadeLevels::Four),
            8 => Ok(ShadeLevels::Eight),
            16 => Ok(ShadeLevels::Sixteen),
            other => Err(InvalidShadeCount(other)),
        }
    }
}

/// Configuration for one quantization pass.
///
/// Immutable value type; the capture pipeline clones the current options
/// into each frame transform so a settings change can never tear a frame
/// mid-pass.
///
/// # Example
///
/// ```
/// use retro_quant::{QuantizeOptions, PaletteStyle, ShadeLevels};
///
/// let options = QuantizeOptions::new()
///     .levels(ShadeLevels::Two)
///     .palette(PaletteStyle::GameBoy)
///     .dither(false);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuantizeOptions {
    /// Number of shades per channel.
    pub levels: ShadeLevels,
    /// Palette the quantized frame is mapped through.
    pub palette: PaletteStyle,
    /// Whether the ordered dither offset is applied before rounding.
    pub dither: bool,
}

impl QuantizeOptions {
    /// Options with the defaults: 4 shades, grayscale, no dithering.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the shade count.
    #[inline]
    pub fn levels(mut self, levels: ShadeLevels) -> Self {
        self.levels = levels;
        self
    }

    /// Set the palette style.
    #[inline]
    pub fn palette(mut self, palette: PaletteStyle) -> Self {
        self.palette = palette;
        self
    }

    /// Enable or disable ordered dithering.
    #[inline]
    pub fn dither(mut self, enabled: bool) -> Self {
        self.dither = enabled;
        self
    }
}
