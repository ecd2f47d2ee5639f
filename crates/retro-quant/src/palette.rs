//! Retro palette styles and their color math.
//!
//! Four palettes are supported, matching the classic handheld looks:
//! monochrome green, plain grayscale, sepia, and posterized full color.
//! The fixed constants here (luminance weights, sepia matrix, green
//! endpoints) define the visual identity of the output; changing them
//! changes every photo.

use std::fmt;
use std::str::FromStr;

/// Rec. 709 luma weights used for the grayscale and green palettes.
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

/// Dark endpoint of the monochrome-green ramp.
const GREEN_DARK: [f32; 3] = [18.0, 56.0, 18.0];
/// Light endpoint of the monochrome-green ramp (yellow-green).
const GREEN_LIGHT: [f32; 3] = [172.0, 196.0, 46.0];

/// Sepia channel weights, row per output channel (R', G', B').
///
/// Deliberately hotter than the textbook sepia matrix; the sums can
/// exceed 255 and are clamped, which blows out highlights for a
/// high-contrast aged-print look.
const SEPIA: [[f32; 3]; 3] = [
    [0.45, 0.85, 0.22],
    [0.40, 0.78, 0.20],
    [0.25, 0.58, 0.12],
];

/// Which retro palette a frame is mapped through.
///
/// The wire names (config files, CLI) are the short forms `"gb"`,
/// `"gray"`, `"sepia"` and `"color"`; see the [`FromStr`] impl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaletteStyle {
    /// Monochrome green: luminance mapped onto a dark-green to
    /// yellow-green ramp.
    GameBoy,
    /// Plain grayscale: quantized luminance on all three channels.
    #[default]
    Grayscale,
    /// Warm sepia tone, quantized per channel.
    Sepia,
    /// Original colors, posterized per channel.
    FullColor,
}

impl PaletteStyle {
    /// The short wire name for this palette.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaletteStyle::GameBoy => "gb",
            PaletteStyle::Grayscale => "gray",
            PaletteStyle::Sepia => "sepia",
            PaletteStyle::FullColor => "color",
        }
    }

    /// True for the palettes that collapse a pixel to a single
    /// luminance value before quantization.
    #[inline]
    pub fn is_luminance_based(&self) -> bool {
        matches!(self, PaletteStyle::GameBoy | PaletteStyle::Grayscale)
    }
}

impl fmt::Display for PaletteStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown palette name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePaletteError(pub String);

impl fmt::Display for ParsePaletteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown palette {:?} (expected gb, gray, sepia or color)",
            self.0
        )
    }
}

impl std::error::Error for ParsePaletteError {}

impl FromStr for PaletteStyle {
    type Err = ParsePaletteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gb" => Ok(PaletteStyle::GameBoy),
            "gray" => Ok(PaletteStyle::Grayscale),
            "sepia" => Ok(PaletteStyle::Sepia),
            "color" => Ok(PaletteStyle::FullColor),
            other => Err(ParsePaletteError(other.to_string())),
        }
    }
}

/// Rec. 709 luminance of an RGB triple, in [0, 255].
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32
}

/// Sepia-tone an RGB triple. Each output channel is a weighted sum of
/// the inputs, clamped to 255.
#[inline]
pub fn sepia_tone(r: u8, g: u8, b: u8) -> [f32; 3] {
    let rgb = [r as f32, g as f32, b as f32];
    let mut out = [0.0f32; 3];
    for (o, weights) in out.iter_mut().zip(SEPIA.iter()) {
        *o = (weights[0] * rgb[0] + weights[1] * rgb[1] + weights[2] * rgb[2]).min(255.0);
    }
    out
}

/// Map a quantized luminance value (0-255) onto the green ramp.
///
/// Linear interpolation between [`GREEN_DARK`] and [`GREEN_LIGHT`] with
/// the luminance normalized to [0, 1]; each channel rounds to the
/// nearest byte.
#[inline]
pub fn green_shade(quantized_luma: u8) -> [u8; 3] {
    let t = quantized_luma as f32 / 255.0;
    let mut out = [0u8; 3];
    for i in 0..3 {
        out[i] = (GREEN_DARK[i] + (GREEN_LIGHT[i] - GREEN_DARK[i]) * t).round() as u8;
    }
    out
}
