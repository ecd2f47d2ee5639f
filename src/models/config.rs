//! Application configuration.
//!
//! Loaded from a YAML file (`retrocam.yaml` by default). Values outside
//! the supported menus (shade counts, palettes, processing widths) are
//! rejected at deserialization time, and a missing or unparsable file
//! falls back to defaults with a warning rather than refusing to start.

use std::fmt;
use std::path::Path;

use retro_quant::{PaletteStyle, QuantizeOptions, ShadeLevels};
use serde::{Deserialize, Deserializer};

/// Camera-facing preference, forwarded to the video source.
///
/// Maps onto the web constraint names: `Front` is `"user"`, `Back` is
/// `"environment"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FacingMode {
    Front,
    #[default]
    Back,
}

impl FacingMode {
    /// The facing-constraint wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::Front => "user",
            FacingMode::Back => "environment",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Downsample resolution the retro effect is computed at.
///
/// Deliberately low and independent of the display size -- the width
/// picks how chunky the pixels look. Height follows the source aspect
/// ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "u32")]
pub enum ProcessingWidth {
    /// Classic chunky look.
    W160,
    /// The default.
    #[default]
    W320,
    /// Fine detail.
    W480,
}

impl ProcessingWidth {
    /// Width in pixels.
    #[inline]
    pub fn pixels(&self) -> u32 {
        match self {
            ProcessingWidth::W160 => 160,
            ProcessingWidth::W320 => 320,
            ProcessingWidth::W480 => 480,
        }
    }
}

impl TryFrom<u32> for ProcessingWidth {
    type Error = String;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            160 => Ok(ProcessingWidth::W160),
            320 => Ok(ProcessingWidth::W320),
            480 => Ok(ProcessingWidth::W480),
            other => Err(format!(
                "unsupported processing width {} (expected 160, 320 or 480)",
                other
            )),
        }
    }
}

/// Session capture settings: processing resolution, export scale and the
/// quantization filter. Mutable at runtime through
/// [`CapturePipeline::update_settings`](crate::services::CapturePipeline::update_settings).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptureSettings {
    /// Downsample width the filter runs at.
    #[serde(default)]
    pub processing_width: ProcessingWidth,

    /// Integer multiplier applied at export time (>= 1).
    #[serde(default = "default_export_scale")]
    pub export_scale: u32,

    /// Number of shades, one of 2/4/8/16.
    #[serde(default = "default_levels", deserialize_with = "de_levels")]
    pub levels: ShadeLevels,

    /// Palette name: gb, gray, sepia or color.
    #[serde(default = "default_palette", deserialize_with = "de_palette")]
    pub palette: PaletteStyle,

    /// Ordered dithering on or off.
    #[serde(default = "default_dither")]
    pub dither: bool,
}

fn default_export_scale() -> u32 {
    3
}

fn default_levels() -> ShadeLevels {
    ShadeLevels::Four
}

fn default_palette() -> PaletteStyle {
    PaletteStyle::Grayscale
}

fn default_dither() -> bool {
    true
}

fn de_levels<'de, D>(deserializer: D) -> Result<ShadeLevels, D::Error>
where
    D: Deserializer<'de>,
{
    let n = u32::deserialize(deserializer)?;
    ShadeLevels::try_from(n).map_err(serde::de::Error::custom)
}

fn de_palette<'de, D>(deserializer: D) -> Result<PaletteStyle, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse::<PaletteStyle>().map_err(serde::de::Error::custom)
}

fn de_facing<'de, D>(deserializer: D) -> Result<FacingMode, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    match s.as_str() {
        "user" | "front" => Ok(FacingMode::Front),
        "environment" | "back" => Ok(FacingMode::Back),
        other => Err(serde::de::Error::custom(format!(
            "unknown facing mode {:?} (expected front/user or back/environment)",
            other
        ))),
    }
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            processing_width: ProcessingWidth::default(),
            export_scale: default_export_scale(),
            levels: default_levels(),
            palette: default_palette(),
            dither: default_dither(),
        }
    }
}

impl CaptureSettings {
    /// The quantizer configuration for these settings.
    pub fn quantize_options(&self) -> QuantizeOptions {
        QuantizeOptions::new()
            .levels(self.levels)
            .palette(self.palette)
            .dither(self.dither)
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), String> {
        if self.export_scale < 1 {
            return Err(format!(
                "export_scale must be at least 1, got {}",
                self.export_scale
            ));
        }
        Ok(())
    }
}

/// Camera selection preferences.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CameraConfig {
    /// Which camera to prefer when acquiring a stream.
    #[serde(default, deserialize_with = "de_facing")]
    pub facing: FacingMode,
}

/// Top-level configuration loaded from retrocam.yaml.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Camera selection.
    #[serde(default)]
    pub camera: CameraConfig,

    /// Capture and filter settings.
    #[serde(default)]
    pub settings: CaptureSettings,
}

impl AppConfig {
    /// Load configuration from a YAML file, falling back to defaults on
    /// any error.
    pub fn load_from_path(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_yaml::from_str::<Self>(&content) {
                Ok(config) => match config.settings.validate() {
                    Ok(()) => {
                        tracing::info!(
                            path = %path.display(),
                            palette = %config.settings.palette,
                            levels = %config.settings.levels,
                            "Loaded configuration"
                        );
                        config
                    }
                    Err(e) => {
                        tracing::warn!(%e, "Invalid settings, using defaults");
                        Self::default()
                    }
                },
                Err(e) => {
                    tracing::warn!(%e, "Failed to parse config, using defaults");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::debug!(%e, path = %path.display(), "No config file, using defaults");
                Self::default()
            }
        }
    }
}
