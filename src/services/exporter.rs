//! Photo export.
//!
//! Scales a stored photo by an integer factor (nearest-neighbor, so the
//! pixel edges survive) and encodes it as a lossless PNG. The suggested
//! filename embeds the capture timestamp and the scale factor, matching
//! the `retro-photo-<timestamp>-<N>x.png` shape users see in their
//! downloads folder.

use chrono::{DateTime, Utc};
use retro_quant::{scale, PixelBuffer};

use crate::error::ExportError;
use crate::models::Photo;

/// An encoded export: PNG bytes plus the suggested filename.
///
/// The export collaborator (file writer, browser download) takes it from
/// here; the core never performs the platform save itself.
#[derive(Debug, Clone)]
pub struct ExportedPhoto {
    pub bytes: Vec<u8>,
    pub filename: String,
}

/// Export a photo at the given integer scale.
pub fn export_photo(photo: &Photo, export_scale: u32) -> Result<ExportedPhoto, ExportError> {
    if export_scale < 1 {
        return Err(ExportError::InvalidScale(export_scale));
    }

    let scaled = scale::scale_nearest(&photo.buffer, export_scale);
    let bytes = encode_png(&scaled)?;
    Ok(ExportedPhoto {
        bytes,
        filename: export_filename(photo.timestamp, export_scale),
    })
}

/// Encode an RGBA buffer as a PNG (8-bit RGBA, lossless).
pub fn encode_png(buffer: &PixelBuffer) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut bytes, buffer.width(), buffer.height());
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(buffer.data())?;
    }
    Ok(bytes)
}

/// `retro-photo-<timestamp>-<N>x.png`, with the colons and dot of the
/// ISO-8601 timestamp replaced by dashes so the name is valid on every
/// filesystem.
pub fn export_filename(timestamp: DateTime<Utc>, export_scale: u32) -> String {
    let stamp = timestamp.format("%Y-%m-%dT%H-%M-%S-%3fZ");
    format!("retro-photo-{}-{}x.png", stamp, export_scale)
}
