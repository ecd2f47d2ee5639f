pub mod config;
pub mod photo;

pub use config::{AppConfig, CameraConfig, CaptureSettings, FacingMode, ProcessingWidth};
pub use photo::{Gallery, Photo};
