//! Retrocam - limited-palette retro camera core.
//!
//! Capture pipeline, gallery and PNG export on top of the retro-quant
//! frame quantizer. This library exposes modules for integration testing.

pub mod error;
pub mod models;
pub mod services;
