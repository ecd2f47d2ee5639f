use thiserror::Error;

/// Why a camera stream could not be acquired.
///
/// Reported by value; the pipeline stays in its current state and never
/// retries on its own -- the caller decides whether to ask again.
#[derive(Debug, Error)]
pub enum AcquireError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera device matches facing mode {facing:?}")]
    NoDevice { facing: String },

    #[error("camera requires a secure context (HTTPS or localhost)")]
    InsecureContext,

    #[error("camera backend error: {0}")]
    Backend(String),
}

/// Errors from encoding or scaling an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("PNG encode error: {0}")]
    PngEncode(String),

    #[error("export scale must be at least 1, got {0}")]
    InvalidScale(u32),
}

impl From<png::EncodingError> for ExportError {
    fn from(e: png::EncodingError) -> Self {
        ExportError::PngEncode(e.to_string())
    }
}

/// Errors surfaced by the capture pipeline's operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("acquisition failed: {0}")]
    Acquire(#[from] AcquireError),

    #[error("no camera stream is active")]
    StreamNotActive,

    #[error("photo index {index} out of range (gallery holds {len})")]
    InvalidIndex { index: usize, len: usize },

    #[error("gallery is empty")]
    EmptyGallery,

    #[error("export failed: {0}")]
    Export(#[from] ExportError),
}
