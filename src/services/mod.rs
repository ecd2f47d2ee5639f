pub mod exporter;
pub mod pipeline;
pub mod video;

pub use exporter::ExportedPhoto;
pub use pipeline::{CapturePipeline, PipelineState, PHOTO_WIDTH, PREVIEW_WIDTH};
pub use video::{TestPatternCamera, VideoSource, VideoStream};
