//! Integration tests for the capture pipeline state machine and gallery.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use retrocam::error::{AcquireError, CaptureError};
use retrocam::models::{CaptureSettings, FacingMode};
use retrocam::services::{
    CapturePipeline, PipelineState, TestPatternCamera, VideoSource, VideoStream,
};

fn pipeline_with(camera: Arc<TestPatternCamera>) -> CapturePipeline {
    CapturePipeline::new(camera, CaptureSettings::default())
}

/// A camera that always refuses.
struct DeniedCamera;

#[async_trait]
impl VideoSource for DeniedCamera {
    async fn acquire(&self, _facing: FacingMode) -> Result<Box<dyn VideoStream>, AcquireError> {
        Err(AcquireError::PermissionDenied)
    }
}

#[tokio::test]
async fn test_initial_state_is_idle() {
    let pipeline = pipeline_with(Arc::new(TestPatternCamera::new()));
    assert_eq!(pipeline.state().await, PipelineState::Idle);
    assert_eq!(*pipeline.subscribe_status().borrow(), "idle");
}

#[tokio::test]
async fn test_start_stream_enters_live() {
    let camera = Arc::new(TestPatternCamera::new());
    let pipeline = pipeline_with(camera.clone());

    pipeline.start_stream(FacingMode::Back).await.unwrap();
    assert_eq!(pipeline.state().await, PipelineState::Live);
    assert_eq!(*pipeline.subscribe_status().borrow(), "camera running");
    assert_eq!(camera.active_streams(), 1);

    pipeline.stop_stream().await;
}

#[tokio::test]
async fn test_start_stream_failure_keeps_state() {
    let pipeline = CapturePipeline::new(Arc::new(DeniedCamera), CaptureSettings::default());

    let result = pipeline.start_stream(FacingMode::Front).await;
    assert!(matches!(
        result,
        Err(CaptureError::Acquire(AcquireError::PermissionDenied))
    ));
    assert_eq!(pipeline.state().await, PipelineState::Idle);
    assert_eq!(
        *pipeline.subscribe_status().borrow(),
        "failed to start camera (check HTTPS & permissions)"
    );
}

#[tokio::test]
async fn test_double_start_keeps_one_active_stream() {
    let camera = Arc::new(TestPatternCamera::new());
    let pipeline = pipeline_with(camera.clone());

    pipeline.start_stream(FacingMode::Back).await.unwrap();
    pipeline.start_stream(FacingMode::Back).await.unwrap();

    assert_eq!(camera.acquire_count(), 2);
    assert_eq!(camera.release_count(), 1);
    assert_eq!(camera.active_streams(), 1);

    pipeline.stop_stream().await;
    assert_eq!(camera.active_streams(), 0);
}

#[tokio::test]
async fn test_stop_stream_is_idempotent() {
    let camera = Arc::new(TestPatternCamera::new());
    let pipeline = pipeline_with(camera.clone());

    pipeline.start_stream(FacingMode::Back).await.unwrap();
    pipeline.stop_stream().await;
    pipeline.stop_stream().await;

    assert_eq!(camera.release_count(), 1);
    assert_eq!(pipeline.state().await, PipelineState::Idle);
}

#[tokio::test]
async fn test_capture_appends_in_order() {
    let camera = Arc::new(TestPatternCamera::new().dimensions(64, 48));
    let pipeline = pipeline_with(camera);
    pipeline.start_stream(FacingMode::Back).await.unwrap();

    let n = 4;
    for _ in 0..n {
        pipeline.capture().await.unwrap();
    }

    assert_eq!(pipeline.gallery_len().await, n);
    let mut last_id = None;
    let mut last_ts = None;
    for i in 0..n {
        let photo = pipeline.photo(i).await.unwrap();
        if let Some(prev) = last_id {
            assert!(photo.id > prev, "ids must increase");
        }
        if let Some(prev) = last_ts {
            assert!(photo.timestamp >= prev, "timestamps must be non-decreasing");
        }
        last_id = Some(photo.id);
        last_ts = Some(photo.timestamp);
    }

    // Selection follows the newest capture without entering viewing mode.
    assert_eq!(pipeline.selected_index().await, n - 1);
    assert_eq!(pipeline.state().await, PipelineState::Live);

    pipeline.stop_stream().await;
}

#[tokio::test]
async fn test_capture_waits_for_warmup() {
    let camera = Arc::new(TestPatternCamera::new().dimensions(32, 24).warmup_polls(3));
    let pipeline = pipeline_with(camera);
    pipeline.start_stream(FacingMode::Back).await.unwrap();

    let photo = pipeline.capture().await.unwrap();
    assert_eq!(photo.buffer.width(), 480);
    assert_eq!(pipeline.gallery_len().await, 1);

    pipeline.stop_stream().await;
}

#[tokio::test]
async fn test_capture_without_stream_fails() {
    let pipeline = pipeline_with(Arc::new(TestPatternCamera::new()));
    let result = pipeline.capture().await;
    assert!(matches!(result, Err(CaptureError::StreamNotActive)));
    assert_eq!(pipeline.gallery_len().await, 0);
}

#[tokio::test]
async fn test_capture_output_resolution() {
    let camera = Arc::new(TestPatternCamera::new().dimensions(1280, 720));
    let pipeline = pipeline_with(camera);
    pipeline.start_stream(FacingMode::Back).await.unwrap();

    let photo = pipeline.capture().await.unwrap();
    assert_eq!(photo.buffer.width(), 480);
    assert_eq!(photo.buffer.height(), 270);

    pipeline.stop_stream().await;
}

#[tokio::test]
async fn test_select_photo_enters_viewing_and_back() {
    let camera = Arc::new(TestPatternCamera::new().dimensions(64, 48));
    let pipeline = pipeline_with(camera);
    pipeline.start_stream(FacingMode::Back).await.unwrap();

    pipeline.capture().await.unwrap();
    pipeline.capture().await.unwrap();

    pipeline.select_photo(0).await.unwrap();
    assert_eq!(pipeline.state().await, PipelineState::ViewingPhoto);
    assert_eq!(pipeline.selected_index().await, 0);
    assert!(pipeline.subscribe_photo_view().borrow().is_some());

    pipeline.return_to_live().await;
    assert_eq!(pipeline.state().await, PipelineState::Live);
    assert!(pipeline.subscribe_photo_view().borrow().is_none());

    pipeline.stop_stream().await;
}

#[tokio::test]
async fn test_select_photo_out_of_range_is_rejected() {
    let camera = Arc::new(TestPatternCamera::new().dimensions(64, 48));
    let pipeline = pipeline_with(camera);
    pipeline.start_stream(FacingMode::Back).await.unwrap();
    pipeline.capture().await.unwrap();

    let result = pipeline.select_photo(5).await;
    assert!(matches!(
        result,
        Err(CaptureError::InvalidIndex { index: 5, len: 1 })
    ));
    assert_eq!(pipeline.state().await, PipelineState::Live);

    pipeline.stop_stream().await;
}

#[tokio::test]
async fn test_clear_all_then_select_is_noop() {
    let camera = Arc::new(TestPatternCamera::new().dimensions(64, 48));
    let pipeline = pipeline_with(camera);
    pipeline.start_stream(FacingMode::Back).await.unwrap();

    pipeline.capture().await.unwrap();
    pipeline.select_photo(0).await.unwrap();
    pipeline.clear_all().await;

    assert_eq!(pipeline.gallery_len().await, 0);
    assert_eq!(pipeline.selected_index().await, 0);
    assert_eq!(pipeline.state().await, PipelineState::Live);
    assert!(pipeline.subscribe_photo_view().borrow().is_none());

    let result = pipeline.select_photo(0).await;
    assert!(matches!(
        result,
        Err(CaptureError::InvalidIndex { index: 0, len: 0 })
    ));
    assert_eq!(pipeline.state().await, PipelineState::Live);

    pipeline.stop_stream().await;
}

#[tokio::test]
async fn test_clear_all_when_idle_stays_idle() {
    let pipeline = pipeline_with(Arc::new(TestPatternCamera::new()));
    pipeline.clear_all().await;
    assert_eq!(pipeline.state().await, PipelineState::Idle);
    assert_eq!(*pipeline.subscribe_status().borrow(), "idle");
}

#[tokio::test]
async fn test_preview_frames_arrive_in_live() {
    let camera = Arc::new(TestPatternCamera::new().dimensions(160, 120));
    let pipeline = pipeline_with(camera);
    let mut preview = pipeline.subscribe_preview();

    pipeline.start_stream(FacingMode::Back).await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            preview.changed().await.unwrap();
            if preview.borrow_and_update().is_some() {
                break;
            }
        }
    })
    .await
    .expect("a preview frame should arrive within 2s");

    let frame = preview.borrow().clone().unwrap();
    assert_eq!(frame.width(), 480);
    assert_eq!(frame.height(), 360);

    pipeline.stop_stream().await;
}

#[tokio::test]
async fn test_settings_change_reflected_in_preview() {
    use retro_quant::PaletteStyle;

    let camera = Arc::new(TestPatternCamera::new().dimensions(160, 120));
    let pipeline = pipeline_with(camera);
    let mut preview = pipeline.subscribe_preview();

    pipeline.start_stream(FacingMode::Back).await.unwrap();

    let mut settings = pipeline.settings();
    settings.palette = PaletteStyle::GameBoy;
    pipeline.update_settings(settings);

    // The green ramp always has G > R; grayscale never does.
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            preview.changed().await.unwrap();
            let ramped = preview.borrow_and_update().as_ref().is_some_and(|frame| {
                (0..frame.height()).all(|y| {
                    (0..frame.width()).all(|x| {
                        let [r, g, _, _] = frame.pixel(x, y);
                        g > r
                    })
                })
            });
            if ramped {
                break;
            }
        }
    })
    .await
    .expect("the palette change should reach the preview");

    pipeline.stop_stream().await;
}

#[tokio::test]
async fn test_select_camera_restarts_live_stream() {
    let camera = Arc::new(TestPatternCamera::new());
    let pipeline = pipeline_with(camera.clone());

    pipeline.start_stream(FacingMode::Back).await.unwrap();
    pipeline.select_camera(FacingMode::Front).await.unwrap();

    assert_eq!(pipeline.facing().await, FacingMode::Front);
    assert_eq!(camera.acquire_count(), 2);
    assert_eq!(camera.active_streams(), 1);

    pipeline.stop_stream().await;
}

#[tokio::test]
async fn test_select_camera_when_idle_only_records_preference() {
    let camera = Arc::new(TestPatternCamera::new());
    let pipeline = pipeline_with(camera.clone());

    pipeline.select_camera(FacingMode::Front).await.unwrap();
    assert_eq!(pipeline.facing().await, FacingMode::Front);
    assert_eq!(camera.acquire_count(), 0);
    assert_eq!(pipeline.state().await, PipelineState::Idle);
}

#[tokio::test]
async fn test_concurrent_captures_serialize() {
    let camera = Arc::new(TestPatternCamera::new().dimensions(64, 48));
    let pipeline = Arc::new(pipeline_with(camera));
    pipeline.start_stream(FacingMode::Back).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..5 {
        let p = Arc::clone(&pipeline);
        handles.push(tokio::spawn(async move { p.capture().await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(pipeline.gallery_len().await, 5);
    let mut ids = Vec::new();
    for i in 0..5 {
        ids.push(pipeline.photo(i).await.unwrap().id);
    }
    let mut sorted = ids.clone();
    sorted.sort_unstable();
    assert_eq!(ids, sorted, "gallery order must match capture order");

    pipeline.stop_stream().await;
}

#[tokio::test]
async fn test_dropping_pipeline_releases_stream() {
    let camera = Arc::new(TestPatternCamera::new());
    {
        let pipeline = pipeline_with(camera.clone());
        pipeline.start_stream(FacingMode::Back).await.unwrap();
    }
    // Give the cancelled preview task a moment to unwind.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(camera.active_streams(), 0, "drop must release the device");
}
