//! The capture pipeline.
//!
//! Bridges a live [`VideoSource`](crate::services::video::VideoSource) to
//! the retro-quant frame quantizer for continuous preview and discrete
//! capture, and owns the in-memory photo gallery.
//!
//! # States
//!
//! - **Idle**: no active stream.
//! - **Live**: stream acquired, preview task running, every tick
//!   re-quantizes the newest frame.
//! - **ViewingPhoto**: preview task paused, a stored photo is on the
//!   photo-view channel; the stream stays acquired so returning to live
//!   is instant.
//!
//! # Concurrency
//!
//! The preview loop is an explicit cancellable tokio task: starting it
//! returns a handle, stopping cancels through a watch flag and awaits
//! the handle, so no quantization pass can run after stop returns.
//! Captures serialize behind their own mutex, and every pass allocates
//! its own working buffers -- the only shared mutable resource is the
//! stream handle behind a lock.

use std::sync::Arc;

use chrono::Utc;
use retro_quant::{quantize, scale, PixelBuffer};
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::error::CaptureError;
use crate::models::{CaptureSettings, FacingMode, Gallery, Photo};
use crate::services::exporter::{self, ExportedPhoto};
use crate::services::video::{VideoSource, VideoStream};

/// Fixed width of the live preview buffer handed to the renderer.
pub const PREVIEW_WIDTH: u32 = 480;

/// Fixed width of a captured photo. Independent of [`PREVIEW_WIDTH`] --
/// the display path and the capture path are separate knobs even though
/// they currently agree.
pub const PHOTO_WIDTH: u32 = 480;

/// Stand-in for the host's display-refresh callback (~60 Hz). A browser
/// host would drive the loop from its animation-frame callback instead
/// of a timer; the cadence contract is the same: at most one pass per
/// visual refresh, and a not-ready frame just waits for the next tick.
const REFRESH_INTERVAL: Duration = Duration::from_millis(16);

type SharedStream = Arc<Mutex<Option<Box<dyn VideoStream>>>>;

/// Coarse pipeline state, derived for observability and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Live,
    ViewingPhoto,
}

/// Handle to a running preview loop.
struct PreviewTask {
    cancel: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// The capture pipeline. See the module docs for the state machine.
pub struct CapturePipeline {
    source: Arc<dyn VideoSource>,
    stream: SharedStream,
    gallery: Mutex<Gallery>,
    settings: watch::Sender<CaptureSettings>,
    preview_task: Mutex<Option<PreviewTask>>,
    capture_serial: Mutex<()>,
    preview_tx: watch::Sender<Option<PixelBuffer>>,
    photo_view_tx: watch::Sender<Option<PixelBuffer>>,
    status_tx: watch::Sender<String>,
    facing: Mutex<FacingMode>,
}

impl CapturePipeline {
    pub fn new(source: Arc<dyn VideoSource>, settings: CaptureSettings) -> Self {
        let (settings_tx, _) = watch::channel(settings);
        let (preview_tx, _) = watch::channel(None);
        let (photo_view_tx, _) = watch::channel(None);
        let (status_tx, _) = watch::channel("idle".to_string());
        Self {
            source,
            stream: Arc::new(Mutex::new(None)),
            gallery: Mutex::new(Gallery::new()),
            settings: settings_tx,
            preview_task: Mutex::new(None),
            capture_serial: Mutex::new(()),
            preview_tx,
            photo_view_tx,
            status_tx,
            facing: Mutex::new(FacingMode::default()),
        }
    }

    /// Live preview frames for the rendering collaborator.
    pub fn subscribe_preview(&self) -> watch::Receiver<Option<PixelBuffer>> {
        self.preview_tx.subscribe()
    }

    /// The photo shown while in viewing mode (None outside it).
    pub fn subscribe_photo_view(&self) -> watch::Receiver<Option<PixelBuffer>> {
        self.photo_view_tx.subscribe()
    }

    /// Human-readable status line; updated on every state change and
    /// every failure.
    pub fn subscribe_status(&self) -> watch::Receiver<String> {
        self.status_tx.subscribe()
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> CaptureSettings {
        self.settings.borrow().clone()
    }

    /// Replace the capture settings.
    ///
    /// The preview loop reads the settings fresh on every tick, so the
    /// visible preview reflects the change within one frame.
    pub fn update_settings(&self, settings: CaptureSettings) {
        self.settings.send_replace(settings);
    }

    /// Derived pipeline state.
    pub async fn state(&self) -> PipelineState {
        let viewing = self.gallery.lock().await.is_viewing();
        if viewing {
            return PipelineState::ViewingPhoto;
        }
        let live = self.stream.lock().await.is_some();
        if live {
            PipelineState::Live
        } else {
            PipelineState::Idle
        }
    }

    /// Acquire a stream for `facing` and enter Live.
    ///
    /// Any previously active stream is released once the new one is in
    /// hand, so at most one stream holds the device after this returns
    /// and a failed acquisition leaves the old stream (and the rest of
    /// the pipeline state) untouched.
    pub async fn start_stream(&self, facing: FacingMode) -> Result<(), CaptureError> {
        match self.source.acquire(facing).await {
            Ok(new_stream) => {
                self.stop_preview_task().await;
                {
                    let mut guard = self.stream.lock().await;
                    if let Some(mut old) = guard.replace(new_stream) {
                        old.release();
                    }
                }
                *self.facing.lock().await = facing;
                self.gallery.lock().await.leave_viewing();
                self.photo_view_tx.send_replace(None);
                self.spawn_preview_task().await;
                self.set_status("camera running");
                tracing::info!(facing = %facing, "Camera stream started");
                Ok(())
            }
            Err(e) => {
                self.set_status("failed to start camera (check HTTPS & permissions)");
                tracing::warn!(error = %e, facing = %facing, "Camera acquisition failed");
                Err(e.into())
            }
        }
    }

    /// Release the stream and halt the preview loop. Idempotent.
    pub async fn stop_stream(&self) {
        self.stop_preview_task().await;
        let released = {
            let mut guard = self.stream.lock().await;
            match guard.take() {
                Some(mut stream) => {
                    stream.release();
                    true
                }
                None => false,
            }
        };
        if released {
            tracing::info!("Camera stream stopped");
        }
        self.preview_tx.send_replace(None);
        self.set_status("idle");
    }

    /// Switch the preferred camera; restarts the stream in place when
    /// one is active.
    pub async fn select_camera(&self, facing: FacingMode) -> Result<(), CaptureError> {
        let live = self.stream.lock().await.is_some();
        if live {
            self.start_stream(facing).await
        } else {
            *self.facing.lock().await = facing;
            Ok(())
        }
    }

    /// The facing preference of the current (or next) stream.
    pub async fn facing(&self) -> FacingMode {
        *self.facing.lock().await
    }

    /// Capture one photo.
    ///
    /// Waits for the stream to produce a decodable frame (no timeout of
    /// its own -- dropping the future abandons the wait cleanly), runs
    /// the same downsample/quantize pass as the preview at the photo
    /// output resolution, and appends the result to the gallery.
    /// Selection moves to the new photo; viewing mode is not entered.
    ///
    /// Rapid repeated captures serialize: each produces one distinct
    /// photo in strictly increasing order.
    pub async fn capture(&self) -> Result<Photo, CaptureError> {
        let _serial = self.capture_serial.lock().await;

        self.set_status("preparing…");
        let frame = match self.wait_for_frame().await {
            Ok(frame) => frame,
            Err(e) => {
                self.set_status("waiting for video… try again");
                return Err(e);
            }
        };

        self.set_status("capturing…");
        let settings = self.settings.borrow().clone();
        let processed = process_frame(&frame, &settings, PHOTO_WIDTH);

        let photo = self
            .gallery
            .lock()
            .await
            .push(processed, Utc::now())
            .clone();
        self.set_status("captured");
        tracing::info!(id = photo.id, "Captured photo");
        Ok(photo)
    }

    /// Poll the stream once per refresh tick until a frame is ready.
    async fn wait_for_frame(&self) -> Result<PixelBuffer, CaptureError> {
        let mut ticker = interval(REFRESH_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            {
                let mut guard = self.stream.lock().await;
                let stream = guard.as_mut().ok_or(CaptureError::StreamNotActive)?;
                if let Some(frame) = stream.current_frame() {
                    return Ok(frame);
                }
            }
            ticker.tick().await;
        }
    }

    /// Select a stored photo and enter ViewingPhoto.
    ///
    /// Pauses the preview loop; the stream stays acquired. Out-of-range
    /// indices are rejected without touching any state.
    pub async fn select_photo(&self, index: usize) -> Result<(), CaptureError> {
        let viewed = {
            let mut gallery = self.gallery.lock().await;
            let len = gallery.len();
            if !gallery.select(index) {
                return Err(CaptureError::InvalidIndex { index, len });
            }
            gallery.selected().map(|p| p.buffer.clone())
        };
        self.stop_preview_task().await;
        self.photo_view_tx.send_replace(viewed);
        self.set_status("viewing photo");
        Ok(())
    }

    /// Leave ViewingPhoto: back to Live when a stream is active, Idle
    /// otherwise.
    pub async fn return_to_live(&self) {
        self.gallery.lock().await.leave_viewing();
        self.photo_view_tx.send_replace(None);
        self.resume_if_live().await;
    }

    /// Empty the gallery, reset selection, exit ViewingPhoto and clear
    /// the photo display.
    pub async fn clear_all(&self) {
        self.gallery.lock().await.clear();
        self.photo_view_tx.send_replace(None);
        self.resume_if_live().await;
        tracing::info!("Gallery cleared");
    }

    async fn resume_if_live(&self) {
        let live = self.stream.lock().await.is_some();
        if live {
            self.spawn_preview_task().await;
            self.set_status("camera running");
        } else {
            self.set_status("idle");
        }
    }

    /// Export the photo at `index`, scaled by `export_scale`.
    pub async fn export_photo(
        &self,
        index: usize,
        export_scale: u32,
    ) -> Result<ExportedPhoto, CaptureError> {
        let gallery = self.gallery.lock().await;
        if gallery.is_empty() {
            return Err(CaptureError::EmptyGallery);
        }
        let photo = gallery.get(index).ok_or(CaptureError::InvalidIndex {
            index,
            len: gallery.len(),
        })?;
        let export = exporter::export_photo(photo, export_scale)?;
        tracing::info!(filename = %export.filename, bytes = export.bytes.len(), "Exported photo");
        Ok(export)
    }

    /// Number of photos in the gallery.
    pub async fn gallery_len(&self) -> usize {
        self.gallery.lock().await.len()
    }

    /// Clone of the photo at `index`, if any.
    pub async fn photo(&self, index: usize) -> Option<Photo> {
        self.gallery.lock().await.get(index).cloned()
    }

    /// Currently selected gallery index.
    pub async fn selected_index(&self) -> usize {
        self.gallery.lock().await.selected_index()
    }

    /// Start (or restart) the preview task.
    async fn spawn_preview_task(&self) {
        let mut slot = self.preview_task.lock().await;
        if let Some(task) = slot.take() {
            let _ = task.cancel.send(true);
            let _ = task.handle.await;
        }

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let handle = tokio::spawn(preview_loop(
            Arc::clone(&self.stream),
            self.settings.subscribe(),
            self.preview_tx.clone(),
            cancel_rx,
        ));
        *slot = Some(PreviewTask {
            cancel: cancel_tx,
            handle,
        });
    }

    /// Cancel the preview task and wait for it to finish, so no further
    /// quantization pass runs after this returns.
    async fn stop_preview_task(&self) {
        let task = self.preview_task.lock().await.take();
        if let Some(task) = task {
            let _ = task.cancel.send(true);
            let _ = task.handle.await;
        }
    }

    fn set_status(&self, status: &str) {
        self.status_tx.send_replace(status.to_string());
    }
}

/// The preview loop body.
///
/// One pass per refresh tick: grab the newest decodable frame, process
/// it at the current settings, publish to the preview channel. A
/// not-ready stream just reschedules. Ends on cancellation (including
/// the pipeline itself being dropped) or when the stream disappears.
async fn preview_loop(
    stream: SharedStream,
    settings_rx: watch::Receiver<CaptureSettings>,
    preview_tx: watch::Sender<Option<PixelBuffer>>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let mut ticker = interval(REFRESH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel_rx.changed() => break,
            _ = ticker.tick() => {
                let frame = {
                    let mut guard = stream.lock().await;
                    match guard.as_mut() {
                        Some(stream) => stream.current_frame(),
                        None => break,
                    }
                };
                let Some(frame) = frame else {
                    continue;
                };
                // Fresh settings every tick: a config change is visible
                // within one frame.
                let settings = settings_rx.borrow().clone();
                let processed = process_frame(&frame, &settings, PREVIEW_WIDTH);
                preview_tx.send_replace(Some(processed));
            }
        }
    }
}

/// Downsample to the processing resolution, quantize, upscale to
/// `output_width` with nearest-neighbor sampling.
///
/// Shared by the preview and capture paths; the output height follows
/// the source aspect ratio, as does the processing height.
fn process_frame(frame: &PixelBuffer, settings: &CaptureSettings, output_width: u32) -> PixelBuffer {
    let proc_w = settings.processing_width.pixels();
    let proc_h = scale::aspect_height(frame.width(), frame.height(), proc_w);

    let mut low = scale::resize_box(frame, proc_w, proc_h);
    quantize(&mut low, &settings.quantize_options());

    let out_h = scale::aspect_height(frame.width(), frame.height(), output_width);
    scale::resize_nearest(&low, output_width, out_h)
}
