//! Video source abstraction and the synthetic test camera.
//!
//! The pipeline never talks to camera hardware directly; it goes through
//! [`VideoSource`] (acquire a stream for a facing preference) and
//! [`VideoStream`] (poll the latest decodable frame, release the device).
//! A browser host backs these with `getUserMedia`; the CLI and the test
//! suite use [`TestPatternCamera`].

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use retro_quant::PixelBuffer;

use crate::error::AcquireError;
use crate::models::FacingMode;

/// A camera-like provider of live video streams.
#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Acquire a stream matching the facing preference.
    ///
    /// Failures (permission denied, no device, insecure context) are
    /// reported by value; the source must not retry on its own.
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn VideoStream>, AcquireError>;
}

/// An acquired live stream.
///
/// The stream owns the underlying device. [`release`](VideoStream::release)
/// must be idempotent and is also invoked on drop, so the hardware is
/// freed on every exit path even if the pipeline never calls it
/// explicitly.
pub trait VideoStream: Send {
    /// Native frame dimensions, once the stream has decoded metadata.
    fn dimensions(&self) -> Option<(u32, u32)>;

    /// The latest decodable frame at native resolution, or `None` while
    /// the stream is still warming up. Never blocks.
    fn current_frame(&mut self) -> Option<PixelBuffer>;

    /// Release the underlying device.
    fn release(&mut self);
}

/// Shared bookkeeping between a [`TestPatternCamera`] and its streams.
#[derive(Debug, Default)]
struct CameraCounters {
    acquires: AtomicUsize,
    releases: AtomicUsize,
}

/// A deterministic synthetic camera.
///
/// Produces a slowly drifting diagonal gradient with a little seeded
/// noise -- enough structure for the retro filter to chew on, and fully
/// reproducible for a given seed. The first `warmup_polls` frame polls
/// return not-ready, mimicking a real camera that needs a moment before
/// its first decodable frame.
///
/// Acquire/release counts are observable so tests can verify the
/// at-most-one-active-stream discipline.
#[derive(Debug)]
pub struct TestPatternCamera {
    width: u32,
    height: u32,
    warmup_polls: u32,
    seed: u64,
    counters: Arc<CameraCounters>,
}

impl Default for TestPatternCamera {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPatternCamera {
    /// A 1280x720 camera that is ready immediately.
    pub fn new() -> Self {
        Self {
            width: 1280,
            height: 720,
            warmup_polls: 0,
            seed: 0x5eed,
            counters: Arc::new(CameraCounters::default()),
        }
    }

    /// Set the native frame dimensions.
    pub fn dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Number of frame polls that return not-ready after acquisition.
    pub fn warmup_polls(mut self, polls: u32) -> Self {
        self.warmup_polls = polls;
        self
    }

    /// Seed for the noise generator.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Total successful acquisitions so far.
    pub fn acquire_count(&self) -> usize {
        self.counters.acquires.load(Ordering::SeqCst)
    }

    /// Total stream releases so far.
    pub fn release_count(&self) -> usize {
        self.counters.releases.load(Ordering::SeqCst)
    }

    /// Streams currently holding the device.
    pub fn active_streams(&self) -> usize {
        self.acquire_count() - self.release_count()
    }
}

#[async_trait]
impl VideoSource for TestPatternCamera {
    async fn acquire(&self, facing: FacingMode) -> Result<Box<dyn VideoStream>, AcquireError> {
        self.counters.acquires.fetch_add(1, Ordering::SeqCst);
        tracing::debug!(facing = %facing, "Test camera acquired");
        Ok(Box::new(TestPatternStream {
            width: self.width,
            height: self.height,
            warmup_polls: self.warmup_polls,
            polls: 0,
            tick: 0,
            rng: StdRng::seed_from_u64(self.seed),
            counters: Arc::clone(&self.counters),
            released: false,
        }))
    }
}

struct TestPatternStream {
    width: u32,
    height: u32,
    warmup_polls: u32,
    polls: u32,
    tick: u64,
    rng: StdRng,
    counters: Arc<CameraCounters>,
    released: bool,
}

impl VideoStream for TestPatternStream {
    fn dimensions(&self) -> Option<(u32, u32)> {
        if self.polls >= self.warmup_polls {
            Some((self.width, self.height))
        } else {
            None
        }
    }

    fn current_frame(&mut self) -> Option<PixelBuffer> {
        if self.released {
            return None;
        }
        if self.polls < self.warmup_polls {
            self.polls += 1;
            return None;
        }
        self.polls += 1;
        self.tick += 1;

        let mut frame = PixelBuffer::new(self.width, self.height);
        let drift = (self.tick * 4) as u32;
        for y in 0..self.height {
            for x in 0..self.width {
                let r = (((x + drift) * 255) / self.width.max(1)) as u8;
                let g = ((y * 255) / self.height.max(1)) as u8;
                let b = (((x + y + drift) * 255) / (self.width + self.height).max(1)) as u8;
                let noise: u8 = self.rng.gen_range(0..8);
                frame.set_pixel(
                    x,
                    y,
                    [
                        r.saturating_add(noise),
                        g.saturating_add(noise),
                        b.saturating_add(noise),
                        255,
                    ],
                );
            }
        }
        Some(frame)
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.counters.releases.fetch_add(1, Ordering::SeqCst);
            tracing::debug!("Test camera stream released");
        }
    }
}

impl Drop for TestPatternStream {
    fn drop(&mut self) {
        self.release();
    }
}
