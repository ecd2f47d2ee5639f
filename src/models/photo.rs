//! Captured photos and the session gallery.
//!
//! A [`Photo`] is the immutable result of one capture: the quantized,
//! upscaled frame plus identity and timestamp. The [`Gallery`] owns the
//! ordered photo list together with the selection pointer and the
//! viewing-mode flag, and is the single place the selection invariants
//! are enforced.

use chrono::{DateTime, Utc};
use retro_quant::PixelBuffer;

/// One captured photo.
///
/// Immutable once created; the buffer is the quantized output at the
/// photo output resolution, never the raw camera frame.
#[derive(Debug, Clone)]
pub struct Photo {
    /// Monotonically increasing identifier, unique within the session.
    pub id: u64,
    /// The processed frame.
    pub buffer: PixelBuffer,
    /// Capture time.
    pub timestamp: DateTime<Utc>,
}

/// Ordered photo collection with a validated selection pointer.
///
/// Invariants:
/// - photos keep insertion order (append-only until [`Gallery::clear`]);
/// - while `viewing` is true the selected index is in bounds;
/// - after a clear the gallery is empty, selection is 0 and `viewing`
///   is false.
#[derive(Debug, Default)]
pub struct Gallery {
    photos: Vec<Photo>,
    selected: usize,
    viewing: bool,
    next_id: u64,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored photos.
    #[inline]
    pub fn len(&self) -> usize {
        self.photos.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Currently selected index. Only meaningful while photos exist.
    #[inline]
    pub fn selected_index(&self) -> usize {
        self.selected
    }

    /// True when a stored photo is being viewed instead of the live feed.
    #[inline]
    pub fn is_viewing(&self) -> bool {
        self.viewing
    }

    /// The photo at `index`, if in bounds.
    pub fn get(&self, index: usize) -> Option<&Photo> {
        self.photos.get(index)
    }

    /// The currently selected photo, if any.
    pub fn selected(&self) -> Option<&Photo> {
        self.photos.get(self.selected)
    }

    /// Append a freshly captured frame as a new photo and select it.
    ///
    /// Assigns the next monotonic id. Selection moves to the new photo
    /// but the viewing flag is left alone -- switching views is the
    /// caller's decision.
    pub fn push(&mut self, buffer: PixelBuffer, timestamp: DateTime<Utc>) -> &Photo {
        let id = self.next_id;
        self.next_id += 1;
        self.photos.push(Photo {
            id,
            buffer,
            timestamp,
        });
        self.selected = self.photos.len() - 1;
        &self.photos[self.selected]
    }

    /// Select the photo at `index` and enter viewing mode.
    ///
    /// Returns false (and changes nothing) when the index is out of
    /// range -- including always on an empty gallery.
    pub fn select(&mut self, index: usize) -> bool {
        if index >= self.photos.len() {
            return false;
        }
        self.selected = index;
        self.viewing = true;
        true
    }

    /// Leave viewing mode, back to the live feed.
    pub fn leave_viewing(&mut self) {
        self.viewing = false;
    }

    /// Drop every photo, reset selection to 0 and leave viewing mode.
    pub fn clear(&mut self) {
        self.photos.clear();
        self.selected = 0;
        self.viewing = false;
    }
}
