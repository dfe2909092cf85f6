//! In-process vision service for tests and offline runs

use crate::{BoundingBox, VisionError, VisionFuture, VisionService};
use frame_source::VideoFrame;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// Canned-response vision service
///
/// Responses can be swapped at runtime; call counters let tests
/// assert how often the service was hit.
pub struct MockVisionService {
    boxes: Mutex<Result<Vec<BoundingBox>, VisionError>>,
    caption: Mutex<Result<String, VisionError>>,
    latency: Duration,
    detect_calls: AtomicUsize,
    caption_calls: AtomicUsize,
}

impl Default for MockVisionService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVisionService {
    /// No detections, empty caption, no latency
    pub fn new() -> Self {
        debug!("Creating mock vision service");
        Self {
            boxes: Mutex::new(Ok(Vec::new())),
            caption: Mutex::new(Ok(String::new())),
            latency: Duration::ZERO,
            detect_calls: AtomicUsize::new(0),
            caption_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_boxes(self, boxes: Vec<BoundingBox>) -> Self {
        self.set_boxes(Ok(boxes));
        self
    }

    pub fn with_caption(self, caption: impl Into<String>) -> Self {
        self.set_caption(Ok(caption.into()));
        self
    }

    /// Delay every response (uses the tokio clock)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make both operations fail with `err`
    pub fn failing(self, err: VisionError) -> Self {
        self.set_boxes(Err(err.clone()));
        self.set_caption(Err(err));
        self
    }

    pub fn set_boxes(&self, boxes: Result<Vec<BoundingBox>, VisionError>) {
        *self.boxes.lock().unwrap_or_else(|e| e.into_inner()) = boxes;
    }

    pub fn set_caption(&self, caption: Result<String, VisionError>) {
        *self.caption.lock().unwrap_or_else(|e| e.into_inner()) = caption;
    }

    pub fn detect_calls(&self) -> usize {
        self.detect_calls.load(Ordering::SeqCst)
    }

    pub fn caption_calls(&self) -> usize {
        self.caption_calls.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

impl VisionService for MockVisionService {
    fn detect<'a>(
        &'a self,
        _frame: &'a VideoFrame,
        class_name: &'a str,
    ) -> VisionFuture<'a, Vec<BoundingBox>> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            self.delay().await;
            debug!("Mock detect for '{}'", class_name);
            self.boxes.lock().unwrap_or_else(|e| e.into_inner()).clone()
        })
    }

    fn caption<'a>(&'a self, _frame: &'a VideoFrame) -> VisionFuture<'a, String> {
        self.caption_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            self.delay().await;
            self.caption.lock().unwrap_or_else(|e| e.into_inner()).clone()
        })
    }
}
