//! Frame Sources for the Shot Monitor
//!
//! Provides the frame model consumed by every analyzer and the
//! sources that hand out "the current frame" on demand:
//! - Still images (decoded from a file or an in-memory buffer)
//! - Live video, where a capture pipeline publishes its latest frame

pub mod frame;

pub use frame::{luminance, VideoFrame};

use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{debug, info};

/// Frame error types
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode frame: {0}")]
    Encode(String),

    #[error("Pixel buffer has {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },
}

/// Anything that can yield the current frame on demand
pub trait FrameSource: Send + Sync {
    /// Latest frame, or `None` when nothing is available yet
    fn current_frame(&self) -> Option<Arc<VideoFrame>>;
}

/// A single still image used as the source for every cycle
#[derive(Debug, Clone)]
pub struct StillImageSource {
    frame: Arc<VideoFrame>,
}

impl StillImageSource {
    /// Wrap an already decoded frame
    pub fn new(frame: VideoFrame) -> Self {
        Self {
            frame: Arc::new(frame),
        }
    }

    /// Decode an image file (any format the `image` crate understands)
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FrameError> {
        let path = path.as_ref();
        let img = image::open(path).map_err(|e| FrameError::Decode(e.to_string()))?;
        info!(
            "Loaded still image {} ({}x{})",
            path.display(),
            img.width(),
            img.height()
        );
        Ok(Self::new(VideoFrame::from_image(&img)))
    }

    /// Decode an in-memory encoded image (e.g. an upload)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FrameError> {
        let img = image::load_from_memory(bytes).map_err(|e| FrameError::Decode(e.to_string()))?;
        Ok(Self::new(VideoFrame::from_image(&img)))
    }
}

impl FrameSource for StillImageSource {
    fn current_frame(&self) -> Option<Arc<VideoFrame>> {
        Some(Arc::clone(&self.frame))
    }
}

/// Slot holding the most recent frame of a live stream
///
/// The capture side calls [`publish`](Self::publish); readers always
/// see the newest frame. Cloning shares the slot.
#[derive(Debug, Clone, Default)]
pub struct LatestFrameSource {
    slot: Arc<Mutex<Option<Arc<VideoFrame>>>>,
}

impl LatestFrameSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current frame
    pub fn publish(&self, frame: VideoFrame) {
        debug!("Frame {} published ({}x{})", frame.sequence, frame.width, frame.height);
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(Arc::new(frame));
    }

    /// Drop the current frame (stream ended)
    pub fn clear(&self) {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *slot = None;
    }
}

impl FrameSource for LatestFrameSource {
    fn current_frame(&self) -> Option<Arc<VideoFrame>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
