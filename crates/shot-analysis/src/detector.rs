//! Landmark detection collaborator

use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use frame_source::VideoFrame;
use tracing::debug;

use crate::landmarks::LandmarkFrame;
use crate::LandmarkError;

/// Boxed future returned by [`LandmarkDetector::detect`]
pub type DetectFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<LandmarkFrame>, LandmarkError>> + Send + 'a>>;

/// Facial landmark detector
///
/// Resolves to zero or one face; multi-face input reports only the
/// first face.
pub trait LandmarkDetector: Send + Sync {
    fn detect<'a>(&'a self, frame: &'a VideoFrame) -> DetectFuture<'a>;
}

/// Detector replaying a fixed result, for offline runs and tests
#[derive(Debug)]
pub struct FixedLandmarkDetector {
    result: Mutex<Result<Option<LandmarkFrame>, LandmarkError>>,
}

impl Default for FixedLandmarkDetector {
    fn default() -> Self {
        Self::new(None)
    }
}

impl FixedLandmarkDetector {
    pub fn new(result: Option<LandmarkFrame>) -> Self {
        Self {
            result: Mutex::new(Ok(result)),
        }
    }

    /// Detector whose passes all fail with `message`
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Mutex::new(Err(LandmarkError::Detection(message.into()))),
        }
    }

    /// Swap the face reported by subsequent passes
    pub fn set(&self, result: Option<LandmarkFrame>) {
        *self.result.lock().unwrap_or_else(|e| e.into_inner()) = Ok(result);
    }
}

impl LandmarkDetector for FixedLandmarkDetector {
    fn detect<'a>(&'a self, frame: &'a VideoFrame) -> DetectFuture<'a> {
        Box::pin(async move {
            debug!("Fixed landmark pass on frame {}", frame.sequence);
            self.result.lock().unwrap_or_else(|e| e.into_inner()).clone()
        })
    }
}
