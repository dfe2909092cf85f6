//! Remote Visual-Reasoning Service
//!
//! Request/response access to a hosted vision model:
//! - Object detection for a named class (normalized bounding boxes)
//! - Natural-language captioning of a full frame
//!
//! Transport failures (network, timeout, auth, rate limit) surface as
//! [`VisionError`] and are left to callers to map onto statuses.

mod client;
mod mock;

pub use client::{HttpVisionClient, VisionClientConfig};
pub use mock::MockVisionService;

use frame_source::VideoFrame;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Vision service error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisionError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    #[error("Authentication rejected by vision service")]
    Unauthorized,

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Vision service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Failed to encode frame: {0}")]
    Encode(String),
}

/// Normalized bounding box, all coordinates in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl BoundingBox {
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Box of the given size centered on (cx, cy)
    pub fn centered(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(
            cx - width / 2.0,
            cy - height / 2.0,
            cx + width / 2.0,
            cy + height / 2.0,
        )
    }

    pub fn width(&self) -> f32 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f32 {
        self.y_max - self.y_min
    }

    /// Center point (x, y)
    pub fn center(&self) -> (f32, f32) {
        (
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }
}

/// Boxed future returned by [`VisionService`] operations
pub type VisionFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, VisionError>> + Send + 'a>>;

/// A remote visual-reasoning backend
pub trait VisionService: Send + Sync {
    /// Detect every instance of `class_name` in the frame
    fn detect<'a>(
        &'a self,
        frame: &'a VideoFrame,
        class_name: &'a str,
    ) -> VisionFuture<'a, Vec<BoundingBox>>;

    /// Describe the whole frame in natural language
    fn caption<'a>(&'a self, frame: &'a VideoFrame) -> VisionFuture<'a, String>;
}
