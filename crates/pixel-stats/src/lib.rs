//! Pixel Statistics Backend
//!
//! Grayscale Laplacian sharpness scoring over small image regions.
//! Backends must report "not ready" distinctly from a computed zero,
//! since a flat patch legitimately scores 0.

mod laplacian;

pub use laplacian::{laplacian, ResponseStatistics};

use image::GrayImage;
use thiserror::Error;
use tracing::debug;

/// Smallest region the 3x3 kernel produces a meaningful response on
pub const MIN_REGION_SIDE: u32 = 3;

/// Statistics backend errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatsError {
    #[error("Statistics backend not ready")]
    NotReady,

    #[error("Region {width}x{height} is too small for the Laplacian kernel")]
    RegionTooSmall { width: u32, height: u32 },
}

/// Backend computing the sharpness statistic of a grayscale region
pub trait PixelStats: Send + Sync {
    /// Whether the backend can compute right now
    fn is_ready(&self) -> bool {
        true
    }

    /// Variance of the Laplacian response over `region`
    fn laplacian_variance(&self, region: &GrayImage) -> Result<f64, StatsError>;
}

/// Pure-Rust Laplacian backend; always ready
#[derive(Debug, Clone, Copy, Default)]
pub struct LaplacianStats;

impl LaplacianStats {
    pub fn new() -> Self {
        Self
    }
}

impl PixelStats for LaplacianStats {
    fn laplacian_variance(&self, region: &GrayImage) -> Result<f64, StatsError> {
        let (width, height) = region.dimensions();
        if width < MIN_REGION_SIDE || height < MIN_REGION_SIDE {
            return Err(StatsError::RegionTooSmall { width, height });
        }

        let stats = ResponseStatistics::compute(&laplacian(region));
        debug!(
            "Laplacian over {}x{}: mean={:.3} var={:.3}",
            width, height, stats.mean, stats.variance
        );
        Ok(stats.variance)
    }
}
