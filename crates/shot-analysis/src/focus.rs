//! Focus scoring on a patch around the eyes and nose

use frame_source::VideoFrame;
use pixel_stats::{PixelStats, StatsError};
use tracing::warn;

use crate::config::AnalyzerConfig;
use crate::landmarks::{FaceLandmark, SmoothedLandmarks};
use crate::status::Verdict;

/// Sharpness bucket for a Laplacian variance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sharpness {
    Sharp,
    Ok,
    Blurry,
}

/// Bucket a variance: above sharp threshold, above blurry threshold, else blurry
pub fn classify_sharpness(variance: f64, config: &AnalyzerConfig) -> Sharpness {
    if variance > config.focus_sharp_threshold {
        Sharpness::Sharp
    } else if variance > config.focus_blurry_threshold {
        Sharpness::Ok
    } else {
        Sharpness::Blurry
    }
}

impl Sharpness {
    pub fn verdict(&self) -> Verdict {
        match self {
            Sharpness::Sharp => Verdict::good("SHARP"),
            Sharpness::Ok => Verdict::warning("OK"),
            Sharpness::Blurry => Verdict::bad("BLURRY"),
        }
    }
}

/// Normalized sample center: mean of left eye, right eye and nose tip
pub fn sample_center(landmarks: &SmoothedLandmarks) -> Option<(f64, f64)> {
    let left = landmarks.get(FaceLandmark::LeftEye)?;
    let right = landmarks.get(FaceLandmark::RightEye)?;
    let nose = landmarks.get(FaceLandmark::NoseTip)?;
    Some((
        (left.x + right.x + nose.x) / 3.0,
        (left.y + right.y + nose.y) / 3.0,
    ))
}

/// Top-left corner of a `patch`-sized square centered on the pixel
/// position of `center`, clamped inside a `width` x `height` frame
pub fn patch_origin(center: (f64, f64), width: u32, height: u32, patch: u32) -> (u32, u32) {
    let half = patch as f64 / 2.0;
    let clamp_axis = |c: f64, extent: u32| -> u32 {
        let max_origin = extent.saturating_sub(patch) as f64;
        (c * extent as f64 - half).round().clamp(0.0, max_origin) as u32
    };
    (clamp_axis(center.0, width), clamp_axis(center.1, height))
}

/// Focus verdict
///
/// Every unmet precondition maps to its own warning label.
pub fn analyze_focus(
    frame: Option<&VideoFrame>,
    landmarks: Option<&SmoothedLandmarks>,
    stats: &dyn PixelStats,
    config: &AnalyzerConfig,
) -> Verdict {
    if !stats.is_ready() {
        return Verdict::warning("CV N/A");
    }
    let Some(frame) = frame else {
        return Verdict::warning("NO SOURCE");
    };
    let patch = config.focus_patch_size;
    if frame.width < patch || frame.height < patch {
        return Verdict::warning("WAITING");
    }
    let Some(center) = landmarks.and_then(sample_center) else {
        return Verdict::warning("NO DATA");
    };

    let (x, y) = patch_origin(center, frame.width, frame.height, patch);
    let Some(region) = frame.crop(x, y, patch, patch) else {
        return Verdict::error();
    };

    match stats.laplacian_variance(&region.to_gray_image()) {
        Ok(variance) => classify_sharpness(variance, config).verdict(),
        Err(StatsError::NotReady) => Verdict::warning("CV N/A"),
        Err(e) => {
            warn!("Focus statistics failed: {}", e);
            Verdict::error()
        }
    }
}
