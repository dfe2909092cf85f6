//! Exposure check from mean frame luminance

use frame_source::VideoFrame;

use crate::config::AnalyzerConfig;
use crate::status::Verdict;

/// Exposure bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exposure {
    Dark,
    Dim,
    Good,
    Bright,
    Overexposed,
}

impl Exposure {
    pub fn verdict(&self) -> Verdict {
        match self {
            Exposure::Dark => Verdict::bad("DARK"),
            Exposure::Dim => Verdict::warning("DIM"),
            Exposure::Good => Verdict::good("GOOD"),
            Exposure::Bright => Verdict::warning("BRIGHT"),
            Exposure::Overexposed => Verdict::bad("OVEREXPOSED"),
        }
    }
}

/// Bucket a mean luminance on the 0-255 scale
///
/// Bands: `< dark`, `[dark, dim)`, `[dim, bright]`, `(bright, overexposed]`,
/// `> overexposed`.
pub fn classify_exposure(luminance: f64, config: &AnalyzerConfig) -> Exposure {
    if luminance < config.lighting_dark_below {
        Exposure::Dark
    } else if luminance < config.lighting_dim_below {
        Exposure::Dim
    } else if luminance <= config.lighting_bright_above {
        Exposure::Good
    } else if luminance <= config.lighting_overexposed_above {
        Exposure::Bright
    } else {
        Exposure::Overexposed
    }
}

/// Lighting verdict over the whole frame; no face required
pub fn analyze_lighting(frame: Option<&VideoFrame>, config: &AnalyzerConfig) -> Verdict {
    match frame.and_then(VideoFrame::mean_luminance) {
        Some(luminance) => classify_exposure(luminance, config).verdict(),
        None => Verdict::disabled("N/A"),
    }
}
