//! Analyzer thresholds

use serde::{Deserialize, Serialize};

/// Face-box composition limits (all normalized)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompositionConfig {
    /// Box wider than this is too close
    pub too_close_width: f32,
    /// Box taller than this is too close
    pub too_close_height: f32,
    /// Box narrower than this (and shorter than `too_far_height`) is too far
    pub too_far_width: f32,
    pub too_far_height: f32,
    /// Acceptable horizontal band for the box center
    pub min_center_x: f32,
    pub max_center_x: f32,
    /// Acceptable vertical band for the box center
    pub min_center_y: f32,
    pub max_center_y: f32,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            too_close_width: 0.5,
            too_close_height: 0.6,
            too_far_width: 0.15,
            too_far_height: 0.2,
            min_center_x: 0.3,
            max_center_x: 0.7,
            min_center_y: 0.25,
            max_center_y: 0.75,
        }
    }
}

/// Analyzer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Landmark frames averaged by the smoother
    pub smoothing_window: usize,

    /// Max nose offset asymmetry still considered straight
    pub orientation_tolerance: f64,

    /// Lip gap above which the mouth counts as open
    pub talking_lip_threshold: f64,

    /// Minimum time between talking-state flips (milliseconds)
    pub talking_debounce_ms: u64,

    /// Side of the square focus sample patch (pixels)
    pub focus_patch_size: u32,

    /// Laplacian variance above which the patch is sharp
    pub focus_sharp_threshold: f64,

    /// Laplacian variance at or below which the patch is blurry
    pub focus_blurry_threshold: f64,

    /// Luminance below this is dark (0-255)
    pub lighting_dark_below: f64,

    /// Luminance below this is dim
    pub lighting_dim_below: f64,

    /// Luminance above this is bright
    pub lighting_bright_above: f64,

    /// Luminance above this is overexposed
    pub lighting_overexposed_above: f64,

    /// Object class requested from the detection service
    pub presence_class: String,

    pub composition: CompositionConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 5,
            orientation_tolerance: 0.15,
            talking_lip_threshold: 0.018,
            talking_debounce_ms: 150,
            focus_patch_size: 40,
            focus_sharp_threshold: 12.0,
            focus_blurry_threshold: 6.0,
            lighting_dark_below: 50.0,
            lighting_dim_below: 90.0,
            lighting_bright_above: 180.0,
            lighting_overexposed_above: 220.0,
            presence_class: "face".to_string(),
            composition: CompositionConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Create strict config (tighter framing and exposure bands)
    pub fn strict() -> Self {
        Self {
            orientation_tolerance: 0.08,
            focus_sharp_threshold: 20.0,
            focus_blurry_threshold: 10.0,
            lighting_dim_below: 100.0,
            lighting_bright_above: 170.0,
            ..Default::default()
        }
    }

    /// Create lenient config (looser framing and exposure bands)
    pub fn lenient() -> Self {
        Self {
            orientation_tolerance: 0.25,
            focus_sharp_threshold: 8.0,
            focus_blurry_threshold: 4.0,
            lighting_dim_below: 70.0,
            lighting_bright_above: 200.0,
            ..Default::default()
        }
    }
}
