//! Shot-Quality Analyzers
//!
//! Per-signal classifiers for a live camera shot:
//! - Landmark smoothing (moving average over recent frames)
//! - Head orientation and talking detection from facial landmarks
//! - Focus (Laplacian variance) and lighting (mean luminance)
//! - Presence, composition and scene context from remote results
//!
//! Every analyzer is a pure function of its inputs and an
//! [`AnalyzerConfig`], returning a [`Verdict`]. Failures and unmet
//! preconditions become verdicts rather than errors.

pub mod composition;
pub mod config;
pub mod detector;
pub mod focus;
pub mod landmarks;
pub mod lighting;
pub mod orientation;
pub mod smoother;
pub mod status;
pub mod talking;

pub use composition::{composition_verdict, presence_verdict, scene_verdict, FramingIssue};
pub use config::{AnalyzerConfig, CompositionConfig};
pub use detector::{DetectFuture, FixedLandmarkDetector, LandmarkDetector};
pub use focus::analyze_focus;
pub use landmarks::{FaceLandmark, LandmarkFrame, LandmarkPoint, SmoothedLandmarks};
pub use lighting::analyze_lighting;
pub use orientation::analyze_orientation;
pub use smoother::LandmarkSmoother;
pub use status::{StatusClass, Verdict};
pub use talking::{analyze_talking, TalkingHysteresis};

use thiserror::Error;

/// Landmark detection error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LandmarkError {
    #[error("Landmark detection failed: {0}")]
    Detection(String),
}
