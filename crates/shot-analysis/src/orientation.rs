//! Head orientation from nose position between the face edges

use serde::{Deserialize, Serialize};

use crate::config::AnalyzerConfig;
use crate::landmarks::{FaceLandmark, SmoothedLandmarks};
use crate::status::Verdict;

/// Which way the head is turned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadDirection {
    Straight,
    Left,
    Right,
}

impl HeadDirection {
    pub fn label(&self) -> &'static str {
        match self {
            HeadDirection::Straight => "STRAIGHT",
            HeadDirection::Left => "LEFT",
            HeadDirection::Right => "RIGHT",
        }
    }
}

/// Horizontal nose offsets to each face edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationReading {
    pub nose_to_left: f64,
    pub nose_to_right: f64,
}

impl OrientationReading {
    /// Measure from landmarks; `None` if any required point is missing
    pub fn measure(landmarks: &SmoothedLandmarks) -> Option<Self> {
        let nose = landmarks.get(FaceLandmark::NoseTip)?;
        let left = landmarks.get(FaceLandmark::LeftFaceEdge)?;
        let right = landmarks.get(FaceLandmark::RightFaceEdge)?;
        Some(Self {
            nose_to_left: (nose.x - left.x).abs(),
            nose_to_right: (nose.x - right.x).abs(),
        })
    }

    /// Asymmetry between the two offsets
    pub fn diff(&self) -> f64 {
        (self.nose_to_left - self.nose_to_right).abs()
    }

    /// Classify against the straight tolerance (inclusive)
    pub fn direction(&self, tolerance: f64) -> HeadDirection {
        if self.diff() <= tolerance {
            HeadDirection::Straight
        } else if self.nose_to_left > self.nose_to_right {
            HeadDirection::Left
        } else {
            HeadDirection::Right
        }
    }
}

/// Orientation verdict; `None` landmarks means no face was found
pub fn analyze_orientation(landmarks: Option<&SmoothedLandmarks>, config: &AnalyzerConfig) -> Verdict {
    let Some(landmarks) = landmarks else {
        return Verdict::no_face();
    };
    let Some(reading) = OrientationReading::measure(landmarks) else {
        return Verdict::error();
    };

    match reading.direction(config.orientation_tolerance) {
        HeadDirection::Straight => Verdict::good(HeadDirection::Straight.label()),
        turned => Verdict::bad(turned.label()),
    }
}
