//! Facial landmark frames

use serde::{Deserialize, Serialize};

/// Points in a full face-mesh frame
pub const MESH_POINT_COUNT: usize = 468;

/// Landmark with normalized [0, 1] image coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_z(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

/// Face-mesh indices the analyzers read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceLandmark {
    NoseTip,
    LeftFaceEdge,
    RightFaceEdge,
    UpperLip,
    LowerLip,
    LeftEye,
    RightEye,
}

impl FaceLandmark {
    /// Index in the mesh
    pub fn index(&self) -> usize {
        match self {
            FaceLandmark::NoseTip => 1,
            FaceLandmark::LeftFaceEdge => 234,
            FaceLandmark::RightFaceEdge => 454,
            FaceLandmark::UpperLip => 13,
            FaceLandmark::LowerLip => 14,
            FaceLandmark::LeftEye => 33,
            FaceLandmark::RightEye => 263,
        }
    }
}

/// One detection pass worth of landmarks for a single face
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LandmarkFrame {
    points: Vec<LandmarkPoint>,
}

/// Smoothed landmarks share the raw frame layout
pub type SmoothedLandmarks = LandmarkFrame;

impl LandmarkFrame {
    pub fn new(points: Vec<LandmarkPoint>) -> Self {
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[LandmarkPoint] {
        &self.points
    }

    /// Point at a raw index
    pub fn point(&self, index: usize) -> Option<LandmarkPoint> {
        self.points.get(index).copied()
    }

    /// Point for a named landmark
    pub fn get(&self, landmark: FaceLandmark) -> Option<LandmarkPoint> {
        self.point(landmark.index())
    }

    /// Full mesh with every point at `fill`, for building synthetic faces
    pub fn uniform(fill: LandmarkPoint) -> Self {
        Self::new(vec![fill; MESH_POINT_COUNT])
    }

    /// Replace a named landmark (no-op if the frame is too short)
    pub fn set(&mut self, landmark: FaceLandmark, point: LandmarkPoint) {
        if let Some(slot) = self.points.get_mut(landmark.index()) {
            *slot = point;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_lookup() {
        let mut frame = LandmarkFrame::uniform(LandmarkPoint::new(0.5, 0.5));
        frame.set(FaceLandmark::NoseTip, LandmarkPoint::new(0.1, 0.2));
        assert_eq!(frame.get(FaceLandmark::NoseTip), Some(LandmarkPoint::new(0.1, 0.2)));
        assert_eq!(frame.point(1), Some(LandmarkPoint::new(0.1, 0.2)));
    }

    #[test]
    fn test_short_frame_misses_landmarks() {
        let frame = LandmarkFrame::new(vec![LandmarkPoint::default(); 20]);
        assert!(frame.get(FaceLandmark::LowerLip).is_some());
        assert!(frame.get(FaceLandmark::RightFaceEdge).is_none());
    }
}
