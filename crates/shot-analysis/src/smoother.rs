//! Landmark jitter smoothing over a short frame history

use std::collections::VecDeque;

use crate::landmarks::{LandmarkFrame, LandmarkPoint, SmoothedLandmarks};

/// Default number of frames averaged
pub const DEFAULT_HISTORY: usize = 5;

/// Bounded FIFO of raw landmark frames with a per-index moving average
#[derive(Debug, Clone)]
pub struct LandmarkSmoother {
    history: VecDeque<LandmarkFrame>,
    capacity: usize,
    smoothed: Option<SmoothedLandmarks>,
}

impl Default for LandmarkSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY)
    }
}

impl LandmarkSmoother {
    /// Create a smoother keeping the last `capacity` frames (at least 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: VecDeque::with_capacity(capacity + 1),
            capacity,
            smoothed: None,
        }
    }

    /// Add a frame, evicting the oldest once over capacity
    pub fn push(&mut self, frame: LandmarkFrame) {
        self.history.push_back(frame);
        while self.history.len() > self.capacity {
            self.history.pop_front();
        }
        self.smoothed = Some(self.average());
    }

    /// Smoothed landmarks for the current history
    pub fn current(&self) -> Option<&SmoothedLandmarks> {
        self.smoothed.as_ref()
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Forget all history (session end)
    pub fn clear(&mut self) {
        self.history.clear();
        self.smoothed = None;
    }

    /// Full recomputation; output takes the newest frame's layout
    fn average(&self) -> SmoothedLandmarks {
        let Some(newest) = self.history.back() else {
            return LandmarkFrame::default();
        };

        let points = newest
            .points()
            .iter()
            .enumerate()
            .map(|(i, raw)| {
                let mut sum_x = 0.0f64;
                let mut sum_y = 0.0f64;
                let mut sum_z = 0.0f64;
                let mut count = 0usize;
                let mut z_count = 0usize;

                for p in self.history.iter().filter_map(|f| f.point(i)) {
                    sum_x += p.x;
                    sum_y += p.y;
                    count += 1;
                    if let Some(z) = p.z {
                        sum_z += z;
                        z_count += 1;
                    }
                }

                if count == 0 {
                    return *raw;
                }
                LandmarkPoint {
                    x: sum_x / count as f64,
                    y: sum_y / count as f64,
                    z: (z_count > 0).then(|| sum_z / z_count as f64),
                }
            })
            .collect();

        LandmarkFrame::new(points)
    }
}
