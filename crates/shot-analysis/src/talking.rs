//! Talking detection from lip separation

use std::time::{Duration, Instant};

use crate::config::AnalyzerConfig;
use crate::landmarks::{FaceLandmark, SmoothedLandmarks};
use crate::status::Verdict;

/// Debounced talking flag
///
/// `is_talking` only follows a new raw measurement once the debounce
/// window has elapsed since the previous flip. The displayed status is
/// driven by the raw measurement, not this flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TalkingHysteresis {
    pub is_talking: bool,
    pub last_change: Option<Instant>,
}

impl TalkingHysteresis {
    /// Feed a raw measurement; returns true if the stored flag flipped
    pub fn update(&mut self, raw_talking: bool, now: Instant, debounce: Duration) -> bool {
        if raw_talking == self.is_talking {
            return false;
        }
        let settled = match self.last_change {
            Some(last) => now.saturating_duration_since(last) >= debounce,
            None => true,
        };
        if settled {
            self.is_talking = raw_talking;
            self.last_change = Some(now);
        }
        settled
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Vertical gap between upper and lower lip
pub fn lip_distance(landmarks: &SmoothedLandmarks) -> Option<f64> {
    let upper = landmarks.get(FaceLandmark::UpperLip)?;
    let lower = landmarks.get(FaceLandmark::LowerLip)?;
    Some((upper.y - lower.y).abs())
}

/// Talking verdict; updates the hysteresis as a side effect
pub fn analyze_talking(
    landmarks: Option<&SmoothedLandmarks>,
    hysteresis: &mut TalkingHysteresis,
    now: Instant,
    config: &AnalyzerConfig,
) -> Verdict {
    let Some(landmarks) = landmarks else {
        return Verdict::no_face();
    };
    let Some(distance) = lip_distance(landmarks) else {
        return Verdict::error();
    };

    let raw_talking = distance > config.talking_lip_threshold;
    hysteresis.update(
        raw_talking,
        now,
        Duration::from_millis(config.talking_debounce_ms),
    );

    if raw_talking {
        Verdict::good("TALKING")
    } else {
        Verdict::warning("SILENT")
    }
}
