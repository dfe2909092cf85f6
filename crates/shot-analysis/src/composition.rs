//! Presence, framing and scene-context verdicts from remote results

use vision_service::{BoundingBox, VisionError};

use crate::config::CompositionConfig;
use crate::status::Verdict;

/// A single framing problem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingIssue {
    TooClose,
    TooFar,
    /// Subject sits left of center; move right
    MoveRight,
    /// Subject sits right of center; move left
    MoveLeft,
    /// Subject sits too high; move down
    MoveDown,
    /// Subject sits too low; move up
    MoveUp,
}

impl FramingIssue {
    pub fn tag(&self) -> &'static str {
        match self {
            FramingIssue::TooClose => "TOO CLOSE",
            FramingIssue::TooFar => "TOO FAR",
            FramingIssue::MoveRight => "→ RIGHT",
            FramingIssue::MoveLeft => "← LEFT",
            FramingIssue::MoveDown => "↓ DOWN",
            FramingIssue::MoveUp => "↑ UP",
        }
    }
}

/// Framing issues for one box: size, then horizontal, then vertical
pub fn framing_issues(face: &BoundingBox, config: &CompositionConfig) -> Vec<FramingIssue> {
    let mut issues = Vec::new();
    let (width, height) = (face.width(), face.height());
    let (cx, cy) = face.center();

    if width > config.too_close_width || height > config.too_close_height {
        issues.push(FramingIssue::TooClose);
    } else if width < config.too_far_width && height < config.too_far_height {
        issues.push(FramingIssue::TooFar);
    }

    if cx < config.min_center_x {
        issues.push(FramingIssue::MoveRight);
    } else if cx > config.max_center_x {
        issues.push(FramingIssue::MoveLeft);
    }

    if cy < config.min_center_y {
        issues.push(FramingIssue::MoveDown);
    } else if cy > config.max_center_y {
        issues.push(FramingIssue::MoveUp);
    }

    issues
}

/// Presence verdict from a detection result
pub fn presence_verdict(result: &Result<Vec<BoundingBox>, VisionError>) -> Verdict {
    match result {
        Ok(faces) if !faces.is_empty() => Verdict::good("PRESENT"),
        Ok(_) => Verdict::bad("ABSENT"),
        Err(_) => Verdict::error(),
    }
}

/// Composition verdict from the same detection result (first face only)
pub fn composition_verdict(
    result: &Result<Vec<BoundingBox>, VisionError>,
    config: &CompositionConfig,
) -> Verdict {
    let faces = match result {
        Ok(faces) => faces,
        Err(_) => return Verdict::error(),
    };
    let Some(face) = faces.first() else {
        return Verdict::no_face();
    };

    let issues = framing_issues(face, config);
    if issues.is_empty() {
        return Verdict::good("GOOD");
    }
    let text = issues.iter().map(FramingIssue::tag).collect::<Vec<_>>().join(" ");
    Verdict::bad(text)
}

/// Scene-context verdict; the description itself is stored separately
pub fn scene_verdict(result: &Result<String, VisionError>) -> Verdict {
    match result {
        Ok(_) => Verdict::good("UPDATED"),
        Err(_) => Verdict::error(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CompositionConfig {
        CompositionConfig::default()
    }

    #[test]
    fn test_wide_centered_box_is_only_too_close() {
        let face = BoundingBox::centered(0.5, 0.5, 0.6, 0.4);
        let verdict = composition_verdict(&Ok(vec![face]), &config());
        assert_eq!(verdict, Verdict::bad("TOO CLOSE"));
    }

    #[test]
    fn test_well_framed_face() {
        let face = BoundingBox::centered(0.5, 0.5, 0.25, 0.375);
        assert_eq!(composition_verdict(&Ok(vec![face]), &config()), Verdict::good("GOOD"));
    }

    #[test]
    fn test_issue_order_and_joining() {
        // tiny face in the top-left corner
        let face = BoundingBox::centered(0.125, 0.125, 0.0625, 0.0625);
        let verdict = composition_verdict(&Ok(vec![face]), &config());
        assert_eq!(verdict, Verdict::bad("TOO FAR → RIGHT ↓ DOWN"));
    }

    #[test]
    fn test_bottom_right_face() {
        let face = BoundingBox::centered(0.875, 0.875, 0.25, 0.25);
        assert_eq!(
            framing_issues(&face, &config()),
            vec![FramingIssue::MoveLeft, FramingIssue::MoveUp]
        );
    }

    #[test]
    fn test_only_first_face_counts() {
        let good = BoundingBox::centered(0.5, 0.5, 0.25, 0.375);
        let far = BoundingBox::centered(0.5, 0.5, 0.0625, 0.0625);
        assert_eq!(composition_verdict(&Ok(vec![good, far]), &config()).label, "GOOD");
    }

    #[test]
    fn test_no_faces() {
        let result = Ok(vec![]);
        assert_eq!(presence_verdict(&result), Verdict::bad("ABSENT"));
        assert_eq!(composition_verdict(&result, &config()), Verdict::bad("NO FACE"));
    }

    #[test]
    fn test_service_failure() {
        let result: Result<Vec<BoundingBox>, VisionError> = Err(VisionError::Timeout(10_000));
        assert_eq!(presence_verdict(&result), Verdict::error());
        assert_eq!(composition_verdict(&result, &config()), Verdict::error());
        assert_eq!(scene_verdict(&Err(VisionError::RateLimited)), Verdict::error());
        assert_eq!(scene_verdict(&Ok("a desk".into())), Verdict::good("UPDATED"));
    }
}
