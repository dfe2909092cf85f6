//! End-to-end monitoring runs on a paused clock

use std::sync::Arc;
use std::time::Duration;

use frame_source::{FrameSource, LatestFrameSource, StillImageSource, VideoFrame};
use shot_analysis::{
    DetectFuture, FaceLandmark, FixedLandmarkDetector, LandmarkDetector, LandmarkFrame, LandmarkPoint,
    StatusClass,
};
use shot_monitor::{MonitorKey, ShotMonitor};
use vision_service::{BoundingBox, MockVisionService, VisionError};

const CAPTION: &str = "A person sitting at a desk";

/// Fine checkerboard around mid-gray: good exposure, sharp texture
fn studio_frame() -> VideoFrame {
    let (width, height) = (160, 120);
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let v = if (x / 2 + y / 2) % 2 == 0 { 230 } else { 20 };
            data.extend_from_slice(&[v, v, v]);
        }
    }
    VideoFrame::from_rgb(data, width as u32, height as u32).unwrap()
}

/// Centered, frontal face with closed lips
fn frontal_face() -> LandmarkFrame {
    let mut face = LandmarkFrame::uniform(LandmarkPoint::new(0.5, 0.5));
    face.set(FaceLandmark::NoseTip, LandmarkPoint::new(0.5, 0.5));
    face.set(FaceLandmark::LeftFaceEdge, LandmarkPoint::new(0.3, 0.5));
    face.set(FaceLandmark::RightFaceEdge, LandmarkPoint::new(0.7, 0.5));
    face.set(FaceLandmark::LeftEye, LandmarkPoint::new(0.4, 0.45));
    face.set(FaceLandmark::RightEye, LandmarkPoint::new(0.6, 0.45));
    face.set(FaceLandmark::UpperLip, LandmarkPoint::new(0.5, 0.6));
    face.set(FaceLandmark::LowerLip, LandmarkPoint::new(0.5, 0.605));
    face
}

/// Fixed detector that answers after `latency`
struct SlowLandmarkDetector {
    face: LandmarkFrame,
    latency: Duration,
}

impl LandmarkDetector for SlowLandmarkDetector {
    fn detect<'a>(&'a self, _frame: &'a VideoFrame) -> DetectFuture<'a> {
        Box::pin(async move {
            tokio::time::sleep(self.latency).await;
            Ok(Some(self.face.clone()))
        })
    }
}

fn well_framed_face() -> BoundingBox {
    BoundingBox::centered(0.5, 0.5, 0.25, 0.375)
}

fn studio_vision() -> Arc<MockVisionService> {
    Arc::new(
        MockVisionService::new()
            .with_boxes(vec![well_framed_face()])
            .with_caption(CAPTION),
    )
}

fn monitor_with(frames: Arc<dyn FrameSource>, vision: Arc<MockVisionService>) -> ShotMonitor {
    ShotMonitor::builder(frames)
        .landmark_detector(Arc::new(FixedLandmarkDetector::new(Some(frontal_face()))))
        .vision_service(vision)
        .build()
        .unwrap()
}

fn studio_monitor(vision: Arc<MockVisionService>) -> ShotMonitor {
    monitor_with(Arc::new(StillImageSource::new(studio_frame())), vision)
}

async fn settle(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[tokio::test(start_paused = true)]
async fn test_full_board_on_a_good_shot() {
    let vision = studio_vision();
    let monitor = studio_monitor(Arc::clone(&vision));
    monitor.start().unwrap();
    settle(10).await;

    let expected = [
        (MonitorKey::Orientation, "STRAIGHT", StatusClass::Good),
        (MonitorKey::Talking, "SILENT", StatusClass::Warning),
        (MonitorKey::Focus, "SHARP", StatusClass::Good),
        (MonitorKey::Lighting, "GOOD", StatusClass::Good),
        (MonitorKey::Presence, "PRESENT", StatusClass::Good),
        (MonitorKey::Composition, "GOOD", StatusClass::Good),
        (MonitorKey::SceneContext, "UPDATED", StatusClass::Good),
    ];
    for (key, status, class) in expected {
        let state = monitor.state(key);
        assert_eq!(state.status, status, "{}", key);
        assert_eq!(state.status_class, class, "{}", key);
    }
    assert_eq!(monitor.scene_description().as_deref(), Some(CAPTION));

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_start_marks_enabled_monitors_analyzing() {
    let vision = studio_vision();
    let monitor = studio_monitor(vision);
    monitor.toggle(MonitorKey::Presence);
    monitor.start().unwrap();

    // lighting is synchronous; async monitors still show the placeholder
    assert_eq!(monitor.state(MonitorKey::Lighting).status, "GOOD");
    assert_eq!(monitor.state(MonitorKey::Orientation).status, "Analyzing...");
    assert_eq!(monitor.state(MonitorKey::Orientation).status_class, StatusClass::Warning);
    assert_eq!(monitor.state(MonitorKey::Presence).status, "OFF");

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_remote_calls_are_throttled() {
    let vision = studio_vision();
    let monitor = studio_monitor(Arc::clone(&vision));
    monitor.start().unwrap();

    // cycles at 0, 1.5, 3.0, 4.5 and 6.0 s
    settle(6_100).await;
    assert_eq!(vision.detect_calls(), 3);
    assert_eq!(vision.caption_calls(), 3);

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_toggle_off_survives_pending_response() {
    let vision = Arc::new(
        MockVisionService::new()
            .with_boxes(vec![well_framed_face()])
            .with_caption(CAPTION)
            .with_latency(Duration::from_millis(500)),
    );
    let monitor = studio_monitor(Arc::clone(&vision));
    monitor.start().unwrap();
    monitor.toggle(MonitorKey::Presence);
    settle(700).await;

    let presence = monitor.state(MonitorKey::Presence);
    assert!(!presence.enabled);
    assert_eq!(presence.status, "OFF");
    assert_eq!(presence.status_class, StatusClass::Disabled);
    assert_eq!(monitor.state(MonitorKey::Composition).status, "GOOD");

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_reenabled_monitor_waits_for_next_batch() {
    let vision = Arc::new(
        MockVisionService::new()
            .with_boxes(vec![well_framed_face()])
            .with_latency(Duration::from_millis(500)),
    );
    let monitor = studio_monitor(Arc::clone(&vision));
    monitor.start().unwrap();
    monitor.toggle(MonitorKey::Presence);
    monitor.toggle(MonitorKey::Presence);
    settle(700).await;

    // the batch issued before the toggle is stale
    assert_eq!(monitor.state(MonitorKey::Presence).status, "OFF");

    // next batch goes out at 3.0 s and lands at 3.5 s
    settle(3_000).await;
    assert_eq!(monitor.state(MonitorKey::Presence).status, "PRESENT");

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_reenabled_landmark_monitor_waits_for_next_cycle() {
    let detector = SlowLandmarkDetector {
        face: frontal_face(),
        latency: Duration::from_millis(300),
    };
    let monitor = ShotMonitor::builder(Arc::new(StillImageSource::new(studio_frame())))
        .landmark_detector(Arc::new(detector))
        .build()
        .unwrap();
    monitor.start().unwrap();
    monitor.toggle(MonitorKey::Orientation);
    monitor.toggle(MonitorKey::Orientation);
    settle(500).await;

    // the pass dispatched before the toggle lands at 300 ms and is stale
    let orientation = monitor.state(MonitorKey::Orientation);
    assert!(orientation.enabled);
    assert_eq!(orientation.status, "OFF");
    assert_eq!(monitor.state(MonitorKey::Talking).status, "SILENT");
    assert_eq!(monitor.state(MonitorKey::Focus).status, "SHARP");

    // next cycle at 1.5 s, result at 1.8 s
    settle(1_400).await;
    assert_eq!(monitor.state(MonitorKey::Orientation).status, "STRAIGHT");

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_landmark_failure_marks_error() {
    let monitor = ShotMonitor::builder(Arc::new(StillImageSource::new(studio_frame())))
        .landmark_detector(Arc::new(FixedLandmarkDetector::failing("model not loaded")))
        .build()
        .unwrap();
    monitor.toggle(MonitorKey::Focus);
    monitor.start().unwrap();
    settle(10).await;

    assert_eq!(monitor.state(MonitorKey::Orientation).status, "ERROR");
    assert_eq!(monitor.state(MonitorKey::Talking).status, "ERROR");
    assert_eq!(monitor.state(MonitorKey::Talking).status_class, StatusClass::Warning);
    assert_eq!(monitor.state(MonitorKey::Focus).status, "OFF");
    assert_eq!(monitor.state(MonitorKey::Lighting).status, "GOOD");

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_stop_discards_late_results() {
    let vision = Arc::new(
        MockVisionService::new()
            .with_boxes(vec![well_framed_face()])
            .with_caption(CAPTION)
            .with_latency(Duration::from_millis(500)),
    );
    let monitor = studio_monitor(Arc::clone(&vision));
    monitor.start().unwrap();
    monitor.stop();
    settle(5_000).await;

    assert!(!monitor.is_monitoring());
    for state in monitor.snapshot().monitors {
        assert_eq!(state.status, "N/A", "{}", state.key);
        assert_eq!(state.status_class, StatusClass::Disabled);
    }
    assert_eq!(monitor.scene_description(), None);
    // the ticker is gone; only the first batch was issued
    assert_eq!(vision.detect_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_remote_failure_marks_error() {
    let vision = Arc::new(MockVisionService::new().failing(VisionError::RateLimited));
    let monitor = studio_monitor(vision);
    monitor.start().unwrap();
    settle(10).await;

    for key in MonitorKey::REMOTE {
        let state = monitor.state(key);
        assert_eq!(state.status, "ERROR", "{}", key);
        assert_eq!(state.status_class, StatusClass::Warning);
    }
    assert_eq!(monitor.scene_description(), None);
    // local monitors are unaffected
    assert_eq!(monitor.state(MonitorKey::Orientation).status, "STRAIGHT");

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_failed_caption_keeps_previous_description() {
    let vision = studio_vision();
    let monitor = studio_monitor(Arc::clone(&vision));
    monitor.start().unwrap();
    settle(10).await;
    assert_eq!(monitor.scene_description().as_deref(), Some(CAPTION));

    vision.set_caption(Err(VisionError::Network("connection reset".into())));
    settle(3_100).await;
    assert_eq!(monitor.state(MonitorKey::SceneContext).status, "ERROR");
    assert_eq!(monitor.scene_description().as_deref(), Some(CAPTION));

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_hung_service_times_out() {
    let vision = Arc::new(
        MockVisionService::new()
            .with_boxes(vec![well_framed_face()])
            .with_latency(Duration::from_secs(60)),
    );
    let monitor = studio_monitor(vision);
    monitor.start().unwrap();
    settle(10_100).await;

    assert_eq!(monitor.state(MonitorKey::Presence).status, "ERROR");
    assert_eq!(monitor.state(MonitorKey::Composition).status, "ERROR");

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_no_face_in_frame() {
    let vision = Arc::new(MockVisionService::new());
    let monitor = ShotMonitor::builder(Arc::new(StillImageSource::new(studio_frame())))
        .landmark_detector(Arc::new(FixedLandmarkDetector::new(None)))
        .vision_service(vision)
        .build()
        .unwrap();
    monitor.start().unwrap();
    settle(10).await;

    assert_eq!(monitor.state(MonitorKey::Orientation).status, "NO FACE");
    assert_eq!(monitor.state(MonitorKey::Talking).status, "NO FACE");
    assert_eq!(monitor.state(MonitorKey::Focus).status, "NO DATA");
    assert_eq!(monitor.state(MonitorKey::Presence).status, "ABSENT");
    assert_eq!(monitor.state(MonitorKey::Composition).status, "NO FACE");
    assert_eq!(monitor.state(MonitorKey::Lighting).status, "GOOD");

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_framing_feedback() {
    let vision = Arc::new(
        MockVisionService::new().with_boxes(vec![BoundingBox::centered(0.5, 0.5, 0.6, 0.4)]),
    );
    let monitor = studio_monitor(vision);
    monitor.start().unwrap();
    settle(10).await;

    let composition = monitor.state(MonitorKey::Composition);
    assert_eq!(composition.status, "TOO CLOSE");
    assert_eq!(composition.status_class, StatusClass::Bad);

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_waits_for_live_frames() {
    let frames = Arc::new(LatestFrameSource::new());
    let vision = studio_vision();
    let monitor = monitor_with(frames.clone(), Arc::clone(&vision));
    monitor.start().unwrap();
    settle(10).await;

    assert_eq!(monitor.state(MonitorKey::Lighting).status, "N/A");
    assert_eq!(monitor.state(MonitorKey::Presence).status, "NO SOURCE");
    assert_eq!(monitor.state(MonitorKey::Presence).status_class, StatusClass::Warning);
    assert_eq!(vision.detect_calls(), 0);

    frames.publish(studio_frame());
    settle(3_100).await;
    assert_eq!(monitor.state(MonitorKey::Lighting).status, "GOOD");
    assert_eq!(monitor.state(MonitorKey::Presence).status, "PRESENT");
    assert_eq!(monitor.state(MonitorKey::Orientation).status, "STRAIGHT");

    monitor.stop();
}

#[tokio::test(start_paused = true)]
async fn test_subscribers_see_updates() {
    let monitor = studio_monitor(studio_vision());
    let mut updates = monitor.subscribe();
    assert!(!updates.borrow().monitoring);

    monitor.start().unwrap();
    settle(10).await;
    assert!(updates.has_changed().unwrap());
    let snapshot = updates.borrow_and_update().clone();
    assert!(snapshot.monitoring);
    assert_eq!(snapshot.get(MonitorKey::Presence).unwrap().status, "PRESENT");

    monitor.stop();
    let snapshot = updates.borrow_and_update().clone();
    assert!(!snapshot.monitoring);
}

#[tokio::test(start_paused = true)]
async fn test_restart_after_stop() {
    let vision = studio_vision();
    let monitor = studio_monitor(Arc::clone(&vision));
    monitor.start().unwrap();
    settle(10).await;
    monitor.stop();

    monitor.start().unwrap();
    settle(10).await;
    assert_eq!(monitor.state(MonitorKey::Presence).status, "PRESENT");
    // throttle is cleared on stop so the restart issues a fresh batch
    assert_eq!(vision.detect_calls(), 2);

    monitor.stop();
}
