//! Monitoring session: cycle scheduling, dispatch and result fan-in

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use frame_source::{FrameSource, VideoFrame};
use metrics::counter;
use pixel_stats::{LaplacianStats, PixelStats};
use shot_analysis::{
    analyze_focus, analyze_lighting, analyze_orientation, analyze_talking, composition_verdict,
    presence_verdict, scene_verdict, LandmarkDetector, LandmarkFrame, LandmarkSmoother,
    StatusClass, TalkingHysteresis, Verdict,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use vision_service::{BoundingBox, VisionError, VisionService};

use crate::board::{BoardSnapshot, MonitorKey, MonitorState, StatusBoard, IDLE_LABEL};
use crate::config::MonitorConfig;
use crate::throttle::ThrottleClock;
use crate::MonitorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SessionId(u64);

struct Session {
    id: SessionId,
    ticker: Option<JoinHandle<()>>,
}

/// Everything guarded by the monitor lock
struct State {
    board: StatusBoard,
    smoother: LandmarkSmoother,
    talking: TalkingHysteresis,
    throttle: ThrottleClock,
    session: Option<Session>,
    sessions_started: u64,
    passes_issued: u64,
    newest_pass: u64,
}

impl State {
    fn is_live(&self, id: SessionId) -> bool {
        self.session.as_ref().is_some_and(|s| s.id == id)
    }

    fn live_session(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    fn snapshot(&self) -> BoardSnapshot {
        self.board.snapshot(self.session.is_some())
    }

    /// Claim a landmark pass; false if a later pass already landed
    fn accept_pass(&mut self, pass: &LandmarkPass) -> bool {
        if pass.order <= self.newest_pass {
            return false;
        }
        self.newest_pass = pass.order;
        true
    }
}

/// Issue order and generations of the landmark monitors enabled when a
/// pass was dispatched
#[derive(Debug, Clone, Copy)]
struct LandmarkPass {
    order: u64,
    orientation: Option<u64>,
    talking: Option<u64>,
    focus: Option<u64>,
}

impl LandmarkPass {
    fn issue(state: &mut State) -> Self {
        state.passes_issued += 1;
        let board = &state.board;
        let stamp = |key| board.is_enabled(key).then(|| board.generation(key));
        Self {
            order: state.passes_issued,
            orientation: stamp(MonitorKey::Orientation),
            talking: stamp(MonitorKey::Talking),
            focus: stamp(MonitorKey::Focus),
        }
    }
}

/// Generations of the remote monitors enabled when a batch was issued
#[derive(Debug, Default, Clone, Copy)]
struct RemoteBatch {
    presence: Option<u64>,
    composition: Option<u64>,
    scene: Option<u64>,
}

impl RemoteBatch {
    fn capture(board: &StatusBoard) -> Self {
        let stamp = |key| board.is_enabled(key).then(|| board.generation(key));
        Self {
            presence: stamp(MonitorKey::Presence),
            composition: stamp(MonitorKey::Composition),
            scene: stamp(MonitorKey::SceneContext),
        }
    }

    fn needs_detect(&self) -> bool {
        self.presence.is_some() || self.composition.is_some()
    }
}

struct Inner {
    config: MonitorConfig,
    frames: Arc<dyn FrameSource>,
    landmarks: Option<Arc<dyn LandmarkDetector>>,
    stats: Arc<dyn PixelStats>,
    vision: Option<Arc<dyn VisionService>>,
    state: Mutex<State>,
    updates: watch::Sender<BoardSnapshot>,
}

/// Builder for [`ShotMonitor`]
pub struct MonitorBuilder {
    config: MonitorConfig,
    frames: Arc<dyn FrameSource>,
    landmarks: Option<Arc<dyn LandmarkDetector>>,
    stats: Arc<dyn PixelStats>,
    vision: Option<Arc<dyn VisionService>>,
}

impl MonitorBuilder {
    pub fn config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn landmark_detector(mut self, detector: Arc<dyn LandmarkDetector>) -> Self {
        self.landmarks = Some(detector);
        self
    }

    pub fn pixel_stats(mut self, stats: Arc<dyn PixelStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn vision_service(mut self, vision: Arc<dyn VisionService>) -> Self {
        self.vision = Some(vision);
        self
    }

    /// Validate the configuration and assemble an idle monitor
    pub fn build(self) -> Result<ShotMonitor, MonitorError> {
        self.config.validate()?;

        let state = State {
            board: StatusBoard::new(),
            smoother: LandmarkSmoother::new(self.config.analyzers.smoothing_window),
            talking: TalkingHysteresis::default(),
            throttle: ThrottleClock::new(self.config.schedule.throttle_window()),
            session: None,
            sessions_started: 0,
            passes_issued: 0,
            newest_pass: 0,
        };
        let (updates, _) = watch::channel(state.snapshot());

        info!(
            "Shot monitor created (landmarks: {}, vision: {})",
            self.landmarks.is_some(),
            self.vision.is_some()
        );
        Ok(ShotMonitor {
            inner: Arc::new(Inner {
                config: self.config,
                frames: self.frames,
                landmarks: self.landmarks,
                stats: self.stats,
                vision: self.vision,
                state: Mutex::new(state),
                updates,
            }),
        })
    }
}

/// Continuous shot-quality monitor
///
/// Cheap to clone; clones share the same board and session.
#[derive(Clone)]
pub struct ShotMonitor {
    inner: Arc<Inner>,
}

impl ShotMonitor {
    /// Start building a monitor over `frames`
    ///
    /// Defaults: [`MonitorConfig::default`], [`LaplacianStats`], no landmark
    /// detector and no vision service.
    pub fn builder(frames: Arc<dyn FrameSource>) -> MonitorBuilder {
        MonitorBuilder {
            config: MonitorConfig::default(),
            frames,
            landmarks: None,
            stats: Arc::new(LaplacianStats::new()),
            vision: None,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// Begin monitoring
    ///
    /// Enabled monitors show `Analyzing...`, one cycle runs before this
    /// returns, then cycles repeat every `cycle_period_ms`. A no-op while
    /// already monitoring.
    pub fn start(&self) -> Result<(), MonitorError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| MonitorError::NoRuntime)?;

        let id = {
            let mut state = self.inner.lock();
            if state.session.is_some() {
                warn!("Start requested while already monitoring; ignoring");
                return Ok(());
            }
            state.sessions_started += 1;
            let id = SessionId(state.sessions_started);
            state.session = Some(Session { id, ticker: None });

            state.board.mark_analyzing();
            if self.inner.landmarks.is_none() {
                mark_unavailable(&mut state.board, &MonitorKey::LANDMARK);
            }
            if self.inner.vision.is_none() {
                mark_unavailable(&mut state.board, &MonitorKey::REMOTE);
            }
            self.inner.publish(&state);
            id
        };
        info!("Monitoring started (session {})", id.0);
        counter!("shot_monitor_sessions_total").increment(1);

        self.inner.run_cycle(id);

        let period = self.inner.config.schedule.cycle_period();
        let ticker = runtime.spawn(run_ticker(
            Arc::downgrade(&self.inner),
            id,
            Instant::now() + period,
            period,
        ));

        let mut state = self.inner.lock();
        match state.session.as_mut() {
            Some(session) if session.id == id => session.ticker = Some(ticker),
            _ => ticker.abort(),
        }
        Ok(())
    }

    /// Stop monitoring and reset every status to `N/A`
    ///
    /// In-flight calls keep running but their results are discarded.
    pub fn stop(&self) {
        let mut state = self.inner.lock();
        let Some(session) = state.session.take() else {
            debug!("Stop requested while idle; ignoring");
            return;
        };
        if let Some(ticker) = session.ticker {
            ticker.abort();
        }

        state.board.reset();
        state.smoother.clear();
        state.talking.reset();
        state.throttle.reset();
        self.inner.publish(&state);
        info!("Monitoring stopped (session {})", session.id.0);
    }

    pub fn is_monitoring(&self) -> bool {
        self.inner.lock().session.is_some()
    }

    /// Flip a monitor; returns the new enabled flag
    pub fn toggle(&self, key: MonitorKey) -> bool {
        let mut state = self.inner.lock();
        let enabled = state.board.toggle(key);
        self.inner.publish(&state);
        info!("Monitor {} {}", key, if enabled { "enabled" } else { "disabled" });
        enabled
    }

    /// Set a monitor's enabled flag, toggling only on change
    pub fn set_enabled(&self, key: MonitorKey, enabled: bool) {
        let mut state = self.inner.lock();
        if state.board.set_enabled(key, enabled) {
            self.inner.publish(&state);
            info!("Monitor {} {}", key, if enabled { "enabled" } else { "disabled" });
        }
    }

    pub fn state(&self, key: MonitorKey) -> MonitorState {
        self.inner.lock().board.get(key).clone()
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        self.inner.lock().snapshot()
    }

    /// Latest scene caption, kept across failed refreshes
    pub fn scene_description(&self) -> Option<String> {
        self.inner.lock().board.scene_description().map(str::to_string)
    }

    /// Receiver that sees every board change
    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.inner.updates.subscribe()
    }

    /// Feed a landmark result from an external pipeline
    ///
    /// Ignored while idle. Focus samples the current frame. Counts as the
    /// newest pass, so detector passes still in flight are dropped.
    pub fn on_landmarks(&self, face: Option<LandmarkFrame>) {
        let (id, pass) = {
            let mut state = self.inner.lock();
            let Some(id) = state.live_session() else {
                debug!("Landmark result while idle; dropping");
                return;
            };
            (id, LandmarkPass::issue(&mut state))
        };
        let frame = self.inner.frames.current_frame();
        self.inner.apply_landmarks(id, pass, face, frame.as_deref());
    }
}

fn mark_unavailable(board: &mut StatusBoard, keys: &[MonitorKey]) {
    for &key in keys {
        if board.is_enabled(key) {
            board.set(key, IDLE_LABEL, StatusClass::Off);
        }
    }
}

async fn run_ticker(inner: Weak<Inner>, id: SessionId, first_tick: Instant, period: Duration) {
    let mut interval = tokio::time::interval_at(first_tick, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        if !inner.run_cycle(id) {
            break;
        }
    }
    debug!("Cycle ticker for session {} exited", id.0);
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: &State) {
        self.updates.send_replace(state.snapshot());
    }

    /// One analysis cycle; false once the session is gone
    fn run_cycle(self: &Arc<Self>, id: SessionId) -> bool {
        let frame = self.frames.current_frame();
        let mut state = self.lock();
        if !state.is_live(id) {
            return false;
        }
        counter!("shot_monitor_cycles_total").increment(1);

        if state.board.any_enabled(&MonitorKey::LANDMARK) {
            if let (Some(detector), Some(frame)) = (&self.landmarks, &frame) {
                let pass = LandmarkPass::issue(&mut state);
                self.spawn_landmark_pass(id, pass, Arc::clone(detector), Arc::clone(frame));
            }
        }

        if state.board.is_enabled(MonitorKey::Lighting) {
            let verdict = analyze_lighting(frame.as_deref(), &self.config.analyzers);
            state.board.apply(MonitorKey::Lighting, &verdict);
        }

        if let Some(vision) = &self.vision {
            if state.throttle.try_acquire(Instant::now()) {
                let batch = RemoteBatch::capture(&state.board);
                match &frame {
                    Some(frame) => self.spawn_remote(id, Arc::clone(vision), Arc::clone(frame), batch),
                    None => {
                        warn!("Remote checks skipped: no frame available");
                        for key in MonitorKey::REMOTE {
                            state.board.apply(key, &Verdict::warning("NO SOURCE"));
                        }
                    }
                }
            }
        }

        self.publish(&state);
        true
    }

    fn spawn_landmark_pass(
        self: &Arc<Self>,
        id: SessionId,
        pass: LandmarkPass,
        detector: Arc<dyn LandmarkDetector>,
        frame: Arc<VideoFrame>,
    ) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            match detector.detect(&frame).await {
                Ok(face) => inner.apply_landmarks(id, pass, face, Some(frame.as_ref())),
                Err(e) => {
                    warn!("Landmark pass failed: {}", e);
                    inner.apply_landmark_failure(id, pass);
                }
            }
        });
    }

    fn spawn_remote(
        self: &Arc<Self>,
        id: SessionId,
        vision: Arc<dyn VisionService>,
        frame: Arc<VideoFrame>,
        batch: RemoteBatch,
    ) {
        let deadline = self.config.schedule.remote_timeout();

        if batch.needs_detect() {
            let inner = Arc::clone(self);
            let vision = Arc::clone(&vision);
            let frame = Arc::clone(&frame);
            let class = self.config.analyzers.presence_class.clone();
            counter!("shot_monitor_remote_calls_total", "call" => "detect").increment(1);
            tokio::spawn(async move {
                let result = with_deadline(deadline, vision.detect(&frame, &class)).await;
                inner.apply_detection(id, batch, result);
            });
        }

        if let Some(generation) = batch.scene {
            let inner = Arc::clone(self);
            counter!("shot_monitor_remote_calls_total", "call" => "caption").increment(1);
            tokio::spawn(async move {
                let result = with_deadline(deadline, vision.caption(&frame)).await;
                inner.apply_caption(id, generation, result);
            });
        }
    }

    /// Orientation, talking and focus from one landmark result
    ///
    /// Passes landing after a later one are dropped whole. A monitor
    /// toggled since the pass was issued keeps its state.
    fn apply_landmarks(
        &self,
        id: SessionId,
        pass: LandmarkPass,
        face: Option<LandmarkFrame>,
        frame: Option<&VideoFrame>,
    ) {
        let mut guard = self.lock();
        if !guard.is_live(id) {
            debug!("Discarding landmark result from ended session {}", id.0);
            return;
        }
        if !guard.accept_pass(&pass) {
            debug!("Discarding landmark pass {} superseded by {}", pass.order, guard.newest_pass);
            return;
        }
        let state = &mut *guard;
        let config = &self.config.analyzers;

        let face_found = face.is_some();
        if let Some(face) = face {
            state.smoother.push(face);
        }
        let smoothed = if face_found { state.smoother.current() } else { None };

        if let Some(generation) = pass.orientation {
            let verdict = analyze_orientation(smoothed, config);
            state.board.apply_if_current(MonitorKey::Orientation, generation, &verdict);
        }
        if let Some(generation) = pass.talking {
            // hysteresis only advances for results that will be shown
            if state.board.generation(MonitorKey::Talking) == generation {
                let now = Instant::now().into_std();
                let verdict = analyze_talking(smoothed, &mut state.talking, now, config);
                state.board.apply(MonitorKey::Talking, &verdict);
            }
        }
        if let Some(generation) = pass.focus {
            let verdict = analyze_focus(frame, smoothed, self.stats.as_ref(), config);
            state.board.apply_if_current(MonitorKey::Focus, generation, &verdict);
        }
        self.publish(state);
    }

    fn apply_landmark_failure(&self, id: SessionId, pass: LandmarkPass) {
        let mut state = self.lock();
        if !state.is_live(id) || !state.accept_pass(&pass) {
            return;
        }
        let stamped = [
            (MonitorKey::Orientation, pass.orientation),
            (MonitorKey::Talking, pass.talking),
            (MonitorKey::Focus, pass.focus),
        ];
        for (key, generation) in stamped {
            if let Some(generation) = generation {
                state.board.apply_if_current(key, generation, &Verdict::error());
            }
        }
        self.publish(&state);
    }

    fn apply_detection(
        &self,
        id: SessionId,
        batch: RemoteBatch,
        result: Result<Vec<BoundingBox>, VisionError>,
    ) {
        if let Err(e) = &result {
            warn!("Face detection failed: {}", e);
            counter!("shot_monitor_remote_failures_total", "call" => "detect").increment(1);
        }

        let mut state = self.lock();
        if !state.is_live(id) {
            debug!("Discarding detection result from ended session {}", id.0);
            return;
        }
        if let Some(generation) = batch.presence {
            let verdict = presence_verdict(&result);
            state.board.apply_if_current(MonitorKey::Presence, generation, &verdict);
        }
        if let Some(generation) = batch.composition {
            let verdict = composition_verdict(&result, &self.config.analyzers.composition);
            state.board.apply_if_current(MonitorKey::Composition, generation, &verdict);
        }
        self.publish(&state);
    }

    fn apply_caption(&self, id: SessionId, generation: u64, result: Result<String, VisionError>) {
        if let Err(e) = &result {
            warn!("Scene caption failed: {}", e);
            counter!("shot_monitor_remote_failures_total", "call" => "caption").increment(1);
        }

        let mut state = self.lock();
        if !state.is_live(id) {
            debug!("Discarding caption from ended session {}", id.0);
            return;
        }
        let verdict = scene_verdict(&result);
        if state.board.apply_if_current(MonitorKey::SceneContext, generation, &verdict) {
            if let Ok(text) = result {
                state.board.set_scene_description(text);
            }
        }
        self.publish(&state);
    }
}

/// Resolve a hung remote call as a timeout
async fn with_deadline<T>(
    deadline: Duration,
    call: impl std::future::Future<Output = Result<T, VisionError>>,
) -> Result<T, VisionError> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(VisionError::Timeout(deadline.as_millis() as u64)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_source::StillImageSource;
    use shot_analysis::LandmarkPoint;

    fn gray_source(level: u8) -> Arc<dyn FrameSource> {
        let frame = VideoFrame::from_rgb(vec![level; 64 * 48 * 3], 64, 48).unwrap();
        Arc::new(StillImageSource::new(frame))
    }

    #[test]
    fn test_start_without_runtime() {
        let monitor = ShotMonitor::builder(gray_source(128)).build().unwrap();
        assert!(matches!(monitor.start(), Err(MonitorError::NoRuntime)));
        assert!(!monitor.is_monitoring());
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let mut config = MonitorConfig::default();
        config.schedule.cycle_period_ms = 0;
        let result = ShotMonitor::builder(gray_source(128)).config(config).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_stop_while_idle_is_noop() {
        let monitor = ShotMonitor::builder(gray_source(128)).build().unwrap();
        monitor.stop();
        assert_eq!(monitor.state(MonitorKey::Lighting).status, "N/A");
    }

    #[tokio::test(start_paused = true)]
    async fn test_lighting_only_monitor() {
        let monitor = ShotMonitor::builder(gray_source(20)).build().unwrap();
        monitor.start().unwrap();

        assert!(monitor.is_monitoring());
        assert_eq!(monitor.state(MonitorKey::Lighting).status, "DARK");
        // no detector or vision service attached
        assert_eq!(monitor.state(MonitorKey::Focus).status_class, StatusClass::Off);
        assert_eq!(monitor.state(MonitorKey::Presence).status_class, StatusClass::Off);

        monitor.stop();
        assert_eq!(monitor.state(MonitorKey::Lighting).status, "N/A");
        assert!(!monitor.snapshot().monitoring);
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_is_noop() {
        let monitor = ShotMonitor::builder(gray_source(128)).build().unwrap();
        monitor.start().unwrap();
        monitor.on_landmarks(None);
        monitor.start().unwrap();
        // a real restart would have reset orientation to N/A
        assert_eq!(monitor.state(MonitorKey::Orientation).status, "NO FACE");
        assert_eq!(monitor.state(MonitorKey::Lighting).status, "GOOD");
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_landmarks_ignored_while_idle() {
        let monitor = ShotMonitor::builder(gray_source(128)).build().unwrap();
        monitor.on_landmarks(None);
        assert_eq!(monitor.state(MonitorKey::Orientation).status, "N/A");
    }

    #[tokio::test(start_paused = true)]
    async fn test_on_landmarks_no_face() {
        let monitor = ShotMonitor::builder(gray_source(128)).build().unwrap();
        monitor.start().unwrap();
        monitor.on_landmarks(None);
        assert_eq!(monitor.state(MonitorKey::Orientation).status, "NO FACE");
        assert_eq!(monitor.state(MonitorKey::Talking).status, "NO FACE");
        assert_eq!(monitor.state(MonitorKey::Focus).status, "NO DATA");
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_landmark_pass_is_dropped() {
        let monitor = ShotMonitor::builder(gray_source(128)).build().unwrap();
        monitor.start().unwrap();
        let inner = &monitor.inner;
        let (id, older, newer) = {
            let mut state = inner.lock();
            let id = state.live_session().unwrap();
            (id, LandmarkPass::issue(&mut state), LandmarkPass::issue(&mut state))
        };

        inner.apply_landmarks(id, newer, None, None);
        let face = LandmarkFrame::uniform(LandmarkPoint::new(0.5, 0.5));
        inner.apply_landmarks(id, older, Some(face), None);

        assert_eq!(monitor.state(MonitorKey::Orientation).status, "NO FACE");
        assert!(inner.lock().smoother.is_empty());
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_pass_respects_toggle() {
        let monitor = ShotMonitor::builder(gray_source(128)).build().unwrap();
        monitor.start().unwrap();
        let inner = &monitor.inner;
        let (id, pass) = {
            let mut state = inner.lock();
            (state.live_session().unwrap(), LandmarkPass::issue(&mut state))
        };
        monitor.toggle(MonitorKey::Focus);
        monitor.toggle(MonitorKey::Focus);

        inner.apply_landmark_failure(id, pass);
        assert_eq!(monitor.state(MonitorKey::Orientation).status, "ERROR");
        assert_eq!(monitor.state(MonitorKey::Focus).status, "OFF");
        monitor.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_enabled_only_acts_on_change() {
        let monitor = ShotMonitor::builder(gray_source(128)).build().unwrap();
        let mut updates = monitor.subscribe();

        monitor.set_enabled(MonitorKey::Talking, true);
        assert!(!updates.has_changed().unwrap());

        monitor.set_enabled(MonitorKey::Talking, false);
        assert!(updates.has_changed().unwrap());
        assert!(!updates.borrow_and_update().get(MonitorKey::Talking).unwrap().enabled);
        assert_eq!(monitor.state(MonitorKey::Talking).status, "OFF");
    }
}
