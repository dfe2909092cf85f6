//! Shot Monitor Runner
//!
//! Wires a still image, an optional landmark fixture and the hosted
//! vision service into a [`ShotMonitor`] and prints the board.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use frame_source::StillImageSource;
use shot_analysis::{FixedLandmarkDetector, LandmarkFrame};
use shot_monitor::{BoardSnapshot, MonitorConfig, MonitorKey, ShotMonitor};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use vision_service::{HttpVisionClient, VisionClientConfig};

/// Command line options
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Continuous shot-quality monitor")]
pub struct Args {
    /// Image analyzed on every cycle
    #[arg(long)]
    pub image: PathBuf,

    /// Config file (TOML, JSON or YAML); SHOT_MONITOR__* env vars override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Landmark fixture (JSON `{"points": [{"x": .., "y": ..}, ..]}`)
    #[arg(long)]
    pub landmarks: Option<PathBuf>,

    /// Vision service API key; remote monitors stay off without one
    #[arg(long, env = "VISION_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Vision service base URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Stop after this many seconds (default: run until Ctrl-C)
    #[arg(long)]
    pub duration_secs: Option<u64>,

    /// Monitors to switch off before starting (repeatable)
    #[arg(long = "disable", value_parser = parse_monitor_key)]
    pub disabled: Vec<MonitorKey>,

    /// Emit JSON log lines
    #[arg(long, default_value_t = false)]
    pub log_json: bool,
}

fn parse_monitor_key(name: &str) -> Result<MonitorKey, String> {
    MonitorKey::parse(name).ok_or_else(|| {
        let known: Vec<&str> = MonitorKey::ALL.iter().map(MonitorKey::as_str).collect();
        format!("unknown monitor '{}' (expected one of: {})", name, known.join(", "))
    })
}

/// Initialize logging; `RUST_LOG` overrides the default `info` level
pub fn init_logging(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.as_str()));
    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true);

    let result = if json {
        tracing::subscriber::set_global_default(builder.json().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.context("Failed to set tracing subscriber")
}

/// Assemble a monitor from the command line
pub fn build_monitor(args: &Args) -> anyhow::Result<ShotMonitor> {
    let config = MonitorConfig::load(args.config.as_deref()).context("Failed to load config")?;
    let source = StillImageSource::open(&args.image)
        .with_context(|| format!("Failed to open {}", args.image.display()))?;

    let mut builder = ShotMonitor::builder(Arc::new(source)).config(config.clone());

    if let Some(path) = &args.landmarks {
        let face = load_landmarks(path)?;
        info!("Using {} fixed landmarks from {}", face.len(), path.display());
        builder = builder.landmark_detector(Arc::new(FixedLandmarkDetector::new(Some(face))));
    }

    match &args.api_key {
        Some(key) if !key.is_empty() => {
            let mut client_config = VisionClientConfig::with_api_key(key.clone());
            if let Some(endpoint) = &args.endpoint {
                client_config.endpoint = endpoint.trim_end_matches('/').to_string();
            }
            client_config.timeout_ms = config.schedule.remote_timeout_ms;
            let client = HttpVisionClient::new(client_config)?;
            builder = builder.vision_service(Arc::new(client));
        }
        _ => warn!("No vision API key; presence, composition and scene context are off"),
    }

    let monitor = builder.build()?;
    for &key in &args.disabled {
        monitor.set_enabled(key, false);
    }
    Ok(monitor)
}

fn load_landmarks(path: &std::path::Path) -> anyhow::Result<LandmarkFrame> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid landmark fixture {}", path.display()))
}

/// One line per monitor, then the scene description if any
pub fn render(snapshot: &BoardSnapshot) -> String {
    let mut lines: Vec<String> = snapshot
        .monitors
        .iter()
        .map(|m| format!("{:<13} {:<22} {}", m.key.as_str(), m.status, m.status_class))
        .collect();
    if let Some(scene) = &snapshot.scene_description {
        lines.push(format!("scene: {}", scene));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use frame_source::VideoFrame;
    use shot_analysis::LandmarkPoint;
    use shot_monitor::StatusBoard;
    use std::time::Duration;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("shot-monitor-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "shot-monitor",
            "--image",
            "shot.png",
            "--disable",
            "talking",
            "--disable",
            "sceneContext",
            "--duration-secs",
            "30",
        ])
        .unwrap();
        assert_eq!(args.image, PathBuf::from("shot.png"));
        assert_eq!(args.disabled, vec![MonitorKey::Talking, MonitorKey::SceneContext]);
        assert_eq!(args.duration_secs, Some(30));
        assert!(!args.log_json);
    }

    #[test]
    fn test_rejects_unknown_monitor() {
        let result = Args::try_parse_from(["shot-monitor", "--image", "a.png", "--disable", "zoom"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_render_board() {
        let mut board = StatusBoard::new();
        board.set_scene_description("a person at a desk".to_string());
        let text = render(&board.snapshot(false));
        assert_eq!(text.lines().count(), 8);
        assert!(text.lines().next().unwrap().starts_with("orientation"));
        assert!(text.ends_with("scene: a person at a desk"));
    }

    #[test]
    fn test_missing_image_fails() {
        let args = Args::try_parse_from(["shot-monitor", "--image", "/nonexistent/shot.png"]).unwrap();
        assert!(build_monitor(&args).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitors_still_image_with_fixture() {
        let image = scratch_path("shot.jpg");
        let frame = VideoFrame::from_rgb(vec![128; 32 * 24 * 3], 32, 24).unwrap();
        std::fs::write(&image, frame.encode_jpeg(90).unwrap()).unwrap();
        let fixture = scratch_path("face.json");
        let face = LandmarkFrame::uniform(LandmarkPoint::new(0.5, 0.5));
        std::fs::write(&fixture, serde_json::to_string(&face).unwrap()).unwrap();

        let args = Args::try_parse_from([
            "shot-monitor",
            "--image",
            image.to_str().unwrap(),
            "--landmarks",
            fixture.to_str().unwrap(),
            "--api-key",
            "",
            "--disable",
            "talking",
        ])
        .unwrap();
        let monitor = build_monitor(&args).unwrap();
        monitor.start().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let snapshot = monitor.snapshot();
        assert!(snapshot.monitoring);
        assert_eq!(snapshot.get(MonitorKey::Lighting).unwrap().status, "GOOD");
        assert_eq!(snapshot.get(MonitorKey::Orientation).unwrap().status, "STRAIGHT");
        assert_eq!(snapshot.get(MonitorKey::Talking).unwrap().status, "OFF");
        // no API key, so remote monitors stay idle
        assert_eq!(snapshot.get(MonitorKey::Presence).unwrap().status, "N/A");
        assert!(render(&snapshot).contains("STRAIGHT"));

        monitor.stop();
        assert!(!monitor.is_monitoring());
        let _ = std::fs::remove_file(image);
        let _ = std::fs::remove_file(fixture);
    }
}
