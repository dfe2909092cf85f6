//! Shot-Quality Monitor
//!
//! Runs a fixed-period analysis cycle over the current frame and fuses
//! the results into a live status board:
//! - Landmark pass feeding orientation, talking and focus
//! - Lighting computed synchronously every cycle
//! - Throttled remote batch for presence, composition and scene context
//!
//! Every board change is published on a `tokio::sync::watch` channel.

pub mod board;
pub mod config;
pub mod monitor;
pub mod throttle;

pub use board::{BoardSnapshot, MonitorKey, MonitorState, StatusBoard};
pub use config::{MonitorConfig, ScheduleConfig};
pub use monitor::{MonitorBuilder, ShotMonitor};
pub use throttle::ThrottleClock;

use thiserror::Error;

/// Monitor error types
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Monitoring requires a running Tokio runtime")]
    NoRuntime,
}
