//! Monitor configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use shot_analysis::AnalyzerConfig;
use tracing::debug;

use crate::MonitorError;

/// Prefix for environment overrides, e.g.
/// `SHOT_MONITOR__SCHEDULE__CYCLE_PERIOD_MS=1000`
pub const ENV_PREFIX: &str = "SHOT_MONITOR";

/// Cycle and remote-call timing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Analysis cycle period (milliseconds)
    pub cycle_period_ms: u64,

    /// Minimum spacing between remote batches (milliseconds)
    pub throttle_window_ms: u64,

    /// Deadline for a single remote call (milliseconds)
    pub remote_timeout_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cycle_period_ms: 1500,
            throttle_window_ms: 2000,
            remote_timeout_ms: 10_000,
        }
    }
}

impl ScheduleConfig {
    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.cycle_period_ms)
    }

    pub fn throttle_window(&self) -> Duration {
        Duration::from_millis(self.throttle_window_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}

/// Full monitor configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub schedule: ScheduleConfig,
    pub analyzers: AnalyzerConfig,
}

impl MonitorConfig {
    /// Tighter analyzer bands, default timing
    pub fn strict() -> Self {
        Self {
            analyzers: AnalyzerConfig::strict(),
            ..Default::default()
        }
    }

    /// Looser analyzer bands, default timing
    pub fn lenient() -> Self {
        Self {
            analyzers: AnalyzerConfig::lenient(),
            ..Default::default()
        }
    }

    /// Load from an optional file (TOML, JSON or YAML by extension)
    /// layered under `SHOT_MONITOR__*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, MonitorError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            debug!("Loading monitor config from {}", path.display());
            builder = builder.add_source(::config::File::from(path).required(true));
        }
        builder = builder.add_source(
            ::config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let loaded: MonitorConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings the scheduler or analyzers cannot run with
    pub fn validate(&self) -> Result<(), MonitorError> {
        let invalid = |msg: &str| -> Result<(), MonitorError> {
            Err(MonitorError::InvalidConfig(msg.to_string()))
        };
        let a = &self.analyzers;

        if self.schedule.cycle_period_ms == 0 {
            return invalid("schedule.cycle_period_ms must be positive");
        }
        if self.schedule.remote_timeout_ms == 0 {
            return invalid("schedule.remote_timeout_ms must be positive");
        }
        if a.smoothing_window == 0 {
            return invalid("analyzers.smoothing_window must be at least 1");
        }
        if a.focus_patch_size < pixel_stats::MIN_REGION_SIDE {
            return invalid("analyzers.focus_patch_size is below the Laplacian minimum");
        }
        if a.focus_blurry_threshold > a.focus_sharp_threshold {
            return invalid("analyzers.focus_blurry_threshold exceeds focus_sharp_threshold");
        }
        let bands = [
            a.lighting_dark_below,
            a.lighting_dim_below,
            a.lighting_bright_above,
            a.lighting_overexposed_above,
        ];
        if bands.windows(2).any(|w| w[0] > w[1]) {
            return invalid("analyzers lighting bands must be ascending");
        }
        if a.presence_class.trim().is_empty() {
            return invalid("analyzers.presence_class must not be empty");
        }
        Ok(())
    }
}
