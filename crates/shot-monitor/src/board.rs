//! Status board: one live state per monitor

use serde::{Deserialize, Serialize};
use shot_analysis::{StatusClass, Verdict};
use std::collections::BTreeMap;
use std::fmt;

/// Label shown before a monitor has produced anything
pub const IDLE_LABEL: &str = "N/A";

/// Label shown between start and the first result
pub const ANALYZING_LABEL: &str = "Analyzing...";

/// Label shown for a monitor the user switched off
pub const OFF_LABEL: &str = "OFF";

/// The fixed set of monitored signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MonitorKey {
    Orientation,
    Talking,
    Focus,
    Lighting,
    Presence,
    Composition,
    SceneContext,
}

impl MonitorKey {
    pub const ALL: [MonitorKey; 7] = [
        MonitorKey::Orientation,
        MonitorKey::Talking,
        MonitorKey::Focus,
        MonitorKey::Lighting,
        MonitorKey::Presence,
        MonitorKey::Composition,
        MonitorKey::SceneContext,
    ];

    /// Monitors fed by the landmark pass
    pub const LANDMARK: [MonitorKey; 3] =
        [MonitorKey::Orientation, MonitorKey::Talking, MonitorKey::Focus];

    /// Monitors fed by the remote vision service
    pub const REMOTE: [MonitorKey; 3] = [
        MonitorKey::Presence,
        MonitorKey::Composition,
        MonitorKey::SceneContext,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorKey::Orientation => "orientation",
            MonitorKey::Talking => "talking",
            MonitorKey::Focus => "focus",
            MonitorKey::Lighting => "lighting",
            MonitorKey::Presence => "presence",
            MonitorKey::Composition => "composition",
            MonitorKey::SceneContext => "sceneContext",
        }
    }

    /// Parse the camelCase name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for MonitorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Live state of one monitor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorState {
    pub key: MonitorKey,
    pub enabled: bool,
    pub status: String,
    pub status_class: StatusClass,
}

impl MonitorState {
    fn idle(key: MonitorKey) -> Self {
        Self {
            key,
            enabled: true,
            status: IDLE_LABEL.to_string(),
            status_class: StatusClass::Disabled,
        }
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.key, self.status, self.status_class)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    state: MonitorState,
    /// Bumped on every toggle; stale async results carry an older value
    generation: u64,
}

/// Point-in-time copy of the whole board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub monitoring: bool,
    pub monitors: Vec<MonitorState>,
    pub scene_description: Option<String>,
}

impl BoardSnapshot {
    pub fn get(&self, key: MonitorKey) -> Option<&MonitorState> {
        self.monitors.iter().find(|m| m.key == key)
    }
}

/// Single source of truth for monitor states
#[derive(Debug, Clone)]
pub struct StatusBoard {
    entries: BTreeMap<MonitorKey, Entry>,
    scene_description: Option<String>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    /// All monitors enabled, showing `N/A`
    pub fn new() -> Self {
        let entries = MonitorKey::ALL
            .into_iter()
            .map(|key| {
                (
                    key,
                    Entry {
                        state: MonitorState::idle(key),
                        generation: 0,
                    },
                )
            })
            .collect();
        Self {
            entries,
            scene_description: None,
        }
    }

    fn entry(&self, key: MonitorKey) -> &Entry {
        // every key is inserted in new() and never removed
        &self.entries[&key]
    }

    fn entry_mut(&mut self, key: MonitorKey) -> &mut Entry {
        self.entries
            .entry(key)
            .or_insert_with(|| Entry {
                state: MonitorState::idle(key),
                generation: 0,
            })
    }

    pub fn get(&self, key: MonitorKey) -> &MonitorState {
        &self.entry(key).state
    }

    pub fn is_enabled(&self, key: MonitorKey) -> bool {
        self.get(key).enabled
    }

    pub fn any_enabled(&self, keys: &[MonitorKey]) -> bool {
        keys.iter().any(|&k| self.is_enabled(k))
    }

    pub fn generation(&self, key: MonitorKey) -> u64 {
        self.entry(key).generation
    }

    /// Overwrite a status unconditionally
    pub fn set(&mut self, key: MonitorKey, status: impl Into<String>, class: StatusClass) {
        let state = &mut self.entry_mut(key).state;
        state.status = status.into();
        state.status_class = class;
    }

    /// Write a verdict if the monitor is enabled
    pub fn apply(&mut self, key: MonitorKey, verdict: &Verdict) -> bool {
        if !self.is_enabled(key) {
            return false;
        }
        self.set(key, verdict.label.clone(), verdict.class);
        true
    }

    /// Write a verdict computed for `generation`; dropped if the monitor
    /// was toggled (or disabled) since
    pub fn apply_if_current(&mut self, key: MonitorKey, generation: u64, verdict: &Verdict) -> bool {
        if self.generation(key) != generation {
            return false;
        }
        self.apply(key, verdict)
    }

    /// Flip `enabled`; disabling forces `OFF` immediately, enabling
    /// waits for the next cycle. Returns the new flag.
    pub fn toggle(&mut self, key: MonitorKey) -> bool {
        let entry = self.entry_mut(key);
        entry.generation += 1;
        entry.state.enabled = !entry.state.enabled;
        if !entry.state.enabled {
            entry.state.status = OFF_LABEL.to_string();
            entry.state.status_class = StatusClass::Disabled;
        }
        entry.state.enabled
    }

    /// Toggle only if the flag differs; true if it did
    pub fn set_enabled(&mut self, key: MonitorKey, enabled: bool) -> bool {
        if self.is_enabled(key) == enabled {
            return false;
        }
        self.toggle(key);
        true
    }

    /// Enabled monitors show the analyzing placeholder
    pub fn mark_analyzing(&mut self) {
        for entry in self.entries.values_mut().filter(|e| e.state.enabled) {
            entry.state.status = ANALYZING_LABEL.to_string();
            entry.state.status_class = StatusClass::Warning;
        }
    }

    /// Every status back to `N/A`; enabled flags are kept
    pub fn reset(&mut self) {
        for entry in self.entries.values_mut() {
            entry.state.status = IDLE_LABEL.to_string();
            entry.state.status_class = StatusClass::Disabled;
        }
    }

    pub fn scene_description(&self) -> Option<&str> {
        self.scene_description.as_deref()
    }

    pub fn set_scene_description(&mut self, text: String) {
        self.scene_description = Some(text);
    }

    pub fn snapshot(&self, monitoring: bool) -> BoardSnapshot {
        BoardSnapshot {
            monitoring,
            monitors: self.entries.values().map(|e| e.state.clone()).collect(),
            scene_description: self.scene_description.clone(),
        }
    }
}
