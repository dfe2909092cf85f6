//! Analyzer verdicts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse severity bucket driving the visual treatment of a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    Good,
    Warning,
    Bad,
    /// Monitor toggled off, idle, or with nothing to measure
    Disabled,
    /// Signal not available in this deployment
    Off,
}

impl StatusClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusClass::Good => "good",
            StatusClass::Warning => "warning",
            StatusClass::Bad => "bad",
            StatusClass::Disabled => "disabled",
            StatusClass::Off => "off",
        }
    }
}

impl fmt::Display for StatusClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status label plus its class, as produced by one analyzer run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub label: String,
    pub class: StatusClass,
}

impl Verdict {
    pub fn new(label: impl Into<String>, class: StatusClass) -> Self {
        Self {
            label: label.into(),
            class,
        }
    }

    pub fn good(label: impl Into<String>) -> Self {
        Self::new(label, StatusClass::Good)
    }

    pub fn warning(label: impl Into<String>) -> Self {
        Self::new(label, StatusClass::Warning)
    }

    pub fn bad(label: impl Into<String>) -> Self {
        Self::new(label, StatusClass::Bad)
    }

    pub fn disabled(label: impl Into<String>) -> Self {
        Self::new(label, StatusClass::Disabled)
    }

    /// Generic failure verdict
    pub fn error() -> Self {
        Self::warning("ERROR")
    }

    /// Upstream found no face at all
    pub fn no_face() -> Self {
        Self::bad("NO FACE")
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.class)
    }
}
