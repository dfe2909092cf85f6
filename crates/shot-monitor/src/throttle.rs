//! Rate limiter for remote vision calls

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// At most one remote batch per window
///
/// The timestamp is taken when the call is issued, not when it
/// completes, so a slow response does not delay the next batch.
#[derive(Debug, Clone)]
pub struct ThrottleClock {
    window: Duration,
    last_call: Option<Instant>,
}

impl ThrottleClock {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_call: None,
        }
    }

    pub fn last_call(&self) -> Option<Instant> {
        self.last_call
    }

    /// True if strictly more than `window` has passed since the last call
    pub fn is_open(&self, now: Instant) -> bool {
        match self.last_call {
            Some(last) => now.saturating_duration_since(last) > self.window,
            None => true,
        }
    }

    /// Claim the slot if open, stamping `now`
    pub fn try_acquire(&mut self, now: Instant) -> bool {
        if !self.is_open(now) {
            debug!("Remote call suppressed: inside throttle window");
            return false;
        }
        self.last_call = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_call = None;
    }
}
