//! Last known result, shared between frame delivery and recognition completions

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultState {
    pub display_text: String,
    pub last_update: Option<Instant>,
    pub last_processed: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    /// Run the full analysis; the processed timestamp has been advanced
    Run,
    /// Reuse the current display text
    Skip,
}

/// `ResultState` behind a lock, plus the minimum interval between analyses.
/// Every read and write goes through the lock, so readers never see a
/// half-written display string.
#[derive(Debug)]
pub struct SharedResultState {
    inner: Mutex<ResultState>,
    interval: Duration,
}

impl SharedResultState {
    pub fn new(interval: Duration) -> Self {
        Self {
            inner: Mutex::new(ResultState::default()),
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Decide whether the frame at `now` gets analysed. On `Run` the processed
    /// timestamp moves to `now` before returning, so frames arriving during a
    /// slow analysis are throttled.
    pub fn gate(&self, now: Instant) -> ThrottleDecision {
        let mut state = self.inner.lock();
        if let Some(last) = state.last_processed {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.interval {
                return ThrottleDecision::Skip;
            }
        }
        state.last_processed = Some(now);
        ThrottleDecision::Run
    }

    pub fn publish(&self, text: String, now: Instant) {
        let mut state = self.inner.lock();
        debug!("Display text updated: {:?}", text);
        state.display_text = text;
        state.last_update = Some(now);
    }

    pub fn display_text(&self) -> String {
        self.inner.lock().display_text.clone()
    }

    pub fn snapshot(&self) -> ResultState {
        self.inner.lock().clone()
    }
}
