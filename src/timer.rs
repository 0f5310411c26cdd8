use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Persisted timer state. Times are epoch milliseconds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimerState {
    pub start_time: Option<i64>,
    pub elapsed_time: i64,
    pub is_running: bool,
    pub last_updated: i64,
}

/// Stopwatch for the duration of the case. It keeps running while the page is
/// closed because a running timer is anchored to its start time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaseTimer {
    state: TimerState,
}

impl CaseTimer {
    pub fn from_state(state: TimerState) -> Self {
        CaseTimer { state }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running && self.state.start_time.is_some()
    }

    /// Starts or resumes the timer. Returns `false` if it was already running.
    pub fn start(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_running() {
            return false;
        }
        let now = now.timestamp_millis();
        self.state.start_time = Some(now - self.state.elapsed_time);
        self.state.is_running = true;
        self.state.last_updated = now;
        true
    }

    /// Stops the timer, keeping the elapsed time. Returns `false` if it wasn't running.
    pub fn stop(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_running() {
            return false;
        }
        self.state.elapsed_time = self.elapsed(now).num_milliseconds();
        self.state.is_running = false;
        self.state.last_updated = now.timestamp_millis();
        true
    }

    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        let millis = match (self.is_running(), self.state.start_time) {
            (true, Some(start)) => now.timestamp_millis() - start,
            _ => self.state.elapsed_time,
        };
        Duration::milliseconds(millis.max(0))
    }

    /// Elapsed time as `HH:MM:SS`.
    pub fn display(&self, now: DateTime<Utc>) -> String {
        let seconds = self.elapsed(now).num_seconds();
        format!(
            "{:02}:{:02}:{:02}",
            seconds / 3600,
            (seconds % 3600) / 60,
            seconds % 60
        )
    }
}
