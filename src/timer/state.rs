use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATION_MINUTES: u32 = 25;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Expired,
}

/// Result of applying one tick to the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Decremented(u32),
    Expired,
    /// The timer was not running; nothing changed.
    Ignored,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    pub status: TimerStatus,
    pub remaining_seconds: u32,
    pub duration_minutes: u32,
}

impl Default for TimerState {
    fn default() -> Self {
        Self::new(DEFAULT_DURATION_MINUTES)
    }
}

impl TimerState {
    pub fn new(duration_minutes: u32) -> Self {
        Self {
            status: TimerStatus::Idle,
            remaining_seconds: duration_minutes.saturating_mul(60),
            duration_minutes,
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub fn duration_seconds(&self) -> u32 {
        self.duration_minutes.saturating_mul(60)
    }

    /// Idle/Expired -> Running. Returns `false` if already running.
    pub fn begin(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.status = TimerStatus::Running;
        true
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.is_running() {
            return TickOutcome::Ignored;
        }
        if self.remaining_seconds <= 1 {
            self.remaining_seconds = 0;
            self.status = TimerStatus::Expired;
            TickOutcome::Expired
        } else {
            self.remaining_seconds -= 1;
            TickOutcome::Decremented(self.remaining_seconds)
        }
    }

    /// Running -> Idle, keeping the remaining time. Returns `false` otherwise.
    pub fn pause(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.status = TimerStatus::Idle;
        true
    }

    pub fn reset(&mut self) {
        self.status = TimerStatus::Idle;
        self.remaining_seconds = self.duration_seconds();
    }

    /// A running countdown keeps its remaining time until the next reset.
    pub fn set_duration(&mut self, minutes: u32) {
        self.duration_minutes = minutes;
        if !self.is_running() {
            self.remaining_seconds = self.duration_seconds();
        }
    }

    pub fn display(&self) -> String {
        format_clock(self.remaining_seconds)
    }
}

/// `M:SS`, minutes unpadded.
pub fn format_clock(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
