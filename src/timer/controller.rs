use std::{sync::Arc, time::Duration};

use serde::Serialize;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

use super::{TickOutcome, TimerState, TimerStatus};

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub status: TimerStatus,
    pub remaining_seconds: u32,
    pub duration_minutes: u32,
    pub display: String,
}

impl From<&TimerState> for TimerSnapshot {
    fn from(state: &TimerState) -> Self {
        Self {
            status: state.status,
            remaining_seconds: state.remaining_seconds,
            duration_minutes: state.duration_minutes,
            display: state.display(),
        }
    }
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

impl Ticker {
    fn shutdown(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

/// The ticker lives under the same lock as the countdown so that cancelling
/// it and rewriting `remaining_seconds` happen as one step.
struct TimerInner {
    state: TimerState,
    ticker: Option<Ticker>,
}

#[derive(Clone)]
pub struct TimerController {
    inner: Arc<Mutex<TimerInner>>,
    events: Arc<watch::Sender<TimerSnapshot>>,
    tick_interval: Duration,
}

impl TimerController {
    pub fn new(duration_minutes: u32) -> Self {
        let state = TimerState::new(duration_minutes);
        let (events, _) = watch::channel(TimerSnapshot::from(&state));

        Self {
            inner: Arc::new(Mutex::new(TimerInner {
                state,
                ticker: None,
            })),
            events: Arc::new(events),
            tick_interval: Duration::from_secs(1),
        }
    }

    pub async fn get_snapshot(&self) -> TimerSnapshot {
        TimerSnapshot::from(&self.inner.lock().await.state)
    }

    pub async fn is_running(&self) -> bool {
        self.inner.lock().await.state.is_running()
    }

    /// Every state change, including each tick, is published here.
    pub fn subscribe(&self) -> watch::Receiver<TimerSnapshot> {
        self.events.subscribe()
    }

    /// Returns `false` if the timer was already running.
    pub async fn start(&self) -> bool {
        let mut guard = self.inner.lock().await;
        if !guard.state.begin() {
            return false;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_ticker(
            Arc::clone(&self.inner),
            Arc::clone(&self.events),
            cancel.clone(),
            self.tick_interval,
        ));
        guard.ticker = Some(Ticker { handle, cancel });

        log_info!("timer started at {}", guard.state.display());
        publish(&self.events, &guard.state);
        true
    }

    /// Returns `false` if the timer was not running.
    pub async fn pause(&self) -> bool {
        let mut guard = self.inner.lock().await;
        if !guard.state.pause() {
            return false;
        }
        if let Some(ticker) = guard.ticker.take() {
            ticker.shutdown();
        }

        log_info!("timer paused at {}", guard.state.display());
        publish(&self.events, &guard.state);
        true
    }

    pub async fn reset(&self) -> TimerSnapshot {
        let mut guard = self.inner.lock().await;
        if let Some(ticker) = guard.ticker.take() {
            ticker.shutdown();
        }
        guard.state.reset();

        log_info!("timer reset to {}", guard.state.display());
        publish(&self.events, &guard.state);
        TimerSnapshot::from(&guard.state)
    }

    pub async fn set_duration(&self, minutes: u32) -> TimerSnapshot {
        let mut guard = self.inner.lock().await;
        guard.state.set_duration(minutes);
        publish(&self.events, &guard.state);
        TimerSnapshot::from(&guard.state)
    }
}

fn publish(events: &watch::Sender<TimerSnapshot>, state: &TimerState) {
    events.send_replace(TimerSnapshot::from(state));
}

async fn run_ticker(
    inner: Arc<Mutex<TimerInner>>,
    events: Arc<watch::Sender<TimerSnapshot>>,
    cancel: CancellationToken,
    period: Duration,
) {
    // First tick lands one full period after start
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = cancel.cancelled() => break,
        }

        let mut guard = inner.lock().await;
        // pause/reset cancel while holding the lock, so a tick that raced them stops here
        if cancel.is_cancelled() {
            break;
        }

        match guard.state.tick() {
            TickOutcome::Decremented(remaining) => {
                log_debug!("timer tick: {remaining}s left");
                publish(&events, &guard.state);
            }
            TickOutcome::Expired => {
                // Dropping our own handle detaches this task; it ends right after
                guard.ticker = None;
                log_info!("timer expired");
                publish(&events, &guard.state);
                break;
            }
            TickOutcome::Ignored => break,
        }
    }
}
