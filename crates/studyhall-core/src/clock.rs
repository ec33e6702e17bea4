//! Elapsed-time clock for the active session
//!
//! Runs at most one ticker task. Pausing retains the accumulated value,
//! stopping resets it to zero.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::trace;

/// Elapsed time split into display counters
///
/// Seconds and minutes carry at 60; hours grow without bound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClockValue {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl ClockValue {
    /// Advance by one second
    pub fn tick(&mut self) {
        self.seconds += 1;
        if self.seconds == 60 {
            self.seconds = 0;
            self.minutes += 1;
        }
        if self.minutes == 60 {
            self.minutes = 0;
            self.hours += 1;
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    pub fn total_seconds(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }
}

impl fmt::Display for ClockValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// Session clock backed by a tokio interval task
///
/// `start` spawns the ticker, so the clock must be used inside a tokio
/// runtime.
pub struct Clock {
    value: Arc<RwLock<ClockValue>>,
    ticker: Mutex<Option<TickerHandle>>,
    period: Duration,
}

impl Clock {
    pub fn new(period: Duration) -> Self {
        Self {
            value: Arc::new(RwLock::new(ClockValue::default())),
            ticker: Mutex::new(None),
            period,
        }
    }

    /// Start ticking
    ///
    /// No-op while a ticker is already running: the handle slot is
    /// checked and filled under one lock, so a double start can never
    /// double the tick rate.
    pub fn start(&self) {
        let mut ticker = self.ticker.lock();
        if ticker.is_some() {
            return;
        }
        *ticker = Some(TickerHandle::spawn(Arc::clone(&self.value), self.period));
        trace!("Clock ticker started");
    }

    /// Stop ticking, retaining the accumulated value
    pub fn pause(&self) {
        if let Some(handle) = self.ticker.lock().take() {
            handle.cancel();
            trace!("Clock ticker paused");
        }
    }

    /// Stop ticking and reset to zero
    pub fn stop(&self) {
        self.pause();
        *self.value.write() = ClockValue::default();
    }

    /// Snapshot of the current value
    pub fn value(&self) -> ClockValue {
        *self.value.read()
    }

    /// Whether a ticker task is live
    pub fn is_ticking(&self) -> bool {
        self.ticker.lock().is_some()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

/// Handle to a running ticker task
///
/// Dropping it closes the shutdown channel, which also ends the task.
struct TickerHandle {
    shutdown_tx: mpsc::Sender<()>,
}

impl TickerHandle {
    fn spawn(value: Arc<RwLock<ClockValue>>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        // Anchor the first increment one full period after the start
        // call, not after the task's first poll
        let first_tick = tokio::time::Instant::now() + period;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(first_tick, period);

            loop {
                tokio::select! {
                    // Shutdown wins over a simultaneously-due tick, so a
                    // cancelled ticker cannot land one more increment
                    biased;

                    _ = shutdown_rx.recv() => {
                        trace!("Clock ticker shutting down");
                        break;
                    }
                    _ = interval.tick() => {
                        value.write().tick();
                    }
                }
            }
        });

        Self { shutdown_tx }
    }

    fn cancel(self) {
        let _ = self.shutdown_tx.try_send(());
    }
}
