//! Per-room turn-clock schedule for Tempo.
//!
//! A [`TurnClock`] owns at most one live tick stream. Each `restart` first
//! cancels the previous schedule in its entirety and then begins a fresh
//! one, so a reset at any point inside a tick period buys the full period
//! before the next tick — ticks never carry fractional progress across a
//! reset.
//!
//! # Integration
//!
//! The clock does not decrement anything itself. It invokes a callback once
//! per period, and the room actor that owns the clock uses the callback to
//! post a tick command onto its own queue:
//!
//! ```ignore
//! let tx = self.commands.clone();
//! self.clock.restart(move |epoch| {
//!     let _ = tx.send(RoomCommand::Tick { epoch });
//! });
//! ```
//!
//! # Epochs
//!
//! Because ticks travel through a queue, a tick produced by an old schedule
//! can still be in flight when the schedule is replaced. Every schedule is
//! tagged with a monotonically increasing epoch, delivered with each tick;
//! consumers compare it against [`TurnClock::epoch`] and drop stale ticks.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Clock state
// ---------------------------------------------------------------------------

/// The schedule's lifecycle, as a tagged state so a double-start is
/// impossible to express: installing a new schedule consumes the old one.
enum ClockState {
    /// No tick stream exists.
    Stopped,
    /// Exactly one tick stream is live.
    Running(JoinHandle<()>),
}

// ---------------------------------------------------------------------------
// TurnClock
// ---------------------------------------------------------------------------

/// An owned, cancellable recurring schedule. One per room.
///
/// Dropping the clock aborts any live schedule.
pub struct TurnClock {
    period: Duration,
    epoch: u64,
    state: ClockState,
}

impl TurnClock {
    /// Creates a stopped clock with the given tick period.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            epoch: 0,
            state: ClockState::Stopped,
        }
    }

    /// Cancels any existing schedule and starts a fresh one from t = 0.
    ///
    /// The first tick fires one full `period` from now. `on_tick` receives
    /// the new schedule's epoch on every invocation; the same value is
    /// returned here and reported by [`epoch`](Self::epoch) until the next
    /// restart. Cancellation happens before the replacement is installed —
    /// at no point do two schedules coexist.
    pub fn restart<F>(&mut self, mut on_tick: F) -> u64
    where
        F: FnMut(u64) + Send + 'static,
    {
        self.cancel();
        self.epoch += 1;
        let epoch = self.epoch;
        let period = self.period;

        let handle = tokio::spawn(async move {
            let start = time::Instant::now();
            let mut ticks = time::interval_at(start + period, period);
            // A delayed tick must not be followed by a burst of
            // catch-up ticks; skipped seconds stay skipped.
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                trace!(epoch, "clock tick");
                on_tick(epoch);
            }
        });

        debug!(epoch, period_ms = period.as_millis() as u64, "clock started");
        self.state = ClockState::Running(handle);
        epoch
    }

    /// Stops the clock. Idempotent; a stopped clock stays stopped.
    pub fn stop(&mut self) {
        if self.cancel() {
            debug!(epoch = self.epoch, "clock stopped");
        }
    }

    /// Whether a schedule is currently live.
    pub fn is_running(&self) -> bool {
        matches!(self.state, ClockState::Running(_))
    }

    /// The epoch of the most recently started schedule.
    ///
    /// Ticks carrying any other value are stale and must be ignored.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The configured tick period.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Aborts the live schedule, if any. Returns whether one was live.
    fn cancel(&mut self) -> bool {
        match std::mem::replace(&mut self.state, ClockState::Stopped) {
            ClockState::Running(handle) => {
                handle.abort();
                true
            }
            ClockState::Stopped => false,
        }
    }
}

impl Drop for TurnClock {
    fn drop(&mut self) {
        self.cancel();
    }
}
