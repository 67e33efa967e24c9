//! Countdown timers for Quizroom.
//!
//! A [`Countdown`] emits `n, n-1, ..., 1` one period apart and then
//! completes one period after the last value. Both the start countdown
//! (`GAME_STARTING`) and every round (`ROUND_IN_PROGRESS`) are driven by
//! one of these.
//!
//! # Integration
//!
//! The countdown is designed to sit inside a room actor's `tokio::select!`
//! loop next to the command channel, so ticks and commands are handled by
//! the same task:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         Some(cmd) = cmd_rx.recv() => { /* handle commands */ }
//!         step = countdown.next() => match step {
//!             Some(remaining) => { /* broadcast remaining */ }
//!             None => { /* countdown over */ }
//!         }
//!     }
//! }
//! ```
//!
//! Once it has completed, [`Countdown::next`] pends forever, so a finished
//! countdown left in a `select!` never fires again.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{trace, warn};

/// The default cadence: one tick per second.
pub const DEFAULT_PERIOD: Duration = Duration::from_secs(1);

/// A down-counter that yields once per period.
#[derive(Debug)]
pub struct Countdown {
    period: Duration,
    remaining: u32,
    next_tick: Instant,
    ticks: u64,
    finished: bool,
}

impl Countdown {
    /// Starts a countdown from `from` with the given period. The first
    /// value is due one period from now.
    pub fn new(from: u32, period: Duration) -> Self {
        Self {
            period,
            remaining: from,
            next_tick: Instant::now() + period,
            ticks: 0,
            finished: false,
        }
    }

    /// Starts a countdown from `from` ticking once a second.
    pub fn seconds(from: u32) -> Self {
        Self::new(from, DEFAULT_PERIOD)
    }

    /// Waits for the next step.
    ///
    /// Returns `Some(remaining)` for each value of the countdown and
    /// `None` exactly once when it completes. After that the future
    /// never resolves.
    ///
    /// Cancel-safe: dropping the future before it resolves leaves the
    /// schedule untouched.
    pub async fn next(&mut self) -> Option<u32> {
        if self.finished {
            std::future::pending::<()>().await;
        }

        let due = self.next_tick;
        time::sleep_until(due).await;

        let now = Instant::now();
        let late_by = now.saturating_duration_since(due);
        // More than half a period late: resync from now instead of firing
        // a burst of catch-up ticks.
        self.next_tick = if late_by > self.period / 2 {
            warn!(
                late_ms = late_by.as_secs_f64() * 1000.0,
                remaining = self.remaining,
                "countdown overrun, rescheduling from now"
            );
            now + self.period
        } else {
            due + self.period
        };
        self.ticks += 1;

        if self.remaining == 0 {
            self.finished = true;
            trace!(ticks = self.ticks, "countdown finished");
            return None;
        }

        let current = self.remaining;
        self.remaining -= 1;
        trace!(remaining = current, "countdown tick");
        Some(current)
    }

    /// Values not yet emitted.
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Whether the countdown has completed.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Steps taken so far, including the completing one.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The configured period.
    pub fn period(&self) -> Duration {
        self.period
    }
}
