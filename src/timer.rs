//! Clocks and confirmation timers
//!
//! Every wait in the crate goes through a [`Clock`], so polling loops can be
//! driven by [`ManualClock`] in tests without real sleeps.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Source of time and the only way the crate suspends
pub trait Clock {
    /// Current instant
    fn now(&self) -> Instant;
    /// Block for `duration`
    fn sleep(&self, duration: Duration);
}

/// Wall clock backed by `std::thread::sleep`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Deterministic clock that only moves when slept on or advanced
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move time forward without going through `sleep`
    pub fn advance(&self, duration: Duration) {
        if let Ok(mut offset) = self.offset.lock() {
            *offset += duration;
        }
    }

    /// Total time elapsed since creation
    pub fn elapsed(&self) -> Duration {
        self.offset.lock().map(|o| *o).unwrap_or_default()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Time limit that also requires a minimum number of polls before it counts
/// as reached.
///
/// The poll count keeps slow screenshots from expiring a timer after a single
/// look: `Timer::new(clock, 10s).with_count(20)` is only reached once ten
/// seconds have passed *and* it has been asked more than twenty times.
/// A timer that was never started is reached immediately.
pub struct Timer {
    clock: Arc<dyn Clock>,
    limit: Duration,
    count: u32,
    started_at: Option<Instant>,
    reach_count: u32,
}

impl Timer {
    /// Create an unstarted timer
    pub fn new(clock: Arc<dyn Clock>, limit: Duration) -> Self {
        Self {
            clock,
            limit,
            count: 0,
            started_at: None,
            reach_count: 0,
        }
    }

    /// Require more than `count` polls before the timer is reached
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self.reach_count = count;
        self
    }

    /// Start the timer if it is not running yet
    pub fn start(mut self) -> Self {
        if self.started_at.is_none() {
            self.started_at = Some(self.clock.now());
            self.reach_count = 0;
        }
        self
    }

    /// Whether the timer has been started
    pub fn started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time since start, zero if not started
    pub fn current(&self) -> Duration {
        match self.started_at {
            Some(start) => self.clock.now().saturating_duration_since(start),
            None => Duration::ZERO,
        }
    }

    /// Poll the timer
    pub fn reached(&mut self) -> bool {
        self.reach_count = self.reach_count.saturating_add(1);
        let elapsed_enough = match self.started_at {
            Some(start) => self.clock.now().saturating_duration_since(start) > self.limit,
            None => true,
        };
        elapsed_enough && self.reach_count > self.count
    }

    /// Restart from now
    pub fn reset(&mut self) {
        self.started_at = Some(self.clock.now());
        self.reach_count = 0;
    }

    /// Make the next poll reach immediately
    pub fn clear(&mut self) {
        self.started_at = None;
        self.reach_count = self.count;
    }

    /// Poll and restart in one step
    pub fn reached_and_reset(&mut self) -> bool {
        if self.reached() {
            self.reset();
            true
        } else {
            false
        }
    }

    /// Sleep until the limit is reached
    pub fn wait(&self) {
        if let Some(start) = self.started_at {
            let deadline = start + self.limit;
            let now = self.clock.now();
            if deadline > now {
                self.clock.sleep(deadline - now);
            }
        }
    }

    /// Configured limit
    pub fn limit(&self) -> Duration {
        self.limit
    }
}

impl fmt::Debug for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Timer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Timer(limit={:.3}/{:.3}, count={}/{})",
            self.current().as_secs_f64(),
            self.limit.as_secs_f64(),
            self.reach_count,
            self.count
        )
    }
}
