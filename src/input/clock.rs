//! Monotonic clock seam and lap timer
//!
//! The sampler never reads wall-clock time. It asks a [`Clock`] for a
//! monotonic reading and measures whole milliseconds between laps.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A monotonic time source with an arbitrary epoch
pub trait Clock {
    /// Current reading, measured from the clock's own epoch
    fn now(&self) -> Duration;
}

/// System monotonic clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Manually advanced clock
///
/// Clones share the same reading, so a test (or an input replay) can keep a
/// handle and advance the time seen by a sampler that owns another clone.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward by `ms` milliseconds
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Stopwatch with read-and-restart ("lap") semantics
#[derive(Debug, Clone)]
pub struct LapTimer<C: Clock> {
    clock: C,
    started_at: Option<Duration>,
}

impl<C: Clock> LapTimer<C> {
    /// Create a timer that has not been started yet
    pub fn new(clock: C) -> Self {
        Self {
            clock,
            started_at: None,
        }
    }

    /// (Re)start measuring from now
    pub fn start(&mut self) {
        self.started_at = Some(self.clock.now());
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Whole milliseconds since the last start, 0 if never started
    pub fn elapsed_ms(&self) -> u64 {
        match self.started_at {
            Some(start) => millis(self.clock.now().saturating_sub(start)),
            None => 0,
        }
    }

    /// Return the elapsed milliseconds and restart the timer
    ///
    /// A timer that was never started reports 0 and starts now.
    pub fn lap_ms(&mut self) -> u64 {
        let now = self.clock.now();
        let elapsed = self
            .started_at
            .map(|start| millis(now.saturating_sub(start)))
            .unwrap_or(0);
        self.started_at = Some(now);
        elapsed
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        handle.advance_ms(40);
        assert_eq!(clock.now(), Duration::from_millis(40));
    }

    #[test]
    fn test_lap_timer_not_started() {
        let timer = LapTimer::new(ManualClock::new());
        assert!(!timer.is_started());
        assert_eq!(timer.elapsed_ms(), 0);
    }

    #[test]
    fn test_lap_on_unstarted_timer_starts_it() {
        let clock = ManualClock::new();
        let mut timer = LapTimer::new(clock.clone());
        clock.advance_ms(25);

        assert_eq!(timer.lap_ms(), 0);
        assert!(timer.is_started());

        clock.advance_ms(10);
        assert_eq!(timer.elapsed_ms(), 10);
    }

    #[test]
    fn test_lap_restarts() {
        let clock = ManualClock::new();
        let mut timer = LapTimer::new(clock.clone());
        timer.start();

        clock.advance_ms(30);
        assert_eq!(timer.lap_ms(), 30);
        assert_eq!(timer.lap_ms(), 0);

        clock.advance_ms(7);
        assert_eq!(timer.lap_ms(), 7);
    }

    #[test]
    fn test_lap_truncates_to_whole_milliseconds() {
        let clock = ManualClock::new();
        let mut timer = LapTimer::new(clock.clone());
        timer.start();

        clock.advance(Duration::from_micros(2_900));
        assert_eq!(timer.lap_ms(), 2);
    }

    #[test]
    fn test_monotonic_clock_does_not_go_backwards() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
