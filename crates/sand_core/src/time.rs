//! Simulation cadence
//!
//! Variable tick period with drift correction: the loop sleeps only for what is
//! left of the period after the previous tick.

use std::time::{Duration, Instant};

/// Default tick period (matches a 60 Hz display).
pub const DEFAULT_TICK_PERIOD_MS: u32 = 16;
pub const MIN_TICK_PERIOD_MS: u32 = 1;
pub const MAX_TICK_PERIOD_MS: u32 = 1000;

/// Delay before the next tick: `max(0, period - elapsed)`.
///
/// An overrun yields zero so the next tick starts immediately instead of
/// queueing up lag.
pub fn next_delay(period: Duration, elapsed: Duration) -> Duration {
    period.saturating_sub(elapsed)
}

/// Simulation time tracker
pub struct SimulationTime {
    start: Instant,
    tick_count: u64,
    last_tick: Option<Instant>,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            tick_count: 0,
            last_tick: None,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Mark the start of a tick.
    pub fn advance_tick(&mut self) {
        self.tick_count += 1;
        self.last_tick = Some(Instant::now());
    }

    /// Time since the previous tick started, `None` before the first tick.
    pub fn since_last_tick(&self) -> Option<Duration> {
        self.last_tick.map(|t| t.elapsed())
    }

    /// How long to wait before the next tick for the given period.
    pub fn delay_for(&self, period: Duration) -> Duration {
        match self.since_last_tick() {
            Some(elapsed) => next_delay(period, elapsed),
            None => Duration::ZERO,
        }
    }

    /// Milliseconds since start, wrapped to 32 bits. Seeds the tie-break.
    pub fn timestamp_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }

    pub fn total_time(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Default for SimulationTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_is_remaining_period() {
        let d = next_delay(Duration::from_millis(16), Duration::from_millis(6));
        assert_eq!(d, Duration::from_millis(10));
    }

    #[test]
    fn overrun_starts_immediately() {
        let d = next_delay(Duration::from_millis(16), Duration::from_millis(40));
        assert_eq!(d, Duration::ZERO);
    }

    #[test]
    fn first_tick_has_no_delay() {
        let time = SimulationTime::new();
        assert_eq!(time.delay_for(Duration::from_millis(500)), Duration::ZERO);
    }

    #[test]
    fn advance_counts_ticks() {
        let mut time = SimulationTime::new();
        time.advance_tick();
        time.advance_tick();
        assert_eq!(time.tick_count(), 2);
        assert!(time.since_last_tick().is_some());
    }
}
