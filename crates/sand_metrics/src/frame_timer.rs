//! Tick timing: work duration and achieved rate

use super::ring_buffer::RingBuffer;
use std::time::{Duration, Instant};

/// Rolling window over recent ticks (or frames).
///
/// `begin`/`end` bracket the work; the gap between successive `begin` calls
/// gives the achieved rate, sleep included.
#[derive(Debug)]
pub struct FrameTimer {
    started: Option<Instant>,
    work: RingBuffer<Duration>,
    intervals: RingBuffer<Duration>,
}

impl FrameTimer {
    pub fn new(capacity: usize) -> Self {
        Self {
            started: None,
            work: RingBuffer::new(capacity),
            intervals: RingBuffer::new(capacity),
        }
    }

    pub fn begin(&mut self) {
        let now = Instant::now();
        if let Some(previous) = self.started {
            self.intervals.push(now - previous);
        }
        self.started = Some(now);
    }

    /// Records and returns the work time since the last `begin`.
    pub fn end(&mut self) -> Duration {
        let elapsed = self.started.map(|s| s.elapsed()).unwrap_or_default();
        self.work.push(elapsed);
        elapsed
    }

    /// Achieved begin-to-begin rate.
    pub fn rate_hz(&self) -> f64 {
        let avg = self.intervals.average();
        if avg.is_zero() {
            0.0
        } else {
            1.0 / avg.as_secs_f64()
        }
    }

    pub fn work_ms(&self) -> f64 {
        self.work.average().as_secs_f64() * 1000.0
    }

    pub fn work_range_ms(&self) -> (f64, f64) {
        let (min, max) = self.work.min_max();
        (min.as_secs_f64() * 1000.0, max.as_secs_f64() * 1000.0)
    }

    pub fn samples(&self) -> usize {
        self.work.len()
    }
}
