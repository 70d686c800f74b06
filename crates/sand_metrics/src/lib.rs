//! Sand Metrics - tick timing and counters for the simulation loop
//!
//! Everything here is feature-gated: without `metrics` the types below are
//! empty stubs with the same API and the macros expand to the bare body.
//!
//! # Usage
//!
//! ```ignore
//! use sand_metrics::{Counter, FrameTimer};
//!
//! let mut timer = FrameTimer::new(120);
//! let mut counter = Counter::new();
//! timer.begin();
//! // ... tick ...
//! timer.end();
//! counter.increment("ticks", 1);
//! println!("{:.1} ticks/s", timer.rate_hz());
//! ```
//!
//! The `cfg` checks inside the macros are evaluated in the calling crate, so
//! callers expose a `metrics` feature of their own that forwards to this one.

#[cfg(feature = "metrics")]
mod counter;
#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod ring_buffer;
#[cfg(feature = "metrics")]
mod system_profiler;

#[cfg(feature = "metrics")]
pub use counter::Counter;
#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;
#[cfg(feature = "metrics")]
pub use system_profiler::{StageTiming, SystemProfiler};

/// Whether this build collects anything.
pub const ENABLED: bool = cfg!(feature = "metrics");

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

/// Time a block under `name` and yield its value.
///
/// Usable in expression position, including with `?` on the result.
#[macro_export]
macro_rules! time_scope {
    ($profiler:expr, $name:expr, $body:block) => {{
        #[cfg(feature = "metrics")]
        let value = $profiler.time_system($name, || $body);
        #[cfg(not(feature = "metrics"))]
        let value = $body;
        value
    }};
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
mod stubs {
    use std::time::Duration;

    #[derive(Debug, Default)]
    pub struct FrameTimer;

    impl FrameTimer {
        pub fn new(_capacity: usize) -> Self { Self }
        pub fn begin(&mut self) {}
        pub fn end(&mut self) -> Duration { Duration::ZERO }
        pub fn rate_hz(&self) -> f64 { 0.0 }
        pub fn work_ms(&self) -> f64 { 0.0 }
        pub fn work_range_ms(&self) -> (f64, f64) { (0.0, 0.0) }
        pub fn samples(&self) -> usize { 0 }
    }

    #[derive(Debug)]
    pub struct RingBuffer<T>(std::marker::PhantomData<T>);

    impl<T> RingBuffer<T> {
        pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
        pub fn push(&mut self, _value: T) {}
        pub fn len(&self) -> usize { 0 }
        pub fn is_empty(&self) -> bool { true }
    }

    #[derive(Debug, Default)]
    pub struct Counter;

    impl Counter {
        pub fn new() -> Self { Self }
        pub fn increment(&mut self, _name: &'static str, _value: u64) {}
        pub fn get(&self, _name: &str) -> u64 { 0 }
        pub fn reset_all(&mut self) {}
        pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> { std::iter::empty() }
    }

    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct StageTiming {
        pub total: Duration,
        pub calls: u64,
    }

    impl StageTiming {
        pub fn average(&self) -> Duration { Duration::ZERO }
    }

    #[derive(Debug, Default)]
    pub struct SystemProfiler;

    impl SystemProfiler {
        pub fn new() -> Self { Self }
        pub fn time_system<F, R>(&mut self, _name: &'static str, f: F) -> R where F: FnOnce() -> R { f() }
        pub fn timing(&self, _name: &str) -> StageTiming { StageTiming::default() }
        pub fn reset(&mut self) {}
        pub fn iter(&self) -> impl Iterator<Item = (&'static str, StageTiming)> { std::iter::empty() }
    }
}

#[cfg(not(feature = "metrics"))]
pub use stubs::{Counter, FrameTimer, RingBuffer, StageTiming, SystemProfiler};
