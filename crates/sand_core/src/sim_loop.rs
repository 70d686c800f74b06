//! Simulation cadence thread
//!
//! Ticks the shared simulation at the configured period. The period is re-read
//! every iteration, sleeping happens outside the lock, and the shutdown flag is
//! only honoured between ticks so an in-flight tick always completes.

use crate::simulation::SharedSimulation;
use crate::time::SimulationTime;
use sand_metrics::{Counter, FrameTimer};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

pub const THREAD_NAME: &str = "sand-sim";

/// Ticks kept in the rolling timing window.
const TIMING_WINDOW: usize = 120;

#[cfg(feature = "metrics")]
const REPORT_INTERVAL: Duration = Duration::from_secs(2);

/// What the loop did over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub ticks: u64,
    pub abandoned: u64,
}

/// Handle to the running cadence thread. Dropping it stops the thread.
pub struct SimulationLoop {
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<LoopStats>>,
}

impl SimulationLoop {
    pub fn spawn(shared: SharedSimulation) -> io::Result<Self> {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handle = thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run(shared, &flag))?;
        tracing::debug!("simulation loop started");
        Ok(Self {
            shutdown,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stop after the current tick and wait for the thread.
    pub fn shutdown(mut self) -> LoopStats {
        self.stop()
    }

    fn stop(&mut self) -> LoopStats {
        let Some(handle) = self.handle.take() else {
            return LoopStats::default();
        };
        self.shutdown.store(true, Ordering::Release);
        handle.thread().unpark();
        match handle.join() {
            Ok(stats) => stats,
            Err(_) => {
                tracing::error!("simulation thread panicked");
                LoopStats::default()
            }
        }
    }
}

impl Drop for SimulationLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(shared: SharedSimulation, shutdown: &AtomicBool) -> LoopStats {
    let mut time = SimulationTime::new();
    let mut timer = FrameTimer::new(TIMING_WINDOW);
    let mut counter = Counter::new();
    let mut stats = LoopStats::default();
    #[cfg(feature = "metrics")]
    let mut last_report = Instant::now();

    while !shutdown.load(Ordering::Acquire) {
        let period = shared.lock().config().tick_period();
        let delay = time.delay_for(period);
        if !delay.is_zero() {
            sleep_interruptible(delay, shutdown);
            if shutdown.load(Ordering::Acquire) {
                break;
            }
        }

        time.advance_tick();
        timer.begin();
        let result = shared.lock().tick(time.timestamp_ms());
        timer.end();

        match result {
            Ok(_) => {
                stats.ticks += 1;
                counter.increment("ticks", 1);
            }
            Err(e) => {
                // The scheduler already warned; the next iteration retries.
                stats.abandoned += 1;
                counter.increment("abandoned_ticks", 1);
                tracing::debug!(error = %e, tick = time.tick_count(), "continuing after abandoned tick");
            }
        }

        sand_metrics::metrics! {
            if last_report.elapsed() >= REPORT_INTERVAL {
                report(&shared, &timer, &counter);
                last_report = Instant::now();
            }
        }
    }

    tracing::debug!(
        ticks = stats.ticks,
        abandoned = stats.abandoned,
        uptime_s = time.total_time().as_secs_f64(),
        "simulation loop stopped"
    );
    stats
}

/// Park until `delay` has passed or shutdown is requested.
///
/// `park_timeout` may return early, so the deadline is re-checked.
fn sleep_interruptible(delay: Duration, shutdown: &AtomicBool) {
    let deadline = Instant::now() + delay;
    loop {
        if shutdown.load(Ordering::Acquire) {
            return;
        }
        let now = Instant::now();
        if now >= deadline {
            return;
        }
        thread::park_timeout(deadline - now);
    }
}

#[cfg(feature = "metrics")]
fn report(shared: &SharedSimulation, timer: &FrameTimer, counter: &Counter) {
    let (min_ms, max_ms) = timer.work_range_ms();
    tracing::debug!(
        rate_hz = timer.rate_hz(),
        work_ms = timer.work_ms(),
        min_ms,
        max_ms,
        ticks = counter.get("ticks"),
        abandoned = counter.get("abandoned_ticks"),
        "tick rate"
    );
    let mut sim = shared.lock();
    let profiler = sim.scheduler_mut().profiler_mut();
    for (stage, timing) in profiler.iter() {
        tracing::debug!(stage, avg_us = timing.average().as_micros() as u64, calls = timing.calls, "tick stage");
    }
    profiler.reset();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, ParticleType, Rgb};
    use crate::config::SimulationConfig;
    use crate::simulation::Simulation;
    use crate::surface::{ComputeSurface, Dispatch, DispatchError};

    fn shared(period_ms: u32) -> SharedSimulation {
        let mut config = SimulationConfig::default();
        config.set_tick_period_ms(period_ms);
        config.brush.set_radius(1);
        SharedSimulation::new(Simulation::with_cpu_surface(8, 8, config).unwrap())
    }

    fn wait_for(mut done: impl FnMut() -> bool) -> bool {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(2));
        }
        false
    }

    #[test]
    fn loop_ticks_until_shutdown() {
        let sim = shared(1);
        sim.lock()
            .grid_mut()
            .set(3, 0, Cell::new(ParticleType::Sand, Rgb::new(1, 2, 3)));

        let handle = SimulationLoop::spawn(sim.clone()).unwrap();
        assert!(handle.is_running());
        assert!(wait_for(|| sim.lock().grid().cell(3, 7).is_some_and(|c| !c.is_empty())));

        let stats = handle.shutdown();
        assert!(stats.ticks >= 7);
        assert_eq!(stats.abandoned, 0);
    }

    #[test]
    fn shutdown_interrupts_long_sleep() {
        let sim = shared(1000);
        let handle = SimulationLoop::spawn(sim).unwrap();
        thread::sleep(Duration::from_millis(20));

        let start = Instant::now();
        let stats = handle.shutdown();
        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(stats.ticks <= 1);
    }

    #[test]
    fn period_change_is_picked_up() {
        let sim = shared(1000);
        let handle = SimulationLoop::spawn(sim.clone()).unwrap();
        thread::sleep(Duration::from_millis(20));
        sim.lock().config_mut().set_tick_period_ms(1);
        // The pending 1s sleep still has to run out before the new period applies.
        sim.lock()
            .spawn(0, 0, Cell::new(ParticleType::Stone, Rgb::new(0, 0, 0)))
            .unwrap();
        assert!(wait_for(|| sim.lock().grid().occupied() == 1));
        drop(handle);
    }

    struct BrokenSurface;

    impl ComputeSurface for BrokenSurface {
        fn dispatch(&mut self, dispatch: Dispatch<'_>) -> Result<(), DispatchError> {
            Err(DispatchError::ResourceExhausted {
                kernel: dispatch.kernel,
            })
        }

        fn name(&self) -> &str {
            "broken"
        }
    }

    #[test]
    fn abandoned_ticks_do_not_stop_the_loop() {
        let mut config = SimulationConfig::default();
        config.set_tick_period_ms(1);
        let sim = SharedSimulation::new(
            Simulation::new(4, 4, config, Box::new(BrokenSurface)).unwrap(),
        );
        let handle = SimulationLoop::spawn(sim.clone()).unwrap();
        thread::sleep(Duration::from_millis(30));
        assert!(handle.is_running());

        let stats = handle.shutdown();
        assert_eq!(stats.ticks, 0);
        assert!(stats.abandoned > 1);
        assert_eq!(sim.lock().grid().read_index(), 0);
    }

    #[test]
    fn dropping_handle_stops_thread() {
        let sim = shared(1);
        let handle = SimulationLoop::spawn(sim.clone()).unwrap();
        drop(handle);
        let index = sim.lock().grid().read_index();
        thread::sleep(Duration::from_millis(20));
        assert_eq!(sim.lock().grid().read_index(), index);
    }
}
