//! Per-stage timing of the tick pipeline

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTiming {
    pub total: Duration,
    pub calls: u64,
}

impl StageTiming {
    pub fn average(&self) -> Duration {
        match u32::try_from(self.calls) {
            Ok(0) => Duration::ZERO,
            Ok(calls) => self.total / calls,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.calls as f64),
        }
    }
}

#[derive(Debug, Default)]
pub struct SystemProfiler {
    stages: BTreeMap<&'static str, StageTiming>,
}

impl SystemProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, adding its wall time to `name`.
    pub fn time_system<F, R>(&mut self, name: &'static str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        let stage = self.stages.entry(name).or_default();
        stage.total += start.elapsed();
        stage.calls += 1;
        result
    }

    pub fn timing(&self, name: &str) -> StageTiming {
        self.stages.get(name).copied().unwrap_or_default()
    }

    pub fn reset(&mut self) {
        self.stages.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, StageTiming)> + '_ {
        self.stages.iter().map(|(name, timing)| (*name, *timing))
    }
}
