//! Shared simulation configuration
//!
//! Lives inside the same lock as the grid and command buffer, so the input
//! thread and the cadence thread never race on brush or speed changes.

use crate::cell::{Cell, ParticleType, Rgb};
use crate::time::{DEFAULT_TICK_PERIOD_MS, MAX_TICK_PERIOD_MS, MIN_TICK_PERIOD_MS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_BRUSH_RADIUS: u32 = 1;
pub const MAX_BRUSH_RADIUS: u32 = 100;

/// Paint brush parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Brush {
    /// Disc radius in grid cells; 1 paints a single cell.
    pub radius: u32,
    pub color: Rgb,
    pub particle: ParticleType,
}

impl Brush {
    /// Packed cell this brush paints.
    pub fn cell(&self) -> Cell {
        Cell::new(self.particle, self.color)
    }

    pub fn set_radius(&mut self, radius: u32) {
        self.radius = radius.clamp(MIN_BRUSH_RADIUS, MAX_BRUSH_RADIUS);
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            radius: 10,
            color: Rgb::new(230, 0, 230),
            particle: ParticleType::Sand,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub tick_period_ms: u32,
    pub brush: Brush,
}

impl SimulationConfig {
    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(u64::from(
            self.tick_period_ms
                .clamp(MIN_TICK_PERIOD_MS, MAX_TICK_PERIOD_MS),
        ))
    }

    pub fn set_tick_period_ms(&mut self, ms: u32) {
        self.tick_period_ms = ms.clamp(MIN_TICK_PERIOD_MS, MAX_TICK_PERIOD_MS);
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            brush: Brush::default(),
        }
    }
}
