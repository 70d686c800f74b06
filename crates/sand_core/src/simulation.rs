//! Simulation state shared between the cadence thread and presentation
//!
//! Grid, command queue and configuration live together behind one mutex so a
//! tick, a paint append and a presentation read can never interleave.

use crate::cell::Cell;
use crate::command::{CommandBuffer, CommandBufferError, SpawnCommand};
use crate::config::SimulationConfig;
use crate::grid::{GridError, GridState};
use crate::paint::{DragSegment, PaintEncoder, PaintReport, SurfaceTransform};
use crate::scheduler::{TickError, TickReport, UpdateScheduler};
use crate::surface::{ComputeSurface, CpuSurface};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub struct Simulation {
    grid: GridState,
    commands: CommandBuffer,
    config: SimulationConfig,
    scheduler: UpdateScheduler,
    encoder: PaintEncoder,
}

impl Simulation {
    pub fn new(
        width: u32,
        height: u32,
        config: SimulationConfig,
        surface: Box<dyn ComputeSurface>,
    ) -> Result<Self, GridError> {
        let grid = GridState::new(width, height)?;
        let scheduler = UpdateScheduler::new(surface);
        tracing::info!(
            width,
            height,
            surface = scheduler.surface_name(),
            "simulation created"
        );
        Ok(Self {
            grid,
            commands: CommandBuffer::new(),
            config,
            scheduler,
            encoder: PaintEncoder::new(width, height),
        })
    }

    /// Simulation on the default rayon pool.
    pub fn with_cpu_surface(
        width: u32,
        height: u32,
        config: SimulationConfig,
    ) -> Result<Self, GridError> {
        Self::new(width, height, config, Box::new(CpuSurface::new()))
    }

    /// Advance one tick. `time` is the tick timestamp in milliseconds.
    pub fn tick(&mut self, time: u32) -> Result<TickReport, TickError> {
        self.scheduler.tick(
            &mut self.grid,
            &mut self.commands,
            self.config.brush.radius,
            time,
        )
    }

    /// Queue spawn commands for a drag segment with the current brush.
    ///
    /// Particle and color are fixed now; the disc radius is read from the
    /// brush when the next tick drains the queue.
    pub fn paint(&mut self, segment: DragSegment, transform: &SurfaceTransform) -> PaintReport {
        self.encoder
            .encode(segment, transform, &self.config.brush, &mut self.commands)
    }

    /// Queue one spawn command at `(x, y)`, bypassing the encoder.
    ///
    /// Like painted samples, it is stamped as a disc of the brush radius
    /// current when the next tick drains the queue.
    pub fn spawn(&mut self, x: u32, y: u32, particle: Cell) -> Result<(), CommandBufferError> {
        self.commands.append(SpawnCommand::new(x, y, particle))
    }

    /// Latest completed generation, for display.
    pub fn read_generation(&self) -> &[Cell] {
        self.grid.read_generation()
    }

    pub fn grid(&self) -> &GridState {
        &self.grid
    }

    /// Direct grid access for scene setup.
    pub fn grid_mut(&mut self) -> &mut GridState {
        &mut self.grid
    }

    pub fn commands(&self) -> &CommandBuffer {
        &self.commands
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    pub fn scheduler(&self) -> &UpdateScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut UpdateScheduler {
        &mut self.scheduler
    }
}

/// Cloneable handle to the one lock guarding a [`Simulation`].
#[derive(Clone)]
pub struct SharedSimulation(Arc<Mutex<Simulation>>);

impl SharedSimulation {
    pub fn new(simulation: Simulation) -> Self {
        Self(Arc::new(Mutex::new(simulation)))
    }

    /// Lock the simulation.
    ///
    /// A poisoned lock is recovered: a tick either completes or is abandoned
    /// before the swap, so the state behind it is always consistent.
    pub fn lock(&self) -> MutexGuard<'_, Simulation> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
