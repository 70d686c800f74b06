//! Update scheduler
//!
//! One tick:
//! 1. clear the write generation,
//! 2. run phases 0..8 in order (read generation in, write generation out),
//! 3. stamp the drained spawn batch into the write generation,
//! 4. swap generations.
//!
//! Any failed dispatch abandons the tick before the swap, so the read
//! generation stays the last good state and the next tick simply retries.
//! The spawn batch is left queued in that case.

use crate::command::CommandBuffer;
use crate::grid::GridState;
use crate::phase::Phase;
use crate::surface::{
    Bindings, ComputeSurface, Dispatch, DispatchError, DispatchParams, Kernel, WorkGroups,
};
use sand_metrics::SystemProfiler;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TickError {
    #[error("tick abandoned during {kernel:?} dispatch")]
    Abandoned {
        kernel: Kernel,
        #[source]
        source: DispatchError,
    },
}

/// Result of a completed tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Spawn commands stamped this tick.
    pub spawned: usize,
}

pub struct UpdateScheduler {
    surface: Box<dyn ComputeSurface>,
    profiler: SystemProfiler,
}

impl UpdateScheduler {
    pub fn new(surface: Box<dyn ComputeSurface>) -> Self {
        Self {
            surface,
            profiler: SystemProfiler::new(),
        }
    }

    pub fn surface_name(&self) -> &str {
        self.surface.name()
    }

    pub fn profiler_mut(&mut self) -> &mut SystemProfiler {
        &mut self.profiler
    }

    /// Advance `grid` by one tick.
    ///
    /// `time` is the tick timestamp in milliseconds and seeds lateral
    /// tie-breaks; `brush_radius` sizes the stamps of drained commands.
    pub fn tick(
        &mut self,
        grid: &mut GridState,
        commands: &mut CommandBuffer,
        brush_radius: u32,
        time: u32,
    ) -> Result<TickReport, TickError> {
        let (width, height) = (grid.width(), grid.height());
        let base = DispatchParams {
            phase: Phase::FIRST,
            time,
            brush_radius,
        };
        let surface = &mut self.surface;

        sand_metrics::time_scope!(self.profiler, "clear", {
            surface
                .dispatch(Dispatch {
                    kernel: Kernel::Clear,
                    groups: WorkGroups::for_kernel(Kernel::Clear, width, height, 0),
                    width,
                    height,
                    bindings: Bindings {
                        read: None,
                        write: grid.write_generation_mut(),
                        commands: &[],
                    },
                    params: base,
                })
                .map_err(|e| abandon(Kernel::Clear, e))
        })?;

        sand_metrics::time_scope!(self.profiler, "phases", {
            Phase::all().try_for_each(|phase| {
                let (read, write) = grid.split();
                surface
                    .dispatch(Dispatch {
                        kernel: Kernel::Update,
                        groups: WorkGroups::for_kernel(Kernel::Update, width, height, 0),
                        width,
                        height,
                        bindings: Bindings {
                            read: Some(read),
                            write,
                            commands: &[],
                        },
                        params: DispatchParams { phase, ..base },
                    })
                    .map_err(|e| abandon(Kernel::Update, e))
            })
        })?;

        let batch = commands.drain();
        let spawned = batch.len();
        if spawned > 0 {
            let uploaded = sand_metrics::time_scope!(self.profiler, "upload", {
                surface.dispatch(Dispatch {
                    kernel: Kernel::Upload,
                    groups: WorkGroups::for_kernel(Kernel::Upload, width, height, spawned),
                    width,
                    height,
                    bindings: Bindings {
                        read: None,
                        write: grid.write_generation_mut(),
                        commands: batch.commands(),
                    },
                    params: base,
                })
            });
            if let Err(e) = uploaded {
                batch.defer();
                return Err(abandon(Kernel::Upload, e));
            }
        }
        drop(batch);

        grid.swap();
        Ok(TickReport { spawned })
    }
}

fn abandon(kernel: Kernel, source: DispatchError) -> TickError {
    tracing::warn!(?kernel, error = %source, "tick abandoned; keeping last generation");
    TickError::Abandoned { kernel, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Cell, ParticleType, Rgb};
    use crate::command::SpawnCommand;
    use crate::rules::{self, Neighbourhood};
    use crate::surface::CpuSurface;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    fn cell(particle: ParticleType) -> Cell {
        Cell::new(particle, Rgb::new(50, 60, 70))
    }

    fn scheduler() -> UpdateScheduler {
        UpdateScheduler::new(Box::new(CpuSurface::new()))
    }

    /// Fails the n-th dispatch of the given kernel.
    struct FailingSurface {
        inner: CpuSurface,
        kernel: Kernel,
        fail_on: usize,
        seen: usize,
    }

    impl ComputeSurface for FailingSurface {
        fn dispatch(&mut self, dispatch: Dispatch<'_>) -> Result<(), DispatchError> {
            if dispatch.kernel == self.kernel {
                self.seen += 1;
                if self.seen == self.fail_on {
                    return Err(DispatchError::ResourceExhausted {
                        kernel: dispatch.kernel,
                    });
                }
            }
            self.inner.dispatch(dispatch)
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    /// Counts dispatches per kernel.
    struct CountingSurface {
        inner: CpuSurface,
        counts: Arc<Mutex<HashMap<Kernel, usize>>>,
    }

    impl ComputeSurface for CountingSurface {
        fn dispatch(&mut self, dispatch: Dispatch<'_>) -> Result<(), DispatchError> {
            if let Ok(mut counts) = self.counts.lock() {
                *counts.entry(dispatch.kernel).or_insert(0) += 1;
            }
            self.inner.dispatch(dispatch)
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    struct GridView<'a> {
        grid: &'a GridState,
        claimed: &'a [Cell],
    }

    impl Neighbourhood for GridView<'_> {
        fn width(&self) -> u32 {
            self.grid.width()
        }
        fn height(&self) -> u32 {
            self.grid.height()
        }
        fn read(&self, x: u32, y: u32) -> Cell {
            self.grid.read_generation()[self.grid.index(x, y)]
        }
        fn claimed(&self, x: u32, y: u32) -> bool {
            !self.claimed[self.grid.index(x, y)].is_empty()
        }
    }

    /// Deterministic pseudo-random scene.
    fn noisy_grid(width: u32, height: u32, seed: u32) -> GridState {
        let mut grid = GridState::new(width, height).unwrap();
        let mut rng = crate::math::DeterministicRng::new(u64::from(seed));
        for y in 0..height {
            for x in 0..width {
                let particle = match rng.next_u32() % 8 {
                    0 | 1 | 2 => ParticleType::Sand,
                    3 => ParticleType::Stone,
                    4 | 5 => ParticleType::Water,
                    _ => ParticleType::Empty,
                };
                grid.set(x, y, cell(particle));
            }
        }
        grid
    }

    #[test]
    fn single_phase_never_targets_one_cell_twice() {
        let grid = noisy_grid(30, 21, 7);
        let empty = vec![Cell::EMPTY; grid.len()];
        let view = GridView {
            grid: &grid,
            claimed: &empty,
        };
        for phase in Phase::all() {
            let mut targets = HashMap::new();
            for (x, y) in phase.sources(grid.width(), grid.height()) {
                if let Some(target) = rules::resolve(&view, x, y, 1234) {
                    if let Some(prev) = targets.insert(target, (x, y)) {
                        panic!("phase {} sources {:?} and {:?} collide", phase.index(), prev, (x, y));
                    }
                }
            }
        }
    }

    fn census(grid: &GridState) -> HashMap<ParticleType, usize> {
        let mut counts = HashMap::new();
        for cell in grid.read_generation() {
            if !cell.is_empty() {
                *counts.entry(cell.particle()).or_insert(0) += 1;
            }
        }
        counts
    }

    #[test]
    fn tick_conserves_particles() {
        for seed in 0..5 {
            let mut grid = noisy_grid(25, 19, seed);
            let mut commands = CommandBuffer::new();
            let mut scheduler = scheduler();
            let before = census(&grid);
            for t in 0..20 {
                scheduler.tick(&mut grid, &mut commands, 1, t).unwrap();
                assert_eq!(census(&grid), before, "seed {seed} tick {t}");
            }
        }
    }

    #[test]
    fn stuck_cell_is_written_back_unchanged() {
        let mut grid = GridState::new(5, 5).unwrap();
        let stone = cell(ParticleType::Stone);
        let sand = Cell::new(ParticleType::Sand, Rgb::new(1, 2, 3));
        grid.set(2, 4, stone);
        grid.set(2, 3, sand);
        let mut commands = CommandBuffer::new();
        scheduler().tick(&mut grid, &mut commands, 1, 0).unwrap();
        assert_eq!(grid.cell(2, 3), Some(sand));
        assert_eq!(grid.cell(2, 4), Some(stone));
    }

    #[test]
    fn swap_exposes_previous_write_generation() {
        let mut grid = GridState::new(4, 4).unwrap();
        let mut commands = CommandBuffer::new();
        let written = grid.write_index();
        scheduler().tick(&mut grid, &mut commands, 1, 0).unwrap();
        assert_eq!(grid.read_index(), written);
    }

    #[test]
    fn drained_commands_are_stamped_once() {
        let mut grid = GridState::new(8, 8).unwrap();
        let mut commands = CommandBuffer::new();
        let stone = cell(ParticleType::Stone);
        commands.append(SpawnCommand::new(3, 3, stone)).unwrap();
        let mut scheduler = scheduler();
        let report = scheduler.tick(&mut grid, &mut commands, 1, 0).unwrap();
        assert_eq!(report.spawned, 1);
        assert!(commands.is_empty());
        assert_eq!(grid.cell(3, 3), Some(stone));
        let report = scheduler.tick(&mut grid, &mut commands, 1, 1).unwrap();
        assert_eq!(report.spawned, 0);
    }

    #[test]
    fn later_commands_win() {
        let mut grid = GridState::new(8, 8).unwrap();
        let mut commands = CommandBuffer::new();
        commands.append(SpawnCommand::new(1, 7, cell(ParticleType::Sand))).unwrap();
        commands.append(SpawnCommand::new(1, 7, cell(ParticleType::Stone))).unwrap();
        scheduler().tick(&mut grid, &mut commands, 1, 0).unwrap();
        assert_eq!(grid.cell(1, 7).map(Cell::particle), Some(ParticleType::Stone));
    }

    #[test]
    fn eraser_removes_particles() {
        let mut grid = GridState::new(6, 6).unwrap();
        grid.set(2, 5, cell(ParticleType::Stone));
        let mut commands = CommandBuffer::new();
        commands
            .append(SpawnCommand::new(2, 5, Cell::EMPTY))
            .unwrap();
        scheduler().tick(&mut grid, &mut commands, 1, 0).unwrap();
        assert_eq!(grid.occupied(), 0);
    }

    #[test]
    fn empty_batch_skips_upload_dispatch() {
        let counts = Arc::new(Mutex::new(HashMap::new()));
        let mut scheduler = UpdateScheduler::new(Box::new(CountingSurface {
            inner: CpuSurface::new(),
            counts: Arc::clone(&counts),
        }));
        let mut grid = GridState::new(6, 6).unwrap();
        let mut commands = CommandBuffer::new();
        scheduler.tick(&mut grid, &mut commands, 1, 0).unwrap();
        {
            let counts = counts.lock().unwrap();
            assert_eq!(counts.get(&Kernel::Clear), Some(&1));
            assert_eq!(counts.get(&Kernel::Update), Some(&9));
            assert_eq!(counts.get(&Kernel::Upload), None);
        }

        commands.append(SpawnCommand::new(0, 0, cell(ParticleType::Sand))).unwrap();
        scheduler.tick(&mut grid, &mut commands, 1, 1).unwrap();
        assert_eq!(counts.lock().unwrap().get(&Kernel::Upload), Some(&1));
    }

    #[test]
    fn failed_phase_abandons_tick() {
        let mut grid = GridState::new(6, 6).unwrap();
        grid.set(1, 1, cell(ParticleType::Sand));
        let before = grid.read_generation().to_vec();
        let read_index = grid.read_index();
        let mut commands = CommandBuffer::new();
        commands.append(SpawnCommand::new(4, 4, cell(ParticleType::Stone))).unwrap();

        let mut scheduler = UpdateScheduler::new(Box::new(FailingSurface {
            inner: CpuSurface::new(),
            kernel: Kernel::Update,
            fail_on: 5,
            seen: 0,
        }));
        let err = scheduler.tick(&mut grid, &mut commands, 1, 0).unwrap_err();
        assert!(matches!(err, TickError::Abandoned { kernel: Kernel::Update, .. }));
        assert_eq!(grid.read_index(), read_index);
        assert_eq!(grid.read_generation(), before.as_slice());
        assert_eq!(commands.len(), 1, "batch must survive an abandoned tick");

        // Next tick goes through and applies the batch exactly once.
        scheduler.tick(&mut grid, &mut commands, 1, 1).unwrap();
        assert_eq!(grid.cell(1, 2).map(Cell::particle), Some(ParticleType::Sand));
        assert_eq!(grid.cell(4, 4).map(Cell::particle), Some(ParticleType::Stone));
        assert!(commands.is_empty());
    }

    #[test]
    fn failed_upload_keeps_batch_queued() {
        let mut grid = GridState::new(6, 6).unwrap();
        let mut commands = CommandBuffer::new();
        commands.append(SpawnCommand::new(0, 0, cell(ParticleType::Stone))).unwrap();
        let mut scheduler = UpdateScheduler::new(Box::new(FailingSurface {
            inner: CpuSurface::new(),
            kernel: Kernel::Upload,
            fail_on: 1,
            seen: 0,
        }));
        assert!(scheduler.tick(&mut grid, &mut commands, 1, 0).is_err());
        assert_eq!(commands.len(), 1);
        assert_eq!(grid.occupied(), 0);
        scheduler.tick(&mut grid, &mut commands, 1, 1).unwrap();
        assert_eq!(grid.occupied(), 1);
    }
}
