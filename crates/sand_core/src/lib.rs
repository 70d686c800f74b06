//! Sand Core
//!
//! The falling-sand simulation itself:
//! - Packed cells and the double-buffered grid
//! - Movement rules and the 9-phase update scheduler
//! - Spawn command queue and paint input encoding
//! - Compute surface contract with a rayon CPU implementation
//! - Shared simulation state and the cadence thread

pub mod cell;
pub mod command;
pub mod config;
pub mod grid;
pub mod math;
pub mod paint;
pub mod phase;
pub mod rules;
pub mod scheduler;
pub mod sim_loop;
pub mod simulation;
pub mod surface;
pub mod time;

pub use cell::{Cell, ParticleType, Rgb};
pub use command::{CommandBuffer, CommandBufferError, SpawnCommand};
pub use config::{Brush, SimulationConfig};
pub use grid::{GridError, GridState};
pub use paint::{DragSegment, PaintEncoder, PaintReport, SurfaceTransform};
pub use scheduler::{TickError, TickReport, UpdateScheduler};
pub use sim_loop::{LoopStats, SimulationLoop};
pub use simulation::{SharedSimulation, Simulation};
pub use surface::{ComputeSurface, CpuSurface, DispatchError};

pub use glam;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
