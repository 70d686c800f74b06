//! Falling Sand Runtime
//!
//! Boots logging and settings, starts the simulation thread and runs the
//! window event loop until the window closes.
//!
//! Usage: `sand [settings.json]`

mod app;
mod controls;

use anyhow::{Context, Result};
use sand_core::{SharedSimulation, Simulation, SimulationLoop};
use sand_render::winit::event_loop::EventLoop;
use sand_services::Settings;
use std::path::PathBuf;

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Falling Sand v{}", sand_core::VERSION);

    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load_or_default(settings_path.as_deref())
        .context("failed to load settings")?;

    let simulation = Simulation::with_cpu_surface(
        settings.simulation.grid_width,
        settings.simulation.grid_height,
        settings.simulation_config(),
    )
    .context("failed to create simulation grid")?;
    let shared = SharedSimulation::new(simulation);

    let event_loop = EventLoop::new().context("failed to create event loop")?;
    let sim_loop =
        SimulationLoop::spawn(shared.clone()).context("failed to start simulation thread")?;

    let mut app = app::App::new(&settings, shared, sim_loop);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;

    app.finish()
}
