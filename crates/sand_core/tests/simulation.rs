//! End-to-end behaviour of the simulation through its public API.

use sand_core::glam::Vec2;
use sand_core::{
    Cell, DragSegment, ParticleType, Rgb, SharedSimulation, Simulation, SimulationConfig,
    SimulationLoop, SurfaceTransform,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};

fn cell(particle: ParticleType) -> Cell {
    Cell::new(particle, Rgb::new(200, 180, 90))
}

fn simulation(width: u32, height: u32) -> Simulation {
    Simulation::with_cpu_surface(width, height, SimulationConfig::default()).unwrap()
}

fn census(sim: &Simulation) -> HashMap<ParticleType, usize> {
    let mut counts = HashMap::new();
    for c in sim.read_generation().iter().filter(|c| !c.is_empty()) {
        *counts.entry(c.particle()).or_insert(0) += 1;
    }
    counts
}

#[test]
fn sand_comes_to_rest_on_stone() {
    let mut sim = simulation(16, 16);
    sim.grid_mut().set(5, 5, cell(ParticleType::Sand));
    sim.grid_mut().set(5, 10, cell(ParticleType::Stone));

    for t in 0..4 {
        sim.tick(t).unwrap();
        assert_eq!(sim.grid().cell(5, 5 + t + 1).map(Cell::particle), Some(ParticleType::Sand));
    }
    for t in 4..40 {
        sim.tick(t).unwrap();
        assert_eq!(sim.grid().cell(5, 9).map(Cell::particle), Some(ParticleType::Sand));
        assert_eq!(sim.grid().cell(5, 10).map(Cell::particle), Some(ParticleType::Stone));
        assert_eq!(sim.grid().occupied(), 2);
    }
}

#[test]
fn sand_column_spreads_into_a_pile() {
    let mut sim = simulation(21, 12);
    for y in 0..8 {
        sim.grid_mut().set(10, y, cell(ParticleType::Sand));
    }
    for t in 0..60 {
        sim.tick(t * 16).unwrap();
    }
    assert_eq!(census(&sim).get(&ParticleType::Sand), Some(&8));
    // A pile, not a tower: the bottom row holds more than one grain.
    let bottom = (0..21)
        .filter(|&x| sim.grid().cell(x, 11).is_some_and(|c| !c.is_empty()))
        .count();
    assert!(bottom > 1);
}

#[test]
fn water_levels_out() {
    let mut sim = simulation(9, 6);
    for y in 0..4 {
        sim.grid_mut().set(4, y, cell(ParticleType::Water));
    }
    for t in 0..200 {
        sim.tick(t * 7).unwrap();
    }
    assert_eq!(census(&sim).get(&ParticleType::Water), Some(&4));
    let bottom = (0..9)
        .filter(|&x| sim.grid().cell(x, 5).is_some_and(|c| !c.is_empty()))
        .count();
    assert_eq!(bottom, 4);
}

#[test]
fn particles_are_conserved_in_a_busy_scene() {
    let mut sim = simulation(30, 20);
    for x in 0..30 {
        sim.grid_mut().set(x, 15, cell(ParticleType::Stone));
    }
    for y in 0..10 {
        for x in (y % 2..30).step_by(2) {
            let particle = if (x + y) % 3 == 0 { ParticleType::Water } else { ParticleType::Sand };
            sim.grid_mut().set(x, y, cell(particle));
        }
    }
    let before = census(&sim);
    for t in 0..50 {
        sim.tick(t * 13).unwrap();
        assert_eq!(census(&sim), before, "tick {t}");
    }
}

#[test]
fn painted_line_lands_in_next_generation() {
    let mut sim = simulation(32, 32);
    sim.config_mut().brush.radius = 1;
    sim.config_mut().brush.particle = ParticleType::Stone;

    let report = sim.paint(
        DragSegment::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 10.0)),
        &SurfaceTransform::IDENTITY,
    );
    assert_eq!(report.accepted, 11);
    assert_eq!(sim.commands().len(), 11);

    let read_before = sim.grid().read_index();
    sim.tick(0).unwrap();
    assert_ne!(sim.grid().read_index(), read_before);
    assert!(sim.commands().is_empty());
    for y in 0..=10 {
        assert_eq!(sim.grid().cell(0, y).map(Cell::particle), Some(ParticleType::Stone));
    }
    assert_eq!(sim.grid().occupied(), 11);
}

#[test]
fn brush_radius_stamps_a_disc() {
    let mut sim = simulation(32, 32);
    sim.config_mut().brush.radius = 3;
    sim.config_mut().brush.particle = ParticleType::Stone;
    sim.paint(DragSegment::point(Vec2::new(10.0, 10.0)), &SurfaceTransform::IDENTITY);
    sim.tick(0).unwrap();
    // dx^2 + dy^2 < 9
    assert_eq!(sim.grid().occupied(), 25);
    assert!(sim.grid().cell(12, 10).is_some_and(|c| !c.is_empty()));
    assert!(sim.grid().cell(13, 10).is_some_and(|c| c.is_empty()));
}

#[test]
fn eraser_brush_clears_cells() {
    let mut sim = simulation(16, 16);
    sim.grid_mut().set(4, 15, cell(ParticleType::Stone));
    sim.config_mut().brush.radius = 2;
    sim.config_mut().brush.particle = ParticleType::Empty;
    sim.paint(DragSegment::point(Vec2::new(4.5, 15.5)), &SurfaceTransform::IDENTITY);
    sim.tick(0).unwrap();
    assert_eq!(sim.grid().occupied(), 0);
}

#[test]
fn command_buffer_capacity_survives_ticks() {
    let mut sim = simulation(64, 64);
    sim.config_mut().brush.radius = 1;
    sim.paint(
        DragSegment::new(Vec2::new(0.0, 0.0), Vec2::new(60.0, 0.0)),
        &SurfaceTransform::IDENTITY,
    );
    let capacity = sim.commands().capacity();
    let reallocations = sim.commands().reallocations();
    sim.tick(0).unwrap();
    assert_eq!(sim.commands().capacity(), capacity);

    sim.paint(
        DragSegment::new(Vec2::new(0.0, 5.0), Vec2::new(40.0, 5.0)),
        &SurfaceTransform::IDENTITY,
    );
    assert_eq!(sim.commands().reallocations(), reallocations);
}

#[test]
fn loop_drives_shared_simulation() {
    let mut config = SimulationConfig::default();
    config.set_tick_period_ms(1);
    let mut sim = Simulation::with_cpu_surface(8, 8, config).unwrap();
    sim.grid_mut().set(5, 5, cell(ParticleType::Sand));
    sim.grid_mut().set(5, 7, cell(ParticleType::Stone));
    let shared = SharedSimulation::new(sim);

    let handle = SimulationLoop::spawn(shared.clone()).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if shared.lock().grid().cell(5, 6).is_some_and(|c| !c.is_empty()) {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    let stats = handle.shutdown();
    assert!(stats.ticks >= 1);

    let sim = shared.lock();
    assert_eq!(sim.grid().cell(5, 6).map(Cell::particle), Some(ParticleType::Sand));
    assert_eq!(sim.grid().occupied(), 2);
}
