//! Window event handling
//!
//! The presentation side of the two threads: paints into the shared command
//! queue, applies keyboard controls to the shared configuration and shows the
//! latest completed generation every frame.

use crate::controls::Control;
use anyhow::anyhow;
use sand_core::glam::Vec2;
use sand_core::{DragSegment, SharedSimulation, SimulationLoop};
use sand_metrics::FrameTimer;
use sand_render::window::{window_attributes, WindowConfig};
use sand_render::winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::Key,
    window::{Window, WindowId},
};
use sand_render::{wgpu, GridPresenter};
use sand_services::{PointerTracker, Settings};
use std::sync::Arc;

#[cfg(feature = "metrics")]
const REPORT_INTERVAL: std::time::Duration = std::time::Duration::from_secs(2);

pub struct App {
    window_config: WindowConfig,
    grid_size: (u32, u32),
    shared: SharedSimulation,
    sim_loop: Option<SimulationLoop>,
    window: Option<Arc<Window>>,
    presenter: Option<GridPresenter>,
    pointer: PointerTracker,
    frame_timer: FrameTimer,
    #[cfg(feature = "metrics")]
    last_report: std::time::Instant,
    failure: Option<anyhow::Error>,
}

impl App {
    pub fn new(settings: &Settings, shared: SharedSimulation, sim_loop: SimulationLoop) -> Self {
        Self {
            window_config: WindowConfig {
                title: settings.window.title.clone(),
                width: settings.window.width,
                height: settings.window.height,
            },
            grid_size: (
                settings.simulation.grid_width,
                settings.simulation.grid_height,
            ),
            shared,
            sim_loop: Some(sim_loop),
            window: None,
            presenter: None,
            pointer: PointerTracker::new(),
            frame_timer: FrameTimer::new(60),
            #[cfg(feature = "metrics")]
            last_report: std::time::Instant::now(),
            failure: None,
        }
    }

    /// Stop the simulation thread and report how the run ended.
    pub fn finish(mut self) -> anyhow::Result<()> {
        self.stop_simulation();
        match self.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn stop_simulation(&mut self) {
        if let Some(sim_loop) = self.sim_loop.take() {
            let stats = sim_loop.shutdown();
            tracing::info!(
                ticks = stats.ticks,
                abandoned = stats.abandoned,
                "simulation stopped"
            );
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.failure = Some(error);
        event_loop.exit();
    }

    fn paint(&mut self, segment: Option<DragSegment>) {
        let (Some(segment), Some(presenter)) = (segment, &self.presenter) else {
            return;
        };
        let transform = presenter.letterbox().transform();
        let report = self.shared.lock().paint(segment, &transform);
        if report.dropped > 0 {
            tracing::trace!(dropped = report.dropped, "paint outside grid");
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        let Key::Character(text) = &event.logical_key else {
            return;
        };
        let Some(control) = Control::from_key(text.as_str()) else {
            return;
        };
        let mut sim = self.shared.lock();
        let config = sim.config_mut();
        control.apply(config);
        tracing::info!(
            particle = config.brush.particle.name(),
            radius = config.brush.radius,
            color = ?config.brush.color,
            period_ms = config.tick_period_ms,
            "controls changed"
        );
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.frame_timer.begin();
        let held = self.pointer.frame();
        self.paint(held);

        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };
        presenter.upload(self.shared.lock().read_generation());

        match presenter.render() {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => presenter.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow!("graphics device out of memory"));
                return;
            }
            Err(e) => tracing::warn!(error = %e, "frame skipped"),
        }
        self.frame_timer.end();

        sand_metrics::metrics! {
            if self.last_report.elapsed() >= REPORT_INTERVAL {
                self.last_report = std::time::Instant::now();
                tracing::debug!(
                    fps = self.frame_timer.rate_hz(),
                    frame_ms = self.frame_timer.work_ms(),
                    "present rate"
                );
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match event_loop.create_window(window_attributes(&self.window_config)) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, anyhow!(e).context("failed to create window")),
        };

        let (grid_width, grid_height) = self.grid_size;
        match pollster::block_on(GridPresenter::new(Arc::clone(&window), grid_width, grid_height)) {
            Ok(presenter) => {
                self.presenter = Some(presenter);
                self.window = Some(window);
                tracing::info!(grid_width, grid_height, "window ready");
            }
            Err(e) => self.fail(event_loop, anyhow!(e).context("failed to initialise graphics")),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(size.width, size.height);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let segment = self
                    .pointer
                    .moved(Vec2::new(position.x as f32, position.y as f32));
                self.paint(segment);
            }
            WindowEvent::CursorLeft { .. } => self.pointer.left(),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => match state {
                ElementState::Pressed => {
                    let segment = self.pointer.press();
                    self.paint(segment);
                }
                ElementState::Released => self.pointer.release(),
            },
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(&event),
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.stop_simulation();
    }
}
