//! Window management
//!
//! Window attributes via winit. Windows themselves are created inside
//! `ApplicationHandler::resumed` (winit 0.30+).

use winit::dpi::LogicalSize;
use winit::window::{Window, WindowAttributes};

/// Smallest window either axis can be resized to.
pub const MIN_WINDOW_EXTENT: u32 = 160;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

/// Create window attributes from config
pub fn window_attributes(config: &WindowConfig) -> WindowAttributes {
    Window::default_attributes()
        .with_title(config.title.clone())
        .with_inner_size(LogicalSize::new(
            config.width.max(MIN_WINDOW_EXTENT),
            config.height.max(MIN_WINDOW_EXTENT),
        ))
        .with_min_inner_size(LogicalSize::new(MIN_WINDOW_EXTENT, MIN_WINDOW_EXTENT))
        .with_resizable(true)
}
