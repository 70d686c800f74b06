//! Sand Render
//!
//! Presents the read generation of the grid in a window: letterboxed, nearest
//! sampled, one texel per cell.

pub mod letterbox;
pub mod presenter;
pub mod window;

pub use letterbox::Letterbox;
pub use presenter::{GridPresenter, RenderError};
pub use wgpu;
pub use winit;
