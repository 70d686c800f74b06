//! Sand Services Layer
//!
//! Host-side plumbing around the simulation: settings files and pointer
//! input tracking.

pub mod input;
pub mod settings;

pub use input::PointerTracker;
pub use settings::{Settings, SettingsError};
