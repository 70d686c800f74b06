//! Keyboard controls for the shared configuration

use sand_core::config::SimulationConfig;
use sand_core::{ParticleType, Rgb};

/// Tick period bounds reachable from the keyboard.
pub const MIN_PERIOD_MS: u32 = 16;
pub const MAX_PERIOD_MS: u32 = 1000;
pub const PERIOD_STEP_MS: u32 = 16;

/// Brush colors cycled by [`Control::NextColor`], starting from the default.
pub const PALETTE: [Rgb; 6] = [
    Rgb::new(230, 0, 230),
    Rgb::new(230, 200, 120),
    Rgb::new(200, 60, 40),
    Rgb::new(128, 128, 128),
    Rgb::new(40, 90, 230),
    Rgb::new(240, 240, 240),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Particle(ParticleType),
    GrowBrush,
    ShrinkBrush,
    Faster,
    Slower,
    NextColor,
}

impl Control {
    /// Binding for a typed character.
    pub fn from_key(text: &str) -> Option<Self> {
        let control = match text {
            "0" => Control::Particle(ParticleType::Empty),
            "1" => Control::Particle(ParticleType::Sand),
            "2" => Control::Particle(ParticleType::Stone),
            "3" => Control::Particle(ParticleType::Water),
            "+" | "=" => Control::GrowBrush,
            "-" => Control::ShrinkBrush,
            "[" => Control::Faster,
            "]" => Control::Slower,
            "c" | "C" => Control::NextColor,
            _ => return None,
        };
        Some(control)
    }

    pub fn apply(self, config: &mut SimulationConfig) {
        match self {
            Control::Particle(particle) => config.brush.particle = particle,
            Control::GrowBrush => config.brush.set_radius(config.brush.radius.saturating_add(1)),
            Control::ShrinkBrush => config.brush.set_radius(config.brush.radius.saturating_sub(1)),
            Control::Faster => config.set_tick_period_ms(
                config
                    .tick_period_ms
                    .saturating_sub(PERIOD_STEP_MS)
                    .clamp(MIN_PERIOD_MS, MAX_PERIOD_MS),
            ),
            Control::Slower => config.set_tick_period_ms(
                config
                    .tick_period_ms
                    .saturating_add(PERIOD_STEP_MS)
                    .clamp(MIN_PERIOD_MS, MAX_PERIOD_MS),
            ),
            Control::NextColor => config.brush.color = next_color(config.brush.color),
        }
    }
}

/// Palette entry after `current`; colors outside the palette restart it.
fn next_color(current: Rgb) -> Rgb {
    let next = PALETTE
        .iter()
        .position(|&c| c == current)
        .map_or(0, |i| (i + 1) % PALETTE.len());
    PALETTE[next]
}
