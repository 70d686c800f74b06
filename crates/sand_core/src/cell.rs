//! Packed cell values
//!
//! A cell is one `u32` word laid out as `0xTTBBGGRR`: red, green and blue in
//! the low three bytes and the particle type in the high byte. The all-zero
//! word is the Empty cell, which lets a generation be cleared with a plain fill.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

const TYPE_SHIFT: u32 = 24;
const COLOR_MASK: u32 = 0x00FF_FFFF;

/// Particle kinds understood by the rule table.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ParticleType {
    #[default]
    Empty = 0,
    Sand = 1,
    Stone = 2,
    Water = 3,
}

impl ParticleType {
    /// Decode a type byte. Unknown values decode as Empty.
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            1 => ParticleType::Sand,
            2 => ParticleType::Stone,
            3 => ParticleType::Water,
            _ => ParticleType::Empty,
        }
    }

    /// Loose material can be displaced by sand sliding off it.
    #[inline]
    pub fn is_loose(self) -> bool {
        matches!(self, ParticleType::Sand | ParticleType::Water)
    }

    pub fn name(self) -> &'static str {
        match self {
            ParticleType::Empty => "Empty",
            ParticleType::Sand => "Sand",
            ParticleType::Stone => "Stone",
            ParticleType::Water => "Water",
        }
    }
}

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// One grid cell.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Pod, Zeroable)]
pub struct Cell(u32);

impl Cell {
    pub const EMPTY: Cell = Cell(0);

    pub fn new(particle: ParticleType, color: Rgb) -> Self {
        if particle == ParticleType::Empty {
            return Self::EMPTY;
        }
        Cell(
            u32::from(color.r)
                | u32::from(color.g) << 8
                | u32::from(color.b) << 16
                | (particle as u32) << TYPE_SHIFT,
        )
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Cell(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn particle(self) -> ParticleType {
        ParticleType::from_bits((self.0 >> TYPE_SHIFT) as u8)
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.particle() == ParticleType::Empty
    }

    pub fn color(self) -> Rgb {
        let c = self.0 & COLOR_MASK;
        Rgb::new(c as u8, (c >> 8) as u8, (c >> 16) as u8)
    }
}

impl std::fmt::Debug for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = self.color();
        write!(
            f,
            "Cell({}, #{:02x}{:02x}{:02x})",
            self.particle().name(),
            c.r,
            c.g,
            c.b
        )
    }
}
