//! Deterministic math utilities
//!
//! Re-exports glam with the per-cell tie-break generator used by the rule table

pub use glam::*;

/// Deterministic pseudo-random generator (32-bit LCG).
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from a cell coordinate and the tick timestamp.
    ///
    /// Neighbouring cells and consecutive ticks land on unrelated seeds so
    /// lateral choices do not drift in one direction.
    pub fn for_cell(x: u32, y: u32, time: u32) -> Self {
        let mut h = u64::from(x).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        h ^= u64::from(y).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        h ^= u64::from(time).wrapping_mul(0x1656_67B1_9E37_79F9);
        h ^= h >> 29;
        h ^= h >> 32;
        Self::new(h)
    }

    pub fn next_u32(&mut self) -> u32 {
        // LCG constants
        const A: u64 = 1664525;
        const C: u64 = 1013904223;
        const M: u64 = 1u64 << 32;

        self.state = (A.wrapping_mul(self.state).wrapping_add(C)) % M;
        self.state as u32
    }

    /// Coin flip from the high bit (the low LCG bits alternate).
    pub fn next_bool(&mut self) -> bool {
        self.next_u32() & 0x8000_0000 != 0
    }
}
