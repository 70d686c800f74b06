//! Particle movement rule table
//!
//! Each type lists candidate destinations (relative offsets, y grows
//! downwards) in priority order. A source moves to the first candidate that is
//! inside the grid, Empty in the read generation and not already claimed in
//! the write generation. With no such candidate it stays where it is.
//!
//! | type  | candidates |
//! |-------|------------|
//! | Empty | none, writes nothing |
//! | Stone | none, immobile |
//! | Sand  | down; the two down-diagonals only when resting on loose material |
//! | Water | down; both down-diagonals; both sideways cells |
//!
//! Diagonal and sideways pairs are ordered by a per-cell coin flip seeded
//! from the cell coordinate and the tick timestamp.

use crate::cell::{Cell, ParticleType};
use crate::math::DeterministicRng;

/// Relative destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

pub const DOWN: Offset = Offset::new(0, 1);
pub const DOWN_LEFT: Offset = Offset::new(-1, 1);
pub const DOWN_RIGHT: Offset = Offset::new(1, 1);
pub const LEFT: Offset = Offset::new(-1, 0);
pub const RIGHT: Offset = Offset::new(1, 0);

const MAX_CANDIDATES: usize = 5;

/// Priority-ordered candidate list for one source cell.
#[derive(Debug, Clone, Copy)]
pub struct Candidates {
    offsets: [Offset; MAX_CANDIDATES],
    len: usize,
}

impl Candidates {
    fn new() -> Self {
        Self {
            offsets: [DOWN; MAX_CANDIDATES],
            len: 0,
        }
    }

    fn push(&mut self, offset: Offset) {
        self.offsets[self.len] = offset;
        self.len += 1;
    }

    fn push_pair(&mut self, a: Offset, b: Offset, a_first: bool) {
        if a_first {
            self.push(a);
            self.push(b);
        } else {
            self.push(b);
            self.push(a);
        }
    }

    pub fn as_slice(&self) -> &[Offset] {
        &self.offsets[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Candidate destinations for `particle`.
///
/// `below` is the read-generation cell directly underneath, `None` at the
/// bottom edge.
pub fn candidates(particle: ParticleType, below: Option<Cell>, rng: &mut DeterministicRng) -> Candidates {
    let mut list = Candidates::new();
    match particle {
        ParticleType::Empty | ParticleType::Stone => {}
        ParticleType::Sand => {
            list.push(DOWN);
            if below.is_some_and(|c| c.particle().is_loose()) {
                list.push_pair(DOWN_LEFT, DOWN_RIGHT, rng.next_bool());
            }
        }
        ParticleType::Water => {
            list.push(DOWN);
            list.push_pair(DOWN_LEFT, DOWN_RIGHT, rng.next_bool());
            list.push_pair(LEFT, RIGHT, rng.next_bool());
        }
    }
    list
}

/// Read-only view a rule evaluation needs.
pub trait Neighbourhood {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// Cell in the read generation.
    fn read(&self, x: u32, y: u32) -> Cell;
    /// Whether an earlier phase already wrote this cell of the write generation.
    fn claimed(&self, x: u32, y: u32) -> bool;
}

/// Where the source at `(x, y)` ends up this tick.
///
/// Returns `None` for Empty sources, which write nothing. Any other source
/// yields a destination; its own coordinate when nothing is free.
pub fn resolve<N: Neighbourhood>(view: &N, x: u32, y: u32, time: u32) -> Option<(u32, u32)> {
    let cell = view.read(x, y);
    if cell.is_empty() {
        return None;
    }
    let below = (y + 1 < view.height()).then(|| view.read(x, y + 1));
    let mut rng = DeterministicRng::for_cell(x, y, time);
    let list = candidates(cell.particle(), below, &mut rng);

    for offset in list.as_slice() {
        let tx = i64::from(x) + i64::from(offset.dx);
        let ty = i64::from(y) + i64::from(offset.dy);
        if tx < 0 || ty < 0 || tx >= i64::from(view.width()) || ty >= i64::from(view.height()) {
            continue;
        }
        let (tx, ty) = (tx as u32, ty as u32);
        if view.read(tx, ty).is_empty() && !view.claimed(tx, ty) {
            return Some((tx, ty));
        }
    }
    Some((x, y))
}
