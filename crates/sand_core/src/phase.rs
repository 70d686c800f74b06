//! 9-phase domain decomposition
//!
//! Phase `p` owns the source cells with `(x % 3, y % 3) == (p % 3, p / 3)`.
//! Two sources of the same phase are at least 3 cells apart on each axis they
//! differ in, and every rule looks at most 1 cell away, so their 3x3
//! neighbourhoods never overlap. A phase can therefore run as independent
//! work units with no synchronization between them.

/// Number of phases in one tick.
pub const PHASE_COUNT: u8 = 9;

/// Spacing between sources of one phase.
pub const STRIDE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Phase(u8);

impl Phase {
    pub const FIRST: Phase = Phase(0);

    pub fn new(index: u8) -> Option<Self> {
        (index < PHASE_COUNT).then_some(Phase(index))
    }

    /// All phases in execution order.
    pub fn all() -> impl Iterator<Item = Phase> {
        (0..PHASE_COUNT).map(Phase)
    }

    #[inline]
    pub fn index(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn dx(self) -> u32 {
        u32::from(self.0) % STRIDE
    }

    #[inline]
    pub fn dy(self) -> u32 {
        u32::from(self.0) / STRIDE
    }

    /// Whether this phase evaluates the cell at `(x, y)`.
    #[inline]
    pub fn selects(self, x: u32, y: u32) -> bool {
        x % STRIDE == self.dx() && y % STRIDE == self.dy()
    }

    /// Source coordinates of this phase inside a `width` x `height` grid.
    pub fn sources(self, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
        let dx = self.dx();
        (self.dy()..height)
            .step_by(STRIDE as usize)
            .flat_map(move |y| (dx..width).step_by(STRIDE as usize).map(move |x| (x, y)))
    }
}
