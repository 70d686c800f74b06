//! Double-buffered grid state
//!
//! Two full generations of the cell grid. Exactly one is the read generation
//! and the other the write generation; `swap` flips them once per tick.

use crate::cell::Cell;
use thiserror::Error;

/// Number of generations kept alive.
pub const GENERATIONS: usize = 2;

/// Largest accepted extent per axis (coordinates must fit in 16 bits).
pub const MAX_EXTENT: u32 = u16::MAX as u32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("grid dimensions {width}x{height} are outside 1..={max} per axis")]
    InvalidDimensions { width: u32, height: u32, max: u32 },
}

/// Two generations of a fixed-size grid.
pub struct GridState {
    width: u32,
    height: u32,
    generations: [Vec<Cell>; GENERATIONS],
    read: usize,
}

impl GridState {
    pub fn new(width: u32, height: u32) -> Result<Self, GridError> {
        if width == 0 || height == 0 || width > MAX_EXTENT || height > MAX_EXTENT {
            return Err(GridError::InvalidDimensions {
                width,
                height,
                max: MAX_EXTENT,
            });
        }
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            generations: [vec![Cell::EMPTY; len], vec![Cell::EMPTY; len]],
            read: 0,
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.generations[0].len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn read_index(&self) -> usize {
        self.read
    }

    #[inline]
    pub fn write_index(&self) -> usize {
        (self.read + 1) % GENERATIONS
    }

    /// Advance both designations by one step.
    pub fn swap(&mut self) {
        self.read = (self.read + 1) % GENERATIONS;
    }

    /// Reset every cell of a generation to Empty.
    pub fn clear(&mut self, generation: usize) {
        self.generations[generation].fill(Cell::EMPTY);
    }

    pub fn generation(&self, generation: usize) -> &[Cell] {
        &self.generations[generation]
    }

    /// The generation presentation should sample.
    pub fn read_generation(&self) -> &[Cell] {
        &self.generations[self.read]
    }

    /// Borrow the read generation immutably and the write generation mutably.
    pub fn split(&mut self) -> (&[Cell], &mut [Cell]) {
        let [a, b] = &mut self.generations;
        if self.read == 0 {
            (a.as_slice(), b.as_mut_slice())
        } else {
            (b.as_slice(), a.as_mut_slice())
        }
    }

    pub fn write_generation_mut(&mut self) -> &mut [Cell] {
        let write = self.write_index();
        &mut self.generations[write]
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Cell of the read generation, `None` outside the grid.
    pub fn cell(&self, x: u32, y: u32) -> Option<Cell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.read_generation()[self.index(x, y)])
    }

    /// Seed a cell directly into the read generation.
    ///
    /// Meant for scene setup before the loop starts; live painting goes
    /// through the command buffer.
    pub fn set(&mut self, x: u32, y: u32, cell: Cell) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let idx = self.index(x, y);
        self.generations[self.read][idx] = cell;
        true
    }

    /// Number of non-Empty cells in the read generation.
    pub fn occupied(&self) -> usize {
        self.read_generation().iter().filter(|c| !c.is_empty()).count()
    }
}
