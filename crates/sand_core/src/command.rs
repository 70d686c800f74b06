//! Growable spawn command queue
//!
//! Bridges paint input to the simulation. The input thread appends under the
//! shared lock, the tick drains under the same lock. Storage grows by doubling
//! and is never released, so steady-state painting does not allocate.

use crate::cell::Cell;
use bytemuck::{Pod, Zeroable};
use std::ops::Deref;
use thiserror::Error;

/// Capacity of the first allocation.
pub const STARTING_CAPACITY: usize = 10;

/// One paint sample in grid coordinates.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Pod, Zeroable)]
pub struct SpawnCommand {
    pub x: u32,
    pub y: u32,
    /// Type and color to stamp.
    pub particle: Cell,
}

impl SpawnCommand {
    pub fn new(x: u32, y: u32, particle: Cell) -> Self {
        Self { x, y, particle }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandBufferError {
    #[error("failed to grow command buffer from {capacity} to {requested} entries")]
    GrowthFailed { capacity: usize, requested: usize },
}

pub struct CommandBuffer {
    storage: Box<[SpawnCommand]>,
    len: usize,
    reallocations: u64,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self {
            storage: Box::default(),
            len: 0,
            reallocations: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// How many times the backing storage has been replaced.
    pub fn reallocations(&self) -> u64 {
        self.reallocations
    }

    /// Queue a command, doubling the storage when full.
    ///
    /// A failed growth leaves the buffer untouched; the sample is lost but
    /// everything queued before it is still drained by the next tick.
    pub fn append(&mut self, command: SpawnCommand) -> Result<(), CommandBufferError> {
        if self.len == self.capacity() {
            self.grow()?;
        }
        self.storage[self.len] = command;
        self.len += 1;
        Ok(())
    }

    fn grow(&mut self) -> Result<(), CommandBufferError> {
        let requested = STARTING_CAPACITY.max(self.len * 2);
        let mut next: Vec<SpawnCommand> = Vec::new();
        next.try_reserve_exact(requested)
            .map_err(|_| CommandBufferError::GrowthFailed {
                capacity: self.capacity(),
                requested,
            })?;
        next.extend_from_slice(&self.storage[..self.len]);
        next.resize(requested, SpawnCommand::zeroed());
        // Old storage is released here.
        self.storage = next.into_boxed_slice();
        self.reallocations += 1;
        Ok(())
    }

    /// Hand the queued commands to the caller.
    ///
    /// The batch borrows the buffer, so no append (and no reallocation) can
    /// happen while it is alive. Dropping the batch empties the buffer
    /// without touching its capacity.
    pub fn drain(&mut self) -> Batch<'_> {
        Batch {
            buffer: self,
            keep: false,
        }
    }

    pub fn as_slice(&self) -> &[SpawnCommand] {
        &self.storage[..self.len]
    }
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Commands taken by one tick.
pub struct Batch<'a> {
    buffer: &'a mut CommandBuffer,
    keep: bool,
}

impl Batch<'_> {
    pub fn commands(&self) -> &[SpawnCommand] {
        self.buffer.as_slice()
    }

    /// Leave the commands queued for the next drain.
    pub fn defer(mut self) {
        self.keep = true;
    }
}

impl Deref for Batch<'_> {
    type Target = [SpawnCommand];

    fn deref(&self) -> &[SpawnCommand] {
        self.commands()
    }
}

impl Drop for Batch<'_> {
    fn drop(&mut self) {
        if !self.keep {
            self.buffer.len = 0;
        }
    }
}
