//! Compute surface contract
//!
//! The scheduler only talks to a [`ComputeSurface`] through [`Dispatch`]
//! requests: a kernel, its work-group extents, the bound grid buffers and a
//! few scalars. [`CpuSurface`] runs the kernels on the rayon pool.

use crate::cell::Cell;
use crate::command::SpawnCommand;
use crate::phase::{Phase, STRIDE};
use crate::rules::{self, Neighbourhood};
use rayon::prelude::*;
use thiserror::Error;

/// Threads per work-group axis for grid kernels.
pub const UPDATE_THREADS: u32 = 16;
/// Threads per work-group for the upload kernel.
pub const UPLOAD_THREADS: u32 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kernel {
    /// Fill the target generation with Empty.
    Clear,
    /// One phase of the automaton update.
    Update,
    /// Stamp spawn commands into the target generation.
    Upload,
}

/// Work-group counts per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkGroups {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl WorkGroups {
    pub fn for_kernel(kernel: Kernel, width: u32, height: u32, commands: usize) -> Self {
        match kernel {
            Kernel::Clear => Self {
                x: width.div_ceil(UPDATE_THREADS),
                y: height.div_ceil(UPDATE_THREADS),
                z: 1,
            },
            Kernel::Update => Self {
                x: width.div_ceil(STRIDE).div_ceil(UPDATE_THREADS),
                y: height.div_ceil(STRIDE).div_ceil(UPDATE_THREADS),
                z: 1,
            },
            Kernel::Upload => Self {
                x: (commands as u32).div_ceil(UPLOAD_THREADS),
                y: 1,
                z: 1,
            },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.x == 0 || self.y == 0 || self.z == 0
    }
}

/// Scalar parameters pushed alongside a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchParams {
    pub phase: Phase,
    /// Tick timestamp in milliseconds; seeds tie-breaks.
    pub time: u32,
    pub brush_radius: u32,
}

/// Buffers bound to a dispatch.
pub struct Bindings<'a> {
    pub read: Option<&'a [Cell]>,
    pub write: &'a mut [Cell],
    pub commands: &'a [SpawnCommand],
}

pub struct Dispatch<'a> {
    pub kernel: Kernel,
    pub groups: WorkGroups,
    pub width: u32,
    pub height: u32,
    pub bindings: Bindings<'a>,
    pub params: DispatchParams,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("{kernel:?} dispatch is missing its {binding} binding")]
    MissingBinding { kernel: Kernel, binding: &'static str },

    #[error("{kernel:?} dispatch bound {actual} cells for a {expected}-cell grid")]
    ExtentMismatch {
        kernel: Kernel,
        expected: usize,
        actual: usize,
    },

    #[error("{kernel:?} dispatch could not be issued: resources exhausted")]
    ResourceExhausted { kernel: Kernel },
}

/// Something that can execute kernels over grid buffers.
pub trait ComputeSurface: Send {
    fn dispatch(&mut self, dispatch: Dispatch<'_>) -> Result<(), DispatchError>;

    fn name(&self) -> &str;
}

/// Runs kernels on the CPU, update phases spread over the rayon pool.
#[derive(Debug, Default)]
pub struct CpuSurface;

impl CpuSurface {
    pub fn new() -> Self {
        Self
    }
}

impl ComputeSurface for CpuSurface {
    fn dispatch(&mut self, dispatch: Dispatch<'_>) -> Result<(), DispatchError> {
        let Dispatch {
            kernel,
            groups,
            width,
            height,
            bindings,
            params,
        } = dispatch;
        let expected = width as usize * height as usize;
        if bindings.write.len() != expected {
            return Err(DispatchError::ExtentMismatch {
                kernel,
                expected,
                actual: bindings.write.len(),
            });
        }
        if groups.is_empty() {
            return Ok(());
        }

        match kernel {
            Kernel::Clear => {
                bindings.write.par_iter_mut().for_each(|c| *c = Cell::EMPTY);
            }
            Kernel::Update => {
                let read = bindings.read.ok_or(DispatchError::MissingBinding {
                    kernel,
                    binding: "read",
                })?;
                if read.len() != expected {
                    return Err(DispatchError::ExtentMismatch {
                        kernel,
                        expected,
                        actual: read.len(),
                    });
                }
                let bands = split_bands(bindings.write, width, height, params.phase);
                bands.into_par_iter().for_each(|mut band| {
                    band.update(read, params.phase, params.time);
                });
            }
            Kernel::Upload => {
                stamp(bindings.write, width, height, bindings.commands, params.brush_radius);
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "cpu"
    }
}

/// Rows `top..top + 3` of the write generation, clipped to the grid.
///
/// The source row of the band is `top + 1`, so the whole 3x3 neighbourhood of
/// every source in the band lives inside it.
struct Band<'a> {
    top: i64,
    first_row: u32,
    width: u32,
    height: u32,
    rows: &'a mut [Cell],
}

struct BandView<'b, 'a> {
    band: &'b Band<'a>,
    read: &'b [Cell],
}

impl Neighbourhood for BandView<'_, '_> {
    fn width(&self) -> u32 {
        self.band.width
    }

    fn height(&self) -> u32 {
        self.band.height
    }

    fn read(&self, x: u32, y: u32) -> Cell {
        self.read[y as usize * self.band.width as usize + x as usize]
    }

    fn claimed(&self, x: u32, y: u32) -> bool {
        !self.band.get(x, y).is_empty()
    }
}

impl Band<'_> {
    #[inline]
    fn local(&self, x: u32, y: u32) -> usize {
        debug_assert!(y >= self.first_row, "row {y} above band at {}", self.top);
        (y - self.first_row) as usize * self.width as usize + x as usize
    }

    fn get(&self, x: u32, y: u32) -> Cell {
        self.rows[self.local(x, y)]
    }

    fn set(&mut self, x: u32, y: u32, cell: Cell) {
        let idx = self.local(x, y);
        self.rows[idx] = cell;
    }

    fn update(&mut self, read: &[Cell], phase: Phase, time: u32) {
        let y = self.top + 1;
        if y < 0 || y >= i64::from(self.height) {
            return;
        }
        let y = y as u32;
        for x in (phase.dx()..self.width).step_by(STRIDE as usize) {
            let view = BandView { band: &*self, read };
            let Some((tx, ty)) = rules::resolve(&view, x, y, time) else {
                continue;
            };
            let cell = read[y as usize * self.width as usize + x as usize];
            self.set(tx, ty, cell);
        }
    }
}

fn split_bands(write: &mut [Cell], width: u32, height: u32, phase: Phase) -> Vec<Band<'_>> {
    let row_len = width as usize;
    let mut bands = Vec::new();
    let mut top = i64::from(phase.dy()) - 1;
    let mut remaining = write;
    if top > 0 {
        let skip = (top as usize * row_len).min(remaining.len());
        remaining = &mut std::mem::take(&mut remaining)[skip..];
    }
    loop {
        let first = top.max(0) as u32;
        if first >= height {
            break;
        }
        let last = ((top + i64::from(STRIDE)) as u32).min(height);
        let (rows, rest) = std::mem::take(&mut remaining).split_at_mut((last - first) as usize * row_len);
        bands.push(Band {
            top,
            first_row: first,
            width,
            height,
            rows,
        });
        remaining = rest;
        top += i64::from(STRIDE);
    }
    bands
}

/// Stamp a brush disc per command, in append order, clipped to the grid.
fn stamp(write: &mut [Cell], width: u32, height: u32, commands: &[SpawnCommand], radius: u32) {
    let r = i64::from(radius.max(1));
    let reach = r - 1;
    for command in commands {
        for oy in -reach..=reach {
            for ox in -reach..=reach {
                if ox * ox + oy * oy >= r * r {
                    continue;
                }
                let x = i64::from(command.x) + ox;
                let y = i64::from(command.y) + oy;
                if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                    continue;
                }
                write[y as usize * width as usize + x as usize] = command.particle;
            }
        }
    }
}
