//! Paint input encoding
//!
//! Turns pointer drag segments in presentation coordinates into spawn
//! commands in grid coordinates. Samples are taken every presentation unit
//! along the segment so fast strokes leave no gaps.
//!
//! Out-of-range policy: a sample whose grid coordinate falls outside
//! `[0, width) x [0, height)` (including non-finite results from a degenerate
//! transform) is dropped and counted in [`PaintReport::dropped`]. It is never
//! clamped onto the border and never an error.

use crate::command::{CommandBuffer, SpawnCommand};
use crate::config::Brush;
use glam::Vec2;

/// Sample spacing in presentation units.
pub const PAINT_STEP: f32 = 1.0;

/// Two-point drag in presentation coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSegment {
    pub start: Vec2,
    pub end: Vec2,
}

impl DragSegment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Zero-length segment, e.g. a held button that did not move.
    pub fn point(at: Vec2) -> Self {
        Self { start: at, end: at }
    }

    pub fn delta(&self) -> Vec2 {
        self.end - self.start
    }
}

/// Mapping from presentation coordinates to grid coordinates.
///
/// Owned by the presentation side (letterboxing); `grid = (p - offset) / scale`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceTransform {
    pub scale: f32,
    pub offset: Vec2,
}

impl SurfaceTransform {
    pub const IDENTITY: SurfaceTransform = SurfaceTransform {
        scale: 1.0,
        offset: Vec2::ZERO,
    };

    pub fn new(scale: f32, offset: Vec2) -> Self {
        Self { scale, offset }
    }

    #[inline]
    pub fn to_grid(&self, p: Vec2) -> Vec2 {
        (p - self.offset) / self.scale
    }
}

impl Default for SurfaceTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Outcome of encoding one segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaintReport {
    /// Samples appended to the command buffer.
    pub accepted: usize,
    /// Samples outside the grid.
    pub dropped: usize,
    /// Set when the command buffer could not grow; the rest of the segment
    /// is skipped.
    pub failed: usize,
}

impl PaintReport {
    pub fn samples(&self) -> usize {
        self.accepted + self.dropped + self.failed
    }
}

pub struct PaintEncoder {
    width: u32,
    height: u32,
    step: f32,
}

impl PaintEncoder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            step: PAINT_STEP,
        }
    }

    /// Presentation-space sample points along a segment.
    ///
    /// Points sit at `start + delta * i / distance` for every `i` below the
    /// distance in unit steps, plus the endpoint. A segment shorter than
    /// `f32::EPSILON`, or one with a non-finite length, counts as distance 1
    /// and yields only the endpoint.
    pub fn samples(&self, segment: DragSegment) -> impl Iterator<Item = Vec2> {
        let delta = segment.delta();
        let distance = delta.length();
        let degenerate = !distance.is_finite() || distance < f32::EPSILON;
        let distance = if degenerate { 1.0 } else { distance };
        let steps = if degenerate {
            0
        } else {
            (distance / self.step).ceil() as usize
        };
        let step = self.step;
        let start = segment.start;
        (0..steps)
            .map(move |i| start + delta * (i as f32 * step) / distance)
            .chain(std::iter::once(segment.end))
    }

    /// Grid cell for a presentation point, `None` when out of range.
    pub fn grid_cell(&self, p: Vec2, transform: &SurfaceTransform) -> Option<(u32, u32)> {
        let g = transform.to_grid(p).floor();
        if !g.is_finite() || g.x < 0.0 || g.y < 0.0 {
            return None;
        }
        if g.x >= self.width as f32 || g.y >= self.height as f32 {
            return None;
        }
        Some((g.x as u32, g.y as u32))
    }

    /// Append one spawn command per in-range sample of `segment`.
    pub fn encode(
        &self,
        segment: DragSegment,
        transform: &SurfaceTransform,
        brush: &Brush,
        commands: &mut CommandBuffer,
    ) -> PaintReport {
        let particle = brush.cell();
        let mut report = PaintReport::default();
        for p in self.samples(segment) {
            let Some((x, y)) = self.grid_cell(p, transform) else {
                report.dropped += 1;
                continue;
            };
            match commands.append(SpawnCommand::new(x, y, particle)) {
                Ok(()) => report.accepted += 1,
                Err(e) => {
                    tracing::warn!(error = %e, "paint segment cut short");
                    report.failed += 1;
                    break;
                }
            }
        }
        if report.dropped > 0 {
            tracing::trace!(dropped = report.dropped, "paint samples outside grid");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{ParticleType, Rgb};

    fn brush() -> Brush {
        Brush {
            radius: 1,
            color: Rgb::new(10, 20, 30),
            particle: ParticleType::Sand,
        }
    }

    #[test]
    fn vertical_drag_yields_inclusive_samples() {
        let encoder = PaintEncoder::new(32, 32);
        let mut commands = CommandBuffer::new();
        let report = encoder.encode(
            DragSegment::new(Vec2::new(0.0, 0.0), Vec2::new(0.0, 10.0)),
            &SurfaceTransform::IDENTITY,
            &brush(),
            &mut commands,
        );
        assert_eq!(report.accepted, 11);
        let coords: Vec<(u32, u32)> = commands.as_slice().iter().map(|c| (c.x, c.y)).collect();
        let expected: Vec<(u32, u32)> = (0..=10).map(|y| (0, y)).collect();
        assert_eq!(coords, expected);
    }

    #[test]
    fn zero_length_segment_yields_one_sample_at_endpoint() {
        let encoder = PaintEncoder::new(32, 32);
        let mut commands = CommandBuffer::new();
        let report = encoder.encode(
            DragSegment::point(Vec2::new(4.5, 7.9)),
            &SurfaceTransform::IDENTITY,
            &brush(),
            &mut commands,
        );
        assert_eq!(report.samples(), 1);
        assert_eq!((commands.as_slice()[0].x, commands.as_slice()[0].y), (4, 7));
    }

    #[test]
    fn commands_carry_brush_particle() {
        let encoder = PaintEncoder::new(8, 8);
        let mut commands = CommandBuffer::new();
        encoder.encode(
            DragSegment::point(Vec2::new(1.0, 1.0)),
            &SurfaceTransform::IDENTITY,
            &brush(),
            &mut commands,
        );
        assert_eq!(commands.as_slice()[0].particle, brush().cell());
    }

    #[test]
    fn fast_diagonal_drag_skips_no_cells() {
        let encoder = PaintEncoder::new(64, 64);
        let mut commands = CommandBuffer::new();
        encoder.encode(
            DragSegment::new(Vec2::new(0.5, 0.5), Vec2::new(40.5, 30.5)),
            &SurfaceTransform::IDENTITY,
            &brush(),
            &mut commands,
        );
        let cells = commands.as_slice();
        for pair in cells.windows(2) {
            let step_x = pair[1].x.abs_diff(pair[0].x);
            let step_y = pair[1].y.abs_diff(pair[0].y);
            assert!(step_x <= 1 && step_y <= 1, "gap between {:?} and {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn letterbox_transform_is_applied_before_flooring() {
        // Grid drawn at 2x, shifted 100 units right.
        let transform = SurfaceTransform::new(2.0, Vec2::new(100.0, 0.0));
        let encoder = PaintEncoder::new(16, 16);
        assert_eq!(encoder.grid_cell(Vec2::new(105.0, 9.0), &transform), Some((2, 4)));
        assert_eq!(encoder.grid_cell(Vec2::new(99.0, 9.0), &transform), None);
    }

    #[test]
    fn out_of_range_samples_are_dropped() {
        let encoder = PaintEncoder::new(10, 10);
        let mut commands = CommandBuffer::new();
        let report = encoder.encode(
            DragSegment::new(Vec2::new(5.0, 5.0), Vec2::new(15.0, 5.0)),
            &SurfaceTransform::IDENTITY,
            &brush(),
            &mut commands,
        );
        assert_eq!(report.accepted, 5); // x = 5..=9
        assert_eq!(report.dropped, 6); // x = 10..=15
        assert!(commands.as_slice().iter().all(|c| c.x < 10));
    }

    #[test]
    fn negative_coordinates_are_dropped_not_clamped() {
        let encoder = PaintEncoder::new(10, 10);
        assert_eq!(encoder.grid_cell(Vec2::new(-0.5, 3.0), &SurfaceTransform::IDENTITY), None);
    }

    #[test]
    fn non_finite_segment_yields_single_dropped_sample() {
        let encoder = PaintEncoder::new(10, 10);
        let segment = DragSegment::new(Vec2::new(1.0, 1.0), Vec2::new(f32::INFINITY, 1.0));
        assert_eq!(encoder.samples(segment).count(), 1);

        let mut commands = CommandBuffer::new();
        let report = encoder.encode(segment, &SurfaceTransform::IDENTITY, &brush(), &mut commands);
        assert_eq!(report, PaintReport { accepted: 0, dropped: 1, failed: 0 });
        assert!(commands.is_empty());
    }

    #[test]
    fn zero_scale_drops_everything() {
        let encoder = PaintEncoder::new(10, 10);
        let transform = SurfaceTransform::new(0.0, Vec2::ZERO);
        assert_eq!(encoder.grid_cell(Vec2::new(0.0, 0.0), &transform), None);
        assert_eq!(encoder.grid_cell(Vec2::new(3.0, 3.0), &transform), None);
    }
}
