//! Pointer tracking for paint strokes
//!
//! Converts button and cursor events into [`DragSegment`]s in window
//! coordinates. A held button that did not move since the last frame yields a
//! zero-length segment from [`PointerTracker::frame`], so holding still keeps
//! pouring.

use sand_core::glam::Vec2;
use sand_core::DragSegment;

#[derive(Debug, Clone, Copy, Default)]
pub struct PointerTracker {
    position: Option<Vec2>,
    painting: bool,
    moved_this_frame: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_painting(&self) -> bool {
        self.painting
    }

    /// Button down. Starts a stroke at the cursor.
    pub fn press(&mut self) -> Option<DragSegment> {
        self.painting = true;
        self.moved_this_frame = true;
        self.position.map(DragSegment::point)
    }

    /// Button up.
    pub fn release(&mut self) {
        self.painting = false;
    }

    /// Cursor moved. While painting, yields the segment just covered.
    pub fn moved(&mut self, to: Vec2) -> Option<DragSegment> {
        let from = self.position.replace(to);
        if !self.painting {
            return None;
        }
        self.moved_this_frame = true;
        Some(DragSegment::new(from.unwrap_or(to), to))
    }

    /// Cursor left the window. The stroke is broken so re-entry does not
    /// draw a line across the gap.
    pub fn left(&mut self) {
        self.position = None;
    }

    /// Once per presented frame.
    pub fn frame(&mut self) -> Option<DragSegment> {
        let moved = std::mem::take(&mut self.moved_this_frame);
        if !self.painting || moved {
            return None;
        }
        self.position.map(DragSegment::point)
    }
}
