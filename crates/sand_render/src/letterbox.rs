//! Fit the grid into the window without distorting it

use glam::Vec2;
use sand_core::SurfaceTransform;

/// Destination rectangle of the grid inside the window, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Window pixels per grid cell.
    pub scale: f32,
}

impl Letterbox {
    /// Scale by the limiting axis and centre along the other.
    pub fn fit(grid: (u32, u32), surface: (u32, u32)) -> Self {
        let (grid_w, grid_h) = (grid.0 as f32, grid.1 as f32);
        let (surface_w, surface_h) = (surface.0 as f32, surface.1 as f32);
        if grid.0 == 0 || grid.1 == 0 || surface.0 == 0 || surface.1 == 0 {
            return Self {
                x: 0.0,
                y: 0.0,
                width: 0.0,
                height: 0.0,
                scale: 0.0,
            };
        }

        if grid_w / grid_h > surface_w / surface_h {
            let scale = surface_w / grid_w;
            let height = grid_h * scale;
            Self {
                x: 0.0,
                y: (surface_h - height) / 2.0,
                width: surface_w,
                height,
                scale,
            }
        } else {
            let scale = surface_h / grid_h;
            let width = grid_w * scale;
            Self {
                x: (surface_w - width) / 2.0,
                y: 0.0,
                width,
                height: surface_h,
                scale,
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        self.width >= 1.0 && self.height >= 1.0
    }

    /// Window-to-grid mapping for paint input.
    pub fn transform(&self) -> SurfaceTransform {
        SurfaceTransform::new(self.scale, Vec2::new(self.x, self.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple_fills_window() {
        let lb = Letterbox::fit((480, 360), (960, 720));
        assert_eq!(lb, Letterbox { x: 0.0, y: 0.0, width: 960.0, height: 720.0, scale: 2.0 });
    }

    #[test]
    fn wide_window_gets_pillarbox() {
        let lb = Letterbox::fit((400, 300), (1000, 300));
        assert_eq!(lb.scale, 1.0);
        assert_eq!((lb.x, lb.width), (300.0, 400.0));
        assert_eq!(lb.y, 0.0);
    }

    #[test]
    fn tall_window_gets_letterbox() {
        let lb = Letterbox::fit((400, 300), (800, 1000));
        assert_eq!(lb.scale, 2.0);
        assert_eq!((lb.y, lb.height), (200.0, 600.0));
        assert_eq!(lb.x, 0.0);
    }

    #[test]
    fn transform_maps_window_to_grid() {
        let lb = Letterbox::fit((400, 300), (800, 1000));
        let grid = lb.transform().to_grid(Vec2::new(10.0, 210.0));
        assert_eq!(grid, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn minimised_window_is_invisible() {
        let lb = Letterbox::fit((400, 300), (0, 0));
        assert!(!lb.is_visible());
        assert_eq!(lb.scale, 0.0);
    }
}
