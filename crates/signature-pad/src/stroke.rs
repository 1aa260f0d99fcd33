//! Pen state and stroke rendering
//!
//! Strokes are painted as a series of short independent segments: every
//! `extend` fills one capsule from the previous anchor and then re-anchors at
//! the new point. Nothing but the surface pixels records what was drawn.

use crate::surface::{RasterSurface, Rgba};

/// Coordinate in surface-local space (CSS pixels, top-left origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
}

impl StrokePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Convert viewport (client) coordinates of a pointer/touch event into
    /// surface-local ones by subtracting the surface's on-screen origin.
    pub fn from_client(client_x: f32, client_y: f32, origin: SurfaceOrigin) -> Self {
        Self {
            x: client_x - origin.left,
            y: client_y - origin.top,
        }
    }

    fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// On-screen position of the surface's top-left corner (bounding client rect)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceOrigin {
    pub left: f32,
    pub top: f32,
}

/// Stroke appearance. Caps are always round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenStyle {
    pub width: f32,
    pub color: Rgba,
}

impl Default for PenStyle {
    fn default() -> Self {
        Self {
            width: 2.0,
            color: Rgba::BLACK,
        }
    }
}

/// Turns a sequence of pointer positions into connected strokes
#[derive(Debug, Clone, Default)]
pub struct StrokeRenderer {
    style: PenStyle,
    drawing: bool,
    anchor: Option<StrokePoint>,
}

impl StrokeRenderer {
    pub fn new(style: PenStyle) -> Self {
        Self {
            style,
            drawing: false,
            anchor: None,
        }
    }

    pub fn style(&self) -> PenStyle {
        self.style
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing
    }

    /// Pen down: start a new path anchored at `point`. Paints nothing.
    pub fn begin(&mut self, point: StrokePoint) {
        self.drawing = true;
        self.anchor = point.is_finite().then_some(point);
    }

    /// Pen move: paint one segment from the anchor to `point` and re-anchor.
    /// Returns whether pixels were touched. No-op while the pen is up.
    pub fn extend(&mut self, surface: &mut RasterSurface, point: StrokePoint) -> bool {
        if !self.drawing || !point.is_finite() {
            return false;
        }
        match self.anchor.replace(point) {
            Some(from) => {
                surface.fill_segment(from, point, self.style.width, self.style.color);
                true
            }
            None => false,
        }
    }

    /// Pen up: close the current path without painting
    pub fn end(&mut self) {
        self.drawing = false;
        self.anchor = None;
    }

    /// Erase the whole surface. Pen state is left as it is.
    pub fn clear(&self, surface: &mut RasterSurface) {
        surface.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_client_subtracts_origin() {
        let origin = SurfaceOrigin {
            left: 100.0,
            top: 40.5,
        };
        let point = StrokePoint::from_client(130.0, 60.5, origin);
        assert_eq!(point, StrokePoint::new(30.0, 20.0));
    }

    #[test]
    fn test_default_pen_is_two_px_black() {
        let style = PenStyle::default();
        assert_eq!(style.width, 2.0);
        assert_eq!(style.color, Rgba::BLACK);
    }

    #[test]
    fn test_extend_without_begin_is_noop() {
        let mut surface = RasterSurface::new(50, 50);
        let mut renderer = StrokeRenderer::default();
        assert!(!renderer.extend(&mut surface, StrokePoint::new(10.0, 10.0)));
        assert!(surface.is_blank());
    }

    #[test]
    fn test_begin_does_not_paint() {
        let mut surface = RasterSurface::new(50, 50);
        let mut renderer = StrokeRenderer::default();
        renderer.begin(StrokePoint::new(10.0, 10.0));
        assert!(renderer.is_drawing());
        assert!(surface.is_blank());

        // Extending onto the anchor paints a round dot
        assert!(renderer.extend(&mut surface, StrokePoint::new(10.0, 10.0)));
        assert!(!surface.is_blank());
    }

    #[test]
    fn test_segments_chain_from_last_point() {
        let mut surface = RasterSurface::new(100, 100);
        let mut renderer = StrokeRenderer::default();
        renderer.begin(StrokePoint::new(10.0, 10.0));
        renderer.extend(&mut surface, StrokePoint::new(50.0, 10.0));
        renderer.extend(&mut surface, StrokePoint::new(50.0, 50.0));
        renderer.end();

        assert!(surface.pixel(30, 9).unwrap()[3] > 0);
        assert!(surface.pixel(49, 30).unwrap()[3] > 0);
        // Diagonal shortcut from the start point was never drawn
        assert_eq!(surface.pixel(30, 30).unwrap()[3], 0);
    }

    #[test]
    fn test_end_stops_painting() {
        let mut surface = RasterSurface::new(50, 50);
        let mut renderer = StrokeRenderer::default();
        renderer.begin(StrokePoint::new(5.0, 5.0));
        renderer.end();
        assert!(!renderer.is_drawing());
        assert!(!renderer.extend(&mut surface, StrokePoint::new(40.0, 40.0)));
        assert!(surface.is_blank());
    }

    #[test]
    fn test_new_stroke_does_not_join_previous() {
        let mut surface = RasterSurface::new(100, 100);
        let mut renderer = StrokeRenderer::default();
        renderer.begin(StrokePoint::new(10.0, 10.0));
        renderer.extend(&mut surface, StrokePoint::new(20.0, 10.0));
        renderer.end();

        renderer.begin(StrokePoint::new(80.0, 80.0));
        renderer.extend(&mut surface, StrokePoint::new(90.0, 80.0));
        renderer.end();

        // Nothing between the two strokes
        assert_eq!(surface.pixel(50, 45).unwrap()[3], 0);
    }

    #[test]
    fn test_non_finite_points_are_ignored() {
        let mut surface = RasterSurface::new(20, 20);
        let mut renderer = StrokeRenderer::default();
        renderer.begin(StrokePoint::new(5.0, 5.0));
        assert!(!renderer.extend(&mut surface, StrokePoint::new(f32::NAN, 3.0)));
        assert!(surface.is_blank());
    }

    #[test]
    fn test_clear_keeps_pen_state() {
        let mut surface = RasterSurface::new(30, 30);
        let mut renderer = StrokeRenderer::default();
        renderer.begin(StrokePoint::new(1.0, 1.0));
        renderer.extend(&mut surface, StrokePoint::new(20.0, 20.0));
        renderer.clear(&mut surface);
        assert!(surface.is_blank());
        assert!(renderer.is_drawing());
    }
}
