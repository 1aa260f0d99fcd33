//! Raster surface a signature is drawn onto
//!
//! Pixels are straight-alpha RGBA8, row-major, top-left origin: the same
//! layout `ImageData` uses, so the browser can upload the buffer as-is.

use crate::codec::DecodedImage;
use crate::stroke::StrokePoint;

/// Straight-alpha RGBA8 color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba(pub [u8; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0, 0, 0, 255]);
    pub const TRANSPARENT: Rgba = Rgba([0, 0, 0, 0]);

    /// Same color with alpha scaled by `coverage` (0.0..=1.0)
    fn with_coverage(self, coverage: f32) -> [u8; 4] {
        let [r, g, b, a] = self.0;
        let alpha = (a as f32 * coverage).round().clamp(0.0, 255.0) as u8;
        [r, g, b, alpha]
    }
}

/// Mutable 2D pixel buffer owned by exactly one capture session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterSurface {
    /// Create a transparent surface
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; buffer_len(width, height)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, ready for `ImageData`
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// RGBA value at `(x, y)`, `None` outside the surface
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = self.offset(x, y);
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(px)
    }

    /// True when every pixel is fully transparent
    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    /// Replace the buffer with a transparent one of the new dimensions.
    ///
    /// Content is dropped even when the dimensions do not change, matching
    /// what assigning a canvas' width/height does.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.pixels = vec![0; buffer_len(width, height)];
    }

    /// Erase to transparent, keeping dimensions
    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Composite `image` source-over with its top-left corner at `(origin_x, origin_y)`.
    /// Parts falling outside the surface are cropped.
    pub fn draw_image(&mut self, image: &DecodedImage, origin_x: u32, origin_y: u32) {
        if origin_x >= self.width || origin_y >= self.height {
            return;
        }
        let cols = image.width().min(self.width - origin_x);
        let rows = image.height().min(self.height - origin_y);
        let src = image.pixels();

        for row in 0..rows {
            for col in 0..cols {
                let src_offset = ((row as usize) * (image.width() as usize) + col as usize) * 4;
                let mut px = [0u8; 4];
                px.copy_from_slice(&src[src_offset..src_offset + 4]);
                let dst_offset = self.offset(origin_x + col, origin_y + row);
                composite(&mut self.pixels[dst_offset..dst_offset + 4], px);
            }
        }
    }

    /// Fill the capsule around segment `from`-`to` (round caps at both ends)
    /// with anti-aliased coverage.
    pub fn fill_segment(&mut self, from: StrokePoint, to: StrokePoint, width: f32, color: Rgba) {
        if self.width == 0 || self.height == 0 || width <= 0.0 {
            return;
        }
        let radius = width / 2.0;
        let reach = radius + 1.0;

        let min_x = ((from.x.min(to.x) - reach).floor() as i64).max(0);
        let min_y = ((from.y.min(to.y) - reach).floor() as i64).max(0);
        let max_x = ((from.x.max(to.x) + reach).ceil() as i64).min(self.width as i64 - 1);
        let max_y = ((from.y.max(to.y) + reach).ceil() as i64).min(self.height as i64 - 1);
        if min_x > max_x || min_y > max_y {
            return;
        }

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let center = StrokePoint::new(x as f32 + 0.5, y as f32 + 0.5);
                let distance = distance_to_segment(center, from, to);
                let coverage = (radius + 0.5 - distance).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let offset = self.offset(x as u32, y as u32);
                composite(
                    &mut self.pixels[offset..offset + 4],
                    color.with_coverage(coverage),
                );
            }
        }
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + x as usize) * 4
    }
}

fn buffer_len(width: u32, height: u32) -> usize {
    (width as usize) * (height as usize) * 4
}

/// Source-over blend of straight-alpha `src` onto `dst`
fn composite(dst: &mut [u8], src: [u8; 4]) {
    let src_a = src[3] as u32;
    if src_a == 0 {
        return;
    }
    let dst_a = dst[3] as u32;
    if src_a == 255 || dst_a == 0 {
        dst.copy_from_slice(&src);
        return;
    }

    // Everything below is scaled by 255 to stay in integer math
    let inv = 255 - src_a;
    let out_a = src_a * 255 + dst_a * inv;
    for channel in 0..3 {
        let num = src[channel] as u32 * src_a * 255 + dst[channel] as u32 * dst_a * inv;
        dst[channel] = ((num + out_a / 2) / out_a) as u8;
    }
    dst[3] = ((out_a + 127) / 255) as u8;
}

fn distance_to_segment(p: StrokePoint, a: StrokePoint, b: StrokePoint) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opaque_image(width: u32, height: u32, color: [u8; 4]) -> DecodedImage {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take((width * height * 4) as usize)
            .collect();
        DecodedImage::from_rgba(width, height, pixels).unwrap()
    }

    #[test]
    fn test_new_surface_is_blank() {
        let surface = RasterSurface::new(30, 20);
        assert_eq!(surface.pixels().len(), 30 * 20 * 4);
        assert!(surface.is_blank());
    }

    #[test]
    fn test_pixel_out_of_bounds() {
        let surface = RasterSurface::new(4, 4);
        assert_eq!(surface.pixel(3, 3), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(4, 0), None);
        assert_eq!(surface.pixel(0, 4), None);
    }

    #[test]
    fn test_resize_same_dimensions_still_clears() {
        let mut surface = RasterSurface::new(20, 20);
        surface.fill_segment(
            StrokePoint::new(2.0, 2.0),
            StrokePoint::new(18.0, 18.0),
            2.0,
            Rgba::BLACK,
        );
        assert!(!surface.is_blank());

        surface.resize(20, 20);
        assert!(surface.is_blank());
        assert_eq!(surface, RasterSurface::new(20, 20));
    }

    #[test]
    fn test_fill_segment_covers_line_center() {
        let mut surface = RasterSurface::new(60, 60);
        surface.fill_segment(
            StrokePoint::new(10.0, 30.0),
            StrokePoint::new(50.0, 30.0),
            2.0,
            Rgba::BLACK,
        );
        // Pixel rows 29 and 30 straddle y=30.0
        assert_eq!(surface.pixel(30, 29).unwrap()[3], 255);
        assert_eq!(surface.pixel(30, 30).unwrap()[3], 255);
        // Well away from the line
        assert_eq!(surface.pixel(30, 10).unwrap()[3], 0);
        assert_eq!(surface.pixel(55, 30).unwrap()[3], 0);
    }

    #[test]
    fn test_fill_segment_round_cap_extends_past_endpoint() {
        let mut surface = RasterSurface::new(40, 40);
        surface.fill_segment(
            StrokePoint::new(20.0, 20.0),
            StrokePoint::new(30.0, 20.0),
            2.0,
            Rgba::BLACK,
        );
        // Half a pixel before the start point is inside the cap
        assert!(surface.pixel(19, 19).unwrap()[3] > 0);
    }

    #[test]
    fn test_fill_segment_outside_surface_is_clipped() {
        let mut surface = RasterSurface::new(10, 10);
        surface.fill_segment(
            StrokePoint::new(-50.0, -50.0),
            StrokePoint::new(-20.0, -20.0),
            2.0,
            Rgba::BLACK,
        );
        assert!(surface.is_blank());

        surface.fill_segment(
            StrokePoint::new(-5.0, 5.0),
            StrokePoint::new(15.0, 5.0),
            2.0,
            Rgba::BLACK,
        );
        assert_eq!(surface.pixel(0, 4).unwrap()[3], 255);
        assert_eq!(surface.pixel(9, 4).unwrap()[3], 255);
    }

    #[test]
    fn test_fill_segment_on_zero_area_surface() {
        let mut surface = RasterSurface::new(0, 0);
        surface.fill_segment(
            StrokePoint::new(0.0, 0.0),
            StrokePoint::new(5.0, 5.0),
            2.0,
            Rgba::BLACK,
        );
        assert!(surface.pixels().is_empty());
    }

    #[test]
    fn test_draw_image_onto_blank_copies_exactly() {
        let mut surface = RasterSurface::new(4, 4);
        let image = opaque_image(2, 2, [10, 20, 30, 128]);
        surface.draw_image(&image, 0, 0);
        assert_eq!(surface.pixel(0, 0), Some([10, 20, 30, 128]));
        assert_eq!(surface.pixel(1, 1), Some([10, 20, 30, 128]));
        assert_eq!(surface.pixel(2, 2), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_draw_image_crops_to_surface() {
        let mut surface = RasterSurface::new(3, 3);
        let image = opaque_image(10, 10, [255, 0, 0, 255]);
        surface.draw_image(&image, 1, 1);
        assert_eq!(surface.pixel(0, 0), Some([0, 0, 0, 0]));
        assert_eq!(surface.pixel(2, 2), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_composite_half_alpha_over_opaque() {
        let mut dst = [0u8, 0, 255, 255];
        composite(&mut dst, [255, 0, 0, 128]);
        assert_eq!(dst[3], 255);
        assert!(dst[0] > 120 && dst[0] < 136);
        assert!(dst[2] > 120 && dst[2] < 136);
    }

    #[test]
    fn test_composite_transparent_source_is_noop() {
        let mut dst = [1u8, 2, 3, 4];
        composite(&mut dst, [200, 200, 200, 0]);
        assert_eq!(dst, [1, 2, 3, 4]);
    }

    #[test]
    fn test_distance_to_degenerate_segment() {
        let a = StrokePoint::new(1.0, 1.0);
        let d = distance_to_segment(StrokePoint::new(4.0, 5.0), a, a);
        assert!((d - 5.0).abs() < 1e-5);
    }
}
