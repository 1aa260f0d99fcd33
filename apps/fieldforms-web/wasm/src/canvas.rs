//! Raster surface to `<canvas>` transfer

use signature_pad::RasterSurface;
use wasm_bindgen::{Clamped, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, ImageData};

/// Match the canvas bitmap to the surface. Changing a canvas size wipes it,
/// so this only touches the attributes when they differ.
pub fn sync_size(canvas: &HtmlCanvasElement, surface: &RasterSurface) {
    if canvas.width() != surface.width() {
        canvas.set_width(surface.width());
    }
    if canvas.height() != surface.height() {
        canvas.set_height(surface.height());
    }
}

/// Copy every surface pixel onto the canvas
pub fn blit(
    canvas: &HtmlCanvasElement,
    ctx: &CanvasRenderingContext2d,
    surface: &RasterSurface,
) -> Result<(), JsValue> {
    sync_size(canvas, surface);
    if surface.width() == 0 || surface.height() == 0 {
        return Ok(());
    }
    let image = ImageData::new_with_u8_clamped_array_and_sh(
        Clamped(surface.pixels()),
        surface.width(),
        surface.height(),
    )?;
    ctx.put_image_data(&image, 0.0, 0.0)
}
