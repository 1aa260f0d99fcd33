//! PNG data URL codec for raster surfaces
//!
//! Encoded images are `data:image/png;base64,...` strings, the same shape a
//! canvas' `toDataURL()` produces, so records written by older pages decode
//! here and vice versa. PNG is lossless: a decode of an encode reproduces the
//! surface pixel for pixel.

use std::fmt;
use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::surface::RasterSurface;

pub const PNG_MIME: &str = "image/png";

/// Portable string serialization of a surface's pixels
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    /// Wrap a data URL as-is. Validity is checked on decode.
    pub fn from_data_url(data_url: impl Into<String>) -> Self {
        Self(data_url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// MIME type declared in the data URL header, if it is one
    pub fn mime_type(&self) -> Option<&str> {
        let header = self.0.strip_prefix("data:")?.split(',').next()?;
        header.split(';').next().filter(|m| !m.is_empty())
    }
}

impl fmt::Debug for EncodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Payloads run to tens of kilobytes
        let preview: String = self.0.chars().take(32).collect();
        write!(f, "EncodedImage({}... {} bytes)", preview, self.0.len())
    }
}

/// Decoded RGBA8 pixels, not yet drawn anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, CodecError> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return Err(CodecError::BufferSize {
                width,
                height,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

/// How a restore request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    /// Pixels were drawn onto the surface
    Applied,
    /// No image was given; the surface is untouched
    Skipped,
    /// A newer restore (or a clear) was issued before this one finished
    Superseded,
}

/// Serialize the surface's current pixels.
///
/// An untouched surface encodes to a valid blank image. Zero-area surfaces
/// have no PNG representation and are rejected.
pub fn encode(surface: &RasterSurface) -> Result<EncodedImage, CodecError> {
    let (width, height) = (surface.width(), surface.height());
    if width == 0 || height == 0 {
        return Err(CodecError::ZeroArea { width, height });
    }

    let mut png_bytes = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png_bytes, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(surface.pixels())?;
        writer.finish()?;
    }

    Ok(EncodedImage(format!(
        "data:{};base64,{}",
        PNG_MIME,
        BASE64.encode(&png_bytes)
    )))
}

/// Parse a data URL and decode its PNG payload to RGBA8
pub fn decode(image: &EncodedImage) -> Result<DecodedImage, CodecError> {
    let png_bytes = payload(image.as_str())?;

    let mut decoder = png::Decoder::new(Cursor::new(png_bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf)?;
    let raw = &buf[..info.buffer_size()];

    let pixels = match info.color_type {
        png::ColorType::Rgba => raw.to_vec(),
        png::ColorType::Rgb => raw
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => raw
            .chunks_exact(2)
            .flat_map(|px| [px[0], px[0], px[0], px[1]])
            .collect(),
        png::ColorType::Grayscale => raw.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::Indexed => {
            return Err(CodecError::UnsupportedFormat(
                "indexed PNG without palette expansion".to_string(),
            ))
        }
    };

    DecodedImage::from_rgba(info.width, info.height, pixels)
}

/// Decode `image` and draw it at the surface's top-left corner.
/// An absent image is a no-op.
pub fn decode_and_draw(
    surface: &mut RasterSurface,
    image: Option<&EncodedImage>,
) -> Result<RestoreOutcome, CodecError> {
    let Some(image) = image else {
        return Ok(RestoreOutcome::Skipped);
    };
    let decoded = decode(image)?;
    surface.draw_image(&decoded, 0, 0);
    Ok(RestoreOutcome::Applied)
}

fn payload(data_url: &str) -> Result<Vec<u8>, CodecError> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or_else(|| CodecError::MalformedDataUrl("missing data: scheme".to_string()))?;
    let (header, data) = rest
        .split_once(',')
        .ok_or_else(|| CodecError::MalformedDataUrl("missing ',' separator".to_string()))?;

    let mut params = header.split(';');
    let mime = params.next().unwrap_or_default();
    if !mime.eq_ignore_ascii_case(PNG_MIME) {
        return Err(CodecError::UnsupportedFormat(if mime.is_empty() {
            "text/plain".to_string()
        } else {
            mime.to_string()
        }));
    }
    if !params.any(|p| p.eq_ignore_ascii_case("base64")) {
        return Err(CodecError::MalformedDataUrl(
            "payload is not base64-encoded".to_string(),
        ));
    }
    if data.is_empty() {
        return Err(CodecError::MalformedDataUrl("empty payload".to_string()));
    }

    Ok(BASE64.decode(data.trim())?)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::stroke::{StrokePoint, StrokeRenderer};
    use proptest::prelude::*;

    fn point(max_w: f32, max_h: f32) -> impl Strategy<Value = StrokePoint> {
        (-10.0f32..max_w + 10.0, -10.0f32..max_h + 10.0).prop_map(|(x, y)| StrokePoint::new(x, y))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        /// Property: decode(encode(S)) drawn onto a blank surface of the same size reproduces S
        #[test]
        fn roundtrip_reproduces_surface(
            width in 1u32..80,
            height in 1u32..80,
            points in prop::collection::vec(point(80.0, 80.0), 0..12),
        ) {
            let mut surface = RasterSurface::new(width, height);
            let mut renderer = StrokeRenderer::default();
            if let Some((first, rest)) = points.split_first() {
                renderer.begin(*first);
                for p in rest {
                    renderer.extend(&mut surface, *p);
                }
                renderer.end();
            }

            let encoded = encode(&surface).unwrap();
            let mut restored = RasterSurface::new(width, height);
            decode_and_draw(&mut restored, Some(&encoded)).unwrap();
            prop_assert_eq!(restored, surface);
        }

        /// Property: arbitrary strings never panic the decoder
        #[test]
        fn decode_never_panics(input in ".{0,200}") {
            let _ = decode(&EncodedImage::from_data_url(format!("data:image/png;base64,{}", input)));
            let _ = decode(&EncodedImage::from_data_url(input));
        }
    }
}
