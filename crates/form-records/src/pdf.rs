//! PDF export contract
//!
//! Pages are printed by a renderer living in the browser. [`PdfOptions`]
//! serializes to the option object that renderer expects:
//!
//! ```json
//! {
//!   "margin": [10, 10, 10, 10],
//!   "filename": "Abnahmeprotokoll_WP.pdf",
//!   "image": { "type": "jpeg", "quality": 0.98 },
//!   "html2canvas": { "scale": 2, "useCORS": true },
//!   "jsPDF": { "unit": "mm", "format": "a4", "orientation": "portrait" }
//! }
//! ```

use serde::{Serialize, Serializer};

use crate::error::RenderError;

/// Renders a page element into a downloaded PDF
#[allow(async_fn_in_trait)]
pub trait PdfRenderer {
    /// Whether the rendering library is loaded at all
    fn is_available(&self) -> bool;

    async fn render(&self, target_id: &str, options: &PdfOptions) -> Result<(), RenderError>;
}

/// Page margin in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PdfMargin {
    Uniform(f64),
    /// Top, left, bottom, right (html2pdf order)
    Sides([f64; 4]),
}

impl PdfMargin {
    pub fn sides_mm(&self) -> [f64; 4] {
        match *self {
            PdfMargin::Uniform(m) => [m; 4],
            PdfMargin::Sides(sides) => sides,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub margin: PdfMargin,
    pub filename: String,
    pub jpeg_quality: f64,
    pub scale: f64,
    pub use_cors: bool,
    pub page: PageSetup,
}

impl PdfOptions {
    /// JPEG 0.98 at 2x scale on A4 portrait
    pub fn new(filename: impl Into<String>, margin: PdfMargin) -> Self {
        Self {
            margin,
            filename: filename.into(),
            jpeg_quality: 0.98,
            scale: 2.0,
            use_cors: true,
            page: PageSetup::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSetup {
    pub unit: &'static str,
    pub format: &'static str,
    pub orientation: &'static str,
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            unit: "mm",
            format: "a4",
            orientation: "portrait",
        }
    }
}

#[derive(Serialize)]
struct WireOptions<'a> {
    margin: PdfMargin,
    filename: &'a str,
    image: WireImage,
    html2canvas: WireCanvas,
    #[serde(rename = "jsPDF")]
    js_pdf: &'a PageSetup,
}

#[derive(Serialize)]
struct WireImage {
    #[serde(rename = "type")]
    kind: &'static str,
    quality: f64,
}

#[derive(Serialize)]
struct WireCanvas {
    scale: f64,
    #[serde(rename = "useCORS")]
    use_cors: bool,
}

impl Serialize for PdfOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        WireOptions {
            margin: self.margin,
            filename: &self.filename,
            image: WireImage {
                kind: "jpeg",
                quality: self.jpeg_quality,
            },
            html2canvas: WireCanvas {
                scale: self.scale,
                use_cors: self.use_cors,
            },
            js_pdf: &self.page,
        }
        .serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_options_match_renderer_shape() {
        let options = PdfOptions::new("Arbeitsnachweis.pdf", PdfMargin::Uniform(5.0));
        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            json!({
                "margin": 5.0,
                "filename": "Arbeitsnachweis.pdf",
                "image": { "type": "jpeg", "quality": 0.98 },
                "html2canvas": { "scale": 2.0, "useCORS": true },
                "jsPDF": { "unit": "mm", "format": "a4", "orientation": "portrait" }
            })
        );
    }

    #[test]
    fn test_per_side_margins_serialize_as_array() {
        let options = PdfOptions::new("x.pdf", PdfMargin::Sides([10.0, 12.0, 10.0, 12.0]));
        let value = serde_json::to_value(&options).unwrap();
        assert_eq!(value["margin"], json!([10.0, 12.0, 10.0, 12.0]));
        assert_eq!(PdfMargin::Uniform(5.0).sides_mm(), [5.0; 4]);
    }
}
