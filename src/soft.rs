//! Pure-Rust software rendering backend
//!
//! Renders normalized scenes without any external process: object
//! rectangles are filled onto an RGBA pixmap and encoded to a PNG data URL,
//! the same output shape the browser-hosted canvas produces. Fidelity is
//! deliberately limited to rectangular fills; the `cdp` backend exists for
//! full-fidelity exports.

use base64::Engine as Base64Engine;
use image::{ImageEncoder, Rgba, RgbaImage};
use log::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::export::RasterOptions;
use crate::scene::{NormalizedScene, SceneDocument, SceneObject};
use crate::{ExportConfig, RenderBackend};

const WHITE: [u8; 4] = [255, 255, 255, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

/// Software backend: hosts a [`SoftSurface`] per rasterize call.
pub struct SoftBackend {
    #[allow(dead_code)]
    config: ExportConfig,
    page_url: Option<Url>,
}

impl SoftBackend {
    pub fn new(config: ExportConfig) -> Result<Self> {
        Ok(Self {
            config,
            page_url: None,
        })
    }
}

impl RenderBackend for SoftBackend {
    fn navigate(&mut self, url: &str) -> Result<()> {
        // No page to load; validate and remember the target so a bogus
        // origin still fails the request like it would in a real browser.
        let parsed = Url::parse(url)
            .map_err(|e| Error::Navigation(format!("invalid page URL '{}': {}", url, e)))?;
        debug!("soft backend pinned to {}", parsed);
        self.page_url = Some(parsed);
        Ok(())
    }

    fn rasterize(&mut self, scene: &NormalizedScene, options: &RasterOptions) -> Result<String> {
        let mut surface = SoftSurface::new(scene.width, scene.height);
        surface.load_document(&scene.document)?;
        surface.redraw();
        surface.encode_png(options)
    }

    fn close(self) -> Result<()> {
        Ok(())
    }
}

/// An offscreen 2D surface sized to an artboard's native dimensions.
///
/// Mirrors the canvas lifecycle the exporter depends on: construct with
/// dimensions, load a scene document, redraw, encode to a raster with a
/// resolution multiplier applied at encode time only.
pub struct SoftSurface {
    width: f64,
    height: f64,
    document: Option<SceneDocument>,
    pixmap: Option<RgbaImage>,
}

impl SoftSurface {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            document: None,
            pixmap: None,
        }
    }

    /// Load a scene document onto the surface.
    ///
    /// Rejects object graphs with non-finite placement values; those would
    /// silently paint garbage otherwise.
    pub fn load_document(&mut self, document: &SceneDocument) -> Result<()> {
        for (index, obj) in document.objects.iter().enumerate() {
            let fields = [obj.left, obj.top, obj.width, obj.height];
            if fields.iter().any(|v| !v.is_finite()) {
                return Err(Error::Render(format!(
                    "object {} has a non-finite placement value",
                    index
                )));
            }
        }
        self.document = Some(document.clone());
        Ok(())
    }

    /// Paint the loaded document at native size.
    pub fn redraw(&mut self) {
        let doc = self.document.clone().unwrap_or_default();
        self.pixmap = Some(paint(&doc, self.width, self.height, 1.0));
    }

    /// The native-size pixmap produced by the last [`SoftSurface::redraw`].
    pub fn pixmap(&self) -> Option<&RgbaImage> {
        self.pixmap.as_ref()
    }

    /// Encode the surface to a PNG data URL, scaling the output raster by
    /// `options.multiplier`. The surface itself stays at native size.
    pub fn encode_png(&self, options: &RasterOptions) -> Result<String> {
        let document = self
            .document
            .as_ref()
            .ok_or_else(|| Error::Render("no document loaded on the surface".to_string()))?;

        let out = paint(document, options.width, options.height, options.multiplier);

        let mut png = Vec::new();
        image::codecs::png::PngEncoder::new(&mut png)
            .write_image(
                out.as_raw(),
                out.width(),
                out.height(),
                image::ExtendedColorType::Rgba8,
            )
            .map_err(|e| Error::Render(format!("PNG encoding failed: {}", e)))?;

        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        ))
    }
}

fn paint(document: &SceneDocument, width: f64, height: f64, scale: f64) -> RgbaImage {
    let out_w = ((width * scale).round() as u32).max(1);
    let out_h = ((height * scale).round() as u32).max(1);

    let background = document
        .extra
        .get("background")
        .and_then(|v| v.as_str())
        .and_then(parse_color)
        .unwrap_or(WHITE);

    let mut img = RgbaImage::from_pixel(out_w, out_h, Rgba(background));
    for obj in &document.objects {
        fill_rect(&mut img, obj, scale);
    }
    img
}

fn fill_rect(img: &mut RgbaImage, obj: &SceneObject, scale: f64) {
    let fill = obj
        .extra
        .get("fill")
        .and_then(|v| v.as_str())
        .and_then(parse_color)
        .unwrap_or(BLACK);

    let x0 = (obj.left * scale).round() as i64;
    let y0 = (obj.top * scale).round() as i64;
    let x1 = ((obj.left + obj.width) * scale).round() as i64;
    let y1 = ((obj.top + obj.height) * scale).round() as i64;

    let x0 = x0.clamp(0, img.width() as i64) as u32;
    let y0 = y0.clamp(0, img.height() as i64) as u32;
    let x1 = x1.clamp(0, img.width() as i64) as u32;
    let y1 = y1.clamp(0, img.height() as i64) as u32;

    for y in y0..y1 {
        for x in x0..x1 {
            img.put_pixel(x, y, Rgba(fill));
        }
    }
}

/// Parse `#rrggbb` or `#rgb` colors; anything else is left to the caller's
/// default.
fn parse_color(s: &str) -> Option<[u8; 4]> {
    let hex = s.strip_prefix('#')?;
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some([r, g, b, 255])
        }
        3 => {
            let component = |i: usize| {
                u8::from_str_radix(&hex[i..i + 1], 16)
                    .ok()
                    .map(|v| v * 17)
            };
            Some([component(0)?, component(1)?, component(2)?, 255])
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::ObjectData;

    fn rect(left: f64, top: f64, width: f64, height: f64, fill: &str) -> SceneObject {
        let mut extra = serde_json::Map::new();
        extra.insert("fill".to_string(), serde_json::json!(fill));
        SceneObject {
            left,
            top,
            width,
            height,
            data: ObjectData::default(),
            extra,
        }
    }

    fn document(objects: Vec<SceneObject>) -> SceneDocument {
        SceneDocument {
            objects,
            extra: serde_json::Map::new(),
        }
    }

    #[test]
    fn parse_color_variants() {
        assert_eq!(parse_color("#ff0000"), Some([255, 0, 0, 255]));
        assert_eq!(parse_color("#0f0"), Some([0, 255, 0, 255]));
        assert_eq!(parse_color("red"), None);
        assert_eq!(parse_color("#zzzzzz"), None);
    }

    #[test]
    fn redraw_paints_background_and_objects() {
        let mut surface = SoftSurface::new(10.0, 10.0);
        surface
            .load_document(&document(vec![rect(2.0, 2.0, 4.0, 4.0, "#ff0000")]))
            .unwrap();
        surface.redraw();

        let pixmap = surface.pixmap().unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (10, 10));
        assert_eq!(pixmap.get_pixel(0, 0), &Rgba(WHITE));
        assert_eq!(pixmap.get_pixel(3, 3), &Rgba([255, 0, 0, 255]));
        // Rect spans [2, 6); 6 is outside again
        assert_eq!(pixmap.get_pixel(6, 6), &Rgba(WHITE));
    }

    #[test]
    fn encode_applies_multiplier_to_output_only() {
        let mut surface = SoftSurface::new(100.0, 50.0);
        surface.load_document(&document(vec![])).unwrap();
        surface.redraw();

        let data_url = surface
            .encode_png(&RasterOptions {
                width: 100.0,
                height: 50.0,
                multiplier: 2.0,
            })
            .unwrap();

        let bytes = crate::export::decode_data_url(&data_url).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (200, 100));
        // Surface stays native
        assert_eq!(surface.pixmap().unwrap().width(), 100);
    }

    #[test]
    fn load_rejects_non_finite_placement() {
        let mut surface = SoftSurface::new(10.0, 10.0);
        let res = surface.load_document(&document(vec![rect(f64::NAN, 0.0, 1.0, 1.0, "#fff")]));
        assert!(matches!(res, Err(Error::Render(_))));
    }

    #[test]
    fn objects_outside_the_canvas_are_clipped() {
        let mut surface = SoftSurface::new(4.0, 4.0);
        surface
            .load_document(&document(vec![rect(-10.0, -10.0, 100.0, 100.0, "#00f")]))
            .unwrap();
        surface.redraw();
        let pixmap = surface.pixmap().unwrap();
        assert_eq!(pixmap.get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
        assert_eq!(pixmap.get_pixel(3, 3), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn backend_rejects_invalid_navigation_target() {
        let mut backend = SoftBackend::new(ExportConfig::default()).unwrap();
        assert!(matches!(
            backend.navigate("not a url"),
            Err(Error::Navigation(_))
        ));
        assert!(backend.navigate("http://localhost:3000/artboard").is_ok());
    }
}
