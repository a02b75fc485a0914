//! Raster export: 4K multiplier computation and the per-artboard pipeline

use base64::Engine as Base64Engine;

use crate::error::{Error, Result};
use crate::host::RenderHost;
use crate::scene::{self, Artboard};

/// UHD 4K bounding box the output raster is fitted into
pub const MAX_WIDTH: f64 = 3840.0;
pub const MAX_HEIGHT: f64 = 2160.0;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Largest scale factor that fits `width`×`height` inside 3840×2160 on both
/// axes, preserving aspect ratio. Can be below 1.0 when the artboard is
/// already larger than 4K. A zero dimension falls back to a denominator of
/// 1, yielding a huge multiplier rather than an error; `normalize` rejects
/// zero-sized artboards before this is reached.
pub fn multiplier_for_4k(width: f64, height: f64) -> f64 {
    let width = if width == 0.0 { 1.0 } else { width };
    let height = if height == 0.0 { 1.0 } else { height };

    let width_multiplier = MAX_WIDTH / width;
    let height_multiplier = MAX_HEIGHT / height;

    width_multiplier.min(height_multiplier)
}

/// Parameters handed to the rendering surface at encode time.
///
/// The surface itself is sized to the native `width`/`height`; only the
/// encoded raster is scaled by `multiplier`.
#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    pub width: f64,
    pub height: f64,
    pub multiplier: f64,
}

impl RasterOptions {
    /// Options for an artboard's native size with the 4K-fitting multiplier.
    pub fn for_size(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            multiplier: multiplier_for_4k(width, height),
        }
    }
}

/// Strip the PNG data-URI prefix and decode the base64 payload.
pub fn decode_data_url(data_url: &str) -> Result<Vec<u8>> {
    let payload = data_url
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or_else(|| Error::Render("surface returned a non-PNG data URL".to_string()))?;

    Base64Engine::decode(&base64::engine::general_purpose::STANDARD, payload)
        .map_err(|e| Error::Render(format!("invalid base64 image payload: {}", e)))
}

/// Export one artboard through the given rendering host: normalize its
/// scene, rasterize at the 4K-fitting multiplier, and return the raw PNG
/// bytes. Render failures from the surface propagate unchanged.
pub async fn export_artboard(host: &RenderHost, artboard: &Artboard) -> Result<Vec<u8>> {
    let scene = scene::normalize(artboard)?;
    let options = RasterOptions::for_size(scene.width, scene.height);
    let data_url = host.rasterize(scene, options).await?;
    decode_data_url(&data_url)
}
