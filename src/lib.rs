//! Artboard Export Service
//!
//! A single-endpoint export service that accepts named rectangular
//! "artboard" regions — each carrying a serialized vector-graphics scene
//! graph — renders each one offscreen at up-sampled (near-4K) resolution,
//! and returns a zip archive of PNG images.
//!
//! The core is intentionally thin: coordinate normalization re-bases each
//! artboard's child objects onto the artboard's own origin, and the
//! upscale-multiplier computation fits the artboard's native size into a
//! 3840×2160 bound without distorting aspect ratio. Everything around it is
//! orchestration: HTTP routing, rendering-host lifecycle, zip streaming.
//!
//! # Backends
//!
//! - **soft** (default): a pure-Rust software rasterizer, no external
//!   processes. Paints object rectangles and encodes PNG in-process.
//! - **cdp**: drives a real `fabric.Canvas` inside headless Chrome via the
//!   Chrome DevTools Protocol; requires Chrome on the machine.
//!
//! # Example
//!
//! ```no_run
//! use artboard_export::{ExportConfig, server::ExportServer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let server = ExportServer::bind("127.0.0.1:5000", ExportConfig::default())?;
//! server.run();
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod scene;
pub use scene::{Artboard, NormalizedScene, SceneDocument, SceneObject};

pub mod export;
pub use export::{multiplier_for_4k, RasterOptions};

pub mod host;
pub use host::RenderHost;

pub mod archive;
pub mod server;

// Software rasterizer backend (default)
#[cfg(feature = "soft")]
pub mod soft;

// CDP backend (feature-gated)
#[cfg(feature = "cdp")]
pub mod cdp;

/// Configuration for the rendering host
///
/// Defaults match what the design editor's front end expects: a Full-HD
/// hosting page at device scale factor 2, with a 30 second page-load
/// timeout.
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Viewport of the hosting page
    pub viewport: Viewport,
    /// Device scale factor applied to the hosting page
    pub device_scale_factor: f64,
    /// Timeout for page loads in milliseconds
    pub timeout_ms: u64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            device_scale_factor: 2.0,
            timeout_ms: 30000,
        }
    }
}

/// Viewport dimensions of the hosting page
#[derive(Debug, Clone, Copy)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

/// Synchronous rendering backend owned by a [`RenderHost`] worker thread.
///
/// A backend wraps one rendering host process (or an in-process software
/// surface): it can navigate its hosting page, rasterize normalized scenes
/// to PNG data URLs, and release the underlying resources on close.
pub trait RenderBackend: 'static {
    /// Navigate the hosting page to a URL and wait until it is ready.
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Rasterize a normalized scene on a surface sized to the scene's
    /// native dimensions, applying `options.multiplier` at encode time, and
    /// return the result as a PNG data URL.
    fn rasterize(&mut self, scene: &NormalizedScene, options: &RasterOptions) -> Result<String>;

    /// Close the backend and release its resources.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Create a backend with the default choice for the enabled features.
///
/// Prefers the pure-Rust software backend when the `soft` feature is
/// enabled; falls back to the CDP backend otherwise. Build with
/// `--no-default-features --features cdp` to export through headless
/// Chrome.
#[cfg(feature = "soft")]
pub fn new_backend(config: ExportConfig) -> Result<impl RenderBackend> {
    soft::SoftBackend::new(config)
}

#[cfg(all(not(feature = "soft"), feature = "cdp"))]
pub fn new_backend(config: ExportConfig) -> Result<impl RenderBackend> {
    cdp::CdpBackend::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ExportConfig::default();
        assert_eq!(config.viewport.width, 1920);
        assert_eq!(config.viewport.height, 1080);
        assert_eq!(config.device_scale_factor, 2.0);
    }

    #[test]
    fn test_viewport() {
        let viewport = Viewport {
            width: 3840,
            height: 2160,
        };
        assert_eq!(viewport.width, 3840);
        assert_eq!(viewport.height, 2160);
    }
}
