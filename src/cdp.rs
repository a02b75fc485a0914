//! Chrome DevTools Protocol rendering backend
//!
//! Launches a headless Chrome instance per host, navigates its single tab
//! to the design editor's artboard page, and rasterizes scenes by driving
//! the page-hosted `fabric.Canvas`: construct with the artboard's native
//! dimensions, `loadFromJSON`, `renderAll`, then `toDataURL` with the
//! resolution multiplier applied at encode time.

use std::ffi::OsString;
use std::sync::Arc;
use std::time::Duration;

use headless_chrome::browser::tab::Tab;
use headless_chrome::{Browser, LaunchOptions};

use crate::error::{Error, Result};
use crate::export::RasterOptions;
use crate::scene::NormalizedScene;
use crate::{ExportConfig, RenderBackend};

/// CDP-based rendering backend (uses the `headless_chrome` crate)
pub struct CdpBackend {
    browser: Browser,
    tab: Arc<Tab>,
    config: ExportConfig,
}

impl CdpBackend {
    pub fn new(config: ExportConfig) -> Result<Self> {
        let scale_arg = OsString::from(format!(
            "--force-device-scale-factor={}",
            config.device_scale_factor
        ));

        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some((config.viewport.width, config.viewport.height)))
            .args(vec![scale_arg.as_os_str()])
            .build()
            .map_err(|e| Error::Initialization(format!("failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::Initialization(format!("failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| Error::Initialization(format!("failed to create tab: {}", e)))?;

        Ok(Self {
            browser,
            tab,
            config,
        })
    }
}

impl RenderBackend for CdpBackend {
    fn navigate(&mut self, url: &str) -> Result<()> {
        let _timeout = Duration::from_millis(self.config.timeout_ms);

        self.tab
            .navigate_to(url)
            .map_err(|e| Error::Navigation(format!("navigation failed: {}", e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| Error::Navigation(format!("wait for navigation failed: {}", e)))?;

        // Wait for the page to stabilize
        std::thread::sleep(Duration::from_millis(500));

        Ok(())
    }

    fn rasterize(&mut self, scene: &NormalizedScene, options: &RasterOptions) -> Result<String> {
        let document = serde_json::to_string(&scene.document)
            .map_err(|e| Error::Render(format!("scene serialization failed: {}", e)))?;

        // The canvas is constructed at the native size; the multiplier only
        // scales the encoded raster.
        let script = format!(
            r#"(async () => {{
                const doc = {document};
                const canvas = new fabric.Canvas(null, {{ width: {width}, height: {height} }});
                await new Promise((resolve, reject) => {{
                    try {{ canvas.loadFromJSON(doc, resolve); }} catch (err) {{ reject(err); }}
                }});
                canvas.renderAll();
                return canvas.toDataURL({{
                    format: 'png',
                    multiplier: {multiplier},
                    width: {width},
                    height: {height},
                }});
            }})()"#,
            document = document,
            width = options.width,
            height = options.height,
            multiplier = options.multiplier,
        );

        let eval = self
            .tab
            .evaluate(&script, true)
            .map_err(|e| Error::Render(format!("canvas evaluation failed: {}", e)))?;

        match eval.value {
            Some(serde_json::Value::String(data_url)) => Ok(data_url),
            Some(other) => Err(Error::Render(format!(
                "canvas returned a non-string result: {}",
                other
            ))),
            None => Err(Error::Render(
                "no value returned from canvas evaluation".to_string(),
            )),
        }
    }

    fn close(self) -> Result<()> {
        // Drop the browser explicitly so the child process is terminated
        // promptly even though the tab handle is still alive.
        drop(self.tab);
        drop(self.browser);
        Ok(())
    }
}
