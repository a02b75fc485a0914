//! Integration tests for the export pipeline (software backend)

#![cfg(feature = "soft")]

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::Engine as Base64Engine;

use artboard_export::server::{process_request, DownloadRequest};
use artboard_export::{
    ExportConfig, NormalizedScene, RasterOptions, RenderBackend, RenderHost, Result,
};

fn artboard(id: &str, name: &str, left: f64, top: f64) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "name": name,
        "width": 1920,
        "height": 1080,
        "state": {
            "version": "5.3.0",
            "background": "#ffffff",
            "objects": [
                { "left": left, "top": top, "width": 1920, "height": 1080,
                  "data": { "id": id }, "fill": "#ffffff" },
                { "left": left + 40.0, "top": top + 40.0, "width": 200, "height": 120,
                  "data": { "id": "rect-1" }, "fill": "#ff0000" }
            ]
        }
    })
}

fn download_request(artboards: Vec<serde_json::Value>) -> DownloadRequest {
    serde_json::from_value(serde_json::json!({
        "origin": "http://localhost:3000",
        "artboards": artboards,
    }))
    .unwrap()
}

#[tokio::test]
async fn two_valid_artboards_yield_two_named_png_entries() {
    let request = download_request(vec![
        artboard("ab-1", "Cover", 100.0, 50.0),
        artboard("ab-2", "Back", 2200.0, 50.0),
    ]);

    let host = RenderHost::launch(ExportConfig::default()).await.unwrap();
    let bytes = process_request(host, &request).await.unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
    assert_eq!(archive.len(), 2);

    // Entry order follows request order
    let names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).unwrap().name().to_string())
        .collect();
    assert_eq!(names, vec!["Cover.png", "Back.png"]);

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).unwrap();
        let mut png = Vec::new();
        std::io::Read::read_to_end(&mut entry, &mut png).unwrap();
        assert!(!png.is_empty());

        let decoded = image::load_from_memory(&png).unwrap();
        // 1920x1080 fits 4K at exactly x2
        assert_eq!((decoded.width(), decoded.height()), (3840, 2160));
    }
}

struct TrackingBackend {
    closed: Arc<AtomicBool>,
}

impl RenderBackend for TrackingBackend {
    fn navigate(&mut self, _url: &str) -> Result<()> {
        Ok(())
    }

    fn rasterize(&mut self, _scene: &NormalizedScene, _options: &RasterOptions) -> Result<String> {
        Ok(format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(b"stub-png")
        ))
    }

    fn close(self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test]
async fn one_failing_artboard_rejects_the_batch_and_closes_the_host() {
    // Second artboard's self-reference sits at left=0, which normalization
    // rejects
    let request = download_request(vec![
        artboard("ab-1", "Cover", 100.0, 50.0),
        artboard("ab-2", "Back", 0.0, 50.0),
    ]);

    let closed = Arc::new(AtomicBool::new(false));
    let flag = closed.clone();
    let host = RenderHost::launch_with(move || Ok(TrackingBackend { closed: flag }))
        .await
        .unwrap();

    let result = process_request(host, &request).await;
    assert!(result.is_err(), "batch must fail as a whole");
    assert!(
        closed.load(Ordering::SeqCst),
        "rendering host must be closed on the failure path"
    );
}

#[tokio::test]
async fn invalid_origin_fails_before_any_export() {
    let request = serde_json::from_value::<DownloadRequest>(serde_json::json!({
        "origin": "not a url",
        "artboards": [artboard("ab-1", "Cover", 100.0, 50.0)],
    }))
    .unwrap();

    let closed = Arc::new(AtomicBool::new(false));
    let flag = closed.clone();
    let host = RenderHost::launch_with(move || Ok(TrackingBackend { closed: flag }))
        .await
        .unwrap();

    assert!(process_request(host, &request).await.is_err());
    assert!(closed.load(Ordering::SeqCst));
}
