//! HTTP front end and request orchestration
//!
//! One endpoint: `POST /api/download` takes `{ artboards, origin }`,
//! acquires a rendering host for the duration of the request, navigates it
//! once to `<origin>/artboard`, exports every artboard concurrently, and
//! answers with a zip of `<name>.png` entries.
//!
//! Failure semantics are all-or-nothing: the first artboard failure rejects
//! the whole batch and the caller gets a plain-text `error` body. The
//! status code stays 200 on failure — the design editor's front end keys
//! off the body, not the status, and changing that would break it.

use std::io::Read;

use futures::future;
use log::{error, info};
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::host::RenderHost;
use crate::scene::Artboard;
use crate::{archive, export};

#[cfg(any(feature = "soft", feature = "cdp"))]
use crate::ExportConfig;

/// Body of `POST /api/download`.
#[derive(Debug, Clone, Deserialize)]
pub struct DownloadRequest {
    pub artboards: Vec<Artboard>,
    pub origin: String,
}

/// Export every artboard of a request on an already-launched host and pack
/// the results.
///
/// The host is closed before this returns, on success and on failure; an
/// export error takes precedence over a close error.
pub async fn process_request(host: RenderHost, request: &DownloadRequest) -> Result<Vec<u8>> {
    let outcome = drive(&host, request).await;
    let close_result = host.close().await;
    let bytes = outcome?;
    close_result?;
    Ok(bytes)
}

async fn drive(host: &RenderHost, request: &DownloadRequest) -> Result<Vec<u8>> {
    let origin = request.origin.trim_end_matches('/');
    let page = Url::parse(&format!("{}/artboard", origin))
        .map_err(|e| Error::Navigation(format!("invalid origin '{}': {}", request.origin, e)))?;
    host.goto(page.as_str()).await?;

    let blobs = future::try_join_all(
        request
            .artboards
            .iter()
            .map(|artboard| export::export_artboard(host, artboard)),
    )
    .await?;

    // try_join_all yields results in input order, so each blob re-associates
    // with its artboard by index regardless of completion order.
    let entries = request
        .artboards
        .iter()
        .zip(blobs)
        .map(|(artboard, bytes)| (format!("{}.png", artboard.name), bytes));

    archive::pack(entries)
}

/// Launch a per-request rendering host and run the full export.
#[cfg(any(feature = "soft", feature = "cdp"))]
pub async fn handle_download(config: ExportConfig, request: &DownloadRequest) -> Result<Vec<u8>> {
    let host = RenderHost::launch(config).await?;
    process_request(host, request).await
}

/// The export service's HTTP server.
#[cfg(any(feature = "soft", feature = "cdp"))]
pub struct ExportServer {
    server: tiny_http::Server,
    runtime: tokio::runtime::Runtime,
    config: ExportConfig,
}

#[cfg(any(feature = "soft", feature = "cdp"))]
impl ExportServer {
    /// Bind the server to an address. Pass port 0 to pick an ephemeral one.
    pub fn bind(addr: &str, config: ExportConfig) -> Result<Self> {
        let server = tiny_http::Server::http(addr)
            .map_err(|e| Error::Initialization(format!("failed to bind {}: {}", addr, e)))?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(num_cpus::get())
            .enable_all()
            .build()
            .map_err(|e| Error::Initialization(format!("failed to build runtime: {}", e)))?;

        Ok(Self {
            server,
            runtime,
            config,
        })
    }

    /// The local port the server is listening on.
    pub fn port(&self) -> u16 {
        self.server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .unwrap_or(0)
    }

    /// Serve requests until the process exits. Each accepted request runs
    /// on its own thread; async export work is driven on the shared
    /// runtime.
    pub fn run(self) {
        info!("server started on port {}", self.port());

        for request in self.server.incoming_requests() {
            let handle = self.runtime.handle().clone();
            let config = self.config.clone();
            std::thread::spawn(move || respond(request, &handle, config));
        }
    }
}

#[cfg(any(feature = "soft", feature = "cdp"))]
fn respond(mut request: tiny_http::Request, handle: &tokio::runtime::Handle, config: ExportConfig) {
    use tiny_http::{Method, Response};

    let path = request.url().split('?').next().unwrap_or("").to_string();
    let method = request.method().clone();

    match (method, path.as_str()) {
        (Method::Post, "/api/download") => {
            let mut body = String::new();
            let outcome = request
                .as_reader()
                .read_to_string(&mut body)
                .map_err(|e| Error::Request(format!("failed to read body: {}", e)))
                .and_then(|_| Ok(serde_json::from_str::<DownloadRequest>(&body)?))
                .and_then(|download| handle.block_on(handle_download(config, &download)));

            let result = match outcome {
                Ok(bytes) => request.respond(
                    Response::from_data(bytes)
                        .with_header(header("Content-Type", "application/zip"))
                        .with_header(header(
                            "Content-Disposition",
                            "attachment; filename=Artboards.zip",
                        ))
                        .with_header(cors_header()),
                ),
                Err(err) => {
                    error!("export failed: {}", err);
                    // Status stays 200; the caller keys off the body
                    request.respond(Response::from_string("error").with_header(cors_header()))
                }
            };
            if let Err(e) = result {
                error!("failed to send response: {}", e);
            }
        }
        (Method::Get, "/api/download") => {
            info!("GET /api/download");
            let _ = request.respond(Response::empty(200).with_header(cors_header()));
        }
        (Method::Options, _) => {
            let _ = request.respond(
                Response::empty(204)
                    .with_header(cors_header())
                    .with_header(header(
                        "Access-Control-Allow-Methods",
                        "GET, POST, OPTIONS",
                    ))
                    .with_header(header("Access-Control-Allow-Headers", "Content-Type")),
            );
        }
        _ => {
            let _ = request.respond(Response::empty(404));
        }
    }
}

#[cfg(any(feature = "soft", feature = "cdp"))]
fn header(name: &str, value: &str) -> tiny_http::Header {
    tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes())
        .expect("static header is well-formed")
}

#[cfg(any(feature = "soft", feature = "cdp"))]
fn cors_header() -> tiny_http::Header {
    header("Access-Control-Allow-Origin", "*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_request_deserializes() {
        let body = serde_json::json!({
            "origin": "http://localhost:3000",
            "artboards": [
                { "id": "ab-1", "name": "Cover", "width": 1920, "height": 1080,
                  "state": { "objects": [] } }
            ]
        });
        let request: DownloadRequest = serde_json::from_value(body).unwrap();
        assert_eq!(request.origin, "http://localhost:3000");
        assert_eq!(request.artboards.len(), 1);
        assert_eq!(request.artboards[0].name, "Cover");
    }

    #[test]
    fn download_request_rejects_missing_fields() {
        let body = serde_json::json!({ "artboards": [] });
        assert!(serde_json::from_value::<DownloadRequest>(body).is_err());
    }
}
