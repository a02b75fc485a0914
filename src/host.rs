use std::sync::mpsc::{self, Sender};
use std::thread;
use tokio::sync::oneshot;

use crate::error::{Error, Result};
use crate::export::RasterOptions;
use crate::scene::NormalizedScene;
use crate::RenderBackend;
#[cfg(any(feature = "soft", feature = "cdp"))]
use crate::ExportConfig;

enum Command {
    Goto(String, oneshot::Sender<Result<()>>),
    Rasterize(
        NormalizedScene,
        RasterOptions,
        oneshot::Sender<Result<String>>,
    ),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly rendering host backed by a dedicated worker thread.
///
/// The worker thread owns a synchronous [`RenderBackend`] instance and
/// executes commands sent from async tasks, so per-artboard export tasks can
/// share one host concurrently without requiring the backend to be `Send`
/// across threads. Each command resolves exactly once through its oneshot
/// reply channel.
///
/// A host is acquired per export request and must not outlive it. Dropping
/// the last handle without calling [`RenderHost::close`] ends the worker
/// loop and drops the backend, so the underlying process is released on
/// every exit path.
#[derive(Clone)]
pub struct RenderHost {
    cmd_tx: Sender<Command>,
}

impl RenderHost {
    /// Launch a host with the default backend for the enabled features.
    #[cfg(any(feature = "soft", feature = "cdp"))]
    pub async fn launch(config: ExportConfig) -> Result<Self> {
        Self::launch_with(move || crate::new_backend(config)).await
    }

    /// Launch a host around an arbitrary backend factory. The factory runs
    /// on the worker thread, so the backend itself never crosses threads.
    pub async fn launch_with<B, F>(factory: F) -> Result<Self>
    where
        B: RenderBackend,
        F: FnOnce() -> Result<B> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Initialize the backend on the worker thread
            let mut backend = match factory() {
                Ok(b) => b,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            let _ = init_tx.send(Ok(()));

            // Command loop; ends on Close or when all handles are dropped
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::Goto(url, resp) => {
                        let res = backend.navigate(&url);
                        let _ = resp.send(res);
                    }
                    Command::Rasterize(scene, options, resp) => {
                        let res = backend.rasterize(&scene, &options);
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let res = backend.close();
                        let _ = resp.send(res);
                        return;
                    }
                }
            }

            // Handles dropped without an explicit close; release the backend
            let _ = backend.close();
        });

        let init_res = init_rx
            .await
            .map_err(|e| Error::Initialization(format!("worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Navigate the hosting page to a URL and wait for it to be ready.
    pub async fn goto(&self, url: &str) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Goto(url.to_string(), tx));
        rx.await
            .map_err(|e| Error::Other(format!("goto canceled: {}", e)))?
    }

    /// Rasterize a normalized scene to a PNG data URL.
    pub async fn rasterize(&self, scene: NormalizedScene, options: RasterOptions) -> Result<String> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Rasterize(scene, options, tx));
        rx.await
            .map_err(|e| Error::Other(format!("rasterize canceled: {}", e)))?
    }

    /// Shut down the worker and close the backend.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("close canceled: {}", e)))?
    }
}
