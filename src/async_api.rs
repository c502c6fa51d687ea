use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;

use tokio::sync::oneshot;

use crate::export::{Exporter, PageLayout, ScenePreview};
use crate::rendering::paint::CardScene;
use crate::{Error, ExportConfig, Result};

enum Command {
    ExportPng(CardScene, String, PathBuf, oneshot::Sender<Result<PathBuf>>),
    ExportPdf(
        CardScene,
        String,
        PageLayout,
        PathBuf,
        oneshot::Sender<Result<PathBuf>>,
    ),
    Close(oneshot::Sender<Result<()>>),
}

/// An async-friendly export service backed by a dedicated worker thread.
///
/// The worker thread owns a synchronous `Exporter` and executes commands
/// sent from async tasks, so callers can drive exports from async code
/// without the exporter needing to be shared across threads. Scenes travel
/// by value: each command snapshots whatever the caller composed at send
/// time, mirroring how concurrent exports read independent DOM states.
#[derive(Clone)]
pub struct ExportService {
    cmd_tx: Sender<Command>,
}

impl ExportService {
    /// Create a new service (spawns a background thread that owns the
    /// exporter).
    pub async fn new(config: ExportConfig) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx): (oneshot::Sender<Result<()>>, oneshot::Receiver<Result<()>>) =
            oneshot::channel();

        thread::spawn(move || {
            // Initialize the exporter on the worker thread
            let exporter = match Exporter::new(config) {
                Ok(e) => e,
                Err(err) => {
                    let _ = init_tx.send(Err(err));
                    return;
                }
            };

            let _ = init_tx.send(Ok(()));

            let mut preview = ScenePreview::new();

            // Command loop
            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    Command::ExportPng(scene, file_base, out_dir, resp) => {
                        preview.attach(scene);
                        let res = exporter.export_png(&preview, &file_base, &out_dir);
                        preview.detach();
                        let _ = resp.send(res);
                    }
                    Command::ExportPdf(scene, file_base, layout, out_dir, resp) => {
                        preview.attach(scene);
                        let res = exporter.export_pdf(&preview, &file_base, layout, &out_dir);
                        preview.detach();
                        let _ = resp.send(res);
                    }
                    Command::Close(resp) => {
                        let _ = resp.send(Ok(()));
                        break;
                    }
                }
            }
        });

        // Wait for the worker to report initialization success or failure
        let init_res = init_rx
            .await
            .map_err(|e| Error::Other(format!("Worker init canceled: {}", e)))?;
        init_res?;

        Ok(Self { cmd_tx })
    }

    /// Export a composed scene as PNG; resolves to the written path.
    pub async fn export_png(
        &self,
        scene: CardScene,
        file_base: &str,
        out_dir: &std::path::Path,
    ) -> Result<PathBuf> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::ExportPng(
            scene,
            file_base.to_string(),
            out_dir.to_path_buf(),
            tx,
        ));
        rx.await
            .map_err(|e| Error::Other(format!("ExportPng canceled: {}", e)))?
    }

    /// Export a composed scene as a single-page PDF; resolves to the path.
    pub async fn export_pdf(
        &self,
        scene: CardScene,
        file_base: &str,
        layout: PageLayout,
        out_dir: &std::path::Path,
    ) -> Result<PathBuf> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::ExportPdf(
            scene,
            file_base.to_string(),
            layout,
            out_dir.to_path_buf(),
            tx,
        ));
        rx.await
            .map_err(|e| Error::Other(format!("ExportPdf canceled: {}", e)))?
    }

    /// Shutdown the background worker.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        let _ = self.cmd_tx.send(Command::Close(tx));
        rx.await
            .map_err(|e| Error::Other(format!("Close canceled: {}", e)))?
    }
}
