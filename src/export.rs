//! Export orchestration: rasterize → encode → (compose) → write.
//!
//! Every export runs the full sequence from scratch; card content may have
//! changed between calls, so nothing is cached. Failures surface as typed
//! errors and leave no partial artifact behind: the file is written in a
//! single operation only after the whole pipeline has succeeded.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::assets::AssetLoader;
use crate::card::export_file_name;
use crate::encode::{self, EncodedImage};
use crate::error::{Error, Result};
use crate::fonts::FontBook;
use crate::pdf;
use crate::rendering::paint::CardScene;
use crate::rendering::raster::{rasterize, RasterOptions, RenderTarget};
use crate::ExportConfig;

pub use crate::pdf::PageLayout;

/// The attachable off-screen render target.
///
/// The preview layer is the exclusive writer: it attaches a freshly composed
/// scene whenever the form changes and detaches it on unmount. The exporter
/// only reads through [`RenderTarget`].
#[derive(Debug, Default)]
pub struct ScenePreview {
    scene: Option<CardScene>,
}

impl ScenePreview {
    pub fn new() -> ScenePreview {
        ScenePreview::default()
    }

    pub fn attach(&mut self, scene: CardScene) {
        self.scene = Some(scene);
    }

    pub fn detach(&mut self) {
        self.scene = None;
    }
}

impl RenderTarget for ScenePreview {
    fn render_target(&self) -> Option<&CardScene> {
        self.scene.as_ref()
    }
}

// Clears the busy flag even when the pipeline errors out mid-sequence.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Public entry point of the export pipeline.
pub struct Exporter {
    config: ExportConfig,
    assets: AssetLoader,
    busy: AtomicBool,
}

impl Exporter {
    pub fn new(config: ExportConfig) -> Result<Exporter> {
        let assets = AssetLoader::new(&config)?;
        Ok(Exporter {
            config,
            assets,
            busy: AtomicBool::new(false),
        })
    }

    /// Whether an export is currently in flight. Callers are expected to
    /// check this before invoking a second export from the same affordance;
    /// re-entrant calls are not queued or rejected here.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Export the target as PNG into `out_dir`. Resolves to the written path.
    pub fn export_png(
        &self,
        target: &dyn RenderTarget,
        file_base: &str,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        self.busy.store(true, Ordering::SeqCst);
        let _guard = BusyGuard(&self.busy);

        let encoded = self.snapshot(target)?;
        let path = out_dir.join(export_file_name(file_base, "png"));
        write_artifact(&path, &encoded.png)?;
        log::info!("Exported PNG {}", path.display());
        Ok(path)
    }

    /// Export the target as a single-page PDF into `out_dir`.
    pub fn export_pdf(
        &self,
        target: &dyn RenderTarget,
        file_base: &str,
        layout: PageLayout,
        out_dir: &Path,
    ) -> Result<PathBuf> {
        self.busy.store(true, Ordering::SeqCst);
        let _guard = BusyGuard(&self.busy);

        let encoded = self.snapshot(target)?;
        let spec = pdf::page_spec(layout, encoded.width, encoded.height)?;
        let bytes = pdf::compose(&encoded, &spec)?;
        let path = out_dir.join(export_file_name(file_base, "pdf"));
        write_artifact(&path, &bytes)?;
        log::info!(
            "Exported PDF {} ({:.1}mm x {:.1}mm)",
            path.display(),
            spec.width_mm,
            spec.height_mm
        );
        Ok(path)
    }

    // The sequenced front half shared by both formats: settle resources,
    // rasterize, encode. Each step completes fully before the next starts.
    fn snapshot(&self, target: &dyn RenderTarget) -> Result<EncodedImage> {
        let scene = target.render_target().ok_or(Error::RenderTargetMissing)?;

        let fonts = FontBook::resolve(
            &self.config.font_paths,
            self.config.search_system_fonts,
            Duration::from_millis(self.config.font_deadline_ms),
        );
        if !fonts.ready() {
            log::warn!("No card font resolved; rasterizing with fallback glyphs");
        }
        let resolved = self.assets.resolve(&scene.assets);

        let raster = rasterize(
            scene,
            &resolved,
            &fonts,
            RasterOptions {
                pixel_ratio: self.config.pixel_ratio,
                background: self.config.background,
            },
        )?;
        encode::encode_png(&raster)
    }
}

fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes)
        .map_err(|e| Error::Other(format!("Failed to write {}: {}", path.display(), e)))
}
