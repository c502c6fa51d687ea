//! Entrypass Card Engine
//!
//! A headless rendering and export toolkit for railway-contractor employee
//! ID cards. It composes a two-faced card scene from a record, rasterizes it
//! at print resolution, and exports PNG or a correctly-sized single-page PDF,
//! alongside a client for the card service's REST contract.
//!
//! # Features
//!
//! - **Export Pipeline**: scene → raster → PNG → PDF, strictly sequenced
//! - **Asset Policy**: remote card assets follow a canvas-style origin rule;
//!   foreign-origin assets paint but block PNG read-back
//! - **Best-Effort Fonts**: font resolution is deadline-bounded and a missing
//!   face falls back to block glyphs rather than failing the export
//!
//! # Example
//!
//! ```no_run
//! use entrypass::card::{AssetPreviews, CardRecord, CardView};
//! use entrypass::export::{Exporter, PageLayout, ScenePreview};
//! use entrypass::rendering::paint::compose_sheet;
//! use entrypass::ExportConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExportConfig::default();
//! let record = CardRecord {
//!     employee_name: "Ravi Kumar".to_string(),
//!     ..Default::default()
//! };
//! let view = CardView::new(&record, &AssetPreviews::default());
//! let scene = compose_sheet(&view, &config)?;
//!
//! let mut preview = ScenePreview::new();
//! preview.attach(scene);
//!
//! let exporter = Exporter::new(config)?;
//! exporter.export_png(&preview, record.file_base(), ".".as_ref())?;
//! exporter.export_pdf(&preview, record.file_base(), PageLayout::default(), ".".as_ref())?;
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result};

pub mod api;
pub mod assets;
pub mod card;
pub mod encode;
pub mod export;
pub mod fonts;
pub mod pdf;
pub mod qr;
pub mod rendering;
pub mod session;

// Async-friendly export API (worker-backed abstraction)
pub mod async_api;

// Re-export the service handle at the crate root for ergonomic examples
pub use async_api::ExportService;

use api::UpdateFieldMode;
use qr::QrStrategy;
use rendering::paint::{Rgb, WHITE};

/// Configuration for the card engine
///
/// One shared config drives scene composition, rasterization, asset policy,
/// and the REST client. The defaults are chosen to match the printed card:
/// - `pixel_ratio` is 3×, print quality on a 54mm-wide face
/// - the export background is opaque white; several card regions rely on
///   white backing that an off-tree raster does not otherwise guarantee
///
/// # Examples
///
/// ```
/// let cfg = entrypass::ExportConfig::default();
/// assert_eq!(cfg.pixel_ratio, 3.0);
/// ```
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Output scale applied to the scene's reference pixels (supported 1–4)
    pub pixel_ratio: f32,
    /// Opaque color painted before any scene command
    pub background: Rgb,
    /// Font files probed first, before any well-known location
    pub font_paths: Vec<PathBuf>,
    /// Whether to probe well-known system font locations
    pub search_system_fonts: bool,
    /// Deadline for font resolution in milliseconds; expiry falls back to
    /// block glyphs, never an error
    pub font_deadline_ms: u64,
    /// Which payload the card's QR glyph carries
    pub qr_strategy: QrStrategy,
    /// Base URL of the public verification page embedded in QR codes
    pub verify_base_url: String,
    /// Base URL of the card REST service
    pub api_base_url: String,
    /// Extra origins whose assets may be read back (the API origin is always
    /// allowed)
    pub allowed_asset_origins: Vec<String>,
    /// Timeout for REST calls in milliseconds
    pub request_timeout_ms: u64,
    /// Timeout per asset fetch in milliseconds
    pub asset_timeout_ms: u64,
    /// How update payloads treat empty form fields
    pub update_field_mode: UpdateFieldMode,
    /// Where the session bearer token is persisted
    pub token_path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pixel_ratio: 3.0,
            background: WHITE,
            font_paths: Vec::new(),
            search_system_fonts: true,
            font_deadline_ms: 1500,
            qr_strategy: QrStrategy::default(),
            verify_base_url: "https://entrypass.example".to_string(),
            api_base_url: "https://api.entrypass.example".to_string(),
            allowed_asset_origins: Vec::new(),
            request_timeout_ms: 30000,
            asset_timeout_ms: 10000,
            update_field_mode: UpdateFieldMode::default(),
            token_path: session::default_token_path(),
        }
    }
}
