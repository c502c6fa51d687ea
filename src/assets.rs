//! Binary-asset resolution for card rendering.
//!
//! A card references up to three raster assets (photo, signature, seal),
//! each either a freshly captured `data:` URL or a server-hosted URL. The
//! loader resolves them up front so the rasterizer never blocks mid-paint,
//! and applies an origin policy analogous to canvas CORS rules: an asset
//! served from outside the allowed origins is still painted, but the
//! resulting surface refuses PNG read-back.

use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::DynamicImage;
use reqwest::blocking::Client;
use url::Url;

use crate::error::{Error, Result};
use crate::ExportConfig;

/// One of the card's three asset windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSlot {
    Photo,
    Sign,
    Seal,
}

/// Where an asset's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// Inline `data:image/...;base64,` payload (unsaved local capture).
    DataUrl(String),
    /// Absolute or API-relative URL of a persisted asset.
    Remote(String),
}

impl AssetSource {
    pub fn from_value(value: &str) -> AssetSource {
        if value.starts_with("data:") {
            AssetSource::DataUrl(value.to_string())
        } else {
            AssetSource::Remote(value.to_string())
        }
    }
}

/// Asset sources captured into a scene at composition time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneAssets {
    pub photo: Option<AssetSource>,
    pub sign: Option<AssetSource>,
    pub seal: Option<AssetSource>,
}

impl SceneAssets {
    pub fn get(&self, slot: AssetSlot) -> Option<&AssetSource> {
        match slot {
            AssetSlot::Photo => self.photo.as_ref(),
            AssetSlot::Sign => self.sign.as_ref(),
            AssetSlot::Seal => self.seal.as_ref(),
        }
    }
}

/// A decoded asset plus its origin classification.
#[derive(Debug, Clone)]
pub struct LoadedAsset {
    pub image: DynamicImage,
    /// True when the asset came from an origin outside the policy; the
    /// raster containing it must not be read back.
    pub cross_origin: bool,
}

/// All of a scene's assets after resolution. Missing entries paint as
/// placeholder regions; they are tolerated, not fatal.
#[derive(Debug, Clone, Default)]
pub struct ResolvedAssets {
    pub photo: Option<LoadedAsset>,
    pub sign: Option<LoadedAsset>,
    pub seal: Option<LoadedAsset>,
}

impl ResolvedAssets {
    pub fn get(&self, slot: AssetSlot) -> Option<&LoadedAsset> {
        match slot {
            AssetSlot::Photo => self.photo.as_ref(),
            AssetSlot::Sign => self.sign.as_ref(),
            AssetSlot::Seal => self.seal.as_ref(),
        }
    }

    /// Whether any painted asset blocks surface read-back.
    pub fn readback_blocked(&self) -> bool {
        [&self.photo, &self.sign, &self.seal]
            .into_iter()
            .flatten()
            .any(|a| a.cross_origin)
    }
}

/// Decode a `data:image/...;base64,` URL into pixels.
pub fn decode_data_url(value: &str) -> Option<DynamicImage> {
    let payload = value.split_once("base64,")?.1;
    let bytes = BASE64.decode(payload.trim()).ok()?;
    image::load_from_memory(&bytes).ok()
}

/// Resolves scene assets ahead of rasterization.
pub struct AssetLoader {
    http: Client,
    base: Option<Url>,
    allowed: Vec<String>,
}

impl AssetLoader {
    pub fn new(config: &ExportConfig) -> Result<AssetLoader> {
        let http = Client::builder()
            .timeout(Duration::from_millis(config.asset_timeout_ms))
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build asset client: {}", e)))?;

        let base = Url::parse(&config.api_base_url).ok();
        let mut allowed: Vec<String> = Vec::new();
        if let Some(origin) = base.as_ref().map(|u| u.origin().ascii_serialization()) {
            allowed.push(origin);
        }
        for extra in &config.allowed_asset_origins {
            match Url::parse(extra) {
                Ok(u) => allowed.push(u.origin().ascii_serialization()),
                Err(_) => allowed.push(extra.trim_end_matches('/').to_string()),
            }
        }

        Ok(AssetLoader { http, base, allowed })
    }

    /// Resolve every scene asset. Fetch and decode failures degrade to a
    /// missing asset; only origin policy marks the result as blocked.
    pub fn resolve(&self, assets: &SceneAssets) -> ResolvedAssets {
        ResolvedAssets {
            photo: assets.photo.as_ref().and_then(|s| self.load(s, AssetSlot::Photo)),
            sign: assets.sign.as_ref().and_then(|s| self.load(s, AssetSlot::Sign)),
            seal: assets.seal.as_ref().and_then(|s| self.load(s, AssetSlot::Seal)),
        }
    }

    fn load(&self, source: &AssetSource, slot: AssetSlot) -> Option<LoadedAsset> {
        match source {
            AssetSource::DataUrl(value) => {
                let image = decode_data_url(value);
                if image.is_none() {
                    log::warn!("Discarding undecodable data URL for {:?}", slot);
                }
                image.map(|image| LoadedAsset { image, cross_origin: false })
            }
            AssetSource::Remote(value) => {
                let url = self.absolutize(value)?;
                let cross_origin = !self.origin_allowed(&url);
                match self.fetch(&url) {
                    Some(image) => Some(LoadedAsset { image, cross_origin }),
                    None => {
                        log::warn!("Asset fetch failed for {:?} ({}); painting placeholder", slot, url);
                        None
                    }
                }
            }
        }
    }

    fn absolutize(&self, value: &str) -> Option<Url> {
        match Url::parse(value) {
            Ok(url) => Some(url),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base.as_ref().and_then(|b| b.join(value).ok())
            }
            Err(_) => None,
        }
    }

    fn origin_allowed(&self, url: &Url) -> bool {
        let origin = url.origin().ascii_serialization();
        self.allowed.iter().any(|a| a == &origin)
    }

    fn fetch(&self, url: &Url) -> Option<DynamicImage> {
        let response = self.http.get(url.clone()).send().ok()?;
        if !response.status().is_success() {
            return None;
        }
        let bytes = response.bytes().ok()?;
        image::load_from_memory(&bytes).ok()
    }
}
