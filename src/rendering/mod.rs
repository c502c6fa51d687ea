//! Rendering pipeline: card geometry, paint commands, and the rasterizer.

pub mod layout;
pub mod paint;
pub mod raster;

use image::RgbImage;

/// The rasterizer's output: a fresh bitmap plus its true pixel dimensions.
///
/// Width and height are load-bearing; the PDF composer derives its page size
/// from them rather than from the nominal physical constant, because rounding
/// at the pixel-ratio step can shift the aspect ratio slightly.
#[derive(Debug, Clone)]
pub struct Raster {
    pub pixels: RgbImage,
    pub width: u32,
    pub height: u32,
    /// Set when a painted asset came from an origin outside the policy; a
    /// blocked raster must not be read back into an encoded image.
    pub readback_blocked: bool,
}
