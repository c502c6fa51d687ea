//! PNG encoding and read-back of a rasterized card surface.
//!
//! Encoding is deterministic: the same bitmap always yields the same PNG
//! bytes, which is what makes golden-raster tests and the re-export
//! idempotence guarantee possible.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{Error, Result};
use crate::rendering::Raster;

/// An encoded raster ready for download or PDF embedding.
///
/// `rgb` keeps the raw pixel data alongside the PNG bytes because the PDF
/// composer embeds pixels directly rather than re-decoding the PNG.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub png: Vec<u8>,
    pub rgb: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    /// The encoded image as a `data:image/png;base64,` URL.
    pub fn data_url(&self) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(&self.png))
    }
}

/// Serialize a raster to PNG.
///
/// A zero-sized surface or one whose read-back is blocked by the asset
/// origin policy fails with [`Error::EncodingFailed`]; the distinction from
/// a generic error matters because the user remedy differs (pick a
/// same-origin photo source vs simply retrying).
pub fn encode_png(raster: &Raster) -> Result<EncodedImage> {
    if raster.width == 0 || raster.height == 0 {
        return Err(Error::EncodingFailed(format!(
            "Raster surface is zero-sized ({}x{})",
            raster.width, raster.height
        )));
    }
    if raster.readback_blocked {
        return Err(Error::EncodingFailed(
            "Surface read-back blocked by a cross-origin asset".to_string(),
        ));
    }

    let rgb = raster.pixels.as_raw().clone();
    let mut png = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut png, raster.width, raster.height);
        encoder.set_color(png::ColorType::Rgb);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .map_err(|e| Error::EncodingFailed(format!("PNG header write failed: {}", e)))?;
        writer
            .write_image_data(&rgb)
            .map_err(|e| Error::EncodingFailed(format!("PNG data write failed: {}", e)))?;
    }

    Ok(EncodedImage {
        png,
        rgb,
        width: raster.width,
        height: raster.height,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn raster(width: u32, height: u32, blocked: bool) -> Raster {
        Raster {
            pixels: RgbImage::from_pixel(width.max(1), height.max(1), image::Rgb([9, 9, 9])),
            width,
            height,
            readback_blocked: blocked,
        }
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = encode_png(&raster(8, 4, false)).unwrap();
        let b = encode_png(&raster(8, 4, false)).unwrap();
        assert_eq!(a.png, b.png);
        assert_eq!(a.width, 8);
        assert_eq!(a.height, 4);
        assert_eq!(a.rgb.len(), 8 * 4 * 3);
        // PNG magic.
        assert_eq!(&a.png[..4], &[0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn data_url_carries_the_png_payload() {
        let encoded = encode_png(&raster(2, 2, false)).unwrap();
        let url = encoded.data_url();
        assert!(url.starts_with("data:image/png;base64,"));
        let payload = url.split_once("base64,").unwrap().1;
        assert_eq!(BASE64.decode(payload).unwrap(), encoded.png);
    }

    #[test]
    fn zero_sized_surface_is_an_encoding_failure() {
        let err = encode_png(&raster(0, 4, false)).unwrap_err();
        assert!(matches!(err, Error::EncodingFailed(_)));
    }

    #[test]
    fn blocked_readback_is_an_encoding_failure() {
        let err = encode_png(&raster(8, 4, true)).unwrap_err();
        assert!(matches!(err, Error::EncodingFailed(_)));
    }
}
