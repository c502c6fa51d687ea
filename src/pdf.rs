//! Single-page PDF composition around an encoded card raster.
//!
//! The page is sized from the encoded image's true pixel aspect ratio, not
//! from the nominal physical constant; sub-pixel rounding during
//! rasterization can shift the ratio slightly, and trusting the constant
//! would letterbox or crop the placed image.

use printpdf::{ColorBits, ColorSpace, Image, ImageTransform, ImageXObject, Mm, PdfDocument, Px};

use crate::encode::EncodedImage;
use crate::error::{Error, Result};

/// Page orientation, derived from the final page box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Caller-side page convention: reference width plus an optional uniform
/// margin. The margin is a call-site decision, not a pipeline invariant.
#[derive(Debug, Clone, Copy)]
pub struct PageLayout {
    pub page_width_mm: f32,
    pub margin_mm: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            page_width_mm: crate::rendering::layout::CARD_FACE.width_mm,
            margin_mm: 0.0,
        }
    }
}

/// A fully derived page box. `content_*` is the box the image spans; with a
/// zero margin it coincides with the page and the page ratio equals the
/// image's pixel ratio exactly.
#[derive(Debug, Clone, Copy)]
pub struct PageSpec {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_mm: f32,
    pub content_width_mm: f32,
    pub content_height_mm: f32,
    pub orientation: Orientation,
}

/// Derive the page box for an image of `px_width` × `px_height` pixels.
///
/// Content height is always `content_width × px_height / px_width`; the
/// nominal 54:87 constant never enters this computation.
pub fn page_spec(layout: PageLayout, px_width: u32, px_height: u32) -> Result<PageSpec> {
    if px_width == 0 || px_height == 0 {
        return Err(Error::PageCompositionFailed(format!(
            "Degenerate image dimensions {}x{}",
            px_width, px_height
        )));
    }
    if !layout.page_width_mm.is_finite() || layout.page_width_mm <= 0.0 {
        return Err(Error::PageCompositionFailed(format!(
            "Invalid page width {}mm",
            layout.page_width_mm
        )));
    }
    if !layout.margin_mm.is_finite() || layout.margin_mm < 0.0 {
        return Err(Error::PageCompositionFailed(format!(
            "Invalid margin {}mm",
            layout.margin_mm
        )));
    }

    let content_width = layout.page_width_mm - 2.0 * layout.margin_mm;
    if content_width <= 0.0 {
        return Err(Error::PageCompositionFailed(format!(
            "Margin {}mm leaves no content box on a {}mm page",
            layout.margin_mm, layout.page_width_mm
        )));
    }
    let content_height = content_width * px_height as f32 / px_width as f32;
    if !content_height.is_finite() || content_height <= 0.0 {
        return Err(Error::PageCompositionFailed(format!(
            "Derived page height is not finite ({})",
            content_height
        )));
    }

    let width_mm = layout.page_width_mm;
    let height_mm = content_height + 2.0 * layout.margin_mm;
    Ok(PageSpec {
        width_mm,
        height_mm,
        margin_mm: layout.margin_mm,
        content_width_mm: content_width,
        content_height_mm: content_height,
        orientation: if height_mm >= width_mm {
            Orientation::Portrait
        } else {
            Orientation::Landscape
        },
    })
}

/// Compose the single-page document: the encoded raster placed on a page
/// sized per `spec`, spanning the content box exactly.
pub fn compose(encoded: &EncodedImage, spec: &PageSpec) -> Result<Vec<u8>> {
    let (doc, page, layer) = PdfDocument::new(
        "ID Card",
        Mm(spec.width_mm as f64),
        Mm(spec.height_mm as f64),
        "Card",
    );

    let xobject = ImageXObject {
        width: Px(encoded.width as usize),
        height: Px(encoded.height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: encoded.rgb.clone(),
        image_filter: None,
        smask: None,
        clipping_bbox: None,
    };

    // printpdf sizes a placed image as pixels / dpi; pick the dpi that makes
    // the pixel width span the content box.
    let dpi = encoded.width as f64 * 25.4 / spec.content_width_mm as f64;
    Image::from(xobject).add_to_layer(
        doc.get_page(page).get_layer(layer),
        ImageTransform {
            translate_x: Some(Mm(spec.margin_mm as f64)),
            translate_y: Some(Mm(spec.margin_mm as f64)),
            dpi: Some(dpi),
            ..Default::default()
        },
    );

    doc.save_to_bytes()
        .map_err(|e| Error::PageCompositionFailed(format!("PDF serialization failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::encode_png;
    use crate::rendering::Raster;
    use image::RgbImage;

    fn encoded(width: u32, height: u32) -> EncodedImage {
        encode_png(&Raster {
            pixels: RgbImage::from_pixel(width, height, image::Rgb([120, 90, 30])),
            width,
            height,
            readback_blocked: false,
        })
        .unwrap()
    }

    #[test]
    fn page_ratio_tracks_the_pixel_ratio_exactly() {
        for (w, h) in [(612u32, 1010u32), (100, 100), (300, 170), (1, 1000)] {
            let spec = page_spec(PageLayout::default(), w, h).unwrap();
            let page_ratio = spec.height_mm / spec.width_mm;
            let pixel_ratio = h as f32 / w as f32;
            assert!(
                (page_ratio - pixel_ratio).abs() < 1e-4,
                "{}x{}: {} vs {}",
                w,
                h,
                page_ratio,
                pixel_ratio
            );
        }
    }

    #[test]
    fn orientation_follows_the_derived_page_box() {
        let portrait = page_spec(PageLayout::default(), 612, 1010).unwrap();
        assert_eq!(portrait.orientation, Orientation::Portrait);
        let landscape = page_spec(PageLayout::default(), 1010, 612).unwrap();
        assert_eq!(landscape.orientation, Orientation::Landscape);
        // A square page counts as portrait.
        let square = page_spec(PageLayout::default(), 500, 500).unwrap();
        assert_eq!(square.orientation, Orientation::Portrait);
    }

    #[test]
    fn margins_inset_the_content_box_not_the_ratio() {
        let layout = PageLayout { page_width_mm: 54.0, margin_mm: 2.0 };
        let spec = page_spec(layout, 612, 1010).unwrap();
        assert_eq!(spec.width_mm, 54.0);
        assert!((spec.content_width_mm - 50.0).abs() < 1e-6);
        let content_ratio = spec.content_height_mm / spec.content_width_mm;
        assert!((content_ratio - 1010.0 / 612.0).abs() < 1e-4);
    }

    #[test]
    fn degenerate_inputs_fail_composition() {
        assert!(matches!(
            page_spec(PageLayout::default(), 0, 100).unwrap_err(),
            Error::PageCompositionFailed(_)
        ));
        assert!(matches!(
            page_spec(PageLayout::default(), 100, 0).unwrap_err(),
            Error::PageCompositionFailed(_)
        ));
        assert!(matches!(
            page_spec(PageLayout { page_width_mm: f32::NAN, margin_mm: 0.0 }, 10, 10).unwrap_err(),
            Error::PageCompositionFailed(_)
        ));
        assert!(matches!(
            page_spec(PageLayout { page_width_mm: 54.0, margin_mm: 27.0 }, 10, 10).unwrap_err(),
            Error::PageCompositionFailed(_)
        ));
    }

    #[test]
    fn composed_document_is_a_pdf() {
        let encoded = encoded(12, 20);
        let spec = page_spec(PageLayout::default(), encoded.width, encoded.height).unwrap();
        let bytes = compose(&encoded, &spec).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
