//! Scene rasterizer: turns a composed card scene into a pixel bitmap.
//!
//! The rasterizer is a read-only consumer; it never mutates the scene it
//! snapshots. All async resources are settled before any pixel is written:
//! fonts arrive pre-resolved in a [`FontBook`] and assets pre-fetched in a
//! [`ResolvedAssets`], so painting itself is pure and deterministic.

use image::imageops::FilterType;
use image::RgbImage;
use rusttype::{point, Font, Scale};

use crate::assets::ResolvedAssets;
use crate::error::{Error, Result};
use crate::fonts::FontBook;
use crate::qr::QrMatrix;
use crate::rendering::paint::{CardScene, FontWeight, PaintCommand, Rgb, TextAlign};
use crate::rendering::layout::Rect;
use crate::rendering::Raster;

/// Placeholder tone painted where an asset window resolved to nothing.
const PLACEHOLDER: Rgb = [222, 222, 222];
const PLACEHOLDER_EDGE: Rgb = [170, 170, 170];

/// Capability interface exposing a snapshot target to an imperative caller.
///
/// The preview layer owns and mutates the scene; the export pipeline only
/// ever reads it through this accessor. A `None` return means the target is
/// detached and an export must fail with [`Error::RenderTargetMissing`]
/// before any pixel work happens.
pub trait RenderTarget {
    fn render_target(&self) -> Option<&CardScene>;
}

/// Rasterization knobs. `pixel_ratio` multiplies the scene's reference
/// pixels; 3× yields print-quality output on a 54mm-wide face.
#[derive(Debug, Clone, Copy)]
pub struct RasterOptions {
    pub pixel_ratio: f32,
    pub background: Rgb,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: 3.0,
            background: [255, 255, 255],
        }
    }
}

/// Rasterize a scene at the requested pixel ratio.
///
/// The output bitmap is produced fresh on every call; nothing is cached.
/// Supported ratios are 1–4; anything else is a configuration error.
pub fn rasterize(
    scene: &CardScene,
    assets: &ResolvedAssets,
    fonts: &FontBook,
    opts: RasterOptions,
) -> Result<Raster> {
    let ratio = opts.pixel_ratio;
    if !ratio.is_finite() || !(1.0..=4.0).contains(&ratio) {
        return Err(Error::ConfigError(format!(
            "Unsupported pixel ratio {} (expected 1-4)",
            ratio
        )));
    }

    let width = (scene.width as f32 * ratio).round() as u32;
    let height = (scene.height as f32 * ratio).round() as u32;
    log::debug!(
        "Rasterizing {}x{} scene at {}x -> {}x{}",
        scene.width,
        scene.height,
        ratio,
        width,
        height
    );

    // Opaque backing first; card graphics assume white behind them.
    let mut pixels = RgbImage::from_pixel(width, height, image::Rgb(opts.background));

    for command in &scene.commands {
        match command {
            PaintCommand::FillRect { rect, color } => {
                fill_rect(&mut pixels, scale_rect(*rect, ratio), *color);
            }
            PaintCommand::StrokeRect { rect, color, width: w } => {
                let stroke = ((*w as f32 * ratio).round() as u32).max(1);
                stroke_rect(&mut pixels, scale_rect(*rect, ratio), *color, stroke);
            }
            PaintCommand::Text { rect, text, size, weight, align, color } => {
                draw_text(
                    &mut pixels,
                    scale_rect(*rect, ratio),
                    text,
                    size * ratio,
                    *weight,
                    *align,
                    *color,
                    fonts.face(),
                );
            }
            PaintCommand::Image { rect, slot } => {
                let target = scale_rect(*rect, ratio);
                match assets.get(*slot) {
                    Some(asset) => draw_cover(&mut pixels, target, &asset.image),
                    None => {
                        fill_rect(&mut pixels, target, PLACEHOLDER);
                        stroke_rect(&mut pixels, target, PLACEHOLDER_EDGE, 1);
                    }
                }
            }
            PaintCommand::QrModules { rect, matrix } => {
                draw_qr(&mut pixels, scale_rect(*rect, ratio), matrix);
            }
        }
    }

    Ok(Raster {
        pixels,
        width,
        height,
        readback_blocked: assets.readback_blocked(),
    })
}

fn scale_rect(rect: Rect, ratio: f32) -> Rect {
    let x0 = (rect.x as f32 * ratio).round() as i32;
    let y0 = (rect.y as f32 * ratio).round() as i32;
    let x1 = ((rect.x + rect.width as i32) as f32 * ratio).round() as i32;
    let y1 = ((rect.y + rect.height as i32) as f32 * ratio).round() as i32;
    Rect::new(x0, y0, (x1 - x0).max(0) as u32, (y1 - y0).max(0) as u32)
}

// Clipped span of a rect against the bitmap, in pixel coordinates.
fn clip(rect: Rect, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = rect.x.max(0) as u32;
    let y0 = rect.y.max(0) as u32;
    let x1 = ((rect.x + rect.width as i32).max(0) as u32).min(width);
    let y1 = ((rect.y + rect.height as i32).max(0) as u32).min(height);
    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0, y0, x1, y1))
}

fn fill_rect(img: &mut RgbImage, rect: Rect, color: Rgb) {
    if let Some((x0, y0, x1, y1)) = clip(rect, img.width(), img.height()) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, image::Rgb(color));
            }
        }
    }
}

fn stroke_rect(img: &mut RgbImage, rect: Rect, color: Rgb, width: u32) {
    let w = rect.width;
    let h = rect.height;
    fill_rect(img, Rect::new(rect.x, rect.y, w, width.min(h)), color);
    fill_rect(
        img,
        Rect::new(rect.x, rect.y + h as i32 - width.min(h) as i32, w, width.min(h)),
        color,
    );
    fill_rect(img, Rect::new(rect.x, rect.y, width.min(w), h), color);
    fill_rect(
        img,
        Rect::new(rect.x + w as i32 - width.min(w) as i32, rect.y, width.min(w), h),
        color,
    );
}

// Cover-fit: scale the asset so it fills the window, cropping overflow.
fn draw_cover(img: &mut RgbImage, rect: Rect, asset: &image::DynamicImage) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let fitted = asset
        .resize_to_fill(rect.width, rect.height, FilterType::Triangle)
        .to_rgb8();
    if let Some((x0, y0, x1, y1)) = clip(rect, img.width(), img.height()) {
        for y in y0..y1 {
            for x in x0..x1 {
                let sx = x as i32 - rect.x;
                let sy = y as i32 - rect.y;
                if sx >= 0 && sy >= 0 && (sx as u32) < fitted.width() && (sy as u32) < fitted.height() {
                    img.put_pixel(x, y, *fitted.get_pixel(sx as u32, sy as u32));
                }
            }
        }
    }
}

// Modules are laid out edge-to-edge across the window so the grid covers it
// without seams regardless of how the division rounds.
fn draw_qr(img: &mut RgbImage, rect: Rect, matrix: &QrMatrix) {
    let n = matrix.size();
    if n == 0 || rect.width == 0 || rect.height == 0 {
        return;
    }
    let step_x = rect.width as f32 / n as f32;
    let step_y = rect.height as f32 / n as f32;
    for my in 0..n {
        for mx in 0..n {
            if !matrix.is_dark(mx, my) {
                continue;
            }
            let x0 = rect.x + (mx as f32 * step_x).round() as i32;
            let y0 = rect.y + (my as f32 * step_y).round() as i32;
            let x1 = rect.x + ((mx + 1) as f32 * step_x).round() as i32;
            let y1 = rect.y + ((my + 1) as f32 * step_y).round() as i32;
            fill_rect(
                img,
                Rect::new(x0, y0, (x1 - x0).max(0) as u32, (y1 - y0).max(0) as u32),
                [0, 0, 0],
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn draw_text(
    img: &mut RgbImage,
    rect: Rect,
    text: &str,
    size: f32,
    weight: FontWeight,
    align: TextAlign,
    color: Rgb,
    face: Option<&Font<'static>>,
) {
    if text.is_empty() || rect.width == 0 || rect.height == 0 {
        return;
    }
    match face {
        Some(font) => draw_glyphs(img, rect, text, size, weight, align, color, font),
        None => draw_fallback_blocks(img, rect, text, size, align, color),
    }
}

fn glyph_run_width(font: &Font<'static>, scale: Scale, text: &str) -> f32 {
    let v = font.v_metrics(scale);
    font.layout(text, scale, point(0.0, v.ascent))
        .filter_map(|g| g.pixel_bounding_box().map(|bb| bb.max.x as f32))
        .fold(0.0, f32::max)
}

#[allow(clippy::too_many_arguments)]
fn draw_glyphs(
    img: &mut RgbImage,
    rect: Rect,
    text: &str,
    size: f32,
    weight: FontWeight,
    align: TextAlign,
    color: Rgb,
    font: &Font<'static>,
) {
    // Shrink to fit the box rather than overflow into a neighbour region.
    let mut px = size;
    let mut width = glyph_run_width(font, Scale::uniform(px), text);
    if width > rect.width as f32 && width > 0.0 {
        px = (px * rect.width as f32 / width).max(4.0);
        width = glyph_run_width(font, Scale::uniform(px), text);
    }

    let scale = Scale::uniform(px);
    let v = font.v_metrics(scale);
    let text_h = v.ascent - v.descent;
    let origin_x = match align {
        TextAlign::Left => rect.x as f32,
        TextAlign::Center => rect.x as f32 + (rect.width as f32 - width) / 2.0,
        TextAlign::Right => rect.x as f32 + rect.width as f32 - width,
    };
    let baseline = rect.y as f32 + (rect.height as f32 - text_h) / 2.0 + v.ascent;

    let passes: &[f32] = match weight {
        FontWeight::Regular => &[0.0],
        // Faux bold: a second pass offset by a fraction of the em.
        FontWeight::Bold => &[0.0, (px / 18.0).max(1.0)],
    };
    for dx in passes {
        for glyph in font.layout(text, scale, point(origin_x + dx, baseline)) {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, coverage| {
                    let x = gx as i32 + bb.min.x;
                    let y = gy as i32 + bb.min.y;
                    if x < 0 || y < 0 || x as u32 >= img.width() || y as u32 >= img.height() {
                        return;
                    }
                    if coverage <= 0.0 {
                        return;
                    }
                    let dst = img.get_pixel_mut(x as u32, y as u32);
                    let inv = 1.0 - coverage;
                    for c in 0..3 {
                        dst.0[c] = (color[c] as f32 * coverage + dst.0[c] as f32 * inv) as u8;
                    }
                });
            }
        }
    }
}

// Without a resolved face, text renders as one block per visible character,
// keeping layout (and goldens) deterministic on fontless machines.
fn draw_fallback_blocks(
    img: &mut RgbImage,
    rect: Rect,
    text: &str,
    size: f32,
    align: TextAlign,
    color: Rgb,
) {
    let advance = (size * 0.56).max(2.0);
    let block_w = (size * 0.44).max(1.0) as u32;
    let block_h = (size * 0.62).max(1.0) as u32;
    let run = advance * text.chars().count() as f32;

    let mut x = match align {
        TextAlign::Left => rect.x as f32,
        TextAlign::Center => rect.x as f32 + (rect.width as f32 - run) / 2.0,
        TextAlign::Right => rect.x as f32 + rect.width as f32 - run,
    };
    let y = rect.y + (rect.height as i32 - block_h as i32) / 2;
    for ch in text.chars() {
        if !ch.is_whitespace() {
            fill_rect(img, Rect::new(x.round() as i32, y, block_w, block_h), color);
        }
        x += advance;
    }
}
