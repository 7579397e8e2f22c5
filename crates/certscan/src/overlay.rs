//! Visual debugging helpers: render search regions onto an image, or crop a
//! region out for inspection. Used by the CLI's `overlay` command to tune
//! field geometry against real scans.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use crate::error::{CertScanError, Result};
use crate::types::Rectangle;

const OUTLINE: Rgb<u8> = Rgb([220, 20, 20]);
const OUTLINE_THICKNESS: i32 = 2;

/// Draw rectangle outlines on the image and re-encode it as PNG.
///
/// Rectangles partially outside the image are clipped; rectangles entirely
/// outside are skipped.
pub fn draw_regions(image_bytes: &[u8], rects: &[Rectangle]) -> Result<Vec<u8>> {
    let mut rgb_image = decode(image_bytes)?;

    for rect in rects {
        draw_outline(&mut rgb_image, *rect);
    }

    encode_png(rgb_image)
}

/// Cut one region out of the image and return it as PNG.
pub fn crop_region(image_bytes: &[u8], rect: Rectangle) -> Result<Vec<u8>> {
    let rgb_image = decode(image_bytes)?;
    let (width, height) = rgb_image.dimensions();

    let window = rect.clamped(width, height).ok_or_else(|| {
        CertScanError::validation(format!("region {rect:?} lies outside the {width}x{height} image"))
    })?;

    let region = image::imageops::crop_imm(
        &rgb_image,
        window.left as u32,
        window.top as u32,
        window.width as u32,
        window.height as u32,
    )
    .to_image();

    encode_png(region)
}

fn decode(image_bytes: &[u8]) -> Result<RgbImage> {
    let img = image::load_from_memory(image_bytes)
        .map_err(|e| CertScanError::parsing(format!("failed to decode image: {e}")))?;
    Ok(img.to_rgb8())
}

fn encode_png(rgb_image: RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(rgb_image)
        .write_to(&mut buffer, ImageFormat::Png)
        .map_err(|e| CertScanError::parsing(format!("failed to encode PNG: {e}")))?;
    Ok(buffer.into_inner())
}

fn draw_outline(image: &mut RgbImage, rect: Rectangle) {
    let (width, height) = image.dimensions();
    let Some(window) = rect.clamped(width, height) else {
        tracing::debug!(?rect, "overlay region outside image, skipping");
        return;
    };

    for y in window.top..window.bottom() {
        for x in window.left..window.right() {
            let on_vertical_edge = x - window.left < OUTLINE_THICKNESS || window.right() - x <= OUTLINE_THICKNESS;
            let on_horizontal_edge = y - window.top < OUTLINE_THICKNESS || window.bottom() - y <= OUTLINE_THICKNESS;
            if on_vertical_edge || on_horizontal_edge {
                image.put_pixel(x as u32, y as u32, OUTLINE);
            }
        }
    }
}
