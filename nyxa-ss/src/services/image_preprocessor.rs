//! Screenshot preprocessing ahead of OCR
//!
//! Dark-theme screenshots (light text on dark background) are inverted so the
//! OCR engine sees dark text on a light background.

use image::{DynamicImage, ImageFormat, RgbaImage};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

/// Mean luminance below which a screenshot is treated as dark-themed
pub const DARK_MODE_THRESHOLD: f64 = 128.0;

/// Preprocessing errors
#[derive(Debug, Error)]
pub enum PreprocessError {
    /// Bytes could not be decoded as an image
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// Processed image could not be re-encoded
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),
}

/// Image ready to hand to the OCR engine
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// PNG-encoded pixels
    pub png_bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Mean of (R+G+B)/3 over every pixel, before inversion
    pub mean_luminance: f64,
    /// Whether RGB channels were inverted
    pub inverted: bool,
}

/// Mean luminance of an image, computed as the per-pixel (R+G+B)/3 averaged
/// over all pixels. Alpha is ignored. An image without pixels reports 255.
pub fn mean_luminance(image: &RgbaImage) -> f64 {
    let pixel_count = u64::from(image.width()) * u64::from(image.height());
    if pixel_count == 0 {
        return 255.0;
    }

    let channel_sum: u64 = image
        .pixels()
        .map(|p| u64::from(p[0]) + u64::from(p[1]) + u64::from(p[2]))
        .sum();

    channel_sum as f64 / (3 * pixel_count) as f64
}

/// Whether an image of this luminance should be inverted
pub fn is_dark(mean_luminance: f64) -> bool {
    mean_luminance < DARK_MODE_THRESHOLD
}

/// Invert R, G and B in place; alpha is left untouched
pub fn invert_rgb(image: &mut RgbaImage) {
    for pixel in image.pixels_mut() {
        pixel[0] = 255 - pixel[0];
        pixel[1] = 255 - pixel[1];
        pixel[2] = 255 - pixel[2];
    }
}

/// Decode, invert if dark, and re-encode as PNG
pub fn preprocess_image(bytes: &[u8]) -> Result<PreparedImage, PreprocessError> {
    let decoded = image::load_from_memory(bytes).map_err(PreprocessError::Decode)?;
    let mut rgba = decoded.to_rgba8();

    let luminance = mean_luminance(&rgba);
    let inverted = is_dark(luminance);
    if inverted {
        invert_rgb(&mut rgba);
        debug!(mean_luminance = luminance, "Dark mode detected, colors inverted for OCR");
    }

    let (width, height) = rgba.dimensions();
    let mut png_bytes = Vec::new();
    DynamicImage::ImageRgba8(rgba)
        .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)
        .map_err(PreprocessError::Encode)?;

    Ok(PreparedImage {
        png_bytes,
        width,
        height,
        mean_luminance: luminance,
        inverted,
    })
}
