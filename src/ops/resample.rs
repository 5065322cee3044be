// ============================================================================
// RESAMPLING — stretch to exact size, or fit within bounds
// ============================================================================

use image::RgbaImage;
use image::imageops::{self, FilterType};

/// Stretch `src` to exactly `width` × `height` (bilinear, no letterboxing).
/// Returns a clone when the size already matches.
pub fn stretch_to(src: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if src.dimensions() == (width, height) {
        return src.clone();
    }
    imageops::resize(src, width.max(1), height.max(1), FilterType::Triangle)
}

/// Dimensions of `(width, height)` scaled down to fit inside
/// `max_width` × `max_height`, aspect preserved. Never upscales and never
/// returns a zero dimension.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (1, 1);
    }
    let scale = (max_width as f64 / width as f64)
        .min(max_height as f64 / height as f64)
        .min(1.0);
    if scale >= 1.0 {
        return (width, height);
    }
    let w = ((width as f64 * scale).round() as u32).max(1);
    let h = ((height as f64 * scale).round() as u32).max(1);
    (w, h)
}

/// Downscale `src` so it fits inside `max_width` × `max_height`.
pub fn resize_to_fit(src: &RgbaImage, max_width: u32, max_height: u32) -> RgbaImage {
    let (w, h) = fit_within(src.width(), src.height(), max_width, max_height);
    stretch_to(src, w, h)
}
