// ============================================================================
// MASK RASTERIZER — paint layer → binary (optionally feathered) stencil
// ============================================================================

use image::{GrayImage, Rgba, RgbaImage};
use rayon::prelude::*;

use crate::ops::filters::gaussian_blur_plane;
use crate::paint::PaintLayer;

/// Default feather radius in display-canvas pixels.
pub const DEFAULT_FEATHER_RADIUS: f32 = 10.0;

/// Whether and how much to soften the stencil boundary.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Feather {
    #[default]
    Off,
    /// Gaussian blur with the given standard deviation in pixels.
    Radius(f32),
}

impl Feather {
    /// `Off` unless `on` and the radius is finite and positive.
    pub fn enabled(on: bool, radius: f32) -> Self {
        if on && radius.is_finite() && radius > 0.0 {
            Feather::Radius(radius)
        } else {
            Feather::Off
        }
    }
}

/// Alpha stencil delineating the edit region.
///
/// Colour channels are always white; only alpha carries information. Before
/// feathering alpha is 0 or 255, afterwards it ramps smoothly across edges.
#[derive(Clone, Debug, PartialEq)]
pub struct Stencil {
    image: RgbaImage,
}

impl Stencil {
    /// Build a stencil from an alpha plane.
    pub fn from_alpha(alpha: &GrayImage) -> Self {
        let (w, h) = alpha.dimensions();
        let image = RgbaImage::from_fn(w, h, |x, y| Rgba([255, 255, 255, alpha.get_pixel(x, y)[0]]));
        Self { image }
    }

    /// Reinterpret an RGBA buffer as a stencil (alpha kept, colour forced white).
    pub fn from_rgba(image: &RgbaImage) -> Self {
        let mut image = image.clone();
        for p in image.pixels_mut() {
            *p = Rgba([255, 255, 255, p[3]]);
        }
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.image.get_pixel(x, y)[3]
    }

    /// Number of pixels with any coverage.
    pub fn coverage(&self) -> usize {
        self.image.pixels().filter(|p| p[3] > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.coverage() == 0
    }

    /// Opaque where this stencil is transparent and vice versa.
    pub fn inverted(&self) -> Stencil {
        let mut image = self.image.clone();
        for p in image.pixels_mut() {
            p[3] = 255 - p[3];
        }
        Stencil { image }
    }
}

/// Convert the paint layer into a stencil.
///
/// Any pixel with alpha > 0 is marked and becomes opaque white; every other
/// pixel becomes transparent. With [`Feather::Radius`] the binary alpha is
/// then Gaussian-blurred. The paint layer itself is never touched.
pub fn rasterize(layer: &PaintLayer, feather: Feather) -> Stencil {
    let (w, h) = layer.dimensions();
    if w == 0 || h == 0 {
        return Stencil::from_alpha(&GrayImage::new(w, h));
    }
    let src = layer.pixels().as_raw();

    let mut alpha = vec![0u8; (w * h) as usize];
    alpha
        .par_chunks_mut(w as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let row_in = &src[y * w as usize * 4..(y + 1) * w as usize * 4];
            for (x, a) in row.iter_mut().enumerate() {
                *a = if row_in[x * 4 + 3] > 0 { 255 } else { 0 };
            }
        });

    let Some(binary) = GrayImage::from_raw(w, h, alpha) else {
        return Stencil::from_alpha(&GrayImage::new(w, h));
    };

    let plane = match feather {
        Feather::Off => binary,
        Feather::Radius(sigma) => gaussian_blur_plane(&binary, sigma),
    };
    Stencil::from_alpha(&plane)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::MASK_COLOR;

    #[test]
    fn empty_layer_gives_transparent_stencil() {
        let layer = PaintLayer::new(64, 48);
        for feather in [Feather::Off, Feather::Radius(10.0)] {
            let stencil = rasterize(&layer, feather);
            assert_eq!(stencil.dimensions(), (64, 48));
            assert!(stencil.is_empty());
        }
    }

    #[test]
    fn fully_marked_layer_gives_opaque_white_stencil() {
        let mut layer = PaintLayer::new(30, 20);
        layer.fill_rect(0, 0, 30, 20, Rgba([255, 0, 0, 1]));
        let stencil = rasterize(&layer, Feather::Off);
        assert!(stencil.image().pixels().all(|p| *p == Rgba([255, 255, 255, 255])));
    }

    #[test]
    fn feathering_uniform_stencil_is_idempotent() {
        let mut layer = PaintLayer::new(30, 20);
        layer.fill_rect(0, 0, 30, 20, MASK_COLOR);
        let hard = rasterize(&layer, Feather::Off);
        let soft = rasterize(&layer, Feather::Radius(10.0));
        assert_eq!(hard, soft);
    }

    #[test]
    fn square_marks_exactly_its_pixels() {
        let mut layer = PaintLayer::new(100, 100);
        layer.fill_rect(45, 45, 55, 55, Rgba([255, 0, 0, 255]));
        let stencil = rasterize(&layer, Feather::Off);

        assert_eq!(stencil.coverage(), 100);
        for y in 0..100 {
            for x in 0..100 {
                let inside = (45..55).contains(&x) && (45..55).contains(&y);
                let expected = if inside { 255 } else { 0 };
                assert_eq!(stencil.alpha_at(x, y), expected, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn feathering_softens_edges_only() {
        let mut layer = PaintLayer::new(100, 100);
        layer.fill_rect(30, 30, 70, 70, MASK_COLOR);
        let stencil = rasterize(&layer, Feather::Radius(3.0));

        assert_eq!(stencil.alpha_at(50, 50), 255);
        assert_eq!(stencil.alpha_at(2, 2), 0);
        let edge = stencil.alpha_at(30, 50);
        assert!(edge > 0 && edge < 255, "edge alpha {}", edge);
        assert!(stencil.image().pixels().all(|p| p[0] == 255 && p[1] == 255 && p[2] == 255));
    }

    #[test]
    fn rasterize_leaves_paint_layer_untouched() {
        let mut layer = PaintLayer::new(10, 10);
        layer.paint_dab(5.0, 5.0, 2.0, 1.0);
        let before = layer.pixels().clone();
        let _ = rasterize(&layer, Feather::Radius(2.0));
        assert_eq!(layer.pixels(), &before);
        assert!(layer.is_painted());
    }

    #[test]
    fn inverted_swaps_coverage() {
        let mut layer = PaintLayer::new(10, 10);
        layer.fill_rect(0, 0, 5, 10, MASK_COLOR);
        let stencil = rasterize(&layer, Feather::Off);
        let inv = stencil.inverted();
        assert_eq!(inv.coverage(), 50);
        assert_eq!(inv.alpha_at(0, 0), 0);
        assert_eq!(inv.alpha_at(9, 0), 255);
    }

    #[test]
    fn feather_enabled_helper() {
        assert_eq!(Feather::enabled(false, 10.0), Feather::Off);
        assert_eq!(Feather::enabled(true, 0.0), Feather::Off);
        assert_eq!(Feather::enabled(true, 4.0), Feather::Radius(4.0));
        assert_eq!(Feather::enabled(true, f32::INFINITY), Feather::Off);
        assert_eq!(Feather::enabled(true, f32::NAN), Feather::Off);
    }

    #[test]
    fn non_finite_radius_does_not_panic() {
        let mut layer = PaintLayer::new(40, 30);
        layer.fill_rect(10, 10, 30, 20, MASK_COLOR);
        let hard = rasterize(&layer, Feather::Off);
        assert_eq!(rasterize(&layer, Feather::Radius(f32::INFINITY)), hard);
        assert_eq!(rasterize(&layer, Feather::Radius(f32::NAN)), hard);
    }

    #[test]
    fn huge_radius_finishes_with_same_size() {
        let mut layer = PaintLayer::new(40, 30);
        layer.fill_rect(0, 0, 20, 30, MASK_COLOR);
        let stencil = rasterize(&layer, Feather::Radius(1.0e7));
        assert_eq!(stencil.dimensions(), (40, 30));
        assert!(!stencil.is_empty());
    }

    #[test]
    fn zero_sized_layer_gives_zero_sized_stencil() {
        for (w, h) in [(0, 5), (5, 0), (0, 0)] {
            let layer = PaintLayer::from_image(RgbaImage::new(w, h));
            for feather in [Feather::Off, Feather::Radius(10.0)] {
                let stencil = rasterize(&layer, feather);
                assert_eq!(stencil.dimensions(), (w, h));
                assert!(stencil.is_empty());
            }
        }
    }
}
