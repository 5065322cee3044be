// ============================================================================
// FILTERS — separable Gaussian blur over a single alpha plane
// ============================================================================

use image::GrayImage;
use rayon::prelude::*;

/// Build a 1-D Gaussian kernel truncated at ceil(3*sigma), capped at
/// `max_radius` taps each side, normalised to 1.
fn build_gaussian_kernel(sigma: f32, max_radius: usize) -> Vec<f32> {
    let radius = ((sigma * 3.0).ceil() as usize).min(max_radius);
    if radius == 0 {
        return vec![1.0];
    }
    let len = radius * 2 + 1;
    let s2 = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (0..len)
        .map(|i| {
            let x = i as f32 - radius as f32;
            (-x * x / s2).exp()
        })
        .collect();
    let inv = 1.0 / kernel.iter().sum::<f32>();
    for v in &mut kernel {
        *v *= inv;
    }
    kernel
}

/// Gaussian-blur a single-channel plane. `sigma` is the standard deviation in
/// pixels (the same convention as a CSS `blur()` radius). Edges clamp, so a
/// uniform plane comes back unchanged. Non-finite or non-positive sigmas leave
/// the plane as is.
pub fn gaussian_blur_plane(src: &GrayImage, sigma: f32) -> GrayImage {
    let w = src.width() as usize;
    let h = src.height() as usize;
    if w == 0 || h == 0 || !sigma.is_finite() || sigma <= 0.0 {
        return src.clone();
    }

    // Taps beyond the longest edge only re-read clamped border pixels
    let kernel = build_gaussian_kernel(sigma, w.max(h));
    let radius = kernel.len() / 2;
    let buf_in: Vec<f32> = src.as_raw().iter().map(|&b| b as f32).collect();

    // --- Horizontal pass (parallel by row) ---
    let mut buf_h = vec![0.0f32; w * h];
    buf_h.par_chunks_mut(w).enumerate().for_each(|(y, row_out)| {
        let row_in = &buf_in[y * w..(y + 1) * w];
        for (x, out) in row_out.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sx = (x as isize + ki as isize - radius as isize).clamp(0, w as isize - 1);
                acc += row_in[sx as usize] * kv;
            }
            *out = acc;
        }
    });

    // --- Vertical pass (parallel by row) ---
    let mut buf_v = vec![0.0f32; w * h];
    buf_v.par_chunks_mut(w).enumerate().for_each(|(y, row_out)| {
        for (x, out) in row_out.iter_mut().enumerate() {
            let mut acc = 0.0f32;
            for (ki, &kv) in kernel.iter().enumerate() {
                let sy = (y as isize + ki as isize - radius as isize).clamp(0, h as isize - 1);
                acc += buf_h[sy as usize * w + x] * kv;
            }
            *out = acc;
        }
    });

    let raw: Vec<u8> = buf_v
        .iter()
        .map(|&v| v.round().clamp(0.0, 255.0) as u8)
        .collect();
    // Same dimensions as the input, so the length always matches.
    GrayImage::from_raw(w as u32, h as u32, raw).unwrap_or_else(|| src.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    #[test]
    fn kernel_is_normalised_and_symmetric() {
        let k = build_gaussian_kernel(2.5, 100);
        let sum: f32 = k.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        for i in 0..k.len() / 2 {
            assert!((k[i] - k[k.len() - 1 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn uniform_plane_is_unchanged() {
        for value in [0u8, 255, 77] {
            let src = GrayImage::from_pixel(23, 17, Luma([value]));
            let out = gaussian_blur_plane(&src, 10.0);
            assert_eq!(out, src, "uniform value {} drifted", value);
        }
    }

    #[test]
    fn step_edge_becomes_gradient() {
        let src = GrayImage::from_fn(40, 1, |x, _| Luma([if x < 20 { 0 } else { 255 }]));
        let out = gaussian_blur_plane(&src, 3.0);
        let left = out.get_pixel(17, 0)[0];
        let mid = out.get_pixel(20, 0)[0];
        let right = out.get_pixel(23, 0)[0];
        assert!(left > 0 && left < mid && mid < right && right < 255);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(39, 0)[0], 255);
    }

    #[test]
    fn zero_sigma_is_identity() {
        let src = GrayImage::from_fn(5, 5, |x, y| Luma([(x * 40 + y) as u8]));
        assert_eq!(gaussian_blur_plane(&src, 0.0), src);
    }

    #[test]
    fn kernel_radius_is_capped() {
        assert_eq!(build_gaussian_kernel(1.0e7, 12).len(), 25);
        assert_eq!(build_gaussian_kernel(1.0, 12).len(), 7);
    }

    #[test]
    fn non_finite_sigma_leaves_plane_alone() {
        let src = GrayImage::from_fn(8, 4, |x, _| Luma([if x < 4 { 0 } else { 255 }]));
        for sigma in [f32::INFINITY, f32::NEG_INFINITY, f32::NAN] {
            assert_eq!(gaussian_blur_plane(&src, sigma), src);
        }
    }

    #[test]
    fn huge_sigma_stays_bounded() {
        let flat = GrayImage::from_pixel(30, 20, Luma([200]));
        assert_eq!(gaussian_blur_plane(&flat, 1.0e7), flat);

        let step = GrayImage::from_fn(30, 20, |x, _| Luma([if x < 15 { 0 } else { 255 }]));
        let out = gaussian_blur_plane(&step, 1.0e7);
        assert_eq!(out.dimensions(), (30, 20));
        let left = out.get_pixel(0, 10)[0];
        let right = out.get_pixel(29, 10)[0];
        assert!(left > 0 && left < right && right < 255);
    }
}
