// ============================================================================
// COMPOSITOR — merge the edited image into the source through the stencil
// ============================================================================
//
// Both images and the stencil are normalised to the source resolution first.
// The edited image is then clipped to the stencil (destination-in) and laid
// over the source (source-over), so pixels outside the mask stay byte-for-byte
// identical to the source.

use image::{Rgba, RgbaImage};
use rayon::prelude::*;

use crate::ops::mask::Stencil;
use crate::ops::resample::stretch_to;

/// Porter-Duff "source over": draw `top` on top of `base`.
/// Straight (non-premultiplied) RGBA8 in and out.
pub fn source_over(base: Rgba<u8>, top: Rgba<u8>) -> Rgba<u8> {
    // Fast paths keep untouched pixels exact
    if top[3] == 0 {
        return base;
    }
    if top[3] == 255 {
        return top;
    }

    let ta = top[3] as f32 / 255.0;
    let ba = base[3] as f32 / 255.0;
    let out_a = ta + ba * (1.0 - ta);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mix = |t: u8, b: u8| {
        let c = (t as f32 * ta + b as f32 * ba * (1.0 - ta)) / out_a;
        c.round().clamp(0.0, 255.0) as u8
    };
    Rgba([
        mix(top[0], base[0]),
        mix(top[1], base[1]),
        mix(top[2], base[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}

/// Porter-Duff "destination in": keep `dest` only where `mask` is opaque.
/// Colour comes from `dest`; alpha is the product of both alphas.
pub fn destination_in(dest: Rgba<u8>, mask: Rgba<u8>) -> Rgba<u8> {
    let a = (dest[3] as u32 * mask[3] as u32 + 127) / 255;
    Rgba([dest[0], dest[1], dest[2], a as u8])
}

/// Composite `edited` over `source` through `stencil`.
///
/// The result always has exactly the source's dimensions. Where the stencil
/// is transparent the source pixel is kept; where it is opaque the edited
/// pixel replaces it; feathered alpha blends linearly between the two.
pub fn composite(edited: &RgbaImage, source: &RgbaImage, stencil: &Stencil) -> RgbaImage {
    let (w, h) = source.dimensions();
    let edited = stretch_to(edited, w, h);
    let mask = stretch_to(stencil.image(), w, h);

    let stride = w as usize * 4;
    let mut out = source.clone();
    if stride == 0 {
        return out;
    }
    let edit_raw = edited.as_raw();
    let mask_raw = mask.as_raw();

    out.par_chunks_mut(stride).enumerate().for_each(|(y, row_out)| {
        let row_edit = &edit_raw[y * stride..(y + 1) * stride];
        let row_mask = &mask_raw[y * stride..(y + 1) * stride];
        for x in 0..w as usize {
            let pi = x * 4;
            let base = Rgba([row_out[pi], row_out[pi + 1], row_out[pi + 2], row_out[pi + 3]]);
            let edit = Rgba([row_edit[pi], row_edit[pi + 1], row_edit[pi + 2], row_edit[pi + 3]]);
            let stencil_px = Rgba([row_mask[pi], row_mask[pi + 1], row_mask[pi + 2], row_mask[pi + 3]]);

            let clipped = destination_in(edit, stencil_px);
            let merged = source_over(base, clipped);
            row_out[pi..pi + 4].copy_from_slice(&merged.0);
        }
    });

    out
}
