// ============================================================================
// PAINT LAYER — freehand mask strokes at display resolution
// ============================================================================

use image::{Rgba, RgbaImage};

/// Colour the drawing surface uses for mask strokes (semi-transparent red).
/// Only the alpha channel matters to the rasterizer.
pub const MASK_COLOR: Rgba<u8> = Rgba([255, 0, 0, 128]);

/// Pixel buffer the user paints the edit region onto.
///
/// A pixel counts as marked iff its alpha is non-zero. The `painted` flag
/// tracks whether any drawing operation touched a pixel since the last
/// `clear`, so callers don't need to scan the buffer to validate a submit.
#[derive(Clone, Debug)]
pub struct PaintLayer {
    pixels: RgbaImage,
    painted: bool,
}

impl PaintLayer {
    /// A fully transparent layer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width.max(1), height.max(1)),
            painted: false,
        }
    }

    /// Wrap an existing buffer (e.g. a mask loaded from disk). The painted flag
    /// reflects whether the buffer holds any marked pixel.
    pub fn from_image(pixels: RgbaImage) -> Self {
        let painted = pixels.pixels().any(|p| p[3] > 0);
        Self { pixels, painted }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn is_painted(&self) -> bool {
        self.painted
    }

    /// Stamp a round brush dab centred on (`cx`, `cy`).
    ///
    /// `hardness` in 0..=1 controls the soft falloff at the rim; 1.0 gives a
    /// hard-edged disc. Alpha only ever grows, so overlapping dabs never erase
    /// earlier strokes.
    pub fn paint_dab(&mut self, cx: f32, cy: f32, radius: f32, hardness: f32) {
        let (w, h) = self.pixels.dimensions();
        let r = radius.max(0.5);
        let hard_t = hardness.clamp(0.0, 1.0);

        let min_x = (cx - r).floor().max(0.0) as u32;
        let min_y = (cy - r).floor().max(0.0) as u32;
        let max_x = ((cx + r).ceil().max(0.0) as u32).min(w.saturating_sub(1));
        let max_y = ((cy + r).ceil().max(0.0) as u32).min(h.saturating_sub(1));
        if min_x >= w || min_y >= h {
            return;
        }

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f32 + 0.5 - cx;
                let dy = y as f32 + 0.5 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist > r {
                    continue;
                }
                // Smoothstep falloff outside the hard core
                let t = dist / r;
                let coverage = if t <= hard_t {
                    1.0
                } else {
                    let s = (t - hard_t) / (1.0 - hard_t + 1e-6);
                    1.0 - s * s * (3.0 - 2.0 * s)
                };
                let alpha = (MASK_COLOR[3] as f32 * coverage).round() as u8;
                if alpha == 0 {
                    continue;
                }
                let px = self.pixels.get_pixel_mut(x, y);
                if alpha > px[3] {
                    *px = Rgba([MASK_COLOR[0], MASK_COLOR[1], MASK_COLOR[2], alpha]);
                }
                self.painted = true;
            }
        }
    }

    /// Stamp dabs along a straight segment, spaced a quarter radius apart.
    pub fn paint_line(&mut self, from: (f32, f32), to: (f32, f32), radius: f32, hardness: f32) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let len = (dx * dx + dy * dy).sqrt();
        let spacing = (radius * 0.25).max(0.5);
        let steps = (len / spacing).ceil().max(1.0) as u32;
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            self.paint_dab(from.0 + dx * t, from.1 + dy * t, radius, hardness);
        }
    }

    /// Mark the axis-aligned rectangle `[x0, x1) × [y0, y1)` with an opaque
    /// mask colour. Coordinates outside the layer are clipped.
    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba<u8>) {
        let (w, h) = self.pixels.dimensions();
        let (x1, y1) = (x1.min(w), y1.min(h));
        for y in y0..y1 {
            for x in x0..x1 {
                self.pixels.put_pixel(x, y, color);
                if color[3] > 0 {
                    self.painted = true;
                }
            }
        }
    }

    /// Erase every stroke and reset the painted flag.
    pub fn clear(&mut self) {
        for p in self.pixels.pixels_mut() {
            *p = Rgba([0, 0, 0, 0]);
        }
        self.painted = false;
    }
}
