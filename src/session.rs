// ============================================================================
// EDIT SESSION — working image, paint layer and status for one user
// ============================================================================

use image::RgbaImage;

use crate::config::Settings;
use crate::error::{EditError, MissingInput, Result};
use crate::ops::composite::composite;
use crate::ops::mask::Stencil;
use crate::ops::resample::{fit_within, stretch_to};
use crate::paint::PaintLayer;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

/// One user-visible status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn info(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Info, text: text.into() }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Success, text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { kind: StatusKind::Error, text: text.into() }
    }
}

/// Where composite results and status messages are shown.
pub trait DisplaySurface {
    fn present(&mut self, image: &RgbaImage);
    fn set_status(&mut self, status: &StatusMessage);
}

/// State of one editing session.
///
/// The working image is the source for the next edit and is replaced by each
/// composite. The paint layer lives at display resolution (the working image
/// fitted into the display bounds).
#[derive(Debug)]
pub struct EditSession {
    working: Option<RgbaImage>,
    paint: PaintLayer,
    display_bounds: (u32, u32),
    busy: bool,
    status: Option<StatusMessage>,
}

impl EditSession {
    pub fn new(display_max_width: u32, display_max_height: u32) -> Self {
        Self {
            working: None,
            paint: PaintLayer::new(1, 1),
            display_bounds: (display_max_width.max(1), display_max_height.max(1)),
            busy: false,
            status: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.display_max_width, settings.display_max_height)
    }

    /// Start editing `image`. Any previous mask is discarded.
    pub fn load_image(&mut self, image: RgbaImage) {
        let (w, h) = fit_within(
            image.width(),
            image.height(),
            self.display_bounds.0,
            self.display_bounds.1,
        );
        self.paint = PaintLayer::new(w, h);
        self.working = Some(image);
    }

    pub fn is_loaded(&self) -> bool {
        self.working.is_some()
    }

    pub fn working_image(&self) -> Option<&RgbaImage> {
        self.working.as_ref()
    }

    pub fn paint_layer(&self) -> &PaintLayer {
        &self.paint
    }

    /// Display-canvas size the paint layer uses.
    pub fn canvas_size(&self) -> (u32, u32) {
        self.paint.dimensions()
    }

    pub fn is_mask_painted(&self) -> bool {
        self.paint.is_painted()
    }

    pub fn paint_dab(&mut self, x: f32, y: f32, radius: f32, hardness: f32) {
        self.paint.paint_dab(x, y, radius, hardness);
    }

    pub fn paint_line(&mut self, from: (f32, f32), to: (f32, f32), radius: f32, hardness: f32) {
        self.paint.paint_line(from, to, radius, hardness);
    }

    pub fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32) {
        self.paint.fill_rect(x0, y0, x1, y1, crate::paint::MASK_COLOR);
    }

    /// Replace the paint layer with a pre-painted mask (e.g. loaded from a
    /// file). Masks of another size are stretched to the canvas size.
    pub fn set_paint_layer(&mut self, mask: RgbaImage) {
        let (w, h) = self.canvas_size();
        self.paint = PaintLayer::from_image(stretch_to(&mask, w, h));
    }

    pub fn clear_mask(&mut self) {
        self.paint.clear();
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub(crate) fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    pub fn set_status(&mut self, status: StatusMessage) {
        self.status = Some(status);
    }

    /// Check the submit preconditions in the order the user fixes them:
    /// image, then mask, then prompt.
    pub fn validate(&self, prompt: &str) -> Result<()> {
        if !self.is_loaded() {
            return Err(EditError::InputMissing(MissingInput::Image));
        }
        if !self.is_mask_painted() {
            return Err(EditError::InputMissing(MissingInput::Mask));
        }
        if prompt.trim().is_empty() {
            return Err(EditError::InputMissing(MissingInput::Prompt));
        }
        Ok(())
    }

    /// Composite `edited` over the working image through `stencil`, make the
    /// result the new working image and end the edit cycle by clearing the
    /// mask.
    pub fn apply_composite(&mut self, edited: &RgbaImage, stencil: &Stencil) -> Result<&RgbaImage> {
        let source = self
            .working
            .as_ref()
            .ok_or(EditError::InputMissing(MissingInput::Image))?;
        let result = composite(edited, source, stencil);
        self.clear_mask();
        Ok(self.working.insert(result))
    }
}
