// ============================================================================
// EDIT CYCLE — validate, rasterize, upload, load, composite
// ============================================================================

use image::RgbaImage;
use uuid::Uuid;

use crate::api::{EditBackend, EditRequest};
use crate::config::Settings;
use crate::error::{EditError, MissingInput, Result};
use crate::io::{EncodeFormat, encode_to_vec};
use crate::loader::load_image_ref;
use crate::ops::mask::{Feather, Stencil, rasterize};
use crate::ops::resample::{resize_to_fit, stretch_to};
use crate::session::{DisplaySurface, EditSession, StatusMessage};
use crate::{log_err, log_info};

/// Per-cycle knobs, normally taken from [`Settings`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CycleOptions {
    pub feather: Feather,
    pub max_upload_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for CycleOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for CycleOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            feather: settings.feather(),
            max_upload_dimension: settings.max_upload_dimension.max(1),
            jpeg_quality: settings.jpeg_quality,
        }
    }
}

/// Build the upload payload: the source fitted to the upload bound as JPEG and
/// the stencil stretched to those same dimensions as PNG.
pub fn prepare_request(
    source: &RgbaImage,
    stencil: &Stencil,
    prompt: &str,
    options: &CycleOptions,
) -> Result<EditRequest> {
    let bound = options.max_upload_dimension;
    let upload = resize_to_fit(source, bound, bound);
    let (width, height) = upload.dimensions();
    let mask = stretch_to(stencil.image(), width, height);

    Ok(EditRequest {
        prompt: prompt.to_string(),
        image_jpeg: encode_to_vec(&upload, EncodeFormat::Jpeg { quality: options.jpeg_quality })?,
        mask_png: encode_to_vec(&mask, EncodeFormat::Png)?,
        width,
        height,
    })
}

/// Run one complete edit cycle against `backend`.
///
/// On success the composite becomes the session's working image, the mask is
/// cleared and the result is presented on `display`. On any error the session
/// is left as it was (apart from its status) so the user can retry. Either way
/// exactly one final status message is reported and the busy flag is cleared.
pub async fn run_edit_cycle<B, D>(
    session: &mut EditSession,
    backend: &B,
    display: &mut D,
    prompt: &str,
    options: &CycleOptions,
) -> Result<()>
where
    B: EditBackend,
    D: DisplaySurface,
{
    if let Err(e) = session.validate(prompt) {
        report(session, display, StatusMessage::error(e.to_string()));
        return Err(e);
    }

    let cycle_id = Uuid::new_v4();
    log_info!("Edit cycle {} started (prompt: {:?})", cycle_id, prompt.trim());
    session.set_busy(true);
    report(session, display, StatusMessage::info("Sending edit..."));

    let outcome = execute(session, backend, prompt.trim(), options, cycle_id).await;
    session.set_busy(false);

    match outcome {
        Ok(()) => {
            if let Some(image) = session.working_image() {
                display.present(image);
            }
            report(session, display, StatusMessage::success("Edit applied successfully!"));
            log_info!("Edit cycle {} finished", cycle_id);
            Ok(())
        }
        Err(e) => {
            log_err!("Edit cycle {} failed: {}", cycle_id, e);
            report(session, display, StatusMessage::error(format!("Connection or server error: {}", e)));
            Err(e)
        }
    }
}

async fn execute<B: EditBackend>(
    session: &mut EditSession,
    backend: &B,
    prompt: &str,
    options: &CycleOptions,
    cycle_id: Uuid,
) -> Result<()> {
    let stencil = rasterize(session.paint_layer(), options.feather);
    let request = {
        let source = session
            .working_image()
            .ok_or(EditError::InputMissing(MissingInput::Image))?;
        prepare_request(source, &stencil, prompt, options)?
    };
    log_info!(
        "Edit cycle {}: uploading {}x{} (image {} bytes, mask {} bytes, {} masked canvas pixels)",
        cycle_id,
        request.width,
        request.height,
        request.image_jpeg.len(),
        request.mask_png.len(),
        stencil.coverage()
    );

    let image_ref = backend.submit(&request).await?;
    let edited = load_image_ref(backend, image_ref).await?;
    log_info!(
        "Edit cycle {}: received {}x{} edited image",
        cycle_id,
        edited.width(),
        edited.height()
    );

    let result = session.apply_composite(&edited, &stencil)?;
    log_info!(
        "Edit cycle {}: composited at {}x{}",
        cycle_id,
        result.width(),
        result.height()
    );
    Ok(())
}

fn report<D: DisplaySurface>(session: &mut EditSession, display: &mut D, status: StatusMessage) {
    display.set_status(&status);
    session.set_status(status);
}
