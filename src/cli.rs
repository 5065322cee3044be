// ============================================================================
// InpaintFE CLI — headless edit cycle via command-line arguments
// ============================================================================
//
// Usage examples:
//   inpaintfe -i photo.jpg -m mask.png -p "replace the sky with a sunset" -o out.png
//   inpaintfe -i photo.jpg -m mask.png -p "x" -o out.jpg --feather --feather-radius 6
//   inpaintfe -i photo.jpg -m mask.png -p "x" -o out.png --edited from_api.png
//
// The mask file plays the role of the paint layer: any pixel with alpha > 0
// is part of the edit region. `--edited` composites a local image instead of
// calling the API, which is handy for checking masks offline.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use image::RgbaImage;

use crate::api::{EditBackend, EditRequest, HttpBackend, ImageRef};
use crate::config::Settings;
use crate::cycle::{CycleOptions, run_edit_cycle};
use crate::error::{EditError, Result};
use crate::io::{load_image, save_image};
use crate::ops::mask::{Feather, rasterize};
use crate::session::{DisplaySurface, EditSession, StatusKind, StatusMessage};
use crate::{log_info, log_warn, logger};

/// InpaintFE headless inpainting front end.
#[derive(Parser, Debug)]
#[command(
    name = "inpaintfe",
    about = "Masked image editing through a remote inpainting API",
    long_about = "Send an image, a painted mask and a prompt to an image-editing API,\n\
                  then composite the returned image back over the original so only\n\
                  the masked region changes.\n\n\
                  Example:\n  \
                  inpaintfe -i photo.jpg -m mask.png -p \"add a red kite\" -o result.png"
)]
pub struct CliArgs {
    /// Source image to edit.
    #[arg(short, long, value_name = "IMAGE")]
    pub input: PathBuf,

    /// Mask image; pixels with alpha > 0 mark the region to edit.
    #[arg(short, long, value_name = "MASK.png")]
    pub mask: PathBuf,

    /// Description of the edit.
    #[arg(short, long, default_value = "")]
    pub prompt: String,

    /// Where to write the composited result (format from extension).
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,

    /// Feather (blur) the mask edges.
    #[arg(long)]
    pub feather: bool,

    /// Feather radius in canvas pixels (implies --feather).
    #[arg(long, value_name = "PX")]
    pub feather_radius: Option<f32>,

    /// API endpoint URL.
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Model identifier sent with the request.
    #[arg(long, value_name = "ID")]
    pub model: Option<String>,

    /// API key (overrides the settings file and INPAINTFE_API_KEY).
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Composite this local image instead of calling the API.
    #[arg(long, value_name = "FILE")]
    pub edited: Option<PathBuf>,

    /// Also write the rasterized stencil to this PNG.
    #[arg(long, value_name = "FILE")]
    pub stencil_out: Option<PathBuf>,

    /// Persist the effective endpoint, model, key and feather options.
    #[arg(long)]
    pub save_settings: bool,

    /// Echo the session log to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

impl CliArgs {
    /// Fold command-line overrides into the loaded settings.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(endpoint) = &self.endpoint {
            settings.api_endpoint = endpoint.clone();
        }
        if let Some(model) = &self.model {
            settings.model = model.clone();
        }
        if let Some(key) = &self.api_key {
            settings.api_key = key.clone();
        }
        if self.feather {
            settings.feather_enabled = true;
        }
        if let Some(radius) = self.feather_radius {
            if radius.is_finite() {
                settings.feather_enabled = true;
                settings.feather_radius = radius.max(0.0);
            } else {
                log_warn!("Ignoring non-finite feather radius {}", radius);
            }
        }
    }
}

/// Status lines go to the terminal; the result itself is written by `run`.
struct TerminalDisplay;

impl DisplaySurface for TerminalDisplay {
    fn present(&mut self, image: &RgbaImage) {
        log_info!("Result ready: {}x{}", image.width(), image.height());
    }

    fn set_status(&mut self, status: &StatusMessage) {
        match status.kind {
            StatusKind::Info => println!("{}", status.text),
            StatusKind::Success => println!("ok: {}", status.text),
            StatusKind::Error => eprintln!("error: {}", status.text),
        }
    }
}

/// Backend that answers every request with a local file's bytes.
struct LocalBackend {
    edited: Vec<u8>,
}

impl EditBackend for LocalBackend {
    async fn submit(&self, request: &EditRequest) -> Result<ImageRef> {
        log_info!(
            "Offline edit: skipping upload of {}x{} request",
            request.width,
            request.height
        );
        Ok(ImageRef::Inline(self.edited.clone()))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Err(EditError::ImageDecode(format!("offline mode cannot fetch {}", url)))
    }
}

// ============================================================================
// Public entry point
// ============================================================================

/// Run one edit cycle and return an OS exit code.
pub fn run(args: CliArgs) -> ExitCode {
    logger::set_echo(args.verbose);
    if args.verbose
        && let Some(path) = logger::log_path()
    {
        eprintln!("log: {}", path.display());
    }

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: could not start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let start = Instant::now();
    match runtime.block_on(run_async(&args)) {
        Ok(()) => {
            if args.verbose {
                eprintln!("done in {:.2}s", start.elapsed().as_secs_f64());
            }
            ExitCode::SUCCESS
        }
        // Cycle errors were already reported through the display surface
        Err(CliError::Cycle) => ExitCode::FAILURE,
        Err(CliError::Setup(msg)) => {
            eprintln!("error: {}", msg);
            ExitCode::FAILURE
        }
    }
}

enum CliError {
    Setup(String),
    Cycle,
}

async fn run_async(args: &CliArgs) -> std::result::Result<(), CliError> {
    let mut settings = Settings::load();
    args.apply_to(&mut settings);
    if args.save_settings {
        settings
            .save()
            .map_err(|e| CliError::Setup(format!("could not save settings: {}", e)))?;
    }
    let options = CycleOptions::from(&settings);

    let mut session = EditSession::from_settings(&settings);
    session.load_image(read_image(&args.input)?);
    session.set_paint_layer(read_image(&args.mask)?);
    log_info!(
        "Loaded {} ({}x{} canvas), mask {}",
        args.input.display(),
        session.canvas_size().0,
        session.canvas_size().1,
        args.mask.display()
    );

    if let Some(path) = &args.stencil_out {
        write_stencil(&session, options.feather, path)?;
    }

    let mut display = TerminalDisplay;
    let outcome = match &args.edited {
        Some(path) => {
            let edited = std::fs::read(path).map_err(|e| {
                CliError::Setup(format!("could not read '{}': {}", path.display(), e))
            })?;
            let backend = LocalBackend { edited };
            run_edit_cycle(&mut session, &backend, &mut display, &args.prompt, &options).await
        }
        None => {
            if settings.api_key.is_empty() {
                log_warn!("No API key configured; sending unauthenticated request");
            }
            let backend = HttpBackend::from_settings(&settings);
            log_info!("Submitting to {}", backend.endpoint());
            run_edit_cycle(&mut session, &backend, &mut display, &args.prompt, &options).await
        }
    };
    if let Err(e) = outcome {
        if e.is_input_missing() {
            eprintln!("hint: pass a non-empty --prompt and a mask with painted pixels");
        }
        return Err(CliError::Cycle);
    }

    let result = session
        .working_image()
        .ok_or_else(|| CliError::Setup("no result image".to_string()))?;
    save_image(result, &args.output, settings.jpeg_quality).map_err(|e| {
        CliError::Setup(format!("could not write '{}': {}", args.output.display(), e))
    })?;
    println!("wrote {}", args.output.display());
    Ok(())
}

fn read_image(path: &Path) -> std::result::Result<RgbaImage, CliError> {
    load_image(path)
        .map_err(|e| CliError::Setup(format!("could not load '{}': {}", path.display(), e)))
}

fn write_stencil(
    session: &EditSession,
    feather: Feather,
    path: &Path,
) -> std::result::Result<(), CliError> {
    let stencil = rasterize(session.paint_layer(), feather);
    let covered = stencil.coverage();
    save_image(stencil.image(), path, 100).map_err(|e| {
        CliError::Setup(format!("could not write stencil '{}': {}", path.display(), e))
    })?;
    log_info!("Stencil written to {} ({} px covered)", path.display(), covered);
    Ok(())
}
