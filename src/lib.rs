//! InpaintFE: masked image editing through a remote inpainting API.
//!
//! A user paints a mask over a loaded image and supplies a prompt; the crate
//! rasterizes the mask into an alpha stencil, uploads image + stencil + prompt,
//! and composites the returned image back so that only the masked region
//! changes.
//!
//! ```no_run
//! # async fn demo() -> inpaintfe::error::Result<()> {
//! use inpaintfe::prelude::*;
//!
//! let settings = Settings::load();
//! let mut session = EditSession::from_settings(&settings);
//! session.load_image(inpaintfe::io::load_image("photo.jpg".as_ref())?);
//! session.paint_dab(120.0, 80.0, 25.0, 0.8);
//!
//! struct Quiet;
//! impl DisplaySurface for Quiet {
//!     fn present(&mut self, _image: &image::RgbaImage) {}
//!     fn set_status(&mut self, _status: &StatusMessage) {}
//! }
//!
//! let backend = HttpBackend::from_settings(&settings);
//! let options = CycleOptions::from(&settings);
//! run_edit_cycle(&mut session, &backend, &mut Quiet, "add a hot-air balloon", &options).await?;
//! # Ok(())
//! # }
//! ```

pub mod logger;

pub mod api;
pub mod cli;
pub mod config;
pub mod cycle;
pub mod error;
pub mod io;
pub mod loader;
pub mod ops;
pub mod paint;
pub mod session;

pub mod prelude {
    pub use crate::api::{EditBackend, EditRequest, HttpBackend, ImageRef};
    pub use crate::config::Settings;
    pub use crate::cycle::{CycleOptions, run_edit_cycle};
    pub use crate::error::{EditError, MissingInput};
    pub use crate::ops::composite::composite;
    pub use crate::ops::mask::{Feather, Stencil, rasterize};
    pub use crate::paint::PaintLayer;
    pub use crate::session::{DisplaySurface, EditSession, StatusKind, StatusMessage};
}
