// ============================================================================
// IMAGE I/O — encode upload streams, decode files and responses
// ============================================================================

use std::fs::File;
use std::io::{BufWriter, Cursor, Write};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, ImageError, RgbaImage};

/// Output container for an encoded image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EncodeFormat {
    Png,
    Jpeg { quality: u8 },
}

impl EncodeFormat {
    /// Pick a format from a file extension. Unknown extensions fall back to PNG.
    pub fn from_path(path: &Path, jpeg_quality: u8) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("jpg") | Some("jpeg") => EncodeFormat::Jpeg { quality: jpeg_quality },
            _ => EncodeFormat::Png,
        }
    }
}

/// Encode `image` into `writer`. JPEG drops the alpha channel.
pub fn encode_into<W: Write>(
    image: &RgbaImage,
    format: EncodeFormat,
    writer: &mut W,
) -> Result<(), ImageError> {
    match format {
        EncodeFormat::Png => {
            PngEncoder::new(writer).write_image(
                image.as_raw(),
                image.width(),
                image.height(),
                ColorType::Rgba8,
            )?;
        }
        EncodeFormat::Jpeg { quality } => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(writer, quality.clamp(1, 100));
            encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)?;
        }
    }
    Ok(())
}

/// Encode `image` into an in-memory byte stream.
pub fn encode_to_vec(image: &RgbaImage, format: EncodeFormat) -> Result<Vec<u8>, ImageError> {
    let mut buf = Cursor::new(Vec::new());
    encode_into(image, format, &mut buf)?;
    Ok(buf.into_inner())
}

/// Encode and write `image` to `path`, format chosen by extension.
pub fn save_image(image: &RgbaImage, path: &Path, jpeg_quality: u8) -> Result<(), ImageError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    encode_into(image, EncodeFormat::from_path(path, jpeg_quality), &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Decode any supported container into RGBA8.
pub fn decode_bytes(data: &[u8]) -> Result<RgbaImage, ImageError> {
    Ok(image::load_from_memory(data)?.into_rgba8())
}

/// Load an image file into RGBA8.
pub fn load_image(path: &Path) -> Result<RgbaImage, ImageError> {
    Ok(image::open(path)?.into_rgba8())
}
