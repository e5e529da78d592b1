//! Image encoding: `DynamicImage` → PNG bytes → base64 inline image.
//!
//! PNG is chosen over JPEG because it is lossless; JPEG artefacts around
//! rendered glyphs noticeably hurt transcription of small print and formulae.

use crate::service::InlineImage;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded {}x{} page → {} PNG bytes", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// Wrap PNG bytes as a base64 inline image for a service request.
pub fn inline_png(png: &[u8]) -> InlineImage {
    InlineImage {
        mime_type: "image/png",
        base64: STANDARD.encode(png),
    }
}
