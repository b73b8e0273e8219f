//! Image wire codec
//!
//! Images cross the network as base64-encoded PNG bytes. This crate owns the
//! conversion between that wire form and `image::DynamicImage`.

use std::io::Cursor;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

/// Errors while encoding or decoding wire images
#[derive(Debug, Error)]
pub enum CodecError {
    /// Payload is not valid base64
    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Decoded bytes are not a readable image
    #[error("malformed image data: {0}")]
    Image(#[from] image::ImageError),
}

/// Encode an image into base64 PNG wire form
pub fn encode_png_base64(image: &DynamicImage) -> Result<String, CodecError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(STANDARD.encode(&bytes))
}

/// Decode base64 PNG wire form back into an image
pub fn decode_png_base64(encoded: &str) -> Result<DynamicImage, CodecError> {
    let bytes = STANDARD.decode(encoded.trim())?;
    Ok(image::load_from_memory(&bytes)?)
}
