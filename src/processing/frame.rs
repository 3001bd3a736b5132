//! # Frame Decoding
//!
//! Turns the text a client sends in a `send_items` event into an image the
//! barcode decoder can work on.
//!
//! ## Pipeline
//!
//! 1. Strip the data-URL header (`data:image/jpeg;base64,`)
//! 2. Base64-decode the remainder into raw image bytes
//! 3. Decode the bytes with the `image` crate (JPEG, PNG, WebP, ...)

use base64::{engine::general_purpose, Engine as _};
use image::DynamicImage;
use thiserror::Error;

/// Reasons a frame could not be turned into an image.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame is not a data URL (missing ',' separator)")]
    MissingSeparator,

    #[error("frame payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("frame bytes are not a decodable image: {0}")]
    Image(#[from] image::ImageError),
}

/// Decode a data-URL encoded frame into an image.
///
/// # Arguments
/// - `data_url`: Frame text as sent by the browser, e.g. `data:image/jpeg;base64,/9j/4AAQ...`
///
/// # Returns
/// - `Ok(DynamicImage)`: The decoded frame
/// - `Err(FrameError)`: The header, base64 body, or image bytes were malformed
///
/// # Example
/// ```ignore
/// let image = decode_frame("data:image/png;base64,iVBORw0KGgo...")?;
/// ```
pub fn decode_frame(data_url: &str) -> Result<DynamicImage, FrameError> {
    let (_, encoded) = data_url
        .split_once(',')
        .ok_or(FrameError::MissingSeparator)?;

    let bytes = general_purpose::STANDARD.decode(encoded.trim())?;
    Ok(image::load_from_memory(&bytes)?)
}

/// Encode raw image bytes as a data URL. Inverse of [`decode_frame`]'s first two steps.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        mime,
        general_purpose::STANDARD.encode(bytes)
    )
}
