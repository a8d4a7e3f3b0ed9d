//! Image preparation for vision calls.
//!
//! Uploads arrive as arbitrary camera/gallery images; providers want a
//! bounded payload. Everything is flattened to RGB, shrunk to fit a
//! bounding square, and re-encoded as JPEG inside a base64 data URI.
//! Decoding and encoding are CPU-bound, so the async entry point pushes
//! the work onto a blocking worker.

use std::io::Cursor;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::ImageReader;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use badil_core::error::{BadilError, Result};

/// Resize and re-encode raw image bytes into a JPEG data URI.
pub async fn prepare_image(bytes: Vec<u8>, max_dimension: u32, jpeg_quality: u8) -> Result<String> {
    tokio::task::spawn_blocking(move || encode_data_uri(&bytes, max_dimension, jpeg_quality))
        .await
        .map_err(|e| BadilError::Media(format!("image worker failed: {e}")))?
}

/// Synchronous core of [`prepare_image`].
pub fn encode_data_uri(bytes: &[u8], max_dimension: u32, jpeg_quality: u8) -> Result<String> {
    if looks_like_svg(bytes) {
        return Err(BadilError::Media(
            "SVG input is not supported; submit a raster image".into(),
        ));
    }

    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| BadilError::Media(format!("unreadable image: {e}")))?
        .decode()
        .map_err(|e| BadilError::Media(format!("undecodable image: {e}")))?;

    // thumbnail preserves aspect ratio within the bounding square, but it
    // scales in both directions; inputs already inside the square pass
    // through untouched.
    let resized = if img.width() > max_dimension || img.height() > max_dimension {
        img.thumbnail(max_dimension, max_dimension)
    } else {
        img
    };
    let rgb = image::DynamicImage::ImageRgb8(resized.to_rgb8());

    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, jpeg_quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| BadilError::Media(format!("jpeg encode failed: {e}")))?;

    debug!(
        input_bytes = bytes.len(),
        output_bytes = out.len(),
        width = rgb.width(),
        height = rgb.height(),
        "Prepared image"
    );

    Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&out)))
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(512)];
    let head = String::from_utf8_lossy(head).to_lowercase();
    head.trim_start().starts_with("<?xml") || head.contains("<svg")
}
