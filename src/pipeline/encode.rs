//! JPEG encoding: RGB bitmap → encoded bytes.
//!
//! JPEG has no alpha channel, so bitmaps are flattened to RGB before they
//! reach this stage; see [`crate::convert::convert_file`]. Encoding runs on
//! the blocking pool for the same reason decoding does: a large bitmap
//! keeps a core busy for long enough to matter.

use crate::error::ConversionError;
use image::codecs::jpeg::JpegEncoder;
use image::RgbImage;
use tracing::debug;

/// Encode an RGB bitmap as JPEG at the given quality (1–100).
pub async fn encode_jpeg(
    name: &str,
    bitmap: RgbImage,
    quality: u8,
) -> Result<Vec<u8>, ConversionError> {
    let name = name.to_string();
    let task_name = name.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut buf = Vec::new();
        let encoded = JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&bitmap);
        encoded.map(|()| buf)
    })
    .await
    .map_err(|e| ConversionError::EncodeFailed {
        name: task_name,
        detail: format!("encode task failed: {e}"),
    })?;

    let bytes = result.map_err(|e| ConversionError::EncodeFailed {
        name: name.clone(),
        detail: e.to_string(),
    })?;

    debug!("Encoded '{}' → {} JPEG bytes", name, bytes.len());
    Ok(bytes)
}
