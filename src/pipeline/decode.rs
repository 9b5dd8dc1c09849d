//! Bitmap decode: source bytes → in-memory [`DynamicImage`].
//!
//! ## Why spawn_blocking?
//!
//! Image decoding is CPU-bound; a multi-megapixel PNG can take tens of
//! milliseconds to inflate. `tokio::task::spawn_blocking` moves the work
//! onto the blocking thread pool so the async runtime's worker threads
//! never stall mid-batch.
//!
//! ## Why is HEIC a trait?
//!
//! HEVC-in-HEIF decoding needs a codec with licensing and build baggage
//! this crate should not impose on every user. [`HeicDecoder`] is the seam:
//! implement it over libheif bindings, a platform framework, or anything
//! else that turns HEIC bytes into a bitmap, and inject it through
//! [`crate::config::ConversionConfig::heic_decoder`]. Without one, HEIC
//! inputs fail cleanly instead of producing placeholder pixels.

use crate::error::ConversionError;
use crate::pipeline::input::SourceFormat;
use image::DynamicImage;
use std::sync::Arc;
use tracing::debug;

/// External HEIC decode capability.
///
/// Implementations must be cheap to share (`Send + Sync`); `decode` is
/// called on a blocking-pool thread, so a synchronous codec is fine.
pub trait HeicDecoder: Send + Sync {
    /// Decode HEIC bytes into a bitmap.
    fn decode(
        &self,
        bytes: &[u8],
    ) -> Result<DynamicImage, Box<dyn std::error::Error + Send + Sync>>;
}

/// Decode source bytes into a bitmap according to the detected format.
///
/// PNG and WEBP decode natively through the `image` crate, using the
/// detected format rather than content sniffing, so bytes that contradict
/// their declared type fail here with
/// [`ConversionError::DecodeFailed`]. HEIC requires `heic_decoder`; when
/// it is absent the file fails with
/// [`ConversionError::UnsupportedFormat`].
pub async fn decode_bitmap(
    name: &str,
    format: SourceFormat,
    bytes: Arc<Vec<u8>>,
    heic_decoder: Option<Arc<dyn HeicDecoder>>,
) -> Result<DynamicImage, ConversionError> {
    let name = name.to_string();

    let image = match format.image_format() {
        Some(image_format) => {
            let result = tokio::task::spawn_blocking(move || {
                image::load_from_memory_with_format(&bytes, image_format)
            })
            .await
            .map_err(|e| ConversionError::DecodeFailed {
                name: name.clone(),
                format: format.to_string(),
                detail: format!("decode task failed: {e}"),
            })?;

            result.map_err(|e| ConversionError::DecodeFailed {
                name: name.clone(),
                format: format.to_string(),
                detail: e.to_string(),
            })?
        }
        None => {
            let decoder =
                heic_decoder.ok_or_else(|| ConversionError::UnsupportedFormat {
                    name: name.clone(),
                    detail: "HEIC requires an external decoder and none is configured".to_string(),
                })?;

            let result =
                tokio::task::spawn_blocking(move || decoder.decode(&bytes))
                    .await
                    .map_err(|e| ConversionError::DecodeFailed {
                        name: name.clone(),
                        format: format.to_string(),
                        detail: format!("decode task failed: {e}"),
                    })?;

            result.map_err(|e| ConversionError::DecodeFailed {
                name: name.clone(),
                format: format.to_string(),
                detail: e.to_string(),
            })?
        }
    };

    debug!(
        "Decoded '{}' ({}) → {}x{} px",
        name,
        format,
        image.width(),
        image.height()
    );
    Ok(image)
}
