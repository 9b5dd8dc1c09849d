//! Configuration types for batch image conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across calls and to see at a glance why two
//! batches behaved differently.
//!
//! # Design choice: builder over constructor
//! The builder lets callers set only what they care about and rely on
//! documented defaults for the rest; every numeric setter clamps its input
//! into the valid range so a built config is always usable.

use crate::pipeline::decode::HeicDecoder;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Entitlement tier of the session submitting a batch.
///
/// The tier is supplied by the host application (billing, licensing, an env
/// var in the CLI) and is read exactly once per batch, when the selection is
/// validated. The library treats it as an opaque read-only input; it only
/// controls the batch-size ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entitlement {
    /// Free tier: up to 5 files per batch. (default)
    #[default]
    Standard,
    /// Paid tier: up to 20 files per batch.
    Pro,
}

impl Entitlement {
    /// Maximum number of files accepted in a single batch for this tier.
    pub fn max_batch_size(self) -> usize {
        match self {
            Entitlement::Standard => 5,
            Entitlement::Pro => 20,
        }
    }
}

/// Configuration for a batch conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use quickjpg::{ConversionConfig, Entitlement};
///
/// let config = ConversionConfig::builder()
///     .jpeg_quality(85)
///     .entitlement(Entitlement::Pro)
///     .build();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// JPEG encoder quality, 1–100. Default: 90.
    ///
    /// 90 keeps compression artefacts invisible on photographic content
    /// while roughly halving the size of a typical PNG source. Lower it for
    /// thumbnails where size matters more than fidelity.
    pub jpeg_quality: u8,

    /// Entitlement tier controlling the batch-size ceiling. Default:
    /// [`Entitlement::Standard`] (5 files).
    pub entitlement: Entitlement,

    /// Reject the whole selection when it contains any unsupported file.
    /// Default: false (unsupported files are dropped silently).
    ///
    /// Strict mode is what an interactive picker wants: a stray `.txt` in a
    /// drag-and-drop is almost always a user mistake worth surfacing rather
    /// than papering over.
    pub strict_validation: bool,

    /// External HEIC decode capability. Default: None.
    ///
    /// HEIC decoding needs a codec this crate does not ship. Implement
    /// [`HeicDecoder`] over a codec of your choice (libheif bindings, a
    /// platform API) and inject it here; without one, HEIC files fail with
    /// [`crate::error::ConversionError::UnsupportedFormat`]. PNG and WEBP
    /// never consult this field.
    pub heic_decoder: Option<Arc<dyn HeicDecoder>>,

    /// Per-file progress event receiver. Default: None.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 90,
            entitlement: Entitlement::default(),
            strict_validation: false,
            heic_decoder: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("jpeg_quality", &self.jpeg_quality)
            .field("entitlement", &self.entitlement)
            .field("strict_validation", &self.strict_validation)
            .field(
                "heic_decoder",
                &self.heic_decoder.as_ref().map(|_| "<dyn HeicDecoder>"),
            )
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn BatchProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    /// JPEG quality, clamped to 1–100.
    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn entitlement(mut self, tier: Entitlement) -> Self {
        self.config.entitlement = tier;
        self
    }

    pub fn strict_validation(mut self, v: bool) -> Self {
        self.config.strict_validation = v;
        self
    }

    pub fn heic_decoder(mut self, decoder: Arc<dyn HeicDecoder>) -> Self {
        self.config.heic_decoder = Some(decoder);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration. Setters clamp their inputs, so this cannot
    /// fail.
    pub fn build(self) -> ConversionConfig {
        self.config
    }
}
