//! Error types for the quickjpg library.
//!
//! Three enums reflect the three places a batch can go wrong:
//!
//! * [`ValidationError`] — **Fatal**: the selection is rejected before any
//!   task is created (nothing in the allow-list, too many files). Returned
//!   as `Err(ValidationError)` from [`crate::convert::convert_batch`].
//!
//! * [`ConversionError`] — **Non-fatal**: a single file failed (unreadable
//!   bytes, corrupt image data, encoder fault) but the rest of the batch is
//!   fine. Stored inside the failing [`crate::batch::ConversionTask`] so
//!   callers can inspect partial success rather than losing the whole batch
//!   to one bad file.
//!
//! * [`PackagingError`] — scoped to a single export request. A failed export
//!   leaves every converted artifact intact and exportable again.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors raised while validating a file selection.
///
/// Validation fails fast: when any of these is returned, zero tasks have
/// been created and no conversion work has started.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// A candidate is neither a supported MIME type nor a supported
    /// extension. Only raised by strict validation; the lenient path drops
    /// such candidates silently.
    #[error("'{name}' is not a supported image file (only HEIC, WEBP, and PNG are accepted)")]
    InvalidType { name: String },

    /// More accepted files than the entitlement tier allows.
    #[error("too many files: {count} selected, the limit is {max}")]
    TooManyFiles { count: usize, max: usize },

    /// Nothing in the selection survived the allow-list.
    #[error("no valid image files were selected")]
    NoValidFiles,
}

/// A non-fatal error for a single file in a batch.
///
/// Recorded in the owning [`crate::batch::ConversionTask`] when that file
/// fails. The batch continues with the remaining files.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ConversionError {
    /// The declared type and extension match none of the supported source
    /// formats, or a format was recognised but no decoder is available
    /// for it.
    #[error("unsupported format for '{name}': {detail}")]
    UnsupportedFormat { name: String, detail: String },

    /// The raw bytes could not be read from the input handle.
    #[error("failed to read '{name}': {detail}")]
    ReadFailed { name: String, detail: String },

    /// The source bytes are not a decodable image of the declared format.
    #[error("failed to decode '{name}' as {format}: {detail}")]
    DecodeFailed {
        name: String,
        format: String,
        detail: String,
    },

    /// JPEG encoding of the decoded bitmap failed.
    #[error("failed to encode '{name}' as JPEG: {detail}")]
    EncodeFailed { name: String, detail: String },
}

/// Errors raised while packaging converted artifacts for export.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum PackagingError {
    /// A bundle was requested but no task in the batch has succeeded.
    #[error("no successfully converted files to bundle")]
    EmptyBundle,

    /// The archive writer reported an error.
    #[error("failed to write archive: {detail}")]
    ArchiveFailed { detail: String },
}
