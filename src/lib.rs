//! # quickjpg
//!
//! Batch-convert HEIC, WEBP, and PNG images to JPEG.
//!
//! ## Why this crate?
//!
//! Camera rolls and design exports arrive as HEIC, WEBP, or PNG, while half
//! the tools people actually paste images into still want JPEG. This crate
//! is the conversion core behind that chore: it validates a selection,
//! drives each file through a decode-and-re-encode pipeline with live
//! progress, tolerates individual failures, and packages the results for
//! download either one by one or as a single dated zip.
//!
//! ## Pipeline Overview
//!
//! ```text
//! files
//!  │
//!  ├─ 1. Validate  allow-list (HEIC/WEBP/PNG) + entitlement ceiling
//!  ├─ 2. Batch     one task per file, converted strictly in order
//!  ├─ 3. Decode    PNG/WEBP natively, HEIC via an injected decoder
//!  ├─ 4. Encode    JPEG at the configured quality
//!  └─ 5. Export    individual .jpg blobs or one dated zip bundle
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quickjpg::{convert_batch, export_bundle_today, ConversionConfig, InputFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let files = vec![
//!         InputFile::from_path("holiday.webp").await?,
//!         InputFile::from_path("screenshot.png").await?,
//!     ];
//!
//!     let config = ConversionConfig::default();
//!     let batch = convert_batch(files, &config).await?;
//!
//!     for task in batch.tasks() {
//!         println!("{}: {:?}", task.file().name(), task.status());
//!     }
//!
//!     if batch.any_succeeded() {
//!         let bundle = export_bundle_today(&batch)?;
//!         tokio::fs::write(&bundle.name, &bundle.bytes).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `quickjpg` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! quickjpg = { version = "0.1", default-features = false }
//! ```
//!
//! ## HEIC
//!
//! HEIC decoding needs a codec this crate does not ship. Implement
//! [`HeicDecoder`] over the codec of your choice and inject it via
//! [`ConversionConfig::builder()`]; without one, HEIC files fail with a
//! per-file error while the rest of the batch converts normally.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{Batch, BatchSummary, ConversionTask, JpegArtifact, TaskStatus};
pub use config::{ConversionConfig, ConversionConfigBuilder, Entitlement};
pub use convert::{convert_batch, convert_file, run_batch};
pub use error::{ConversionError, PackagingError, ValidationError};
pub use export::{
    bundle_file_name, export_bundle, export_bundle_today, export_each, jpg_file_name, ExportFile,
};
pub use pipeline::decode::HeicDecoder;
pub use pipeline::input::{format_size, validate, validate_strict, InputFile, SourceFormat};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
