//! Conversion entry points: the per-file engine and the batch coordinator.
//!
//! ## Why sequential?
//!
//! The coordinator converts files strictly one at a time, in batch order.
//! Nothing technical forces this (tasks share no mutable state), but the
//! ordering is observable behaviour callers rely on: progress and status
//! events for file `i` finish before file `i + 1` emits anything, so a
//! progress UI reads top to bottom with no interleaving. Parallel
//! conversion would be a behaviour change, not just an optimisation.

use crate::batch::{Batch, BatchSummary, JpegArtifact};
use crate::config::ConversionConfig;
use crate::error::{ConversionError, ValidationError};
use crate::pipeline::input::{validate, validate_strict, InputFile, SourceFormat};
use crate::pipeline::{decode, encode};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Validate a selection and convert every accepted file to JPEG.
///
/// This is the primary entry point for the library. The entitlement tier in
/// `config` is read once, here, to fix the batch-size ceiling.
///
/// # Returns
/// `Ok(Batch)` with every task in a terminal state, even if some (or all)
/// files failed; inspect per-task status or [`Batch::any_succeeded`].
///
/// # Errors
/// `Err(ValidationError)` only when the selection itself is rejected; in
/// that case no task was created and no file was touched.
pub async fn convert_batch(
    files: Vec<InputFile>,
    config: &ConversionConfig,
) -> Result<Batch, ValidationError> {
    let max_count = config.entitlement.max_batch_size();
    info!(
        "Validating {} candidate files (limit {})",
        files.len(),
        max_count
    );

    let accepted = if config.strict_validation {
        validate_strict(files, max_count)?
    } else {
        validate(files, max_count)?
    };

    let mut batch = Batch::new(accepted);
    run_batch(&mut batch, config).await;
    Ok(batch)
}

/// Drive every task in the batch to a terminal state, in order.
///
/// One file's failure never aborts the batch; the error is recorded on its
/// task and processing moves on. Returns aggregate counts and timing.
pub async fn run_batch(batch: &mut Batch, config: &ConversionConfig) -> BatchSummary {
    let start = Instant::now();
    let total = batch.len();
    info!("Starting batch of {} files", total);

    if let Some(cb) = &config.progress_callback {
        cb.on_batch_start(total);
    }

    for index in 0..total {
        batch.task_mut(index).begin();
        let name = batch.task(index).file().name().to_string();
        if let Some(cb) = &config.progress_callback {
            cb.on_file_start(index, total, &name);
        }
        debug!("Converting {}/{}: {}", index + 1, total, name);

        let outcome = {
            let task = batch.task(index);
            let file = task.file_handle();
            let cb = config.progress_callback.clone();
            let report = move |percent: u8| {
                task.record_progress(percent);
                if let Some(cb) = &cb {
                    cb.on_file_progress(index, total, percent);
                }
            };
            convert_file(&file, config, report).await
        };

        match outcome {
            Ok(artifact) => {
                let jpeg_bytes = artifact.len();
                batch.task_mut(index).succeed(artifact);
                if let Some(cb) = &config.progress_callback {
                    cb.on_file_complete(index, total, jpeg_bytes);
                }
            }
            Err(error) => {
                warn!("Conversion failed for '{}': {}", name, error);
                let detail = error.to_string();
                batch.task_mut(index).fail(error);
                if let Some(cb) = &config.progress_callback {
                    cb.on_file_error(index, total, &detail);
                }
            }
        }
    }

    let summary = BatchSummary {
        total_files: total,
        succeeded: batch.succeeded_count(),
        failed: batch.failed_count(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Batch complete: {}/{} files in {}ms",
        summary.succeeded, total, summary.duration_ms
    );
    if let Some(cb) = &config.progress_callback {
        cb.on_batch_complete(total, summary.succeeded);
    }

    summary
}

/// Convert one file to a JPEG artifact.
///
/// Dispatches on the file's detected format: PNG and WEBP decode natively,
/// HEIC goes through the decoder injected in `config`, and anything else
/// fails immediately with
/// [`ConversionError::UnsupportedFormat`] before any bytes are read.
///
/// `on_progress` is called with non-decreasing percentages at the pipeline
/// checkpoints (25, 50, 75, 100); a successful return is always preceded by
/// a 100 report. The only observable effects are the callback invocations
/// and the returned artifact.
pub async fn convert_file<F>(
    file: &InputFile,
    config: &ConversionConfig,
    on_progress: F,
) -> Result<JpegArtifact, ConversionError>
where
    F: Fn(u8),
{
    let Some(format) = SourceFormat::detect(file) else {
        return Err(ConversionError::UnsupportedFormat {
            name: file.name().to_string(),
            detail: format!(
                "declared type '{}' is not HEIC, WEBP, or PNG",
                file.declared_mime().unwrap_or("unknown")
            ),
        });
    };

    // ── Read ─────────────────────────────────────────────────────────────
    let bytes = file.read().await?;
    on_progress(25);

    // ── Decode ───────────────────────────────────────────────────────────
    let image =
        decode::decode_bitmap(file.name(), format, bytes, config.heic_decoder.clone()).await?;
    on_progress(50);

    // ── Flatten ──────────────────────────────────────────────────────────
    // JPEG carries no alpha; transparent regions land on black, same as a
    // canvas re-encode would produce.
    let name = file.name().to_string();
    let rgb = tokio::task::spawn_blocking(move || image.into_rgb8())
        .await
        .map_err(|e| ConversionError::DecodeFailed {
            name,
            format: format.to_string(),
            detail: format!("pixel conversion task failed: {e}"),
        })?;
    on_progress(75);

    // ── Encode ───────────────────────────────────────────────────────────
    let (width, height) = rgb.dimensions();
    let jpeg = encode::encode_jpeg(file.name(), rgb, config.jpeg_quality).await?;
    on_progress(100);

    debug!(
        "Converted '{}' → {}x{} JPEG, {} bytes",
        file.name(),
        width,
        height,
        jpeg.len()
    );
    Ok(JpegArtifact::new(jpeg, width, height))
}
