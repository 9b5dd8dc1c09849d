//! Progress-callback trait for per-file conversion events.
//!
//! Inject an [`Arc<dyn BatchProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! real-time events as the coordinator works through a batch.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers can
//! forward events to a progress bar, a GUI, a log, or a channel of their own
//! choosing without the library knowing anything about how the host
//! application communicates. The trait is `Send + Sync` so a callback can be
//! shared with code running on other threads while a batch is in flight.
//!
//! # Event ordering
//!
//! Files are converted strictly one at a time, in batch order. For file `i`,
//! the sequence is `on_file_start`, zero or more `on_file_progress` calls
//! with non-decreasing percentages, then exactly one of `on_file_complete`
//! or `on_file_error`. File `i + 1` emits nothing until file `i` has
//! finished. A successful file always reports `100` before completing.
//!
//! # Example
//!
//! ```rust
//! use quickjpg::{BatchProgressCallback, ConversionConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl BatchProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total_files: usize, jpeg_bytes: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("File {}/{} done ({} bytes)", index + 1, total_files, jpeg_bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn BatchProgressCallback>)
//!     .build();
//! ```

use std::sync::Arc;

/// Called by the batch coordinator as it drives each file through the
/// conversion pipeline.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Indices are 0-based and match the batch order.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once before any file is converted.
    ///
    /// # Arguments
    /// * `total_files` — number of files in the batch
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called when a file transitions out of the pending state, before any
    /// of its bytes are read.
    ///
    /// # Arguments
    /// * `index`       — 0-based position of the file in the batch
    /// * `total_files` — number of files in the batch
    /// * `name`        — declared file name
    fn on_file_start(&self, index: usize, total_files: usize, name: &str) {
        let _ = (index, total_files, name);
    }

    /// Called at each pipeline checkpoint while a file converts.
    ///
    /// Percentages are non-decreasing within one file and end at 100 when
    /// the file succeeds.
    fn on_file_progress(&self, index: usize, total_files: usize, percent: u8) {
        let _ = (index, total_files, percent);
    }

    /// Called when a file has been converted successfully.
    ///
    /// # Arguments
    /// * `jpeg_bytes` — byte length of the produced JPEG artifact
    fn on_file_complete(&self, index: usize, total_files: usize, jpeg_bytes: usize) {
        let _ = (index, total_files, jpeg_bytes);
    }

    /// Called when a file fails. The batch continues with the next file.
    ///
    /// # Arguments
    /// * `error` — human-readable error description
    fn on_file_error(&self, index: usize, total_files: usize, error: &str) {
        let _ = (index, total_files, error);
    }

    /// Called once after every file has reached a terminal state.
    ///
    /// # Arguments
    /// * `success_count` — files that converted without error
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let _ = (total_files, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is the default when no callback is configured.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
