//! Batch and per-file task records.
//!
//! A [`Batch`] owns an ordered sequence of [`ConversionTask`]s, one per
//! accepted input file. Insertion order is significant: it is the processing
//! order and the display order. Task state only changes through the
//! crate-private transition methods, which the coordinator in
//! [`crate::convert`] drives; external callers observe tasks read-only.
//!
//! A batch is an in-memory session object. Dropping it discards all task
//! state; nothing is persisted.

use crate::error::ConversionError;
use crate::pipeline::input::InputFile;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Lifecycle state of one file in a batch.
///
/// Tasks move `Pending → Converting → Succeeded | Failed` and never revisit
/// an earlier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Converting,
    Succeeded,
    Failed,
}

impl TaskStatus {
    /// True for `Succeeded` and `Failed`.
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }
}

/// The encoded JPEG output of a successful conversion.
///
/// Owned exclusively by the task that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JpegArtifact {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
}

impl JpegArtifact {
    pub(crate) fn new(bytes: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            bytes,
            width,
            height,
        }
    }

    /// Encoded JPEG bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte length of the encoded JPEG.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Pixel width of the encoded image.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Pixel height of the encoded image.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Consume the artifact, returning the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Per-file conversion state machine instance.
///
/// Invariant: once the task is terminal, exactly one of the artifact (on
/// `Succeeded`) or the error (on `Failed`) is set; neither is set earlier.
/// Progress is 0–100 and non-decreasing while converting; it lands on 100
/// exactly when the task succeeds and is reset to 0 when it fails.
#[derive(Debug)]
pub struct ConversionTask {
    file: Arc<InputFile>,
    status: TaskStatus,
    // AtomicU8 so the in-flight engine can update progress in place through
    // a shared reference while the coordinator retains ownership of the task.
    progress: AtomicU8,
    artifact: Option<JpegArtifact>,
    error: Option<ConversionError>,
}

impl ConversionTask {
    fn new(file: Arc<InputFile>) -> Self {
        Self {
            file,
            status: TaskStatus::Pending,
            progress: AtomicU8::new(0),
            artifact: None,
            error: None,
        }
    }

    /// The input file this task converts.
    pub fn file(&self) -> &InputFile {
        &self.file
    }

    pub(crate) fn file_handle(&self) -> Arc<InputFile> {
        Arc::clone(&self.file)
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    /// Current progress percentage, 0–100.
    pub fn progress(&self) -> u8 {
        self.progress.load(Ordering::Relaxed)
    }

    /// The JPEG output. Present iff the task succeeded.
    pub fn artifact(&self) -> Option<&JpegArtifact> {
        self.artifact.as_ref()
    }

    /// The failure cause. Present iff the task failed.
    pub fn error(&self) -> Option<&ConversionError> {
        self.error.as_ref()
    }

    /// Human-readable failure description, if the task failed.
    pub fn error_detail(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    // ── Transitions (coordinator-only) ───────────────────────────────────

    pub(crate) fn begin(&mut self) {
        debug_assert_eq!(self.status, TaskStatus::Pending, "task started twice");
        self.status = TaskStatus::Converting;
        self.progress.store(0, Ordering::Relaxed);
    }

    /// Record an in-flight progress report. Values only move forward;
    /// a stale lower value never overwrites a higher one.
    pub(crate) fn record_progress(&self, percent: u8) {
        self.progress.fetch_max(percent.min(100), Ordering::Relaxed);
    }

    pub(crate) fn succeed(&mut self, artifact: JpegArtifact) {
        debug_assert_eq!(self.status, TaskStatus::Converting);
        debug_assert!(self.error.is_none());
        self.status = TaskStatus::Succeeded;
        self.progress.store(100, Ordering::Relaxed);
        self.artifact = Some(artifact);
    }

    pub(crate) fn fail(&mut self, error: ConversionError) {
        debug_assert_eq!(self.status, TaskStatus::Converting);
        debug_assert!(self.artifact.is_none());
        self.status = TaskStatus::Failed;
        // A partial percentage on a failed task would read as "nearly made
        // it"; failures always show 0.
        self.progress.store(0, Ordering::Relaxed);
        self.error = Some(error);
    }
}

/// An ordered batch of conversion tasks.
///
/// Created by [`crate::convert::convert_batch`] after validation; the task
/// order matches the accepted input order.
#[derive(Debug, Default)]
pub struct Batch {
    tasks: Vec<ConversionTask>,
}

impl Batch {
    /// Build a batch from already-validated files, one pending task per
    /// file, preserving order. [`crate::convert::convert_batch`] does this
    /// after validation; construct one directly to drive
    /// [`crate::convert::run_batch`] with your own validation policy.
    pub fn new(files: Vec<InputFile>) -> Self {
        Self {
            tasks: files
                .into_iter()
                .map(|f| ConversionTask::new(Arc::new(f)))
                .collect(),
        }
    }

    /// All tasks, in batch order.
    pub fn tasks(&self) -> &[ConversionTask] {
        &self.tasks
    }

    /// Task at `index`. Panics when out of range, like slice indexing.
    pub fn task(&self, index: usize) -> &ConversionTask {
        &self.tasks[index]
    }

    pub(crate) fn task_mut(&mut self, index: usize) -> &mut ConversionTask {
        &mut self.tasks[index]
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// True when at least one task has succeeded.
    pub fn any_succeeded(&self) -> bool {
        self.tasks
            .iter()
            .any(|t| t.status() == TaskStatus::Succeeded)
    }

    /// True when every task has reached a terminal state.
    pub fn all_terminal(&self) -> bool {
        self.tasks.iter().all(|t| t.status().is_terminal())
    }

    pub fn succeeded_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status() == TaskStatus::Succeeded)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.status() == TaskStatus::Failed)
            .count()
    }
}

/// Aggregate outcome of one batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Tasks in the batch.
    pub total_files: usize,
    /// Tasks that reached `Succeeded`.
    pub succeeded: usize,
    /// Tasks that reached `Failed`.
    pub failed: usize,
    /// Wall-clock duration of the whole batch run.
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_file(name: &str) -> InputFile {
        InputFile::from_bytes(name, "image/png", vec![1, 2, 3])
    }

    fn artifact() -> JpegArtifact {
        JpegArtifact::new(vec![0xFF, 0xD8, 0xFF], 2, 2)
    }

    #[test]
    fn new_batch_tasks_are_pending() {
        let batch = Batch::new(vec![memory_file("a.png"), memory_file("b.png")]);
        assert_eq!(batch.len(), 2);
        assert!(!batch.all_terminal());
        assert!(!batch.any_succeeded());
        for task in batch.tasks() {
            assert_eq!(task.status(), TaskStatus::Pending);
            assert_eq!(task.progress(), 0);
            assert!(task.artifact().is_none());
            assert!(task.error().is_none());
        }
    }

    #[test]
    fn success_sets_artifact_and_full_progress() {
        let mut batch = Batch::new(vec![memory_file("a.png")]);
        batch.task_mut(0).begin();
        assert_eq!(batch.task(0).status(), TaskStatus::Converting);

        batch.task(0).record_progress(50);
        assert_eq!(batch.task(0).progress(), 50);

        batch.task_mut(0).succeed(artifact());
        let task = batch.task(0);
        assert_eq!(task.status(), TaskStatus::Succeeded);
        assert_eq!(task.progress(), 100);
        assert!(task.artifact().is_some());
        assert!(task.error().is_none());
        assert!(batch.any_succeeded());
        assert!(batch.all_terminal());
    }

    #[test]
    fn failure_resets_progress_and_records_error() {
        let mut batch = Batch::new(vec![memory_file("a.png")]);
        batch.task_mut(0).begin();
        batch.task(0).record_progress(75);

        batch.task_mut(0).fail(ConversionError::DecodeFailed {
            name: "a.png".into(),
            format: "PNG".into(),
            detail: "truncated".into(),
        });

        let task = batch.task(0);
        assert_eq!(task.status(), TaskStatus::Failed);
        assert_eq!(task.progress(), 0);
        assert!(task.artifact().is_none());
        let detail = task.error_detail().expect("failed task has a detail");
        assert!(!detail.is_empty());
        assert_eq!(batch.failed_count(), 1);
        assert!(!batch.any_succeeded());
    }

    #[test]
    fn progress_never_moves_backwards() {
        let mut batch = Batch::new(vec![memory_file("a.png")]);
        batch.task_mut(0).begin();
        batch.task(0).record_progress(75);
        batch.task(0).record_progress(25);
        assert_eq!(batch.task(0).progress(), 75);
    }

    #[test]
    fn progress_is_capped_at_100() {
        let mut batch = Batch::new(vec![memory_file("a.png")]);
        batch.task_mut(0).begin();
        batch.task(0).record_progress(250);
        assert_eq!(batch.task(0).progress(), 100);
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::Succeeded).expect("serialize"),
            "\"succeeded\""
        );
    }
}
