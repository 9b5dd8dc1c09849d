//! Export packaging: turn succeeded tasks into downloadable blobs.
//!
//! Both export shapes are read-only over the batch: they can be called any
//! number of times, before or after other exports, and always produce the
//! same bytes for the same batch state. Tasks that are pending, converting,
//! or failed are silently excluded; they are not an error here because the
//! batch already reports them individually.

use crate::batch::{Batch, TaskStatus};
use crate::error::PackagingError;
use chrono::NaiveDate;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;

/// Prefix of every bundle archive name.
const BUNDLE_PREFIX: &str = "quickjpg-converted";

/// A named byte blob ready for the output sink (a download trigger, a
/// filesystem write). The packager never writes anywhere itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Rewrite a source file name for its JPEG artifact: the final extension is
/// replaced by `.jpg`, and extension-less names get `.jpg` appended.
///
/// `IMG_0042.HEIC` becomes `IMG_0042.jpg`; `archive.tar.png` becomes
/// `archive.tar.jpg`.
pub fn jpg_file_name(original: &str) -> String {
    Path::new(original)
        .with_extension("jpg")
        .to_string_lossy()
        .into_owned()
}

/// Archive name for a bundle exported on `date`.
pub fn bundle_file_name(date: NaiveDate) -> String {
    format!("{BUNDLE_PREFIX}-{}.zip", date.format("%Y-%m-%d"))
}

/// One export blob per succeeded task, in batch order.
///
/// The list is empty when nothing succeeded; individual export has no
/// all-or-nothing semantics to enforce.
pub fn export_each(batch: &Batch) -> Vec<ExportFile> {
    let files: Vec<ExportFile> = succeeded(batch)
        .map(|(name, bytes)| ExportFile {
            name: jpg_file_name(name),
            bytes: bytes.to_vec(),
        })
        .collect();
    debug!("Prepared {} individual export files", files.len());
    files
}

/// Bundle every succeeded task into a single zip archive.
///
/// Entry names follow the same renaming rule as individual export; the
/// archive itself is named after `date`
/// (`quickjpg-converted-YYYY-MM-DD.zip`). Entry metadata is pinned so the
/// same batch always produces byte-identical archives.
///
/// # Errors
/// [`PackagingError::EmptyBundle`] when no task succeeded;
/// [`PackagingError::ArchiveFailed`] if the zip writer reports an error.
pub fn export_bundle(batch: &Batch, date: NaiveDate) -> Result<ExportFile, PackagingError> {
    if !batch.any_succeeded() {
        return Err(PackagingError::EmptyBundle);
    }

    let archive_error = |e: &dyn std::fmt::Display| PackagingError::ArchiveFailed {
        detail: e.to_string(),
    };

    let options = SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .last_modified_time(zip::DateTime::default());

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let mut entries = 0usize;
    for (name, bytes) in succeeded(batch) {
        writer
            .start_file(jpg_file_name(name), options)
            .map_err(|e| archive_error(&e))?;
        writer.write_all(bytes).map_err(|e| archive_error(&e))?;
        entries += 1;
    }

    let cursor = writer.finish().map_err(|e| archive_error(&e))?;
    let bytes = cursor.into_inner();

    let name = bundle_file_name(date);
    info!("Bundled {} files into {} ({} bytes)", entries, name, bytes.len());
    Ok(ExportFile { name, bytes })
}

/// [`export_bundle`] stamped with today's local date.
pub fn export_bundle_today(batch: &Batch) -> Result<ExportFile, PackagingError> {
    export_bundle(batch, chrono::Local::now().date_naive())
}

/// Succeeded tasks as `(source name, jpeg bytes)` pairs, in batch order.
fn succeeded(batch: &Batch) -> impl Iterator<Item = (&str, &[u8])> {
    batch.tasks().iter().filter_map(|task| {
        if task.status() != TaskStatus::Succeeded {
            return None;
        }
        task.artifact()
            .map(|artifact| (task.file().name(), artifact.bytes()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_replaces_final_extension() {
        assert_eq!(jpg_file_name("photo.png"), "photo.jpg");
        assert_eq!(jpg_file_name("IMG_0042.HEIC"), "IMG_0042.jpg");
        assert_eq!(jpg_file_name("archive.tar.png"), "archive.tar.jpg");
        assert_eq!(jpg_file_name("noext"), "noext.jpg");
    }

    #[test]
    fn bundle_name_carries_iso_date() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        assert_eq!(bundle_file_name(date), "quickjpg-converted-2024-06-01.zip");
    }

    #[test]
    fn empty_batch_has_nothing_to_export() {
        let batch = Batch::default();
        assert!(export_each(&batch).is_empty());

        let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
        assert_eq!(
            export_bundle(&batch, date).expect_err("nothing succeeded"),
            PackagingError::EmptyBundle
        );
    }
}
