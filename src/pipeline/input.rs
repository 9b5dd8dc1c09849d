//! Input handling: file handles, the format allow-list, and batch validation.
//!
//! ## Why validate on declared type *or* extension?
//!
//! Files arrive from environments that are sloppy about MIME types: drag
//! and drop often delivers `application/octet-stream` for a perfectly good
//! `.heic`, and some sources send the type with odd casing. Accepting a
//! candidate when either signal matches keeps false rejections rare, while
//! the decoder still authoritatively rejects bytes that turn out not to be
//! the declared format.
//!
//! Validation is pure: it never touches the underlying bytes, so a
//! terabyte selection is vetted as fast as a kilobyte one.

use crate::error::{ConversionError, ValidationError};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Source formats this crate converts to JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Heic,
    WebP,
    Png,
}

impl SourceFormat {
    /// Classify a file by declared MIME type, falling back to the filename
    /// extension. Both checks are case-insensitive; either is sufficient.
    pub fn detect(file: &InputFile) -> Option<Self> {
        if let Some(mime) = file.declared_mime() {
            if let Some(format) = Self::from_mime(mime) {
                return Some(format);
            }
        }
        file.extension().as_deref().and_then(Self::from_extension)
    }

    fn from_mime(mime: &str) -> Option<Self> {
        match mime.to_ascii_lowercase().as_str() {
            "image/heic" => Some(SourceFormat::Heic),
            "image/webp" => Some(SourceFormat::WebP),
            "image/png" => Some(SourceFormat::Png),
            _ => None,
        }
    }

    fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "heic" => Some(SourceFormat::Heic),
            "webp" => Some(SourceFormat::WebP),
            "png" => Some(SourceFormat::Png),
            _ => None,
        }
    }

    /// The corresponding decoder format, for formats the `image` crate
    /// handles natively. HEIC has none; it decodes through an injected
    /// capability.
    pub(crate) fn image_format(self) -> Option<image::ImageFormat> {
        match self {
            SourceFormat::Png => Some(image::ImageFormat::Png),
            SourceFormat::WebP => Some(image::ImageFormat::WebP),
            SourceFormat::Heic => None,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceFormat::Heic => "HEIC",
            SourceFormat::WebP => "WEBP",
            SourceFormat::Png => "PNG",
        };
        f.write_str(name)
    }
}

// ── Input file handle ────────────────────────────────────────────────────

enum ByteSource {
    Memory(Arc<Vec<u8>>),
    Path(PathBuf),
}

impl fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ByteSource::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
            ByteSource::Path(p) => write!(f, "Path({})", p.display()),
        }
    }
}

/// An immutable handle to one candidate file.
///
/// The environment supplies these (a picker, drag and drop, CLI paths); the
/// conversion core never prompts for input itself. The declared name, size,
/// and MIME type are exactly what the environment claimed; nothing is
/// verified until the bytes are actually decoded.
#[derive(Debug)]
pub struct InputFile {
    name: String,
    declared_mime: Option<String>,
    size: u64,
    source: ByteSource,
}

impl InputFile {
    /// Wrap in-memory bytes with a declared name and MIME type.
    pub fn from_bytes(
        name: impl Into<String>,
        declared_mime: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            declared_mime: Some(declared_mime.into()),
            size: bytes.len() as u64,
            source: ByteSource::Memory(Arc::new(bytes)),
        }
    }

    /// Wrap a file on disk. The size comes from file metadata; the MIME
    /// type is guessed from the extension. Bytes are read lazily, when the
    /// file is converted.
    pub async fn from_path(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let meta = tokio::fs::metadata(&path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let declared_mime = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(mime_for_extension)
            .map(str::to_string);
        debug!("Resolved input file: {} ({} bytes)", name, meta.len());
        Ok(Self {
            name,
            declared_mime,
            size: meta.len(),
            source: ByteSource::Path(path),
        })
    }

    /// Declared file name, including extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared MIME type, if the environment supplied one.
    pub fn declared_mime(&self) -> Option<&str> {
        self.declared_mime.as_deref()
    }

    /// Declared size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Lowercased filename extension, without the dot.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    /// Read the raw bytes. In-memory sources are shared without copying;
    /// path sources hit the filesystem here, not before.
    pub async fn read(&self) -> Result<Arc<Vec<u8>>, ConversionError> {
        match &self.source {
            ByteSource::Memory(bytes) => Ok(Arc::clone(bytes)),
            ByteSource::Path(path) => tokio::fs::read(path)
                .await
                .map(Arc::new)
                .map_err(|e| ConversionError::ReadFailed {
                    name: self.name.clone(),
                    detail: e.to_string(),
                }),
        }
    }
}

fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "heic" => Some("image/heic"),
        "webp" => Some("image/webp"),
        "png" => Some("image/png"),
        _ => None,
    }
}

// ── Validation ───────────────────────────────────────────────────────────

/// Filter a selection down to supported files and apply the batch ceiling.
///
/// Unsupported candidates are dropped (with a warning log); the survivors
/// come back in their original order. Fails with
/// [`ValidationError::TooManyFiles`] when more than `max_count` supported
/// files remain, or [`ValidationError::NoValidFiles`] when none do. On any
/// error zero tasks are created.
pub fn validate(
    candidates: Vec<InputFile>,
    max_count: usize,
) -> Result<Vec<InputFile>, ValidationError> {
    let mut accepted = Vec::with_capacity(candidates.len());
    for file in candidates {
        if SourceFormat::detect(&file).is_some() {
            accepted.push(file);
        } else {
            warn!("Skipping unsupported file: {}", file.name());
        }
    }

    if accepted.len() > max_count {
        return Err(ValidationError::TooManyFiles {
            count: accepted.len(),
            max: max_count,
        });
    }
    if accepted.is_empty() {
        return Err(ValidationError::NoValidFiles);
    }

    debug!("Validation accepted {} files", accepted.len());
    Ok(accepted)
}

/// Like [`validate`], but any unsupported candidate rejects the whole
/// selection with [`ValidationError::InvalidType`].
///
/// This is the behaviour an interactive picker wants; the lenient variant
/// suits programmatic callers that already expect mixed input.
pub fn validate_strict(
    candidates: Vec<InputFile>,
    max_count: usize,
) -> Result<Vec<InputFile>, ValidationError> {
    if let Some(bad) = candidates
        .iter()
        .find(|f| SourceFormat::detect(f).is_none())
    {
        return Err(ValidationError::InvalidType {
            name: bad.name().to_string(),
        });
    }
    validate(candidates, max_count)
}

// ── Display helpers ──────────────────────────────────────────────────────

/// Human-readable file size, 1024-based, at most two decimals.
///
/// `1536` becomes `"1.5 KB"`, `1048576` becomes `"1 MB"`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exponent = (((bytes as f64).ln() / 1024f64.ln()).floor() as usize).min(UNITS.len() - 1);
    let scaled = bytes as f64 / 1024f64.powi(exponent as i32);

    let mut value = format!("{scaled:.2}");
    while value.ends_with('0') {
        value.pop();
    }
    if value.ends_with('.') {
        value.pop();
    }

    format!("{value} {}", UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str) -> InputFile {
        InputFile::from_bytes(name, mime, vec![0u8; 4])
    }

    #[test]
    fn detect_by_mime() {
        assert_eq!(
            SourceFormat::detect(&file("x", "image/png")),
            Some(SourceFormat::Png)
        );
        assert_eq!(
            SourceFormat::detect(&file("x", "image/webp")),
            Some(SourceFormat::WebP)
        );
        // Some environments shout.
        assert_eq!(
            SourceFormat::detect(&file("x", "image/HEIC")),
            Some(SourceFormat::Heic)
        );
    }

    #[test]
    fn detect_falls_back_to_extension() {
        assert_eq!(
            SourceFormat::detect(&file("photo.HEIC", "application/octet-stream")),
            Some(SourceFormat::Heic)
        );
        assert_eq!(
            SourceFormat::detect(&file("photo.png", "")),
            Some(SourceFormat::Png)
        );
        assert_eq!(SourceFormat::detect(&file("notes.txt", "text/plain")), None);
        assert_eq!(SourceFormat::detect(&file("noext", "")), None);
    }

    #[test]
    fn validate_drops_unsupported_and_keeps_order() {
        let accepted = validate(
            vec![
                file("a.png", "image/png"),
                file("b.webp", "image/webp"),
                file("c.txt", "text/plain"),
            ],
            5,
        )
        .expect("two valid files remain");

        let names: Vec<&str> = accepted.iter().map(|f| f.name()).collect();
        assert_eq!(names, ["a.png", "b.webp"]);
    }

    #[test]
    fn validate_rejects_oversized_batch() {
        let candidates: Vec<InputFile> = (0..6).map(|i| file(&format!("{i}.png"), "image/png")).collect();
        let err = validate(candidates, 5).expect_err("6 > 5");
        assert_eq!(err, ValidationError::TooManyFiles { count: 6, max: 5 });
    }

    #[test]
    fn validate_rejects_empty_result() {
        let err = validate(vec![file("c.txt", "text/plain")], 5).expect_err("nothing valid");
        assert_eq!(err, ValidationError::NoValidFiles);

        let err = validate(Vec::new(), 5).expect_err("empty input");
        assert_eq!(err, ValidationError::NoValidFiles);
    }

    #[test]
    fn strict_validation_rejects_mixed_batch() {
        let err = validate_strict(
            vec![file("a.png", "image/png"), file("c.txt", "text/plain")],
            5,
        )
        .expect_err("strict mode fails on c.txt");
        assert_eq!(
            err,
            ValidationError::InvalidType {
                name: "c.txt".into()
            }
        );
    }

    #[test]
    fn strict_validation_passes_clean_batch() {
        let accepted = validate_strict(
            vec![file("a.png", "image/png"), file("b.webp", "image/webp")],
            5,
        )
        .expect("all supported");
        assert_eq!(accepted.len(), 2);
    }

    #[tokio::test]
    async fn memory_read_returns_declared_bytes() {
        let f = InputFile::from_bytes("a.png", "image/png", vec![9, 8, 7]);
        assert_eq!(f.size(), 3);
        let bytes = f.read().await.expect("memory read cannot fail");
        assert_eq!(bytes.as_slice(), &[9, 8, 7]);
    }

    #[tokio::test]
    async fn path_read_reports_missing_file() {
        let f = InputFile {
            name: "gone.png".into(),
            declared_mime: Some("image/png".into()),
            size: 0,
            source: ByteSource::Path(PathBuf::from("/definitely/not/here.png")),
        };
        let err = f.read().await.expect_err("missing file");
        assert!(matches!(err, ConversionError::ReadFailed { .. }));
        assert!(err.to_string().contains("gone.png"));
    }

    #[test]
    fn format_size_matches_display_rules() {
        assert_eq!(format_size(0), "0 Bytes");
        assert_eq!(format_size(512), "512 Bytes");
        assert_eq!(format_size(1024), "1 KB");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(1_048_576), "1 MB");
        assert_eq!(format_size(2_621_440), "2.5 MB");
    }
}
