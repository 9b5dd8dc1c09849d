//! End-to-end tests for the conversion pipeline.
//!
//! Everything here runs on synthetic in-memory images, so the whole suite
//! is fast and hermetic: no fixtures, no network, no codecs beyond what the
//! crate itself ships.

use chrono::NaiveDate;
use image::{DynamicImage, ImageEncoder, Rgba, RgbaImage};
use quickjpg::{
    convert_batch, export_bundle, export_each, jpg_file_name, Batch, BatchProgressCallback,
    ConversionConfig, Entitlement, HeicDecoder, InputFile, PackagingError, TaskStatus,
    ValidationError,
};
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

fn png_file(name: &str, width: u32, height: u32) -> InputFile {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        width,
        height,
        Rgba([180, 90, 45, 255]),
    ));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("png encode");
    InputFile::from_bytes(name, "image/png", buf)
}

fn webp_file(name: &str, width: u32, height: u32) -> InputFile {
    let img = RgbaImage::from_pixel(width, height, Rgba([30, 60, 220, 255]));
    let mut buf = Vec::new();
    image::codecs::webp::WebPEncoder::new_lossless(&mut buf)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .expect("webp encode");
    InputFile::from_bytes(name, "image/webp", buf)
}

fn broken_png(name: &str) -> InputFile {
    InputFile::from_bytes(name, "image/png", b"definitely not a png".to_vec())
}

fn text_file(name: &str) -> InputFile {
    InputFile::from_bytes(name, "text/plain", b"hello".to_vec())
}

fn heic_file(name: &str) -> InputFile {
    InputFile::from_bytes(name, "image/heic", vec![0u8; 32])
}

struct SolidHeicDecoder;

impl HeicDecoder for SolidHeicDecoder {
    fn decode(
        &self,
        _bytes: &[u8],
    ) -> Result<DynamicImage, Box<dyn std::error::Error + Send + Sync>> {
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            40,
            30,
            Rgba([9, 9, 9, 255]),
        )))
    }
}

/// Records every callback invocation so tests can assert exact ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    BatchStart(usize),
    FileStart(usize, String),
    Progress(usize, u8),
    Complete(usize),
    Error(usize),
    BatchComplete(usize, usize),
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

impl BatchProgressCallback for Recorder {
    fn on_batch_start(&self, total_files: usize) {
        self.events.lock().unwrap().push(Event::BatchStart(total_files));
    }
    fn on_file_start(&self, index: usize, _total: usize, name: &str) {
        self.events
            .lock()
            .unwrap()
            .push(Event::FileStart(index, name.to_string()));
    }
    fn on_file_progress(&self, index: usize, _total: usize, percent: u8) {
        self.events.lock().unwrap().push(Event::Progress(index, percent));
    }
    fn on_file_complete(&self, index: usize, _total: usize, _jpeg_bytes: usize) {
        self.events.lock().unwrap().push(Event::Complete(index));
    }
    fn on_file_error(&self, index: usize, _total: usize, _error: &str) {
        self.events.lock().unwrap().push(Event::Error(index));
    }
    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        self.events
            .lock()
            .unwrap()
            .push(Event::BatchComplete(total_files, success_count));
    }
}

// ── Validation scenarios ─────────────────────────────────────────────────────

#[tokio::test]
async fn mixed_selection_drops_the_text_file() {
    let files = vec![
        png_file("a.png", 10, 10),
        webp_file("b.webp", 10, 10),
        text_file("c.txt"),
    ];

    let batch = convert_batch(files, &ConversionConfig::default())
        .await
        .expect("two valid files remain");

    assert_eq!(batch.len(), 2);
    let names: Vec<&str> = batch.tasks().iter().map(|t| t.file().name()).collect();
    assert_eq!(names, ["a.png", "b.webp"]);
    assert!(batch.all_terminal());
    assert_eq!(batch.succeeded_count(), 2);
}

#[tokio::test]
async fn six_files_exceed_the_standard_limit() {
    let files: Vec<InputFile> = (0..6).map(|i| png_file(&format!("{i}.png"), 4, 4)).collect();

    let err = convert_batch(files, &ConversionConfig::default())
        .await
        .expect_err("6 > 5");

    assert_eq!(err, ValidationError::TooManyFiles { count: 6, max: 5 });
}

#[tokio::test]
async fn pro_tier_raises_the_limit() {
    let files: Vec<InputFile> = (0..6).map(|i| png_file(&format!("{i}.png"), 4, 4)).collect();

    let config = ConversionConfig::builder()
        .entitlement(Entitlement::Pro)
        .build();
    let batch = convert_batch(files, &config).await.expect("6 <= 20");
    assert_eq!(batch.succeeded_count(), 6);
}

#[tokio::test]
async fn strict_mode_rejects_a_mixed_selection() {
    let files = vec![png_file("a.png", 4, 4), text_file("c.txt")];

    let config = ConversionConfig::builder().strict_validation(true).build();
    let err = convert_batch(files, &config)
        .await
        .expect_err("strict mode fails on c.txt");

    assert_eq!(
        err,
        ValidationError::InvalidType {
            name: "c.txt".into()
        }
    );
}

// ── Conversion behaviour ─────────────────────────────────────────────────────

#[tokio::test]
async fn png_converts_to_a_real_jpeg() {
    let batch = convert_batch(
        vec![png_file("photo.png", 200, 100)],
        &ConversionConfig::default(),
    )
    .await
    .expect("validation passes");

    let task = batch.task(0);
    assert_eq!(task.status(), TaskStatus::Succeeded);
    assert_eq!(task.progress(), 100);

    let artifact = task.artifact().expect("succeeded task has an artifact");
    assert_eq!(&artifact.bytes()[..2], &[0xFF, 0xD8], "JPEG SOI marker");
    assert_eq!((artifact.width(), artifact.height()), (200, 100));

    let decoded = image::load_from_memory_with_format(artifact.bytes(), image::ImageFormat::Jpeg)
        .expect("artifact decodes as JPEG");
    assert_eq!((decoded.width(), decoded.height()), (200, 100));

    assert_eq!(jpg_file_name(task.file().name()), "photo.jpg");
}

#[tokio::test]
async fn one_bad_file_does_not_abort_the_batch() {
    let files = vec![
        png_file("good.png", 8, 8),
        broken_png("bad.png"),
        webp_file("tail.webp", 8, 8),
    ];

    let batch = convert_batch(files, &ConversionConfig::default())
        .await
        .expect("all three pass validation");

    assert!(batch.all_terminal());
    assert!(batch.any_succeeded());

    assert_eq!(batch.task(0).status(), TaskStatus::Succeeded);
    assert_eq!(batch.task(2).status(), TaskStatus::Succeeded);

    let failed = batch.task(1);
    assert_eq!(failed.status(), TaskStatus::Failed);
    assert_eq!(failed.progress(), 0, "failures reset progress");
    assert!(failed.artifact().is_none());
    let detail = failed.error_detail().expect("failed task carries a detail");
    assert!(!detail.is_empty());
}

#[tokio::test]
async fn events_are_sequential_with_no_interleaving() {
    let recorder = Arc::new(Recorder::default());
    let config = ConversionConfig::builder()
        .progress_callback(Arc::clone(&recorder) as Arc<dyn BatchProgressCallback>)
        .build();

    let files = vec![png_file("good.png", 8, 8), broken_png("bad.png")];
    let batch = convert_batch(files, &config).await.expect("validates");
    assert!(batch.all_terminal());

    // The corrupt file reads fine (25) and then fails in decode, so the
    // whole event stream is deterministic.
    assert_eq!(
        recorder.take(),
        vec![
            Event::BatchStart(2),
            Event::FileStart(0, "good.png".into()),
            Event::Progress(0, 25),
            Event::Progress(0, 50),
            Event::Progress(0, 75),
            Event::Progress(0, 100),
            Event::Complete(0),
            Event::FileStart(1, "bad.png".into()),
            Event::Progress(1, 25),
            Event::Error(1),
            Event::BatchComplete(2, 1),
        ]
    );
}

#[tokio::test]
async fn progress_is_monotone_and_ends_at_100_for_successes() {
    let recorder = Arc::new(Recorder::default());
    let config = ConversionConfig::builder()
        .progress_callback(Arc::clone(&recorder) as Arc<dyn BatchProgressCallback>)
        .build();

    let files = vec![png_file("a.png", 8, 8), webp_file("b.webp", 8, 8)];
    convert_batch(files, &config).await.expect("validates");

    let events = recorder.take();
    for index in 0..2 {
        let percents: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                Event::Progress(i, p) if *i == index => Some(*p),
                _ => None,
            })
            .collect();
        assert!(
            percents.windows(2).all(|w| w[0] <= w[1]),
            "file {index} progress must be non-decreasing: {percents:?}"
        );
        assert_eq!(percents.last(), Some(&100));
    }
}

// ── HEIC dispatch ────────────────────────────────────────────────────────────

#[tokio::test]
async fn heic_fails_cleanly_without_a_decoder() {
    let batch = convert_batch(
        vec![heic_file("photo.heic"), png_file("a.png", 4, 4)],
        &ConversionConfig::default(),
    )
    .await
    .expect("heic passes validation");

    assert_eq!(batch.task(0).status(), TaskStatus::Failed);
    let detail = batch.task(0).error_detail().expect("detail");
    assert!(detail.contains("decoder"), "got: {detail}");

    // The rest of the batch is unaffected.
    assert_eq!(batch.task(1).status(), TaskStatus::Succeeded);
}

#[tokio::test]
async fn heic_converts_through_an_injected_decoder() {
    let recorder = Arc::new(Recorder::default());
    let config = ConversionConfig::builder()
        .heic_decoder(Arc::new(SolidHeicDecoder))
        .progress_callback(Arc::clone(&recorder) as Arc<dyn BatchProgressCallback>)
        .build();

    let batch = convert_batch(vec![heic_file("photo.heic")], &config)
        .await
        .expect("validates");

    let task = batch.task(0);
    assert_eq!(task.status(), TaskStatus::Succeeded);
    let artifact = task.artifact().expect("artifact");
    assert_eq!((artifact.width(), artifact.height()), (40, 30));

    // Same checkpoint sequence as the native formats.
    let percents: Vec<u8> = recorder
        .take()
        .into_iter()
        .filter_map(|e| match e {
            Event::Progress(_, p) => Some(p),
            _ => None,
        })
        .collect();
    assert_eq!(percents, vec![25, 50, 75, 100]);
}

// ── Export ───────────────────────────────────────────────────────────────────

async fn mixed_outcome_batch() -> Batch {
    convert_batch(
        vec![
            png_file("a.png", 6, 6),
            webp_file("b.webp", 6, 6),
            broken_png("bad.png"),
        ],
        &ConversionConfig::default(),
    )
    .await
    .expect("validates")
}

#[tokio::test]
async fn export_each_skips_failures_and_is_idempotent() {
    let batch = mixed_outcome_batch().await;

    let first = export_each(&batch);
    let names: Vec<&str> = first.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["a.jpg", "b.jpg"]);

    let second = export_each(&batch);
    assert_eq!(first, second, "repeat exports must be byte-identical");
}

#[tokio::test]
async fn export_bundle_contains_exactly_the_succeeded_files() {
    let batch = mixed_outcome_batch().await;
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");

    let bundle = export_bundle(&batch, date).expect("two files succeeded");
    assert_eq!(bundle.name, "quickjpg-converted-2024-06-01.zip");

    let again = export_bundle(&batch, date).expect("still exportable");
    assert_eq!(bundle, again, "repeat exports must be byte-identical");

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(&bundle.bytes[..]))
        .expect("bundle is a readable zip");
    let mut entry_names: Vec<String> = (0..archive.len())
        .map(|i| archive.by_index(i).expect("entry").name().to_string())
        .collect();
    entry_names.sort();
    assert_eq!(entry_names, ["a.jpg", "b.jpg"]);
}

#[tokio::test]
async fn bundling_an_all_failed_batch_is_an_error() {
    let batch = convert_batch(
        vec![broken_png("x.png"), broken_png("y.png")],
        &ConversionConfig::default(),
    )
    .await
    .expect("they validate; they just don't decode");

    assert!(!batch.any_succeeded());
    let date = NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date");
    assert_eq!(
        export_bundle(&batch, date).expect_err("nothing to bundle"),
        PackagingError::EmptyBundle
    );

    // The failed export changed nothing; per-task state is still readable.
    assert!(batch.all_terminal());
}

// ── Disk-backed inputs ───────────────────────────────────────────────────────

#[tokio::test]
async fn files_can_be_read_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("shot.png");

    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(12, 5, Rgba([1, 2, 3, 255])));
    let mut buf = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("png encode");
    std::fs::write(&path, &buf).expect("write fixture");

    let file = InputFile::from_path(&path).await.expect("stat succeeds");
    assert_eq!(file.name(), "shot.png");
    assert_eq!(file.declared_mime(), Some("image/png"));
    assert_eq!(file.size(), buf.len() as u64);

    let batch = convert_batch(vec![file], &ConversionConfig::default())
        .await
        .expect("validates");
    assert_eq!(batch.task(0).status(), TaskStatus::Succeeded);
    let artifact = batch.task(0).artifact().expect("artifact");
    assert_eq!((artifact.width(), artifact.height()), (12, 5));
}
