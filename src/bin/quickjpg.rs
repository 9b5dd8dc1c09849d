//! CLI binary for quickjpg.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, renders progress, and writes artifacts to disk.

use anyhow::{Context, Result};
use clap::Parser;
use quickjpg::{
    convert_batch, export_bundle_today, export_each, format_size, jpg_file_name,
    BatchProgressCallback, BatchSummary, ConversionConfig, Entitlement, InputFile,
    ProgressCallback, TaskStatus,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar across the batch plus a ✓/✗ log line
/// per file as it finishes.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Name of the file currently converting, for the bar message.
    current: Mutex<String>,
    errors: AtomicUsize,
}

impl CliProgressCallback {
    /// Create a callback whose bar length is set by `on_batch_start`.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0); // length set in on_batch_start

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            current: Mutex::new(String::new()),
            errors: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} files  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize) {
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!(
                "Converting {total_files} file{} to JPEG…",
                if total_files == 1 { "" } else { "s" }
            ))
        ));
    }

    fn on_file_start(&self, _index: usize, _total: usize, name: &str) {
        *self.current.lock().unwrap() = name.to_string();
        self.bar.set_message(name.to_string());
    }

    fn on_file_progress(&self, _index: usize, _total: usize, percent: u8) {
        let name = self.current.lock().unwrap().clone();
        self.bar.set_message(format!("{name}  {percent}%"));
    }

    fn on_file_complete(&self, index: usize, total: usize, jpeg_bytes: usize) {
        let name = self.current.lock().unwrap().clone();
        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}  {}",
            green("✓"),
            index + 1,
            total,
            name,
            dim(&format_size(jpeg_bytes as u64)),
        ));
        self.bar.inc(1);
    }

    fn on_file_error(&self, index: usize, total: usize, error: &str) {
        self.errors.fetch_add(1, Ordering::SeqCst);

        // Truncate very long error messages to keep output tidy.
        let msg = if error.len() > 80 {
            format!("{}\u{2026}", &error[..79])
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {:>3}/{:<3}  {}",
            red("✗"),
            index + 1,
            total,
            red(&msg),
        ));
        self.bar.inc(1);
    }

    fn on_batch_complete(&self, total_files: usize, success_count: usize) {
        let failed = self.errors.load(Ordering::SeqCst);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} file{} converted successfully",
                green("✔"),
                bold(&success_count.to_string()),
                if success_count == 1 { "" } else { "s" }
            );
        } else {
            eprintln!(
                "{} {}/{} files converted  ({} failed)",
                if failed == total_files {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_files,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert a handful of images into the current directory
  quickjpg photo.heic diagram.webp screenshot.png

  # Write outputs somewhere else
  quickjpg *.png -o converted/

  # One dated zip instead of individual files
  quickjpg *.webp --zip -o exports/

  # Smaller files, lower quality
  quickjpg --quality 70 scan.png

  # Pro tier: up to 20 files per batch
  quickjpg --pro IMG_*.HEIC

  # Machine-readable result report
  quickjpg --json photo.png > report.json

SUPPORTED FORMATS:
  Input    Detection                    Decoder
  ───────  ───────────────────────────  ─────────────────────────────
  PNG      image/png or .png            built in
  WEBP     image/webp or .webp          built in
  HEIC     image/heic or .heic          external (library integration)

  HEIC conversion requires embedding quickjpg as a library with a
  HeicDecoder implementation; from this binary, HEIC files are reported
  as failed while the rest of the batch converts.

BATCH LIMITS:
  standard   5 files per batch
  pro       20 files per batch   (--pro or QUICKJPG_PRO=true)

ENVIRONMENT VARIABLES:
  QUICKJPG_PRO      Set to 'true' to enable the pro batch limit
  QUICKJPG_OUTPUT   Default output directory (same as -o)
"#;

/// Convert HEIC, WEBP, and PNG images to JPEG.
#[derive(Parser, Debug)]
#[command(
    name = "quickjpg",
    version,
    about = "Convert HEIC, WEBP, and PNG images to JPEG",
    long_about = "Convert batches of HEIC, WEBP, and PNG images to JPEG. Files convert one at a \
time, in order; a failed file is reported and skipped without aborting the rest of the batch.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Image files to convert.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory to write converted files (created if missing).
    #[arg(short, long, env = "QUICKJPG_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Write one dated zip bundle instead of individual .jpg files.
    #[arg(long)]
    zip: bool,

    /// JPEG quality (1–100).
    #[arg(long, default_value_t = 90,
          value_parser = clap::value_parser!(u8).range(1..=100))]
    quality: u8,

    /// Use the pro batch limit (20 files instead of 5).
    #[arg(long, env = "QUICKJPG_PRO")]
    pro: bool,

    /// Reject the whole selection if it contains any unsupported file.
    #[arg(long)]
    strict: bool,

    /// Output a structured JSON report instead of log lines.
    #[arg(long)]
    json: bool,

    /// Disable the progress bar.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

// ── JSON report ──────────────────────────────────────────────────────────────

#[derive(serde::Serialize)]
struct FileReport {
    name: String,
    status: TaskStatus,
    progress: u8,
    output: Option<String>,
    jpeg_bytes: Option<usize>,
    error: Option<String>,
}

#[derive(serde::Serialize)]
struct BatchReport {
    summary: BatchSummary,
    files: Vec<FileReport>,
    written: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Resolve inputs ───────────────────────────────────────────────────
    let mut files = Vec::with_capacity(cli.files.len());
    for path in &cli.files {
        let file = InputFile::from_path(path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;
        files.push(file);
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new_dynamic() as Arc<dyn BatchProgressCallback>)
    } else {
        None
    };

    let mut builder = ConversionConfig::builder()
        .jpeg_quality(cli.quality)
        .entitlement(if cli.pro {
            Entitlement::Pro
        } else {
            Entitlement::Standard
        })
        .strict_validation(cli.strict);
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build();

    // ── Run conversion ───────────────────────────────────────────────────
    let start = Instant::now();
    let batch = convert_batch(files, &config)
        .await
        .context("Validation failed")?;
    let summary = BatchSummary {
        total_files: batch.len(),
        succeeded: batch.succeeded_count(),
        failed: batch.failed_count(),
        duration_ms: start.elapsed().as_millis() as u64,
    };

    // ── Write outputs ────────────────────────────────────────────────────
    let mut written = Vec::new();
    if batch.any_succeeded() {
        tokio::fs::create_dir_all(&cli.output)
            .await
            .with_context(|| format!("Failed to create {}", cli.output.display()))?;

        let exports = if cli.zip {
            vec![export_bundle_today(&batch).context("Bundle export failed")?]
        } else {
            export_each(&batch)
        };

        for export in exports {
            let path = cli.output.join(&export.name);
            tokio::fs::write(&path, &export.bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written.push(path.display().to_string());
        }
    }

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        let files = batch
            .tasks()
            .iter()
            .map(|task| FileReport {
                name: task.file().name().to_string(),
                status: task.status(),
                progress: task.progress(),
                output: (task.status() == TaskStatus::Succeeded)
                    .then(|| jpg_file_name(task.file().name())),
                jpeg_bytes: task.artifact().map(|a| a.len()),
                error: task.error_detail(),
            })
            .collect();
        let report = BatchReport {
            summary,
            files,
            written,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        if !show_progress {
            eprintln!(
                "Converted {}/{} files in {}ms",
                summary.succeeded, summary.total_files, summary.duration_ms
            );
            if summary.failed > 0 {
                eprintln!("  {} files failed", summary.failed);
            }
        }
        for path in &written {
            eprintln!("   {} {}", dim("→"), bold(path));
        }
    }

    if !batch.any_succeeded() {
        anyhow::bail!("All {} conversions failed", summary.total_files);
    }

    Ok(())
}
