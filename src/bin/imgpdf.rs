//! CLI binary for imgpdf.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, reads inputs, and writes the resulting artifacts.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use imgpdf::pipeline::input::{display_name, map_io_error};
use imgpdf::{
    compose_images, extract_pages, pack_archive, CompressionLevel, ComposeStats,
    ConversionConfig, ConversionProgressCallback, ConvertError, ExtractionStats, ImageSession,
    PageError, PageGeometry, PdfEngine, PdfSource, PdfiumEngine, PlacedImage, ProgressCallback,
    SourceImage,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::warn;
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

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live progress bar plus one log line per
/// image or page.
struct CliProgressCallback {
    bar: ProgressBar,
    /// "image" or "page", used in log lines.
    unit: &'static str,
    unit_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    /// Nothing is drawn until `on_conversion_start` sets the length.
    fn new(unit: &'static str) -> Arc<Self> {
        Arc::new(Self {
            bar: ProgressBar::new(0),
            unit,
            unit_started: Mutex::new(None),
        })
    }

    fn elapsed_secs(&self) -> f64 {
        self.unit_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_conversion_start(&self, total_pages: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} {msg}  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total_pages as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Converting");
        self.bar.set_message(format!("{}s", self.unit));
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Starting conversion of {total_pages} {}s…", self.unit))
        ));
    }

    fn on_page_start(&self, _page_num: usize, _total: usize) {
        if let Ok(mut started) = self.unit_started.lock() {
            *started = Some(Instant::now());
        }
    }

    fn on_page_complete(&self, page_num: usize, total: usize, percent: u8) {
        self.bar.println(format!(
            "  {} {} {:>3}/{:<3}  {:>4}  {}",
            green("✓"),
            self.unit,
            page_num,
            total,
            dim(&format!("{percent}%")),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str, percent: u8) {
        // Keep log lines on one terminal row.
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };

        self.bar.println(format!(
            "  {} {} {:>3}/{:<3}  {:>4}  {}  {}",
            red("✗"),
            self.unit,
            page_num,
            total,
            dim(&format!("{percent}%")),
            red(&msg),
            dim(&format!("{:.1}s", self.elapsed_secs())),
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        if failed == 0 {
            eprintln!(
                "{} {} {}s converted successfully",
                green("✔"),
                bold(&success_count.to_string()),
                self.unit
            );
        } else {
            eprintln!(
                "{} {}/{} {}s converted  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                self.unit,
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Put three scans into one PDF (written to ./converted-images.pdf)
  imgpdf compose scan1.png scan2.jpg scan3.webp

  # Smallest file, landscape pages, custom name and directory
  imgpdf compose --compression slow --landscape --name album.pdf -o out/ *.jpg

  # Render every page of a PDF and pack them into report.zip
  imgpdf extract report.pdf -o out/

  # Write one PNG per page instead of an archive
  imgpdf extract --separate report.pdf

  # Higher resolution
  imgpdf extract --scale 3 scan.pdf

  # Machine-readable report
  imgpdf --json extract report.pdf

COMPRESSION LEVELS:
  Level    JPEG quality  Result
  ──────   ────────────  ──────────────────────────────
  fast     0.95          best fidelity, largest file
  medium   0.75          balanced (default)
  slow     0.50          smallest file, lowest fidelity

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH         Path to libpdfium, or the directory holding it
  IMGPDF_OUTPUT           Default output directory
  IMGPDF_COMPRESSION      Default compression level
  RUST_LOG                Overrides the log filter

SETUP:
  imgpdf needs the pdfium shared library. It is looked up in this order:
  --pdfium-lib / PDFIUM_LIB_PATH, the working directory, system paths.
  Prebuilt binaries: https://github.com/bblanchon/pdfium-binaries
"#;

/// Assemble images into a PDF, or turn PDF pages back into PNG images.
#[derive(Parser, Debug)]
#[command(
    name = "imgpdf",
    version,
    about = "Assemble images into a PDF, or turn PDF pages back into PNG images",
    long_about = "Assemble an ordered list of images (PNG, JPEG, GIF, BMP, WebP) into a \
paginated A4 PDF, one image per page, or render every page of a PDF into PNG images \
packed in a ZIP archive. PDF work is done by the pdfium library.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to libpdfium, or the directory holding it.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Largest raster surface in pixels (width × height).
    #[arg(long, global = true, env = "IMGPDF_MAX_SURFACE_PIXELS", default_value_t = 100_000_000)]
    max_surface_pixels: u64,

    /// Print a structured JSON report on stdout.
    #[arg(long, global = true, env = "IMGPDF_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "IMGPDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "IMGPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "IMGPDF_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Assemble images into one PDF, one page per image, in argument order.
    Compose(ComposeArgs),
    /// Render every page of a PDF into a PNG image.
    Extract(ExtractArgs),
}

#[derive(Args, Debug)]
struct ComposeArgs {
    /// Image files; non-images are skipped with a warning.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Directory to write the PDF into.
    #[arg(short, long, env = "IMGPDF_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Output quality: fast (best), medium, slow (smallest).
    #[arg(long, env = "IMGPDF_COMPRESSION", value_enum, default_value = "medium")]
    compression: CompressionArg,

    /// Use A4 landscape pages.
    #[arg(long)]
    landscape: bool,

    /// Page margin in millimetres.
    #[arg(long, env = "IMGPDF_MARGIN_MM", default_value_t = 10.0)]
    margin_mm: f32,

    /// Filename of the PDF.
    #[arg(long, default_value = imgpdf::config::DEFAULT_PDF_NAME)]
    name: String,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// The PDF file.
    pdf: PathBuf,

    /// Directory to write the archive or images into.
    #[arg(short, long, env = "IMGPDF_OUTPUT", default_value = ".")]
    output: PathBuf,

    /// Write one PNG per page instead of a ZIP archive.
    #[arg(long)]
    separate: bool,

    /// Render scale relative to the page's point size (0.25–8.0).
    #[arg(long, env = "IMGPDF_SCALE", default_value_t = 2.0)]
    scale: f32,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CompressionArg {
    Fast,
    Medium,
    Slow,
}

impl From<CompressionArg> for CompressionLevel {
    fn from(v: CompressionArg) -> Self {
        match v {
            CompressionArg::Fast => CompressionLevel::Fast,
            CompressionArg::Medium => CompressionLevel::Medium,
            CompressionArg::Slow => CompressionLevel::Slow,
        }
    }
}

// ── JSON reports ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ComposeReport<'a> {
    written: &'a Path,
    placed: &'a [PlacedImage],
    skipped_inputs: &'a [PathBuf],
    failures: &'a [PageError],
    stats: &'a ComposeStats,
}

#[derive(Serialize)]
struct ExtractReport<'a> {
    source: &'a str,
    written: &'a [PathBuf],
    failures: &'a [PageError],
    stats: &'a ExtractionStats,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
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

    // ── Bind the PDF engine ──────────────────────────────────────────────
    // pdfium is loaded once per process. A missing library is not fatal
    // here: the library call reports it and we print a single notice.
    let bound = tokio::task::block_in_place(|| PdfiumEngine::bind(cli.pdfium_lib.as_deref()));
    let (engine, bind_error) = match bound {
        Ok(engine) => (Some(engine), None),
        Err(e) => (None, Some(e)),
    };
    let engine_ref = engine.as_ref().map(|e| e as &dyn PdfEngine);

    let result = match &cli.command {
        Command::Compose(args) => run_compose(&cli, args, engine_ref, show_progress).await,
        Command::Extract(args) => run_extract(&cli, args, engine_ref, show_progress).await,
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            if let Some(convert_err) = err.downcast_ref::<ConvertError>() {
                if convert_err.is_capability_unavailable() {
                    let notice = bind_error
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| convert_err.to_string());
                    eprintln!("{} {}", red("✘"), notice);
                    return Ok(ExitCode::FAILURE);
                }
            }
            Err(err)
        }
    }
}

fn progress_callback(show: bool, unit: &'static str) -> Option<ProgressCallback> {
    show.then(|| CliProgressCallback::new(unit) as Arc<dyn ConversionProgressCallback>)
}

async fn run_compose(
    cli: &Cli,
    args: &ComposeArgs,
    engine: Option<&dyn PdfEngine>,
    show_progress: bool,
) -> Result<()> {
    let mut page = if args.landscape {
        PageGeometry::a4_landscape()
    } else {
        PageGeometry::a4_portrait()
    };
    page = page.with_margin(args.margin_mm);

    let mut builder = ConversionConfig::builder()
        .compression(args.compression.into())
        .page(page)
        .max_surface_pixels(cli.max_surface_pixels)
        .pdf_filename(args.name.clone());
    if let Some(cb) = progress_callback(show_progress, "image") {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Read inputs ──────────────────────────────────────────────────────
    let mut session = ImageSession::new();
    let mut skipped = Vec::new();
    for path in &args.images {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| map_io_error(path, e))
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let modified = tokio::fs::metadata(path)
            .await
            .and_then(|m| m.modified())
            .ok();
        match SourceImage::from_bytes(display_name(path), bytes, modified) {
            Ok(image) => session.push(image),
            Err(e @ ConvertError::NotAnImage { .. }) => {
                warn!("{}", e);
                if !cli.quiet {
                    eprintln!("{} skipping {}: not an image", cyan("⚠"), path.display());
                }
                skipped.push(path.clone());
            }
            Err(e) => return Err(e.into()),
        }
    }

    // ── Compose ──────────────────────────────────────────────────────────
    let output = tokio::task::block_in_place(|| compose_images(engine, session.images(), &config))
        .context("Composition failed")?;
    let written = tokio::task::block_in_place(|| output.pdf.save_into(&args.output))
        .context("Failed to save PDF")?;

    if cli.json {
        let report = ComposeReport {
            written: &written,
            placed: &output.placed,
            skipped_inputs: &skipped,
            failures: &output.failures,
            stats: &output.stats,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        for failure in &output.failures {
            eprintln!("  {} {}", red("✗"), failure);
        }
        eprintln!(
            "{}  {}/{} images  {}ms  →  {}",
            if output.failures.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            output.stats.placed_images,
            output.stats.total_images,
            output.stats.duration_ms,
            bold(&written.display().to_string()),
        );
        if output.stats.fallback_images > 0 {
            eprintln!(
                "   {}",
                dim(&format!(
                    "{} images placed full-page by a fallback encoder",
                    output.stats.fallback_images
                ))
            );
        }
    }
    Ok(())
}

async fn run_extract(
    cli: &Cli,
    args: &ExtractArgs,
    engine: Option<&dyn PdfEngine>,
    show_progress: bool,
) -> Result<()> {
    let mut builder = ConversionConfig::builder()
        .render_scale(args.scale)
        .max_surface_pixels(cli.max_surface_pixels);
    if let Some(cb) = progress_callback(show_progress, "page") {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let bytes = tokio::fs::read(&args.pdf)
        .await
        .map_err(|e| map_io_error(&args.pdf, e))
        .with_context(|| format!("Failed to read {}", args.pdf.display()))?;
    let pdf = PdfSource::from_bytes(display_name(&args.pdf), bytes)?;

    let output = tokio::task::block_in_place(|| extract_pages(engine, &pdf, &config))
        .context("Extraction failed")?;

    let written: Vec<PathBuf> = tokio::task::block_in_place(|| -> Result<Vec<PathBuf>> {
        if args.separate {
            output
                .pages
                .iter()
                .map(|page| -> Result<PathBuf> { Ok(page.to_artifact()?.save_into(&args.output)?) })
                .collect()
        } else {
            let archive = pack_archive(&output.pages, &pdf.name)?;
            Ok(vec![archive.save_into(&args.output)?])
        }
    })
    .context("Failed to save extracted pages")?;

    if cli.json {
        let report = ExtractReport {
            source: &pdf.name,
            written: &written,
            failures: &output.failures,
            stats: &output.stats,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise report")?
        );
    } else if !cli.quiet {
        for failure in &output.failures {
            eprintln!("  {} {}", red("✗"), failure);
        }
        let target = match written.as_slice() {
            [single] => single.display().to_string(),
            _ => format!("{} files in {}", written.len(), args.output.display()),
        };
        eprintln!(
            "{}  {}/{} pages  {}ms  →  {}",
            if output.failures.is_empty() {
                green("✔")
            } else {
                cyan("⚠")
            },
            output.stats.extracted_pages,
            output.stats.total_pages,
            output.stats.duration_ms,
            bold(&target),
        );
    }
    Ok(())
}
