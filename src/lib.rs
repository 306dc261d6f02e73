//! # imgpdf
//!
//! Assemble raster images into a paginated PDF, and render PDF pages back
//! into PNG images.
//!
//! ## Pipeline Overview
//!
//! ```text
//! images ──▶ Page Composer ──▶ converted-images.pdf
//!            (flatten → JPEG → fit on A4 → one page per image)
//!
//! PDF ──▶ Page Extractor ──▶ <name>-pagina-001.png …  ──▶ Archive Packer ──▶ <name>.zip
//!         (render at 2× → PNG)
//! ```
//!
//! PDF building, parsing and rasterising go through the [`PdfEngine`]
//! capability; [`PdfiumEngine`] implements it with pdfium. Image codecs come
//! from the `image` crate, archives from `zip`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgpdf::{extract_pages, pack_archive, ConversionConfig, PdfEngine, PdfSource, PdfiumEngine};
//! use std::path::Path;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = PdfiumEngine::bind(None)?;
//!     let pdf = PdfSource::from_path(Path::new("report.pdf"))?;
//!
//!     let output = extract_pages(Some(&engine as &dyn PdfEngine), &pdf, &ConversionConfig::default())?;
//!     for failure in &output.failures {
//!         eprintln!("skipped: {failure}");
//!     }
//!     pack_archive(&output.pages, &pdf.name)?.save_into(Path::new("out"))?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `imgpdf` binary (clap + anyhow + tracing-subscriber + indicatif + tokio) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! imgpdf = { version = "0.1", default-features = false }
//! ```
//!
//! ## Compression Levels
//!
//! | Level | JPEG quality | Use when |
//! |-------|--------------|----------|
//! | `FAST`   | 0.95 | fidelity matters more than size |
//! | `MEDIUM` | 0.75 | default |
//! | `SLOW`   | 0.50 | the PDF has to be small |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod session;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{jpeg_quality_for_name, CompressionLevel, ConversionConfig, ConversionConfigBuilder};
pub use convert::{compose_images, extract_pages, extract_pages_from_bytes, pack_archive};
pub use engine::pdfium::PdfiumEngine;
pub use engine::{DocumentWriter, EncodedImage, ImageEncoding, PdfEngine, RenderableDocument};
pub use error::{ConvertError, EngineError, PageError};
pub use output::{
    Artifact, ComposeOutput, ComposeStats, ExtractionOutput, ExtractionStats, PageImage,
    PlacedImage,
};
pub use pipeline::encode::EncodeStrategy;
pub use pipeline::input::PdfSource;
pub use pipeline::layout::{PageGeometry, Rect};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use session::{ImageSession, SourceImage};
