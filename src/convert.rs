//! Public entry points.
//!
//! Each function takes the PDF engine as an explicit `Option`: `None` means
//! the engine could not be bound in this process, and the call returns
//! [`ConvertError::CapabilityUnavailable`] without producing any output.
//! Callers typically bind once at startup:
//!
//! ```rust,no_run
//! use imgpdf::{compose_images, ConversionConfig, ImageSession, PdfiumEngine};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = PdfiumEngine::bind(None).ok();
//!
//! let mut session = ImageSession::new();
//! session.add_files(&["page1.png", "page2.jpg"]);
//!
//! let config = ConversionConfig::default();
//! let output = compose_images(
//!     engine.as_ref().map(|e| e as &dyn imgpdf::PdfEngine),
//!     session.images(),
//!     &config,
//! )?;
//! output.pdf.save_into(std::path::Path::new("."))?;
//! # Ok(())
//! # }
//! ```

use crate::config::ConversionConfig;
use crate::engine::pdfium::CAPABILITY_NAME;
use crate::engine::PdfEngine;
use crate::error::ConvertError;
use crate::output::{Artifact, ComposeOutput, ExtractionOutput, PageImage};
use crate::pipeline::input::PdfSource;
use crate::pipeline::{archive, compose, extract};
use crate::session::SourceImage;

fn require_engine(engine: Option<&dyn PdfEngine>) -> Result<&dyn PdfEngine, ConvertError> {
    engine.ok_or_else(|| ConvertError::CapabilityUnavailable {
        capability: CAPABILITY_NAME.to_string(),
        hint: "no PDF engine was bound for this run".to_string(),
    })
}

/// Assemble `images` into one PDF, one page per image, in order.
///
/// # Errors
/// * [`ConvertError::CapabilityUnavailable`] if `engine` is `None`
/// * [`ConvertError::NoImages`] if `images` is empty
/// * [`ConvertError::ComposeFailed`] if the document itself cannot be built
///
/// Individual images that cannot be placed leave a blank page and are listed
/// in [`ComposeOutput::failures`].
pub fn compose_images(
    engine: Option<&dyn PdfEngine>,
    images: &[SourceImage],
    config: &ConversionConfig,
) -> Result<ComposeOutput, ConvertError> {
    let engine = require_engine(engine)?;
    compose::compose(engine, images, config)
}

/// Render every page of `pdf` into a PNG.
///
/// # Errors
/// * [`ConvertError::CapabilityUnavailable`] if `engine` is `None`
/// * [`ConvertError::CorruptPdf`] or [`ConvertError::EncryptedPdf`] if the
///   document cannot be opened
///
/// Pages that fail are skipped and listed in [`ExtractionOutput::failures`];
/// use [`ExtractionOutput::into_result`] to treat them as an error.
pub fn extract_pages(
    engine: Option<&dyn PdfEngine>,
    pdf: &PdfSource,
    config: &ConversionConfig,
) -> Result<ExtractionOutput, ConvertError> {
    let engine = require_engine(engine)?;
    extract::extract(engine, pdf, config)
}

/// Like [`extract_pages`] for PDF bytes that did not come from a file.
pub fn extract_pages_from_bytes(
    engine: Option<&dyn PdfEngine>,
    name: &str,
    bytes: Vec<u8>,
    config: &ConversionConfig,
) -> Result<ExtractionOutput, ConvertError> {
    let engine = require_engine(engine)?;
    let pdf = PdfSource::from_bytes(name, bytes)?;
    extract::extract(engine, &pdf, config)
}

/// Bundle extracted pages into `<basename>.zip`.
///
/// Needs no engine. Fails as a whole with [`ConvertError::ArchiveFailed`] or
/// [`ConvertError::NothingToPack`].
pub fn pack_archive(pages: &[PageImage], source_name: &str) -> Result<Artifact, ConvertError> {
    archive::pack(pages, source_name)
}
