//! Error types for the imgpdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`ConvertError`] — **Fatal**: the run cannot produce any output at all
//!   (engine missing, input is not a PDF, nothing to pack). Returned as
//!   `Err(ConvertError)` from the top-level entry points in [`crate::convert`].
//!
//! * [`PageError`] — **Non-fatal**: a single image or page failed (decode
//!   glitch, render error, no drawing surface) but every other unit is fine.
//!   Collected in [`crate::output::ComposeOutput::failures`] and
//!   [`crate::output::ExtractionOutput::failures`] so callers can report
//!   partial success instead of silently losing pages.
//!
//! [`EngineError`] is the narrow error type of the [`crate::engine`]
//! capability traits; the pipelines map it into one of the two tiers above.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the imgpdf library.
///
/// Per-unit failures use [`PageError`] and are stored in the run output
/// rather than propagated here.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Capability errors ─────────────────────────────────────────────────
    /// A required external engine is not present at call time.
    #[error(
        "{capability} is not available: {hint}\n\
Check that the library is installed and reachable, then try again."
    )]
    CapabilityUnavailable { capability: String, hint: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Composition was requested with an empty image list.
    #[error("No images to convert; select at least one image")]
    NoImages,

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The data was read, but is not a PDF.
    #[error("'{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// The data was read, but no supported image format was recognised.
    #[error("'{name}' is not a supported image (PNG, JPEG, GIF, BMP, WebP)")]
    NotAnImage { name: String },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' is corrupt: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF is encrypted; encrypted documents are not opened.
    #[error("PDF '{name}' is encrypted and cannot be opened.\nRemove its protection with another tool first.")]
    EncryptedPdf { name: String },

    /// The output document could not be created, extended or serialised.
    #[error("Failed to build the PDF document: {detail}")]
    ComposeFailed { detail: String },

    // ── Archive errors ────────────────────────────────────────────────────
    /// Packing the extracted pages into an archive failed.
    #[error("Failed to create archive '{filename}': {detail}")]
    ArchiveFailed { filename: String, detail: String },

    /// Packing was requested with no extracted pages.
    #[error("No extracted pages to pack")]
    NothingToPack,

    /// Some pages succeeded but at least one failed.
    ///
    /// Returned by [`crate::output::ExtractionOutput::into_result`] when the
    /// caller wants to treat any skipped page as an error.
    #[error("{failed}/{total} pages failed during extraction")]
    PartialFailure {
        success: usize,
        failed: usize,
        total: usize,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Whether this error means an external engine was missing.
    ///
    /// Shells use this to show a single notice instead of an error trace.
    pub fn is_capability_unavailable(&self) -> bool {
        matches!(self, ConvertError::CapabilityUnavailable { .. })
    }
}

/// A non-fatal error for a single image (composition) or page (extraction).
///
/// Page numbers are 1-indexed. The overall run continues.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Source image bytes could not be decoded.
    #[error("Image {page} ('{name}'): decode failed: {detail}")]
    DecodeFailed {
        page: usize,
        name: String,
        detail: String,
    },

    /// Every encode strategy failed; the page was left blank.
    #[error("Image {page} ('{name}'): could not be placed: {detail}")]
    AllStrategiesFailed {
        page: usize,
        name: String,
        detail: String,
    },

    /// No raster surface could be obtained for the page.
    #[error("Page {page}: no drawing surface for {width}x{height} px")]
    SurfaceUnavailable { page: usize, width: u64, height: u64 },

    /// Page rasterisation failed.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// Rendered page could not be PNG-encoded.
    #[error("Page {page}: PNG encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed image or page number this error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::DecodeFailed { page, .. }
            | PageError::AllStrategiesFailed { page, .. }
            | PageError::SurfaceUnavailable { page, .. }
            | PageError::RenderFailed { page, .. }
            | PageError::EncodeFailed { page, .. } => *page,
        }
    }
}

/// Failure reported by an engine implementation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The document bytes could not be parsed.
    #[error("document could not be loaded: {0}")]
    Load(String),

    /// The document is encrypted.
    #[error("document is encrypted")]
    Encrypted,

    /// The requested page does not exist.
    #[error("page index {index} out of range (document has {total} pages)")]
    PageOutOfRange { index: usize, total: usize },

    /// Creating, rendering or serialising failed inside the engine.
    #[error("{0}")]
    Operation(String),

    /// Image data handed to the engine was unusable.
    #[error("image rejected: {0}")]
    Image(#[from] image::ImageError),
}
