//! PDF engine capability: the seam between the pipelines and the library
//! that actually builds, parses and rasterises PDF documents.
//!
//! The pipelines never reach for a global engine handle. A caller binds an
//! engine once (see [`pdfium::PdfiumEngine::bind`]) and passes it into
//! [`crate::convert`]; passing `None` means the engine is unavailable and the
//! run stops with [`crate::ConvertError::CapabilityUnavailable`].
//!
//! ## Data Flow
//!
//! ```text
//! compose:  create_document ──▶ place_image / add_page … ──▶ finish (bytes)
//! extract:  open_document ──▶ page_count ──▶ page_size / render_page …
//! ```
//!
//! Engines are used from one thread at a time, so no `Send`/`Sync` bound is
//! imposed; pdfium in particular is not safe to drive concurrently.

pub mod pdfium;

#[cfg(test)]
pub(crate) mod testing;

use crate::error::EngineError;
use crate::pipeline::layout::{PageGeometry, Rect};
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Encoding of image bytes handed to a [`DocumentWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageEncoding {
    /// Lossy baseline JPEG; embedded without re-encoding where the engine can.
    Jpeg,
    /// Lossless PNG.
    Png,
}

/// An encoded raster ready for placement.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub encoding: ImageEncoding,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Entry point of an engine implementation.
pub trait PdfEngine {
    /// Human-readable engine name for logs and notices.
    fn name(&self) -> &str;

    /// Start a new document whose first page is already present.
    fn create_document<'a>(
        &'a self,
        page: PageGeometry,
    ) -> Result<Box<dyn DocumentWriter + 'a>, EngineError>;

    /// Parse a PDF held in memory.
    fn open_document<'a>(
        &'a self,
        bytes: Vec<u8>,
    ) -> Result<Box<dyn RenderableDocument + 'a>, EngineError>;
}

/// A document under construction.
pub trait DocumentWriter {
    /// Number of pages created so far (at least 1).
    fn page_count(&self) -> usize;

    /// Append a blank page with the document's geometry.
    fn add_page(&mut self) -> Result<(), EngineError>;

    /// Place `image` on the last page at `rect` (millimetres, top-left origin).
    fn place_image(&mut self, image: &EncodedImage, rect: Rect) -> Result<(), EngineError>;

    /// Serialise the finished document.
    fn finish(self: Box<Self>) -> Result<Vec<u8>, EngineError>;
}

/// A parsed document that can be rasterised page by page.
pub trait RenderableDocument {
    fn page_count(&self) -> usize;

    /// Intrinsic size of page `index` (0-based) in points.
    fn page_size(&self, index: usize) -> Result<(f32, f32), EngineError>;

    /// Rasterise page `index` (0-based) at `scale` × its point size.
    fn render_page(&self, index: usize, scale: f32) -> Result<DynamicImage, EngineError>;
}
