//! [`PdfEngine`] implementation backed by the pdfium C++ library through
//! `pdfium-render`.
//!
//! ## Locating the library
//!
//! [`PdfiumEngine::bind`] tries, in order: an explicit path, the
//! `PDFIUM_LIB_PATH` environment variable, the working directory, then the
//! system library search path. A directory is resolved to the platform's
//! library filename inside it. If nothing binds, the failure surfaces as
//! [`ConvertError::CapabilityUnavailable`] so the shell can show one notice.

use super::{DocumentWriter, EncodedImage, ImageEncoding, PdfEngine, RenderableDocument};
use crate::error::{ConvertError, EngineError};
use crate::pipeline::layout::{mm_to_points, PageGeometry, Rect};
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an existing pdfium library or its directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Name shown in notices when pdfium cannot be bound.
pub const CAPABILITY_NAME: &str = "PDFium engine";

/// A bound pdfium library.
pub struct PdfiumEngine {
    pdfium: Pdfium,
}

impl PdfiumEngine {
    /// Bind to a pdfium library.
    ///
    /// `library_path` may name the library file or the directory holding it.
    pub fn bind(library_path: Option<&Path>) -> Result<Self, ConvertError> {
        let explicit = library_path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => {
                let file = resolve_library_file(&path);
                debug!("Binding pdfium from {}", file.display());
                Pdfium::bind_to_library(&file)
            }
            None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library()),
        }
        .map_err(|e| ConvertError::CapabilityUnavailable {
            capability: CAPABILITY_NAME.to_string(),
            hint: format!(
                "{e:?}. Place libpdfium next to the executable, install it system-wide, \
                 or set {PDFIUM_LIB_PATH_ENV}=/path/to/libpdfium"
            ),
        })?;

        info!("PDFium engine bound");
        Ok(Self {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// The bound library, for inspecting documents beyond what
    /// [`PdfEngine`] exposes.
    pub fn pdfium(&self) -> &Pdfium {
        &self.pdfium
    }
}

fn resolve_library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

fn op_err(e: PdfiumError) -> EngineError {
    EngineError::Operation(format!("{e:?}"))
}

impl PdfEngine for PdfiumEngine {
    fn name(&self) -> &str {
        "pdfium"
    }

    fn create_document<'a>(
        &'a self,
        page: PageGeometry,
    ) -> Result<Box<dyn DocumentWriter + 'a>, EngineError> {
        let document = self.pdfium.create_new_pdf().map_err(op_err)?;
        let mut writer = PdfiumWriter { document, page };
        writer.add_page()?;
        Ok(Box::new(writer))
    }

    fn open_document<'a>(
        &'a self,
        bytes: Vec<u8>,
    ) -> Result<Box<dyn RenderableDocument + 'a>, EngineError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_vec(bytes, None)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    EngineError::Encrypted
                } else {
                    EngineError::Load(err_str)
                }
            })?;
        Ok(Box::new(PdfiumDocument { document }))
    }
}

// ── Writing ──────────────────────────────────────────────────────────────

struct PdfiumWriter<'a> {
    document: PdfDocument<'a>,
    page: PageGeometry,
}

impl DocumentWriter for PdfiumWriter<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn add_page(&mut self) -> Result<(), EngineError> {
        let size = PdfPagePaperSize::Custom(
            PdfPoints::new(mm_to_points(self.page.width_mm)),
            PdfPoints::new(mm_to_points(self.page.height_mm)),
        );
        self.document
            .pages_mut()
            .create_page_at_end(size)
            .map_err(op_err)?;
        Ok(())
    }

    fn place_image(&mut self, image: &EncodedImage, rect: Rect) -> Result<(), EngineError> {
        let mut object = match image.encoding {
            // Embedded as-is so the chosen JPEG quality is what ends up in the file.
            ImageEncoding::Jpeg => PdfPageImageObject::new_from_jpeg_reader(
                &self.document,
                Cursor::new(image.bytes.clone()),
            )
            .map_err(op_err)?,
            ImageEncoding::Png => {
                let decoded: DynamicImage =
                    image::load_from_memory_with_format(&image.bytes, ImageFormat::Png)?;
                PdfPageImageObject::new(&self.document, &decoded).map_err(op_err)?
            }
        };

        // Image objects start as a 1×1 pt unit square.
        object
            .scale(mm_to_points(rect.width), mm_to_points(rect.height))
            .map_err(op_err)?;
        object
            .translate(
                PdfPoints::new(mm_to_points(rect.x)),
                PdfPoints::new(mm_to_points(rect.bottom_from(self.page.height_mm))),
            )
            .map_err(op_err)?;

        let pages = self.document.pages();
        let last = pages
            .len()
            .checked_sub(1)
            .ok_or_else(|| EngineError::Operation("document has no pages".into()))?;
        let mut page = pages.get(last).map_err(op_err)?;
        page.objects_mut()
            .add_object(PdfPageObject::Image(object))
            .map_err(op_err)?;

        debug!(
            "Placed {:?} image {}x{} px at ({:.1}, {:.1}) mm, {:.1}x{:.1} mm",
            image.encoding, image.width, image.height, rect.x, rect.y, rect.width, rect.height
        );
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, EngineError> {
        self.document.save_to_bytes().map_err(op_err)
    }
}

// ── Rendering ────────────────────────────────────────────────────────────

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl PdfiumDocument<'_> {
    fn page(&self, index: usize) -> Result<PdfPage<'_>, EngineError> {
        let total = self.page_count();
        if index >= total {
            return Err(EngineError::PageOutOfRange { index, total });
        }
        self.document.pages().get(index as u16).map_err(op_err)
    }
}

impl RenderableDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<(f32, f32), EngineError> {
        let page = self.page(index)?;
        Ok((page.width().value, page.height().value))
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<DynamicImage, EngineError> {
        let page = self.page(index)?;
        let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);
        let bitmap = page.render_with_config(&render_config).map_err(op_err)?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_is_capability_unavailable() {
        let err = match PdfiumEngine::bind(Some(Path::new("/definitely/not/libpdfium.so"))) {
            Ok(_) => panic!("binding a nonexistent library must fail"),
            Err(e) => e,
        };
        assert!(err.is_capability_unavailable(), "got: {err}");
        assert!(err.to_string().contains(CAPABILITY_NAME));
    }

    #[test]
    fn directory_resolves_to_platform_library_name() {
        let dir = tempfile::tempdir().unwrap();
        let file = resolve_library_file(dir.path());
        assert_eq!(file.parent(), Some(dir.path()));
        assert!(file.to_string_lossy().contains("pdfium"));

        let explicit = dir.path().join("custom.so");
        assert_eq!(resolve_library_file(&explicit), explicit);
    }
}
