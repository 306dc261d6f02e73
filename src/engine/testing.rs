//! In-memory [`PdfEngine`] double for unit tests.
//!
//! Documents are serialised to a small line-based text format so tests can
//! inspect exactly what a pipeline placed, and feed composed output straight
//! back into extraction:
//!
//! ```text
//! %PDF-MEMORY
//! encrypted                          (optional)
//! page <width_mm> <height_mm>
//! image <JPEG|PNG> <x> <y> <w> <h> <px_w> <px_h>
//! ```

use super::{DocumentWriter, EncodedImage, ImageEncoding, PdfEngine, RenderableDocument};
use crate::error::EngineError;
use crate::pipeline::layout::{mm_to_points, PageGeometry, Rect};
use image::{DynamicImage, Rgba, RgbaImage};

const HEADER: &str = "%PDF-MEMORY";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PlacedRecord {
    pub(crate) encoding: ImageEncoding,
    pub(crate) rect: Rect,
    pub(crate) px_width: u32,
    pub(crate) px_height: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PageRecord {
    pub(crate) width_mm: f32,
    pub(crate) height_mm: f32,
    pub(crate) images: Vec<PlacedRecord>,
}

/// Configurable fake engine.
#[derive(Debug, Default, Clone)]
pub(crate) struct MemoryEngine {
    /// Encodings `place_image` refuses.
    pub(crate) rejected_encodings: Vec<ImageEncoding>,
    /// 0-based page indices whose rendering fails.
    pub(crate) failing_render_pages: Vec<usize>,
}

impl MemoryEngine {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rejecting(mut self, encoding: ImageEncoding) -> Self {
        self.rejected_encodings.push(encoding);
        self
    }

    pub(crate) fn failing_render(mut self, index: usize) -> Self {
        self.failing_render_pages.push(index);
        self
    }

    /// Serialise pages directly, bypassing a writer.
    pub(crate) fn document_bytes(pages: &[(f32, f32)], encrypted: bool) -> Vec<u8> {
        let mut out = format!("{HEADER}\n");
        if encrypted {
            out.push_str("encrypted\n");
        }
        for (w, h) in pages {
            out.push_str(&format!("page {w} {h}\n"));
        }
        out.into_bytes()
    }

    /// Parse bytes produced by this engine.
    pub(crate) fn parse(bytes: &[u8]) -> Result<(bool, Vec<PageRecord>), EngineError> {
        let text =
            std::str::from_utf8(bytes).map_err(|e| EngineError::Load(format!("not text: {e}")))?;
        let mut lines = text.lines();
        if lines.next() != Some(HEADER) {
            return Err(EngineError::Load("missing header".into()));
        }

        let mut encrypted = false;
        let mut pages: Vec<PageRecord> = Vec::new();
        for line in lines {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let num = |i: usize| -> Result<f32, EngineError> {
                fields
                    .get(i)
                    .and_then(|f| f.parse::<f32>().ok())
                    .ok_or_else(|| EngineError::Load(format!("bad line: {line}")))
            };
            match fields.first().copied() {
                Some("encrypted") => encrypted = true,
                Some("page") => pages.push(PageRecord {
                    width_mm: num(1)?,
                    height_mm: num(2)?,
                    images: Vec::new(),
                }),
                Some("image") => {
                    let encoding = match fields.get(1).copied() {
                        Some("JPEG") => ImageEncoding::Jpeg,
                        Some("PNG") => ImageEncoding::Png,
                        _ => return Err(EngineError::Load(format!("bad line: {line}"))),
                    };
                    let record = PlacedRecord {
                        encoding,
                        rect: Rect {
                            x: num(2)?,
                            y: num(3)?,
                            width: num(4)?,
                            height: num(5)?,
                        },
                        px_width: num(6)? as u32,
                        px_height: num(7)? as u32,
                    };
                    pages
                        .last_mut()
                        .ok_or_else(|| EngineError::Load("image before page".into()))?
                        .images
                        .push(record);
                }
                _ => return Err(EngineError::Load(format!("bad line: {line}"))),
            }
        }
        Ok((encrypted, pages))
    }
}

impl PdfEngine for MemoryEngine {
    fn name(&self) -> &str {
        "memory"
    }

    fn create_document<'a>(
        &'a self,
        page: PageGeometry,
    ) -> Result<Box<dyn DocumentWriter + 'a>, EngineError> {
        let mut writer = MemoryWriter {
            engine: self,
            page,
            pages: Vec::new(),
        };
        writer.add_page()?;
        Ok(Box::new(writer))
    }

    fn open_document<'a>(
        &'a self,
        bytes: Vec<u8>,
    ) -> Result<Box<dyn RenderableDocument + 'a>, EngineError> {
        let (encrypted, pages) = Self::parse(&bytes)?;
        if encrypted {
            return Err(EngineError::Encrypted);
        }
        Ok(Box::new(MemoryDocument {
            engine: self,
            pages,
        }))
    }
}

struct MemoryWriter<'a> {
    engine: &'a MemoryEngine,
    page: PageGeometry,
    pages: Vec<PageRecord>,
}

impl DocumentWriter for MemoryWriter<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn add_page(&mut self) -> Result<(), EngineError> {
        self.pages.push(PageRecord {
            width_mm: self.page.width_mm,
            height_mm: self.page.height_mm,
            images: Vec::new(),
        });
        Ok(())
    }

    fn place_image(&mut self, image: &EncodedImage, rect: Rect) -> Result<(), EngineError> {
        if self.engine.rejected_encodings.contains(&image.encoding) {
            return Err(EngineError::Operation(format!(
                "{:?} rejected",
                image.encoding
            )));
        }
        // Prove the bytes really are what they claim to be.
        let format = match image.encoding {
            ImageEncoding::Jpeg => image::ImageFormat::Jpeg,
            ImageEncoding::Png => image::ImageFormat::Png,
        };
        image::load_from_memory_with_format(&image.bytes, format)?;

        let page = self
            .pages
            .last_mut()
            .ok_or_else(|| EngineError::Operation("no page".into()))?;
        page.images.push(PlacedRecord {
            encoding: image.encoding,
            rect,
            px_width: image.width,
            px_height: image.height,
        });
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, EngineError> {
        let mut out = format!("{HEADER}\n");
        for page in &self.pages {
            out.push_str(&format!("page {} {}\n", page.width_mm, page.height_mm));
            for img in &page.images {
                let tag = match img.encoding {
                    ImageEncoding::Jpeg => "JPEG",
                    ImageEncoding::Png => "PNG",
                };
                out.push_str(&format!(
                    "image {tag} {} {} {} {} {} {}\n",
                    img.rect.x,
                    img.rect.y,
                    img.rect.width,
                    img.rect.height,
                    img.px_width,
                    img.px_height
                ));
            }
        }
        Ok(out.into_bytes())
    }
}

struct MemoryDocument<'a> {
    engine: &'a MemoryEngine,
    pages: Vec<PageRecord>,
}

impl RenderableDocument for MemoryDocument<'_> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_size(&self, index: usize) -> Result<(f32, f32), EngineError> {
        let page = self.pages.get(index).ok_or(EngineError::PageOutOfRange {
            index,
            total: self.pages.len(),
        })?;
        Ok((mm_to_points(page.width_mm), mm_to_points(page.height_mm)))
    }

    fn render_page(&self, index: usize, scale: f32) -> Result<DynamicImage, EngineError> {
        if self.engine.failing_render_pages.contains(&index) {
            return Err(EngineError::Operation(format!("render of page {index} failed")));
        }
        let (w, h) = self.page_size(index)?;
        let width = (w * scale).round() as u32;
        let height = (h * scale).round() as u32;
        Ok(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([255, 255, 255, 255]),
        )))
    }
}
