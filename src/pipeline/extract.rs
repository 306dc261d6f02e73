//! Page Extractor: render every page of a PDF into a PNG [`PageImage`].
//!
//! Pages are processed strictly one after another so only one raster
//! surface is alive at a time. A page that cannot be rendered or encoded is
//! skipped and recorded in [`ExtractionOutput::failures`]; the run goes on.

use crate::config::ConversionConfig;
use crate::engine::{PdfEngine, RenderableDocument};
use crate::error::{ConvertError, EngineError, PageError};
use crate::output::{ExtractionOutput, ExtractionStats, PageImage};
use crate::pipeline::encode::{encode_png, png_data_url};
use crate::pipeline::input::PdfSource;
use crate::progress::ProgressTracker;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Instant;
use tracing::{debug, info, warn};

static PDF_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf$").unwrap());

/// `name` without a trailing `.pdf`, matched case-insensitively.
pub fn strip_pdf_extension(name: &str) -> &str {
    match PDF_EXTENSION.find(name) {
        Some(m) => &name[..m.start()],
        None => name,
    }
}

/// Output filename for page `page_num` (1-indexed) of `source_name`.
///
/// Zero-padded to three digits; larger numbers keep all their digits.
pub fn page_filename(source_name: &str, page_num: usize) -> String {
    format!("{}-pagina-{page_num:03}.png", strip_pdf_extension(source_name))
}

/// Render all pages of `pdf` with `engine`.
pub fn extract(
    engine: &dyn PdfEngine,
    pdf: &PdfSource,
    config: &ConversionConfig,
) -> Result<ExtractionOutput, ConvertError> {
    let start = Instant::now();
    info!("Extracting pages from '{}' with {}", pdf.name, engine.name());

    let document = engine
        .open_document(pdf.bytes.clone())
        .map_err(|e| map_open_error(&pdf.name, e))?;

    let total = document.page_count();
    info!("PDF has {} pages", total);

    let mut tracker = ProgressTracker::start(config.progress_callback.as_ref(), total);
    let mut pages = Vec::with_capacity(total);
    let mut failures = Vec::new();

    for index in 0..total {
        let page_num = index + 1;
        tracker.unit_started(page_num);
        match render_one(document.as_ref(), index, &pdf.name, config) {
            Ok(page) => {
                let percent = tracker.unit_succeeded(page_num);
                debug!(
                    "Page {}/{} → {} ({}x{} px, {}%)",
                    page_num, total, page.filename, page.width, page.height, percent
                );
                pages.push(page);
            }
            Err(err) => {
                warn!("{}; page skipped", err);
                tracker.unit_failed(page_num, &err.to_string());
                failures.push(err);
            }
        }
    }
    tracker.finish();

    let stats = ExtractionStats {
        total_pages: total,
        extracted_pages: pages.len(),
        skipped_pages: failures.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Extraction complete: {}/{} pages, {}ms",
        stats.extracted_pages, total, stats.duration_ms
    );

    Ok(ExtractionOutput {
        source_name: pdf.name.clone(),
        pages,
        failures,
        stats,
    })
}

fn map_open_error(name: &str, e: EngineError) -> ConvertError {
    let name = name.to_string();
    match e {
        EngineError::Encrypted => ConvertError::EncryptedPdf { name },
        other => ConvertError::CorruptPdf {
            name,
            detail: other.to_string(),
        },
    }
}

/// Render, encode and name one page. `index` is 0-based.
fn render_one(
    document: &dyn RenderableDocument,
    index: usize,
    source_name: &str,
    config: &ConversionConfig,
) -> Result<PageImage, PageError> {
    let page = index + 1;
    let (w_pt, h_pt) = document
        .page_size(index)
        .map_err(|e| PageError::RenderFailed {
            page,
            detail: e.to_string(),
        })?;

    let width = (w_pt * config.render_scale).round().max(0.0) as u64;
    let height = (h_pt * config.render_scale).round().max(0.0) as u64;
    if width == 0 || height == 0 || width.saturating_mul(height) > config.max_surface_pixels {
        return Err(PageError::SurfaceUnavailable {
            page,
            width,
            height,
        });
    }

    let rendered = document
        .render_page(index, config.render_scale)
        .map_err(|e| PageError::RenderFailed {
            page,
            detail: e.to_string(),
        })?;
    let png = encode_png(&rendered).map_err(|e| PageError::EncodeFailed {
        page,
        detail: e.to_string(),
    })?;

    Ok(PageImage {
        id: format!("{source_name}-page-{page}"),
        page_num: page,
        data_url: png_data_url(&png),
        filename: page_filename(source_name, page),
        width: rendered.width(),
        height: rendered.height(),
    })
}
