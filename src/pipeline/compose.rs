//! Page Composer: an ordered image list becomes one PDF, one page per image.
//!
//! Each image is tried against [`EncodeStrategy::CHAIN`] in order. The first
//! strategy that both encodes and is accepted by the engine wins; if none
//! does, or the image cannot be decoded at all, its page is left blank and a
//! [`PageError`] is recorded. Either way the page exists, so the output
//! always has exactly one page per input image in input order.

use crate::config::ConversionConfig;
use crate::engine::{DocumentWriter, PdfEngine};
use crate::error::{ConvertError, PageError};
use crate::output::{Artifact, ComposeOutput, ComposeStats, PlacedImage, MEDIA_TYPE_PDF};
use crate::pipeline::encode::{EncodeParams, EncodeStrategy};
use crate::progress::ProgressTracker;
use crate::session::SourceImage;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Compose `images` into a PDF with `engine`.
pub fn compose(
    engine: &dyn PdfEngine,
    images: &[SourceImage],
    config: &ConversionConfig,
) -> Result<ComposeOutput, ConvertError> {
    if images.is_empty() {
        return Err(ConvertError::NoImages);
    }
    let start = Instant::now();
    let total = images.len();
    info!(
        "Composing {} images at {} with {}",
        total,
        config.compression,
        engine.name()
    );

    let params = EncodeParams {
        quality: config.compression.jpeg_quality_percent(),
        page: config.page,
        max_surface_pixels: config.max_surface_pixels,
    };

    let mut writer = engine
        .create_document(config.page)
        .map_err(|e| ConvertError::ComposeFailed {
            detail: format!("could not create document: {e}"),
        })?;

    let mut tracker = ProgressTracker::start(config.progress_callback.as_ref(), total);
    let mut placed = Vec::with_capacity(total);
    let mut failures = Vec::new();

    for (index, image) in images.iter().enumerate() {
        let page_num = index + 1;
        tracker.unit_started(page_num);

        if index > 0 {
            writer.add_page().map_err(|e| ConvertError::ComposeFailed {
                detail: format!("could not add page {page_num}: {e}"),
            })?;
        }

        match place_one(writer.as_mut(), index, image, &params) {
            Ok(record) => {
                let percent = tracker.unit_succeeded(page_num);
                debug!(
                    "Image {}/{} '{}' placed via {:?} ({}%)",
                    page_num, total, record.name, record.strategy, percent
                );
                placed.push(record);
            }
            Err(err) => {
                warn!("{}; page left blank", err);
                tracker.unit_failed(page_num, &err.to_string());
                failures.push(err);
            }
        }
    }
    tracker.finish();

    if writer.page_count() != total {
        return Err(ConvertError::ComposeFailed {
            detail: format!(
                "document has {} pages for {} images",
                writer.page_count(),
                total
            ),
        });
    }

    let bytes = writer.finish().map_err(|e| ConvertError::ComposeFailed {
        detail: format!("could not serialise document: {e}"),
    })?;

    let stats = ComposeStats {
        total_images: total,
        placed_images: placed.len(),
        failed_images: failures.len(),
        fallback_images: placed
            .iter()
            .filter(|p| p.strategy != EncodeStrategy::FlattenedJpeg)
            .count(),
        pdf_bytes: bytes.len(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        "Composition complete: {}/{} images placed, {} bytes, {}ms",
        stats.placed_images, total, stats.pdf_bytes, stats.duration_ms
    );

    Ok(ComposeOutput {
        pdf: Artifact {
            filename: config.pdf_filename.clone(),
            bytes,
            media_type: MEDIA_TYPE_PDF,
        },
        placed,
        failures,
        stats,
    })
}

/// Decode one image and place it on the writer's last page.
fn place_one<'w>(
    writer: &mut (dyn DocumentWriter + 'w),
    index: usize,
    image: &SourceImage,
    params: &EncodeParams,
) -> Result<PlacedImage, PageError> {
    let page = index + 1;
    let decoded = image.decode().map_err(|e| PageError::DecodeFailed {
        page,
        name: image.name().to_string(),
        detail: e.to_string(),
    })?;
    debug!(
        "Decoded '{}': {}x{} px",
        image.name(),
        decoded.width(),
        decoded.height()
    );

    let mut attempts = Vec::new();
    for strategy in EncodeStrategy::CHAIN {
        let outcome = strategy.apply(&decoded, params).map_err(|e| e.to_string()).and_then(
            |(encoded, rect)| {
                writer
                    .place_image(&encoded, rect)
                    .map(|()| rect)
                    .map_err(|e| e.to_string())
            },
        );
        match outcome {
            Ok(rect) => {
                return Ok(PlacedImage {
                    index,
                    name: image.name().to_string(),
                    strategy,
                    rect,
                })
            }
            Err(detail) => {
                debug!("{:?} failed for '{}': {}", strategy, image.name(), detail);
                attempts.push(format!("{strategy:?}: {detail}"));
            }
        }
    }

    Err(PageError::AllStrategiesFailed {
        page,
        name: image.name().to_string(),
        detail: attempts.join("; "),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::MemoryEngine;
    use crate::engine::ImageEncoding;
    use crate::pipeline::layout::PageGeometry;
    use crate::progress::tests::{assert_progress_well_formed, PercentRecorder};
    use crate::progress::ProgressCallback;
    use crate::session::tests::{png_bytes, source};
    use std::sync::Arc;

    fn alpha_source(name: &str, w: u32, h: u32) -> SourceImage {
        SourceImage::from_bytes(name, png_bytes(w, h, 0), None).unwrap()
    }

    /// An RGB PNG with no alpha channel at all.
    fn rgb_source(name: &str, w: u32, h: u32) -> SourceImage {
        let mut buf = Vec::new();
        image::DynamicImage::new_rgb8(w, h)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        SourceImage::from_bytes(name, buf, None).unwrap()
    }

    #[test]
    fn empty_input_is_no_images() {
        let err = compose(&MemoryEngine::new(), &[], &ConversionConfig::default()).unwrap_err();
        assert!(matches!(err, ConvertError::NoImages));
    }

    #[test]
    fn one_page_per_image_in_order() {
        let images = vec![source("a", 10, 10), source("b", 30, 10), source("c", 10, 40)];
        let out = compose(&MemoryEngine::new(), &images, &ConversionConfig::default()).unwrap();

        let (_, pages) = MemoryEngine::parse(&out.pdf.bytes).unwrap();
        assert_eq!(pages.len(), 3);
        for (page, img) in pages.iter().zip(&images) {
            assert_eq!(page.images.len(), 1);
            let decoded = img.decode().unwrap();
            assert_eq!(page.images[0].px_width, decoded.width());
            assert_eq!(page.images[0].px_height, decoded.height());
            assert_eq!(page.images[0].encoding, ImageEncoding::Jpeg);
        }
        let names: Vec<_> = out.placed.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(out.pdf.filename, "converted-images.pdf");
        assert_eq!(out.pdf.media_type, MEDIA_TYPE_PDF);
        assert_eq!(out.stats.placed_images, 3);
        assert_eq!(out.stats.fallback_images, 0);
    }

    #[test]
    fn placement_keeps_aspect_ratio_and_centers() {
        let images = vec![source("wide", 400, 100), source("tall", 100, 200)];
        let out = compose(&MemoryEngine::new(), &images, &ConversionConfig::default()).unwrap();
        let page = PageGeometry::a4_portrait();

        for (placed, (w, h)) in out.placed.iter().zip([(400.0f32, 100.0f32), (100.0, 200.0)]) {
            let r = placed.rect;
            assert!((r.width / r.height - w / h).abs() < 1e-3);
            assert!((r.x - (page.width_mm - r.width) / 2.0).abs() < 1e-3);
            assert!((r.y - (page.height_mm - r.height) / 2.0).abs() < 1e-3);
        }
        // Wide image is width-constrained, tall one height-constrained.
        assert!((out.placed[0].rect.width - 190.0).abs() < 1e-3);
        assert!((out.placed[1].rect.height - 277.0).abs() < 1e-3);
    }

    #[test]
    fn surface_failure_falls_back_to_direct_jpeg() {
        let config = ConversionConfig::builder()
            .max_surface_pixels(50)
            .build()
            .unwrap();
        let out = compose(&MemoryEngine::new(), &[rgb_source("big", 10, 10)], &config).unwrap();
        assert_eq!(out.placed[0].strategy, EncodeStrategy::DirectJpeg);
        assert_eq!(out.placed[0].rect, config.page.full_page());
        assert_eq!(out.stats.fallback_images, 1);
    }

    #[test]
    fn alpha_image_without_surface_falls_back_to_png() {
        let config = ConversionConfig::builder()
            .max_surface_pixels(50)
            .build()
            .unwrap();
        let out = compose(&MemoryEngine::new(), &[alpha_source("logo", 10, 10)], &config).unwrap();
        assert_eq!(out.placed[0].strategy, EncodeStrategy::DirectPng);

        let (_, pages) = MemoryEngine::parse(&out.pdf.bytes).unwrap();
        assert_eq!(pages[0].images[0].encoding, ImageEncoding::Png);
    }

    #[test]
    fn engine_rejecting_jpeg_falls_back_to_png() {
        let engine = MemoryEngine::new().rejecting(ImageEncoding::Jpeg);
        let out = compose(&engine, &[source("a", 4, 4)], &ConversionConfig::default()).unwrap();
        assert_eq!(out.placed[0].strategy, EncodeStrategy::DirectPng);
        assert!(out.failures.is_empty());
    }

    #[test]
    fn failed_images_leave_blank_pages() {
        let engine = MemoryEngine::new()
            .rejecting(ImageEncoding::Jpeg)
            .rejecting(ImageEncoding::Png);
        let mut truncated = png_bytes(8, 8, 255);
        truncated.truncate(24);
        let broken = SourceImage::from_bytes("broken.png", truncated, None).unwrap();

        let recorder = Arc::new(PercentRecorder::default());
        let cb: ProgressCallback = recorder.clone();
        let config = ConversionConfig::builder().progress_callback(cb).build().unwrap();

        let out = compose(&engine, &[source("a", 4, 4), broken], &config).unwrap();

        let (_, pages) = MemoryEngine::parse(&out.pdf.bytes).unwrap();
        assert_eq!(pages.len(), 2);
        assert!(pages.iter().all(|p| p.images.is_empty()));
        assert!(out.placed.is_empty());
        assert!(matches!(out.failures[0], PageError::AllStrategiesFailed { page: 1, .. }));
        assert!(matches!(out.failures[1], PageError::DecodeFailed { page: 2, .. }));
        assert_progress_well_formed(&recorder.percents(), 2);
        assert_eq!(*recorder.finished.lock().unwrap(), Some((2, 0)));
    }

    #[test]
    fn progress_reported_per_image() {
        let recorder = Arc::new(PercentRecorder::default());
        let cb: ProgressCallback = recorder.clone();
        let config = ConversionConfig::builder().progress_callback(cb).build().unwrap();
        let images: Vec<_> = (0..3).map(|i| source(&format!("{i}"), 2, 2)).collect();

        compose(&MemoryEngine::new(), &images, &config).unwrap();
        assert_eq!(recorder.percents(), vec![33, 67, 100]);
        assert_progress_well_formed(&recorder.percents(), 3);
    }

    #[test]
    fn custom_geometry_and_name() {
        let config = ConversionConfig::builder()
            .page(PageGeometry::a4_landscape())
            .pdf_filename("album.pdf")
            .build()
            .unwrap();
        let out = compose(&MemoryEngine::new(), &[source("a", 2, 2)], &config).unwrap();
        let (_, pages) = MemoryEngine::parse(&out.pdf.bytes).unwrap();
        assert_eq!((pages[0].width_mm, pages[0].height_mm), (297.0, 210.0));
        assert_eq!(out.pdf.filename, "album.pdf");
    }
}
