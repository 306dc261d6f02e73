//! Image encoding: flattening, JPEG/PNG encoding and PNG data URLs.
//!
//! Composition embeds pages as JPEG, which has no alpha channel: transparent
//! pixels would come out black. Every image is therefore composited onto an
//! opaque white surface first. Extraction goes the other way and keeps pages
//! lossless (PNG) because rendered text degrades badly under JPEG artefacts.

use crate::engine::{EncodedImage, ImageEncoding};
use crate::pipeline::layout::{PageGeometry, Rect};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

/// Prefix of every PNG data URL produced by this crate.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Why an encode step could not produce output.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// No raster surface of the required size could be obtained.
    #[error("no drawing surface for {width}x{height} px (limit {limit} px)")]
    NoSurface { width: u32, height: u32, limit: u64 },

    #[error(transparent)]
    Image(#[from] image::ImageError),

    /// A data URL was malformed.
    #[error("invalid data URL: {0}")]
    DataUrl(String),
}

/// Allocate a white `width × height` surface, refusing empty or oversized ones.
fn white_surface(width: u32, height: u32, max_pixels: u64) -> Result<RgbaImage, EncodeError> {
    let pixels = width as u64 * height as u64;
    if pixels == 0 || pixels > max_pixels {
        return Err(EncodeError::NoSurface {
            width,
            height,
            limit: max_pixels,
        });
    }
    Ok(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
}

/// Composite `img` onto an opaque white surface of its own pixel size.
///
/// Applied to every image regardless of format; an opaque image comes out
/// unchanged. Fails only when no surface can be obtained.
pub fn flatten_onto_white(img: &DynamicImage, max_pixels: u64) -> Result<DynamicImage, EncodeError> {
    let mut surface = white_surface(img.width(), img.height(), max_pixels)?;
    imageops::overlay(&mut surface, &img.to_rgba8(), 0, 0);
    Ok(DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(surface).to_rgb8()))
}

/// JPEG-encode `img` at `quality` (1–100).
///
/// Images with an alpha channel are rejected by the encoder.
pub fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    img.write_with_encoder(JpegEncoder::new_with_quality(&mut buf, quality))?;
    debug!("Encoded JPEG q{} → {} bytes", quality, buf.len());
    Ok(buf)
}

/// PNG-encode `img` losslessly.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded PNG → {} bytes", buf.len());
    Ok(buf)
}

/// Wrap PNG bytes as a `data:image/png;base64,…` URL.
pub fn png_data_url(png: &[u8]) -> String {
    let b64 = STANDARD.encode(png);
    format!("{PNG_DATA_URL_PREFIX}{b64}")
}

/// Decode the payload of a base64 data URL back to raw bytes.
///
/// Everything after the first comma is the payload, whatever the media type.
pub fn decode_data_url(url: &str) -> Result<Vec<u8>, EncodeError> {
    let (header, payload) = url
        .split_once(',')
        .ok_or_else(|| EncodeError::DataUrl("missing ',' separator".into()))?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return Err(EncodeError::DataUrl(format!(
            "unsupported header '{header}'"
        )));
    }
    STANDARD
        .decode(payload)
        .map_err(|e| EncodeError::DataUrl(e.to_string()))
}

// ── Composition strategies ───────────────────────────────────────────────

/// One way of turning a source image into a placed page image.
///
/// The composer tries [`EncodeStrategy::CHAIN`] in order and keeps the first
/// that both encodes and is accepted by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodeStrategy {
    /// Flatten onto white, JPEG at the tier's quality, fit and center.
    FlattenedJpeg,
    /// JPEG the original without flattening, stretched over the full page.
    DirectJpeg,
    /// Lossless PNG of the original, stretched over the full page.
    DirectPng,
}

/// Inputs shared by every strategy for one image.
#[derive(Debug, Clone, Copy)]
pub struct EncodeParams {
    pub quality: u8,
    pub page: PageGeometry,
    pub max_surface_pixels: u64,
}

impl EncodeStrategy {
    pub const CHAIN: [EncodeStrategy; 3] = [
        EncodeStrategy::FlattenedJpeg,
        EncodeStrategy::DirectJpeg,
        EncodeStrategy::DirectPng,
    ];

    /// Encode `img` and compute where it goes on the page.
    pub fn apply(
        self,
        img: &DynamicImage,
        params: &EncodeParams,
    ) -> Result<(EncodedImage, Rect), EncodeError> {
        let (encoding, bytes, rect) = match self {
            EncodeStrategy::FlattenedJpeg => {
                let flat = flatten_onto_white(img, params.max_surface_pixels)?;
                let bytes = encode_jpeg(&flat, params.quality)?;
                let rect = params.page.fit_centered(img.width(), img.height());
                (ImageEncoding::Jpeg, bytes, rect)
            }
            EncodeStrategy::DirectJpeg => (
                ImageEncoding::Jpeg,
                encode_jpeg(img, params.quality)?,
                params.page.full_page(),
            ),
            EncodeStrategy::DirectPng => {
                (ImageEncoding::Png, encode_png(img)?, params.page.full_page())
            }
        };
        Ok((
            EncodedImage {
                encoding,
                bytes,
                width: img.width(),
                height: img.height(),
            },
            rect,
        ))
    }
}
