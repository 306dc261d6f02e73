//! Configuration types for image ⇄ PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. One struct serves both pipelines; each
//! pipeline reads only the fields that concern it.

use crate::error::ConvertError;
use crate::pipeline::layout::PageGeometry;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default name of the composed PDF.
pub const DEFAULT_PDF_NAME: &str = "converted-images.pdf";

/// Configuration for a composition or extraction run.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use imgpdf::{CompressionLevel, ConversionConfig};
///
/// let config = ConversionConfig::builder()
///     .compression(CompressionLevel::Slow)
///     .render_scale(3.0)
///     .build()
///     .unwrap();
/// assert_eq!(config.compression.jpeg_quality(), 0.5);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Output quality tier for composed pages. Default: [`CompressionLevel::Medium`].
    pub compression: CompressionLevel,

    /// Page size and margin of composed pages. Default: A4 portrait, 10 mm.
    pub page: PageGeometry,

    /// Oversampling factor applied to a PDF page's point size when
    /// extracting. Range: 0.25–8.0. Default: 2.0.
    ///
    /// PDF pages are measured in points; a 1× render of an A4 page is only
    /// 595 × 842 px, too coarse to use as a standalone image.
    pub render_scale: f32,

    /// Largest raster surface (width × height in pixels) either pipeline
    /// will allocate. Default: 100 000 000.
    ///
    /// A request above the cap counts as "no surface obtainable": the
    /// composer falls back to its direct strategies, the extractor skips the
    /// page and records a [`crate::error::PageError::SurfaceUnavailable`].
    pub max_surface_pixels: u64,

    /// Filename of the composed PDF. Default: `converted-images.pdf`.
    pub pdf_filename: String,

    /// Optional per-unit progress callback.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            compression: CompressionLevel::default(),
            page: PageGeometry::default(),
            render_scale: 2.0,
            max_surface_pixels: 100_000_000,
            pdf_filename: DEFAULT_PDF_NAME.to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("compression", &self.compression)
            .field("page", &self.page)
            .field("render_scale", &self.render_scale)
            .field("max_surface_pixels", &self.max_surface_pixels)
            .field("pdf_filename", &self.pdf_filename)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn compression(mut self, level: CompressionLevel) -> Self {
        self.config.compression = level;
        self
    }

    pub fn page(mut self, page: PageGeometry) -> Self {
        self.config.page = page;
        self
    }

    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale;
        self
    }

    pub fn max_surface_pixels(mut self, px: u64) -> Self {
        self.config.max_surface_pixels = px;
        self
    }

    pub fn pdf_filename(mut self, name: impl Into<String>) -> Self {
        self.config.pdf_filename = name.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if !(0.25..=8.0).contains(&c.render_scale) {
            return Err(ConvertError::InvalidConfig(format!(
                "render scale must be 0.25–8.0, got {}",
                c.render_scale
            )));
        }
        if c.page.width_mm <= 0.0 || c.page.height_mm <= 0.0 {
            return Err(ConvertError::InvalidConfig(format!(
                "page size must be positive, got {}x{} mm",
                c.page.width_mm, c.page.height_mm
            )));
        }
        if c.page.margin_mm < 0.0 || c.page.content_width() <= 0.0 || c.page.content_height() <= 0.0
        {
            return Err(ConvertError::InvalidConfig(format!(
                "margin of {} mm leaves no content area on a {}x{} mm page",
                c.page.margin_mm, c.page.width_mm, c.page.height_mm
            )));
        }
        if c.max_surface_pixels == 0 {
            return Err(ConvertError::InvalidConfig(
                "max surface pixels must be ≥ 1".into(),
            ));
        }
        if c.pdf_filename.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "PDF filename must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Quality tier for composed pages.
///
/// The names follow the user-facing trade-off, not encoder speed:
///
/// | Tier | JPEG quality | Result |
/// |------|--------------|--------|
/// | `Fast`   | 0.95 | best fidelity, largest file |
/// | `Medium` | 0.75 | balanced (default) |
/// | `Slow`   | 0.50 | smallest file, lowest fidelity |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CompressionLevel {
    Fast,
    #[default]
    Medium,
    Slow,
}

impl CompressionLevel {
    /// Quality used when a tier name is not recognised.
    pub const FALLBACK_QUALITY: f32 = 0.75;

    /// Encode quality in (0, 1].
    pub fn jpeg_quality(self) -> f32 {
        match self {
            CompressionLevel::Fast => 0.95,
            CompressionLevel::Medium => 0.75,
            CompressionLevel::Slow => 0.5,
        }
    }

    /// Quality on the 1–100 scale JPEG encoders take.
    pub fn jpeg_quality_percent(self) -> u8 {
        (self.jpeg_quality() * 100.0).round() as u8
    }

    /// Case-insensitive lookup of a tier name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "FAST" => Some(CompressionLevel::Fast),
            "MEDIUM" => Some(CompressionLevel::Medium),
            "SLOW" => Some(CompressionLevel::Slow),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressionLevel::Fast => "FAST",
            CompressionLevel::Medium => "MEDIUM",
            CompressionLevel::Slow => "SLOW",
        }
    }
}

/// Quality for a tier given by name; unknown names get
/// [`CompressionLevel::FALLBACK_QUALITY`].
pub fn jpeg_quality_for_name(name: &str) -> f32 {
    CompressionLevel::from_name(name)
        .map(CompressionLevel::jpeg_quality)
        .unwrap_or(CompressionLevel::FALLBACK_QUALITY)
}

impl fmt::Display for CompressionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompressionLevel {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            ConvertError::InvalidConfig(format!(
                "unknown compression level '{s}' (expected FAST, MEDIUM or SLOW)"
            ))
        })
    }
}
