//! Output types for composition, extraction and packing runs.

use crate::error::{ConvertError, PageError};
use crate::pipeline::encode::{decode_data_url, EncodeStrategy};
use crate::pipeline::layout::Rect;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const MEDIA_TYPE_PDF: &str = "application/pdf";
pub const MEDIA_TYPE_PNG: &str = "image/png";
pub const MEDIA_TYPE_ZIP: &str = "application/zip";

/// A named binary the caller hands to the user.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    pub filename: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub media_type: &'static str,
}

impl Artifact {
    /// Write into `dir` under [`Self::filename`].
    ///
    /// The bytes go to a temporary file in the same directory first and are
    /// renamed into place, so a reader never sees a partial file.
    pub fn save_into(&self, dir: &Path) -> Result<PathBuf, ConvertError> {
        let target = dir.join(&self.filename);
        let write_err = |source: std::io::Error| ConvertError::OutputWriteFailed {
            path: target.clone(),
            source,
        };

        std::fs::create_dir_all(dir).map_err(write_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(&self.bytes).map_err(write_err)?;
        tmp.persist(&target).map_err(|e| write_err(e.error))?;

        debug!("Wrote {} ({} bytes)", target.display(), self.bytes.len());
        Ok(target)
    }
}

// ── Composition ──────────────────────────────────────────────────────────

/// Where and how one source image ended up in the composed PDF.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedImage {
    /// 0-based position in the input list, which is also the page index.
    pub index: usize,
    pub name: String,
    pub strategy: EncodeStrategy,
    /// Placement in millimetres, top-left origin.
    pub rect: Rect,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeStats {
    pub total_images: usize,
    pub placed_images: usize,
    pub failed_images: usize,
    /// Images placed by a fallback rather than the flattened JPEG path.
    pub fallback_images: usize,
    pub pdf_bytes: usize,
    pub duration_ms: u64,
}

/// Result of [`crate::convert::compose_images`].
#[derive(Debug, Clone, Serialize)]
pub struct ComposeOutput {
    pub pdf: Artifact,
    pub placed: Vec<PlacedImage>,
    /// Images whose page was left blank.
    pub failures: Vec<PageError>,
    pub stats: ComposeStats,
}

// ── Extraction ───────────────────────────────────────────────────────────

/// One rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageImage {
    /// `<source-name>-page-<n>`.
    pub id: String,
    /// 1-indexed page number.
    pub page_num: usize,
    /// `data:image/png;base64,…`
    pub data_url: String,
    /// `<basename>-pagina-<NNN>.png`.
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

impl PageImage {
    /// Raw PNG bytes behind the data URL.
    pub fn png_bytes(&self) -> Result<Vec<u8>, ConvertError> {
        decode_data_url(&self.data_url).map_err(|e| {
            ConvertError::Internal(format!("page {} has a bad data URL: {e}", self.page_num))
        })
    }

    /// This page as a standalone PNG download.
    pub fn to_artifact(&self) -> Result<Artifact, ConvertError> {
        Ok(Artifact {
            filename: self.filename.clone(),
            bytes: self.png_bytes()?,
            media_type: MEDIA_TYPE_PNG,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_pages: usize,
    pub extracted_pages: usize,
    pub skipped_pages: usize,
    pub duration_ms: u64,
}

/// Result of [`crate::convert::extract_pages`].
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionOutput {
    pub source_name: String,
    /// Successfully rendered pages, in page order.
    pub pages: Vec<PageImage>,
    /// Pages that were skipped, in page order.
    pub failures: Vec<PageError>,
    pub stats: ExtractionStats,
}

impl ExtractionOutput {
    /// Treat any skipped page as an error.
    pub fn into_result(self) -> Result<Self, ConvertError> {
        if self.failures.is_empty() {
            return Ok(self);
        }
        Err(ConvertError::PartialFailure {
            success: self.pages.len(),
            failed: self.failures.len(),
            total: self.stats.total_pages,
        })
    }
}
