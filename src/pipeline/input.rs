//! Input resolution: read user-supplied files and check they are what the
//! pipeline expects before any engine sees them.
//!
//! A PDF must start with the `%PDF` magic; an image must be one of the
//! formats the `image` crate was built with here. Checking up front gives a
//! meaningful [`ConvertError`] instead of an opaque engine failure.

use crate::error::ConvertError;
use image::ImageFormat;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF";

/// Image formats accepted by the composer.
pub const SUPPORTED_IMAGE_FORMATS: [ImageFormat; 5] = [
    ImageFormat::Png,
    ImageFormat::Jpeg,
    ImageFormat::Gif,
    ImageFormat::Bmp,
    ImageFormat::WebP,
];

/// A PDF held in memory together with the name it was selected under.
#[derive(Debug, Clone)]
pub struct PdfSource {
    /// Filename (no directory), used to name extracted pages and archives.
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfSource {
    /// Wrap bytes obtained elsewhere, checking the PDF magic.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ConvertError> {
        let name = name.into();
        check_pdf_magic(&name, &bytes)?;
        Ok(Self { name, bytes })
    }

    /// Read and validate a PDF from disk.
    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let bytes = read_file(path)?;
        Self::from_bytes(display_name(path), bytes)
    }
}

/// Read a whole file, mapping I/O failures to user-facing errors.
pub fn read_file(path: &Path) -> Result<Vec<u8>, ConvertError> {
    match std::fs::read(path) {
        Ok(bytes) => {
            debug!("Read {} ({} bytes)", path.display(), bytes.len());
            Ok(bytes)
        }
        Err(e) => Err(map_io_error(path, e)),
    }
}

/// Translate a read failure on `path` into the matching [`ConvertError`].
pub fn map_io_error(path: &Path, e: std::io::Error) -> ConvertError {
    match e.kind() {
        ErrorKind::PermissionDenied => ConvertError::PermissionDenied {
            path: path.to_path_buf(),
        },
        // Directories and other unreadable entries count as missing.
        _ => ConvertError::FileNotFound {
            path: path.to_path_buf(),
        },
    }
}

/// Final path component as a display name; falls back to the whole path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn check_pdf_magic(name: &str, bytes: &[u8]) -> Result<(), ConvertError> {
    if bytes.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    Err(ConvertError::NotAPdf {
        name: name.to_string(),
        magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
    })
}

/// Sniff the image format from content, ignoring the filename.
///
/// Returns `None` for anything that is not a supported image.
pub fn sniff_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes)
        .ok()
        .filter(|f| SUPPORTED_IMAGE_FORMATS.contains(f))
}
