//! Archive Packer: bundle extracted pages into one ZIP download.
//!
//! Packing is all-or-nothing. Every entry is written into an in-memory
//! buffer first; any failure discards the buffer and no artifact is returned.

use crate::error::ConvertError;
use crate::output::{Artifact, PageImage, MEDIA_TYPE_ZIP};
use crate::pipeline::encode::decode_data_url;
use crate::pipeline::extract::strip_pdf_extension;
use std::io::{Cursor, Write};
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Archive filename for a PDF named `source_name`: `<basename>.zip`.
pub fn archive_filename(source_name: &str) -> String {
    format!("{}.zip", strip_pdf_extension(source_name))
}

/// Pack `pages` into `<basename>.zip`, one Deflate entry per page under its
/// generated filename.
pub fn pack(pages: &[PageImage], source_name: &str) -> Result<Artifact, ConvertError> {
    if pages.is_empty() {
        return Err(ConvertError::NothingToPack);
    }
    let filename = archive_filename(source_name);
    let fail = |detail: String| ConvertError::ArchiveFailed {
        filename: filename.clone(),
        detail,
    };

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for page in pages {
        let png = decode_data_url(&page.data_url)
            .map_err(|e| fail(format!("page {}: {e}", page.page_num)))?;
        zip.start_file(&page.filename, options)
            .map_err(|e| fail(format!("{}: {e}", page.filename)))?;
        zip.write_all(&png)
            .map_err(|e| fail(format!("{}: {e}", page.filename)))?;
        debug!("Packed {} ({} bytes)", page.filename, png.len());
    }

    let bytes = zip.finish().map_err(|e| fail(e.to_string()))?.into_inner();
    info!(
        "Packed {} pages into {} ({} bytes)",
        pages.len(),
        filename,
        bytes.len()
    );

    Ok(Artifact {
        filename,
        bytes,
        media_type: MEDIA_TYPE_ZIP,
    })
}
