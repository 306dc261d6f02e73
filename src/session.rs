//! Image intake: the ordered, user-editable list the composer reads from.
//!
//! A [`SourceImage`] owns its bytes through an `Arc`, so cloning one into a
//! pipeline or a preview costs a reference count. The bytes are released once
//! the image is removed from its [`ImageSession`] and no other clone is alive.

use crate::error::ConvertError;
use crate::pipeline::input::{display_name, read_file, sniff_image_format};
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Default advisory per-image size limit.
pub const DEFAULT_SOFT_SIZE_LIMIT: u64 = 10 * 1024 * 1024;

/// One user-selected raster image.
#[derive(Debug, Clone)]
pub struct SourceImage {
    id: String,
    name: String,
    modified: Option<SystemTime>,
    data: Arc<[u8]>,
    format: ImageFormat,
}

impl SourceImage {
    /// Accept `bytes` as an image if its content sniffs as a supported format.
    ///
    /// The identifier combines name, modification time and a random
    /// component, so selecting the same file twice yields two distinct images.
    pub fn from_bytes(
        name: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
        modified: Option<SystemTime>,
    ) -> Result<Self, ConvertError> {
        let name = name.into();
        let data: Arc<[u8]> = bytes.into();
        let format =
            sniff_image_format(&data).ok_or_else(|| ConvertError::NotAnImage { name: name.clone() })?;

        let millis = modified
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis())
            .unwrap_or(0);
        let id = format!("{name}-{millis}-{}", Uuid::new_v4());

        Ok(Self {
            id,
            name,
            modified,
            data,
            format,
        })
    }

    /// Read an image file from disk.
    pub fn from_path(path: &Path) -> Result<Self, ConvertError> {
        let bytes = read_file(path)?;
        let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        Self::from_bytes(display_name(path), bytes, modified)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modified(&self) -> Option<SystemTime> {
        self.modified
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn size_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Decode to pixels using the sniffed format.
    pub fn decode(&self) -> image::ImageResult<DynamicImage> {
        image::load_from_memory_with_format(&self.data, self.format)
    }
}

/// Ordered list of images selected for composition.
#[derive(Debug, Clone)]
pub struct ImageSession {
    images: Vec<SourceImage>,
    soft_size_limit_bytes: u64,
}

impl Default for ImageSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageSession {
    pub fn new() -> Self {
        Self::with_soft_size_limit(DEFAULT_SOFT_SIZE_LIMIT)
    }

    /// A session that warns about images larger than `bytes`.
    pub fn with_soft_size_limit(bytes: u64) -> Self {
        Self {
            images: Vec::new(),
            soft_size_limit_bytes: bytes,
        }
    }

    /// Read each path and append those that are images, in order.
    ///
    /// Unreadable files and non-images are skipped with a warning; returns
    /// how many images were added.
    pub fn add_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> usize {
        let before = self.images.len();
        for path in paths {
            let path = path.as_ref();
            match SourceImage::from_path(path) {
                Ok(image) => self.push(image),
                Err(e) => warn!("Skipping '{}': {}", path.display(), e),
            }
        }
        let added = self.images.len() - before;
        info!("Added {} of {} selected files", added, paths.len());
        added
    }

    /// Append an image. Oversized images are kept; the limit is advisory.
    pub fn push(&mut self, image: SourceImage) {
        if image.size_bytes() > self.soft_size_limit_bytes {
            warn!(
                "'{}' is {} bytes, above the recommended {} bytes; conversion may be slow",
                image.name(),
                image.size_bytes(),
                self.soft_size_limit_bytes
            );
        }
        debug!("Queued '{}' as {:?}", image.name(), image.format());
        self.images.push(image);
    }

    /// Remove the image with `id`. Returns whether one was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        match self.images.iter().position(|img| img.id() == id) {
            Some(pos) => {
                self.images.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Move the image at `from` to `to`, shifting the ones in between.
    ///
    /// Returns `false` and leaves the order untouched if either index is out
    /// of range.
    pub fn reorder(&mut self, from: usize, to: usize) -> bool {
        let len = self.images.len();
        if from >= len || to >= len {
            return false;
        }
        let image = self.images.remove(from);
        self.images.insert(to, image);
        true
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    pub fn images(&self) -> &[SourceImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    /// PNG bytes of a solid `w × h` image.
    pub(crate) fn png_bytes(w: u32, h: u32, alpha: u8) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba([40, 90, 200, alpha])));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    pub(crate) fn source(name: &str, w: u32, h: u32) -> SourceImage {
        SourceImage::from_bytes(name, png_bytes(w, h, 255), None).unwrap()
    }

    fn names(session: &ImageSession) -> Vec<&str> {
        session.images().iter().map(SourceImage::name).collect()
    }

    #[test]
    fn identical_files_get_distinct_ids() {
        let bytes = png_bytes(2, 2, 255);
        let a = SourceImage::from_bytes("scan.png", bytes.clone(), None).unwrap();
        let b = SourceImage::from_bytes("scan.png", bytes, None).unwrap();
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("scan.png-0-"));
    }

    #[test]
    fn id_includes_modification_time() {
        let t = UNIX_EPOCH + std::time::Duration::from_millis(1_700_000_000_123);
        let img = SourceImage::from_bytes("a.png", png_bytes(1, 1, 255), Some(t)).unwrap();
        assert!(img.id().starts_with("a.png-1700000000123-"), "{}", img.id());
    }

    #[test]
    fn rejects_non_images() {
        assert!(matches!(
            SourceImage::from_bytes("notes.txt", b"hello".to_vec(), None),
            Err(ConvertError::NotAnImage { .. })
        ));
    }

    #[test]
    fn decode_reports_dimensions() {
        let img = source("a.png", 7, 3).decode().unwrap();
        assert_eq!((img.width(), img.height()), (7, 3));
    }

    #[test]
    fn add_files_filters_non_images() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("one.png");
        let txt = dir.path().join("readme.txt");
        let missing = dir.path().join("gone.png");
        std::fs::write(&png, png_bytes(3, 3, 255)).unwrap();
        std::fs::write(&txt, b"not an image").unwrap();

        let mut session = ImageSession::new();
        let added = session.add_files(&[&png, &txt, &missing]);
        assert_eq!(added, 1);
        assert_eq!(names(&session), vec!["one.png"]);
        assert!(session.images()[0].modified().is_some());
    }

    #[test]
    fn oversized_images_are_still_accepted() {
        let mut session = ImageSession::with_soft_size_limit(10);
        session.push(source("big.png", 50, 50));
        assert_eq!(session.len(), 1);
    }

    #[test]
    fn reorder_moves_one_element() {
        let mut session = ImageSession::new();
        for name in ["a", "b", "c", "d"] {
            session.push(source(name, 1, 1));
        }
        assert!(session.reorder(0, 2));
        assert_eq!(names(&session), vec!["b", "c", "a", "d"]);
        assert!(session.reorder(3, 0));
        assert_eq!(names(&session), vec!["d", "b", "c", "a"]);
        assert!(!session.reorder(4, 0));
        assert_eq!(names(&session), vec!["d", "b", "c", "a"]);
    }

    #[test]
    fn remove_and_clear_release_bytes() {
        let mut session = ImageSession::new();
        let img = source("a", 1, 1);
        let probe = Arc::clone(&img.data);
        session.push(img);
        session.push(source("b", 1, 1));

        let id = session.images()[0].id().to_string();
        assert!(session.remove(&id));
        assert!(!session.remove(&id));
        assert_eq!(Arc::strong_count(&probe), 1);

        session.clear();
        assert!(session.is_empty());
    }
}
