//! Pipeline stages for image ⇄ PDF conversion.
//!
//! Each submodule implements one step. The two directions share the leaf
//! stages and nothing else.
//!
//! ## Data Flow
//!
//! ```text
//! compose:  session ──▶ encode ──▶ layout ──▶ engine writer ──▶ PDF artifact
//!                      (flatten,   (fit and
//!                       JPEG/PNG)   center)
//!
//! extract:  input ──▶ engine render ──▶ encode ──▶ PageImage … ──▶ archive
//!           (%PDF)    (scale 2.0)       (PNG)                      (ZIP)
//! ```
//!
//! 1. [`input`]   — read files and check the PDF magic / image format
//! 2. [`layout`]  — page geometry and fit-and-center placement math
//! 3. [`encode`]  — alpha flattening, JPEG/PNG encoding, data URLs and the
//!    ordered composition strategies
//! 4. [`compose`] — the Page Composer
//! 5. [`extract`] — the Page Extractor and its filename rules
//! 6. [`archive`] — the Archive Packer

pub mod archive;
pub mod compose;
pub mod encode;
pub mod extract;
pub mod input;
pub mod layout;
