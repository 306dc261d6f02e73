//! Progress-callback trait for per-unit conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to receive
//! events as a pipeline finishes each unit of work: one image when composing,
//! one page when extracting.
//!
//! Callbacks run synchronously on the pipeline's thread, after the unit is
//! done and before the next one starts.
//!
//! # Example
//!
//! ```rust
//! use imgpdf::{ConversionConfig, ConversionProgressCallback};
//! use std::sync::{Arc, Mutex};
//!
//! struct Recorder(Mutex<Vec<u8>>);
//!
//! impl ConversionProgressCallback for Recorder {
//!     fn on_page_complete(&self, _page_num: usize, _total: usize, percent: u8) {
//!         self.0.lock().unwrap().push(percent);
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Recorder(Mutex::new(Vec::new()))))
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the pipelines as they process each unit.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. `percent` is the run's overall progress after the
/// unit, `round(100 * done / total)`; it never decreases within a run and is
/// exactly 100 after the last unit.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first unit.
    ///
    /// # Arguments
    /// * `total_pages` — number of units that will be processed
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a unit is processed.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed unit number
    /// * `total_pages` — total units in the run
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a unit completed successfully.
    fn on_page_complete(&self, page_num: usize, total_pages: usize, percent: u8) {
        let _ = (page_num, total_pages, percent);
    }

    /// Called when a unit failed and was skipped or degraded to a blank page.
    ///
    /// Progress still advances: `percent` is reported here instead of via
    /// [`Self::on_page_complete`].
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str, percent: u8) {
        let _ = (page_num, total_pages, error, percent);
    }

    /// Called once after every unit has been attempted.
    ///
    /// # Arguments
    /// * `total_pages`   — units in the run
    /// * `success_count` — units that completed without error
    fn on_conversion_complete(&self, total_pages: usize, success_count: usize) {
        let _ = (total_pages, success_count);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Percent of a run that is done: `round(100 * done / total)`.
///
/// Any finished unit reports at least 1, so runs longer than 200 units do
/// not start at 0. An empty run counts as complete.
pub fn percent_complete(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let done = done.min(total);
    let percent = ((done as f64 * 100.0) / total as f64).round() as u8;
    if done > 0 {
        percent.max(1)
    } else {
        percent
    }
}

/// Per-run bookkeeping that turns unit outcomes into callback events.
///
/// Counts units so that the reported percent is monotonic by construction.
pub(crate) struct ProgressTracker<'a> {
    callback: Option<&'a dyn ConversionProgressCallback>,
    total: usize,
    done: usize,
    succeeded: usize,
}

impl<'a> ProgressTracker<'a> {
    pub(crate) fn start(callback: Option<&'a ProgressCallback>, total: usize) -> Self {
        let callback = callback.map(|cb| cb.as_ref());
        if let Some(cb) = callback {
            cb.on_conversion_start(total);
        }
        Self {
            callback,
            total,
            done: 0,
            succeeded: 0,
        }
    }

    pub(crate) fn unit_started(&self, page_num: usize) {
        if let Some(cb) = self.callback {
            cb.on_page_start(page_num, self.total);
        }
    }

    pub(crate) fn unit_succeeded(&mut self, page_num: usize) -> u8 {
        self.done += 1;
        self.succeeded += 1;
        let percent = percent_complete(self.done, self.total);
        if let Some(cb) = self.callback {
            cb.on_page_complete(page_num, self.total, percent);
        }
        percent
    }

    pub(crate) fn unit_failed(&mut self, page_num: usize, error: &str) -> u8 {
        self.done += 1;
        let percent = percent_complete(self.done, self.total);
        if let Some(cb) = self.callback {
            cb.on_page_error(page_num, self.total, error, percent);
        }
        percent
    }

    pub(crate) fn finish(self) {
        if let Some(cb) = self.callback {
            cb.on_conversion_complete(self.total, self.succeeded);
        }
    }
}
