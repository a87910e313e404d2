//! Progress-callback trait for per-page split events.
//!
//! Inject an [`Arc<dyn SplitProgressCallback>`] via
//! [`crate::config::SplitConfigBuilder::progress_callback`] to receive events
//! as the pipeline processes each page. The pipeline itself never knows who is
//! listening: a terminal progress bar, a [`crate::session::SplitSession`]
//! updating its state message, or a channel (see [`crate::stream`]).
//!
//! # Example
//!
//! ```rust
//! use edgequake_pdfsplit::{SplitConfig, SplitProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl SplitProgressCallback for CountingCallback {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize, bytes: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("Page {}/{} done ({} bytes)", page_num, total_pages, bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = SplitConfig::builder()
//!     .progress_callback(counter as Arc<dyn SplitProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the split pipeline as it processes each page.
///
/// Pages are processed strictly one after another in ascending order, so
/// events for page `n + 1` never precede `on_page_complete` for page `n`.
/// Implementations must still be `Send + Sync`: the pipeline runs on a Tokio
/// worker and may hop threads between pages.
pub trait SplitProgressCallback: Send + Sync {
    /// Called once after the document is loaded and validated.
    ///
    /// # Arguments
    /// * `total_pages` — number of pages that will be split
    fn on_split_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called just before a page is extracted or rasterised.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages in the document
    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called when a page artifact has been added to the archive.
    ///
    /// # Arguments
    /// * `page_num`    — 1-indexed page number
    /// * `total_pages` — total pages
    /// * `bytes`       — size of the produced artifact
    fn on_page_complete(&self, page_num: usize, total_pages: usize, bytes: usize) {
        let _ = (page_num, total_pages, bytes);
    }

    /// Called when a page fails. The run aborts right after this call.
    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        let _ = (page_num, total_pages, error);
    }

    /// Called once after the archive has been finalised.
    ///
    /// # Arguments
    /// * `total_pages`   — pages in the archive
    /// * `archive_bytes` — size of the finished zip
    fn on_split_complete(&self, total_pages: usize, archive_bytes: usize) {
        let _ = (total_pages, archive_bytes);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl SplitProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::SplitConfig`].
pub type ProgressCallback = Arc<dyn SplitProgressCallback>;

/// Fans one event out to several observers, in order.
///
/// The session uses this to keep its own state message current while still
/// forwarding events to the callback the caller configured.
pub(crate) struct FanOut(pub(crate) Vec<ProgressCallback>);

impl SplitProgressCallback for FanOut {
    fn on_split_start(&self, total_pages: usize) {
        self.0.iter().for_each(|cb| cb.on_split_start(total_pages));
    }

    fn on_page_start(&self, page_num: usize, total_pages: usize) {
        self.0
            .iter()
            .for_each(|cb| cb.on_page_start(page_num, total_pages));
    }

    fn on_page_complete(&self, page_num: usize, total_pages: usize, bytes: usize) {
        self.0
            .iter()
            .for_each(|cb| cb.on_page_complete(page_num, total_pages, bytes));
    }

    fn on_page_error(&self, page_num: usize, total_pages: usize, error: &str) {
        self.0
            .iter()
            .for_each(|cb| cb.on_page_error(page_num, total_pages, error));
    }

    fn on_split_complete(&self, total_pages: usize, archive_bytes: usize) {
        self.0
            .iter()
            .for_each(|cb| cb.on_split_complete(total_pages, archive_bytes));
    }
}
