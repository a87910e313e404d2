//! Pipeline stages for splitting a PDF.
//!
//! Each submodule implements one step. The orchestrator in [`crate::split`]
//! strings them together for every page.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ─────────────────────▶ archive
//!   │        (PDF mode, lopdf)               ▲
//!   └──────▶ rasterize ──▶ encode ───────────┘
//!            (image mode, pdfium)  (JPEG/PNG)
//! ```
//!
//! 1. [`input`]     — the uploaded file, its validation and base name
//! 2. [`extract`]   — rebuild one page as a standalone PDF
//! 3. [`rasterize`] — render pages at a fixed scale; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 4. [`encode`]    — JPEG (quality 95) or PNG encoding of the bitmap
//!
//! Produced pages are handed to a [`PageSink`] one at a time, in ascending
//! page order, so a whole run fits in a single blocking task.

use crate::error::SplitError;

pub mod encode;
pub mod extract;
pub mod input;
pub mod rasterize;

#[cfg(test)]
pub(crate) mod fixtures;

/// Receives pages as they are produced.
///
/// Either method may stop the run by returning an error; no later page is
/// produced after that.
pub trait PageSink {
    /// Called before the page at `page_index` (0-based) is produced.
    fn begin_page(&mut self, page_index: usize) -> Result<(), SplitError>;

    /// Called with the encoded bytes of the page at `page_index`.
    fn finish_page(&mut self, page_index: usize, bytes: Vec<u8>) -> Result<(), SplitError>;
}
