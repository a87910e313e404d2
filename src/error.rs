//! Error types for the edgequake-pdfsplit library.
//!
//! Two error types reflect the two levels at which a split can go wrong:
//!
//! * [`SplitError`] — **Fatal** for the run: the input is not a PDF, cannot be
//!   parsed, has a single page, or one of its pages could not be produced.
//!   Returned as `Err(SplitError)` from the top-level `split*` functions and
//!   turned into [`crate::session::OperationState::Failure`] by the session.
//!
//! * [`PageError`] — the failure of one page inside the extractor or the
//!   rasterizer. It never stands on its own: a split is all-or-nothing, so the
//!   orchestrator wraps it into [`SplitError::PageFailed`] and aborts.
//!
//! `Display` is the diagnostic text that goes to the log. The short,
//! friendlier text shown to a user comes from [`SplitError::user_message`].

use std::path::PathBuf;
use thiserror::Error;

/// Shown when the input is neither typed nor named as a PDF.
pub const MSG_INVALID_INPUT: &str = "Please select a PDF file.";
/// Shown when the bytes cannot be parsed as a PDF.
pub const MSG_LOAD_FAILED: &str =
    "Error processing the PDF file. Please make sure it's a valid PDF.";
/// Shown when the document has one page (or none).
pub const MSG_SINGLE_PAGE: &str = "The PDF has only one page. No splitting is needed.";
/// Shown when extracting a page as PDF fails.
pub const MSG_SPLIT_FAILED: &str = "Error splitting the PDF file. Please try again.";
/// Shown when rasterising or encoding a page fails.
pub const MSG_RASTER_FAILED: &str = "Error converting the PDF pages to images. Please try again.";
/// Shown for failures the user cannot act on, including an abandoned run.
pub const MSG_UNEXPECTED: &str = "Something went wrong. Please try again.";

/// All fatal errors returned by the edgequake-pdfsplit library.
#[derive(Debug, Error)]
pub enum SplitError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Declared type does not mention PDF and the name lacks a `.pdf` suffix.
    #[error("'{name}' is not a PDF (declared type: {content_type:?})")]
    InvalidInputType {
        name: String,
        content_type: Option<String>,
    },

    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    // ── PDF errors ────────────────────────────────────────────────────────
    /// The bytes could not be parsed as a PDF document.
    #[error("Failed to load '{name}' as PDF: {detail}")]
    DocumentLoadFailed { name: String, detail: String },

    /// Nothing to split: the document has at most one page.
    #[error("'{name}' has {pages} page(s); at least 2 are required to split")]
    InsufficientPages { name: String, pages: usize },

    /// One page could not be extracted or rasterised; the whole run aborts.
    #[error(transparent)]
    PageFailed(#[from] PageError),

    // ── Archive errors ────────────────────────────────────────────────────
    /// The zip encoder rejected an entry or could not finalise.
    #[error("Failed to build archive: {0}")]
    ArchiveFailed(String),

    // ── Session errors ────────────────────────────────────────────────────
    /// A run was requested while another one on the same session is processing.
    #[error("A split is already in progress on this session")]
    RunInProgress,

    /// The caller stopped waiting for the run, so the remaining pages were skipped.
    #[error("Split cancelled before completion")]
    Cancelled,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output zip file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library (needed for image output only).
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Image output needs the pdfium shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium to use an existing copy.\n\
  • Install libpdfium where the system loader finds it.\n\
  • Download a build from https://github.com/bblanchon/pdfium-binaries/releases.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SplitError {
    /// The short message a user sees in place of the upload prompt.
    ///
    /// Diagnostic detail stays in `Display` (and in the log).
    pub fn user_message(&self) -> String {
        match self {
            SplitError::InvalidInputType { .. } => MSG_INVALID_INPUT.to_string(),
            SplitError::DocumentLoadFailed { .. } => MSG_LOAD_FAILED.to_string(),
            SplitError::InsufficientPages { .. } => MSG_SINGLE_PAGE.to_string(),
            SplitError::PageFailed(PageError::ExtractFailed { .. }) => {
                MSG_SPLIT_FAILED.to_string()
            }
            SplitError::PageFailed(_) => MSG_RASTER_FAILED.to_string(),
            SplitError::FileNotFound { path } => {
                format!("File not found: {}", path.display())
            }
            SplitError::PermissionDenied { path } => {
                format!("Cannot read {}: permission denied.", path.display())
            }
            SplitError::RunInProgress => {
                "A file is already being split. Please wait for it to finish.".to_string()
            }
            SplitError::PdfiumBindingFailed(_) => {
                "Image output is unavailable: the PDF rendering engine could not be loaded."
                    .to_string()
            }
            SplitError::ArchiveFailed(_)
            | SplitError::OutputWriteFailed { .. }
            | SplitError::InvalidConfig(_)
            | SplitError::Cancelled
            | SplitError::Internal(_) => MSG_UNEXPECTED.to_string(),
        }
    }
}

/// Failure of a single page inside the extractor or the rasterizer.
///
/// `page` is always 1-indexed, matching artifact names.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// Rebuilding the page as a standalone PDF failed.
    #[error("Page {page}: extraction failed: {detail}")]
    ExtractFailed { page: usize, detail: String },

    /// The rendering engine could not rasterise the page.
    #[error("Page {page}: rasterisation failed: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The rendered bitmap could not be encoded as JPEG/PNG.
    #[error("Page {page}: image encoding failed: {detail}")]
    EncodeFailed { page: usize, detail: String },
}

impl PageError {
    /// 1-indexed page number the error refers to.
    pub fn page(&self) -> usize {
        match self {
            PageError::ExtractFailed { page, .. }
            | PageError::RenderFailed { page, .. }
            | PageError::EncodeFailed { page, .. } => *page,
        }
    }
}
