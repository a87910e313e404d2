//! # edgequake-pdfsplit
//!
//! Split a multi-page PDF into one file per page and bundle them as a zip.
//!
//! Each page becomes either a standalone single-page PDF or a raster image
//! (JPEG or PNG, rendered at 2× by default). The archive is named after the
//! input (`report.pdf` → `report.zip`) and its entries after their page
//! (`report_p1.pdf`, `report_p2.pdf`, …).
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     name / declared type check, base name
//!  ├─ 2. Load      parse with lopdf (spawn_blocking), require > 1 page
//!  ├─ 3. Pages     for each page, in order:
//!  │                 PDF mode   → lopdf single-page rebuild
//!  │                 image mode → pdfium render at scale → JPEG/PNG
//!  ├─ 4. Archive   deflate-compressed zip, one entry per page
//!  └─ 5. Output    archive + per-page summaries + stats
//! ```
//!
//! A run is all-or-nothing: the first page that fails aborts it and no
//! partial archive is returned.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdfsplit::{split_file, OutputMode, SplitConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SplitConfig::builder().mode(OutputMode::Png).build()?;
//!     let output = split_file("report.pdf", &config).await?;
//!     std::fs::write(&output.archive_name, output.archive.bytes())?;
//!     println!("{}", output.success_message());
//!     Ok(())
//! }
//! ```
//!
//! For a UI-style workflow with Idle/Processing/Success/Failure states and a
//! download slot, use [`SplitSession`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfsplit` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! edgequake-pdfsplit = { version = "0.1", default-features = false }
//! ```
//!
//! ## Rendering engine
//!
//! PDF output needs nothing beyond this crate. JPG and PNG output render
//! through pdfium, loaded at runtime; see [`engine`] for where it is looked up.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod archive;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod session;
pub mod split;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use archive::{ArchiveBlob, ArchiveBuilder, PageArtifact};
pub use config::{OutputMode, RasterFormat, SplitConfig, SplitConfigBuilder};
pub use document::SourceDocument;
pub use error::{PageError, SplitError};
pub use output::{DocumentInfo, PageSummary, SplitOutput, SplitStats};
pub use pipeline::extract::{LopdfExtractor, PageExtractor};
pub use pipeline::input::SplitInput;
pub use pipeline::rasterize::{PageRasterizer, PdfiumRasterizer};
pub use pipeline::PageSink;
pub use progress::{NoopProgressCallback, ProgressCallback, SplitProgressCallback};
pub use session::{OperationState, SplitSession};
pub use split::{
    inspect, split, split_file, split_from_bytes, split_sync, split_to_file, write_archive,
    RunContext,
};
pub use stream::{split_with_events, ChannelProgress, SplitEvent, SplitEventStream};
