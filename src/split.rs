//! The split orchestrator: validate, load, process every page, archive.
//!
//! A run is strictly sequential. The document load runs on `spawn_blocking`;
//! then a single blocking task produces every page in ascending order, adds
//! each one to the archive as it arrives and finalises the archive. Page order
//! in the archive therefore always matches page index. The first failing page
//! aborts the run; the partially built archive is dropped with it.
//!
//! Dropping the future returned by [`split`] (a timeout, an aborted task)
//! cancels the run: the blocking task stops before the next page.
//!
//! Everything a run needs travels in its own [`RunContext`]; nothing here
//! touches shared state. [`crate::session::SplitSession`] layers the
//! Idle/Processing/Success/Failure state machine on top of [`split`].

use crate::archive::{archive_name, artifact_name, ArchiveBlob, ArchiveBuilder, PageArtifact};
use crate::config::{OutputMode, RasterFormat, SplitConfig};
use crate::document::SourceDocument;
use crate::error::SplitError;
use crate::output::{DocumentInfo, PageSummary, SplitOutput, SplitStats};
use crate::pipeline::extract::{LopdfExtractor, PageExtractor};
use crate::pipeline::input::SplitInput;
use crate::pipeline::rasterize::{PageRasterizer, PdfiumRasterizer};
use crate::pipeline::PageSink;
use crate::progress::ProgressCallback;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Run-scoped values, fixed once the document has been loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    /// Input file name without its `.pdf` suffix.
    pub base_name: String,
    pub mode: OutputMode,
    pub total_pages: usize,
}

impl RunContext {
    /// Entry name for 1-indexed `page_num`.
    pub fn artifact_name(&self, page_num: usize) -> String {
        artifact_name(&self.base_name, page_num, self.mode)
    }

    /// `{baseName}.zip`
    pub fn archive_name(&self) -> String {
        archive_name(&self.base_name)
    }
}

/// What produces the pages in the selected mode.
enum PageWorker {
    Extract(Arc<dyn PageExtractor>),
    Rasterize {
        rasterizer: Arc<dyn PageRasterizer>,
        format: RasterFormat,
    },
}

impl PageWorker {
    fn for_config(config: &SplitConfig) -> Self {
        match config.mode.raster_format() {
            None => PageWorker::Extract(
                config
                    .extractor
                    .clone()
                    .unwrap_or_else(|| Arc::new(LopdfExtractor)),
            ),
            Some(format) => PageWorker::Rasterize {
                rasterizer: config
                    .rasterizer
                    .clone()
                    .unwrap_or_else(|| Arc::new(PdfiumRasterizer::from_config(config))),
                format,
            },
        }
    }

    /// Produce every page in order and feed it to `sink`.
    fn run_pages(&self, doc: &SourceDocument, sink: &mut dyn PageSink) -> Result<(), SplitError> {
        match self {
            PageWorker::Extract(extractor) => {
                for page_index in 0..doc.page_count() {
                    sink.begin_page(page_index)?;
                    let bytes = extractor.extract(doc, page_index)?;
                    sink.finish_page(page_index, bytes)?;
                }
                Ok(())
            }
            PageWorker::Rasterize { rasterizer, format } => {
                rasterizer.rasterize_pages(doc, *format, sink)
            }
        }
    }
}

/// Collects produced pages into the archive and reports progress.
struct ArchiveSink<'a> {
    ctx: &'a RunContext,
    archive: ArchiveBuilder,
    pages: Vec<PageSummary>,
    callback: Option<&'a ProgressCallback>,
    cancelled: &'a AtomicBool,
    /// 1-indexed page currently being produced.
    current: Option<usize>,
}

impl PageSink for ArchiveSink<'_> {
    fn begin_page(&mut self, page_index: usize) -> Result<(), SplitError> {
        let page_num = page_index + 1;
        if self.cancelled.load(Ordering::Acquire) {
            debug!("Run cancelled before page {}", page_num);
            return Err(SplitError::Cancelled);
        }
        self.current = Some(page_num);
        if let Some(cb) = self.callback {
            cb.on_page_start(page_num, self.ctx.total_pages);
        }
        Ok(())
    }

    fn finish_page(&mut self, page_index: usize, bytes: Vec<u8>) -> Result<(), SplitError> {
        let page_num = page_index + 1;
        let artifact = PageArtifact::new(&self.ctx.base_name, page_num, self.ctx.mode, bytes);
        self.archive.add_artifact(&artifact)?;
        debug!(
            "Page {}/{} → {} ({} bytes)",
            page_num,
            self.ctx.total_pages,
            artifact.name,
            artifact.bytes.len()
        );

        if let Some(cb) = self.callback {
            cb.on_page_complete(page_num, self.ctx.total_pages, artifact.bytes.len());
        }
        self.pages.push(PageSummary {
            page_num,
            name: artifact.name,
            bytes: artifact.bytes.len(),
        });
        Ok(())
    }
}

impl ArchiveSink<'_> {
    /// Report `error` against the page it belongs to, if any.
    fn notify_error(&self, error: &SplitError) {
        let page_num = match error {
            SplitError::Cancelled => None,
            SplitError::PageFailed(e) => Some(e.page()),
            _ => self.current,
        };
        if let (Some(cb), Some(page_num)) = (self.callback, page_num) {
            cb.on_page_error(page_num, self.ctx.total_pages, &error.to_string());
        }
    }
}

/// Raises the cancel flag when the run's future goes away.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Split a PDF into one file per page and bundle them as a zip.
///
/// This is the primary entry point for the library.
///
/// # Errors
/// Every error is terminal for the run; no partial archive is returned:
/// - [`SplitError::InvalidInputType`] — neither typed nor named as PDF
///   (checked before any parsing)
/// - [`SplitError::DocumentLoadFailed`] — the bytes are not a valid PDF
/// - [`SplitError::InsufficientPages`] — one page or fewer
/// - [`SplitError::PdfiumBindingFailed`] — image output without libpdfium
/// - [`SplitError::PageFailed`] — a page could not be extracted or rasterised
pub async fn split(input: SplitInput, config: &SplitConfig) -> Result<SplitOutput, SplitError> {
    let name = input.name.clone();
    let result = run(input, config).await;
    if let Err(ref e) = result {
        error!("Split of '{}' failed: {}", name, e);
    }
    result
}

async fn run(input: SplitInput, config: &SplitConfig) -> Result<SplitOutput, SplitError> {
    let total_start = Instant::now();

    // ── Step 1: Validate input type, derive base name ────────────────────
    let base_name = input.validate()?;
    let mode = config.mode;
    let input_bytes = input.bytes.len();
    info!(
        "Starting split: {} ({} bytes) as {}",
        input.name,
        input_bytes,
        mode.label()
    );

    // ── Step 2: Load the document ────────────────────────────────────────
    let load_start = Instant::now();
    let SplitInput { name, bytes, .. } = input;
    let doc = tokio::task::spawn_blocking(move || SourceDocument::load(name, bytes))
        .await
        .map_err(|e| SplitError::Internal(format!("Load task panicked: {}", e)))??;
    let load_duration_ms = load_start.elapsed().as_millis() as u64;

    // ── Step 3: Require more than one page ───────────────────────────────
    let total_pages = doc.page_count();
    if total_pages <= 1 {
        return Err(SplitError::InsufficientPages {
            name: doc.name().to_string(),
            pages: total_pages,
        });
    }
    info!("PDF has {} pages", total_pages);

    let ctx = RunContext {
        base_name,
        mode,
        total_pages,
    };

    // ── Step 4: Resolve the page worker ──────────────────────────────────
    let worker = PageWorker::for_config(config);
    let callback = config.progress_callback.clone();
    if let Some(cb) = &callback {
        cb.on_split_start(total_pages);
    }

    // ── Step 5: Produce pages in order and finalise the archive ──────────
    let pages_start = Instant::now();
    let cancel = CancelOnDrop(Arc::new(AtomicBool::new(false)));
    let cancelled = Arc::clone(&cancel.0);
    let (archive, pages) = tokio::task::spawn_blocking(move || {
        let mut sink = ArchiveSink {
            ctx: &ctx,
            archive: ArchiveBuilder::new(&ctx.base_name),
            pages: Vec::with_capacity(total_pages),
            callback: callback.as_ref(),
            cancelled: &cancelled,
            current: None,
        };
        if let Err(e) = worker.run_pages(&doc, &mut sink) {
            sink.notify_error(&e);
            return Err(e);
        }
        let ArchiveSink { archive, pages, .. } = sink;
        let archive = archive.finish()?;
        if let Some(cb) = &callback {
            cb.on_split_complete(total_pages, archive.len());
        }
        Ok((archive, pages))
    })
    .await
    .map_err(|e| SplitError::Internal(format!("Page task panicked: {}", e)))??;
    let pages_duration_ms = pages_start.elapsed().as_millis() as u64;

    let stats = SplitStats {
        total_pages,
        mode,
        input_bytes,
        archive_bytes: archive.len(),
        load_duration_ms,
        pages_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Split complete: {} pages → {} ({} bytes), {}ms total",
        total_pages,
        archive.name(),
        archive.len(),
        stats.total_duration_ms
    );

    Ok(SplitOutput {
        archive_name: archive.name().to_string(),
        archive,
        pages,
        stats,
    })
}

/// Read a local PDF and split it.
pub async fn split_file(
    path: impl AsRef<Path>,
    config: &SplitConfig,
) -> Result<SplitOutput, SplitError> {
    let input = SplitInput::from_path(path).await?;
    split(input, config).await
}

/// Split in-memory PDF bytes uploaded under `name`.
pub async fn split_from_bytes(
    name: impl Into<String>,
    bytes: impl Into<Vec<u8>>,
    config: &SplitConfig,
) -> Result<SplitOutput, SplitError> {
    split(SplitInput::new(name, bytes), config).await
}

/// Split a local PDF and write the zip to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn split_to_file(
    path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    config: &SplitConfig,
) -> Result<SplitOutput, SplitError> {
    let output = split_file(path, config).await?;
    write_archive(&output.archive, output_path).await?;
    Ok(output)
}

/// Write a finished archive to disk atomically.
pub async fn write_archive(
    archive: &ArchiveBlob,
    output_path: impl AsRef<Path>,
) -> Result<(), SplitError> {
    let path = output_path.as_ref();
    let write_err = |source: std::io::Error| SplitError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("zip.tmp");
    tokio::fs::write(&tmp_path, archive.bytes())
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;

    debug!("Wrote {} ({} bytes)", path.display(), archive.len());
    Ok(())
}

/// Synchronous wrapper around [`split`].
///
/// Creates a temporary tokio runtime internally.
pub fn split_sync(input: SplitInput, config: &SplitConfig) -> Result<SplitOutput, SplitError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SplitError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(split(input, config))
}

/// Read PDF metadata without splitting.
pub async fn inspect(path: impl AsRef<Path>) -> Result<DocumentInfo, SplitError> {
    let input = SplitInput::from_path(path).await?;
    input.validate()?;
    let SplitInput { name, bytes, .. } = input;
    let doc = tokio::task::spawn_blocking(move || SourceDocument::load(name, bytes))
        .await
        .map_err(|e| SplitError::Internal(format!("Inspect task panicked: {}", e)))??;
    Ok(doc.info())
}
