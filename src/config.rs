//! Configuration types for PDF splitting.
//!
//! Every knob of a run lives in [`SplitConfig`], built via its
//! [`SplitConfigBuilder`]. The output mode is fixed for the duration of one
//! run: the orchestrator copies the config into its run context before the
//! first page is touched.

use crate::error::SplitError;
use crate::pipeline::extract::PageExtractor;
use crate::pipeline::rasterize::PageRasterizer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default render scale: 2× the page's intrinsic point-to-pixel mapping.
pub const DEFAULT_SCALE: f32 = 2.0;

/// Default JPEG quality (0.95 on a 0–1 scale).
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

const MIN_SCALE: f32 = 0.25;
const MAX_SCALE: f32 = 8.0;

/// Configuration for one split run.
///
/// Built via [`SplitConfig::builder()`] or using [`SplitConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_pdfsplit::{OutputMode, SplitConfig};
///
/// let config = SplitConfig::builder()
///     .mode(OutputMode::Jpg)
///     .jpeg_quality(90)
///     .build()
///     .unwrap();
/// assert_eq!(config.mode.extension(), "jpg");
/// ```
#[derive(Clone)]
pub struct SplitConfig {
    /// What each page becomes. Default: [`OutputMode::Pdf`].
    pub mode: OutputMode,

    /// Render scale for image modes. Range: 0.25–8.0. Default: 2.0.
    ///
    /// A US-Letter page (612 × 792 pt) renders to 1224 × 1584 px at 2.0.
    pub scale: f32,

    /// JPEG quality for [`OutputMode::Jpg`]. Range: 1–100. Default: 95.
    pub jpeg_quality: u8,

    /// PDF user password handed to the rendering engine for encrypted documents.
    pub password: Option<String>,

    /// Explicit path to the pdfium shared library.
    /// If None, `PDFIUM_LIB_PATH` and then the system library are tried.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Pre-constructed extractor. If None, uses [`crate::LopdfExtractor`].
    pub extractor: Option<Arc<dyn PageExtractor>>,

    /// Pre-constructed rasterizer. If None, uses [`crate::PdfiumRasterizer`].
    pub rasterizer: Option<Arc<dyn PageRasterizer>>,

    /// Optional per-page progress observer.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            mode: OutputMode::default(),
            scale: DEFAULT_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            password: None,
            pdfium_lib_path: None,
            extractor: None,
            rasterizer: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for SplitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitConfig")
            .field("mode", &self.mode)
            .field("scale", &self.scale)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "extractor",
                &self.extractor.as_ref().map(|_| "<dyn PageExtractor>"),
            )
            .field(
                "rasterizer",
                &self.rasterizer.as_ref().map(|_| "<dyn PageRasterizer>"),
            )
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn SplitProgressCallback>"),
            )
            .finish()
    }
}

impl SplitConfig {
    /// Create a new builder for `SplitConfig`.
    pub fn builder() -> SplitConfigBuilder {
        SplitConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`SplitConfig`].
#[derive(Debug)]
pub struct SplitConfigBuilder {
    config: SplitConfig,
}

impl SplitConfigBuilder {
    pub fn mode(mut self, mode: OutputMode) -> Self {
        self.config.mode = mode;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale;
        self
    }

    pub fn jpeg_quality(mut self, quality: u8) -> Self {
        self.config.jpeg_quality = quality.clamp(1, 100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn extractor(mut self, extractor: Arc<dyn PageExtractor>) -> Self {
        self.config.extractor = Some(extractor);
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SplitConfig, SplitError> {
        let c = &self.config;
        if !c.scale.is_finite() || c.scale < MIN_SCALE || c.scale > MAX_SCALE {
            return Err(SplitError::InvalidConfig(format!(
                "Scale must be {MIN_SCALE}–{MAX_SCALE}, got {}",
                c.scale
            )));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// What each page of the source document becomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// One standalone single-page PDF per page. (default)
    #[default]
    Pdf,
    /// One JPEG per page.
    Jpg,
    /// One lossless PNG per page.
    Png,
}

impl OutputMode {
    /// File extension of each archive entry.
    pub fn extension(self) -> &'static str {
        match self {
            OutputMode::Pdf => "pdf",
            OutputMode::Jpg => "jpg",
            OutputMode::Png => "png",
        }
    }

    /// Upper-case label used in success messages ("PDF", "JPG", "PNG").
    pub fn label(self) -> &'static str {
        match self {
            OutputMode::Pdf => "PDF",
            OutputMode::Jpg => "JPG",
            OutputMode::Png => "PNG",
        }
    }

    /// The raster encoding for image modes, `None` for PDF output.
    pub fn raster_format(self) -> Option<RasterFormat> {
        match self {
            OutputMode::Pdf => None,
            OutputMode::Jpg => Some(RasterFormat::Jpeg),
            OutputMode::Png => Some(RasterFormat::Png),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Pixel encoding for rasterised pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    /// Lossy, no alpha channel.
    Jpeg,
    /// Lossless.
    Png,
}
