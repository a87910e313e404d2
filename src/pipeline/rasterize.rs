//! Page rasterisation: render one page to a bitmap via pdfium, then encode it.
//!
//! The output size is derived from the page's size in points times the
//! render scale, rounded to whole pixels: at the default scale of 2.0 a
//! 612 × 792 pt Letter page becomes a 1224 × 1584 px image.
//!
//! pdfium is not async-safe; callers run [`PageRasterizer::rasterize_pages`]
//! inside `spawn_blocking`. [`PdfiumRasterizer`] binds the library and parses
//! the document once per run, then renders every page from that handle.

use crate::config::{RasterFormat, SplitConfig};
use crate::document::SourceDocument;
use crate::engine;
use crate::error::{PageError, SplitError};
use crate::pipeline::{encode, PageSink};
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Produces encoded raster images of pages.
pub trait PageRasterizer: Send + Sync {
    /// Rasterise the page at `page_index` (0-based) and encode it as `format`.
    fn rasterize(
        &self,
        doc: &SourceDocument,
        page_index: usize,
        format: RasterFormat,
    ) -> Result<Vec<u8>, PageError>;

    /// Rasterise every page in ascending order, handing each one to `sink`.
    ///
    /// Stops at the first error, whether it comes from a page or from the sink.
    /// Implementations with per-document setup override this to do it once.
    fn rasterize_pages(
        &self,
        doc: &SourceDocument,
        format: RasterFormat,
        sink: &mut dyn PageSink,
    ) -> Result<(), SplitError> {
        for page_index in 0..doc.page_count() {
            sink.begin_page(page_index)?;
            let bytes = self.rasterize(doc, page_index, format)?;
            sink.finish_page(page_index, bytes)?;
        }
        Ok(())
    }
}

/// Pixel size of a rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Size of a `width_pt × height_pt` page rendered at `scale`.
    ///
    /// Each side is at least one pixel.
    pub fn for_page(width_pt: f32, height_pt: f32, scale: f32) -> Self {
        let px = |pt: f32| ((pt * scale).round() as i64).max(1) as u32;
        Self {
            width: px(width_pt),
            height: px(height_pt),
        }
    }
}

/// Default rasterizer backed by pdfium.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    scale: f32,
    jpeg_quality: u8,
    password: Option<String>,
    lib_path: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new(scale: f32, jpeg_quality: u8) -> Self {
        Self {
            scale,
            jpeg_quality,
            password: None,
            lib_path: None,
        }
    }

    /// Take scale, quality, password and library path from a run config.
    pub fn from_config(config: &SplitConfig) -> Self {
        Self {
            scale: config.scale,
            jpeg_quality: config.jpeg_quality,
            password: config.password.clone(),
            lib_path: config.pdfium_lib_path.clone(),
        }
    }
}

impl PdfiumRasterizer {
    fn load<'a>(
        &self,
        pdfium: &'a Pdfium,
        doc: &'a SourceDocument,
        page_index: usize,
    ) -> Result<PdfDocument<'a>, PageError> {
        pdfium
            .load_pdf_from_byte_slice(doc.bytes(), self.password.as_deref())
            .map_err(|e| PageError::RenderFailed {
                page: page_index + 1,
                detail: format!("load: {e:?}"),
            })
    }

    fn render_page(
        &self,
        document: &PdfDocument<'_>,
        page_index: usize,
        format: RasterFormat,
    ) -> Result<Vec<u8>, PageError> {
        let page_num = page_index + 1;
        let render_err = |detail: String| PageError::RenderFailed {
            page: page_num,
            detail,
        };

        let index = u16::try_from(page_index)
            .map_err(|_| render_err(format!("page index {page_index} exceeds pdfium limit")))?;
        let pages = document.pages();
        let page = pages
            .get(index)
            .map_err(|e| render_err(format!("{e:?}")))?;

        let viewport = Viewport::for_page(page.width().value, page.height().value, self.scale);
        let render_config = PdfRenderConfig::new()
            .set_target_width(viewport.width as i32)
            .set_target_height(viewport.height as i32);

        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| render_err(format!("{e:?}")))?;
        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );

        encode::encode_page(&image, format, self.jpeg_quality).map_err(|e| {
            PageError::EncodeFailed {
                page: page_num,
                detail: e.to_string(),
            }
        })
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(
        &self,
        doc: &SourceDocument,
        page_index: usize,
        format: RasterFormat,
    ) -> Result<Vec<u8>, PageError> {
        let pdfium = engine::bind_pdfium(self.lib_path.as_deref()).map_err(|e| {
            PageError::RenderFailed {
                page: page_index + 1,
                detail: e.to_string(),
            }
        })?;
        let document = self.load(&pdfium, doc, page_index)?;
        self.render_page(&document, page_index, format)
    }

    fn rasterize_pages(
        &self,
        doc: &SourceDocument,
        format: RasterFormat,
        sink: &mut dyn PageSink,
    ) -> Result<(), SplitError> {
        let total_pages = doc.page_count();
        if total_pages == 0 {
            return Ok(());
        }

        // A missing library fails the run before any page is started.
        let pdfium = engine::bind_pdfium(self.lib_path.as_deref())?;

        sink.begin_page(0)?;
        let document = self.load(&pdfium, doc, 0)?;
        debug!("pdfium loaded '{}' once for {} pages", doc.name(), total_pages);

        for page_index in 0..total_pages {
            if page_index > 0 {
                sink.begin_page(page_index)?;
            }
            let bytes = self.render_page(&document, page_index, format)?;
            sink.finish_page(page_index, bytes)?;
        }
        Ok(())
    }
}
