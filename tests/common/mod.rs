//! Shared helpers for integration tests: in-memory PDFs, archive readers and
//! stand-in rasterizers that need no pdfium.

#![allow(dead_code)]

use edgequake_pdfsplit::pipeline::encode::encode_page;
use edgequake_pdfsplit::{PageError, PageRasterizer, RasterFormat, SourceDocument};
use image::{DynamicImage, Rgba, RgbaImage};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, StringFormat, Stream};
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A Letter-sized PDF with `num_pages` pages; page `n` shows "Page n".
pub fn multi_page_pdf(num_pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Courier".to_vec())),
    ]));

    let kids: Vec<Object> = (1..=num_pages)
        .map(|n| {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            format!("Page {n}").into_bytes(),
                            StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
            let page_id = doc.add_object(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
                ),
                (
                    "Resources",
                    Object::Dictionary(Dictionary::from_iter(vec![(
                        "Font",
                        Object::Dictionary(Dictionary::from_iter(vec![(
                            "F1",
                            Object::Reference(font_id),
                        )])),
                    )])),
                ),
                ("Contents", Object::Reference(content_id)),
            ]));
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(num_pages as i64)),
            ("Kids", Object::Array(kids)),
        ])),
    );
    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// `(name, bytes)` of every entry, in archive order.
pub fn zip_entries(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    (0..zip.len())
        .map(|i| {
            let mut f = zip.by_index(i).unwrap();
            let mut buf = Vec::new();
            f.read_to_end(&mut buf).unwrap();
            (f.name().to_string(), buf)
        })
        .collect()
}

/// Rasterizer that paints a small solid square per page, shaded by page index.
#[derive(Default)]
pub struct SolidRasterizer {
    pub calls: AtomicUsize,
}

impl PageRasterizer for SolidRasterizer {
    fn rasterize(
        &self,
        _doc: &SourceDocument,
        page_index: usize,
        format: RasterFormat,
    ) -> Result<Vec<u8>, PageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let shade = (page_index * 40 % 256) as u8;
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            17,
            22,
            Rgba([shade, 0, 255 - shade, 255]),
        ));
        encode_page(&img, format, 95).map_err(|e| PageError::EncodeFailed {
            page: page_index + 1,
            detail: e.to_string(),
        })
    }
}

/// Rasterizer that fails on one page.
pub struct BrokenRasterizer {
    pub fail_on: usize,
    pub inner: SolidRasterizer,
}

impl BrokenRasterizer {
    pub fn failing_on(page_index: usize) -> Self {
        Self {
            fail_on: page_index,
            inner: SolidRasterizer::default(),
        }
    }
}

impl PageRasterizer for BrokenRasterizer {
    fn rasterize(
        &self,
        doc: &SourceDocument,
        page_index: usize,
        format: RasterFormat,
    ) -> Result<Vec<u8>, PageError> {
        if page_index == self.fail_on {
            self.inner.calls.fetch_add(1, Ordering::SeqCst);
            return Err(PageError::RenderFailed {
                page: page_index + 1,
                detail: "canvas unavailable".into(),
            });
        }
        self.inner.rasterize(doc, page_index, format)
    }
}
