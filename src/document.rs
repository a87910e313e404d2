//! The parsed source document.
//!
//! [`SourceDocument`] is loaded once per run and shared read-only by every
//! page step. It keeps the parsed `lopdf` tree (for extraction and page
//! count) next to the original bytes, because the rendering engine opens its
//! own handle from the raw bytes.

use crate::error::SplitError;
use crate::output::DocumentInfo;
use lopdf::{Document, Object, ObjectId};
use std::sync::Arc;
use tracing::debug;

/// Opaque handle to a parsed multi-page PDF.
pub struct SourceDocument {
    name: String,
    bytes: Arc<[u8]>,
    doc: Document,
    /// Page object ids in page order.
    page_ids: Vec<ObjectId>,
}

impl SourceDocument {
    /// Parse `bytes` as a PDF.
    ///
    /// `name` is only used in diagnostics.
    ///
    /// # Errors
    /// [`SplitError::DocumentLoadFailed`] when the bytes are not a parseable PDF.
    pub fn load(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Result<Self, SplitError> {
        let name = name.into();
        let bytes = bytes.into();

        let doc = Document::load_mem(&bytes).map_err(|e| SplitError::DocumentLoadFailed {
            name: name.clone(),
            detail: e.to_string(),
        })?;
        let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
        debug!(
            "Parsed '{}': {} pages, PDF {}",
            name,
            page_ids.len(),
            doc.version
        );

        Ok(Self {
            name,
            bytes,
            doc,
            page_ids,
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Object id of the page at `page_index` (0-based).
    pub fn page_id(&self, page_index: usize) -> Option<ObjectId> {
        self.page_ids.get(page_index).copied()
    }

    /// Name the document was loaded under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw bytes the document was parsed from.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The parsed object tree.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Summarise the document's metadata.
    pub fn info(&self) -> DocumentInfo {
        let info_dict = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .and_then(|o| resolve(&self.doc, o))
            .and_then(|o| o.as_dict().ok());

        let get_meta = |key: &[u8]| -> Option<String> {
            let value = info_dict?.get(key).ok()?;
            match resolve(&self.doc, value)? {
                Object::String(raw, _) => {
                    let text = decode_text_string(raw);
                    let text = text.trim();
                    if text.is_empty() {
                        None
                    } else {
                        Some(text.to_string())
                    }
                }
                _ => None,
            }
        };

        DocumentInfo {
            title: get_meta(b"Title"),
            author: get_meta(b"Author"),
            subject: get_meta(b"Subject"),
            creator: get_meta(b"Creator"),
            producer: get_meta(b"Producer"),
            page_count: self.page_count(),
            pdf_version: self.doc.version.clone(),
            is_encrypted: self.doc.trailer.get(b"Encrypt").is_ok(),
            file_size: self.bytes.len(),
        }
    }
}

/// Follow one level of indirection.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, otherwise byte-per-char.
fn decode_text_string(raw: &[u8]) -> String {
    if raw.len() >= 2 && raw[0] == 0xFE && raw[1] == 0xFF {
        let units: Vec<u16> = raw[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        raw.iter().map(|&b| b as char).collect()
    }
}
