//! Page extraction: one page of the source → a standalone one-page PDF.
//!
//! [`LopdfExtractor`] builds a fresh document per page. It copies the page
//! dictionary, the attributes the page inherits from its ancestors in the
//! page tree (`/Resources`, `/MediaBox`, `/CropBox`, `/Rotate`), and every
//! object the page references directly or indirectly. Other pages and
//! page-tree nodes are never copied; references to them (link destinations,
//! for instance) become `null`. The cost of one page therefore depends on
//! what that page uses, not on the size of the document.

use crate::document::SourceDocument;
use crate::error::PageError;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeSet;
use tracing::debug;

/// Page attributes a page may inherit from its `/Parent` chain.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Produces the byte encoding of a single page as its own PDF.
///
/// Implementations must be deterministic for identical input and must not
/// retry: a failure is reported once and aborts the run.
pub trait PageExtractor: Send + Sync {
    /// Extract the page at `page_index` (0-based).
    fn extract(&self, doc: &SourceDocument, page_index: usize) -> Result<Vec<u8>, PageError>;
}

/// Default extractor backed by `lopdf`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LopdfExtractor;

impl PageExtractor for LopdfExtractor {
    fn extract(&self, doc: &SourceDocument, page_index: usize) -> Result<Vec<u8>, PageError> {
        let page_num = page_index + 1;
        let fail = |detail: String| PageError::ExtractFailed {
            page: page_num,
            detail,
        };

        let page_id = doc.page_id(page_index).ok_or_else(|| {
            fail(format!(
                "page index out of range (document has {} pages)",
                doc.page_count()
            ))
        })?;
        let source = doc.document();
        let mut page = source
            .get_dictionary(page_id)
            .map_err(|e| fail(format!("page object {page_id:?}: {e}")))?
            .clone();
        inherit_attributes(source, &mut page);
        page.remove(b"Parent");

        let mut single = Document::with_version(source.version.clone());
        single.max_id = source.max_id;
        copy_reachable(source, &page, page_id, &mut single);

        let mut present: BTreeSet<ObjectId> = single.objects.keys().copied().collect();
        present.insert(page_id);
        single
            .objects
            .values_mut()
            .for_each(|o| null_dangling(o, &present));
        page.iter_mut()
            .for_each(|(_, o)| null_dangling(o, &present));

        let pages_id = single.new_object_id();
        page.set("Parent", Object::Reference(pages_id));
        single.objects.insert(page_id, Object::Dictionary(page));
        single.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(vec![Object::Reference(page_id)])),
                ("Count", Object::Integer(1)),
            ])),
        );
        let catalog_id = single.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        single.trailer.set("Root", Object::Reference(catalog_id));
        single.renumber_objects();
        single.compress();

        let remaining = single.get_pages().len();
        if remaining != 1 {
            return Err(fail(format!(
                "expected 1 page after extraction, found {remaining}"
            )));
        }

        let mut buffer = Vec::new();
        single
            .save_to(&mut buffer)
            .map_err(|e| fail(format!("save failed: {e}")))?;

        debug!(
            "Extracted page {} → {} objects, {} bytes",
            page_num,
            single.objects.len(),
            buffer.len()
        );
        Ok(buffer)
    }
}

/// Copy inheritable attributes the page does not set itself from the
/// nearest ancestor that does.
fn inherit_attributes(source: &Document, page: &mut Dictionary) {
    let mut seen = BTreeSet::new();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    while let Some(id) = parent {
        if !seen.insert(id) {
            break;
        }
        let Ok(node) = source.get_dictionary(id) else {
            break;
        };
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key, value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
}

/// Copy everything `root` references, transitively, into `target` under the
/// original object ids. Page and page-tree objects are skipped.
fn copy_reachable(source: &Document, root: &Dictionary, page_id: ObjectId, target: &mut Document) {
    let mut pending = Vec::new();
    root.iter().for_each(|(_, o)| collect_refs(o, &mut pending));

    let mut seen = BTreeSet::from([page_id]);
    while let Some(id) = pending.pop() {
        if !seen.insert(id) {
            continue;
        }
        let Ok(object) = source.get_object(id) else {
            continue;
        };
        if is_page_node(object) {
            continue;
        }
        collect_refs(object, &mut pending);
        target.objects.insert(id, object.clone());
    }
}

fn collect_refs(object: &Object, out: &mut Vec<ObjectId>) {
    match object {
        Object::Reference(id) => out.push(*id),
        Object::Array(items) => items.iter().for_each(|o| collect_refs(o, out)),
        Object::Dictionary(dict) => dict.iter().for_each(|(_, o)| collect_refs(o, out)),
        Object::Stream(stream) => stream.dict.iter().for_each(|(_, o)| collect_refs(o, out)),
        _ => {}
    }
}

fn is_page_node(object: &Object) -> bool {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return false,
    };
    dict.type_is(b"Page") || dict.type_is(b"Pages")
}

/// Replace references to objects that were not copied with `null`.
fn null_dangling(object: &mut Object, present: &BTreeSet<ObjectId>) {
    if matches!(object, Object::Reference(id) if !present.contains(id)) {
        *object = Object::Null;
        return;
    }
    match object {
        Object::Array(items) => items.iter_mut().for_each(|o| null_dangling(o, present)),
        Object::Dictionary(dict) => dict.iter_mut().for_each(|(_, o)| null_dangling(o, present)),
        Object::Stream(stream) => stream
            .dict
            .iter_mut()
            .for_each(|(_, o)| null_dangling(o, present)),
        _ => {}
    }
}
