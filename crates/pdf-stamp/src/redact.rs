//! Content redaction
//!
//! Removes text-show operations from a page's content stream rather than
//! painting over them: downstream text extraction must not see the removed
//! content. The page's content (stream, reference, or array) is decoded,
//! filtered, re-encoded, and written back as a single stream object.

use crate::scan::scan_document;
use crate::{Rect, Result, StampError};
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, Stream};
use std::collections::HashSet;

/// Remove show operations on `page` whose spans intersect `rect`.
///
/// Returns the number of operations removed. Removal is whole-operation:
/// a show op either stays or goes (placeholders are authored as their own
/// runs, so partial-op splitting is not needed here).
pub(crate) fn redact_page(doc: &mut Document, page: u32, rect: &Rect) -> Result<usize> {
    let doomed: HashSet<usize> = scan_document(doc)?
        .into_iter()
        .filter(|span| span.page == page && span.rect.intersects(rect))
        .map(|span| span.op_index)
        .collect();

    if doomed.is_empty() {
        return Ok(0);
    }

    let pages = doc.get_pages();
    let page_id = *pages
        .get(&page)
        .ok_or(StampError::InvalidPage(page, pages.len()))?;

    let content_bytes = doc.get_page_content(page_id)?;
    let content = Content::decode(&content_bytes)?;

    let kept: Vec<_> = content
        .operations
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !doomed.contains(i))
        .map(|(_, op)| op)
        .collect();

    let new_bytes = Content { operations: kept }
        .encode()
        .map_err(|e| StampError::Parse(e.to_string()))?;

    set_page_content(doc, page_id, new_bytes)?;

    Ok(doomed.len())
}

/// Replace a page's content with a single new stream object
fn set_page_content(doc: &mut Document, page_id: lopdf::ObjectId, content: Vec<u8>) -> Result<()> {
    let new_stream = Stream::new(Dictionary::new(), content);
    let stream_id = doc.add_object(new_stream);

    let page_obj = doc.get_object(page_id)?;
    let page_dict = page_obj
        .as_dict()
        .map_err(|_| StampError::Parse("Page object is not a dictionary".to_string()))?;

    let mut new_page_dict = page_dict.clone();
    new_page_dict.set(b"Contents", Object::Reference(stream_id));
    doc.objects.insert(page_id, new_page_dict.into());

    Ok(())
}
