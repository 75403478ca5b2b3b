//! Page splitting: one multi-page PDF in, N single-page PDFs out.
//!
//! Splitting happens entirely in memory at the PDF object level: the
//! source document is parsed once, then for each page a copy is reduced to
//! that single page and re-serialised. Page content streams are untouched,
//! so every output page renders identically to its position in the source.

use crate::error::IntakeError;
use lopdf::Document;
use tracing::debug;

/// Split a raw document byte stream into ordered single-page documents.
///
/// Output length equals the source page count, in source order. Fails with
/// [`IntakeError::MalformedDocument`] when the bytes cannot be parsed as a
/// PDF or the document has no pages.
pub fn split_pages(bytes: &[u8]) -> Result<Vec<Vec<u8>>, IntakeError> {
    let doc = Document::load_mem(bytes).map_err(|e| IntakeError::MalformedDocument {
        detail: e.to_string(),
    })?;

    let page_count = doc.get_pages().len() as u32;
    if page_count == 0 {
        return Err(IntakeError::MalformedDocument {
            detail: "document has no pages".into(),
        });
    }
    debug!("splitting document into {page_count} pages");

    let mut pages = Vec::with_capacity(page_count as usize);
    for page_num in 1..=page_count {
        let mut single = doc.clone();
        let others: Vec<u32> = (1..=page_count).filter(|n| *n != page_num).collect();
        if !others.is_empty() {
            single.delete_pages(&others);
        }
        single.prune_objects();

        let mut buf = Vec::new();
        single
            .save_to(&mut buf)
            .map_err(|e| IntakeError::MalformedDocument {
                detail: format!("failed to serialise page {page_num}: {e}"),
            })?;
        pages.push(buf);
    }

    Ok(pages)
}
