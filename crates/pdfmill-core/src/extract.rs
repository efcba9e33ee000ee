//! Page extraction and per-page splitting.

use std::collections::BTreeSet;

use lopdf::Document;

use crate::error::PdfOpError;

/// Build a new document containing only the pages at the given zero-based
/// indices, in ascending order.
///
/// The whitelist is applied by deleting the complement: clone the source,
/// drop every page not selected (in reverse so page numbers stay stable),
/// then prune the objects that became unreachable.
pub fn extract_pages(bytes: &[u8], indices: &[u32]) -> Result<Vec<u8>, PdfOpError> {
    if indices.is_empty() {
        return Err(PdfOpError::NoValidPages);
    }

    let mut doc =
        Document::load_mem(bytes).map_err(|e| PdfOpError::ParseError(e.to_string()))?;
    let total = doc.get_pages().len() as u32;

    for &index in indices {
        if index >= total {
            return Err(PdfOpError::OperationError(format!(
                "Page index {index} out of range (document has {total} pages)"
            )));
        }
    }

    // lopdf page numbers are 1-based.
    let keep: BTreeSet<u32> = indices.iter().map(|index| index + 1).collect();
    let discard: Vec<u32> = (1..=total).rev().filter(|n| !keep.contains(n)).collect();
    for page_number in discard {
        doc.delete_pages(&[page_number]);
    }

    doc.prune_objects();
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfOpError::OperationError(format!("Save failed: {e}")))?;
    Ok(buffer)
}

/// Split a document into one single-page document per page, in order.
pub fn split_into_pages(bytes: &[u8]) -> Result<Vec<Vec<u8>>, PdfOpError> {
    let total = crate::page_count(bytes)?;
    (0..total).map(|index| extract_pages(bytes, &[index])).collect()
}
