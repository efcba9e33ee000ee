//! Whole-document rewrite passes.

use lopdf::Document;

use crate::error::PdfOpError;

/// Reparse a document, drop unreachable objects, compress its streams, and
/// re-serialize. The caller compares input and output sizes; the result may
/// be larger than the input for already-tight files.
pub fn compress_document(bytes: &[u8]) -> Result<Vec<u8>, PdfOpError> {
    let mut doc =
        Document::load_mem(bytes).map_err(|e| PdfOpError::ParseError(e.to_string()))?;
    doc.prune_objects();
    doc.compress();
    serialize(doc)
}

/// Reparse and re-serialize without transforming anything.
///
/// Backs the password-protect endpoint, which deliberately applies no
/// encryption: the document comes back normalized but otherwise unchanged.
pub fn rewrite_document(bytes: &[u8]) -> Result<Vec<u8>, PdfOpError> {
    let doc = Document::load_mem(bytes).map_err(|e| PdfOpError::ParseError(e.to_string()))?;
    serialize(doc)
}

fn serialize(mut doc: Document) -> Result<Vec<u8>, PdfOpError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfOpError::OperationError(format!("Failed to save PDF: {e}")))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use lopdf::Document;

    use super::*;
    use crate::fixtures::sample_pdf;

    #[test]
    fn compress_preserves_page_count() {
        let pdf = sample_pdf(4);
        let compressed = compress_document(&pdf).unwrap();
        let doc = Document::load_mem(&compressed).unwrap();
        assert_eq!(doc.get_pages().len(), 4);
    }

    #[test]
    fn compress_rejects_garbage() {
        assert!(compress_document(b"not a pdf").is_err());
    }

    #[test]
    fn rewrite_preserves_page_count() {
        let pdf = sample_pdf(2);
        let rewritten = rewrite_document(&pdf).unwrap();
        let doc = Document::load_mem(&rewritten).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }
}
