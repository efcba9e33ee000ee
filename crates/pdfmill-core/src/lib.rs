//! PDF toolbox operations
//!
//! This crate holds the document transformations behind the pdfmill server:
//! merging, page extraction and splitting, rotation, text watermarking,
//! compression passes, and image-to-PDF conversion, all over in-memory
//! buffers using lopdf. Page selection expressions (`"1,3,5-7"`) are parsed
//! by the [`pages`] module.

pub mod compress;
pub mod error;
pub mod extract;
pub mod images;
pub mod merge;
pub mod pages;
pub mod rotate;
pub mod watermark;

pub use compress::{compress_document, rewrite_document};
pub use error::PdfOpError;
pub use extract::{extract_pages, split_into_pages};
pub use images::{images_to_document, MAX_IMAGES};
pub use merge::merge_documents;
pub use pages::select_pages;
pub use rotate::rotate_document;
pub use watermark::watermark_document;

/// Parse PDF bytes and return the page count.
pub fn page_count(bytes: &[u8]) -> Result<u32, PdfOpError> {
    let doc = lopdf::Document::load_mem(bytes)
        .map_err(|e| PdfOpError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}


#[cfg(test)]
mod tests {
    use super::*;
    use fixtures::sample_pdf;

    #[test]
    fn page_count_matches_fixture() {
        assert_eq!(page_count(&sample_pdf(7)).unwrap(), 7);
    }

    #[test]
    fn page_count_rejects_garbage() {
        assert!(page_count(b"not a pdf").is_err());
    }
}
