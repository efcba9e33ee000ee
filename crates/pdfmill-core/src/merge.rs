//! Document merge.
//!
//! Combines several PDFs into one by importing every object from each source
//! into the first document with remapped object ids, then rebuilding the
//! destination page tree with the combined page list.

use std::collections::BTreeMap;

use lopdf::{Document, Object, ObjectId};

use crate::error::PdfOpError;

/// Merge the given PDFs into a single document, preserving input order.
pub fn merge_documents(mut documents: Vec<Vec<u8>>) -> Result<Vec<u8>, PdfOpError> {
    match documents.len() {
        0 => return Err(PdfOpError::OperationError("No documents to merge".into())),
        // A single document passes through untouched.
        1 => return Ok(documents.swap_remove(0)),
        _ => {}
    }

    let mut sources = Vec::with_capacity(documents.len());
    for (index, bytes) in documents.iter().enumerate() {
        let doc = Document::load_mem(bytes)
            .map_err(|e| PdfOpError::ParseError(format!("Failed to load document {index}: {e}")))?;
        sources.push(doc);
    }

    let mut merged = sources.remove(0);
    let mut page_refs = page_references(&merged);
    let mut next_free_id = merged.max_id;

    for source in sources {
        let offset = next_free_id;
        let source_pages = page_references(&source);
        next_free_id = source.max_id + offset;

        // Import every object under a shifted id so nothing collides with
        // what the destination already holds.
        let mut shifted: BTreeMap<ObjectId, Object> = BTreeMap::new();
        for ((id, generation), object) in source.objects {
            shifted.insert((id + offset, generation), shift_references(object, offset));
        }
        merged.objects.extend(shifted);

        page_refs.extend(
            source_pages
                .into_iter()
                .map(|(id, generation)| (id + offset, generation)),
        );
    }

    merged.max_id = next_free_id;
    rebuild_page_tree(&mut merged, page_refs)?;
    merged.compress();

    let mut buffer = Vec::new();
    merged
        .save_to(&mut buffer)
        .map_err(|e| PdfOpError::OperationError(format!("Failed to save merged PDF: {e}")))?;
    Ok(buffer)
}

/// Page object ids of a document, in page order.
fn page_references(doc: &Document) -> Vec<ObjectId> {
    doc.get_pages().into_values().collect()
}

/// Recursively shift every object reference by the given id offset.
fn shift_references(object: Object, offset: u32) -> Object {
    match object {
        Object::Reference((id, generation)) => Object::Reference((id + offset, generation)),
        Object::Array(items) => Object::Array(
            items
                .into_iter()
                .map(|item| shift_references(item, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                let shifted = shift_references(value.clone(), offset);
                *value = shifted;
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                let shifted = shift_references(value.clone(), offset);
                *value = shifted;
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Point the document's page tree root at the given page list.
fn rebuild_page_tree(doc: &mut Document, page_refs: Vec<ObjectId>) -> Result<(), PdfOpError> {
    let pages_id = {
        let catalog_id = doc
            .trailer
            .get(b"Root")
            .and_then(Object::as_reference)
            .map_err(|_| PdfOpError::OperationError("Missing document catalog".into()))?;
        doc.get_object(catalog_id)
            .and_then(Object::as_dict)
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(Object::as_reference)
            .map_err(|_| PdfOpError::OperationError("Catalog has no page tree".into()))?
    };

    // Imported pages still carry their old parent pointers.
    for &page_id in &page_refs {
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Parent", Object::Reference(pages_id));
        }
    }

    let count = page_refs.len();
    let kids: Vec<Object> = page_refs.into_iter().map(Object::Reference).collect();

    match doc.get_object_mut(pages_id) {
        Ok(Object::Dictionary(pages)) => {
            pages.set("Kids", Object::Array(kids));
            pages.set("Count", Object::Integer(count as i64));
            Ok(())
        }
        _ => Err(PdfOpError::OperationError(
            "Page tree root is not a dictionary".into(),
        )),
    }
}
