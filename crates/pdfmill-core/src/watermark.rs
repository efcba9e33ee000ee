//! Text watermark stamping.
//!
//! Appends a content stream to every page that draws the watermark text
//! diagonally across the page center, and registers the font and graphics
//! state it needs in each page's resource dictionary.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::PdfOpError;

const FONT_SIZE: f32 = 50.0;
const OPACITY: f32 = 0.3;
/// Resource names for the stamp's font and ExtGState entries.
const FONT_RES: &str = "Fwm";
const GS_RES: &str = "Gwm";

/// Stamp `text` across every page of the document.
pub fn watermark_document(bytes: &[u8], text: &str) -> Result<Vec<u8>, PdfOpError> {
    let mut doc =
        Document::load_mem(bytes).map_err(|e| PdfOpError::ParseError(e.to_string()))?;

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let gs_id = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => OPACITY,
        "CA" => OPACITY,
    });

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for page_id in page_ids {
        let (width, height) = page_size(&doc, page_id);
        let stamp = stamp_stream(text, width, height);
        let stream_id = doc.add_object(Stream::new(Dictionary::new(), stamp));

        append_page_content(&mut doc, page_id, stream_id)?;
        register_stamp_resources(&mut doc, page_id, font_id, gs_id)?;
    }

    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfOpError::OperationError(format!("Failed to save watermarked PDF: {e}")))?;
    Ok(buffer)
}

/// Content stream drawing the watermark at 45 degrees around the page center.
fn stamp_stream(text: &str, width: f32, height: f32) -> Vec<u8> {
    let x = width / 2.0 - 50.0;
    let y = height / 2.0;
    // Tm carries both the rotation (cos/sin 45) and the anchor translation.
    format!(
        "q\n/{GS_RES} gs\nBT\n/{FONT_RES} {FONT_SIZE} Tf\n0.7071 0.7071 -0.7071 0.7071 {x} {y} Tm\n({}) Tj\nET\nQ",
        escape_pdf_text(text),
    )
    .into_bytes()
}

fn escape_pdf_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '(' | ')' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Width and height of a page from its own MediaBox, falling back to US
/// Letter when the entry is absent or inherited.
fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let media_box = doc
        .get_object(page_id)
        .ok()
        .and_then(|object| object.as_dict().ok())
        .and_then(|page| page.get(b"MediaBox").ok())
        .and_then(|entry| entry.as_array().ok())
        .map(|array| array.iter().filter_map(number).collect::<Vec<f32>>());

    match media_box.as_deref() {
        Some(&[x0, y0, x1, y1]) => (x1 - x0, y1 - y0),
        _ => (612.0, 792.0),
    }
}

fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value),
        _ => None,
    }
}

/// Append a stream reference to the page's Contents, whatever shape the
/// existing entry has.
fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    stream_id: ObjectId,
) -> Result<(), PdfOpError> {
    let existing = doc
        .get_object(page_id)
        .ok()
        .and_then(|object| object.as_dict().ok())
        .and_then(|page| page.get(b"Contents").ok())
        .cloned();

    let contents = match existing {
        Some(Object::Array(mut streams)) => {
            streams.push(Object::Reference(stream_id));
            Object::Array(streams)
        }
        Some(Object::Reference(existing_id)) => Object::Array(vec![
            Object::Reference(existing_id),
            Object::Reference(stream_id),
        ]),
        // An inline stream has to move into its own object before it can
        // sit in a Contents array.
        Some(Object::Stream(stream)) => {
            let moved = doc.add_object(Object::Stream(stream));
            Object::Array(vec![Object::Reference(moved), Object::Reference(stream_id)])
        }
        _ => Object::Reference(stream_id),
    };

    match doc.get_object_mut(page_id) {
        Ok(Object::Dictionary(page)) => {
            page.set("Contents", contents);
            Ok(())
        }
        _ => Err(PdfOpError::OperationError(
            "Page object is not a dictionary".into(),
        )),
    }
}

/// Install the stamp's font and ExtGState into the page's resources.
///
/// The page's effective resources (own entry, referenced, or inherited) are
/// materialized as a direct dictionary on the page so the additions never
/// leak into other pages sharing the original dictionary.
fn register_stamp_resources(
    doc: &mut Document,
    page_id: ObjectId,
    font_id: ObjectId,
    gs_id: ObjectId,
) -> Result<(), PdfOpError> {
    let mut resources = effective_resources(doc, page_id);

    let mut fonts = match resources.get(b"Font") {
        Ok(entry) => resolve_dict(doc, entry),
        Err(_) => Dictionary::new(),
    };
    fonts.set(FONT_RES, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));

    let mut states = match resources.get(b"ExtGState") {
        Ok(entry) => resolve_dict(doc, entry),
        Err(_) => Dictionary::new(),
    };
    states.set(GS_RES, Object::Reference(gs_id));
    resources.set("ExtGState", Object::Dictionary(states));

    match doc.get_object_mut(page_id) {
        Ok(Object::Dictionary(page)) => {
            page.set("Resources", Object::Dictionary(resources));
            Ok(())
        }
        _ => Err(PdfOpError::OperationError(
            "Page object is not a dictionary".into(),
        )),
    }
}

/// The page's effective resource dictionary: its own entry if present,
/// otherwise the first one found walking the /Parent chain.
fn effective_resources(doc: &Document, page_id: ObjectId) -> Dictionary {
    let mut current_id = page_id;
    loop {
        let Some(dict) = doc
            .get_object(current_id)
            .ok()
            .and_then(|object| object.as_dict().ok())
        else {
            return Dictionary::new();
        };

        if let Ok(entry) = dict.get(b"Resources") {
            return resolve_dict(doc, entry);
        }
        match dict.get(b"Parent").and_then(Object::as_reference) {
            Ok(parent_id) => current_id = parent_id,
            Err(_) => return Dictionary::new(),
        }
    }
}

fn resolve_dict(doc: &Document, entry: &Object) -> Dictionary {
    match entry {
        Object::Dictionary(dict) => dict.clone(),
        Object::Reference(id) => doc
            .get_object(*id)
            .ok()
            .and_then(|object| object.as_dict().ok())
            .cloned()
            .unwrap_or_default(),
        _ => Dictionary::new(),
    }
}

#[cfg(test)]
mod tests {
    use lopdf::{Document, Object};

    use super::*;
    use crate::fixtures::sample_pdf;

    #[test]
    fn watermark_preserves_page_count() {
        let pdf = sample_pdf(3);
        let stamped = watermark_document(&pdf, "CONFIDENTIAL").unwrap();
        let doc = Document::load_mem(&stamped).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn watermark_appends_a_second_content_stream() {
        let pdf = sample_pdf(1);
        let stamped = watermark_document(&pdf, "DRAFT").unwrap();
        let doc = Document::load_mem(&stamped).unwrap();

        for page_id in doc.get_pages().values() {
            let page = doc.get_object(*page_id).unwrap().as_dict().unwrap();
            match page.get(b"Contents").unwrap() {
                Object::Array(streams) => assert_eq!(streams.len(), 2),
                other => panic!("expected a Contents array, got {other:?}"),
            }
        }
    }

    #[test]
    fn watermark_registers_font_and_extgstate() {
        let pdf = sample_pdf(2);
        let stamped = watermark_document(&pdf, "DRAFT").unwrap();
        let doc = Document::load_mem(&stamped).unwrap();

        for page_id in doc.get_pages().values() {
            let page = doc.get_object(*page_id).unwrap().as_dict().unwrap();
            let resources = page.get(b"Resources").unwrap().as_dict().unwrap();

            let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
            assert!(fonts.get(FONT_RES.as_bytes()).is_ok());
            // The fixture's own font survives the merge.
            assert!(fonts.get(b"F1").is_ok());

            let states = resources.get(b"ExtGState").unwrap().as_dict().unwrap();
            assert!(states.get(GS_RES.as_bytes()).is_ok());
        }
    }

    #[test]
    fn watermark_escapes_parentheses() {
        let stream = stamp_stream("a(b)c\\d", 612.0, 792.0);
        let text = String::from_utf8(stream).unwrap();
        assert!(text.contains("(a\\(b\\)c\\\\d) Tj"));
    }

    #[test]
    fn watermark_rejects_garbage() {
        assert!(watermark_document(b"not a pdf", "X").is_err());
    }
}
