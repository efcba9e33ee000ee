//! Page rotation.

use lopdf::{Document, Object, ObjectId};

use crate::error::PdfOpError;

/// Add `degrees` to the `/Rotate` entry of every page.
///
/// The angle must be a multiple of 90 (negative is fine); the stored value
/// is normalized into `[0, 360)`. Pages without an existing `/Rotate` count
/// as 0.
pub fn rotate_document(bytes: &[u8], degrees: i32) -> Result<Vec<u8>, PdfOpError> {
    if degrees % 90 != 0 {
        return Err(PdfOpError::InvalidRotation(degrees));
    }

    let mut doc =
        Document::load_mem(bytes).map_err(|e| PdfOpError::ParseError(e.to_string()))?;

    let page_ids: Vec<ObjectId> = doc.get_pages().into_values().collect();
    for page_id in page_ids {
        let current = doc
            .get_object(page_id)
            .ok()
            .and_then(|object| object.as_dict().ok())
            .and_then(|page| page.get(b"Rotate").ok())
            .and_then(|rotate| rotate.as_i64().ok())
            .unwrap_or(0) as i32;

        let rotation = (current + degrees).rem_euclid(360);
        if let Ok(Object::Dictionary(page)) = doc.get_object_mut(page_id) {
            page.set("Rotate", Object::Integer(rotation as i64));
        }
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfOpError::OperationError(format!("Failed to save rotated PDF: {e}")))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use lopdf::Document;

    use super::*;
    use crate::fixtures::sample_pdf;

    fn rotations(bytes: &[u8]) -> Vec<i64> {
        let doc = Document::load_mem(bytes).unwrap();
        doc.get_pages()
            .values()
            .map(|page_id| {
                doc.get_object(*page_id)
                    .unwrap()
                    .as_dict()
                    .unwrap()
                    .get(b"Rotate")
                    .and_then(|r| r.as_i64())
                    .unwrap_or(0)
            })
            .collect()
    }

    #[test]
    fn rotate_sets_every_page() {
        let pdf = sample_pdf(3);
        let rotated = rotate_document(&pdf, 90).unwrap();
        assert_eq!(rotations(&rotated), vec![90, 90, 90]);
    }

    #[test]
    fn rotate_accumulates_across_passes() {
        let pdf = sample_pdf(2);
        let once = rotate_document(&pdf, 180).unwrap();
        let twice = rotate_document(&once, 270).unwrap();
        assert_eq!(rotations(&twice), vec![90, 90]);
    }

    #[test]
    fn negative_angle_normalizes() {
        let pdf = sample_pdf(1);
        let rotated = rotate_document(&pdf, -90).unwrap();
        assert_eq!(rotations(&rotated), vec![270]);
    }

    #[test]
    fn large_multiple_wraps() {
        let pdf = sample_pdf(1);
        let rotated = rotate_document(&pdf, 450).unwrap();
        assert_eq!(rotations(&rotated), vec![90]);
    }

    #[test]
    fn non_right_angle_rejected() {
        let pdf = sample_pdf(1);
        assert!(matches!(
            rotate_document(&pdf, 45),
            Err(PdfOpError::InvalidRotation(45))
        ));
    }
}
