//! Image to PDF conversion.
//!
//! Builds a new document with one page per uploaded image, each page sized
//! to the image itself. JPEG data is embedded as-is under `DCTDecode`; PNGs
//! are decoded to RGB and embedded under `FlateDecode`.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::{ColorType, DynamicImage, ImageFormat};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

use crate::error::PdfOpError;

/// Most images embedded in a single conversion call.
pub const MAX_IMAGES: usize = 20;

/// Convert the given `(filename, bytes)` uploads into a single PDF.
///
/// Files beyond [`MAX_IMAGES`] are ignored, and a file that fails to decode
/// or has an unsupported format is skipped rather than failing the batch.
/// Returns the document bytes and the number of images embedded; errors only
/// when nothing could be embedded at all.
pub fn images_to_document(images: &[(String, Vec<u8>)]) -> Result<(Vec<u8>, usize), PdfOpError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for (_name, data) in images.iter().take(MAX_IMAGES) {
        if let Ok(page_id) = add_image_page(&mut doc, pages_id, data) {
            kids.push(Object::Reference(page_id));
        }
    }

    if kids.is_empty() {
        return Err(PdfOpError::OperationError(
            "No supported images could be embedded".into(),
        ));
    }
    let embedded = kids.len();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Count" => embedded as i64,
            "Kids" => kids,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.compress();

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| PdfOpError::OperationError(format!("Failed to save image PDF: {e}")))?;
    Ok((buffer, embedded))
}

/// Add one page holding the image at its native pixel size (1px = 1pt).
fn add_image_page(
    doc: &mut Document,
    pages_id: ObjectId,
    data: &[u8],
) -> Result<ObjectId, PdfOpError> {
    let format =
        image::guess_format(data).map_err(|e| PdfOpError::UnsupportedImage(e.to_string()))?;
    let decoded =
        image::load_from_memory(data).map_err(|e| PdfOpError::UnsupportedImage(e.to_string()))?;
    let (width, height) = (decoded.width(), decoded.height());

    let xobject = match format {
        ImageFormat::Jpeg => jpeg_xobject(&decoded, data),
        ImageFormat::Png => png_xobject(&decoded)?,
        other => return Err(PdfOpError::UnsupportedImage(format!("{other:?}"))),
    };
    let image_id = doc.add_object(Object::Stream(xobject));

    let content = format!("q {width} 0 0 {height} 0 0 cm /Im0 Do Q");
    let content_id = doc.add_object(Object::Stream(Stream::new(
        Dictionary::new(),
        content.into_bytes(),
    )));

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            0.into(),
            0.into(),
            (width as i64).into(),
            (height as i64).into(),
        ],
        "Contents" => content_id,
        "Resources" => Object::Dictionary(dictionary! {
            "XObject" => Object::Dictionary(dictionary! {
                "Im0" => image_id,
            }),
        }),
    });
    Ok(page_id)
}

/// JPEG bytes go into the stream untouched; the viewer's DCT decoder does
/// the work.
fn jpeg_xobject(decoded: &DynamicImage, raw: &[u8]) -> Stream {
    let color_space = match decoded.color() {
        ColorType::L8 | ColorType::L16 | ColorType::La8 | ColorType::La16 => "DeviceGray",
        _ => "DeviceRGB",
    };
    Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => decoded.width() as i64,
            "Height" => decoded.height() as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8i64,
            "Filter" => "DCTDecode",
        },
        raw.to_vec(),
    )
}

/// PNG is re-encoded as flate-compressed raw RGB; transparency flattens.
fn png_xobject(decoded: &DynamicImage) -> Result<Stream, PdfOpError> {
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(rgb.as_raw())
        .map_err(|e| PdfOpError::OperationError(format!("Failed to compress pixel data: {e}")))?;
    let compressed = encoder
        .finish()
        .map_err(|e| PdfOpError::OperationError(format!("Failed to compress pixel data: {e}")))?;

    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8i64,
            "Filter" => "FlateDecode",
        },
        compressed,
    ))
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, RgbImage};
    use lopdf::Document;

    use super::*;

    fn sample_image(format: ImageFormat) -> Vec<u8> {
        let mut pixels = RgbImage::new(4, 3);
        for (x, _y, pixel) in pixels.enumerate_pixels_mut() {
            *pixel = image::Rgb([(x * 60) as u8, 80, 120]);
        }
        let mut buffer = Vec::new();
        DynamicImage::ImageRgb8(pixels)
            .write_to(&mut Cursor::new(&mut buffer), format)
            .unwrap();
        buffer
    }

    #[test]
    fn png_becomes_one_page() {
        let (pdf, embedded) =
            images_to_document(&[("a.png".into(), sample_image(ImageFormat::Png))]).unwrap();
        assert_eq!(embedded, 1);
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn jpeg_becomes_one_page() {
        let (pdf, embedded) =
            images_to_document(&[("a.jpg".into(), sample_image(ImageFormat::Jpeg))]).unwrap();
        assert_eq!(embedded, 1);
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn mixed_batch_keeps_page_order() {
        let inputs = vec![
            ("a.png".to_string(), sample_image(ImageFormat::Png)),
            ("b.jpg".to_string(), sample_image(ImageFormat::Jpeg)),
            ("c.png".to_string(), sample_image(ImageFormat::Png)),
        ];
        let (pdf, embedded) = images_to_document(&inputs).unwrap();
        assert_eq!(embedded, 3);
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn broken_file_is_skipped() {
        let inputs = vec![
            ("bad.png".to_string(), b"not an image".to_vec()),
            ("good.png".to_string(), sample_image(ImageFormat::Png)),
        ];
        let (pdf, embedded) = images_to_document(&inputs).unwrap();
        assert_eq!(embedded, 1);
        let doc = Document::load_mem(&pdf).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
    }

    #[test]
    fn all_broken_fails() {
        let inputs = vec![("bad".to_string(), b"nope".to_vec())];
        assert!(images_to_document(&inputs).is_err());
    }

    #[test]
    fn page_matches_image_dimensions() {
        let (pdf, _) =
            images_to_document(&[("a.png".into(), sample_image(ImageFormat::Png))]).unwrap();
        let doc = Document::load_mem(&pdf).unwrap();
        let page_id = *doc.get_pages().values().next().unwrap();
        let page = doc.get_object(page_id).unwrap().as_dict().unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_i64().unwrap(), 4);
        assert_eq!(media_box[3].as_i64().unwrap(), 3);
    }
}
