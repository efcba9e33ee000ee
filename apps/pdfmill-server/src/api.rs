//! API handlers for the pdfmill server
//!
//! One handler per transformation, each the same short sequence: collect the
//! multipart upload, run the corresponding pdfmill-core operation, persist
//! the result, answer with the filename. Plus download and health.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

/// Most files accepted by a single merge request.
const MAX_MERGE_FILES: usize = 20;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// Handler: GET /api/health
pub async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "pdfmill-server",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// One uploaded file from a multipart form.
struct UploadedFile {
    name: String,
    data: Vec<u8>,
}

/// Everything a handler needs from a multipart body: the uploaded files and
/// the plain text fields.
struct UploadForm {
    files: Vec<UploadedFile>,
    fields: HashMap<String, String>,
}

impl UploadForm {
    fn single_file(self) -> Result<UploadedFile, ApiError> {
        self.files
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::InvalidRequest("PDF file required".into()))
    }

    /// A non-empty text field, if the form carried one.
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(String::as_str)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

async fn collect_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut files = Vec::new();
    let mut fields = HashMap::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::InvalidRequest(format!("Failed to read multipart field: {e}"))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "file" | "files" | "files[]" => {
                let name = field.file_name().unwrap_or("upload").to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::InvalidRequest(format!("Failed to read uploaded file: {e}"))
                })?;
                files.push(UploadedFile {
                    name,
                    data: data.to_vec(),
                });
            }
            _ => {
                let value = field.text().await.map_err(|e| {
                    ApiError::InvalidRequest(format!("Failed to read form field: {e}"))
                })?;
                fields.insert(field_name, value);
            }
        }
    }

    Ok(UploadForm { files, fields })
}

/// Response for operations producing a single output file.
#[derive(Serialize)]
pub struct FileResponse {
    pub success: bool,
    pub file: String,
    pub message: String,
}

/// Handler: POST /api/merge
pub async fn handle_merge(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<FileResponse>, ApiError> {
    let form = collect_form(multipart).await?;
    if form.files.len() < 2 {
        return Err(ApiError::InvalidRequest(
            "At least 2 PDF files required".into(),
        ));
    }
    if form.files.len() > MAX_MERGE_FILES {
        return Err(ApiError::InvalidRequest(format!(
            "At most {MAX_MERGE_FILES} files can be merged at once"
        )));
    }

    let count = form.files.len();
    let documents: Vec<Vec<u8>> = form.files.into_iter().map(|file| file.data).collect();
    let merged = pdfmill_core::merge_documents(documents)?;
    let file = state.storage.store("merged", &merged).await?;

    info!(files = count, output = %file, "merged upload batch");
    Ok(Json(FileResponse {
        success: true,
        file,
        message: format!("Successfully merged {count} PDF files"),
    }))
}

/// Response for split, which produces one file per page.
#[derive(Serialize)]
pub struct SplitResponse {
    pub success: bool,
    pub files: Vec<String>,
    pub message: String,
}

/// Handler: POST /api/split
pub async fn handle_split(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<SplitResponse>, ApiError> {
    let upload = collect_form(multipart).await?.single_file()?;

    let pages = pdfmill_core::split_into_pages(&upload.data)?;
    let mut files = Vec::with_capacity(pages.len());
    for (index, page) in pages.iter().enumerate() {
        let file = state
            .storage
            .store(&format!("split-page-{}", index + 1), page)
            .await?;
        files.push(file);
    }

    info!(input = %upload.name, pages = files.len(), "split document");
    let message = format!("Successfully split PDF into {} files", files.len());
    Ok(Json(SplitResponse {
        success: true,
        files,
        message,
    }))
}

/// Response for compress, reporting the size change.
#[derive(Serialize)]
pub struct CompressResponse {
    pub success: bool,
    pub file: String,
    pub original_size: usize,
    pub compressed_size: usize,
    pub compression_ratio: f64,
    pub message: String,
}

/// Handler: POST /api/compress
pub async fn handle_compress(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CompressResponse>, ApiError> {
    let upload = collect_form(multipart).await?.single_file()?;

    let original_size = upload.data.len();
    let compressed = pdfmill_core::compress_document(&upload.data)?;
    let compressed_size = compressed.len();
    let file = state.storage.store("compressed", &compressed).await?;

    // Percentage saved, floored at zero when the rewrite grew the file.
    let ratio = (1.0 - compressed_size as f64 / original_size as f64) * 100.0;
    let compression_ratio = (ratio.max(0.0) * 100.0).round() / 100.0;

    info!(
        input = %upload.name,
        original_size,
        compressed_size,
        "compressed document"
    );
    Ok(Json(CompressResponse {
        success: true,
        file,
        original_size,
        compressed_size,
        compression_ratio,
        message: "PDF compressed successfully".to_string(),
    }))
}

/// Handler: POST /api/rotate
pub async fn handle_rotate(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<FileResponse>, ApiError> {
    let form = collect_form(multipart).await?;
    let angle = form
        .field("angle")
        .and_then(|value| value.parse::<i32>().ok())
        .unwrap_or(90);
    let upload = form.single_file()?;

    let rotated = pdfmill_core::rotate_document(&upload.data, angle)?;
    let file = state.storage.store("rotated", &rotated).await?;

    info!(input = %upload.name, angle, "rotated document");
    Ok(Json(FileResponse {
        success: true,
        file,
        message: format!("PDF rotated {angle} degrees"),
    }))
}

/// Handler: POST /api/extract
pub async fn handle_extract(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<FileResponse>, ApiError> {
    let form = collect_form(multipart).await?;
    let expr = form.field("pages").unwrap_or("1").to_string();
    let upload = form.single_file()?;

    let total = pdfmill_core::page_count(&upload.data)?;
    let indices = pdfmill_core::select_pages(&expr, total)?;
    let extracted = pdfmill_core::extract_pages(&upload.data, &indices)?;
    let file = state.storage.store("extracted", &extracted).await?;

    info!(input = %upload.name, pages = %expr, selected = indices.len(), "extracted pages");
    Ok(Json(FileResponse {
        success: true,
        file,
        message: format!("Extracted {} page(s)", indices.len()),
    }))
}

/// Handler: POST /api/watermark
pub async fn handle_watermark(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<FileResponse>, ApiError> {
    let form = collect_form(multipart).await?;
    let text = form.field("text").unwrap_or("WATERMARK").to_string();
    let upload = form.single_file()?;

    let stamped = pdfmill_core::watermark_document(&upload.data, &text)?;
    let file = state.storage.store("watermarked", &stamped).await?;

    info!(input = %upload.name, "watermarked document");
    Ok(Json(FileResponse {
        success: true,
        file,
        message: "Watermark added successfully".to_string(),
    }))
}

/// Handler: POST /api/protect
///
/// No encryption happens here: the document is rewritten unchanged and the
/// response says so. The password field is accepted and ignored.
pub async fn handle_protect(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<FileResponse>, ApiError> {
    let upload = collect_form(multipart).await?.single_file()?;

    let rewritten = pdfmill_core::rewrite_document(&upload.data)?;
    let file = state.storage.store("protected", &rewritten).await?;

    info!(input = %upload.name, "applied protect stub");
    Ok(Json(FileResponse {
        success: true,
        file,
        message: "PDF protection applied (full encryption is not implemented)".to_string(),
    }))
}

/// Response for the pdf-to-images stub.
#[derive(Serialize)]
pub struct PdfToImagesResponse {
    pub success: bool,
    pub images: Vec<String>,
    pub page_count: u32,
    pub message: String,
}

/// Handler: POST /api/pdf-to-images
///
/// Rasterization is not implemented; the endpoint validates the upload and
/// reports the page count with an empty image list.
pub async fn handle_pdf_to_images(
    multipart: Multipart,
) -> Result<Json<PdfToImagesResponse>, ApiError> {
    let upload = collect_form(multipart).await?.single_file()?;
    let page_count = pdfmill_core::page_count(&upload.data)?;

    info!(input = %upload.name, page_count, "pdf-to-images stub");
    Ok(Json(PdfToImagesResponse {
        success: true,
        images: Vec::new(),
        page_count,
        message: "PDF to image conversion is not implemented; no images were produced"
            .to_string(),
    }))
}

/// Handler: POST /api/images-to-pdf
pub async fn handle_images_to_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<FileResponse>, ApiError> {
    let form = collect_form(multipart).await?;
    if form.files.is_empty() {
        return Err(ApiError::InvalidRequest(
            "At least one image file required".into(),
        ));
    }

    let inputs: Vec<(String, Vec<u8>)> = form
        .files
        .into_iter()
        .map(|file| (file.name, file.data))
        .collect();
    let (document, embedded) = pdfmill_core::images_to_document(&inputs)?;
    let file = state.storage.store("images-to-pdf", &document).await?;

    info!(uploaded = inputs.len(), embedded, "converted images to pdf");
    Ok(Json(FileResponse {
        success: true,
        file,
        message: format!("Successfully converted {embedded} image(s) to PDF"),
    }))
}

/// Handler: GET /api/download/:filename
pub async fn handle_download(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<(StatusCode, [(String, String); 2], Vec<u8>), ApiError> {
    let data = state.storage.read(&filename).await?;

    Ok((
        StatusCode::OK,
        [
            (
                "Content-Type".to_string(),
                "application/pdf".to_string(),
            ),
            (
                "Content-Disposition".to_string(),
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        data,
    ))
}
