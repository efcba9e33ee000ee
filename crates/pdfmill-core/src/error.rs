use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfOpError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("No valid pages specified")]
    NoValidPages,

    #[error("Invalid rotation angle: {0} (must be a multiple of 90)")]
    InvalidRotation(i32),

    #[error("Unsupported image format: {0}")]
    UnsupportedImage(String),

    #[error("PDF operation failed: {0}")]
    OperationError(String),
}
