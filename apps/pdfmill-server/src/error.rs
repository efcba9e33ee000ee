//! Error types for the pdfmill server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdfmill_core::PdfOpError;
use serde::Serialize;
use thiserror::Error;

/// Server error types
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Pdf(#[from] PdfOpError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
    code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::InvalidRequest(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg.clone())
            }
            ApiError::NotFound(name) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("File not found: {name}"),
            ),
            ApiError::Pdf(err) => match err {
                // These come straight from user input.
                PdfOpError::NoValidPages
                | PdfOpError::InvalidRotation(_)
                | PdfOpError::ParseError(_)
                | PdfOpError::UnsupportedImage(_) => {
                    (StatusCode::BAD_REQUEST, "PDF_ERROR", err.to_string())
                }
                PdfOpError::OperationError(_) => {
                    tracing::error!("PDF operation failed: {err}");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "PDF_ERROR",
                        "PDF operation failed".to_string(),
                    )
                }
            },
            ApiError::Io(err) => {
                tracing::error!("I/O error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
