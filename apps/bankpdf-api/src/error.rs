//! Error types for the conversion API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bankpdf_core::ConvertError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing auth")]
    MissingAuth,

    #[error("Invalid token")]
    InvalidToken,

    #[error("No file uploaded")]
    NoFile,

    #[error("Only PDF files are allowed")]
    NotPdf,

    #[error("File too large (max {0}MB)")]
    FileTooLarge(usize),

    #[error("Bank '{0}' not supported yet. Use HDFC.")]
    UnsupportedBank(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("Parse failed: {0}")]
    ParseFailed(#[from] ConvertError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingAuth => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken => StatusCode::FORBIDDEN,
            ApiError::NoFile
            | ApiError::NotPdf
            | ApiError::FileTooLarge(_)
            | ApiError::UnsupportedBank(_)
            | ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingField(_) | ApiError::ParseFailed(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable identifier for clients
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingAuth => "missing_auth",
            ApiError::InvalidToken => "invalid_token",
            ApiError::NoFile => "no_file",
            ApiError::NotPdf => "not_pdf",
            ApiError::FileTooLarge(_) => "file_too_large",
            ApiError::UnsupportedBank(_) => "unsupported_institution",
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::MissingField(_) => "missing_field",
            ApiError::ParseFailed(e) => e.kind(),
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": message,
            "kind": self.kind(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
