//! HTTP handlers for the conversion API

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bankpdf_core::{ConvertError, Institution};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::state::{AppState, UsageSnapshot};

pub async fn root() -> Json<Value> {
    Json(json!({ "status": "backend live" }))
}

/// Health check endpoint
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub async fn version(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "version": state.config.backend_version }))
}

/// Today's usage counters, behind the admin bearer token
pub async fn stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<UsageSnapshot>, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::MissingAuth)?;

    if token.trim() != state.config.admin_token {
        return Err(ApiError::InvalidToken);
    }
    Ok(Json(state.usage.snapshot()))
}

struct Upload {
    filename: Option<String>,
    data: Bytes,
}

#[derive(Default)]
struct ConvertForm {
    bank: Option<String>,
    password: Option<String>,
    file: Option<Upload>,
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        // Reported with the configured limit by the caller
        ApiError::FileTooLarge(0)
    } else {
        ApiError::InvalidRequest(err.body_text())
    }
}

async fn read_form(multipart: &mut Multipart) -> Result<ConvertForm, ApiError> {
    let mut form = ConvertForm::default();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "bank" => form.bank = Some(field.text().await.map_err(multipart_error)?),
            "password" => form.password = Some(field.text().await.map_err(multipart_error)?),
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                form.file = Some(Upload { filename, data });
            }
            _ => {}
        }
    }
    Ok(form)
}

/// `<stem>_tally.csv` for the uploaded file name, safe for a header value
pub fn suggested_csv_name(filename: Option<&str>) -> String {
    let stem = filename
        .and_then(|f| Path::new(f).file_stem())
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("statement");

    let stem: String = stem
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    format!("{}_tally.csv", stem)
}

/// Convert an uploaded statement into a ledger CSV download
pub async fn convert(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let max_mb = state.config.max_upload_bytes / 1_000_000;
    let form = read_form(&mut multipart).await.map_err(|e| match e {
        ApiError::FileTooLarge(_) => ApiError::FileTooLarge(max_mb),
        other => other,
    })?;

    // Required form fields are checked before the upload itself
    let bank = form.bank.ok_or(ApiError::MissingField("bank"))?;
    let upload = form.file.ok_or(ApiError::NoFile)?;
    let filename = upload.filename.unwrap_or_default();
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::NotPdf);
    }
    if upload.data.len() > state.config.max_upload_bytes {
        return Err(ApiError::FileTooLarge(max_mb));
    }

    let institution =
        Institution::from_code(&bank).map_err(|_| ApiError::UnsupportedBank(bank.clone()))?;

    let worker = state.clone();
    let password = form.password;
    let data = upload.data;
    let (csv, metrics) = tokio::task::spawn_blocking(move || {
        let (ledger, metrics) =
            worker
                .engine
                .convert_for(&data, institution, password.as_deref())?;
        Ok::<_, ConvertError>((ledger.to_csv_bytes()?, metrics))
    })
    .await
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("Conversion task failed: {}", e)))??;

    state.usage.record_conversion();
    info!(
        file = %filename,
        bank = %institution,
        transactions = metrics.transaction_count,
        elapsed_ms = metrics.processing_time_ms,
        "Conversion complete"
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        suggested_csv_name(Some(&filename))
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}
