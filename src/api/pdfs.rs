//! Health check and raw PDF access

use super::{ApiResult, SharedState};
use crate::error::Error;
use crate::storage::validate_pdf_name;
use axum::extract::{Path, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Json, Response};
use serde_json::{json, Value};
use tracing::debug;

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "ReadArabic PDF Backend",
    }))
}

/// GET /api/pdfs
pub async fn list_pdfs(State(state): State<SharedState>) -> ApiResult<Json<Value>> {
    let pdfs = state.store.list().await?;
    Ok(Json(json!({
        "success": true,
        "count": pdfs.len(),
        "pdfs": pdfs,
    })))
}

/// GET /api/pdfs/{filename}
pub async fn get_pdf(
    State(state): State<SharedState>,
    Path(filename): Path<String>,
) -> ApiResult<Response> {
    serve_pdf(&state, &filename).await
}

/// Stream a stored PDF back as `application/pdf`
pub(super) async fn serve_pdf(state: &SharedState, name: &str) -> ApiResult<Response> {
    validate_pdf_name(name)?;
    let bytes = state
        .store
        .get(name)
        .await?
        .ok_or_else(|| Error::NotFound(format!("PDF {}", name)))?;
    debug!("Serving {} ({} bytes)", name, bytes.len());

    let content_type = mime_guess::from_path(name)
        .first_raw()
        .unwrap_or("application/pdf");
    let file_name = name.rsplit('/').next().unwrap_or(name);
    let disposition = format!("inline; filename=\"{}\"", file_name.replace('"', ""));

    Ok((
        [
            (CONTENT_TYPE, content_type.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}
