//! Pass-through lookups against Turath and AraTools

use super::{ApiResult, SharedState};
use crate::backfill::extract_author_name;
use crate::error::Error;
use axum::extract::{Path, State};
use axum::response::Json;
use serde_json::{json, Value};
use tracing::info;

/// GET /api/turath/books/{id}
pub async fn turath_book(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let book = state
        .turath
        .fetch_document(id)
        .await?
        .ok_or_else(|| Error::NotFound("Book".to_string()))?;

    let author = book
        .pointer("/meta/info")
        .and_then(Value::as_str)
        .and_then(extract_author_name);

    Ok(Json(json!({
        "success": true,
        "book": book,
        "author": author,
    })))
}

/// GET /api/define/{word}
pub async fn define_word(
    State(state): State<SharedState>,
    Path(word): Path<String>,
) -> ApiResult<Json<Value>> {
    info!("Definition request for {}", word);
    let definition = state.dictionary.lookup(&word).await?;
    Ok(Json(json!({
        "success": true,
        "word": word,
        "definition": definition,
    })))
}
