//! Per-user reader data: saved words and reading positions

use super::{ApiResult, AuthUser, SharedState};
use crate::db::NewVocabularyEntry;
use crate::error::Error;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct VocabularyFilter {
    pub book_id: Option<i64>,
}

/// GET /api/vocabulary?book_id=
pub async fn list_vocabulary(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Query(filter): Query<VocabularyFilter>,
) -> ApiResult<Json<Value>> {
    let words = state.db.list_vocabulary(user.id, filter.book_id).await?;
    Ok(Json(json!({
        "success": true,
        "count": words.len(),
        "vocabulary": words,
    })))
}

/// POST /api/vocabulary
pub async fn add_vocabulary(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<NewVocabularyEntry>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(entry) = payload?;
    if entry.word.trim().is_empty() {
        return Err(Error::InvalidInput("word must not be empty".to_string()).into());
    }

    let saved = state.db.add_vocabulary(user.id, &entry).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "entry": saved })),
    ))
}

/// DELETE /api/vocabulary/{id}
pub async fn delete_vocabulary(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    if !state.db.delete_vocabulary(user.id, id).await? {
        return Err(Error::NotFound("Vocabulary entry".to_string()).into());
    }
    Ok(Json(json!({ "success": true })))
}

/// GET /api/reading-history
pub async fn list_history(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let history = state.db.list_reading_history(user.id).await?;
    Ok(Json(json!({
        "success": true,
        "count": history.len(),
        "history": history,
    })))
}

/// GET /api/reading-history/{book_id}
pub async fn get_position(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let position = state
        .db
        .get_reading_position(user.id, book_id)
        .await?
        .ok_or_else(|| Error::NotFound("Reading position".to_string()))?;
    Ok(Json(json!({ "success": true, "position": position })))
}

#[derive(Debug, Deserialize)]
pub struct PositionUpdate {
    pub current_page: i64,
    #[serde(default)]
    pub current_volume: Option<i64>,
}

/// PUT /api/reading-history/{book_id}
pub async fn save_position(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    Path(book_id): Path<i64>,
    payload: Result<Json<PositionUpdate>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(update) = payload?;
    if update.current_page < 1 {
        return Err(Error::InvalidInput("current_page must be at least 1".to_string()).into());
    }

    let position = state
        .db
        .upsert_reading_position(user.id, book_id, update.current_page, update.current_volume)
        .await?;
    Ok(Json(json!({ "success": true, "position": position })))
}
