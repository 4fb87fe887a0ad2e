//! Catalog browsing, read from `books_with_categories`

use super::pdfs::serve_pdf;
use super::{ApiResult, SharedState};
use crate::db::CatalogQuery;
use crate::error::Error;
use crate::storage::object_name_from_link;
use axum::extract::{Path, Query, State};
use axum::response::{Json, Response};
use serde_json::{json, Value};

const MAX_PAGE_SIZE: i64 = 500;

/// GET /api/categories
pub async fn list_categories(State(state): State<SharedState>) -> ApiResult<Json<Value>> {
    let categories = state.db.list_categories().await?;
    Ok(Json(json!({
        "success": true,
        "count": categories.len(),
        "categories": categories,
    })))
}

/// GET /api/books?cat_id=&author_id=&limit=&offset=
pub async fn list_books(
    State(state): State<SharedState>,
    Query(mut query): Query<CatalogQuery>,
) -> ApiResult<Json<Value>> {
    if query.limit.is_some_and(|l| l < 0) || query.offset.is_some_and(|o| o < 0) {
        return Err(Error::InvalidInput("limit and offset must not be negative".to_string()).into());
    }
    query.limit = Some(query.limit.unwrap_or(MAX_PAGE_SIZE).min(MAX_PAGE_SIZE));

    let books = state.db.list_catalog(&query).await?;
    Ok(Json(json!({
        "success": true,
        "count": books.len(),
        "books": books,
    })))
}

/// GET /api/books/{id}
pub async fn get_book(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let entry = state
        .db
        .get_catalog_entry(id)
        .await?
        .ok_or_else(|| Error::NotFound("Book".to_string()))?;

    let author = match entry.book.author_id {
        Some(author_id) => state.db.get_author(author_id).await?,
        None => None,
    };

    Ok(Json(json!({
        "success": true,
        "book": entry,
        "author": author,
    })))
}

/// GET /api/books/{id}/pdf
pub async fn get_book_pdf(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Response> {
    let entry = state
        .db
        .get_catalog_entry(id)
        .await?
        .ok_or_else(|| Error::NotFound("Book".to_string()))?;

    let name = entry
        .book
        .pdf_link
        .as_deref()
        .and_then(object_name_from_link)
        .ok_or_else(|| Error::NotFound(format!("PDF for book {}", id)))?;

    serve_pdf(&state, &name).await
}

/// GET /api/authors/{id}
pub async fn get_author(
    State(state): State<SharedState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Value>> {
    let author = state
        .db
        .get_author(id)
        .await?
        .ok_or_else(|| Error::NotFound("Author".to_string()))?;
    Ok(Json(json!({ "success": true, "author": author })))
}
