//! Google sign-in and the bearer-token extractor

use super::{ApiError, ApiResult, SharedState};
use crate::db::User;
use crate::error::Error;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

/// The signed-in user, resolved from `Authorization: Bearer <Google ID token>`
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

impl FromRequestParts<SharedState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| Error::Unauthorized("missing bearer token".to_string()))?;

        let profile = state.verifier.verify(token).await?;
        let user = match state.db.get_user_by_google_id(&profile.google_id).await? {
            Some(user) => user,
            None => {
                debug!("First request from Google account {}", profile.google_id);
                state.db.upsert_google_user(&profile).await?
            }
        };
        Ok(AuthUser(user))
    }
}

#[derive(Debug, Deserialize)]
pub struct GoogleSignIn {
    pub credential: String,
}

/// POST /api/auth/google
pub async fn google_sign_in(
    State(state): State<SharedState>,
    payload: Result<Json<GoogleSignIn>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) = payload?;
    let profile = state.verifier.verify(request.credential.trim()).await?;
    let user = state.db.upsert_google_user(&profile).await?;
    info!("User {} signed in", user.id);
    Ok(Json(json!({ "success": true, "user": user })))
}

/// GET /api/users/me
pub async fn current_user(AuthUser(user): AuthUser) -> Json<Value> {
    Json(json!({ "success": true, "user": user }))
}

/// DELETE /api/users/me
pub async fn delete_account(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    if !state.db.delete_user(user.id).await? {
        return Err(Error::NotFound("User".to_string()).into());
    }
    info!("Deleted user {}", user.id);
    Ok(Json(json!({ "success": true })))
}
