//! HTTP API
//!
//! Routes, shared state and the JSON error envelope. Every failure is
//! returned as `{"success": false, "error": "..."}`.

mod auth;
mod billing;
mod catalog;
mod library;
mod lookup;
mod pdfs;

pub use auth::AuthUser;

use crate::config::Config;
use crate::db::Db;
use crate::dictionary::DictionaryClient;
use crate::error::Error;
use crate::google::{GoogleTokenVerifier, TokenVerifier};
use crate::paypal::PayPalClient;
use crate::storage::{self, PdfStore};
use crate::turath::TurathClient;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

/// Everything a request handler can reach
pub struct AppState {
    pub db: Db,
    pub store: Arc<dyn PdfStore>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub paypal: Option<PayPalClient>,
    pub webhook_id: Option<String>,
    pub turath: TurathClient,
    pub dictionary: DictionaryClient,
    pub cors_origins: Vec<String>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire up the configured store and external clients
    pub fn from_config(config: &Config, db: Db) -> crate::error::Result<Self> {
        let paypal = PayPalClient::from_config(&config.paypal)?;
        if paypal.is_none() {
            warn!(
                "PayPal credentials not found in {} / {}; subscription cancellation stays local",
                config.paypal.client_id_env, config.paypal.secret_env
            );
        }

        Ok(Self {
            db,
            store: storage::from_config(config)?,
            verifier: Arc::new(GoogleTokenVerifier::new(&config.google)?),
            paypal,
            webhook_id: config.paypal.webhook_id.clone().filter(|id| !id.is_empty()),
            turath: TurathClient::new(&config.turath)?,
            dictionary: DictionaryClient::new(&config.dictionary)?,
            cors_origins: config.server.cors_origins.clone(),
        })
    }
}

/// Build the application router
pub fn router(state: SharedState) -> Router {
    let cors = cors_layer(&state.cors_origins);

    Router::new()
        // Storage
        .route("/api/health", get(pdfs::health))
        .route("/api/pdfs", get(pdfs::list_pdfs))
        .route("/api/pdfs/{*filename}", get(pdfs::get_pdf))
        // Catalog
        .route("/api/categories", get(catalog::list_categories))
        .route("/api/books", get(catalog::list_books))
        .route("/api/books/{id}", get(catalog::get_book))
        .route("/api/books/{id}/pdf", get(catalog::get_book_pdf))
        .route("/api/authors/{id}", get(catalog::get_author))
        // Accounts
        .route("/api/auth/google", post(auth::google_sign_in))
        .route("/api/users/me", get(auth::current_user).delete(auth::delete_account))
        // Reader data
        .route(
            "/api/vocabulary",
            get(library::list_vocabulary).post(library::add_vocabulary),
        )
        .route("/api/vocabulary/{id}", delete(library::delete_vocabulary))
        .route("/api/reading-history", get(library::list_history))
        .route(
            "/api/reading-history/{book_id}",
            get(library::get_position).put(library::save_position),
        )
        // Subscriptions
        .route("/api/subscriptions", post(billing::purchase))
        .route("/api/subscriptions/me", get(billing::current_subscription))
        .route("/api/subscriptions/me/cancel", post(billing::cancel))
        .route("/api/paypal/webhook", post(billing::webhook))
        // Upstream lookups
        .route("/api/turath/books/{id}", get(lookup::turath_book))
        .route("/api/define/{word}", get(lookup::define_word))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Handler error carrying a crate [`Error`]
#[derive(Debug)]
pub struct ApiError(pub Error);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(Error::InvalidInput(rejection.body_text()))
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Error::PayPal(_) => StatusCode::BAD_GATEWAY,
            e if e.is_unique_violation() => StatusCode::CONFLICT,
            e if e.is_foreign_key_violation() => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match &self.0 {
            e if e.is_unique_violation() => "Already exists".to_string(),
            e if e.is_foreign_key_violation() => "Referenced record does not exist".to_string(),
            Error::Database(_) => "Database error".to_string(),
            e => e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }

        let body = serde_json::json!({
            "success": false,
            "error": self.message(),
        });
        (status, Json(body)).into_response()
    }
}
