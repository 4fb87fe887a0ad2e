//! Subscription purchase, cancellation and PayPal webhooks

use super::{ApiResult, AuthUser, SharedState};
use crate::db::NewSubscription;
use crate::error::Error;
use crate::paypal::WebhookHeaders;
use crate::subscription::{apply_webhook, cancel_for_user, WebhookEvent};
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;
use serde_json::{json, Value};
use tracing::{info, warn};

/// GET /api/subscriptions/me
pub async fn current_subscription(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let subscription = state
        .db
        .get_subscription_for_user(user.id)
        .await?
        .ok_or_else(|| Error::NotFound("Subscription".to_string()))?;
    Ok(Json(json!({ "success": true, "subscription": subscription })))
}

/// POST /api/subscriptions
pub async fn purchase(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<NewSubscription>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(purchase) = payload?;
    if purchase.paypal_subscription_id.trim().is_empty() {
        return Err(Error::InvalidInput("paypal_subscription_id is required".to_string()).into());
    }

    let subscription = state.db.record_purchase(user.id, &purchase).await?;
    info!(
        "User {} subscribed ({}, {})",
        user.id, subscription.subscription_type, purchase.paypal_subscription_id
    );
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "subscription": subscription })),
    ))
}

/// POST /api/subscriptions/me/cancel
pub async fn cancel(
    State(state): State<SharedState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Value>> {
    let subscription = cancel_for_user(&state.db, state.paypal.as_ref(), user.id).await?;
    Ok(Json(json!({ "success": true, "subscription": subscription })))
}

/// POST /api/paypal/webhook
pub async fn webhook(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let raw: Value = serde_json::from_slice(&body)
        .map_err(|e| Error::InvalidInput(format!("webhook body is not JSON: {}", e)))?;

    if let Some(webhook_id) = &state.webhook_id {
        let client = state.paypal.as_ref().ok_or_else(|| {
            Error::Config("paypal.webhook_id is set but PayPal credentials are missing".to_string())
        })?;
        let transmission = WebhookHeaders::from_header_map(&headers)
            .ok_or_else(|| Error::InvalidInput("missing PayPal transmission headers".to_string()))?;

        if !client
            .verify_webhook_signature(webhook_id, &transmission, &raw)
            .await?
        {
            warn!("Rejected PayPal webhook {}", transmission.transmission_id);
            return Err(
                Error::InvalidInput("webhook signature verification failed".to_string()).into(),
            );
        }
    }

    let event: WebhookEvent = serde_json::from_value(raw)
        .map_err(|e| Error::InvalidInput(format!("malformed webhook event: {}", e)))?;
    let outcome = apply_webhook(&state.db, &event).await?;
    Ok(Json(json!({ "success": true, "result": outcome })))
}
