//! Subscription lifecycle
//!
//! States are `active`, `cancelled` and `expired`. PayPal webhook events move
//! a subscription between them; `expired` is terminal.

use crate::db::{Db, Subscription, SubscriptionStatus, SubscriptionUpdate};
use crate::error::{Error, Result};
use crate::paypal::PayPalClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Webhook event kinds that affect a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleEvent {
    Activated,
    Cancelled,
    Suspended,
    Expired,
    PaymentCompleted,
}

impl LifecycleEvent {
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        match event_type {
            "BILLING.SUBSCRIPTION.ACTIVATED" | "BILLING.SUBSCRIPTION.RE-ACTIVATED" => {
                Some(LifecycleEvent::Activated)
            }
            "BILLING.SUBSCRIPTION.CANCELLED" => Some(LifecycleEvent::Cancelled),
            "BILLING.SUBSCRIPTION.SUSPENDED" => Some(LifecycleEvent::Suspended),
            "BILLING.SUBSCRIPTION.EXPIRED" => Some(LifecycleEvent::Expired),
            "PAYMENT.SALE.COMPLETED" => Some(LifecycleEvent::PaymentCompleted),
            _ => None,
        }
    }
}

/// A PayPal webhook delivery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    pub event_type: String,
    #[serde(default)]
    pub resource: serde_json::Value,
}

impl WebhookEvent {
    pub fn lifecycle(&self) -> Option<LifecycleEvent> {
        LifecycleEvent::from_event_type(&self.event_type)
    }

    /// The PayPal subscription id the event refers to.
    ///
    /// Sale events reference it as `billing_agreement_id`; subscription
    /// events carry the subscription itself as the resource.
    pub fn subscription_id(&self) -> Option<&str> {
        let field = match self.lifecycle() {
            Some(LifecycleEvent::PaymentCompleted) => "billing_agreement_id",
            _ => "id",
        };
        self.resource.get(field).and_then(|v| v.as_str())
    }
}

/// Result of handling a webhook
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum WebhookOutcome {
    Applied { subscription: Subscription },
    Unchanged,
    Ignored { reason: String },
}

fn parse_time(value: Option<&str>) -> Option<DateTime<Utc>> {
    value
        .and_then(|v| DateTime::parse_from_rfc3339(v).ok())
        .map(|d| d.with_timezone(&Utc))
}

/// Compute the next state for `event`; `None` when nothing changes
pub fn next_state(
    current: &Subscription,
    event: LifecycleEvent,
    now: DateTime<Utc>,
) -> Result<Option<SubscriptionUpdate>> {
    let status = current.get_status()?;
    let stamp = now.to_rfc3339();

    if status == SubscriptionStatus::Expired {
        return Ok(None);
    }

    let update = match event {
        LifecycleEvent::Activated => match status {
            SubscriptionStatus::Active => None,
            _ => Some(SubscriptionUpdate {
                status: SubscriptionStatus::Active,
                end_date: current.end_date.clone(),
                cancelled_at: None,
            }),
        },
        LifecycleEvent::Cancelled | LifecycleEvent::Suspended => match status {
            SubscriptionStatus::Active => Some(SubscriptionUpdate {
                status: SubscriptionStatus::Cancelled,
                end_date: current.end_date.clone(),
                cancelled_at: Some(stamp),
            }),
            _ => None,
        },
        LifecycleEvent::Expired => Some(SubscriptionUpdate {
            status: SubscriptionStatus::Expired,
            end_date: Some(stamp),
            cancelled_at: current.cancelled_at.clone(),
        }),
        LifecycleEvent::PaymentCompleted => {
            let period = current.get_type()?;
            let base = parse_time(current.end_date.as_deref())
                .filter(|end| *end > now)
                .unwrap_or(now);
            Some(SubscriptionUpdate {
                status: SubscriptionStatus::Active,
                end_date: Some(period.period_end(base).to_rfc3339()),
                cancelled_at: None,
            })
        }
    };

    Ok(update)
}

/// Apply a webhook event to the matching subscription
pub async fn apply_webhook(db: &Db, event: &WebhookEvent) -> Result<WebhookOutcome> {
    let Some(lifecycle) = event.lifecycle() else {
        info!("Ignoring PayPal event {} ({})", event.id, event.event_type);
        return Ok(WebhookOutcome::Ignored {
            reason: format!("unhandled event type {}", event.event_type),
        });
    };

    let Some(paypal_id) = event.subscription_id() else {
        warn!("PayPal event {} has no subscription id", event.id);
        return Ok(WebhookOutcome::Ignored {
            reason: "missing subscription id".to_string(),
        });
    };

    let Some(current) = db.get_subscription_by_paypal_id(paypal_id).await? else {
        warn!("PayPal event {} for unknown subscription {}", event.id, paypal_id);
        return Ok(WebhookOutcome::Ignored {
            reason: format!("unknown subscription {}", paypal_id),
        });
    };

    match next_state(&current, lifecycle, Utc::now())? {
        Some(update) => {
            let subscription = db.update_subscription(current.id, &update).await?;
            info!(
                "Subscription {} {} -> {} ({:?})",
                paypal_id, current.status, subscription.status, lifecycle
            );
            Ok(WebhookOutcome::Applied { subscription })
        }
        None => Ok(WebhookOutcome::Unchanged),
    }
}

/// Cancel the user's subscription at PayPal (when configured) and locally
pub async fn cancel_for_user(
    db: &Db,
    paypal: Option<&PayPalClient>,
    user_id: i64,
) -> Result<Subscription> {
    let current = db
        .get_subscription_for_user(user_id)
        .await?
        .ok_or_else(|| Error::NotFound("Subscription".to_string()))?;

    if current.get_status()? != SubscriptionStatus::Active {
        return Err(Error::InvalidInput(format!(
            "subscription is {}, not active",
            current.status
        )));
    }

    match (paypal, current.paypal_subscription_id.as_deref()) {
        (Some(client), Some(paypal_id)) => {
            client
                .cancel_subscription(paypal_id, "Cancelled by user")
                .await?
        }
        _ => warn!(
            "PayPal not configured; cancelling subscription {} locally only",
            current.id
        ),
    }

    match next_state(&current, LifecycleEvent::Cancelled, Utc::now())? {
        Some(update) => db.update_subscription(current.id, &update).await,
        None => Ok(current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use crate::db::{NewSubscription, SubscriptionType};
    use chrono::TimeZone;

    fn subscription(status: &str, end_date: Option<&str>) -> Subscription {
        Subscription {
            id: 1,
            user_id: 1,
            subscription_type: "monthly".to_string(),
            status: status.to_string(),
            paypal_plan_id: None,
            paypal_subscription_id: Some("I-1".to_string()),
            amount: None,
            currency: "USD".to_string(),
            start_date: "2024-01-01T00:00:00+00:00".to_string(),
            end_date: end_date.map(str::to_string),
            cancelled_at: None,
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            updated_at: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_cancel_records_timestamp() {
        let update = next_state(&subscription("active", None), LifecycleEvent::Cancelled, now())
            .unwrap()
            .unwrap();
        assert_eq!(update.status, SubscriptionStatus::Cancelled);
        assert_eq!(update.cancelled_at, Some(now().to_rfc3339()));

        let again = next_state(&subscription("cancelled", None), LifecycleEvent::Suspended, now())
            .unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn test_expired_is_terminal() {
        for event in [
            LifecycleEvent::Activated,
            LifecycleEvent::Cancelled,
            LifecycleEvent::PaymentCompleted,
            LifecycleEvent::Expired,
        ] {
            assert!(next_state(&subscription("expired", None), event, now())
                .unwrap()
                .is_none());
        }
    }

    #[test]
    fn test_reactivation_clears_cancellation() {
        let mut cancelled = subscription("cancelled", Some("2024-04-01T00:00:00+00:00"));
        cancelled.cancelled_at = Some("2024-03-01T00:00:00+00:00".to_string());

        let update = next_state(&cancelled, LifecycleEvent::Activated, now())
            .unwrap()
            .unwrap();
        assert_eq!(update.status, SubscriptionStatus::Active);
        assert_eq!(update.cancelled_at, None);
        assert_eq!(update.end_date.as_deref(), Some("2024-04-01T00:00:00+00:00"));
    }

    #[test]
    fn test_payment_extends_from_current_end() {
        let active = subscription("active", Some("2024-03-20T00:00:00+00:00"));
        let update = next_state(&active, LifecycleEvent::PaymentCompleted, now())
            .unwrap()
            .unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 4, 20, 0, 0, 0).unwrap();
        assert_eq!(update.end_date, Some(expected.to_rfc3339()));

        let lapsed = subscription("active", Some("2024-01-20T00:00:00+00:00"));
        let update = next_state(&lapsed, LifecycleEvent::PaymentCompleted, now())
            .unwrap()
            .unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 4, 10, 0, 0, 0).unwrap();
        assert_eq!(update.end_date, Some(expected.to_rfc3339()));
    }

    #[test]
    fn test_subscription_id_location() {
        let sale: WebhookEvent = serde_json::from_value(serde_json::json!({
            "id": "WH-1",
            "event_type": "PAYMENT.SALE.COMPLETED",
            "resource": {"id": "SALE-9", "billing_agreement_id": "I-7"}
        }))
        .unwrap();
        assert_eq!(sale.subscription_id(), Some("I-7"));

        let cancel: WebhookEvent = serde_json::from_value(serde_json::json!({
            "id": "WH-2",
            "event_type": "BILLING.SUBSCRIPTION.CANCELLED",
            "resource": {"id": "I-7", "status": "CANCELLED"}
        }))
        .unwrap();
        assert_eq!(cancel.subscription_id(), Some("I-7"));
    }

    #[tokio::test]
    async fn test_apply_webhook_end_to_end() {
        let (db, _tmp) = setup_test_db().await;
        let user = db.create_user(&profile("g-1", "a@example.com")).await.unwrap();
        db.record_purchase(
            user.id,
            &NewSubscription {
                subscription_type: SubscriptionType::Monthly,
                paypal_plan_id: Some("P-1".to_string()),
                paypal_subscription_id: "I-7".to_string(),
                amount: Some("4.99".to_string()),
                currency: "USD".to_string(),
            },
        )
        .await
        .unwrap();

        let event = |event_type: &str| WebhookEvent {
            id: "WH".to_string(),
            event_type: event_type.to_string(),
            resource: serde_json::json!({"id": "I-7"}),
        };

        let outcome = apply_webhook(&db, &event("BILLING.SUBSCRIPTION.CANCELLED"))
            .await
            .unwrap();
        match outcome {
            WebhookOutcome::Applied { subscription } => {
                assert_eq!(subscription.status, "cancelled");
                assert!(subscription.cancelled_at.is_some());
            }
            other => panic!("unexpected outcome {:?}", other),
        }

        let outcome = apply_webhook(&db, &event("BILLING.SUBSCRIPTION.CANCELLED"))
            .await
            .unwrap();
        assert!(matches!(outcome, WebhookOutcome::Unchanged));

        apply_webhook(&db, &event("BILLING.SUBSCRIPTION.EXPIRED"))
            .await
            .unwrap();
        let outcome = apply_webhook(&db, &event("BILLING.SUBSCRIPTION.ACTIVATED"))
            .await
            .unwrap();
        assert!(matches!(outcome, WebhookOutcome::Unchanged));
        let stored = db.get_subscription_for_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.status, "expired");

        let outcome = apply_webhook(&db, &event("CUSTOMER.DISPUTE.CREATED"))
            .await
            .unwrap();
        assert!(matches!(outcome, WebhookOutcome::Ignored { .. }));
    }

    #[tokio::test]
    async fn test_cancel_for_user_without_paypal() {
        let (db, _tmp) = setup_test_db().await;
        let user = db.create_user(&profile("g-1", "a@example.com")).await.unwrap();

        let err = cancel_for_user(&db, None, user.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        db.record_purchase(
            user.id,
            &NewSubscription {
                subscription_type: SubscriptionType::Yearly,
                paypal_plan_id: None,
                paypal_subscription_id: "I-8".to_string(),
                amount: None,
                currency: "USD".to_string(),
            },
        )
        .await
        .unwrap();

        let cancelled = cancel_for_user(&db, None, user.id).await.unwrap();
        assert_eq!(cancelled.status, "cancelled");

        let err = cancel_for_user(&db, None, user.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
