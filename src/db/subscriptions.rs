//! Subscription rows

use super::models::{NewSubscription, Subscription, SubscriptionStatus, SubscriptionUpdate};
use super::Db;
use crate::error::Result;
use chrono::Utc;

impl Db {
    /// Record a purchase as the user's single active subscription
    pub async fn record_purchase(
        &self,
        user_id: i64,
        purchase: &NewSubscription,
    ) -> Result<Subscription> {
        let now = Utc::now();
        let end_date = purchase.subscription_type.period_end(now).to_rfc3339();
        let now = now.to_rfc3339();

        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (user_id, subscription_type, status, paypal_plan_id, paypal_subscription_id, amount, currency, start_date, end_date, cancelled_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                subscription_type = excluded.subscription_type,
                status = excluded.status,
                paypal_plan_id = excluded.paypal_plan_id,
                paypal_subscription_id = excluded.paypal_subscription_id,
                amount = excluded.amount,
                currency = excluded.currency,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                cancelled_at = NULL,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(purchase.subscription_type.to_string())
        .bind(SubscriptionStatus::Active.to_string())
        .bind(&purchase.paypal_plan_id)
        .bind(&purchase.paypal_subscription_id)
        .bind(&purchase.amount)
        .bind(&purchase.currency)
        .bind(&now)
        .bind(&end_date)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;
        Ok(subscription)
    }

    /// Get the user's subscription
    pub async fn get_subscription_for_user(&self, user_id: i64) -> Result<Option<Subscription>> {
        let subscription =
            sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE user_id = ?")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(subscription)
    }

    /// Find a subscription by PayPal's subscription id
    pub async fn get_subscription_by_paypal_id(
        &self,
        paypal_subscription_id: &str,
    ) -> Result<Option<Subscription>> {
        let subscription = sqlx::query_as::<_, Subscription>(
            "SELECT * FROM subscriptions WHERE paypal_subscription_id = ?",
        )
        .bind(paypal_subscription_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(subscription)
    }

    /// Persist a lifecycle change
    pub async fn update_subscription(
        &self,
        id: i64,
        update: &SubscriptionUpdate,
    ) -> Result<Subscription> {
        let subscription = sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions SET
                status = ?,
                end_date = ?,
                cancelled_at = ?,
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(update.status.to_string())
        .bind(&update.end_date)
        .bind(&update.cancelled_at)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(subscription)
    }
}
