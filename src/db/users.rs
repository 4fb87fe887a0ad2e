//! User accounts

use super::models::{GoogleProfile, User};
use super::Db;
use crate::error::Result;
use chrono::Utc;

impl Db {
    /// Insert a new user; fails if the Google id or email is taken
    pub async fn create_user(&self, profile: &GoogleProfile) -> Result<User> {
        let now = Utc::now().to_rfc3339();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (google_id, email, name, profile_picture, created_at, last_login)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&profile.google_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(&profile.picture)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Record a sign-in: create the user on first login, refresh profile fields otherwise
    pub async fn upsert_google_user(&self, profile: &GoogleProfile) -> Result<User> {
        let now = Utc::now().to_rfc3339();
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (google_id, email, name, profile_picture, created_at, last_login)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(google_id) DO UPDATE SET
                email = excluded.email,
                name = COALESCE(excluded.name, users.name),
                profile_picture = COALESCE(excluded.profile_picture, users.profile_picture),
                last_login = excluded.last_login
            RETURNING *
            "#,
        )
        .bind(&profile.google_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(&profile.picture)
        .bind(&now)
        .bind(&now)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    /// Get a user by id
    pub async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Get a user by Google account id
    pub async fn get_user_by_google_id(&self, google_id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE google_id = ?")
            .bind(google_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Delete a user; vocabulary, reading history and subscription rows cascade
    pub async fn delete_user(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::models::{NewSubscription, NewVocabularyEntry, SubscriptionType};
    use super::super::test_support::*;

    #[tokio::test]
    async fn test_duplicate_google_id_is_rejected() {
        let (db, _tmp) = setup_test_db().await;

        db.create_user(&profile("g-1", "a@example.com")).await.unwrap();
        let err = db
            .create_user(&profile("g-1", "b@example.com"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        let err = db
            .create_user(&profile("g-2", "a@example.com"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_upsert_google_user_keeps_identity() {
        let (db, _tmp) = setup_test_db().await;

        let first = db
            .upsert_google_user(&profile("g-1", "a@example.com"))
            .await
            .unwrap();

        let mut changed = profile("g-1", "new@example.com");
        changed.name = None;
        changed.picture = Some("https://example.com/me.png".to_string());
        let second = db.upsert_google_user(&changed).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.email, "new@example.com");
        assert_eq!(second.name.as_deref(), Some("Reader"));
        assert_eq!(second.created_at, first.created_at);
        assert!(db.get_user_by_google_id("g-1").await.unwrap().is_some());
        assert_eq!(db.get_user(first.id).await.unwrap().unwrap().google_id, "g-1");
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let (db, _tmp) = setup_test_db().await;
        db.upsert_book(&book(10, "كتاب", None)).await.unwrap();
        let user = db
            .create_user(&profile("g-1", "a@example.com"))
            .await
            .unwrap();
        let other = db
            .create_user(&profile("g-2", "b@example.com"))
            .await
            .unwrap();

        for u in [&user, &other] {
            db.add_vocabulary(
                u.id,
                &NewVocabularyEntry {
                    word: "كتاب".to_string(),
                    book_id: Some(10),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
            db.upsert_reading_position(u.id, 10, 3, None).await.unwrap();
        }
        db.record_purchase(
            user.id,
            &NewSubscription {
                subscription_type: SubscriptionType::Monthly,
                paypal_plan_id: None,
                paypal_subscription_id: "I-ABC".to_string(),
                amount: Some("4.99".to_string()),
                currency: "USD".to_string(),
            },
        )
        .await
        .unwrap();

        assert!(db.delete_user(user.id).await.unwrap());

        assert!(db.list_vocabulary(user.id, None).await.unwrap().is_empty());
        assert!(db.list_reading_history(user.id).await.unwrap().is_empty());
        assert!(db.get_subscription_for_user(user.id).await.unwrap().is_none());

        assert_eq!(db.list_vocabulary(other.id, None).await.unwrap().len(), 1);
        assert_eq!(db.list_reading_history(other.id).await.unwrap().len(), 1);

        let stats = db.get_stats().await.unwrap();
        assert_eq!(stats.users, 1);
        assert_eq!(stats.vocabulary, 1);
        assert_eq!(stats.reading_history, 1);
        assert_eq!(stats.subscriptions, 0);
    }
}
