//! Saved words

use super::models::{NewVocabularyEntry, VocabularyEntry};
use super::Db;
use crate::error::Result;
use chrono::Utc;

impl Db {
    /// Save a word for a user
    pub async fn add_vocabulary(
        &self,
        user_id: i64,
        entry: &NewVocabularyEntry,
    ) -> Result<VocabularyEntry> {
        let saved = sqlx::query_as::<_, VocabularyEntry>(
            r#"
            INSERT INTO user_vocabulary (user_id, word, translation, book_id, page_number, volume_number, word_position, context, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(entry.word.trim())
        .bind(&entry.translation)
        .bind(entry.book_id)
        .bind(entry.page_number)
        .bind(entry.volume_number)
        .bind(entry.word_position)
        .bind(&entry.context)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(saved)
    }

    /// List a user's words, newest first, optionally for one book
    pub async fn list_vocabulary(
        &self,
        user_id: i64,
        book_id: Option<i64>,
    ) -> Result<Vec<VocabularyEntry>> {
        let entries = sqlx::query_as::<_, VocabularyEntry>(
            r#"
            SELECT * FROM user_vocabulary
            WHERE user_id = ?1 AND (?2 IS NULL OR book_id = ?2)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Delete one of the user's words
    pub async fn delete_vocabulary(&self, user_id: i64, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_vocabulary WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    fn word_at(word: &str, page: i64, position: i64) -> NewVocabularyEntry {
        NewVocabularyEntry {
            word: word.to_string(),
            translation: Some("book".to_string()),
            book_id: Some(10),
            page_number: Some(page),
            word_position: Some(position),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_same_word_same_position_is_unique() {
        let (db, _tmp) = setup_test_db().await;
        db.upsert_book(&book(10, "كتاب", None)).await.unwrap();
        let user = db.create_user(&profile("g-1", "a@example.com")).await.unwrap();

        db.add_vocabulary(user.id, &word_at("كتاب", 4, 12)).await.unwrap();
        let err = db
            .add_vocabulary(user.id, &word_at("كتاب", 4, 12))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());

        db.add_vocabulary(user.id, &word_at("كتاب", 5, 12)).await.unwrap();
        assert_eq!(db.list_vocabulary(user.id, Some(10)).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_deleting_book_keeps_word() {
        let (db, _tmp) = setup_test_db().await;
        db.upsert_book(&book(10, "كتاب", None)).await.unwrap();
        let user = db.create_user(&profile("g-1", "a@example.com")).await.unwrap();
        db.add_vocabulary(user.id, &word_at("قلم", 1, 1)).await.unwrap();

        assert!(db.delete_book(10).await.unwrap());

        let words = db.list_vocabulary(user.id, None).await.unwrap();
        assert_eq!(words.len(), 1);
        assert_eq!(words[0].book_id, None);
    }

    #[tokio::test]
    async fn test_unpinned_word_is_unique() {
        let (db, _tmp) = setup_test_db().await;
        let user = db.create_user(&profile("g-1", "a@example.com")).await.unwrap();
        let unpinned = NewVocabularyEntry {
            word: "كتاب".to_string(),
            ..Default::default()
        };

        db.add_vocabulary(user.id, &unpinned).await.unwrap();
        let err = db.add_vocabulary(user.id, &unpinned).await.unwrap_err();
        assert!(err.is_unique_violation());
        assert_eq!(db.list_vocabulary(user.id, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deleting_book_merges_into_unpinned_twin() {
        let (db, _tmp) = setup_test_db().await;
        db.upsert_book(&book(10, "كتاب", None)).await.unwrap();
        let user = db.create_user(&profile("g-1", "a@example.com")).await.unwrap();

        let pinned = word_at("قلم", 1, 1);
        let twin = NewVocabularyEntry {
            book_id: None,
            ..pinned.clone()
        };
        db.add_vocabulary(user.id, &pinned).await.unwrap();
        db.add_vocabulary(user.id, &twin).await.unwrap();
        db.add_vocabulary(user.id, &word_at("حبر", 1, 2)).await.unwrap();

        assert!(db.delete_book(10).await.unwrap());

        let words = db.list_vocabulary(user.id, None).await.unwrap();
        assert_eq!(words.len(), 2);
        assert!(words.iter().all(|w| w.book_id.is_none()));
    }

    #[tokio::test]
    async fn test_delete_only_own_words() {
        let (db, _tmp) = setup_test_db().await;
        let owner = db.create_user(&profile("g-1", "a@example.com")).await.unwrap();
        let other = db.create_user(&profile("g-2", "b@example.com")).await.unwrap();
        let saved = db
            .add_vocabulary(
                owner.id,
                &NewVocabularyEntry {
                    word: " علم ".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(saved.word, "علم");

        assert!(!db.delete_vocabulary(other.id, saved.id).await.unwrap());
        assert!(db.delete_vocabulary(owner.id, saved.id).await.unwrap());
    }
}
