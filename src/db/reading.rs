//! Reading history

use super::models::ReadingPosition;
use super::Db;
use crate::error::Result;
use chrono::Utc;

impl Db {
    /// Record the user's position in a book, replacing any earlier one
    pub async fn upsert_reading_position(
        &self,
        user_id: i64,
        book_id: i64,
        current_page: i64,
        current_volume: Option<i64>,
    ) -> Result<ReadingPosition> {
        let position = sqlx::query_as::<_, ReadingPosition>(
            r#"
            INSERT INTO reading_history (user_id, book_id, current_page, current_volume, last_read_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id, book_id) DO UPDATE SET
                current_page = excluded.current_page,
                current_volume = excluded.current_volume,
                last_read_at = excluded.last_read_at
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(book_id)
        .bind(current_page)
        .bind(current_volume)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(position)
    }

    /// Get the user's position in one book
    pub async fn get_reading_position(
        &self,
        user_id: i64,
        book_id: i64,
    ) -> Result<Option<ReadingPosition>> {
        let position = sqlx::query_as::<_, ReadingPosition>(
            "SELECT * FROM reading_history WHERE user_id = ? AND book_id = ?",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(position)
    }

    /// All positions for a user, most recently read first
    pub async fn list_reading_history(&self, user_id: i64) -> Result<Vec<ReadingPosition>> {
        let positions = sqlx::query_as::<_, ReadingPosition>(
            "SELECT * FROM reading_history WHERE user_id = ? ORDER BY last_read_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(positions)
    }
}
