//! Catalog tables: categories, books, authors and the listing view

use super::models::{Author, Book, CatalogEntry, Category};
use super::Db;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const LIVE_CATALOG_SQL: &str = r#"
    SELECT b.id, b.name, b.type, b.printed, b.info, b.version, b.author_id, b.cat_id,
           b.date_built, b.pdf_link, b.pdf_size, b.cover_id, c.category_name
    FROM books_metadata b
    LEFT JOIN book_categories c ON b.cat_id = c.cat_id
"#;

/// Filters for the catalog listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub cat_id: Option<i64>,
    pub author_id: Option<i64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Outcome of rebuilding `books_with_categories`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshReport {
    pub rows: u64,
    pub refreshed_at: String,
}

/// A book whose free-text info may carry an author label
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthorSource {
    pub book_id: i64,
    pub author_id: i64,
    pub info: String,
}

/// What happened to one backfill candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorWrite {
    Inserted,
    Updated,
    Unchanged,
}

impl Db {
    // ===== Category Operations =====

    /// Insert or rename a category
    pub async fn upsert_category(&self, category: &Category) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO book_categories (cat_id, category_name)
            VALUES (?, ?)
            ON CONFLICT(cat_id) DO UPDATE SET category_name = excluded.category_name
            "#,
        )
        .bind(category.cat_id)
        .bind(&category.category_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// List all categories
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT * FROM book_categories ORDER BY cat_id")
                .fetch_all(&self.pool)
                .await?;
        Ok(categories)
    }

    // ===== Book Operations =====

    /// Insert or update a book
    pub async fn upsert_book(&self, book: &Book) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO books_metadata (id, name, type, printed, info, version, author_id, cat_id, date_built, pdf_link, pdf_size, cover_id)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                type = excluded.type,
                printed = excluded.printed,
                info = excluded.info,
                version = excluded.version,
                author_id = excluded.author_id,
                cat_id = excluded.cat_id,
                date_built = excluded.date_built,
                pdf_link = excluded.pdf_link,
                pdf_size = excluded.pdf_size,
                cover_id = excluded.cover_id
            "#,
        )
        .bind(book.id)
        .bind(&book.name)
        .bind(book.book_type)
        .bind(book.printed)
        .bind(&book.info)
        .bind(&book.version)
        .bind(book.author_id)
        .bind(book.cat_id)
        .bind(book.date_built)
        .bind(&book.pdf_link)
        .bind(book.pdf_size)
        .bind(book.cover_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get a book from the base table
    pub async fn get_book(&self, id: i64) -> Result<Option<Book>> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books_metadata WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    /// Delete a book; reading history cascades, vocabulary keeps the word
    pub async fn delete_book(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books_metadata WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ===== Listing View =====

    /// List books from the materialized listing
    pub async fn list_catalog(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntry>> {
        let entries = sqlx::query_as::<_, CatalogEntry>(
            r#"
            SELECT * FROM books_with_categories
            WHERE (?1 IS NULL OR cat_id = ?1)
              AND (?2 IS NULL OR author_id = ?2)
            ORDER BY id
            LIMIT ?3 OFFSET ?4
            "#,
        )
        .bind(query.cat_id)
        .bind(query.author_id)
        .bind(query.limit.unwrap_or(-1))
        .bind(query.offset.unwrap_or(0))
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    /// Get one row of the materialized listing
    pub async fn get_catalog_entry(&self, id: i64) -> Result<Option<CatalogEntry>> {
        let entry =
            sqlx::query_as::<_, CatalogEntry>("SELECT * FROM books_with_categories WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(entry)
    }

    /// The join the listing materializes, computed against the base tables
    pub async fn live_catalog(&self) -> Result<Vec<CatalogEntry>> {
        let entries = sqlx::query_as::<_, CatalogEntry>(&format!("{} ORDER BY b.id", LIVE_CATALOG_SQL))
            .fetch_all(&self.pool)
            .await?;
        Ok(entries)
    }

    /// Rebuild `books_with_categories` from the base tables in one transaction
    pub async fn refresh_catalog(&self) -> Result<RefreshReport> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM books_with_categories")
            .execute(&mut *tx)
            .await?;

        let inserted = sqlx::query(&format!(
            "INSERT INTO books_with_categories {} ORDER BY b.id",
            LIVE_CATALOG_SQL
        ))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let report = RefreshReport {
            rows: inserted.rows_affected(),
            refreshed_at: chrono::Utc::now().to_rfc3339(),
        };
        info!("Refreshed books_with_categories ({} rows)", report.rows);
        Ok(report)
    }

    /// Number of rows that differ between the listing and the live join
    pub async fn catalog_drift(&self) -> Result<i64> {
        let drift: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT
                (SELECT COUNT(*) FROM ({live} EXCEPT SELECT * FROM books_with_categories))
              + (SELECT COUNT(*) FROM (SELECT * FROM books_with_categories EXCEPT {live}))
            "#,
            live = LIVE_CATALOG_SQL
        ))
        .fetch_one(&self.pool)
        .await?;
        Ok(drift)
    }

    // ===== Author Operations =====

    /// Get an author by id
    pub async fn get_author(&self, author_id: i64) -> Result<Option<Author>> {
        let author = sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE author_id = ?")
            .bind(author_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(author)
    }

    /// Insert or fully replace a curated author row
    pub async fn upsert_author(&self, author: &Author) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO authors (author_id, author_name, author_name_native, death_year, biography)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(author_id) DO UPDATE SET
                author_name = excluded.author_name,
                author_name_native = excluded.author_name_native,
                death_year = excluded.death_year,
                biography = excluded.biography
            "#,
        )
        .bind(author.author_id)
        .bind(&author.author_name)
        .bind(&author.author_name_native)
        .bind(author.death_year)
        .bind(&author.biography)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Books that carry both an author id and free-text info, by ascending id
    pub async fn author_sources(&self) -> Result<Vec<AuthorSource>> {
        let rows = sqlx::query_as::<_, AuthorSource>(
            r#"
            SELECT id AS book_id, author_id, info
            FROM books_metadata
            WHERE author_id IS NOT NULL AND info IS NOT NULL
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Write extracted author names in one transaction.
    ///
    /// With `overwrite` false an existing `author_id` is left untouched;
    /// otherwise its name is replaced.
    pub async fn write_author_names(
        &self,
        names: &[(i64, String)],
        overwrite: bool,
    ) -> Result<Vec<AuthorWrite>> {
        let mut tx = self.pool.begin().await?;
        let mut outcomes = Vec::with_capacity(names.len());

        for (author_id, name) in names {
            let existing: Option<String> =
                sqlx::query_scalar("SELECT author_name FROM authors WHERE author_id = ?")
                    .bind(author_id)
                    .fetch_optional(&mut *tx)
                    .await?;

            let outcome = match existing {
                None => {
                    sqlx::query("INSERT INTO authors (author_id, author_name) VALUES (?, ?)")
                        .bind(author_id)
                        .bind(name)
                        .execute(&mut *tx)
                        .await?;
                    AuthorWrite::Inserted
                }
                Some(current) if overwrite && current != *name => {
                    sqlx::query("UPDATE authors SET author_name = ? WHERE author_id = ?")
                        .bind(name)
                        .bind(author_id)
                        .execute(&mut *tx)
                        .await?;
                    AuthorWrite::Updated
                }
                Some(_) => AuthorWrite::Unchanged,
            };
            debug!("author {} -> {:?}", author_id, outcome);
            outcomes.push(outcome);
        }

        tx.commit().await?;
        Ok(outcomes)
    }
}
