//! Relational storage using SQLite
//!
//! This module owns every table of the application:
//! - Catalog (categories, books, authors, the `books_with_categories` listing)
//! - Users created through Google sign-in
//! - Per-user vocabulary and reading history
//! - PayPal-backed subscriptions
//!
//! Schema changes live in `migrations/` and are embedded at build time.

mod catalog;
mod models;
mod reading;
mod subscriptions;
mod users;
mod vocabulary;

pub use catalog::*;
pub use models::*;

use crate::config::Config;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::path::Path;
use tracing::{debug, info};

/// Embedded migrations from `migrations/`
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Database handle
#[derive(Clone)]
pub struct Db {
    pool: SqlitePool,
}

impl Db {
    /// Connect using the configured database path
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::open(&config.paths.db_file, config.database.max_connections).await
    }

    /// Connect and apply pending migrations
    pub async fn new(db_path: &Path) -> Result<Self> {
        let db = Self::open(db_path, 5).await?;
        db.migrate().await?;
        Ok(db)
    }

    async fn open(db_path: &Path, max_connections: u32) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Apply any pending migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Applying database migrations");
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    /// Versions of successfully applied migrations, oldest first
    pub async fn applied_migrations(&self) -> Result<Vec<i64>> {
        let tracked: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'",
        )
        .fetch_optional(&self.pool)
        .await?;
        if tracked.is_none() {
            return Ok(Vec::new());
        }

        let versions: Vec<i64> = sqlx::query_scalar(
            "SELECT version FROM _sqlx_migrations WHERE success = 1 ORDER BY version",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(versions)
    }

    /// Row counts for every table
    pub async fn get_stats(&self) -> Result<DbStats> {
        async fn count(pool: &SqlitePool, table: &str) -> Result<i64> {
            let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
                .fetch_one(pool)
                .await?;
            Ok(n)
        }

        Ok(DbStats {
            categories: count(&self.pool, "book_categories").await?,
            books: count(&self.pool, "books_metadata").await?,
            authors: count(&self.pool, "authors").await?,
            catalog_rows: count(&self.pool, "books_with_categories").await?,
            users: count(&self.pool, "users").await?,
            vocabulary: count(&self.pool, "user_vocabulary").await?,
            reading_history: count(&self.pool, "reading_history").await?,
            subscriptions: count(&self.pool, "subscriptions").await?,
        })
    }
}

/// Table row counts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DbStats {
    pub categories: i64,
    pub books: i64,
    pub authors: i64,
    pub catalog_rows: i64,
    pub users: i64,
    pub vocabulary: i64,
    pub reading_history: i64,
    pub subscriptions: i64,
}


#[cfg(test)]
mod tests {
    use super::test_support::*;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let (db, _tmp) = setup_test_db().await;
        db.migrate().await.unwrap();

        let stats = db.get_stats().await.unwrap();
        assert_eq!(stats.books, 0);
        assert_eq!(stats.catalog_rows, 0);
        assert_eq!(db.applied_migrations().await.unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }
}
