//! Status command implementation

use crate::config::Config;
use crate::db::{Db, DbStats};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusInfo {
    pub config_path: String,
    pub db_path: String,
    pub storage_backend: String,
    pub schema_version: Option<i64>,
    pub paypal_configured: bool,
    pub webhook_verification: bool,
    pub db_stats: DbStats,
    /// Rows that differ between `books_with_categories` and the live join
    pub catalog_drift: i64,
}

/// Get system status
pub async fn cmd_status(config: &Config, db: &Db) -> Result<StatusInfo> {
    info!("Getting status");

    Ok(StatusInfo {
        config_path: config.paths.config_file.display().to_string(),
        db_path: config.paths.db_file.display().to_string(),
        storage_backend: config.storage.backend.clone(),
        schema_version: db.applied_migrations().await?.last().copied(),
        paypal_configured: config.paypal.credentials().is_some(),
        webhook_verification: config.paypal.webhook_id.is_some(),
        db_stats: db.get_stats().await?,
        catalog_drift: db.catalog_drift().await?,
    })
}

/// Print status to console
pub fn print_status(status: &StatusInfo) {
    println!("\n📚 readarabic Status\n");
    println!("Configuration: {}", status.config_path);
    println!("Database: {}", status.db_path);
    match status.schema_version {
        Some(version) => println!("  Schema version: {}", version),
        None => println!("  Schema: not created (run 'readarabic migrate')"),
    }
    println!("Storage backend: {}", status.storage_backend);

    let paypal = match (status.paypal_configured, status.webhook_verification) {
        (true, true) => "✓ Configured (webhooks verified)",
        (true, false) => "⚠ Configured (webhooks not verified)",
        (false, _) => "✗ Not configured",
    };
    println!("PayPal: {}", paypal);

    let stats = &status.db_stats;
    println!("\nCatalog:");
    println!("  Categories: {}", stats.categories);
    println!("  Books: {}", stats.books);
    println!("  Authors: {}", stats.authors);
    println!("  Listing rows: {}", stats.catalog_rows);
    if status.catalog_drift > 0 {
        println!(
            "  ⚠ Listing is stale ({} differing rows) - run 'readarabic refresh-catalog'",
            status.catalog_drift
        );
    } else {
        println!("  ✓ Listing is up to date");
    }

    println!("\nReaders:");
    println!("  Users: {}", stats.users);
    println!("  Saved words: {}", stats.vocabulary);
    println!("  Reading positions: {}", stats.reading_history);
    println!("  Subscriptions: {}", stats.subscriptions);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    #[tokio::test]
    async fn test_status_reports_drift() {
        let (db, tmp) = setup_test_db().await;
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));

        db.upsert_book(&book(1, "a", None)).await.unwrap();
        let stale = cmd_status(&config, &db).await.unwrap();
        assert_eq!(stale.db_stats.books, 1);
        assert_eq!(stale.catalog_drift, 1);
        assert_eq!(stale.schema_version, Some(6));

        db.refresh_catalog().await.unwrap();
        let fresh = cmd_status(&config, &db).await.unwrap();
        assert_eq!(fresh.catalog_drift, 0);
        assert_eq!(fresh.db_stats.catalog_rows, 1);
    }
}
