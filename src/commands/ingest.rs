//! Ingest command implementation
//!
//! Pulls book metadata from Turath and upserts it into `books_metadata`.
//! Fetches run concurrently; database writes happen one at a time as
//! results arrive.

use crate::config::Config;
use crate::db::{Db, RefreshReport};
use crate::error::{Error, Result};
use crate::progress;
use crate::turath::{TurathClient, TurathMeta};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub book_ids: Vec<i64>,
    pub concurrency: usize,
    /// Rebuild `books_with_categories` once all books are written
    pub refresh: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestFailure {
    pub book_id: i64,
    pub error: String,
}

/// Statistics from an ingest run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestStats {
    pub requested: usize,
    pub ingested: usize,
    pub missing: Vec<i64>,
    pub failed: Vec<IngestFailure>,
    pub refreshed: Option<RefreshReport>,
}

/// Ingest books using the configured Turath endpoint
pub async fn cmd_ingest(config: &Config, db: &Db, options: IngestOptions) -> Result<IngestStats> {
    let client = TurathClient::new(&config.turath)?;
    ingest_books(db, &client, options).await
}

pub async fn ingest_books(
    db: &Db,
    client: &TurathClient,
    options: IngestOptions,
) -> Result<IngestStats> {
    let mut ids = options.book_ids;
    ids.sort_unstable();
    ids.dedup();

    info!("Ingesting {} book(s) from Turath", ids.len());
    let mut stats = IngestStats {
        requested: ids.len(),
        ..Default::default()
    };

    let bar = progress::counter(ids.len(), "Fetching books");
    let mut fetches = stream::iter(ids)
        .map(|id| async move { (id, client.fetch_meta(id).await) })
        .buffer_unordered(options.concurrency.max(1));

    while let Some((id, fetched)) = fetches.next().await {
        match fetched {
            Ok(Some(meta)) => match store_book(db, &meta).await {
                Ok(()) => stats.ingested += 1,
                Err(e) => {
                    warn!("Could not store book {}: {}", id, e);
                    stats.failed.push(IngestFailure {
                        book_id: id,
                        error: e.to_string(),
                    });
                }
            },
            Ok(None) => {
                warn!("Turath has no book {}", id);
                stats.missing.push(id);
            }
            Err(e) => {
                warn!("Could not fetch book {}: {}", id, e);
                stats.failed.push(IngestFailure {
                    book_id: id,
                    error: e.to_string(),
                });
            }
        }
        progress::tick(&bar);
    }
    progress::finish(bar, "Books fetched");

    stats.missing.sort_unstable();
    stats.failed.sort_by_key(|f| f.book_id);

    if options.refresh && stats.ingested > 0 {
        stats.refreshed = Some(db.refresh_catalog().await?);
    }

    Ok(stats)
}

async fn store_book(db: &Db, meta: &TurathMeta) -> Result<()> {
    let book = meta.to_book();
    debug!("Upserting book {} ({})", book.id, book.name);
    match db.upsert_book(&book).await {
        Err(e) if e.is_foreign_key_violation() => Err(Error::InvalidInput(format!(
            "category {} is not imported",
            book.cat_id.unwrap_or_default()
        ))),
        other => other,
    }
}

/// Print ingest stats to console
pub fn print_ingest_stats(stats: &IngestStats) {
    println!("\n✓ Ingest complete");
    println!("  Requested: {}", stats.requested);
    println!("  Ingested: {}", stats.ingested);
    if !stats.missing.is_empty() {
        let ids: Vec<String> = stats.missing.iter().map(i64::to_string).collect();
        println!("  Not on Turath: {}", ids.join(", "));
    }
    if !stats.failed.is_empty() {
        println!("\nFailures:");
        for failure in &stats.failed {
            println!("- {}: {}", failure.book_id, failure.error);
        }
    }
    if let Some(refresh) = &stats.refreshed {
        println!("\nCatalog refreshed: {} rows", refresh.rows);
    }
}
