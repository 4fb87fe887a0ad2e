//! Author backfill
//!
//! Book metadata carries the author only inside a free-text `info` field,
//! as a line of the form `المؤلف: <name>`. The backfill pulls that line out
//! for every book with an `author_id` and seeds the `authors` table.

use crate::db::{AuthorWrite, Db};
use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Label preceding the author's name in book info text
pub const AUTHOR_LABEL: &str = "المؤلف:";

fn author_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!("{}([^\n]*)", regex::escape(AUTHOR_LABEL)))
            .expect("author label pattern is valid")
    })
}

/// Extract the trimmed text after the author label, up to the next newline.
///
/// Returns `None` when the label is absent or nothing but whitespace follows it.
pub fn extract_author_name(info: &str) -> Option<String> {
    let captures = author_pattern().captures(info)?;
    let name = captures.get(1)?.as_str().trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// What to do when an `author_id` already has a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictPolicy {
    /// Leave the existing row untouched
    #[default]
    Skip,
    /// Replace the existing name
    Overwrite,
}

/// Backfill summary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackfillReport {
    pub books_scanned: usize,
    pub authors_inserted: usize,
    pub authors_updated: usize,
    pub unchanged: usize,
    pub skipped_no_label: usize,
}

/// Seed `authors` from book info text
pub async fn backfill_authors(db: &Db, policy: ConflictPolicy) -> Result<BackfillReport> {
    let sources = db.author_sources().await?;
    let mut report = BackfillReport {
        books_scanned: sources.len(),
        ..Default::default()
    };

    let mut names = Vec::with_capacity(sources.len());
    for source in &sources {
        match extract_author_name(&source.info) {
            Some(name) => names.push((source.author_id, name)),
            None => {
                warn!("Book {} has no author label", source.book_id);
                report.skipped_no_label += 1;
            }
        }
    }

    let outcomes = db
        .write_author_names(&names, policy == ConflictPolicy::Overwrite)
        .await?;

    for outcome in outcomes {
        match outcome {
            AuthorWrite::Inserted => report.authors_inserted += 1,
            AuthorWrite::Updated => report.authors_updated += 1,
            AuthorWrite::Unchanged => report.unchanged += 1,
        }
    }

    info!(
        "Author backfill: {} books, {} inserted, {} updated, {} unchanged, {} without label",
        report.books_scanned,
        report.authors_inserted,
        report.authors_updated,
        report.unchanged,
        report.skipped_no_label
    );
    Ok(report)
}

/// Print backfill summary to console
pub fn print_backfill_report(report: &BackfillReport) {
    println!("\n✓ Author backfill complete");
    println!("  Books scanned: {}", report.books_scanned);
    println!("  Authors inserted: {}", report.authors_inserted);
    println!("  Authors updated: {}", report.authors_updated);
    println!("  Unchanged: {}", report.unchanged);
    println!("  Without author label: {}", report.skipped_no_label);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;

    #[test]
    fn test_extract_author_name() {
        let info = "الكتاب: المغني\nالمؤلف:  ابن قدامة المقدسي \nالناشر: مكتبة القاهرة";
        assert_eq!(
            extract_author_name(info).as_deref(),
            Some("ابن قدامة المقدسي")
        );
    }

    #[test]
    fn test_extract_handles_crlf_and_end_of_text() {
        assert_eq!(
            extract_author_name("المؤلف: النووي\r\nالناشر: دار").as_deref(),
            Some("النووي")
        );
        assert_eq!(
            extract_author_name("المؤلف: ابن تيمية").as_deref(),
            Some("ابن تيمية")
        );
    }

    #[test]
    fn test_extract_rejects_missing_or_empty() {
        assert_eq!(extract_author_name("الكتاب: بلا مؤلف"), None);
        assert_eq!(extract_author_name("المؤلف:   \nالناشر: دار"), None);
        assert_eq!(extract_author_name(""), None);
    }

    async fn seed_books(db: &Db) -> Vec<crate::db::Book> {
        let mut books = Vec::new();
        let rows = [
            (1, Some(100), Some("الكتاب: أ\nالمؤلف: ابن قدامة\n")),
            (2, Some(100), Some("المؤلف: موفق الدين ابن قدامة")),
            (3, Some(200), Some("المؤلف:\nلا اسم")),
            (4, Some(300), Some("بدون تسمية")),
            (5, None, Some("المؤلف: مجهول")),
            (6, Some(400), None),
            (7, Some(500), Some("المؤلف: النووي \nالمحقق: فلان")),
        ];
        for (id, author_id, info) in rows {
            let mut b = book(id, &format!("book {}", id), None);
            b.author_id = author_id;
            b.info = info.map(str::to_string);
            db.upsert_book(&b).await.unwrap();
            books.push(b);
        }
        books
    }

    #[tokio::test]
    async fn test_backfill_inserts_trimmed_names() {
        let (db, _tmp) = setup_test_db().await;
        let books = seed_books(&db).await;

        let report = backfill_authors(&db, ConflictPolicy::Skip).await.unwrap();
        assert_eq!(report.books_scanned, 5);
        assert_eq!(report.authors_inserted, 2);
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.skipped_no_label, 2);

        for author_id in [100, 500] {
            let author = db.get_author(author_id).await.unwrap().unwrap();
            assert!(!author.author_name.is_empty());
            let matches_source = books.iter().any(|b| {
                b.author_id == Some(author_id)
                    && b.info.as_deref().and_then(extract_author_name).as_deref()
                        == Some(author.author_name.as_str())
            });
            assert!(matches_source, "author {} has no source row", author_id);
        }
        assert_eq!(db.get_author(100).await.unwrap().unwrap().author_name, "ابن قدامة");
        assert!(db.get_author(200).await.unwrap().is_none());
        assert!(db.get_author(300).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_backfill_is_idempotent() {
        let (db, _tmp) = setup_test_db().await;
        seed_books(&db).await;

        backfill_authors(&db, ConflictPolicy::Skip).await.unwrap();
        let again = backfill_authors(&db, ConflictPolicy::Skip).await.unwrap();
        assert_eq!(again.authors_inserted, 0);
        assert_eq!(again.authors_updated, 0);
        assert_eq!(again.unchanged, 3);
        assert_eq!(db.get_stats().await.unwrap().authors, 2);
    }

    #[tokio::test]
    async fn test_overwrite_policy_replaces_names() {
        let (db, _tmp) = setup_test_db().await;
        seed_books(&db).await;

        let report = backfill_authors(&db, ConflictPolicy::Overwrite).await.unwrap();
        assert_eq!(report.authors_inserted, 2);
        assert_eq!(report.authors_updated, 1);
        assert_eq!(
            db.get_author(100).await.unwrap().unwrap().author_name,
            "موفق الدين ابن قدامة"
        );
    }
}
