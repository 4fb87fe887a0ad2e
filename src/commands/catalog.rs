//! Category import and listing refresh

use crate::db::{Category, Db, RefreshReport};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportStats {
    pub file: String,
    pub imported: usize,
}

/// Upsert categories from a JSON array of `{cat_id, category_name}`
pub async fn cmd_import_categories(db: &Db, path: &Path) -> Result<ImportStats> {
    let content = std::fs::read_to_string(path)?;
    let categories: Vec<Category> = serde_json::from_str(&content)?;

    if let Some(bad) = categories.iter().find(|c| c.category_name.trim().is_empty()) {
        return Err(Error::InvalidInput(format!(
            "category {} has an empty name",
            bad.cat_id
        )));
    }

    for category in &categories {
        db.upsert_category(&Category {
            cat_id: category.cat_id,
            category_name: category.category_name.trim().to_string(),
        })
        .await?;
    }

    info!("Imported {} categories from {:?}", categories.len(), path);
    Ok(ImportStats {
        file: path.display().to_string(),
        imported: categories.len(),
    })
}

/// Rebuild `books_with_categories`
pub async fn cmd_refresh_catalog(db: &Db) -> Result<RefreshReport> {
    db.refresh_catalog().await
}

pub fn print_import_stats(stats: &ImportStats) {
    println!("✓ Imported {} categories from {}", stats.imported, stats.file);
}

pub fn print_refresh_report(report: &RefreshReport) {
    println!("✓ Catalog refreshed");
    println!("  Rows: {}", report.rows);
    println!("  At: {}", report.refreshed_at);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_import_then_refresh() {
        let (db, _db_tmp) = setup_test_db().await;
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("categories.json");
        std::fs::write(
            &file,
            r#"[{"cat_id": 1, "category_name": " العقيدة "}, {"cat_id": 2, "category_name": "الفقه"}]"#,
        )
        .unwrap();

        let stats = cmd_import_categories(&db, &file).await.unwrap();
        assert_eq!(stats.imported, 2);
        assert_eq!(db.list_categories().await.unwrap()[0].category_name, "العقيدة");

        db.upsert_book(&book(5, "كتاب", Some(2))).await.unwrap();
        let report = cmd_refresh_catalog(&db).await.unwrap();
        assert_eq!(report.rows, 1);
        let entry = db.get_catalog_entry(5).await.unwrap().unwrap();
        assert_eq!(entry.category_name.as_deref(), Some("الفقه"));
    }

    #[tokio::test]
    async fn test_import_rejects_blank_names() {
        let (db, _db_tmp) = setup_test_db().await;
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("categories.json");
        std::fs::write(&file, r#"[{"cat_id": 1, "category_name": "  "}]"#).unwrap();

        assert!(matches!(
            cmd_import_categories(&db, &file).await,
            Err(Error::InvalidInput(_))
        ));
        assert!(db.list_categories().await.unwrap().is_empty());
    }
}
