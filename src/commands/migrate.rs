//! Migrate command implementation

use crate::db::Db;
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrateReport {
    pub applied_now: Vec<i64>,
    pub current_version: Option<i64>,
}

/// Apply pending migrations and report which ran
pub async fn cmd_migrate(db: &Db) -> Result<MigrateReport> {
    let before = db.applied_migrations().await?;
    db.migrate().await?;
    let after = db.applied_migrations().await?;

    Ok(MigrateReport {
        applied_now: after
            .iter()
            .copied()
            .filter(|v| !before.contains(v))
            .collect(),
        current_version: after.last().copied(),
    })
}

pub fn print_migrate_report(report: &MigrateReport) {
    if report.applied_now.is_empty() {
        println!("✓ Database is up to date");
    } else {
        println!("✓ Applied {} migration(s)", report.applied_now.len());
        for version in &report.applied_now {
            println!("  - {:04}", version);
        }
    }
    if let Some(version) = report.current_version {
        println!("  Schema version: {}", version);
    }
}
