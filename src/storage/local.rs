//! Directory-backed PDF store

use super::{validate_pdf_name, PdfObject, PdfStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::debug;
use walkdir::WalkDir;

pub struct LocalPdfStore {
    root: PathBuf,
}

impl LocalPdfStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn scan(root: PathBuf) -> Result<Vec<PdfObject>> {
        let mut objects = Vec::new();
        for entry in WalkDir::new(&root).follow_links(false) {
            let entry = entry.map_err(|e| Error::Storage(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            let name = relative.to_string_lossy().replace('\\', "/");
            if !name.to_lowercase().ends_with(".pdf") {
                continue;
            }

            let metadata = entry.metadata().map_err(|e| Error::Storage(e.to_string()))?;
            let updated = metadata
                .modified()
                .ok()
                .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
            objects.push(PdfObject {
                name,
                size: Some(metadata.len()),
                updated,
            });
        }
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }
}

#[async_trait]
impl PdfStore for LocalPdfStore {
    async fn list(&self) -> Result<Vec<PdfObject>> {
        if !self.root.is_dir() {
            return Err(Error::Storage(format!(
                "PDF directory does not exist: {}",
                self.root.display()
            )));
        }
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || Self::scan(root))
            .await
            .map_err(|e| Error::Other(e.to_string()))?
    }

    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        validate_pdf_name(name)?;
        let path = self.root.join(name);
        debug!("Reading PDF from {:?}", path);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn describe(&self) -> String {
        format!("local directory {}", self.root.display())
    }
}
