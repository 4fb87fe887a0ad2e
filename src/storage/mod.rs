//! PDF object storage
//!
//! Books are served straight out of a bucket (or a local directory in
//! development). Both backends implement [`PdfStore`].

mod gcs;
mod local;

pub use gcs::GcsPdfStore;
pub use local::LocalPdfStore;

use crate::config::{Config, StorageBackend};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A stored PDF as shown in listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfObject {
    pub name: String,
    pub size: Option<u64>,
    pub updated: Option<String>,
}

#[async_trait]
pub trait PdfStore: Send + Sync {
    /// List every PDF in the store, sorted by name
    async fn list(&self) -> Result<Vec<PdfObject>>;

    /// Fetch a PDF's bytes; `Ok(None)` when it does not exist
    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>>;

    /// Short description for status output
    fn describe(&self) -> String;
}

/// Build the configured store
pub fn from_config(config: &Config) -> Result<Arc<dyn PdfStore>> {
    match config.storage.backend_kind()? {
        StorageBackend::Local => {
            let dir = config
                .storage
                .local_dir
                .as_deref()
                .ok_or_else(|| Error::Config("storage.local_dir is not set".to_string()))?;
            Ok(Arc::new(LocalPdfStore::new(dir)))
        }
        StorageBackend::Gcs => {
            let bucket = config
                .storage
                .bucket
                .as_deref()
                .ok_or_else(|| Error::Config("storage.bucket is not set".to_string()))?;
            Ok(Arc::new(GcsPdfStore::new(
                &config.storage.api_base,
                bucket,
                config.storage.token(),
            )?))
        }
    }
}

/// Reject names that could escape the store or are not PDFs
pub fn validate_pdf_name(name: &str) -> Result<()> {
    let invalid = |why: &str| Err(Error::InvalidInput(format!("{}: {}", why, name)));

    if name.trim().is_empty() {
        return invalid("empty file name");
    }
    if name.starts_with('/') || name.contains('\\') || name.contains('\0') {
        return invalid("illegal characters in file name");
    }
    if name.split('/').any(|segment| segment == ".." || segment.is_empty()) {
        return invalid("illegal path in file name");
    }
    if !name.to_lowercase().ends_with(".pdf") {
        return invalid("not a PDF file");
    }
    Ok(())
}

const GCS_HOST: &str = "storage.googleapis.com";

/// Object name for a book's `pdf_link`.
///
/// Relative links are object paths already. For URLs into Cloud Storage
/// (`storage.googleapis.com/{bucket}/{name}`, the JSON API media link, or
/// `{bucket}.storage.googleapis.com/{name}`) only the host and bucket prefix
/// are dropped; other URLs keep their whole path. The result still has to
/// pass [`validate_pdf_name`] before it reaches a store.
pub fn object_name_from_link(link: &str) -> Option<String> {
    let link = link.trim();
    let Ok(url) = url::Url::parse(link) else {
        let name = link.trim_start_matches("./").trim_start_matches('/');
        return (!name.is_empty()).then(|| name.to_string());
    };

    let segments = url
        .path_segments()?
        .map(|segment| urlencoding::decode(segment).map(|s| s.into_owned()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .ok()?;

    let object: &[String] = if url.host_str() == Some(GCS_HOST) {
        match segments.as_slice() {
            [storage, v1, b, _bucket, o, rest @ ..]
                if storage == "storage" && v1 == "v1" && b == "b" && o == "o" =>
            {
                rest
            }
            [_bucket, rest @ ..] => rest,
            [] => &[],
        }
    } else {
        &segments
    };

    let name = object.join("/");
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_pdf_name() {
        assert!(validate_pdf_name("10.pdf").is_ok());
        assert!(validate_pdf_name("volumes/10-2.PDF").is_ok());

        for bad in [
            "",
            "../secret.pdf",
            "a/../../b.pdf",
            "/etc/passwd.pdf",
            "dir\\file.pdf",
            "book.txt",
            "a//b.pdf",
        ] {
            assert!(validate_pdf_name(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_object_name_from_link() {
        assert_eq!(object_name_from_link("10.pdf").as_deref(), Some("10.pdf"));
        assert_eq!(object_name_from_link("10/10.pdf").as_deref(), Some("10/10.pdf"));
        assert_eq!(object_name_from_link("/vol/2.pdf").as_deref(), Some("vol/2.pdf"));
        assert_eq!(
            object_name_from_link("https://storage.googleapis.com/books/pdf/10.pdf").as_deref(),
            Some("pdf/10.pdf")
        );
        assert_eq!(
            object_name_from_link(
                "https://storage.googleapis.com/storage/v1/b/books/o/10%2F10.pdf?alt=media"
            )
            .as_deref(),
            Some("10/10.pdf")
        );
        assert_eq!(
            object_name_from_link("https://books.storage.googleapis.com/10/10.pdf").as_deref(),
            Some("10/10.pdf")
        );
        assert_eq!(
            object_name_from_link("https://storage.googleapis.com/%D9%83%D8%AA%D8%A8/%D9%83.pdf")
                .as_deref(),
            Some("ك.pdf")
        );
        assert_eq!(object_name_from_link("  ").as_deref(), None);
        assert_eq!(object_name_from_link("https://storage.googleapis.com/books").as_deref(), None);
    }

    #[test]
    fn test_link_names_still_need_validation() {
        let name = object_name_from_link("../secret.pdf").unwrap();
        assert!(validate_pdf_name(&name).is_err());
    }
}
