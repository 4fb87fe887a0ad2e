//! Turath book metadata client
//!
//! Each book is published as `{base_url}/{id}.json` with a `meta` object
//! describing the catalog entry. Field types vary between books, so
//! parsing is lenient and unknown fields are ignored.

use crate::config::TurathConfig;
use crate::db::Book;
use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// The `meta` block of a Turath book document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TurathMeta {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub book_type: Option<Value>,
    #[serde(default)]
    pub printed: Option<Value>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(default)]
    pub author_id: Option<Value>,
    #[serde(default)]
    pub cat_id: Option<Value>,
    #[serde(default)]
    pub date_built: Option<Value>,
    #[serde(default)]
    pub pdf_links: Option<PdfLinks>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfLinks {
    #[serde(default)]
    pub files: Vec<Value>,
    #[serde(default)]
    pub size: Option<Value>,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default)]
    pub cover: Option<Value>,
}

/// Integer from a JSON number or numeric string
fn as_i64(value: &Option<Value>) -> Option<i64> {
    match value.as_ref()? {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn as_text(value: &Option<Value>) -> Option<String> {
    match value.as_ref()? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl PdfLinks {
    /// First listed file name, taken from either a string or a `{path}` object
    pub fn first_file(&self) -> Option<String> {
        self.files.iter().find_map(|file| match file {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Object(map) => map
                .get("path")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
    }
}

impl TurathMeta {
    /// Convert into a catalog row
    pub fn to_book(&self) -> Book {
        let links = self.pdf_links.clone().unwrap_or_default();
        Book {
            id: self.id,
            name: self.name.trim().to_string(),
            book_type: as_i64(&self.book_type),
            printed: as_i64(&self.printed),
            info: self.info.clone().filter(|i| !i.trim().is_empty()),
            version: as_text(&self.version),
            author_id: as_i64(&self.author_id),
            cat_id: as_i64(&self.cat_id),
            date_built: as_i64(&self.date_built),
            pdf_link: links.first_file(),
            pdf_size: as_i64(&links.size),
            cover_id: as_i64(&links.cover),
        }
    }
}

pub struct TurathClient {
    client: Client,
    base_url: Url,
}

impl TurathClient {
    pub fn new(config: &TurathConfig) -> Result<Self> {
        // trailing slash so join() appends instead of replacing the last segment
        let mut base = config.base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;

        Ok(Self { client, base_url })
    }

    fn book_url(&self, book_id: i64) -> Result<Url> {
        self.base_url
            .join(&format!("{}.json", book_id))
            .map_err(|e| Error::Config(format!("Invalid Turath URL: {}", e)))
    }

    /// Fetch the raw book document; `Ok(None)` when Turath has no such book
    pub async fn fetch_document(&self, book_id: i64) -> Result<Option<Value>> {
        let url = self.book_url(book_id)?;
        debug!("Loading Turath book {} from {}", book_id, url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::from_upstream("Turath", e))?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let document = response
                    .json()
                    .await
                    .map_err(|e| Error::from_upstream("Turath", e))?;
                Ok(Some(document))
            }
            status => {
                warn!("Turath returned status {} for book {}", status, book_id);
                Err(Error::Upstream(format!(
                    "Turath returned status {} for book {}",
                    status, book_id
                )))
            }
        }
    }

    /// Fetch and parse a book's `meta` block
    pub async fn fetch_meta(&self, book_id: i64) -> Result<Option<TurathMeta>> {
        let Some(document) = self.fetch_document(book_id).await? else {
            return Ok(None);
        };
        meta_from_document(&document).map(Some)
    }
}

/// Extract the `meta` block from a book document
pub fn meta_from_document(document: &Value) -> Result<TurathMeta> {
    let meta = document
        .get("meta")
        .cloned()
        .ok_or_else(|| Error::Upstream("Turath document has no meta block".to_string()))?;
    Ok(serde_json::from_value(meta)?)
}
