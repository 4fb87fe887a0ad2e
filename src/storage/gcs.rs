//! Google Cloud Storage PDF store (JSON API)

use super::{validate_pdf_name, PdfObject, PdfStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    items: Vec<ObjectResource>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectResource {
    name: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    updated: Option<String>,
}

pub struct GcsPdfStore {
    client: Client,
    api_base: Url,
    bucket: String,
    token: Option<String>,
}

impl GcsPdfStore {
    pub fn new(api_base: &str, bucket: &str, token: Option<String>) -> Result<Self> {
        let api_base = Url::parse(api_base)?;
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            api_base,
            bucket: bucket.to_string(),
            token,
        })
    }

    /// URL for the object collection, or one object when `name` is given
    fn objects_url(&self, name: Option<&str>) -> Result<Url> {
        let mut url = self.api_base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::Config("storage.api_base cannot be a base URL".to_string()))?;
            segments
                .pop_if_empty()
                .extend(["storage", "v1", "b", &self.bucket, "o"]);
            if let Some(name) = name {
                // object names may contain '/', which must stay encoded
                segments.push(name);
            }
        }
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

#[async_trait]
impl PdfStore for GcsPdfStore {
    async fn list(&self) -> Result<Vec<PdfObject>> {
        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut url = self.objects_url(None)?;
            url.query_pairs_mut()
                .append_pair("fields", "items(name,size,updated),nextPageToken");
            if let Some(token) = &page_token {
                url.query_pairs_mut().append_pair("pageToken", token);
            }

            let response = self.authorized(self.client.get(url)).send().await?;
            if !response.status().is_success() {
                return Err(Error::Storage(format!(
                    "listing bucket {} failed with status {}",
                    self.bucket,
                    response.status()
                )));
            }
            let page: ListResponse = response.json().await?;

            objects.extend(
                page.items
                    .into_iter()
                    .filter(|o| o.name.to_lowercase().ends_with(".pdf"))
                    .map(|o| PdfObject {
                        name: o.name,
                        size: o.size.and_then(|s| s.parse().ok()),
                        updated: o.updated,
                    }),
            );

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>> {
        validate_pdf_name(name)?;
        let mut url = self.objects_url(Some(name))?;
        url.query_pairs_mut().append_pair("alt", "media");
        debug!("Fetching PDF from {}", url);

        let response = self.authorized(self.client.get(url)).send().await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => Ok(Some(response.bytes().await?.to_vec())),
            status => Err(Error::Storage(format!(
                "fetching {} failed with status {}",
                name, status
            ))),
        }
    }

    fn describe(&self) -> String {
        format!("gcs bucket {}", self.bucket)
    }
}
