//! AraTools dictionary lookups

use crate::config::DictionaryConfig;
use crate::error::{Error, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub struct DictionaryClient {
    client: Client,
    base_url: Url,
}

impl DictionaryClient {
    pub fn new(config: &DictionaryConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()?;
        Ok(Self { client, base_url })
    }

    fn lookup_url(&self, word: &str) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config("dictionary.base_url cannot be a base URL".to_string()))?
            .pop_if_empty()
            .push(word);
        Ok(url)
    }

    /// Look up a word; the AraTools payload is passed through unchanged
    pub async fn lookup(&self, word: &str) -> Result<Value> {
        let word = word.trim();
        if word.is_empty() {
            return Err(Error::InvalidInput("empty word".to_string()));
        }

        let url = self.lookup_url(word)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::from_upstream("AraTools", e))?;

        let data: Value = response
            .json()
            .await
            .map_err(|e| Error::from_upstream("AraTools", e))?;

        let found = data
            .get("words")
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        debug!("AraTools returned {} entries for {}", found, word);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, timeout_secs: u64) -> DictionaryClient {
        DictionaryClient::new(&DictionaryConfig {
            base_url: format!("{}/api/v1/dictionary/lookup/ar", server.uri()),
            timeout_secs,
            user_agent: "Mozilla/5.0 test".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_lookup_passes_payload_through() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/dictionary/lookup/ar/%D9%83%D8%AA%D8%A8"))
            .and(header("user-agent", "Mozilla/5.0 test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "words": [{"voc_form": "كَتَبَ", "nice_gloss": "to write", "root": "كتب"}]
            })))
            .mount(&server)
            .await;

        let data = client(&server, 5).lookup("كتب").await.unwrap();
        assert_eq!(data["words"][0]["nice_gloss"], "to write");
    }

    #[tokio::test]
    async fn test_timeout_is_distinct() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"words": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let err = client(&server, 1).lookup("x").await.unwrap_err();
        assert!(matches!(err, Error::UpstreamTimeout(_)));
    }

    #[tokio::test]
    async fn test_upstream_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client(&server, 5).lookup("x").await.unwrap_err();
        assert!(matches!(err, Error::Upstream(_)));
    }
}
