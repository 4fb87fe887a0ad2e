//! Google ID token verification
//!
//! Tokens are checked against Google's `tokeninfo` endpoint, which validates
//! the signature and expiry; audience and issuer are checked here.

use crate::config::GoogleConfig;
use crate::db::GoogleProfile;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Turns a bearer credential into a verified identity
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> Result<GoogleProfile>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    sub: String,
    aud: String,
    iss: String,
    #[serde(default)]
    email: Option<String>,
    /// `"true"`/`"false"` from tokeninfo, a bool in some responses
    #[serde(default)]
    email_verified: Option<serde_json::Value>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

pub struct GoogleTokenVerifier {
    client: Client,
    tokeninfo_url: Url,
    client_id: String,
}

impl GoogleTokenVerifier {
    pub fn new(config: &GoogleConfig) -> Result<Self> {
        let tokeninfo_url = Url::parse(&config.tokeninfo_url)?;
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            tokeninfo_url,
            client_id: config.client_id.clone(),
        })
    }
}

#[async_trait]
impl TokenVerifier for GoogleTokenVerifier {
    async fn verify(&self, id_token: &str) -> Result<GoogleProfile> {
        if self.client_id.is_empty() {
            return Err(Error::Config("google.client_id is not set".to_string()));
        }

        let response = self
            .client
            .get(self.tokeninfo_url.clone())
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| Error::from_upstream("Google tokeninfo", e))?;

        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                return Err(Error::Unauthorized("invalid Google ID token".to_string()));
            }
            status if !status.is_success() => {
                return Err(Error::Upstream(format!(
                    "Google tokeninfo returned status {}",
                    status
                )));
            }
            _ => {}
        }

        let info: TokenInfo = response.json().await?;
        if info.aud != self.client_id {
            debug!("Token audience {} does not match client id", info.aud);
            return Err(Error::Unauthorized("token audience mismatch".to_string()));
        }
        if !GOOGLE_ISSUERS.contains(&info.iss.as_str()) {
            return Err(Error::Unauthorized(format!(
                "unexpected token issuer: {}",
                info.iss
            )));
        }
        let email = info
            .email
            .ok_or_else(|| Error::Unauthorized("token carries no email".to_string()))?;
        if !is_true(info.email_verified.as_ref()) {
            debug!("Rejecting token for unverified email {}", email);
            return Err(Error::Unauthorized("email is not verified".to_string()));
        }

        Ok(GoogleProfile {
            google_id: info.sub,
            email,
            name: info.name,
            picture: info.picture,
        })
    }
}

fn is_true(value: Option<&serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
