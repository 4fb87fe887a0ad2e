//! PayPal REST client
//!
//! Only the calls the subscription lifecycle needs: an OAuth client-credentials
//! token, webhook signature verification and subscription cancellation.

use crate::config::PayPalConfig;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Transmission headers PayPal attaches to each webhook delivery
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebhookHeaders {
    pub auth_algo: String,
    pub cert_url: String,
    pub transmission_id: String,
    pub transmission_sig: String,
    pub transmission_time: String,
}

impl WebhookHeaders {
    /// Collect the transmission headers; `None` when any is missing
    pub fn from_header_map(headers: &reqwest::header::HeaderMap) -> Option<Self> {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Some(Self {
            auth_algo: get("paypal-auth-algo")?,
            cert_url: get("paypal-cert-url")?,
            transmission_id: get("paypal-transmission-id")?,
            transmission_sig: get("paypal-transmission-sig")?,
            transmission_time: get("paypal-transmission-time")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Serialize)]
struct VerifySignatureRequest<'a> {
    auth_algo: &'a str,
    cert_url: &'a str,
    transmission_id: &'a str,
    transmission_sig: &'a str,
    transmission_time: &'a str,
    webhook_id: &'a str,
    webhook_event: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct VerifySignatureResponse {
    verification_status: String,
}

#[derive(Debug, Serialize)]
struct CancelRequest<'a> {
    reason: &'a str,
}

pub struct PayPalClient {
    client: Client,
    base_url: Url,
    client_id: String,
    secret: String,
}

impl PayPalClient {
    pub fn new(base_url: &str, client_id: String, secret: String) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            client,
            base_url,
            client_id,
            secret,
        })
    }

    /// Build a client from config; `None` when credentials are not in the environment
    pub fn from_config(config: &PayPalConfig) -> Result<Option<Self>> {
        match config.credentials() {
            Some((id, secret)) => Ok(Some(Self::new(&config.api_base, id, secret)?)),
            None => Ok(None),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Invalid PayPal API URL: {}", e)))
    }

    async fn access_token(&self) -> Result<String> {
        let url = self.endpoint("/v1/oauth2/token")?;
        let response = self
            .client
            .post(url)
            .basic_auth(&self.client_id, Some(&self.secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::PayPal(format!(
                "token request failed with status {}",
                response.status()
            )));
        }
        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }

    /// Ask PayPal whether a webhook delivery is authentic
    pub async fn verify_webhook_signature(
        &self,
        webhook_id: &str,
        headers: &WebhookHeaders,
        event: &serde_json::Value,
    ) -> Result<bool> {
        let token = self.access_token().await?;
        let url = self.endpoint("/v1/notifications/verify-webhook-signature")?;
        let request = VerifySignatureRequest {
            auth_algo: &headers.auth_algo,
            cert_url: &headers.cert_url,
            transmission_id: &headers.transmission_id,
            transmission_sig: &headers.transmission_sig,
            transmission_time: &headers.transmission_time,
            webhook_id,
            webhook_event: event,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Error::PayPal(format!(
                "signature verification failed with status {}",
                response.status()
            )));
        }

        let parsed: VerifySignatureResponse = response.json().await?;
        debug!("Webhook verification status: {}", parsed.verification_status);
        Ok(parsed.verification_status == "SUCCESS")
    }

    /// Cancel a subscription on PayPal's side
    pub async fn cancel_subscription(&self, subscription_id: &str, reason: &str) -> Result<()> {
        let token = self.access_token().await?;
        let url = self.endpoint(&format!(
            "/v1/billing/subscriptions/{}/cancel",
            subscription_id
        ))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&CancelRequest { reason })
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Error::PayPal(format!(
                "cancel of {} failed with status {}",
                subscription_id,
                response.status()
            )))
        }
    }
}
