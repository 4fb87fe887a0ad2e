//! Default values for configuration

/// Default bind address
pub fn default_server_host() -> String {
    std::env::var("READARABIC_HOST").unwrap_or_else(|_| "0.0.0.0".to_string())
}

/// Default port (same as the original Flask service)
pub fn default_server_port() -> u16 {
    std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(5000)
}

/// Default maximum pooled SQLite connections
pub fn default_db_max_connections() -> u32 {
    5
}

/// Default storage backend kind
pub fn default_storage_backend() -> String {
    "local".to_string()
}

/// Default local PDF directory
pub fn default_storage_local_dir() -> Option<String> {
    std::env::var("READARABIC_PDF_DIR").ok()
}

/// Default bucket name
pub fn default_storage_bucket() -> Option<String> {
    std::env::var("GCS_BUCKET_NAME").ok()
}

/// Default Cloud Storage API base URL
pub fn default_storage_api_base() -> String {
    "https://storage.googleapis.com".to_string()
}

/// Default environment variable holding the storage bearer token
pub fn default_storage_token_env() -> String {
    "GCS_ACCESS_TOKEN".to_string()
}

/// Default Google OAuth client id
pub fn default_google_client_id() -> String {
    std::env::var("GOOGLE_CLIENT_ID").unwrap_or_default()
}

/// Default Google tokeninfo endpoint
pub fn default_google_tokeninfo_url() -> String {
    "https://oauth2.googleapis.com/tokeninfo".to_string()
}

/// Default PayPal REST base URL (sandbox)
pub fn default_paypal_api_base() -> String {
    std::env::var("PAYPAL_API_BASE")
        .unwrap_or_else(|_| "https://api-m.sandbox.paypal.com".to_string())
}

/// Default environment variable holding the PayPal client id
pub fn default_paypal_client_id_env() -> String {
    "PAYPAL_CLIENT_ID".to_string()
}

/// Default environment variable holding the PayPal client secret
pub fn default_paypal_secret_env() -> String {
    "PAYPAL_CLIENT_SECRET".to_string()
}

/// Default PayPal webhook id
pub fn default_paypal_webhook_id() -> Option<String> {
    std::env::var("PAYPAL_WEBHOOK_ID").ok()
}

/// Default Turath book JSON base URL
pub fn default_turath_base_url() -> String {
    "https://files.turath.io/books-v3-unobfus".to_string()
}

/// Default dictionary lookup base URL (AraTools)
pub fn default_dictionary_base_url() -> String {
    "https://aratools.com/api/v1/dictionary/lookup/ar".to_string()
}

/// Default dictionary timeout in seconds
pub fn default_dictionary_timeout() -> u64 {
    5
}

/// Default upstream request timeout in seconds
pub fn default_http_timeout() -> u64 {
    30
}

/// Default user agent for outbound requests
pub fn default_user_agent() -> String {
    format!("readarabic/{}", env!("CARGO_PKG_VERSION"))
}

/// Default browser-like user agent for dictionary lookups
pub fn default_dictionary_user_agent() -> String {
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}
