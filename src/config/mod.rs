//! Configuration management for readarabic
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! Secrets stay in the environment; the file only names the variables.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// PDF object storage
    #[serde(default)]
    pub storage: StorageConfig,

    /// Google sign-in
    #[serde(default)]
    pub google: GoogleConfig,

    /// PayPal subscriptions
    #[serde(default)]
    pub paypal: PayPalConfig,

    /// Turath catalog source
    #[serde(default)]
    pub turath: TurathConfig,

    /// Dictionary lookups
    #[serde(default)]
    pub dictionary: DictionaryConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Allowed frontend origins (empty = any origin)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_max_connections")]
    pub max_connections: u32,
}

/// Storage backend kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Local,
    Gcs,
}

impl std::str::FromStr for StorageBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" | "fs" => Ok(StorageBackend::Local),
            "gcs" | "google" => Ok(StorageBackend::Gcs),
            _ => Err(Error::Config(format!("Unknown storage backend: {}", s))),
        }
    }
}

/// PDF object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `local` or `gcs`
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Directory holding PDFs (local backend)
    #[serde(default = "default_storage_local_dir")]
    pub local_dir: Option<String>,

    /// Bucket name (gcs backend)
    #[serde(default = "default_storage_bucket")]
    pub bucket: Option<String>,

    #[serde(default = "default_storage_api_base")]
    pub api_base: String,

    /// Environment variable name for the bucket bearer token
    #[serde(default = "default_storage_token_env")]
    pub token_env: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoogleConfig {
    /// OAuth client id shared with the frontend
    #[serde(default = "default_google_client_id")]
    pub client_id: String,

    #[serde(default = "default_google_tokeninfo_url")]
    pub tokeninfo_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayPalConfig {
    #[serde(default = "default_paypal_api_base")]
    pub api_base: String,

    /// Environment variable name for the REST client id
    #[serde(default = "default_paypal_client_id_env")]
    pub client_id_env: String,

    /// Environment variable name for the REST client secret
    #[serde(default = "default_paypal_secret_env")]
    pub secret_env: String,

    /// Webhook id used for signature verification; unset disables verification
    #[serde(default = "default_paypal_webhook_id")]
    pub webhook_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurathConfig {
    #[serde(default = "default_turath_base_url")]
    pub base_url: String,

    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionaryConfig {
    #[serde(default = "default_dictionary_base_url")]
    pub base_url: String,

    #[serde(default = "default_dictionary_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_dictionary_user_agent")]
    pub user_agent: String,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for readarabic data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            max_connections: default_db_max_connections(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            local_dir: default_storage_local_dir(),
            bucket: default_storage_bucket(),
            api_base: default_storage_api_base(),
            token_env: default_storage_token_env(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_id: default_google_client_id(),
            tokeninfo_url: default_google_tokeninfo_url(),
        }
    }
}

impl Default for PayPalConfig {
    fn default() -> Self {
        Self {
            api_base: default_paypal_api_base(),
            client_id_env: default_paypal_client_id_env(),
            secret_env: default_paypal_secret_env(),
            webhook_id: default_paypal_webhook_id(),
        }
    }
}

impl Default for TurathConfig {
    fn default() -> Self {
        Self {
            base_url: default_turath_base_url(),
            timeout_secs: default_http_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for DictionaryConfig {
    fn default() -> Self {
        Self {
            base_url: default_dictionary_base_url(),
            timeout_secs: default_dictionary_timeout(),
            user_agent: default_dictionary_user_agent(),
        }
    }
}

impl StorageConfig {
    pub fn backend_kind(&self) -> Result<StorageBackend> {
        self.backend.parse()
    }

    /// Read the bucket token from the environment
    pub fn token(&self) -> Option<String> {
        std::env::var(&self.token_env).ok().filter(|t| !t.is_empty())
    }
}

impl PayPalConfig {
    /// REST credentials from the environment, if both are set
    pub fn credentials(&self) -> Option<(String, String)> {
        let id = std::env::var(&self.client_id_env).ok()?;
        let secret = std::env::var(&self.secret_env).ok()?;
        if id.is_empty() || secret.is_empty() {
            return None;
        }
        Some((id, secret))
    }
}

impl Config {
    /// Get the default base directory (~/.readarabic)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".readarabic")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Initialize paths configuration
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = PathsConfig {
            config_file: base.join("config.toml"),
            db_file: base.join("readarabic.db"),
            base_dir: base,
        };
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = PathsConfig {
            config_file: config_path.to_path_buf(),
            db_file: base.join("readarabic.db"),
            base_dir: base,
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Config("server.port must be non-zero".to_string()));
        }

        if self.database.max_connections == 0 {
            return Err(Error::Config(
                "database.max_connections must be at least 1".to_string(),
            ));
        }

        match self.storage.backend_kind()? {
            StorageBackend::Local => {
                if self.storage.local_dir.as_deref().map_or(true, str::is_empty) {
                    return Err(Error::Config(
                        "storage.local_dir is required for the local backend".to_string(),
                    ));
                }
            }
            StorageBackend::Gcs => {
                if self.storage.bucket.as_deref().map_or(true, str::is_empty) {
                    return Err(Error::Config(
                        "storage.bucket is required for the gcs backend".to_string(),
                    ));
                }
            }
        }

        if self.dictionary.timeout_secs == 0 {
            return Err(Error::Config(
                "dictionary.timeout_secs must be non-zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.storage.backend = "local".to_string();
        config.storage.local_dir = Some("/srv/pdfs".to_string());
        config
    }

    #[test]
    fn test_default_sections() {
        let config = Config::default();
        assert_eq!(config.storage.api_base, "https://storage.googleapis.com");
        assert_eq!(
            config.turath.base_url,
            "https://files.turath.io/books-v3-unobfus"
        );
        assert_eq!(config.dictionary.timeout_secs, 5);
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = valid_config();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.server.cors_origins = vec!["http://localhost:3000".to_string()];

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load(&config.paths.config_file).unwrap();
        assert_eq!(loaded.server.cors_origins, vec!["http://localhost:3000"]);
        assert_eq!(loaded.paths.db_file, tmp.path().join("readarabic.db"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "[storage]\nbackend = \"gcs\"\nbucket = \"arabic-books\"\n",
        )
        .unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.storage.backend_kind().unwrap(), StorageBackend::Gcs);
        assert_eq!(loaded.storage.bucket.as_deref(), Some("arabic-books"));
        assert_eq!(loaded.storage.token_env, "GCS_ACCESS_TOKEN");
    }

    #[test]
    fn test_config_validation() {
        let mut config = valid_config();

        config.storage.backend = "s3".to_string();
        assert!(config.validate().is_err());

        config.storage.backend = "gcs".to_string();
        config.storage.bucket = None;
        assert!(config.validate().is_err());

        config.storage.bucket = Some("books".to_string());
        assert!(config.validate().is_ok());

        config.dictionary.timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
