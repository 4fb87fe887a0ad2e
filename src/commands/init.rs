//! Init command implementation

use crate::config::{Config, PathsConfig, StorageBackend};
use crate::db::Db;
use crate::error::{Error, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub base_dir: PathBuf,
    pub config_path: PathBuf,
    pub force: bool,
}

/// Write a default config file and create the database
pub async fn cmd_init(options: InitOptions) -> Result<Config> {
    let InitOptions {
        base_dir,
        config_path,
        force,
    } = options;

    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Config already exists at {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    let mut config = Config::default();
    config.paths = PathsConfig {
        db_file: base_dir.join("readarabic.db"),
        config_file: config_path,
        base_dir,
    };

    if config.storage.backend_kind()? == StorageBackend::Local && config.storage.local_dir.is_none()
    {
        let pdf_dir = config.paths.base_dir.join("pdfs");
        std::fs::create_dir_all(&pdf_dir)?;
        config.storage.local_dir = Some(pdf_dir.display().to_string());
    }

    config.validate()?;
    config.save()?;

    let db = Db::connect(&config).await?;
    db.migrate().await?;
    info!("Created database at {:?}", config.paths.db_file);

    Ok(config)
}
