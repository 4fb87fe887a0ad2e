//! readarabic CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use readarabic::{
    backfill::{backfill_authors, print_backfill_report, ConflictPolicy},
    commands::{
        cmd_import_categories, cmd_ingest, cmd_init, cmd_migrate, cmd_refresh_catalog, cmd_serve,
        cmd_status, print_import_stats, print_ingest_stats, print_migrate_report,
        print_refresh_report, print_status, IngestOptions, InitOptions,
    },
    config::Config,
    db::Db,
    error::Result,
    progress::LogWriterFactory,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "readarabic")]
#[command(version, about = "Arabic book catalog, reader data and PDF API", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "READARABIC_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON (log lines included)
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the database
    Init {
        /// Force overwrite existing config
        #[arg(long)]
        force: bool,
    },

    /// Apply pending database migrations
    Migrate,

    /// Run the HTTP API
    Serve {
        /// Address to bind (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Fetch book metadata from Turath into the catalog
    Ingest {
        /// Turath book ids
        #[arg(required = true)]
        book_ids: Vec<i64>,

        /// Concurrent fetches
        #[arg(long, default_value = "4")]
        concurrency: usize,

        /// Skip rebuilding the catalog listing afterwards
        #[arg(long)]
        no_refresh: bool,
    },

    /// Manage book categories
    Categories {
        #[command(subcommand)]
        action: CategoryAction,
    },

    /// Seed the authors table from book info text
    BackfillAuthors {
        /// Replace names of authors that already exist
        #[arg(long)]
        overwrite: bool,
    },

    /// Rebuild the books_with_categories listing
    RefreshCatalog,

    /// Show system status
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum CategoryAction {
    /// Upsert categories from a JSON array of {cat_id, category_name}
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let text_layer = (!cli.json).then(|| fmt::layer().with_writer(LogWriterFactory));
    let json_layer = cli
        .json
        .then(|| fmt::layer().json().with_writer(LogWriterFactory));

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(filter)
        .init();

    // Init does not need an existing config
    if let Commands::Init { force } = cli.command {
        return handle_init(cli.config, force).await;
    }

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "readarabic", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(cli.config.as_deref())?;

    if let Commands::Serve { host, port } = cli.command {
        return cmd_serve(&config, host, port).await;
    }

    let db = Db::connect(&config).await?;

    match cli.command {
        Commands::Init { .. } | Commands::Completions { .. } | Commands::Serve { .. } => {
            unreachable!()
        }

        Commands::Migrate => {
            let report = cmd_migrate(&db).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_migrate_report(&report);
            }
        }

        Commands::Ingest {
            book_ids,
            concurrency,
            no_refresh,
        } => {
            db.migrate().await?;
            let options = IngestOptions {
                book_ids,
                concurrency,
                refresh: !no_refresh,
            };
            let stats = cmd_ingest(&config, &db, options).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_ingest_stats(&stats);
            }
        }

        Commands::Categories {
            action: CategoryAction::Import { file },
        } => {
            db.migrate().await?;
            let stats = cmd_import_categories(&db, &file).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print_import_stats(&stats);
            }
        }

        Commands::BackfillAuthors { overwrite } => {
            db.migrate().await?;
            let policy = if overwrite {
                ConflictPolicy::Overwrite
            } else {
                ConflictPolicy::Skip
            };
            let report = backfill_authors(&db, policy).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_backfill_report(&report);
            }
        }

        Commands::RefreshCatalog => {
            db.migrate().await?;
            let report = cmd_refresh_catalog(&db).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_refresh_report(&report);
            }
        }

        Commands::Status => {
            db.migrate().await?;
            let status = cmd_status(&config, &db).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
    }

    Ok(())
}

async fn handle_init(config_arg: Option<PathBuf>, force: bool) -> Result<()> {
    // A .toml path names the file itself; anything else is a directory
    let (base_dir, config_path) = match config_arg {
        Some(path) if path.extension().map_or(false, |e| e == "toml") => {
            let base = path
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(Config::default_base_dir);
            (base, path)
        }
        Some(dir) => (dir.clone(), dir.join("config.toml")),
        None => {
            let base = Config::default_base_dir();
            (base.clone(), base.join("config.toml"))
        }
    };

    let config = cmd_init(InitOptions {
        base_dir,
        config_path,
        force,
    })
    .await?;

    println!("✓ readarabic initialized successfully");
    println!("  Config: {}", config.paths.config_file.display());
    println!("  Database: {}", config.paths.db_file.display());
    if let Some(dir) = &config.storage.local_dir {
        println!("  PDF directory: {}", dir);
    }
    println!("\nNext steps:");
    println!("  1. Set GOOGLE_CLIENT_ID and the PayPal credentials in the environment");
    println!("  2. Import categories: readarabic categories import categories.json");
    println!("  3. Ingest books: readarabic ingest 10 11 12");
    println!("  4. Start the API: readarabic serve");

    Ok(())
}

fn load_config(path: Option<&std::path::Path>) -> Result<Config> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(Config::default_config_path);

    if !config_path.exists() {
        eprintln!(
            "Config file not found: {}\nRun 'readarabic init' first.",
            config_path.display()
        );
        std::process::exit(1);
    }

    Config::load(&config_path)
}
