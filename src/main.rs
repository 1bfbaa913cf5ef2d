use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::mpsc;

use tnews::api::NewsClient;
use tnews::app::{App, AppEvent};
use tnews::config::Config;
use tnews::storage::{BookmarkStore, Database, DatabaseError};
use tnews::syndication::{self, SiteInfo};

/// Get the config directory path (~/.config/tnews/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("tnews");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(name = "tnews", about = "Terminal client for ThinkingNews")]
struct Args {
    /// API base URL (overrides config.toml)
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Reset local storage (delete and recreate)
    #[arg(long)]
    reset_db: bool,

    /// Write the RSS feed to FILE and exit
    #[arg(long, value_name = "FILE")]
    export_rss: Option<PathBuf>,

    /// Write the sitemap to FILE and exit
    #[arg(long, value_name = "FILE")]
    export_sitemap: Option<PathBuf>,

    /// Print the JSON-LD document for an article and exit
    #[arg(long, value_name = "ID")]
    json_ld: Option<String>,

    /// Remove all bookmarks and exit
    #[arg(long)]
    clear_bookmarks: bool,
}

impl Args {
    fn is_one_shot(&self) -> bool {
        self.export_rss.is_some()
            || self.export_sitemap.is_some()
            || self.json_ld.is_some()
            || self.clear_bookmarks
    }
}

/// Route tracing output to `tnews.log`; the TUI owns stdout.
fn init_tracing(config_dir: &Path) {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let log_path = config_dir.join("tnews.log");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        Err(_) => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::sink)
                .init();
        }
    }
}

/// Create the config directory with user-only permissions.
fn ensure_config_dir(config_dir: &Path) -> Result<()> {
    if !config_dir.exists() {
        std::fs::create_dir_all(config_dir).context("Failed to create config directory")?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }
    Ok(())
}

/// Runs the export/maintenance flags. Returns once every requested action
/// has completed.
async fn run_one_shot(args: &Args, config: &Config, client: &NewsClient, db: Database) -> Result<()> {
    let site = SiteInfo::new(&config.site_url, config.site_name.as_str())
        .context("Invalid site_url in config")?;

    if let Some(path) = &args.export_rss {
        let xml = syndication::build_rss(client, &site, Utc::now())
            .await
            .context("Failed to build RSS feed")?;
        syndication::write_atomically(path, &xml)?;
        println!("Wrote RSS feed to {}", path.display());
    }

    if let Some(path) = &args.export_sitemap {
        let xml = syndication::build_sitemap(client, &site, Utc::now())
            .await
            .context("Failed to build sitemap")?;
        syndication::write_atomically(path, &xml)?;
        println!("Wrote sitemap to {}", path.display());
    }

    if let Some(id) = &args.json_ld {
        let json = syndication::build_json_ld(client, &site, id)
            .await
            .with_context(|| format!("Failed to build JSON-LD for article '{id}'"))?;
        println!("{json}");
    }

    if args.clear_bookmarks {
        let mut bookmarks = BookmarkStore::load(db).await;
        let removed = bookmarks
            .clear()
            .await
            .context("Failed to clear bookmarks")?;
        println!("Removed {removed} bookmarks.");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_dir = get_config_dir()?;
    ensure_config_dir(&config_dir)?;
    init_tracing(&config_dir);

    let mut config = match Config::load(&config_dir.join("config.toml")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if let Some(api_url) = &args.api_url {
        config.api_url = api_url.clone();
    }

    let db_path = config_dir.join("tnews.db");
    if args.reset_db && db_path.exists() {
        std::fs::remove_file(&db_path).context("Failed to delete database")?;
        println!("Database reset.");
    }

    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of tnews appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    let client = NewsClient::new(&config.api_url, config.request_timeout())
        .with_context(|| format!("Invalid API URL '{}'", config.api_url))?;
    tracing::info!(api_url = %config.api_url, "Starting tnews");

    if args.is_one_shot() {
        let result = run_one_shot(&args, &config, &client, db.clone()).await;
        db.close().await;
        return result;
    }

    let mut app = App::new(db.clone(), client, &config).await;

    // Create event channel for background tasks
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(32);
    tnews::ui::spawn_initial_loads(&mut app, &event_tx);

    // Run the TUI
    let result = tnews::ui::run(&mut app, event_tx, event_rx).await;
    drop(app);
    db.close().await;
    result?;

    println!("Goodbye!");
    Ok(())
}
