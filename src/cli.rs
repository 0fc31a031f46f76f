//! Command line interface: the HTTP server plus offline maintenance jobs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::cache::SystemClock;
use crate::config::Config;
use crate::database::Database;
use crate::repositories::ListingSeaOrmRepository;
use crate::services::{MaintenanceService, MigrationOptions};
use crate::web::{build_cdn, AppState, WebServer};

#[derive(Debug, Parser)]
#[command(name = "webbuses")]
#[command(version)]
#[command(about = "Bus and coach classifieds backend")]
#[command(long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Listening IP address
    #[arg(short = 'H', long, value_name = "IP")]
    pub host: Option<String>,

    /// Listening port
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Log level
    #[arg(short = 'v', long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Export every listing to a timestamped JSON file
    Backup {
        #[arg(long, default_value = "backup")]
        out_dir: PathBuf,
    },
    /// Count listings whose cover has not been uploaded to the CDN
    CountUnmigrated,
    /// Upload the images of not-yet-migrated listings to the CDN
    MigrateImages {
        /// Report what would be migrated without changing anything
        #[arg(long)]
        dry_run: bool,
        /// Migrate at most this many listings
        #[arg(long)]
        limit: Option<u64>,
    },
}

impl Cli {
    /// `RUST_LOG` wins over `--log-level`
    pub fn log_filter(&self) -> String {
        format!("webbuses={}", self.log_level)
    }

    /// Load the config file and apply command line overrides
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_from_file(&self.config)?;
        info!("Configuration loaded from: {}", self.config);

        if let Some(host) = &self.host {
            config.web.host = host.clone();
        }
        if let Some(port) = self.port {
            config.web.port = port;
        }
        if let Some(database_url) = &self.database_url {
            config.database.url = database_url.clone();
        }
        Ok(config)
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.load_config()?;
    let database = Database::new(&config.database).await?;
    database.migrate().await?;

    match cli.command.clone().unwrap_or(Command::Serve) {
        Command::Serve => serve(config, database).await,
        Command::Backup { out_dir } => {
            let (path, count) = maintenance(&config, &database)?.backup(&out_dir).await?;
            println!("Backed up {count} listings to {}", path.display());
            Ok(())
        }
        Command::CountUnmigrated => {
            let count = maintenance(&config, &database)?.count_unmigrated().await?;
            println!("{count} listings without a CDN cover");
            Ok(())
        }
        Command::MigrateImages { dry_run, limit } => {
            if config.cdn.is_none() {
                anyhow::bail!("migrate-images needs a [cdn] section in {}", cli.config);
            }
            let summary = maintenance(&config, &database)?
                .migrate_images(MigrationOptions { dry_run, limit })
                .await?;
            println!(
                "migrated: {}, skipped: {}, errors: {}",
                summary.migrated, summary.skipped, summary.errors
            );
            Ok(())
        }
    }
}

async fn serve(config: Config, database: Database) -> Result<()> {
    let state = AppState::build(&config, &database, Arc::new(SystemClock))
        .context("Failed to initialise services")?;
    let server = WebServer::new(&config, state)?;

    info!(
        "Starting web server on {} (database: {})",
        server.addr(),
        database.database_type.as_str()
    );
    server.serve().await
}

fn maintenance(config: &Config, database: &Database) -> Result<MaintenanceService> {
    Ok(MaintenanceService::new(
        Arc::new(ListingSeaOrmRepository::new(database.connection())),
        build_cdn(config)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_serve() {
        let cli = Cli::parse_from(["webbuses"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.config, "config.toml");
        assert_eq!(cli.log_filter(), "webbuses=info");
    }

    #[test]
    fn test_migrate_images_flags() {
        let cli = Cli::parse_from([
            "webbuses",
            "-p",
            "8080",
            "migrate-images",
            "--dry-run",
            "--limit",
            "10",
        ]);
        assert_eq!(cli.port, Some(8080));
        match cli.command {
            Some(Command::MigrateImages { dry_run, limit }) => {
                assert!(dry_run);
                assert_eq!(limit, Some(10));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_overrides_apply_to_loaded_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cli = Cli::parse_from([
            "webbuses",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "7000",
            "--database-url",
            "sqlite::memory:",
        ]);

        let config = cli.load_config().unwrap();
        assert_eq!(config.web.port, 7000);
        assert_eq!(config.database.url, "sqlite::memory:");
    }
}
