//! `popsicled`, the popsicle inventory server.
//!
//! Usage:
//!   popsicled [--listen <addr>] [--base-path <prefix>] [--store sqlite|memory] [--db <path>]
//!
//! Every flag falls back to a `POPSICLE_*` environment variable.

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, ValueEnum};
use log::info;
use popsicle_api::config::{DEFAULT_BASE_PATH, DEFAULT_DB_PATH, DEFAULT_LISTEN};
use popsicle_api::{ServerConfig, StoreConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StoreKind {
    Sqlite,
    Memory,
}

/// Popsicle inventory HTTP server.
#[derive(Parser, Debug)]
#[command(name = "popsicled", version, about = "Popsicle inventory server")]
struct Cli {
    /// Socket address to listen on.
    #[arg(long, env = "POPSICLE_LISTEN", default_value = DEFAULT_LISTEN)]
    listen: String,

    /// Route prefix for the inventory endpoints; `/` mounts them at the root.
    #[arg(long, env = "POPSICLE_BASE_PATH", default_value = DEFAULT_BASE_PATH)]
    base_path: String,

    /// Backing store.
    #[arg(long, env = "POPSICLE_STORE", value_enum, default_value_t = StoreKind::Sqlite)]
    store: StoreKind,

    /// SQLite database file, used when `--store sqlite`.
    #[arg(long, env = "POPSICLE_DB", default_value = DEFAULT_DB_PATH)]
    db: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, env = "POPSICLE_LOG_LEVEL")]
    log_level: Option<String>,

    /// Directory for rolling log files; logs go to stderr when unset.
    #[arg(long, env = "POPSICLE_LOG_DIR")]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<ServerConfig> {
        let store = match self.store {
            StoreKind::Sqlite => StoreConfig::Sqlite(self.db),
            StoreKind::Memory => StoreConfig::Memory,
        };
        let log_dir = match self.log_dir {
            Some(dir) if dir.is_absolute() => Some(dir),
            Some(dir) => Some(
                std::env::current_dir()
                    .context("failed to resolve working directory for --log-dir")?
                    .join(dir),
            ),
            None => None,
        };

        let defaults = ServerConfig::default();
        Ok(ServerConfig {
            listen: self.listen,
            base_path: self.base_path,
            store,
            log_level: self.log_level.unwrap_or(defaults.log_level),
            log_dir: log_dir.map(|dir| dir.to_string_lossy().into_owned()),
        })
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;

    popsicle_core::init_logging(&config.log_level, config.log_dir.as_deref())
        .map_err(|err| anyhow!("failed to initialize logging: {err}"))?;
    if let Some((level, destination)) = popsicle_core::logging_status() {
        info!(
            "event=config_loaded module=cli listen={} base_path={} store={:?} log_level={} log_destination={}",
            config.listen, config.base_path, config.store, level, destination
        );
    }

    popsicle_api::serve(config).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Cli;
    use clap::Parser;
    use popsicle_api::StoreConfig;

    #[test]
    fn flags_build_server_config() {
        let cli = Cli::try_parse_from([
            "popsicled",
            "--listen",
            "127.0.0.1:9000",
            "--base-path",
            "/",
            "--store",
            "memory",
            "--log-level",
            "warn",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();

        assert_eq!(config.listen, "127.0.0.1:9000");
        assert_eq!(config.base_path, "/");
        assert_eq!(config.store, StoreConfig::Memory);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn relative_log_dir_is_made_absolute() {
        let cli = Cli::try_parse_from(["popsicled", "--log-dir", "logs"]).unwrap();
        let config = cli.into_config().unwrap();
        let log_dir = config.log_dir.unwrap();
        assert!(std::path::Path::new(&log_dir).is_absolute());
        assert!(log_dir.ends_with("logs"));
    }

    #[test]
    fn unknown_store_is_rejected() {
        assert!(Cli::try_parse_from(["popsicled", "--store", "postgres"]).is_err());
    }
}
