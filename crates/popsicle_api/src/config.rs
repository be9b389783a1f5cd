//! Server configuration.
//!
//! Values arrive already parsed from the command line or environment; this
//! module only holds defaults and normalization.

use std::path::PathBuf;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";
pub const DEFAULT_BASE_PATH: &str = "/PopsicleInventory";
pub const DEFAULT_DB_PATH: &str = "popsicles.sqlite3";

/// Backing store selected at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// SQLite database file, created and seeded on first open.
    Sqlite(PathBuf),
    /// Seeded in-memory list, lost on shutdown.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen: String,
    pub base_path: String,
    pub store: StoreConfig,
    pub log_level: String,
    /// Absolute directory for rolling log files; stderr when unset.
    pub log_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
            store: StoreConfig::Sqlite(PathBuf::from(DEFAULT_DB_PATH)),
            log_level: popsicle_core::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

/// Normalizes a route prefix to `/segment[/segment..]`, or `""` for root.
pub fn normalize_base_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
