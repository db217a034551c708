//! Settings for the `depot` binary.
//!
//! Read from `settings.toml` in the working directory when present, then
//! overridden by `DEPOT__*` environment variables, e.g.
//! `DEPOT__SERVER__PORT=8080` or `DEPOT__POOL__MAX_CONNECTIONS=4`.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Where the stock ledger lives.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
    Postgres(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
            Database::Postgres(url) => url.clone(),
        }
    }

    /// Each in-memory SQLite connection is a separate database.
    pub fn is_memory(&self) -> bool {
        matches!(self, Database::Memory)
    }
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pool {
    pub max_connections: u32,
    /// Longest wait for a free connection before a request fails as
    /// unavailable.
    pub acquire_timeout_secs: u64,
}

impl Default for Pool {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub app: App,
    pub server: Server,
    #[serde(default)]
    pub pool: Pool,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("DEPOT").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
