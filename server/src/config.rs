//! Server configuration from environment variables.
//!
//! - `HOST`: bind address (default `127.0.0.1`)
//! - `PORT`: bind port (default `3000`)
//! - `STORAGE_MODE`: `memory` (default) | `sqlite`
//! - `DATABASE_URL`: SQLite URL, required when `STORAGE_MODE=sqlite`
//!   (e.g. `sqlite:todos.db?mode=rwc`)
//! - `RUST_LOG`: log filter, read by the binary's subscriber

use std::env;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid STORAGE_MODE '{0}': expected 'memory' or 'sqlite'")]
    InvalidStorageMode(String),

    #[error("Invalid PORT '{0}'")]
    InvalidPort(String),

    #[error("DATABASE_URL is required when STORAGE_MODE=sqlite")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for StorageMode {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" | "in_memory" | "inmemory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(ConfigError::InvalidStorageMode(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub storage_mode: StorageMode,
    pub database_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            storage_mode: StorageMode::default(),
            database_url: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Empty or whitespace-only values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        let host = get("HOST").unwrap_or(defaults.host);
        let port = match get("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => defaults.port,
        };
        let storage_mode = match get("STORAGE_MODE") {
            Some(raw) => raw.parse()?,
            None => defaults.storage_mode,
        };
        let config = Self {
            host,
            port,
            storage_mode,
            database_url: get("DATABASE_URL"),
        };

        if config.storage_mode == StorageMode::Sqlite {
            config.sqlite_url()?;
        }
        Ok(config)
    }

    /// The database URL sqlite storage connects to.
    pub fn sqlite_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::MissingDatabaseUrl)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
