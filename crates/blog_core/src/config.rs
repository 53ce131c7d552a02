//! Store configuration from environment variables.
//!
//! | Variable         | Meaning                               | Default          |
//! |------------------|---------------------------------------|------------------|
//! | `BLOG_DB_PATH`   | SQLite file path                      | in-memory        |
//! | `BLOG_LOG_LEVEL` | trace, debug, info, warn or error     | per build mode   |
//! | `BLOG_LOG_DIR`   | absolute directory for rolling logs   | logging disabled |

use crate::db::{open_db, open_db_in_memory, DbResult};
use crate::logging::{default_log_level, normalize_level};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub mod vars {
    pub const BLOG_DB_PATH: &str = "BLOG_DB_PATH";
    pub const BLOG_LOG_LEVEL: &str = "BLOG_LOG_LEVEL";
    pub const BLOG_LOG_DIR: &str = "BLOG_LOG_DIR";
}

/// Configuration loading failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue { var: &'static str, message: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { var, message } => write!(f, "invalid value for {var}: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Where the store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    InMemory,
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub database: DatabaseLocation,
    pub log_level: &'static str,
    pub log_dir: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database: DatabaseLocation::InMemory,
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl StoreConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads configuration through `lookup`; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let database = match read(vars::BLOG_DB_PATH) {
            Some(path) if path == ":memory:" => DatabaseLocation::InMemory,
            Some(path) => DatabaseLocation::File(PathBuf::from(path)),
            None => DatabaseLocation::InMemory,
        };

        let log_level = match read(vars::BLOG_LOG_LEVEL) {
            Some(level) => normalize_level(&level).map_err(|err| ConfigError::InvalidValue {
                var: vars::BLOG_LOG_LEVEL,
                message: err.to_string(),
            })?,
            None => default_log_level(),
        };

        let log_dir = match read(vars::BLOG_LOG_DIR).map(PathBuf::from) {
            Some(dir) if !dir.is_absolute() => {
                return Err(ConfigError::InvalidValue {
                    var: vars::BLOG_LOG_DIR,
                    message: format!("path must be absolute, got `{}`", dir.display()),
                });
            }
            other => other,
        };

        Ok(Self {
            database,
            log_level,
            log_dir,
        })
    }

    /// Opens a configured connection for the configured location.
    pub fn open_connection(&self) -> DbResult<Connection> {
        match &self.database {
            DatabaseLocation::InMemory => open_db_in_memory(),
            DatabaseLocation::File(path) => open_db(path),
        }
    }
}
