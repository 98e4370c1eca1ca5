//! Configuration Management
//!
//! This module resolves the service settings: listen port, database connection,
//! pool sizing and logging.
//!
//! # Configuration Locations
//! - Explicit: `--config <path>` (must exist)
//! - Local: `.agentdesk/config.json` (team-shareable, per-project)
//! - Global: `~/.config/agentdesk/config.json` (per-user)
//!
//! The first file found is used; with none, built-in defaults apply.
//!
//! # Resolution Precedence
//! 1. CLI flags (applied by the binary, highest priority)
//! 2. Environment variables (`PORT`, `DB_*`, `LOG_*`)
//! 3. Config file
//! 4. Defaults (port 3000, MySQL on localhost:3306, database `sample`)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::engine::{ConnectionConfig, DatabaseType};
use crate::error::{DeskError, Result};
use crate::logging::LogConfig;
use crate::pool::PoolConfig;

/// Default HTTP listen port
pub const DEFAULT_PORT: u16 = 3000;

/// Complete service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// HTTP listen port
    pub port: u16,

    /// Backing store connection and pool
    pub database: DatabaseSettings,

    /// Logging output
    pub log: LogConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self { port: DEFAULT_PORT, database: DatabaseSettings::default(), log: LogConfig::default() }
    }
}

/// Database section of the settings
///
/// Wraps `ConnectionConfig` and supports an environment variable reference
/// for the password instead of storing it in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// Connection configuration
    #[serde(flatten)]
    pub connection: ConnectionConfig,

    /// Environment variable name for password (if not storing password directly)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Pool sizing and acquire timeout
    #[serde(default)]
    pub pool: PoolConfig,
}

impl DatabaseSettings {
    /// Resolve the password reference and return the final `ConnectionConfig`
    pub fn resolve(&self) -> Result<ConnectionConfig> {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Same as [`resolve`](Self::resolve) with an explicit variable lookup
    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<ConnectionConfig> {
        let mut config = self.connection.clone();

        if let Some(env_var) = &self.password_env {
            let password = lookup(env_var).ok_or_else(|| {
                DeskError::config_error(format!(
                    "Environment variable {env_var} not found for password"
                ))
            })?;
            config.password = Some(password);
        }

        Ok(config)
    }
}

impl Settings {
    /// Locate and read the config file, then apply environment overrides
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = Self::discover(explicit)?;
        settings.apply_env()?;
        Ok(settings)
    }

    /// Read settings from the first config file found, or defaults
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(DeskError::config_error(format!(
                    "Config file {} does not exist",
                    path.display()
                )));
            }
            return load_file(path);
        }

        let local = local_config_path()?;
        if local.exists() {
            return load_file(&local);
        }

        // A missing home directory just means there is no global file
        if let Ok(global) = global_config_path() {
            if global.exists() {
                return load_file(&global);
            }
        }

        Ok(Self::default())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an explicit variable lookup
    pub fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let conn = &mut self.database.connection;

        if let Some(port) = parse_var(&lookup, "PORT")? {
            self.port = port;
        }
        if let Some(engine) = parse_var::<DatabaseType>(&lookup, "DB_ENGINE")? {
            conn.engine = engine;
        }
        if let Some(host) = lookup("DB_HOST") {
            conn.host = Some(host);
        }
        if let Some(port) = parse_var(&lookup, "DB_PORT")? {
            conn.port = Some(port);
        }
        if let Some(user) = lookup("DB_USER") {
            conn.user = Some(user);
        }
        if let Some(password) = lookup("DB_PASSWORD") {
            // A direct password beats a file's password_env reference
            conn.password = Some(password);
            self.database.password_env = None;
        }
        if let Some(database) = lookup("DB_NAME") {
            conn.database = Some(database);
        }
        if let Some(file) = lookup("DB_FILE") {
            conn.file = Some(PathBuf::from(file));
        }
        if let Some(size) = parse_var(&lookup, "DB_POOL_SIZE")? {
            self.database.pool.max_connections = size;
        }
        if let Some(timeout) = parse_var(&lookup, "DB_ACQUIRE_TIMEOUT_MS")? {
            self.database.pool.acquire_timeout_ms = timeout;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(json) = parse_var(&lookup, "LOG_JSON")? {
            self.log.json = json;
        }

        Ok(())
    }
}

/// Read a variable and parse it, reporting which variable was malformed
fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                DeskError::config_error(format!("Invalid value '{raw}' for {key}: {e}"))
            })
        })
        .transpose()
}

/// Get path to local config file (`.agentdesk/config.json`)
pub fn local_config_path() -> Result<PathBuf> {
    let current_dir = std::env::current_dir().map_err(|e| {
        DeskError::config_error(format!("Could not determine current directory: {e}"))
    })?;

    Ok(current_dir.join(".agentdesk").join("config.json"))
}

/// Get path to global config file (`~/.config/agentdesk/config.json`)
pub fn global_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| DeskError::config_error("Could not determine user config directory"))?;

    Ok(config_dir.join("agentdesk").join("config.json"))
}

/// Load settings from a JSON config file
pub fn load_file(path: &Path) -> Result<Settings> {
    let contents = fs::read_to_string(path)
        .map_err(|e| DeskError::config_error(format!("Could not read config file: {e}")))?;

    serde_json::from_str::<Settings>(&contents)
        .map_err(|e| DeskError::config_error(format!("Invalid config file format: {e}")))
}
