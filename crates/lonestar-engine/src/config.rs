//! # Engine Configuration
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`LONESTAR_*`)
//! 2. Config file (`lonestar.toml`)
//! 3. Defaults (this file)
//!
//! ## File Format
//! ```toml
//! [database]
//! path = "/var/lib/lonestar/lonestar.db"
//! max_connections = 5
//!
//! [currency]
//! default_rate = 197.0    # seeds the stored rate on first use
//! fallback_rate = 197.0   # BOTH payments that carry no rate
//!
//! [reporting]
//! recent_limit = 50
//! top_products_limit = 10
//! ```
//!
//! Read-only after startup; the engine shares it behind an `Arc`.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use lonestar_core::{ExchangeRate, DEFAULT_LRD_PER_USD, RECENT_ACTIVITY_LIMIT, TOP_PRODUCTS_LIMIT};
use lonestar_db::DbConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const CONFIG_FILE_NAME: &str = "lonestar.toml";
pub const DATABASE_FILE_NAME: &str = "lonestar.db";

pub const ENV_DB_PATH: &str = "LONESTAR_DB_PATH";
pub const ENV_DEFAULT_RATE: &str = "LONESTAR_DEFAULT_RATE";
pub const ENV_FALLBACK_RATE: &str = "LONESTAR_FALLBACK_RATE";

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub database: DatabaseSection,
    pub currency: CurrencySection,
    pub reporting: ReportingSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// SQLite file. `None` means the platform data directory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        DatabaseSection {
            path: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrencySection {
    /// LRD per USD stored the first time the rate is read.
    pub default_rate: f64,
    /// LRD per USD applied to a BOTH payment when the request has no rate.
    pub fallback_rate: f64,
}

impl Default for CurrencySection {
    fn default() -> Self {
        CurrencySection {
            default_rate: DEFAULT_LRD_PER_USD,
            fallback_rate: DEFAULT_LRD_PER_USD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingSection {
    pub recent_limit: u32,
    pub top_products_limit: u32,
}

impl Default for ReportingSection {
    fn default() -> Self {
        ReportingSection {
            recent_limit: RECENT_ACTIVITY_LIMIT as u32,
            top_products_limit: TOP_PRODUCTS_LIMIT as u32,
        }
    }
}

impl EngineConfig {
    /// Loads defaults, then the config file, then environment overrides.
    ///
    /// With `path = None` the file is looked up in the platform config
    /// directory and silently skipped if absent. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_file() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file, using defaults");
                    EngineConfig::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        info!(path = %path.display(), "Loading configuration");
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Applies `LONESTAR_*` overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH) {
            self.database.path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup(ENV_DEFAULT_RATE) {
            self.currency.default_rate = parse_rate(ENV_DEFAULT_RATE, &raw)?;
        }
        if let Some(raw) = lookup(ENV_FALLBACK_RATE) {
            self.currency.fallback_rate = parse_rate(ENV_FALLBACK_RATE, &raw)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        ExchangeRate::from_decimal(self.currency.default_rate)
            .map_err(|e| ConfigError::invalid("currency.default_rate", e))?;
        ExchangeRate::from_decimal(self.currency.fallback_rate)
            .map_err(|e| ConfigError::invalid("currency.fallback_rate", e))?;

        for (key, value) in [
            ("database.max_connections", self.database.max_connections),
            ("reporting.recent_limit", self.reporting.recent_limit),
            ("reporting.top_products_limit", self.reporting.top_products_limit),
        ] {
            if value == 0 {
                return Err(ConfigError::invalid(key, "must be greater than zero"));
            }
        }
        Ok(())
    }

    pub fn default_rate(&self) -> Result<ExchangeRate, ConfigError> {
        ExchangeRate::from_decimal(self.currency.default_rate)
            .map_err(|e| ConfigError::invalid("currency.default_rate", e))
    }

    pub fn fallback_rate(&self) -> Result<ExchangeRate, ConfigError> {
        ExchangeRate::from_decimal(self.currency.fallback_rate)
            .map_err(|e| ConfigError::invalid("currency.fallback_rate", e))
    }

    /// The configured file, or `lonestar.db` in the platform data directory
    /// (created if missing).
    ///
    /// - **macOS**: `~/Library/Application Support/lr.lonestar.pos/lonestar.db`
    /// - **Windows**: `%APPDATA%\lonestar\pos\data\lonestar.db`
    /// - **Linux**: `~/.local/share/lonestar-pos/lonestar.db`
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }
        let dirs = project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Io {
            path: data_dir.to_path_buf(),
            source,
        })?;
        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        Ok(DbConfig::new(self.database_path()?).max_connections(self.database.max_connections))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("lr", "lonestar", "pos")
}

fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

fn parse_rate(key: &str, raw: &str) -> Result<f64, ConfigError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::invalid(key, format!("not a number: {raw}")))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Could not determine app data directory")]
    NoDataDir,
}

impl ConfigError {
    fn invalid(key: &str, reason: impl std::fmt::Display) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.currency.fallback_rate, 197.0);
        assert_eq!(config.reporting.recent_limit, 50);
        assert_eq!(config.reporting.top_products_limit, 10);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [currency]
            fallback_rate = 190.5
            "#,
        )
        .unwrap();
        assert_eq!(config.currency.fallback_rate, 190.5);
        assert_eq!(config.currency.default_rate, 197.0);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_DB_PATH, "/tmp/store.db"),
            (ENV_FALLBACK_RATE, " 201.25 "),
        ]);
        let mut config = EngineConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/store.db")));
        assert_eq!(config.currency.fallback_rate, 201.25);
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/store.db"));

        let mut bad = EngineConfig::default();
        let err = bad.apply_env(|key| (key == ENV_DEFAULT_RATE).then(|| "abc".to_string()));
        assert!(matches!(err, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = EngineConfig::default();
        config.currency.default_rate = 0.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.reporting.recent_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_toml_is_a_parse_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("[currency]\ndefault_rate = \"high\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
