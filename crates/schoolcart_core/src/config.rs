//! Store and logging configuration.
//!
//! # Responsibility
//! - Describe which storage backend to open and how reads degrade.
//! - Load settings from TOML with environment overrides on top.
//!
//! # Invariants
//! - Every field has a default; an empty document is a valid config.
//! - Unknown enum values are rejected instead of silently defaulted.

use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BACKEND: &str = "SCHOOLCART_BACKEND";
pub const ENV_DB_PATH: &str = "SCHOOLCART_DB_PATH";
pub const ENV_READ_POLICY: &str = "SCHOOLCART_READ_POLICY";
pub const ENV_LOG_LEVEL: &str = "SCHOOLCART_LOG_LEVEL";
pub const ENV_MAX_UNITS_PER_SAVE: &str = "SCHOOLCART_MAX_UNITS_PER_SAVE";

const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Process-local store seeded from static reference lists.
    #[default]
    Memory,
    /// SQLite file (or private in-memory database when no path is set).
    Sqlite,
}

impl BackendKind {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "sqlite" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

/// How read paths react to backend failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadPolicy {
    /// Surface the backend error to the caller.
    #[default]
    Strict,
    /// Log the failure and return an empty result.
    DegradeToEmpty,
}

impl ReadPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "degrade_to_empty" => Some(Self::DegradeToEmpty),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    /// Absolute directory for rolling log files; stderr when unset.
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: crate::logging::default_log_level().to_string(),
            dir: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: BackendKind,
    pub db_path: Option<PathBuf>,
    pub busy_timeout_ms: u64,
    pub read_policy: ReadPolicy,
    /// Load `CatalogSeed::sample()` into an empty store on open.
    pub seed_sample_catalog: bool,
    /// Upper bound on unit rows written by one save; unbounded when unset.
    pub max_units_per_save: Option<usize>,
    pub log: LogConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            db_path: None,
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            read_policy: ReadPolicy::default(),
            seed_sample_catalog: false,
            max_units_per_save: None,
            log: LogConfig::default(),
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|err| ConfigError::Parse(err.to_string()))
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }

    /// Applies `SCHOOLCART_*` overrides resolved through `lookup`.
    ///
    /// # Errors
    /// - Returns `ConfigError::Invalid` when an override holds an unknown value.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_BACKEND) {
            self.backend = BackendKind::parse(&value).ok_or_else(|| ConfigError::Invalid {
                key: ENV_BACKEND,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(ENV_DB_PATH) {
            if !value.trim().is_empty() {
                self.db_path = Some(PathBuf::from(value));
            }
        }
        if let Some(value) = lookup(ENV_READ_POLICY) {
            self.read_policy = ReadPolicy::parse(&value).ok_or_else(|| ConfigError::Invalid {
                key: ENV_READ_POLICY,
                value: value.clone(),
            })?;
        }
        if let Some(value) = lookup(ENV_MAX_UNITS_PER_SAVE) {
            let value = value.trim();
            self.max_units_per_save = if value.is_empty() {
                None
            } else {
                Some(value.parse().map_err(|_| ConfigError::Invalid {
                    key: ENV_MAX_UNITS_PER_SAVE,
                    value: value.to_string(),
                })?)
            };
        }
        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.log.level = value;
        }
        Ok(())
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }
}

/// Reads a TOML config file and applies environment overrides.
pub fn load_config(path: impl AsRef<Path>) -> Result<StoreConfig, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.to_path_buf(),
        source: err,
    })?;
    let mut config = StoreConfig::from_toml_str(&contents)?;
    config.apply_env_overrides()?;
    Ok(config)
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(String),
    Invalid {
        key: &'static str,
        value: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(message) => write!(f, "invalid config: {message}"),
            Self::Invalid { key, value } => write!(f, "unsupported value `{value}` for {key}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(_) | Self::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{
        BackendKind, ConfigError, ReadPolicy, StoreConfig, ENV_BACKEND, ENV_DB_PATH,
        ENV_MAX_UNITS_PER_SAVE,
    };
    use std::collections::HashMap;
    use std::path::PathBuf;

    #[test]
    fn empty_document_yields_defaults() {
        let config = StoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, StoreConfig::default());
        assert_eq!(config.backend, BackendKind::Memory);
        assert_eq!(config.read_policy, ReadPolicy::Strict);
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert_eq!(config.max_units_per_save, None);
    }

    #[test]
    fn parses_full_document() {
        let config = StoreConfig::from_toml_str(
            r#"
            backend = "sqlite"
            db_path = "/var/lib/schoolcart/cart.db"
            busy_timeout_ms = 250
            read_policy = "degrade_to_empty"
            seed_sample_catalog = true
            max_units_per_save = 2000

            [log]
            level = "warn"
            dir = "/var/log/schoolcart"
            "#,
        )
        .unwrap();

        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(
            config.db_path,
            Some(PathBuf::from("/var/lib/schoolcart/cart.db"))
        );
        assert_eq!(config.busy_timeout().as_millis(), 250);
        assert_eq!(config.read_policy, ReadPolicy::DegradeToEmpty);
        assert!(config.seed_sample_catalog);
        assert_eq!(config.max_units_per_save, Some(2000));
        assert_eq!(config.log.level, "warn");
        assert_eq!(config.log.dir, Some(PathBuf::from("/var/log/schoolcart")));
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        let err = StoreConfig::from_toml_str(r#"backend = "postgres""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn overrides_replace_file_values() {
        let env: HashMap<&str, &str> = [(ENV_BACKEND, "SQLite"), (ENV_DB_PATH, "/tmp/cart.db")]
            .into_iter()
            .collect();
        let mut config = StoreConfig::default();
        config
            .apply_overrides(|key| env.get(key).map(|value| value.to_string()))
            .unwrap();

        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/cart.db")));
    }

    #[test]
    fn invalid_override_is_rejected() {
        let mut config = StoreConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_BACKEND).then(|| "redis".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key, .. } if key == ENV_BACKEND));
        assert_eq!(config.backend, BackendKind::Memory);
    }

    #[test]
    fn unit_limit_override_parses_or_clears() {
        let mut config = StoreConfig::default();
        config
            .apply_overrides(|key| (key == ENV_MAX_UNITS_PER_SAVE).then(|| "500".to_string()))
            .unwrap();
        assert_eq!(config.max_units_per_save, Some(500));

        config
            .apply_overrides(|key| (key == ENV_MAX_UNITS_PER_SAVE).then(String::new))
            .unwrap();
        assert_eq!(config.max_units_per_save, None);

        let err = config
            .apply_overrides(|key| (key == ENV_MAX_UNITS_PER_SAVE).then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key, .. } if key == ENV_MAX_UNITS_PER_SAVE));
    }
}
