//! TOML configuration for the TableKit engine.


use serde::Deserialize;
use std::{fs, path::Path, time::Duration};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

///
/// EngineConfig
///
/// Top-level engine settings. Every section is optional in the file;
/// absent sections fall back to their defaults.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Prepended to every model's table name.
    pub table_prefix: Option<String>,
    pub query: QueryConfig,
    pub encryption: EncryptionConfig,
}

impl EngineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(prefix) = &self.table_prefix
            && prefix.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "table_prefix must not be blank".to_string(),
            ));
        }

        self.query.validate()?;
        self.encryption.validate()
    }

    /// Resolve a physical table name for a model table.
    #[must_use]
    pub fn table_name(&self, table: &str) -> String {
        match &self.table_prefix {
            Some(prefix) => format!("{prefix}{table}"),
            None => table.to_string(),
        }
    }
}

///
/// QueryConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    pub default_page_limit: u32,
    pub max_page_limit: u32,
    pub consistent_reads: bool,
}

impl QueryConfig {
    pub const DEFAULT_PAGE_LIMIT: u32 = 100;
    pub const MAX_PAGE_LIMIT: u32 = 1000;

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_page_limit == 0 {
            return Err(ConfigError::Invalid(
                "query.default_page_limit must be greater than 0".to_string(),
            ));
        }
        if self.max_page_limit < self.default_page_limit {
            return Err(ConfigError::Invalid(format!(
                "query.max_page_limit ({}) must be >= query.default_page_limit ({})",
                self.max_page_limit, self.default_page_limit
            )));
        }

        Ok(())
    }

    /// Clamp a caller-requested limit into the configured window.
    #[must_use]
    pub fn page_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .filter(|limit| *limit > 0)
            .unwrap_or(self.default_page_limit)
            .min(self.max_page_limit)
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_page_limit: Self::DEFAULT_PAGE_LIMIT,
            max_page_limit: Self::MAX_PAGE_LIMIT,
            consistent_reads: false,
        }
    }
}

///
/// EncryptionConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EncryptionConfig {
    /// Applied to key-management calls that carry no caller deadline.
    pub key_timeout_ms: Option<u64>,
}

impl EncryptionConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.key_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "encryption.key_timeout_ms must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn key_timeout(&self) -> Option<Duration> {
        self.key_timeout_ms.map(Duration::from_millis)
    }
}
