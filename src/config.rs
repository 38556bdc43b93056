//! Configuration management for sqlgate.
//!
//! Loads the query policy, engine settings and table descriptions from a TOML
//! file. The file is validated once at load time so later lookups cannot fail.

use crate::error::{GateError, Result};
use crate::gate::{Policy, QueryGate, SqlDialect, DEFAULT_DISALLOWED_KEYWORDS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Query gate settings.
    #[serde(default)]
    pub sql: SqlConfig,

    /// Embedded database settings.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Per-table metadata, keyed by table name.
    #[serde(default)]
    pub tables: HashMap<String, TableConfig>,
}

/// Query gate configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlConfig {
    /// Grammar used to parse submitted queries.
    #[serde(default)]
    pub dialect: SqlDialect,

    /// Keywords that reject a query when found in its canonical text.
    #[serde(default = "default_disallowed_keywords")]
    pub disallowed_keywords: Vec<String>,

    /// Maximum number of rows kept from one result set.
    #[serde(default = "default_row_limit")]
    pub row_limit: usize,
}

fn default_disallowed_keywords() -> Vec<String> {
    DEFAULT_DISALLOWED_KEYWORDS
        .iter()
        .map(|k| k.to_string())
        .collect()
}

fn default_row_limit() -> usize {
    1000
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::default(),
            disallowed_keywords: default_disallowed_keywords(),
            row_limit: default_row_limit(),
        }
    }
}

/// Embedded database configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DatabaseConfig {
    /// Database file. In-memory when absent.
    pub path: Option<PathBuf>,

    /// Delete an existing database file before opening.
    #[serde(default)]
    pub fresh: bool,

    /// SQL scripts executed once after opening, in order.
    #[serde(default)]
    pub seed_files: Vec<PathBuf>,

    /// Per-query timeout enforced by the engine client.
    pub query_timeout_secs: Option<u64>,
}

/// Metadata for one table.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TableConfig {
    /// Shown next to the table in listings.
    pub description: Option<String>,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sqlgate")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GateError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses and validates configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            GateError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.sql.row_limit == 0 {
            return Err(GateError::config("row_limit must be at least 1"));
        }
        self.policy()?;
        Ok(())
    }

    /// Builds the keyword policy.
    pub fn policy(&self) -> Result<Policy> {
        Policy::new(&self.sql.disallowed_keywords)
    }

    /// Builds the query gate for the configured dialect and policy.
    pub fn gate(&self) -> Result<QueryGate> {
        Ok(QueryGate::new(self.sql.dialect, self.policy()?))
    }

    /// Returns the configured description of a table.
    pub fn table_description(&self, table: &str) -> Option<&str> {
        self.tables
            .get(table)
            .and_then(|t| t.description.as_deref())
    }
}
