// crates/datamart-config/src/config.rs
// ============================================================================
// Module: Datamart Configuration
// Description: Configuration loading and validation for datamart tools.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: datamart-core, datamart-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown fields are rejected. Missing sections take their defaults, and the
//! resulting config is validated before it is returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use datamart_core::DEFAULT_PAGE_SIZE;
use datamart_core::DataSourceCatalog;
use datamart_core::DataSourceCode;
use datamart_store_sqlite::DEFAULT_BUSY_TIMEOUT_MS;
use datamart_store_sqlite::SqliteReportConfig;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "datamart.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "DATAMART_CONFIG";
/// Default database filename.
const DEFAULT_DATABASE_PATH: &str = "datamart.db";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of catalog data sources.
pub(crate) const MAX_CATALOG_DATA_SOURCES: usize = 1024;
/// Default upper limit on requested page sizes.
pub(crate) const DEFAULT_MAX_PAGE_SIZE: usize = 10_000;
/// Hard ceiling for `paging.max_page_size`.
pub(crate) const MAX_PAGE_SIZE_CEILING: usize = 1_000_000;
/// Maximum busy timeout in milliseconds.
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Datamart tool configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatamartConfig {
    /// Report database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Data sources reports may name.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Page size defaults and limits.
    #[serde(default)]
    pub paging: PagingConfig,
    /// Log output configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DatamartConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// The path is `path` when given, else the `DATAMART_CONFIG` environment
    /// variable, else `datamart.toml` in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown fields and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.catalog.validate()?;
        self.paging.validate()?;
        Ok(())
    }

    /// Returns the store configuration for [`datamart_store_sqlite::open_connection`].
    #[must_use]
    pub fn store_config(&self) -> SqliteReportConfig {
        SqliteReportConfig {
            path: self.database.path.clone(),
            busy_timeout_ms: self.database.busy_timeout_ms,
            read_only: self.database.read_only,
        }
    }

    /// Resolves the configured data sources into a catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a code is malformed.
    pub fn data_source_catalog(&self) -> Result<DataSourceCatalog, ConfigError> {
        DataSourceCatalog::from_codes(&self.catalog.data_sources)
            .map_err(|err| ConfigError::Invalid(format!("catalog.data_sources: {err}")))
    }
}

/// Report database configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Path to the `SQLite` data mart.
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Opens the data mart without write access.
    #[serde(default = "default_read_only")]
    pub read_only: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            read_only: true,
        }
    }
}

impl DatabaseConfig {
    /// Validates database settings.
    fn validate(&self) -> Result<(), ConfigError> {
        let text = self.path.to_string_lossy();
        validate_path_string("database.path", &text)?;
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "database.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "database.busy_timeout_ms must be at most {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

/// Data source catalog configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Data source codes; normalized to trimmed upper case.
    #[serde(default)]
    pub data_sources: Vec<String>,
}

impl CatalogConfig {
    /// Validates catalog entries.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.data_sources.len() > MAX_CATALOG_DATA_SOURCES {
            return Err(ConfigError::Invalid(format!(
                "catalog.data_sources exceeds {MAX_CATALOG_DATA_SOURCES} entries"
            )));
        }
        let mut seen = BTreeSet::new();
        for raw in &self.data_sources {
            let code = DataSourceCode::parse(raw)
                .map_err(|err| ConfigError::Invalid(format!("catalog.data_sources: {err}")))?;
            if !seen.insert(code.clone()) {
                return Err(ConfigError::Invalid(format!(
                    "catalog.data_sources contains duplicate code {code}"
                )));
            }
        }
        Ok(())
    }
}

/// Paging defaults and limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagingConfig {
    /// Page size used when a request gives neither a page nor a sample size.
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,
    /// Largest page size a caller may request.
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl PagingConfig {
    /// Validates paging limits.
    fn validate(self) -> Result<(), ConfigError> {
        if self.default_page_size == 0 {
            return Err(ConfigError::Invalid(
                "paging.default_page_size must be greater than zero".to_string(),
            ));
        }
        if self.max_page_size > MAX_PAGE_SIZE_CEILING {
            return Err(ConfigError::Invalid(format!(
                "paging.max_page_size must be at most {MAX_PAGE_SIZE_CEILING}"
            )));
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::Invalid(
                "paging.default_page_size must not exceed paging.max_page_size".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks a requested page size against the configured maximum.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the size exceeds the maximum.
    pub fn check_page_size(self, page_size: usize) -> Result<(), ConfigError> {
        if page_size > self.max_page_size {
            return Err(ConfigError::Invalid(format!(
                "page size {page_size} exceeds paging.max_page_size {}",
                self.max_page_size
            )));
        }
        Ok(())
    }
}

/// Log output configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is unset.
    #[serde(default)]
    pub level: LogLevel,
}

/// Log verbosity levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Warnings and errors.
    Warn,
    /// Informational output.
    #[default]
    Info,
    /// Query-level detail.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// Returns the filter directive for the level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// Returns the default database path.
fn default_database_path() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE_PATH)
}

/// Returns the default busy timeout.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Report tools open the data mart read-only unless told otherwise.
const fn default_read_only() -> bool {
    true
}

/// Returns the default page size.
const fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Returns the default page size limit.
const fn default_max_page_size() -> usize {
    DEFAULT_MAX_PAGE_SIZE
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, reason = "Test-only assertions are permitted.")]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins_over_defaults() {
        let resolved = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("custom.toml"));
    }

    #[test]
    fn validate_path_rejects_overlong_component() {
        let path = PathBuf::from("a".repeat(MAX_PATH_COMPONENT_LENGTH + 1));
        assert!(validate_path(&path).is_err());
        let path = PathBuf::from("a".repeat(MAX_PATH_COMPONENT_LENGTH));
        assert!(validate_path(&path).is_ok());
    }

    #[test]
    fn validate_path_string_rejects_whitespace_only() {
        let err = validate_path_string("database.path", "   ").unwrap_err();
        assert_eq!(err, ConfigError::Invalid("database.path must be non-empty".to_string()));
    }

    #[test]
    fn validate_path_string_rejects_exceeds_max_length() {
        let value = "a/".repeat(MAX_TOTAL_PATH_LENGTH);
        assert!(validate_path_string("database.path", &value).is_err());
    }

    #[test]
    fn log_levels_render_filter_directives() {
        let levels = [LogLevel::Error, LogLevel::Warn, LogLevel::Info, LogLevel::Debug];
        let rendered: Vec<&str> = levels.iter().map(|level| level.as_str()).collect();
        assert_eq!(rendered, vec!["error", "warn", "info", "debug"]);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }
}
