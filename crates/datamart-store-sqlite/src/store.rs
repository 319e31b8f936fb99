// crates/datamart-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Report Store Connection
// Description: Connection configuration, opening, and store errors.
// Purpose: Hand report retrieval an open, correctly configured connection.
// Dependencies: datamart-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! Report retrieval never owns a connection; callers open one here and pass
//! it to the retrieval functions. A read-only configuration opens the file
//! without create permission and also sets `query_only`, so even statements
//! that bypass the open flags cannot write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use datamart_core::ReportError;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default busy timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for opening the report database.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqliteReportConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// Opens the database without write access.
    #[serde(default)]
    pub read_only: bool,
}

impl SqliteReportConfig {
    /// Read-write configuration with default timeouts.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            read_only: false,
        }
    }

    /// Returns a copy of this configuration with the read-only flag set.
    #[must_use]
    pub fn with_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` report store errors.
///
/// # Invariants
/// - `rusqlite` failures are reported as [`SqliteReportError::Db`] and never
///   retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteReportError {
    /// Store I/O error.
    #[error("sqlite report io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite report db error: {0}")]
    Db(String),
    /// Invalid caller argument.
    #[error("sqlite report invalid argument: {0}")]
    Invalid(String),
    /// Stored data could not be interpreted.
    #[error("sqlite report corrupt data: {0}")]
    Corrupt(String),
}

impl From<ReportError> for SqliteReportError {
    fn from(error: ReportError) -> Self {
        match error {
            ReportError::Invalid(message) => Self::Invalid(message),
            ReportError::Store(message) => Self::Db(message),
            ReportError::Corrupt(message) => Self::Corrupt(message),
        }
    }
}

impl From<SqliteReportError> for ReportError {
    fn from(error: SqliteReportError) -> Self {
        match error {
            SqliteReportError::Io(message) | SqliteReportError::Db(message) => Self::Store(message),
            SqliteReportError::Invalid(message) => Self::Invalid(message),
            SqliteReportError::Corrupt(message) => Self::Corrupt(message),
        }
    }
}

/// Maps a `rusqlite` failure into a store error.
pub(crate) fn db_error(err: &rusqlite::Error) -> SqliteReportError {
    SqliteReportError::Db(err.to_string())
}

// ============================================================================
// SECTION: Connection
// ============================================================================

/// Opens the report database described by `config`.
///
/// # Errors
///
/// Returns [`SqliteReportError::Invalid`] for unsafe paths,
/// [`SqliteReportError::Io`] when the parent directory cannot be created, and
/// [`SqliteReportError::Db`] when `SQLite` rejects the open or a pragma.
pub fn open_connection(config: &SqliteReportConfig) -> Result<Connection, SqliteReportError> {
    validate_store_path(&config.path)?;
    let flags = if config.read_only {
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_FULL_MUTEX
    } else {
        ensure_parent_dir(&config.path)?;
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX
    };
    let connection = Connection::open_with_flags(&config.path, flags).map_err(|err| db_error(&err))?;
    apply_pragmas(&connection, config)?;
    debug!(path = %config.path.display(), read_only = config.read_only, "opened report database");
    Ok(connection)
}

/// Applies connection pragmas.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteReportConfig,
) -> Result<(), SqliteReportError> {
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| db_error(&err))?;
    if config.read_only {
        connection.execute_batch("PRAGMA query_only = ON;").map_err(|err| db_error(&err))?;
    }
    Ok(())
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Ensures the parent directory for the database exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteReportError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|err| SqliteReportError::Io(err.to_string()))
        }
        _ => Ok(()),
    }
}

/// Validates database paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteReportError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteReportError::Invalid("database path must not be empty".to_string()));
    }
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteReportError::Invalid("database path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteReportError::Invalid(
                "database path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteReportError::Invalid(
            "database path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}
