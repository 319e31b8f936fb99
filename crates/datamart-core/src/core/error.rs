// crates/datamart-core/src/core/error.rs
// ============================================================================
// Module: Report Errors
// Description: Error taxonomy shared by report codecs and backends.
// Purpose: Separate precondition failures from storage and data failures.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Report errors are scoped to a single call. Precondition errors are raised
//! before any query runs; storage errors carry the backend message unchanged.

use thiserror::Error;

/// Report retrieval errors.
///
/// # Invariants
/// - `Invalid` is only produced before any query executes.
/// - Messages never embed full result rows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// Caller supplied a malformed or inconsistent argument.
    #[error("invalid report argument: {0}")]
    Invalid(String),
    /// Storage backend failure.
    #[error("report store error: {0}")]
    Store(String),
    /// Stored aggregate data could not be interpreted.
    #[error("corrupt report data: {0}")]
    Corrupt(String),
}

impl ReportError {
    /// Builds an [`ReportError::Invalid`] from any displayable message.
    #[must_use]
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
