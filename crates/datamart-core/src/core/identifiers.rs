// crates/datamart-core/src/core/identifiers.rs
// ============================================================================
// Module: Datamart Identifiers
// Description: Entity and data source identifiers used across reports.
// Purpose: Provide validated, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Entity identifiers are the raw 64-bit keys assigned by the resolution
//! engine. Data source codes are normalized (trimmed, upper-case) at the
//! boundary so report keys built from them compare byte-for-byte with the
//! keys written by the ingestion pipeline.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ReportError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum length of a data source code in bytes.
pub const MAX_DATA_SOURCE_CODE_LENGTH: usize = 64;

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Entity identifier as stored in the aggregate tables.
pub type EntityId = i64;

/// Data source code (for example `CUSTOMERS`).
///
/// # Invariants
/// - Non-empty, trimmed, ASCII upper-case.
/// - Never longer than [`MAX_DATA_SOURCE_CODE_LENGTH`] bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DataSourceCode(String);

impl DataSourceCode {
    /// Parses and normalizes a data source code.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the code is empty or too long.
    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReportError::invalid("data source code must be non-empty"));
        }
        if trimmed.len() > MAX_DATA_SOURCE_CODE_LENGTH {
            return Err(ReportError::Invalid(format!(
                "data source code exceeds {MAX_DATA_SOURCE_CODE_LENGTH} bytes"
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataSourceCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for DataSourceCode {
    type Error = ReportError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DataSourceCode> for String {
    fn from(value: DataSourceCode) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// The resolved set of data source codes a caller may report on.
///
/// # Invariants
/// - Iteration order is the sorted order of the codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataSourceCatalog {
    /// Allowed data source codes.
    codes: BTreeSet<DataSourceCode>,
}

impl DataSourceCatalog {
    /// Builds a catalog from raw codes, normalizing each one.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when any code is malformed.
    pub fn from_codes<I, S>(codes: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codes = codes
            .into_iter()
            .map(|code| DataSourceCode::parse(code.as_ref()))
            .collect::<Result<BTreeSet<_>, _>>()?;
        Ok(Self {
            codes,
        })
    }

    /// Resolves a raw code against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the code is malformed or not in
    /// the catalog.
    pub fn require(&self, raw: &str) -> Result<DataSourceCode, ReportError> {
        let code = DataSourceCode::parse(raw)?;
        if !self.codes.contains(&code) {
            return Err(ReportError::Invalid(format!("unrecognized data source: {code}")));
        }
        Ok(code)
    }

    /// Returns true when the catalog contains the code.
    #[must_use]
    pub fn contains(&self, code: &DataSourceCode) -> bool {
        self.codes.contains(code)
    }

    /// Iterates the codes in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &DataSourceCode> {
        self.codes.iter()
    }

    /// Returns the number of codes in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns true when the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
