// crates/datamart-core/src/core/report_key.rs
// ============================================================================
// Module: Report Scope Key
// Description: Identifies a slice of the shared aggregate-detail table.
// Purpose: Build and parse the report key column used to scope queries.
// Dependencies: percent-encoding, serde
// ============================================================================

//! ## Overview
//! A report key names a report category, a statistic token, and zero, one, or
//! two data source codes. Its text form joins percent-encoded segments with
//! `:` so statistic tokens (which contain `:` themselves) survive intact:
//! `CSS:MATCHED_COUNT%3A+NAME:CUSTOMERS:WATCHLIST`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use percent_encoding::AsciiSet;
use percent_encoding::CONTROLS;
use percent_encoding::percent_decode_str;
use percent_encoding::utf8_percent_encode;
use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ReportError;
use crate::core::identifiers::DataSourceCode;
use crate::core::statistic::StatisticKey;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Characters escaped inside a report key segment.
const SEGMENT_ESCAPES: &AsciiSet = &CONTROLS.add(b':').add(b'%').add(b' ');

/// Separator between report key segments.
const KEY_SEPARATOR: char = ':';

// ============================================================================
// SECTION: Report Codes
// ============================================================================

/// Report category stored in the `report` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReportCode {
    /// Data source summary (one data source).
    #[serde(rename = "DSS")]
    DataSourceSummary,
    /// Cross source summary (two data sources).
    #[serde(rename = "CSS")]
    CrossSourceSummary,
    /// Entity size breakdown (no data sources).
    #[serde(rename = "ESB")]
    EntitySizeBreakdown,
    /// Entity relation breakdown (no data sources).
    #[serde(rename = "ERB")]
    EntityRelationBreakdown,
}

impl ReportCode {
    /// Returns the stored report code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DataSourceSummary => "DSS",
            Self::CrossSourceSummary => "CSS",
            Self::EntitySizeBreakdown => "ESB",
            Self::EntityRelationBreakdown => "ERB",
        }
    }

    /// Returns the number of data sources the report is keyed by.
    #[must_use]
    pub const fn data_source_arity(self) -> usize {
        match self {
            Self::DataSourceSummary | Self::CrossSourceSummary => 2,
            Self::EntitySizeBreakdown | Self::EntityRelationBreakdown => 0,
        }
    }
}

impl fmt::Display for ReportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportCode {
    type Err = ReportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DSS" => Ok(Self::DataSourceSummary),
            "CSS" => Ok(Self::CrossSourceSummary),
            "ESB" => Ok(Self::EntitySizeBreakdown),
            "ERB" => Ok(Self::EntityRelationBreakdown),
            _ => Err(ReportError::Invalid(format!("unknown report code: {}", raw.trim()))),
        }
    }
}

// ============================================================================
// SECTION: Report Key
// ============================================================================

/// Scope key for one slice of the aggregate tables.
///
/// # Invariants
/// - Data source summaries carry the same code in both positions.
/// - Breakdown reports carry no data sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReportKey {
    /// Report category.
    code: ReportCode,
    /// Statistic token.
    statistic: StatisticKey,
    /// First data source, if keyed by data source.
    data_source1: Option<DataSourceCode>,
    /// Second data source, if keyed by data source.
    data_source2: Option<DataSourceCode>,
}

impl ReportKey {
    /// Builds a report key, validating data source arity.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the data sources do not fit the
    /// report category.
    pub fn new(
        code: ReportCode,
        statistic: StatisticKey,
        data_source1: Option<DataSourceCode>,
        data_source2: Option<DataSourceCode>,
    ) -> Result<Self, ReportError> {
        match (code, &data_source1, &data_source2) {
            (ReportCode::DataSourceSummary, Some(first), Some(second)) if first != second => {
                return Err(ReportError::invalid(
                    "data source summary keys use one data source in both positions",
                ));
            }
            (ReportCode::DataSourceSummary | ReportCode::CrossSourceSummary, Some(_), Some(_))
            | (ReportCode::EntitySizeBreakdown | ReportCode::EntityRelationBreakdown, None, None) => {}
            _ => {
                return Err(ReportError::Invalid(format!(
                    "{code} report keys require {} data sources",
                    code.data_source_arity()
                )));
            }
        }
        Ok(Self {
            code,
            statistic,
            data_source1,
            data_source2,
        })
    }

    /// Key for a data source summary statistic.
    #[must_use]
    pub fn data_source_summary(data_source: DataSourceCode, statistic: StatisticKey) -> Self {
        Self {
            code: ReportCode::DataSourceSummary,
            statistic,
            data_source1: Some(data_source.clone()),
            data_source2: Some(data_source),
        }
    }

    /// Key for a cross source summary statistic.
    #[must_use]
    pub const fn cross_source_summary(
        data_source: DataSourceCode,
        versus: DataSourceCode,
        statistic: StatisticKey,
    ) -> Self {
        Self {
            code: ReportCode::CrossSourceSummary,
            statistic,
            data_source1: Some(data_source),
            data_source2: Some(versus),
        }
    }

    /// Key for the entities of one entity size.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the size is less than one.
    pub fn entity_size(entity_size: i64) -> Result<Self, ReportError> {
        if entity_size < 1 {
            return Err(ReportError::Invalid(format!(
                "entity size must be at least 1: {entity_size}"
            )));
        }
        Self::breakdown(ReportCode::EntitySizeBreakdown, entity_size)
    }

    /// Key for the entities with one relation count.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the count is negative.
    pub fn entity_relations(relation_count: i64) -> Result<Self, ReportError> {
        if relation_count < 0 {
            return Err(ReportError::Invalid(format!(
                "relation count must not be negative: {relation_count}"
            )));
        }
        Self::breakdown(ReportCode::EntityRelationBreakdown, relation_count)
    }

    /// Builds a breakdown key whose statistic is a decimal count.
    fn breakdown(code: ReportCode, value: i64) -> Result<Self, ReportError> {
        Ok(Self {
            code,
            statistic: StatisticKey::base(value.to_string())?,
            data_source1: None,
            data_source2: None,
        })
    }

    /// Rejects keys that cannot scope a page query.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the statistic has a wildcard.
    pub fn ensure_pageable(&self) -> Result<(), ReportError> {
        if self.statistic.has_wildcard() {
            return Err(ReportError::Invalid(format!(
                "wildcard statistics cannot scope a page query: {}",
                self.statistic
            )));
        }
        Ok(())
    }

    /// Returns the report category.
    #[must_use]
    pub const fn code(&self) -> ReportCode {
        self.code
    }

    /// Returns the statistic key.
    #[must_use]
    pub const fn statistic(&self) -> &StatisticKey {
        &self.statistic
    }

    /// Returns the first data source.
    #[must_use]
    pub const fn data_source1(&self) -> Option<&DataSourceCode> {
        self.data_source1.as_ref()
    }

    /// Returns the second data source.
    #[must_use]
    pub const fn data_source2(&self) -> Option<&DataSourceCode> {
        self.data_source2.as_ref()
    }

    /// Encodes the key for the `report_key` column.
    #[must_use]
    pub fn encode(&self) -> String {
        let statistic = self.statistic.encode();
        let mut segments = vec![self.code.as_str(), statistic.as_str()];
        segments.extend(self.data_source1.iter().map(DataSourceCode::as_str));
        segments.extend(self.data_source2.iter().map(DataSourceCode::as_str));
        segments
            .into_iter()
            .map(|segment| utf8_percent_encode(segment, SEGMENT_ESCAPES).to_string())
            .collect::<Vec<_>>()
            .join(":")
    }

    /// Decodes a stored `report_key` value.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the key is malformed.
    pub fn decode(encoded: &str) -> Result<Self, ReportError> {
        let segments = encoded
            .split(KEY_SEPARATOR)
            .map(|segment| {
                percent_decode_str(segment).decode_utf8().map(|text| text.into_owned()).map_err(
                    |_| ReportError::Invalid(format!("report key is not valid utf-8: {encoded}")),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let (code, statistic, data_source1, data_source2) = match segments.as_slice() {
            [code, statistic] => (code, statistic, None, None),
            [code, statistic, first, second] => (
                code,
                statistic,
                Some(DataSourceCode::parse(first)?),
                Some(DataSourceCode::parse(second)?),
            ),
            _ => return Err(ReportError::Invalid(format!("malformed report key: {encoded}"))),
        };
        Self::new(code.parse()?, StatisticKey::decode(statistic)?, data_source1, data_source2)
    }
}

impl fmt::Display for ReportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for ReportKey {
    type Err = ReportError;

    fn from_str(encoded: &str) -> Result<Self, Self::Err> {
        Self::decode(encoded)
    }
}
