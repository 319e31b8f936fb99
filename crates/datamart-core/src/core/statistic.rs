// crates/datamart-core/src/core/statistic.rs
// ============================================================================
// Module: Statistic Key Codec
// Description: Composite statistic identifiers stored in the report tables.
// Purpose: Encode and decode base statistic, match key, and principle tokens.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! The aggregate tables multiplex many statistics through one text column.
//! A token carries a base statistic name plus two optional dimensions:
//!
//! | Token        | Match key | Principle |
//! | ------------ | --------- | --------- |
//! | `STAT`       | absent    | absent    |
//! | `STAT:MK`    | `MK`      | absent    |
//! | `STAT::PR`   | absent    | `PR`      |
//! | `STAT:MK:PR` | `MK`      | `PR`      |
//!
//! Either dimension may be `*`, which matches any present value when the key
//! is used as a query.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

use crate::core::error::ReportError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Separator between statistic token segments.
pub const STATISTIC_SEPARATOR: char = ':';

/// Wildcard token for a dimension.
pub const WILDCARD_TOKEN: &str = "*";

// ============================================================================
// SECTION: Dimensions
// ============================================================================

/// One optional dimension of a statistic key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum KeyDimension {
    /// No value for the dimension.
    #[default]
    Absent,
    /// A specific value.
    Exact(String),
    /// Any present value (query keys only).
    Any,
}

impl KeyDimension {
    /// Builds a dimension from optional caller text.
    ///
    /// `None` and blank text map to [`KeyDimension::Absent`], `*` maps to
    /// [`KeyDimension::Any`].
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the value contains the separator.
    pub fn from_optional(raw: Option<&str>) -> Result<Self, ReportError> {
        match raw.map(str::trim) {
            None | Some("") => Ok(Self::Absent),
            Some(WILDCARD_TOKEN) => Ok(Self::Any),
            Some(value) => {
                validate_segment("statistic dimension", value)?;
                Ok(Self::Exact(value.to_string()))
            }
        }
    }

    /// Returns true when this query dimension admits the stored dimension.
    #[must_use]
    pub fn admits(&self, stored: &Self) -> bool {
        match (self, stored) {
            (Self::Absent, Self::Absent) => true,
            (Self::Exact(expected), Self::Exact(actual)) => expected == actual,
            (Self::Any, Self::Exact(_) | Self::Any) => true,
            _ => false,
        }
    }

    /// Returns the concrete value, if any.
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Exact(value) => Some(value),
            Self::Absent | Self::Any => None,
        }
    }

    /// Returns true for [`KeyDimension::Any`].
    #[must_use]
    pub const fn is_wildcard(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Returns the encoded segment text.
    fn segment(&self) -> &str {
        match self {
            Self::Absent => "",
            Self::Exact(value) => value,
            Self::Any => WILDCARD_TOKEN,
        }
    }

    /// Decodes one segment of a token.
    fn decode_segment(segment: &str) -> Result<Self, ReportError> {
        match segment {
            "" => Ok(Self::Absent),
            WILDCARD_TOKEN => Ok(Self::Any),
            value => {
                validate_segment("statistic dimension", value)?;
                Ok(Self::Exact(value.to_string()))
            }
        }
    }
}

// ============================================================================
// SECTION: Statistic Key
// ============================================================================

/// Composite statistic identifier.
///
/// # Invariants
/// - `statistic` is non-empty, contains no separator, and is not `*`.
/// - Encoding then decoding yields an identical key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatisticKey {
    /// Base statistic name.
    statistic: String,
    /// Match key dimension.
    match_key: KeyDimension,
    /// Principle dimension.
    principle: KeyDimension,
}

impl StatisticKey {
    /// Builds a key from a base statistic and two dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when any part is malformed.
    pub fn new(
        statistic: impl Into<String>,
        match_key: KeyDimension,
        principle: KeyDimension,
    ) -> Result<Self, ReportError> {
        let statistic = statistic.into();
        validate_segment("base statistic", &statistic)?;
        if statistic == WILDCARD_TOKEN {
            return Err(ReportError::invalid("base statistic cannot be a wildcard"));
        }
        for dimension in [&match_key, &principle] {
            if let KeyDimension::Exact(value) = dimension {
                validate_segment("statistic dimension", value)?;
            }
        }
        Ok(Self {
            statistic,
            match_key,
            principle,
        })
    }

    /// Builds a key with no dimensions.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the name is malformed.
    pub fn base(statistic: impl Into<String>) -> Result<Self, ReportError> {
        Self::new(statistic, KeyDimension::Absent, KeyDimension::Absent)
    }

    /// Builds a dimensionless key for a well-known statistic.
    #[must_use]
    pub fn of(statistic: ReportStatistic) -> Self {
        Self {
            statistic: statistic.as_str().to_string(),
            match_key: KeyDimension::Absent,
            principle: KeyDimension::Absent,
        }
    }

    /// Returns a copy of this key with the provided dimensions.
    #[must_use]
    pub fn with_dimensions(&self, match_key: KeyDimension, principle: KeyDimension) -> Self {
        Self {
            statistic: self.statistic.clone(),
            match_key,
            principle,
        }
    }

    /// Decodes a stored token.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the token does not follow the
    /// grammar.
    pub fn decode(token: &str) -> Result<Self, ReportError> {
        let mut parts = token.splitn(3, STATISTIC_SEPARATOR);
        let statistic = parts.next().unwrap_or_default();
        let match_segment = parts.next();
        let principle_segment = parts.next();
        let (match_key, principle) = match (match_segment, principle_segment) {
            (None, _) => (KeyDimension::Absent, KeyDimension::Absent),
            (Some(""), None) => {
                return Err(ReportError::Invalid(format!(
                    "statistic token has an empty match key: {token}"
                )));
            }
            (Some(_), Some("")) => {
                return Err(ReportError::Invalid(format!(
                    "statistic token has an empty principle: {token}"
                )));
            }
            (Some(mk), None) => (KeyDimension::decode_segment(mk)?, KeyDimension::Absent),
            (Some(mk), Some(pr)) => {
                (KeyDimension::decode_segment(mk)?, KeyDimension::decode_segment(pr)?)
            }
        };
        Self::new(statistic, match_key, principle)
    }

    /// Encodes the key as a stored token.
    #[must_use]
    pub fn encode(&self) -> String {
        let mut token = self.statistic.clone();
        let has_match_key = self.match_key != KeyDimension::Absent;
        let has_principle = self.principle != KeyDimension::Absent;
        if has_match_key || has_principle {
            token.push(STATISTIC_SEPARATOR);
            token.push_str(self.match_key.segment());
        }
        if has_principle {
            token.push(STATISTIC_SEPARATOR);
            token.push_str(self.principle.segment());
        }
        token
    }

    /// Returns the base statistic name.
    #[must_use]
    pub fn statistic(&self) -> &str {
        &self.statistic
    }

    /// Returns the match key dimension.
    #[must_use]
    pub const fn match_key(&self) -> &KeyDimension {
        &self.match_key
    }

    /// Returns the principle dimension.
    #[must_use]
    pub const fn principle(&self) -> &KeyDimension {
        &self.principle
    }

    /// Returns true when either dimension is a wildcard.
    #[must_use]
    pub const fn has_wildcard(&self) -> bool {
        self.match_key.is_wildcard() || self.principle.is_wildcard()
    }

    /// Returns true when this query key admits the stored key.
    #[must_use]
    pub fn admits(&self, stored: &Self) -> bool {
        self.statistic == stored.statistic
            && self.match_key.admits(&stored.match_key)
            && self.principle.admits(&stored.principle)
    }

    /// Classifies the key into a summary bucket by its base statistic.
    #[must_use]
    pub fn bucket(&self) -> Option<SummaryBucket> {
        self.statistic.parse::<ReportStatistic>().ok().and_then(ReportStatistic::bucket)
    }
}

impl fmt::Display for StatisticKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for StatisticKey {
    type Err = ReportError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        Self::decode(token)
    }
}

// ============================================================================
// SECTION: Well-Known Statistics
// ============================================================================

/// Base statistics written by the ingestion pipeline for source summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatistic {
    /// Entities with at least one record from the data source.
    EntityCount,
    /// Records that did not match any other record.
    UnmatchedCount,
    /// Records matched into a shared entity.
    MatchedCount,
    /// Ambiguous match relations.
    AmbiguousMatchCount,
    /// Possible match relations.
    PossibleMatchCount,
    /// Possible (non-match) relations.
    PossibleRelationCount,
    /// Disclosed relations.
    DisclosedRelationCount,
}

impl ReportStatistic {
    /// All statistics that classify into a summary bucket.
    pub const BUCKETED: [Self; 5] = [
        Self::MatchedCount,
        Self::AmbiguousMatchCount,
        Self::PossibleMatchCount,
        Self::PossibleRelationCount,
        Self::DisclosedRelationCount,
    ];

    /// Returns the stored statistic name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EntityCount => "ENTITY_COUNT",
            Self::UnmatchedCount => "UNMATCHED_COUNT",
            Self::MatchedCount => "MATCHED_COUNT",
            Self::AmbiguousMatchCount => "AMBIGUOUS_MATCH_COUNT",
            Self::PossibleMatchCount => "POSSIBLE_MATCH_COUNT",
            Self::PossibleRelationCount => "POSSIBLE_RELATION_COUNT",
            Self::DisclosedRelationCount => "DISCLOSED_RELATION_COUNT",
        }
    }

    /// Returns the summary bucket for the statistic, if it has one.
    #[must_use]
    pub const fn bucket(self) -> Option<SummaryBucket> {
        match self {
            Self::MatchedCount => Some(SummaryBucket::Matched),
            Self::AmbiguousMatchCount => Some(SummaryBucket::AmbiguousMatch),
            Self::PossibleMatchCount => Some(SummaryBucket::PossibleMatch),
            Self::PossibleRelationCount => Some(SummaryBucket::PossibleRelation),
            Self::DisclosedRelationCount => Some(SummaryBucket::DisclosedRelation),
            Self::EntityCount | Self::UnmatchedCount => None,
        }
    }
}

impl fmt::Display for ReportStatistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportStatistic {
    type Err = ReportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase();
        [
            Self::EntityCount,
            Self::UnmatchedCount,
            Self::MatchedCount,
            Self::AmbiguousMatchCount,
            Self::PossibleMatchCount,
            Self::PossibleRelationCount,
            Self::DisclosedRelationCount,
        ]
        .into_iter()
        .find(|statistic| statistic.as_str() == normalized)
        .ok_or_else(|| ReportError::Invalid(format!("unknown report statistic: {}", raw.trim())))
    }
}

/// Summary buckets a statistic row classifies into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryBucket {
    /// Matched records.
    Matched,
    /// Ambiguous matches.
    AmbiguousMatch,
    /// Possible matches.
    PossibleMatch,
    /// Possible relations.
    PossibleRelation,
    /// Disclosed relations.
    DisclosedRelation,
}

impl SummaryBucket {
    /// Returns the statistic that feeds this bucket.
    #[must_use]
    pub const fn statistic(self) -> ReportStatistic {
        match self {
            Self::Matched => ReportStatistic::MatchedCount,
            Self::AmbiguousMatch => ReportStatistic::AmbiguousMatchCount,
            Self::PossibleMatch => ReportStatistic::PossibleMatchCount,
            Self::PossibleRelation => ReportStatistic::PossibleRelationCount,
            Self::DisclosedRelation => ReportStatistic::DisclosedRelationCount,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates one token segment.
fn validate_segment(label: &str, value: &str) -> Result<(), ReportError> {
    if value.trim().is_empty() {
        return Err(ReportError::Invalid(format!("{label} must be non-empty")));
    }
    if value.contains(STATISTIC_SEPARATOR) {
        return Err(ReportError::Invalid(format!(
            "{label} must not contain '{STATISTIC_SEPARATOR}': {value}"
        )));
    }
    Ok(())
}
