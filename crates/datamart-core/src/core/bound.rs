// crates/datamart-core/src/core/bound.rs
// ============================================================================
// Module: Page Bound Resolver
// Description: Cursor bound parsing and bound-type semantics.
// Purpose: Turn caller-supplied bound text into comparable values and a scan
//          direction.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A page bound is the cursor position a caller resumes from. Entity bounds
//! are an integer or the `max` sentinel; relation bounds are an
//! `entity:related` pair whose halves parse independently. The bound type
//! selects the comparison operator and the scan direction: lower variants
//! scan ascending, upper variants scan descending.

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

/// Sentinel token for the largest representable bound value.
pub const MAX_BOUND_TOKEN: &str = "max";

/// Separator between the entity and related halves of a relation bound.
pub const RELATION_BOUND_SEPARATOR: char = ':';

// ============================================================================
// SECTION: Bound Type
// ============================================================================

/// Scan direction derived from a bound type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    /// Smallest keys first.
    Ascending,
    /// Largest keys first.
    Descending,
}

impl SortDirection {
    /// Returns the SQL ordering keyword.
    #[must_use]
    pub const fn sql_keyword(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Bound type controlling comparison and scan direction.
///
/// # Invariants
/// - Lower variants always scan ascending; upper variants always descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BoundType {
    /// Keys greater than or equal to the bound.
    InclusiveLower,
    /// Keys strictly greater than the bound.
    ExclusiveLower,
    /// Keys less than or equal to the bound.
    InclusiveUpper,
    /// Keys strictly less than the bound.
    ExclusiveUpper,
}

impl BoundType {
    /// Infers the bound type from raw bound text.
    ///
    /// The `max` sentinel (alone or as the entity half of a pair) implies
    /// [`BoundType::ExclusiveUpper`]; anything else implies
    /// [`BoundType::ExclusiveLower`].
    #[must_use]
    pub fn infer(raw: Option<&str>) -> Self {
        let leading = raw.map(|text| match text.split_once(RELATION_BOUND_SEPARATOR) {
            Some((entity, _)) => entity,
            None => text,
        });
        match leading {
            Some(text) if is_max_token(text) => Self::ExclusiveUpper,
            _ => Self::ExclusiveLower,
        }
    }

    /// Returns true for the lower-bound variants.
    #[must_use]
    pub const fn is_lower(self) -> bool {
        matches!(self, Self::InclusiveLower | Self::ExclusiveLower)
    }

    /// Returns true for the inclusive variants.
    #[must_use]
    pub const fn is_inclusive(self) -> bool {
        matches!(self, Self::InclusiveLower | Self::InclusiveUpper)
    }

    /// Returns the SQL comparison operator for this bound type.
    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::InclusiveLower => ">=",
            Self::ExclusiveLower => ">",
            Self::InclusiveUpper => "<=",
            Self::ExclusiveUpper => "<",
        }
    }

    /// Returns the strict operator for the same direction.
    #[must_use]
    pub const fn strict_operator(self) -> &'static str {
        if self.is_lower() { ">" } else { "<" }
    }

    /// Returns the scan direction.
    #[must_use]
    pub const fn direction(self) -> SortDirection {
        if self.is_lower() { SortDirection::Ascending } else { SortDirection::Descending }
    }

    /// Returns true when `value` lies on the admitted side of `bound`.
    #[must_use]
    pub const fn admits(self, value: i64, bound: i64) -> bool {
        match self {
            Self::InclusiveLower => value >= bound,
            Self::ExclusiveLower => value > bound,
            Self::InclusiveUpper => value <= bound,
            Self::ExclusiveUpper => value < bound,
        }
    }

    /// Returns the stable wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InclusiveLower => "INCLUSIVE_LOWER",
            Self::ExclusiveLower => "EXCLUSIVE_LOWER",
            Self::InclusiveUpper => "INCLUSIVE_UPPER",
            Self::ExclusiveUpper => "EXCLUSIVE_UPPER",
        }
    }
}

impl fmt::Display for BoundType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BoundType {
    type Err = ReportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "INCLUSIVE_LOWER" => Ok(Self::InclusiveLower),
            "EXCLUSIVE_LOWER" => Ok(Self::ExclusiveLower),
            "INCLUSIVE_UPPER" => Ok(Self::InclusiveUpper),
            "EXCLUSIVE_UPPER" => Ok(Self::ExclusiveUpper),
            _ => Err(ReportError::Invalid(format!("unsupported bound type: {}", raw.trim()))),
        }
    }
}

// ============================================================================
// SECTION: Bound Values
// ============================================================================

/// A single bound value: an integer or the `max` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundValue {
    /// Concrete integer bound.
    Value(i64),
    /// Largest representable value.
    Max,
}

impl BoundValue {
    /// Parses an integer literal or the case-insensitive `max` token.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] for any other text.
    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        let trimmed = raw.trim();
        if is_max_token(trimmed) {
            return Ok(Self::Max);
        }
        trimmed.parse::<i64>().map(Self::Value).map_err(|_| {
            ReportError::Invalid(format!(
                "bound must be an integer or \"{MAX_BOUND_TOKEN}\": {trimmed}"
            ))
        })
    }

    /// Returns the default value used when no bound text is supplied.
    #[must_use]
    pub const fn default_for(bound_type: BoundType) -> Self {
        if bound_type.is_lower() { Self::Value(0) } else { Self::Max }
    }

    /// Returns the comparable integer value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Value(value) => value,
            Self::Max => i64::MAX,
        }
    }
}

impl fmt::Display for BoundValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => value.fmt(f),
            Self::Max => f.write_str(MAX_BOUND_TOKEN),
        }
    }
}

/// Resolved bound for entity pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityBound {
    /// Bound value.
    pub value: BoundValue,
    /// Effective bound type.
    pub bound_type: BoundType,
}

impl EntityBound {
    /// Resolves raw bound text and an optional bound type.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the bound text is malformed.
    pub fn resolve(raw: Option<&str>, bound_type: Option<BoundType>) -> Result<Self, ReportError> {
        let raw = raw.filter(|text| !text.trim().is_empty());
        let bound_type = bound_type.unwrap_or_else(|| BoundType::infer(raw));
        let value = match raw {
            Some(text) => BoundValue::parse(text)?,
            None => BoundValue::default_for(bound_type),
        };
        Ok(Self {
            value,
            bound_type,
        })
    }
}

impl fmt::Display for EntityBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

/// Resolved bound for relation pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationBound {
    /// Bound on the primary entity id.
    pub entity: BoundValue,
    /// Bound on the related entity id.
    pub related: BoundValue,
    /// Effective bound type.
    pub bound_type: BoundType,
}

impl RelationBound {
    /// Resolves raw `entity:related` text and an optional bound type.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when either half is malformed or the
    /// text starts with the separator.
    pub fn resolve(raw: Option<&str>, bound_type: Option<BoundType>) -> Result<Self, ReportError> {
        let raw = raw.map(str::trim).filter(|text| !text.is_empty());
        let bound_type = bound_type.unwrap_or_else(|| BoundType::infer(raw));
        let fallback = BoundValue::default_for(bound_type);
        let Some(text) = raw else {
            return Ok(Self {
                entity: fallback,
                related: fallback,
                bound_type,
            });
        };
        let (entity_text, related_text) = match text.split_once(RELATION_BOUND_SEPARATOR) {
            Some(("", _)) => {
                return Err(ReportError::Invalid(format!(
                    "relation bound must start with an entity bound: {text}"
                )));
            }
            Some((entity, related)) => (entity, Some(related)),
            None => (text, None),
        };
        let entity = BoundValue::parse(entity_text)?;
        let related = match related_text.filter(|half| !half.trim().is_empty()) {
            Some(half) => BoundValue::parse(half)?,
            None => fallback,
        };
        Ok(Self {
            entity,
            related,
            bound_type,
        })
    }

    /// Returns the comparable `(entity, related)` pair.
    #[must_use]
    pub const fn as_pair(&self) -> (i64, i64) {
        (self.entity.as_i64(), self.related.as_i64())
    }
}

impl fmt::Display for RelationBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{RELATION_BOUND_SEPARATOR}{}", self.entity, self.related)
    }
}

/// Formats an `(entity, related)` key pair in bound grammar.
#[must_use]
pub fn format_pair(pair: (i64, i64)) -> String {
    format!("{}{RELATION_BOUND_SEPARATOR}{}", pair.0, pair.1)
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns true for the case-insensitive `max` token.
fn is_max_token(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(MAX_BOUND_TOKEN)
}
