// crates/datamart-core/src/runtime/paging.rs
// ============================================================================
// Module: Paging Preconditions
// Description: Caller paging parameters and their validated plan.
// Purpose: Reject inconsistent page and sample sizes before any query runs.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`PageRequest`] is what the caller asked for; a [`PagePlan`] is the
//! validated page and sample size the backend executes. Bound text is
//! resolved alongside the plan so every precondition fails before storage is
//! touched.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::bound::BoundType;
use crate::core::bound::EntityBound;
use crate::core::bound::RelationBound;
use crate::core::error::ReportError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Page size used when the caller supplies neither page nor sample size.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Page size multiplier applied to a sample size when no page size is given.
pub const SAMPLE_PAGE_MULTIPLIER: usize = 20;

// ============================================================================
// SECTION: Request
// ============================================================================

/// Caller-supplied paging parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Raw bound text.
    #[serde(default)]
    pub bound: Option<String>,
    /// Requested bound type.
    #[serde(default)]
    pub bound_type: Option<BoundType>,
    /// Requested page size.
    #[serde(default)]
    pub page_size: Option<usize>,
    /// Requested sample size.
    #[serde(default)]
    pub sample_size: Option<usize>,
}

impl PageRequest {
    /// Request with every parameter defaulted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the bound text.
    #[must_use]
    pub fn with_bound(mut self, bound: impl Into<String>) -> Self {
        self.bound = Some(bound.into());
        self
    }

    /// Sets the bound type.
    #[must_use]
    pub const fn with_bound_type(mut self, bound_type: BoundType) -> Self {
        self.bound_type = Some(bound_type);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the sample size.
    #[must_use]
    pub const fn with_sample_size(mut self, sample_size: usize) -> Self {
        self.sample_size = Some(sample_size);
        self
    }

    /// Validates the page and sample sizes.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] per [`PagePlan::new`].
    pub fn plan(&self) -> Result<PagePlan, ReportError> {
        PagePlan::new(self.page_size, self.sample_size)
    }

    /// Resolves the bound for an entity page.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the bound text is malformed.
    pub fn entity_bound(&self) -> Result<EntityBound, ReportError> {
        EntityBound::resolve(self.bound.as_deref(), self.bound_type)
    }

    /// Resolves the bound for a relation page.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the bound text is malformed.
    pub fn relation_bound(&self) -> Result<RelationBound, ReportError> {
        RelationBound::resolve(self.bound.as_deref(), self.bound_type)
    }
}

// ============================================================================
// SECTION: Plan
// ============================================================================

/// Validated page and sample size.
///
/// # Invariants
/// - `page_size >= 1`.
/// - When present, `1 <= sample_size < page_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PagePlan {
    /// Number of candidates scanned for the page.
    page_size: usize,
    /// Number of candidates displayed after sampling.
    sample_size: Option<usize>,
}

impl PagePlan {
    /// Validates caller sizes and applies defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when either size is zero, when the
    /// sample size is not smaller than the page size, or when the derived
    /// page size overflows.
    pub fn new(page_size: Option<usize>, sample_size: Option<usize>) -> Result<Self, ReportError> {
        if page_size == Some(0) {
            return Err(ReportError::invalid("page size must be at least 1"));
        }
        if sample_size == Some(0) {
            return Err(ReportError::invalid("sample size must be at least 1"));
        }
        let page_size = match (page_size, sample_size) {
            (Some(page), Some(sample)) if sample >= page => {
                return Err(ReportError::Invalid(format!(
                    "sample size ({sample}) must be less than page size ({page})"
                )));
            }
            (Some(page), _) => page,
            (None, Some(sample)) => sample.checked_mul(SAMPLE_PAGE_MULTIPLIER).ok_or_else(|| {
                ReportError::Invalid(format!("sample size is too large: {sample}"))
            })?,
            (None, None) => DEFAULT_PAGE_SIZE,
        };
        Ok(Self {
            page_size,
            sample_size,
        })
    }

    /// Returns the page size.
    #[must_use]
    pub const fn page_size(&self) -> usize {
        self.page_size
    }

    /// Returns the sample size.
    #[must_use]
    pub const fn sample_size(&self) -> Option<usize> {
        self.sample_size
    }

    /// Returns the page size as a SQL `LIMIT` value.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::Invalid`] when the page size exceeds `i64`.
    pub fn limit(&self) -> Result<i64, ReportError> {
        i64::try_from(self.page_size)
            .map_err(|_| ReportError::Invalid(format!("page size is too large: {}", self.page_size)))
    }
}
