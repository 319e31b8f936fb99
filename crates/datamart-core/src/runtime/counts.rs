// crates/datamart-core/src/runtime/counts.rs
// ============================================================================
// Module: Count Reconciler
// Description: Derives the after-page count from total and before counts.
// Purpose: Keep page counts consistent with the candidate window.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! Only the total and before-page counts are queried. The after-page count is
//! derived so that `before + candidates + after == total`. Counts are read in
//! separate statements; when the underlying data changes between them the
//! derived value can go negative and is clamped to zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::warn;

// ============================================================================
// SECTION: Page Counts
// ============================================================================

/// Total, before-page, and after-page counts for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCounts {
    /// Rows in the whole report scope.
    pub total: i64,
    /// Rows strictly below the candidate window.
    pub before: i64,
    /// Rows strictly above the candidate window.
    pub after: i64,
}

impl PageCounts {
    /// Reconciles queried counts against the candidate count.
    #[must_use]
    pub fn reconcile(total: i64, before: i64, candidate_count: usize) -> Self {
        let candidates = i64::try_from(candidate_count).unwrap_or(i64::MAX);
        let after = total.saturating_sub(candidates).saturating_sub(before);
        if after < 0 {
            warn!(total, before, candidates, "page counts are inconsistent; clamping after count to zero");
            return Self {
                total,
                before,
                after: 0,
            };
        }
        Self {
            total,
            before,
            after,
        }
    }

    /// Returns true when `before + candidates + after == total`.
    #[must_use]
    pub fn is_consistent(&self, candidate_count: usize) -> bool {
        i64::try_from(candidate_count)
            .ok()
            .and_then(|candidates| self.before.checked_add(candidates))
            .and_then(|sum| sum.checked_add(self.after))
            == Some(self.total)
    }
}
