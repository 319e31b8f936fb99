// crates/datamart-core/src/lib.rs
// ============================================================================
// Module: Datamart Core Library
// Description: Public API surface for the datamart reporting core.
// Purpose: Expose report models, codecs, and paging helpers.
// Dependencies: crate::{core, runtime}
// ============================================================================

//! ## Overview
//! Datamart core holds the storage-agnostic half of the paginated report
//! retrieval engine: bound resolution, statistic and report key codecs, page
//! models, paging preconditions, row grouping, sampling, and count
//! reconciliation. Storage backends issue the queries and feed rows through
//! these helpers so every backend pages identically.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use core::*;

pub use runtime::DEFAULT_PAGE_SIZE;
pub use runtime::GroupRow;
pub use runtime::GroupedPage;
pub use runtime::PageCounts;
pub use runtime::PagePlan;
pub use runtime::PageRequest;
pub use runtime::RowGrouper;
pub use runtime::SAMPLE_PAGE_MULTIPLIER;
pub use runtime::group_rows;
pub use runtime::sample_groups;
