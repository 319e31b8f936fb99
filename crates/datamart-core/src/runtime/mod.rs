// crates/datamart-core/src/runtime/mod.rs
// ============================================================================
// Module: Datamart Paging Runtime
// Description: Storage-agnostic steps of page retrieval.
// Purpose: Validate paging inputs, group rows, sample, and reconcile counts.
// Dependencies: rand, tracing
// ============================================================================

//! ## Overview
//! A page retrieval runs its steps in a fixed order: preconditions
//! ([`PagePlan`]), grouping of ordered rows ([`RowGrouper`]), optional
//! sampling ([`sample_groups`]), and count reconciliation ([`PageCounts`]).
//! Each step is a pure function of its inputs; backends only supply rows and
//! counts.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod counts;
pub mod grouper;
pub mod paging;
pub mod sampler;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use counts::PageCounts;
pub use grouper::GroupRow;
pub use grouper::GroupedPage;
pub use grouper::RowGrouper;
pub use grouper::group_rows;
pub use paging::DEFAULT_PAGE_SIZE;
pub use paging::PagePlan;
pub use paging::PageRequest;
pub use paging::SAMPLE_PAGE_MULTIPLIER;
pub use sampler::sample_groups;
