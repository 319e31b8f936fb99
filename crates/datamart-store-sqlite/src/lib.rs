// crates/datamart-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Report Store
// Description: Paginated report retrieval over the SQLite data mart.
// Purpose: Provide the query half of the report engine.
// Dependencies: datamart-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate reads the aggregate tables the ingestion pipeline maintains and
//! answers report queries: cursor-bounded entity and relation pages, summary
//! reports, and breakdowns. Every function takes a borrowed
//! [`rusqlite::Connection`] and holds no state between calls, so concurrent
//! callers only need their own connection each.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod counts;
pub mod entities;
pub mod query;
pub mod relations;
pub mod reports;
pub mod schema;
pub mod store;
pub mod summary;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use entities::retrieve_entities_page;
pub use entities::retrieve_entities_page_with_rng;
pub use relations::retrieve_relations_page;
pub use relations::retrieve_relations_page_with_rng;
pub use reports::cross_source_entities;
pub use reports::cross_source_relations;
pub use reports::entity_size_entities;
pub use reports::relation_breakdown_entities;
pub use reports::source_summary_entities;
pub use schema::initialize_schema;
pub use store::DEFAULT_BUSY_TIMEOUT_MS;
pub use store::SqliteReportConfig;
pub use store::SqliteReportError;
pub use store::open_connection;
pub use summary::cross_source_summary;
pub use summary::entity_relations_breakdown;
pub use summary::entity_relations_count;
pub use summary::entity_size_breakdown;
pub use summary::entity_size_count;
pub use summary::loaded_stats;
pub use summary::source_summary;
