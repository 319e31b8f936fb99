// crates/datamart-core/src/core/mod.rs
// ============================================================================
// Module: Datamart Core Types
// Description: Report models, identifiers, and key codecs.
// Purpose: Group the immutable data types shared by every report backend.
// Dependencies: serde, thiserror, percent-encoding
// ============================================================================

//! ## Overview
//! Core types are created fresh per report call and discarded once the caller
//! consumes them. Nothing here performs I/O.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod bound;
pub mod error;
pub mod identifiers;
pub mod model;
pub mod report_key;
pub mod statistic;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use bound::BoundType;
pub use bound::BoundValue;
pub use bound::EntityBound;
pub use bound::RelationBound;
pub use bound::SortDirection;
pub use error::ReportError;
pub use identifiers::DataSourceCatalog;
pub use identifiers::DataSourceCode;
pub use identifiers::EntityId;
pub use model::BucketKey;
pub use model::BucketSet;
pub use model::CountsBucket;
pub use model::CrossSourceSummary;
pub use model::DataSourceCounts;
pub use model::EntitiesPage;
pub use model::EntityRelationsCount;
pub use model::EntitySizeCount;
pub use model::LoadedStats;
pub use model::MatchCounts;
pub use model::MatchCountsSet;
pub use model::RelationCounts;
pub use model::RelationCountsSet;
pub use model::RelationType;
pub use model::RelationsPage;
pub use model::ReportEntity;
pub use model::ReportRecord;
pub use model::ReportRelation;
pub use model::SourceSummary;
pub use report_key::ReportCode;
pub use report_key::ReportKey;
pub use statistic::KeyDimension;
pub use statistic::ReportStatistic;
pub use statistic::StatisticKey;
pub use statistic::SummaryBucket;
