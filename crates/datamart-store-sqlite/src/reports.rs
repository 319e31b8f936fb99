// crates/datamart-store-sqlite/src/reports.rs
// ============================================================================
// Module: Report Page Shortcuts
// Description: Page retrieval for each report category.
// Purpose: Build the report scope key from typed arguments and page it.
// Dependencies: datamart-core, rusqlite
// ============================================================================

//! ## Overview
//! Each shortcut validates its data sources against the catalog and decodes
//! its statistic token before delegating to the generic page retrieval.

// ============================================================================
// SECTION: Imports
// ============================================================================

use datamart_core::DataSourceCatalog;
use datamart_core::EntitiesPage;
use datamart_core::PageRequest;
use datamart_core::RelationsPage;
use datamart_core::ReportKey;
use datamart_core::StatisticKey;
use rusqlite::Connection;

use crate::entities::retrieve_entities_page;
use crate::relations::retrieve_relations_page;
use crate::store::SqliteReportError;

// ============================================================================
// SECTION: Breakdown Pages
// ============================================================================

/// Pages the entities that have exactly `entity_size` records.
///
/// # Errors
///
/// Returns [`SqliteReportError::Invalid`] when the size is less than one or
/// the paging input is malformed; see [`retrieve_entities_page`].
pub fn entity_size_entities(
    connection: &Connection,
    entity_size: i64,
    request: &PageRequest,
) -> Result<EntitiesPage, SqliteReportError> {
    retrieve_entities_page(connection, &ReportKey::entity_size(entity_size)?, request)
}

/// Pages the entities that have exactly `relation_count` relations.
///
/// # Errors
///
/// Returns [`SqliteReportError::Invalid`] when the count is negative or the
/// paging input is malformed; see [`retrieve_entities_page`].
pub fn relation_breakdown_entities(
    connection: &Connection,
    relation_count: i64,
    request: &PageRequest,
) -> Result<EntitiesPage, SqliteReportError> {
    retrieve_entities_page(connection, &ReportKey::entity_relations(relation_count)?, request)
}

// ============================================================================
// SECTION: Source Pages
// ============================================================================

/// Pages the entities behind one data source summary statistic.
///
/// # Errors
///
/// Returns [`SqliteReportError::Invalid`] for an unknown data source or a
/// malformed statistic; see [`retrieve_entities_page`].
pub fn source_summary_entities(
    connection: &Connection,
    catalog: &DataSourceCatalog,
    data_source: &str,
    statistic: &str,
    request: &PageRequest,
) -> Result<EntitiesPage, SqliteReportError> {
    let data_source = catalog.require(data_source)?;
    let report_key = ReportKey::data_source_summary(data_source, StatisticKey::decode(statistic)?);
    retrieve_entities_page(connection, &report_key, request)
}

/// Pages the entities behind one cross source statistic.
///
/// # Errors
///
/// Returns [`SqliteReportError::Invalid`] for an unknown data source or a
/// malformed statistic; see [`retrieve_entities_page`].
pub fn cross_source_entities(
    connection: &Connection,
    catalog: &DataSourceCatalog,
    data_source: &str,
    versus: &str,
    statistic: &str,
    request: &PageRequest,
) -> Result<EntitiesPage, SqliteReportError> {
    let report_key = cross_source_key(catalog, data_source, versus, statistic)?;
    retrieve_entities_page(connection, &report_key, request)
}

/// Pages the relations behind one cross source statistic.
///
/// # Errors
///
/// Returns [`SqliteReportError::Invalid`] for an unknown data source or a
/// malformed statistic; see [`retrieve_relations_page`].
pub fn cross_source_relations(
    connection: &Connection,
    catalog: &DataSourceCatalog,
    data_source: &str,
    versus: &str,
    statistic: &str,
    request: &PageRequest,
) -> Result<RelationsPage, SqliteReportError> {
    let report_key = cross_source_key(catalog, data_source, versus, statistic)?;
    retrieve_relations_page(connection, &report_key, request)
}

/// Builds a cross source scope key from caller text.
fn cross_source_key(
    catalog: &DataSourceCatalog,
    data_source: &str,
    versus: &str,
    statistic: &str,
) -> Result<ReportKey, SqliteReportError> {
    Ok(ReportKey::cross_source_summary(
        catalog.require(data_source)?,
        catalog.require(versus)?,
        StatisticKey::decode(statistic)?,
    ))
}
