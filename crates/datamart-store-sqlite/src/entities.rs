// crates/datamart-store-sqlite/src/entities.rs
// ============================================================================
// Module: Entity Page Retrieval
// Description: Bounded, resumable pages of entities from a report slice.
// Purpose: Run the entity page query and assemble the page result.
// Dependencies: datamart-core, rand, rusqlite, tracing
// ============================================================================

//! ## Overview
//! Retrieval validates every precondition, runs the two-stage page query,
//! groups rows into entities in scan direction, samples, re-sorts ascending
//! for display, and reconciles counts against the pre-sample candidates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use datamart_core::EntitiesPage;
use datamart_core::EntityId;
use datamart_core::GroupRow;
use datamart_core::PageRequest;
use datamart_core::ReportEntity;
use datamart_core::ReportKey;
use datamart_core::ReportRecord;
use datamart_core::group_rows;
use datamart_core::sample_groups;
use rand::Rng;
use rusqlite::Connection;
use rusqlite::params;
use tracing::debug;
use tracing::warn;

use crate::counts::entity_page_counts;
use crate::query::entity_page_sql;
use crate::store::SqliteReportError;
use crate::store::db_error;

// ============================================================================
// SECTION: Rows
// ============================================================================

/// One flattened `(entity, record)` row of the entity page query.
struct EntityRow {
    /// Entity identifier.
    entity_id: EntityId,
    /// Entity display name.
    entity_name: Option<String>,
    /// Records in the entity.
    record_count: Option<i64>,
    /// Relations of the entity.
    relation_count: Option<i64>,
    /// Record carried by this row, if the entity has any.
    record: Option<ReportRecord>,
    /// True when no entity summary row exists.
    missing_summary: bool,
}

impl EntityRow {
    /// Maps one result row.
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let data_source: Option<String> = row.get(4)?;
        let record_id: Option<String> = row.get(5)?;
        let record = match (data_source, record_id) {
            (Some(data_source), Some(record_id)) => Some(ReportRecord {
                data_source,
                record_id,
                match_key: row.get(6)?,
                principle: row.get(7)?,
            }),
            _ => None,
        };
        Ok(Self {
            entity_id: row.get(0)?,
            entity_name: row.get(1)?,
            record_count: row.get(2)?,
            relation_count: row.get(3)?,
            record,
            missing_summary: row.get(8)?,
        })
    }
}

impl GroupRow for EntityRow {
    type Group = ReportEntity;
    type Key = EntityId;

    fn key(&self) -> EntityId {
        self.entity_id
    }

    fn start(self) -> ReportEntity {
        if self.missing_summary {
            warn!(entity_id = self.entity_id, "entity summary row missing");
        }
        let mut entity = ReportEntity::new(self.entity_id);
        entity.entity_name = self.entity_name;
        entity.record_count = self.record_count;
        entity.relation_count = self.relation_count;
        if let Some(record) = self.record {
            entity.add_record(record);
        }
        entity
    }

    fn merge_into(self, group: &mut ReportEntity) {
        if let Some(record) = self.record {
            group.add_record(record);
        }
    }
}

// ============================================================================
// SECTION: Retrieval
// ============================================================================

/// Retrieves one page of entities from a report slice.
///
/// # Errors
///
/// Returns [`SqliteReportError::Invalid`] for malformed paging input or a
/// wildcard scope (before any query runs) and [`SqliteReportError::Db`] when a
/// query fails.
pub fn retrieve_entities_page(
    connection: &Connection,
    report_key: &ReportKey,
    request: &PageRequest,
) -> Result<EntitiesPage, SqliteReportError> {
    retrieve_entities_page_with_rng(connection, report_key, request, &mut rand::thread_rng())
}

/// Retrieves one page of entities using the provided sampling source.
///
/// # Errors
///
/// See [`retrieve_entities_page`].
pub fn retrieve_entities_page_with_rng<R>(
    connection: &Connection,
    report_key: &ReportKey,
    request: &PageRequest,
    rng: &mut R,
) -> Result<EntitiesPage, SqliteReportError>
where
    R: Rng + ?Sized,
{
    report_key.ensure_pageable()?;
    let plan = request.plan()?;
    let bound = request.entity_bound()?;
    let limit = plan.limit()?;
    let encoded = report_key.encode();
    debug!(
        report_key = %encoded,
        bound = %bound,
        bound_type = %bound.bound_type,
        page_size = plan.page_size(),
        "querying entity page"
    );

    let grouped = {
        let mut statement =
            connection.prepare(&entity_page_sql(bound.bound_type)).map_err(|err| db_error(&err))?;
        let rows = statement
            .query_map(params![encoded, bound.value.as_i64(), limit], EntityRow::from_row)
            .map_err(|err| db_error(&err))?;
        group_rows(rows.map(|row| row.map_err(|err| db_error(&err))), plan.page_size())?
    };

    let candidate_count = grouped.candidate_count();
    let (minimum, maximum) = (grouped.minimum, grouped.maximum);
    let candidates: Vec<ReportEntity> = grouped.groups.into_iter().map(|(_, entity)| entity).collect();
    let mut entities = sample_groups(candidates, plan.sample_size(), rng);
    entities.sort_by_key(|entity| entity.entity_id);

    let counts = entity_page_counts(connection, report_key, minimum, candidate_count)?;
    Ok(EntitiesPage {
        bound: bound.to_string(),
        bound_type: bound.bound_type,
        page_size: plan.page_size(),
        sample_size: plan.sample_size(),
        page_minimum_value: minimum,
        page_maximum_value: maximum,
        total_entity_count: counts.total,
        before_page_count: counts.before,
        after_page_count: counts.after,
        entities,
        candidate_count,
    })
}
