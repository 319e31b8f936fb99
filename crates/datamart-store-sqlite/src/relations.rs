// crates/datamart-store-sqlite/src/relations.rs
// ============================================================================
// Module: Relation Page Retrieval
// Description: Bounded, resumable pages of relations from a report slice.
// Purpose: Run the relation page query and assemble the page result.
// Dependencies: datamart-core, rand, rusqlite, tracing
// ============================================================================

//! ## Overview
//! Relation pages are keyed by `(entity_id, related_id)`. The expansion query
//! returns rows for both sides of each pair; rows tagged with the primary
//! side populate [`ReportRelation::entity`], rows tagged with the related
//! side populate [`ReportRelation::related_entity`]. The match key arrives
//! already normalized to the presented direction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use datamart_core::EntityId;
use datamart_core::GroupRow;
use datamart_core::PageRequest;
use datamart_core::RelationType;
use datamart_core::RelationsPage;
use datamart_core::ReportEntity;
use datamart_core::ReportKey;
use datamart_core::ReportRecord;
use datamart_core::ReportRelation;
use datamart_core::core::bound::format_pair;
use datamart_core::group_rows;
use datamart_core::sample_groups;
use rand::Rng;
use rusqlite::Connection;
use rusqlite::params;
use tracing::debug;
use tracing::warn;

use crate::counts::relation_page_counts;
use crate::query::PRIMARY_SIDE;
use crate::query::relation_page_sql;
use crate::store::SqliteReportError;
use crate::store::db_error;

// ============================================================================
// SECTION: Rows
// ============================================================================

/// Relation pair key.
type PairKey = (EntityId, EntityId);

/// One flattened row of the relation page query as read from `SQLite`.
struct RawRelationRow {
    /// Relation pair.
    key: PairKey,
    /// Side the row describes.
    side: i64,
    /// Entity display name for the side.
    entity_name: Option<String>,
    /// Records of the side entity.
    record_count: Option<i64>,
    /// Relations of the side entity.
    relation_count: Option<i64>,
    /// Record of the side entity carried by this row.
    record: Option<ReportRecord>,
    /// Stored relation category.
    match_type: Option<String>,
    /// Direction-normalized match key.
    match_key: Option<String>,
    /// Relation principle.
    principle: Option<String>,
    /// True when the side entity has no summary row.
    missing_summary: bool,
}

impl RawRelationRow {
    /// Maps one result row.
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        let data_source: Option<String> = row.get(6)?;
        let record_id: Option<String> = row.get(7)?;
        let record = match (data_source, record_id) {
            (Some(data_source), Some(record_id)) => Some(ReportRecord {
                data_source,
                record_id,
                match_key: row.get(8)?,
                principle: row.get(9)?,
            }),
            _ => None,
        };
        Ok(Self {
            key: (row.get(0)?, row.get(1)?),
            side: row.get(2)?,
            entity_name: row.get(3)?,
            record_count: row.get(4)?,
            relation_count: row.get(5)?,
            record,
            match_type: row.get(10)?,
            match_key: row.get(11)?,
            principle: row.get(12)?,
            missing_summary: row.get(13)?,
        })
    }
}

/// A relation row whose category has been validated.
struct RelationRow {
    /// Raw row values.
    raw: RawRelationRow,
    /// Parsed relation category.
    relation_type: RelationType,
}

impl TryFrom<RawRelationRow> for RelationRow {
    type Error = SqliteReportError;

    fn try_from(raw: RawRelationRow) -> Result<Self, Self::Error> {
        let Some(match_type) = raw.match_type.as_deref() else {
            return Err(SqliteReportError::Corrupt(format!(
                "relation summary row missing for {}",
                format_pair(raw.key)
            )));
        };
        let relation_type = match_type.parse::<RelationType>()?;
        Ok(Self {
            raw,
            relation_type,
        })
    }
}

impl RelationRow {
    /// Folds the side described by this row into `relation`.
    fn apply(self, relation: &mut ReportRelation) {
        let raw = self.raw;
        let target = if raw.side == PRIMARY_SIDE {
            &mut relation.entity
        } else {
            &mut relation.related_entity
        };
        if target.entity_name.is_none() {
            target.entity_name = raw.entity_name;
        }
        if target.record_count.is_none() {
            target.record_count = raw.record_count;
        }
        if target.relation_count.is_none() {
            target.relation_count = raw.relation_count;
        }
        if let Some(record) = raw.record {
            target.add_record(record);
        }
    }
}

impl GroupRow for RelationRow {
    type Group = ReportRelation;
    type Key = PairKey;

    fn key(&self) -> PairKey {
        self.raw.key
    }

    fn start(self) -> ReportRelation {
        let (entity_id, related_id) = self.raw.key;
        let mut relation = ReportRelation {
            entity: ReportEntity::new(entity_id),
            related_entity: ReportEntity::new(related_id),
            relation_type: self.relation_type,
            match_key: self.raw.match_key.clone(),
            principle: self.raw.principle.clone(),
        };
        self.merge_into(&mut relation);
        relation
    }

    fn merge_into(self, group: &mut ReportRelation) {
        if self.raw.missing_summary {
            let side_id = if self.raw.side == PRIMARY_SIDE { self.raw.key.0 } else { self.raw.key.1 };
            warn!(entity_id = side_id, "entity summary row missing");
        }
        self.apply(group);
    }
}

// ============================================================================
// SECTION: Retrieval
// ============================================================================

/// Retrieves one page of relations from a report slice.
///
/// # Errors
///
/// Returns [`SqliteReportError::Invalid`] for malformed paging input or a
/// wildcard scope (before any query runs), [`SqliteReportError::Corrupt`]
/// when a relation lacks its summary row or carries an unknown category, and
/// [`SqliteReportError::Db`] when a query fails.
pub fn retrieve_relations_page(
    connection: &Connection,
    report_key: &ReportKey,
    request: &PageRequest,
) -> Result<RelationsPage, SqliteReportError> {
    retrieve_relations_page_with_rng(connection, report_key, request, &mut rand::thread_rng())
}

/// Retrieves one page of relations using the provided sampling source.
///
/// # Errors
///
/// See [`retrieve_relations_page`].
pub fn retrieve_relations_page_with_rng<R>(
    connection: &Connection,
    report_key: &ReportKey,
    request: &PageRequest,
    rng: &mut R,
) -> Result<RelationsPage, SqliteReportError>
where
    R: Rng + ?Sized,
{
    report_key.ensure_pageable()?;
    let plan = request.plan()?;
    let bound = request.relation_bound()?;
    let limit = plan.limit()?;
    let (entity_bound, related_bound) = bound.as_pair();
    let encoded = report_key.encode();
    debug!(
        report_key = %encoded,
        bound = %bound,
        bound_type = %bound.bound_type,
        page_size = plan.page_size(),
        "querying relation page"
    );

    let grouped = {
        let mut statement = connection
            .prepare(&relation_page_sql(bound.bound_type))
            .map_err(|err| db_error(&err))?;
        let rows = statement
            .query_map(
                params![encoded, entity_bound, related_bound, limit],
                RawRelationRow::from_row,
            )
            .map_err(|err| db_error(&err))?;
        group_rows(
            rows.map(|row| row.map_err(|err| db_error(&err)).and_then(RelationRow::try_from)),
            plan.page_size(),
        )?
    };

    let candidate_count = grouped.candidate_count();
    let (minimum, maximum) = (grouped.minimum, grouped.maximum);
    let candidates: Vec<ReportRelation> =
        grouped.groups.into_iter().map(|(_, relation)| relation).collect();
    let mut relations = sample_groups(candidates, plan.sample_size(), rng);
    relations.sort_by_key(ReportRelation::key);

    let counts = relation_page_counts(connection, report_key, minimum, candidate_count)?;
    Ok(RelationsPage {
        bound: bound.to_string(),
        bound_type: bound.bound_type,
        page_size: plan.page_size(),
        sample_size: plan.sample_size(),
        page_minimum_value: minimum.map(format_pair),
        page_maximum_value: maximum.map(format_pair),
        total_relation_count: counts.total,
        before_page_count: counts.before,
        after_page_count: counts.after,
        relations,
        candidate_count,
    })
}
