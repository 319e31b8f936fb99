// crates/datamart-store-sqlite/src/counts.rs
// ============================================================================
// Module: Count Reconciler Queries
// Description: Total and before-page counts for report slices.
// Purpose: Feed the count reconciler with two single-row aggregates.
// Dependencies: datamart-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! Two counts are queried per page: every row in the slice, and the rows
//! strictly before the candidate window minimum. The after-page count is
//! derived by [`PageCounts::reconcile`]. An empty page has no window and a
//! before-page count of zero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use datamart_core::EntityId;
use datamart_core::PageCounts;
use datamart_core::ReportKey;
use rusqlite::Connection;
use rusqlite::params;
use tracing::debug;

use crate::query::ENTITY_BEFORE_SQL;
use crate::query::ENTITY_TOTAL_SQL;
use crate::query::RELATION_BEFORE_SQL;
use crate::query::RELATION_TOTAL_SQL;
use crate::store::SqliteReportError;
use crate::store::db_error;

// ============================================================================
// SECTION: Entity Counts
// ============================================================================

/// Reconciles counts for an entity page.
///
/// # Errors
///
/// Returns [`SqliteReportError::Db`] when a count query fails.
pub fn entity_page_counts(
    connection: &Connection,
    report_key: &ReportKey,
    window_minimum: Option<EntityId>,
    candidate_count: usize,
) -> Result<PageCounts, SqliteReportError> {
    let encoded = report_key.encode();
    let total: i64 = connection
        .query_row(ENTITY_TOTAL_SQL, params![encoded], |row| row.get(0))
        .map_err(|err| db_error(&err))?;
    let before: i64 = match window_minimum {
        Some(minimum) => connection
            .query_row(ENTITY_BEFORE_SQL, params![encoded, minimum], |row| row.get(0))
            .map_err(|err| db_error(&err))?,
        None => 0,
    };
    debug!(report_key = %encoded, total, before, candidate_count, "counted entity page");
    Ok(PageCounts::reconcile(total, before, candidate_count))
}

// ============================================================================
// SECTION: Relation Counts
// ============================================================================

/// Reconciles counts for a relation page.
///
/// # Errors
///
/// Returns [`SqliteReportError::Db`] when a count query fails.
pub fn relation_page_counts(
    connection: &Connection,
    report_key: &ReportKey,
    window_minimum: Option<(EntityId, EntityId)>,
    candidate_count: usize,
) -> Result<PageCounts, SqliteReportError> {
    let encoded = report_key.encode();
    let total: i64 = connection
        .query_row(RELATION_TOTAL_SQL, params![encoded], |row| row.get(0))
        .map_err(|err| db_error(&err))?;
    let before: i64 = match window_minimum {
        Some((entity_id, related_id)) => connection
            .query_row(RELATION_BEFORE_SQL, params![encoded, entity_id, related_id], |row| {
                row.get(0)
            })
            .map_err(|err| db_error(&err))?,
        None => 0,
    };
    debug!(report_key = %encoded, total, before, candidate_count, "counted relation page");
    Ok(PageCounts::reconcile(total, before, candidate_count))
}
