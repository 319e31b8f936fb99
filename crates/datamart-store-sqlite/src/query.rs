// crates/datamart-store-sqlite/src/query.rs
// ============================================================================
// Module: Range Query Builder
// Description: Two-stage scoped range queries over the report detail table.
// Purpose: Select one page of keys, then expand them into record detail.
// Dependencies: datamart-core
// ============================================================================

//! ## Overview
//! Every page query has two stages. The inner stage selects the page keys
//! from `sz_dm_report_detail`: scoped by `report_key`, filtered by the bound,
//! ordered in the scan direction, and limited to the page size. The outer
//! stage joins those keys to entity and record detail, ordered so rows of one
//! key are contiguous with records sorted by `(data_source, record_id)`.
//!
//! Only the comparison operator and sort keyword vary with the bound type;
//! both come from [`BoundType`], so no caller text is ever spliced into SQL.
//! Values bind as numbered parameters:
//!
//! - entity pages: `?1` report key, `?2` bound, `?3` limit.
//! - relation pages: `?1` report key, `?2` entity bound, `?3` related bound,
//!   `?4` limit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use datamart_core::BoundType;

// ============================================================================
// SECTION: Entity Pages
// ============================================================================

/// Builds the entity page query for a bound type.
///
/// Columns: `entity_id, entity_name, record_count, relation_count,
/// data_source, record_id, match_key, errule_code, missing_summary`.
#[must_use]
pub fn entity_page_sql(bound_type: BoundType) -> String {
    let op = bound_type.operator();
    let dir = bound_type.direction().sql_keyword();
    format!(
        "SELECT p.entity_id, e.entity_name, e.record_count, e.relation_count, \
                r.data_source, r.record_id, r.match_key, r.errule_code, \
                e.entity_id IS NULL \
         FROM (SELECT d.entity_id AS entity_id FROM sz_dm_report_detail AS d \
               WHERE d.report_key = ?1 AND d.related_id = 0 AND d.entity_id {op} ?2 \
               ORDER BY d.entity_id {dir} LIMIT ?3) AS p \
         LEFT OUTER JOIN sz_dm_entity AS e ON e.entity_id = p.entity_id \
         LEFT OUTER JOIN sz_dm_record AS r ON r.entity_id = p.entity_id \
         ORDER BY p.entity_id {dir}, r.data_source ASC, r.record_id ASC"
    )
}

/// Counts every entity row in a report slice.
pub const ENTITY_TOTAL_SQL: &str =
    "SELECT COUNT(*) FROM sz_dm_report_detail WHERE report_key = ?1 AND related_id = 0";

/// Counts entity rows strictly below `?2`.
pub const ENTITY_BEFORE_SQL: &str = "SELECT COUNT(*) FROM sz_dm_report_detail \
     WHERE report_key = ?1 AND related_id = 0 AND entity_id < ?2";

// ============================================================================
// SECTION: Relation Pages
// ============================================================================

/// Builds the inner relation key selection.
///
/// The first branch continues within the bound entity; the second moves past
/// it. The second branch is always strict so an inclusive bound does not
/// select the bound entity's pairs twice.
fn relation_keys_sql(bound_type: BoundType) -> String {
    let op = bound_type.operator();
    let strict = bound_type.strict_operator();
    let dir = bound_type.direction().sql_keyword();
    format!(
        "SELECT entity_id, related_id FROM \
           (SELECT d.entity_id AS entity_id, d.related_id AS related_id \
            FROM sz_dm_report_detail AS d \
            WHERE d.report_key = ?1 AND d.related_id <> 0 \
              AND d.entity_id = ?2 AND d.related_id {op} ?3 \
            ORDER BY d.entity_id {dir}, d.related_id {dir} LIMIT ?4) \
         UNION \
         SELECT entity_id, related_id FROM \
           (SELECT d.entity_id AS entity_id, d.related_id AS related_id \
            FROM sz_dm_report_detail AS d \
            WHERE d.report_key = ?1 AND d.related_id <> 0 AND d.entity_id {strict} ?2 \
            ORDER BY d.entity_id {dir}, d.related_id {dir} LIMIT ?4)"
    )
}

/// Builds one side of the relation expansion.
///
/// `side_column` names the key column whose records populate the side.
fn relation_side_sql(keys: &str, side: i64, side_column: &str) -> String {
    format!(
        "SELECT p.entity_id AS entity_id, p.related_id AS related_id, {side} AS side, \
                e.entity_name, e.record_count, e.relation_count, \
                r.data_source AS data_source, r.record_id AS record_id, \
                r.match_key, r.errule_code, \
                rel.match_type, \
                CASE WHEN p.related_id < p.entity_id \
                     THEN rel.rev_match_key ELSE rel.match_key END, \
                rel.errule_code, \
                e.entity_id IS NULL \
         FROM ({keys}) AS p \
         LEFT OUTER JOIN sz_dm_relation AS rel \
           ON (rel.entity_id = p.entity_id AND rel.related_id = p.related_id) \
           OR (rel.entity_id = p.related_id AND rel.related_id = p.entity_id) \
         LEFT OUTER JOIN sz_dm_entity AS e ON e.entity_id = p.{side_column} \
         LEFT OUTER JOIN sz_dm_record AS r ON r.entity_id = p.{side_column}"
    )
}

/// Builds the relation page query for a bound type.
///
/// Columns: `entity_id, related_id, side, entity_name, record_count,
/// relation_count, data_source, record_id, record match_key, record
/// errule_code, match_type, normalized match_key, relation errule_code,
/// missing_summary`.
/// `side` is `0` for rows describing the primary entity and `1` for the
/// related entity.
#[must_use]
pub fn relation_page_sql(bound_type: BoundType) -> String {
    let keys = relation_keys_sql(bound_type);
    let dir = bound_type.direction().sql_keyword();
    let primary = relation_side_sql(&keys, PRIMARY_SIDE, "entity_id");
    let related = relation_side_sql(&keys, RELATED_SIDE, "related_id");
    format!("{primary} UNION ALL {related} ORDER BY 1 {dir}, 2 {dir}, 3 ASC, 7 ASC, 8 ASC")
}

/// `side` value of rows describing the primary entity.
pub const PRIMARY_SIDE: i64 = 0;
/// `side` value of rows describing the related entity.
pub const RELATED_SIDE: i64 = 1;

/// Counts every relation row in a report slice.
pub const RELATION_TOTAL_SQL: &str =
    "SELECT COUNT(*) FROM sz_dm_report_detail WHERE report_key = ?1 AND related_id <> 0";

/// Counts relation rows ordered strictly below `(?2, ?3)`.
pub const RELATION_BEFORE_SQL: &str = "SELECT COUNT(*) FROM sz_dm_report_detail \
     WHERE report_key = ?1 AND related_id <> 0 \
       AND (entity_id < ?2 OR (entity_id = ?2 AND related_id < ?3))";
