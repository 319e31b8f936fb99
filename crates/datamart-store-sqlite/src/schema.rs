// crates/datamart-store-sqlite/src/schema.rs
// ============================================================================
// Module: Data Mart Schema
// Description: DDL for the aggregate tables report retrieval reads.
// Purpose: Materialize an empty data mart for tooling and tests.
// Dependencies: rusqlite
// ============================================================================

//! ## Overview
//! The ingestion pipeline owns and populates these tables. Retrieval only
//! reads them; the DDL lives here so local tooling can create a compatible
//! empty database.
//!
//! - `sz_dm_report_detail` multiplexes every report slice by `report_key`.
//!   Entity rows carry `related_id = 0`.
//! - `sz_dm_relation` stores each unordered pair once with
//!   `entity_id < related_id`; `match_key` describes that direction and
//!   `rev_match_key` the reverse.

// ============================================================================
// SECTION: Imports
// ============================================================================

use rusqlite::Connection;
use tracing::debug;

use crate::store::SqliteReportError;
use crate::store::db_error;

// ============================================================================
// SECTION: DDL
// ============================================================================

/// Tables and indexes of the data mart.
const SCHEMA_DDL: &str = "
CREATE TABLE IF NOT EXISTS sz_dm_entity (
    entity_id INTEGER PRIMARY KEY,
    entity_name TEXT,
    record_count INTEGER,
    relation_count INTEGER
);
CREATE TABLE IF NOT EXISTS sz_dm_record (
    data_source TEXT NOT NULL,
    record_id TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    match_key TEXT,
    errule_code TEXT,
    PRIMARY KEY (data_source, record_id)
);
CREATE INDEX IF NOT EXISTS sz_dm_record_entity_ix
    ON sz_dm_record (entity_id, data_source, record_id);
CREATE TABLE IF NOT EXISTS sz_dm_relation (
    entity_id INTEGER NOT NULL,
    related_id INTEGER NOT NULL,
    match_type TEXT NOT NULL,
    match_key TEXT,
    rev_match_key TEXT,
    errule_code TEXT,
    PRIMARY KEY (entity_id, related_id),
    CHECK (entity_id < related_id)
);
CREATE TABLE IF NOT EXISTS sz_dm_report (
    report_key TEXT PRIMARY KEY,
    report TEXT NOT NULL,
    statistic TEXT NOT NULL,
    data_source1 TEXT,
    data_source2 TEXT,
    entity_count INTEGER NOT NULL DEFAULT 0,
    record_count INTEGER NOT NULL DEFAULT 0,
    relation_count INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS sz_dm_report_scope_ix
    ON sz_dm_report (report, data_source1, data_source2);
CREATE TABLE IF NOT EXISTS sz_dm_report_detail (
    report_key TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    related_id INTEGER NOT NULL DEFAULT 0,
    stat_count INTEGER NOT NULL DEFAULT 1,
    PRIMARY KEY (report_key, entity_id, related_id)
);
";

// ============================================================================
// SECTION: Initialization
// ============================================================================

/// Creates the data mart tables and indexes if they do not exist.
///
/// # Errors
///
/// Returns [`SqliteReportError::Db`] when `SQLite` rejects the DDL.
pub fn initialize_schema(connection: &Connection) -> Result<(), SqliteReportError> {
    let tx = connection.unchecked_transaction().map_err(|err| db_error(&err))?;
    tx.execute_batch(SCHEMA_DDL).map_err(|err| db_error(&err))?;
    tx.commit().map_err(|err| db_error(&err))?;
    debug!("initialized data mart schema");
    Ok(())
}
