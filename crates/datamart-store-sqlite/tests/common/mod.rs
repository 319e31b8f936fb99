// crates/datamart-store-sqlite/tests/common/mod.rs
// ============================================================================
// Module: Data Mart Test Fixtures
// Description: In-memory data mart builders shared by store tests.
// Purpose: Populate the aggregate tables the way ingestion would.
// ============================================================================

//! Shared fixtures for `SQLite` report store tests.

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "Fixtures are shared across test binaries that use different subsets."
)]

use datamart_core::DataSourceCatalog;
use datamart_core::ReportCode;
use datamart_core::ReportKey;
use datamart_core::StatisticKey;
use datamart_store_sqlite::initialize_schema;
use rusqlite::Connection;
use rusqlite::params;

/// Opens an in-memory data mart with the schema applied.
pub fn memory_mart() -> Connection {
    let connection = Connection::open_in_memory().expect("open in-memory db");
    initialize_schema(&connection).expect("schema");
    connection
}

/// Catalog with the given data source codes.
pub fn catalog(codes: &[&str]) -> DataSourceCatalog {
    DataSourceCatalog::from_codes(codes.iter().copied()).expect("catalog")
}

/// Inserts an entity summary row.
pub fn insert_entity(connection: &Connection, entity_id: i64, record_count: i64) {
    connection
        .execute(
            "INSERT INTO sz_dm_entity (entity_id, entity_name, record_count, relation_count) \
             VALUES (?1, ?2, ?3, 0)",
            params![entity_id, format!("Entity {entity_id}"), record_count],
        )
        .expect("insert entity");
}

/// Inserts a record of an entity.
pub fn insert_record(
    connection: &Connection,
    data_source: &str,
    record_id: &str,
    entity_id: i64,
    match_key: Option<&str>,
) {
    connection
        .execute(
            "INSERT INTO sz_dm_record (data_source, record_id, entity_id, match_key, errule_code) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                data_source,
                record_id,
                entity_id,
                match_key,
                match_key.map(|_| "MFF_CNAME")
            ],
        )
        .expect("insert record");
}

/// Inserts a relation summary row in canonical orientation.
pub fn insert_relation(
    connection: &Connection,
    pair: (i64, i64),
    match_type: &str,
    match_key: &str,
    rev_match_key: &str,
) {
    let (entity_id, related_id) = if pair.0 < pair.1 { pair } else { (pair.1, pair.0) };
    connection
        .execute(
            "INSERT INTO sz_dm_relation \
             (entity_id, related_id, match_type, match_key, rev_match_key, errule_code) \
             VALUES (?1, ?2, ?3, ?4, ?5, 'SF1')",
            params![entity_id, related_id, match_type, match_key, rev_match_key],
        )
        .expect("insert relation");
}

/// Inserts an entity detail row into a report slice.
pub fn insert_entity_detail(connection: &Connection, report_key: &ReportKey, entity_id: i64) {
    insert_relation_detail(connection, report_key, (entity_id, 0));
}

/// Inserts a relation detail row into a report slice.
pub fn insert_relation_detail(connection: &Connection, report_key: &ReportKey, pair: (i64, i64)) {
    connection
        .execute(
            "INSERT INTO sz_dm_report_detail (report_key, entity_id, related_id, stat_count) \
             VALUES (?1, ?2, ?3, 1)",
            params![report_key.encode(), pair.0, pair.1],
        )
        .expect("insert detail");
}

/// Inserts a summary row for a report key.
pub fn insert_summary(
    connection: &Connection,
    report_key: &ReportKey,
    entity_count: i64,
    record_count: i64,
    relation_count: i64,
) {
    connection
        .execute(
            "INSERT INTO sz_dm_report (report_key, report, statistic, data_source1, data_source2, \
             entity_count, record_count, relation_count) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                report_key.encode(),
                report_key.code().as_str(),
                report_key.statistic().encode(),
                report_key.data_source1().map(|code| code.as_str().to_string()),
                report_key.data_source2().map(|code| code.as_str().to_string()),
                entity_count,
                record_count,
                relation_count
            ],
        )
        .expect("insert summary");
}

/// Entity size breakdown key.
pub fn size_key(entity_size: i64) -> ReportKey {
    ReportKey::entity_size(entity_size).expect("size key")
}

/// Cross source key from text.
pub fn cross_key(data_source: &str, versus: &str, statistic: &str) -> ReportKey {
    ReportKey::new(
        ReportCode::CrossSourceSummary,
        StatisticKey::decode(statistic).expect("statistic"),
        Some(datamart_core::DataSourceCode::parse(data_source).expect("code")),
        Some(datamart_core::DataSourceCode::parse(versus).expect("code")),
    )
    .expect("cross key")
}

/// Populates `count` single-record entities `1..=count` in an entity size slice.
pub fn populate_singletons(connection: &Connection, count: i64) -> ReportKey {
    let report_key = size_key(1);
    for entity_id in 1 ..= count {
        insert_entity(connection, entity_id, 1);
        insert_record(connection, "CUSTOMERS", &format!("C{entity_id:04}"), entity_id, None);
        insert_entity_detail(connection, &report_key, entity_id);
    }
    report_key
}
