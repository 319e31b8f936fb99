// crates/datamart-store-sqlite/tests/summary_reports.rs
// ============================================================================
// Module: Summary Report Tests
// Description: Breakdowns, cross-source buckets, and loaded statistics.
// Purpose: Validate bucket classification, zero buckets, and catalog scoping.
// ============================================================================

//! ## Overview
//! Integration tests for summary reports:
//! - Cross-source bucket admission by dimension
//! - Zero buckets for statistics without an admitted row
//! - Breakdown ordering and zero counts
//! - Catalog scoping of source summaries and loaded statistics

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use datamart_core::DataSourceCode;
use datamart_core::PageRequest;
use datamart_core::ReportCode;
use datamart_core::ReportKey;
use datamart_core::StatisticKey;
use datamart_store_sqlite::SqliteReportError;
use datamart_store_sqlite::cross_source_entities;
use datamart_store_sqlite::cross_source_summary;
use datamart_store_sqlite::entity_relations_breakdown;
use datamart_store_sqlite::entity_relations_count;
use datamart_store_sqlite::entity_size_breakdown;
use datamart_store_sqlite::entity_size_count;
use datamart_store_sqlite::loaded_stats;
use datamart_store_sqlite::relation_breakdown_entities;
use datamart_store_sqlite::source_summary;
use datamart_store_sqlite::source_summary_entities;
use rusqlite::Connection;
use rusqlite::params;

use crate::common::catalog;
use crate::common::cross_key;
use crate::common::insert_entity;
use crate::common::insert_entity_detail;
use crate::common::insert_record;
use crate::common::insert_relation_detail;
use crate::common::insert_summary;
use crate::common::memory_mart;
use crate::common::size_key;

/// Data source summary key from text.
fn source_key(data_source: &str, statistic: &str) -> ReportKey {
    ReportKey::data_source_summary(
        DataSourceCode::parse(data_source).unwrap(),
        StatisticKey::decode(statistic).unwrap(),
    )
}

/// Mart with a handful of cross-source rows for `CUSTOMERS` vs `WATCHLIST`.
fn cross_source_mart() -> Connection {
    let connection = memory_mart();
    for (statistic, entities, records, relations) in [
        ("MATCHED_COUNT", 10, 20, 0),
        ("MATCHED_COUNT:+NAME", 5, 10, 0),
        ("MATCHED_COUNT:+NAME+DOB:MFF_CNAME", 2, 4, 0),
        ("POSSIBLE_MATCH_COUNT", 3, 6, 4),
        ("POSSIBLE_MATCH_COUNT:+ADDRESS", 1, 2, 1),
    ] {
        let key = cross_key("CUSTOMERS", "WATCHLIST", statistic);
        insert_summary(&connection, &key, entities, records, relations);
    }
    connection
}

// ============================================================================
// SECTION: Cross Source Summary
// ============================================================================

#[test]
fn dimensionless_summary_reads_total_rows_only() {
    let connection = cross_source_mart();
    let catalog = catalog(&["CUSTOMERS", "WATCHLIST"]);

    let summary =
        cross_source_summary(&connection, &catalog, "CUSTOMERS", "WATCHLIST", None, None).unwrap();

    assert_eq!(summary.data_source.as_str(), "CUSTOMERS");
    assert_eq!(summary.versus_data_source.as_str(), "WATCHLIST");
    assert_eq!(summary.matches.len(), 1);
    let matched = summary.matches.get(None, None).unwrap();
    assert_eq!((matched.entity_count, matched.record_count), (10, 20));
    let possible = summary.possible_matches.get(None, None).unwrap();
    assert_eq!(possible.relation_count, 4);
    assert_eq!(summary.possible_matches.len(), 1);
}

#[test]
fn buckets_without_rows_get_a_zero_bucket() {
    let connection = cross_source_mart();
    let catalog = catalog(&["CUSTOMERS", "WATCHLIST"]);

    let summary =
        cross_source_summary(&connection, &catalog, "CUSTOMERS", "WATCHLIST", None, None).unwrap();

    for set in [
        &summary.ambiguous_matches,
        &summary.possible_relations,
        &summary.disclosed_relations,
    ] {
        assert_eq!(set.len(), 1);
        let zero = set.get(None, None).unwrap();
        assert_eq!((zero.entity_count, zero.record_count, zero.relation_count), (0, 0, 0));
    }
}

#[test]
fn wildcard_match_key_admits_every_stored_match_key() {
    let connection = cross_source_mart();
    let catalog = catalog(&["CUSTOMERS", "WATCHLIST"]);

    let summary =
        cross_source_summary(&connection, &catalog, "CUSTOMERS", "WATCHLIST", Some("*"), None)
            .unwrap();

    assert_eq!(summary.matches.len(), 1);
    assert_eq!(summary.matches.get(Some("+NAME"), None).unwrap().entity_count, 5);
    assert!(summary.matches.get(None, None).is_none());
    assert_eq!(summary.possible_matches.get(Some("+ADDRESS"), None).unwrap().relation_count, 1);
    assert_eq!(summary.ambiguous_matches.get(None, None).unwrap().entity_count, 0);
}

#[test]
fn wildcard_dimensions_admit_principled_rows() {
    let connection = cross_source_mart();
    let catalog = catalog(&["CUSTOMERS", "WATCHLIST"]);

    let summary =
        cross_source_summary(&connection, &catalog, "CUSTOMERS", "WATCHLIST", Some("*"), Some("*"))
            .unwrap();

    let keyed = summary.matches.get(Some("+NAME+DOB"), Some("MFF_CNAME")).unwrap();
    assert_eq!((keyed.entity_count, keyed.record_count), (2, 4));
    assert_eq!(summary.matches.len(), 1);
}

#[test]
fn exact_dimensions_without_a_row_yield_a_keyed_zero_bucket() {
    let connection = cross_source_mart();
    let catalog = catalog(&["CUSTOMERS", "WATCHLIST"]);

    let summary = cross_source_summary(
        &connection,
        &catalog,
        "CUSTOMERS",
        "WATCHLIST",
        Some("+PHONE"),
        Some("MFF_CNAME"),
    )
    .unwrap();

    let zero = summary.matches.get(Some("+PHONE"), Some("MFF_CNAME")).unwrap();
    assert_eq!(zero.entity_count, 0);
    assert_eq!(summary.matches.len(), 1);
}

#[test]
fn summary_inputs_are_validated_before_querying() {
    let connection = Connection::open_in_memory().unwrap();
    let catalog = catalog(&["CUSTOMERS", "WATCHLIST"]);

    let unknown =
        cross_source_summary(&connection, &catalog, "CUSTOMERS", "VENDORS", None, None).unwrap_err();
    let malformed =
        cross_source_summary(&connection, &catalog, "CUSTOMERS", "WATCHLIST", Some("A:B"), None)
            .unwrap_err();

    assert!(matches!(unknown, SqliteReportError::Invalid(_)));
    assert!(matches!(malformed, SqliteReportError::Invalid(_)));
}

#[test]
fn undecodable_stored_statistic_is_corrupt() {
    let connection = cross_source_mart();
    connection
        .execute(
            "INSERT INTO sz_dm_report (report_key, report, statistic, data_source1, data_source2) \
             VALUES ('bad', ?1, 'MATCHED_COUNT:', 'CUSTOMERS', 'WATCHLIST')",
            params![ReportCode::CrossSourceSummary.as_str()],
        )
        .unwrap();
    let catalog = catalog(&["CUSTOMERS", "WATCHLIST"]);

    let err = cross_source_summary(&connection, &catalog, "CUSTOMERS", "WATCHLIST", None, None)
        .unwrap_err();
    assert!(matches!(err, SqliteReportError::Corrupt(_)));
}

// ============================================================================
// SECTION: Breakdowns
// ============================================================================

#[test]
fn entity_size_breakdown_is_ascending_by_size() {
    let connection = memory_mart();
    for (size, entities) in [(3, 10), (1, 100), (12, 1), (2, 20)] {
        insert_summary(&connection, &size_key(size), entities, size * entities, 0);
    }

    let breakdown = entity_size_breakdown(&connection).unwrap();

    let sizes: Vec<i64> = breakdown.iter().map(|row| row.entity_size).collect();
    assert_eq!(sizes, vec![1, 2, 3, 12]);
    assert_eq!(breakdown[2].entity_count, 10);
    assert_eq!(breakdown[2].record_count, 30);
}

#[test]
fn missing_breakdown_rows_count_as_zero() {
    let connection = memory_mart();
    insert_summary(&connection, &size_key(1), 4, 4, 0);

    let present = entity_size_count(&connection, 1).unwrap();
    let absent = entity_size_count(&connection, 5).unwrap();
    let relations = entity_relations_count(&connection, 0).unwrap();

    assert_eq!(present.entity_count, 4);
    assert_eq!((absent.entity_size, absent.entity_count, absent.record_count), (5, 0, 0));
    assert_eq!(relations.entity_count, 0);
}

#[test]
fn breakdown_counts_reject_out_of_range_values() {
    let connection = memory_mart();

    let size = entity_size_count(&connection, 0).unwrap_err();
    let relations = entity_relations_count(&connection, -1).unwrap_err();

    assert!(matches!(size, SqliteReportError::Invalid(_)));
    assert!(matches!(relations, SqliteReportError::Invalid(_)));
}

#[test]
fn relation_breakdown_lists_zero_relation_entities() {
    let connection = memory_mart();
    let zero_key = ReportKey::entity_relations(0).unwrap();
    let two_key = ReportKey::entity_relations(2).unwrap();
    insert_summary(&connection, &two_key, 3, 6, 3);
    insert_summary(&connection, &zero_key, 7, 7, 0);
    for entity_id in [4, 2, 9] {
        insert_entity(&connection, entity_id, 1);
        insert_record(&connection, "CUSTOMERS", &format!("C{entity_id}"), entity_id, None);
        insert_entity_detail(&connection, &zero_key, entity_id);
    }

    let breakdown = entity_relations_breakdown(&connection).unwrap();
    let page = relation_breakdown_entities(&connection, 0, &PageRequest::new()).unwrap();

    let counts: Vec<i64> = breakdown.iter().map(|row| row.relation_count).collect();
    assert_eq!(counts, vec![0, 2]);
    let ids: Vec<i64> = page.entities.iter().map(|entity| entity.entity_id).collect();
    assert_eq!(ids, vec![2, 4, 9]);
}

#[test]
fn non_numeric_breakdown_statistic_is_corrupt() {
    let connection = memory_mart();
    connection
        .execute(
            "INSERT INTO sz_dm_report (report_key, report, statistic) VALUES ('ESB:x', ?1, 'x')",
            params![ReportCode::EntitySizeBreakdown.as_str()],
        )
        .unwrap();

    let err = entity_size_breakdown(&connection).unwrap_err();
    assert!(matches!(err, SqliteReportError::Corrupt(_)));
}

// ============================================================================
// SECTION: Source Summary
// ============================================================================

#[test]
fn source_summary_compares_against_every_catalog_source() {
    let connection = cross_source_mart();
    insert_summary(&connection, &source_key("CUSTOMERS", "ENTITY_COUNT"), 80, 100, 0);
    insert_summary(&connection, &source_key("CUSTOMERS", "UNMATCHED_COUNT"), 30, 30, 0);
    let catalog = catalog(&["WATCHLIST", "CUSTOMERS"]);

    let summary = source_summary(&connection, &catalog, "customers", None, None).unwrap();

    assert_eq!(summary.data_source.as_str(), "CUSTOMERS");
    assert_eq!(summary.entity_count, 80);
    assert_eq!(summary.record_count, 100);
    assert_eq!(summary.unmatched_record_count, 30);
    let versus: Vec<&str> = summary
        .cross_source_summaries
        .iter()
        .map(|cross| cross.versus_data_source.as_str())
        .collect();
    assert_eq!(versus, vec!["CUSTOMERS", "WATCHLIST"]);
    let watchlist = &summary.cross_source_summaries[1];
    assert_eq!(watchlist.matches.get(None, None).unwrap().entity_count, 10);
    let own = &summary.cross_source_summaries[0];
    assert_eq!(own.matches.get(None, None).unwrap().entity_count, 0);
}

#[test]
fn source_summary_without_rows_reports_zero_counts() {
    let connection = memory_mart();
    let catalog = catalog(&["CUSTOMERS"]);

    let summary = source_summary(&connection, &catalog, "CUSTOMERS", None, None).unwrap();

    assert_eq!(summary.entity_count, 0);
    assert_eq!(summary.unmatched_record_count, 0);
    assert_eq!(summary.cross_source_summaries.len(), 1);
}

#[test]
fn source_summary_entities_pages_the_statistic_slice() {
    let connection = memory_mart();
    let key = source_key("CUSTOMERS", "UNMATCHED_COUNT");
    for entity_id in 1 ..= 3 {
        insert_entity(&connection, entity_id, 1);
        insert_record(&connection, "CUSTOMERS", &format!("C{entity_id}"), entity_id, None);
        insert_entity_detail(&connection, &key, entity_id);
    }
    let catalog = catalog(&["CUSTOMERS"]);

    let page = source_summary_entities(
        &connection,
        &catalog,
        "CUSTOMERS",
        "UNMATCHED_COUNT",
        &PageRequest::new().with_page_size(2),
    )
    .unwrap();
    assert_eq!(page.entities.len(), 2);
    assert_eq!(page.total_entity_count, 3);

    let err = source_summary_entities(
        &connection,
        &catalog,
        "CUSTOMERS",
        "UNMATCHED_COUNT:*",
        &PageRequest::new(),
    )
    .unwrap_err();
    assert!(matches!(err, SqliteReportError::Invalid(_)));
}

#[test]
fn cross_source_entities_skip_relation_rows_of_the_slice() {
    let connection = memory_mart();
    let key = cross_key("CUSTOMERS", "WATCHLIST", "MATCHED_COUNT");
    for entity_id in [2, 5, 7] {
        insert_entity(&connection, entity_id, 2);
        insert_record(&connection, "CUSTOMERS", &format!("C{entity_id}"), entity_id, None);
        insert_record(&connection, "WATCHLIST", &format!("W{entity_id}"), entity_id, None);
        insert_entity_detail(&connection, &key, entity_id);
    }
    insert_relation_detail(&connection, &key, (2, 5));
    let catalog = catalog(&["CUSTOMERS", "WATCHLIST"]);

    let page = cross_source_entities(
        &connection,
        &catalog,
        "customers",
        "WATCHLIST",
        "MATCHED_COUNT",
        &PageRequest::new(),
    )
    .unwrap();

    let ids: Vec<i64> = page.entities.iter().map(|entity| entity.entity_id).collect();
    assert_eq!(ids, vec![2, 5, 7]);
    assert_eq!(page.total_entity_count, 3);
    assert_eq!(page.entities[0].records.len(), 2);

    let err = cross_source_entities(
        &connection,
        &catalog,
        "CUSTOMERS",
        "VENDORS",
        "MATCHED_COUNT",
        &PageRequest::new(),
    )
    .unwrap_err();
    assert!(matches!(err, SqliteReportError::Invalid(_)));
}

// ============================================================================
// SECTION: Loaded Statistics
// ============================================================================

#[test]
fn loaded_stats_cover_exactly_the_catalog() {
    let connection = memory_mart();
    insert_entity(&connection, 1, 2);
    insert_entity(&connection, 2, 1);
    insert_record(&connection, "CUSTOMERS", "C1", 1, None);
    insert_record(&connection, "CUSTOMERS", "C2", 1, None);
    insert_record(&connection, "VENDORS", "V1", 2, None);
    insert_summary(&connection, &source_key("CUSTOMERS", "ENTITY_COUNT"), 1, 2, 0);
    insert_summary(&connection, &source_key("CUSTOMERS", "UNMATCHED_COUNT"), 0, 1, 0);
    insert_summary(&connection, &source_key("VENDORS", "ENTITY_COUNT"), 1, 1, 0);
    insert_summary(&connection, &source_key("VENDORS", "UNMATCHED_COUNT"), 1, 1, 0);
    let catalog = catalog(&["CUSTOMERS", "WATCHLIST"]);

    let stats = loaded_stats(&connection, &catalog).unwrap();

    assert_eq!(stats.total_record_count, 3);
    assert_eq!(stats.total_entity_count, 2);
    assert_eq!(stats.total_unmatched_record_count, 1);
    let sources: Vec<&str> =
        stats.data_source_counts.iter().map(|counts| counts.data_source.as_str()).collect();
    assert_eq!(sources, vec!["CUSTOMERS", "WATCHLIST"]);
    let customers = &stats.data_source_counts[0];
    assert_eq!((customers.entity_count, customers.record_count), (1, 2));
    assert_eq!(customers.unmatched_record_count, 1);
    let watchlist = &stats.data_source_counts[1];
    assert_eq!((watchlist.entity_count, watchlist.record_count), (0, 0));
}
