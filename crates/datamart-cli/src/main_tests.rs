// crates/datamart-cli/src/main_tests.rs
// ============================================================================
// Module: CLI Main Helpers Tests
// Description: Unit tests for argument resolution and report dispatch.
// Purpose: Ensure paging limits and report scopes fail closed.
// Dependencies: datamart-cli main helpers
// ============================================================================

//! ## Overview
//! Validates page request defaults, report key resolution, dispatch against
//! an in-memory data mart, and JSON rendering.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use clap::Parser;
use datamart_config::DatamartConfig;
use datamart_config::PagingConfig;
use datamart_core::BoundType;
use datamart_core::DataSourceCatalog;
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

use super::Cli;
use super::Commands;
use super::PageCommand;
use super::PagingArgs;
use super::build_page_request;
use super::command_init_schema;
use super::execute_report;
use super::render_json;
use super::resolve_report_key;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn catalog() -> DataSourceCatalog {
    DataSourceCatalog::from_codes(["CUSTOMERS", "WATCHLIST"]).unwrap()
}

fn paging(max_page_size: usize) -> PagingConfig {
    PagingConfig {
        default_page_size: 25,
        max_page_size,
    }
}

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("datamart").chain(args.iter().copied())).unwrap()
}

fn page_command(args: &[&str]) -> PageCommand {
    match parse(args).command {
        Commands::Entities(command) | Commands::Relations(command) => command,
        other => panic!("expected a page command, got {other:?}"),
    }
}

fn memory_mart() -> Connection {
    let connection = Connection::open_in_memory().unwrap();
    datamart_store_sqlite::initialize_schema(&connection).unwrap();
    connection
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn page_flags_parse_into_paging_args() {
    let command = page_command(&[
        "entities",
        "--report",
        "css",
        "--statistic",
        "MATCHED_COUNT",
        "--data-source",
        "CUSTOMERS",
        "--versus",
        "WATCHLIST",
        "--bound",
        "max",
        "--bound-type",
        "inclusive-upper",
        "--page-size",
        "10",
    ]);

    assert_eq!(command.paging.bound.as_deref(), Some("max"));
    assert_eq!(command.paging.page_size, Some(10));
    let request = build_page_request(&command.paging, paging(100)).unwrap();
    assert_eq!(request.bound_type, Some(BoundType::InclusiveUpper));
}

#[test]
fn global_flags_follow_the_subcommand() {
    let cli = parse(&["loaded-stats", "--pretty", "--config", "mart.toml"]);
    assert!(cli.pretty);
    assert_eq!(cli.config.as_deref(), Some(std::path::Path::new("mart.toml")));
}

// ============================================================================
// SECTION: Paging
// ============================================================================

#[test]
fn missing_sizes_use_the_configured_default() {
    let request = build_page_request(&PagingArgs::default(), paging(100)).unwrap();
    assert_eq!(request.page_size, Some(25));
    assert_eq!(request.sample_size, None);
}

#[test]
fn sample_only_request_leaves_page_size_derived() {
    let args = PagingArgs {
        sample_size: Some(3),
        ..PagingArgs::default()
    };
    let request = build_page_request(&args, paging(100)).unwrap();
    assert_eq!(request.page_size, None);
    assert_eq!(request.plan().unwrap().page_size(), 60);
}

#[test]
fn page_sizes_above_the_maximum_are_rejected() {
    let explicit = PagingArgs {
        page_size: Some(101),
        ..PagingArgs::default()
    };
    let derived = PagingArgs {
        sample_size: Some(6),
        ..PagingArgs::default()
    };

    assert!(build_page_request(&explicit, paging(100)).is_err());
    assert!(build_page_request(&derived, paging(100)).is_err());
}

#[test]
fn sample_not_smaller_than_page_is_rejected() {
    let args = PagingArgs {
        page_size: Some(5),
        sample_size: Some(5),
        ..PagingArgs::default()
    };
    let err = build_page_request(&args, paging(100)).unwrap_err();
    assert!(err.to_string().starts_with("invalid paging"));
}

// ============================================================================
// SECTION: Report Keys
// ============================================================================

#[test]
fn breakdown_reports_parse_numeric_statistics() {
    let key = resolve_report_key(
        &page_command(&["entities", "--report", "esb", "--statistic", "3"]),
        &catalog(),
    )
    .unwrap();
    assert_eq!(key.statistic().statistic(), "3");

    let err = resolve_report_key(
        &page_command(&["entities", "--report", "erb", "--statistic", "many"]),
        &catalog(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("must be an integer"));
}

#[test]
fn summary_reports_require_catalog_sources() {
    let missing = resolve_report_key(
        &page_command(&["entities", "--report", "dss", "--statistic", "MATCHED_COUNT"]),
        &catalog(),
    )
    .unwrap_err();
    let unknown = resolve_report_key(
        &page_command(&[
            "relations",
            "--report",
            "css",
            "--statistic",
            "POSSIBLE_MATCH_COUNT",
            "--data-source",
            "CUSTOMERS",
            "--versus",
            "VENDORS",
        ]),
        &catalog(),
    )
    .unwrap_err();

    assert!(missing.to_string().contains("--data-source is required"));
    assert!(unknown.to_string().contains("unrecognized data source"));
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

#[test]
fn loaded_stats_render_camel_case_fields() {
    let connection = memory_mart();
    let command = parse(&["loaded-stats"]).command;

    let output = execute_report(&command, &connection, &catalog(), paging(100)).unwrap();

    assert_eq!(output["totalRecordCount"], json!(0));
    assert_eq!(output["dataSourceCounts"].as_array().unwrap().len(), 2);
}

#[test]
fn empty_entity_page_reports_its_bound() {
    let connection = memory_mart();
    let command = parse(&["entities", "--report", "esb", "--statistic", "1"]).command;

    let output = execute_report(&command, &connection, &catalog(), paging(100)).unwrap();

    assert_eq!(output["bound"], json!("0"));
    assert_eq!(output["pageSize"], json!(25));
    assert_eq!(output["entities"], json!([]));
}

#[test]
fn report_failures_surface_as_cli_errors() {
    let connection = Connection::open_in_memory().unwrap();
    let command = parse(&["size-breakdown"]).command;

    let err = execute_report(&command, &connection, &catalog(), paging(100)).unwrap_err();
    assert!(err.to_string().starts_with("report failed"));
}

#[test]
fn init_schema_creates_a_writable_mart() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("mart.db");
    let mut config = DatamartConfig::default();
    config.database.path.clone_from(&path);

    let output = command_init_schema(&config).unwrap();

    assert_eq!(output["initialized"], json!(true));
    let connection = Connection::open(&path).unwrap();
    let tables: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name LIKE 'sz_dm_%'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(tables, 5);
}

// ============================================================================
// SECTION: Output
// ============================================================================

#[test]
fn compact_output_is_canonical() {
    let value = json!({"b": 1, "a": {"d": 2, "c": 3}});
    let bytes = render_json(&value, false).unwrap();
    assert_eq!(bytes, b"{\"a\":{\"c\":3,\"d\":2},\"b\":1}\n");
}

#[test]
fn pretty_output_is_indented() {
    let bytes = render_json(&json!({"a": 1}), true).unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), "{\n  \"a\": 1\n}\n");
}
