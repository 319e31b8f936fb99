// crates/datamart-cli/src/main.rs
// ============================================================================
// Module: Datamart CLI Entry Point
// Description: Command dispatcher for datamart report queries.
// Purpose: Run one report against the configured data mart and print JSON.
// Dependencies: clap, datamart-config, datamart-store-sqlite, serde_jcs, tracing
// ============================================================================

//! ## Overview
//! The `datamart` CLI loads `datamart.toml`, opens the data mart, runs a
//! single report command, and writes the result to stdout as JSON. Logs and
//! errors go to stderr; any failure yields a failure exit code.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use datamart_config::DatamartConfig;
use datamart_config::LogLevel;
use datamart_config::PagingConfig;
use datamart_core::BoundType;
use datamart_core::DataSourceCatalog;
use datamart_core::PagePlan;
use datamart_core::PageRequest;
use datamart_core::ReportKey;
use datamart_core::StatisticKey;
use datamart_store_sqlite::SqliteReportError;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "datamart", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file path (defaults to `DATAMART_CONFIG` or datamart.toml).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Pretty-print JSON output instead of compact canonical JSON.
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    pretty: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the data mart tables if they do not exist.
    InitSchema,
    /// Loaded record and entity counts per catalog data source.
    LoadedStats,
    /// Entity counts by entity size.
    SizeBreakdown {
        /// Report a single entity size.
        #[arg(long, value_name = "N")]
        size: Option<i64>,
    },
    /// Entity counts by relation count.
    RelationBreakdown {
        /// Report a single relation count.
        #[arg(long, value_name = "N")]
        count: Option<i64>,
    },
    /// Summary of one data source against every catalog source.
    SourceSummary(SourceSummaryCommand),
    /// Summary of one data source against another.
    CrossSummary(CrossSummaryCommand),
    /// One page of entities from a report slice.
    Entities(PageCommand),
    /// One page of relations from a report slice.
    Relations(PageCommand),
}

/// Dimension filters shared by summary commands.
#[derive(Args, Debug, Clone)]
struct DimensionArgs {
    /// Match key filter (`*` for every stored match key).
    #[arg(long, value_name = "MK")]
    match_key: Option<String>,
    /// Principle filter (`*` for every stored principle).
    #[arg(long, value_name = "PR")]
    principle: Option<String>,
}

/// Arguments for `source-summary`.
#[derive(Args, Debug)]
struct SourceSummaryCommand {
    /// Data source code.
    #[arg(long, value_name = "DS")]
    data_source: String,
    /// Dimension filters.
    #[command(flatten)]
    dimensions: DimensionArgs,
}

/// Arguments for `cross-summary`.
#[derive(Args, Debug)]
struct CrossSummaryCommand {
    /// Primary data source code.
    #[arg(long, value_name = "DS")]
    data_source: String,
    /// Compared data source code.
    #[arg(long, value_name = "VS")]
    versus: String,
    /// Dimension filters.
    #[command(flatten)]
    dimensions: DimensionArgs,
}

/// Report categories addressable from the CLI.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ReportArg {
    /// Data source summary.
    Dss,
    /// Cross source summary.
    Css,
    /// Entity size breakdown.
    Esb,
    /// Entity relation breakdown.
    Erb,
}

/// Arguments for `entities` and `relations`.
#[derive(Args, Debug)]
struct PageCommand {
    /// Report category of the slice.
    #[arg(long, value_enum)]
    report: ReportArg,
    /// Statistic token, or the decimal size/count for breakdowns.
    #[arg(long, value_name = "STAT")]
    statistic: String,
    /// Primary data source code (summary reports).
    #[arg(long, value_name = "DS")]
    data_source: Option<String>,
    /// Compared data source code (cross source reports).
    #[arg(long, value_name = "VS")]
    versus: Option<String>,
    /// Paging arguments.
    #[command(flatten)]
    paging: PagingArgs,
}

/// Cursor paging arguments.
#[derive(Args, Debug, Clone, Default)]
struct PagingArgs {
    /// Bound text (`N`, `max`, or `N:M` for relations).
    #[arg(long, value_name = "BOUND")]
    bound: Option<String>,
    /// Bound type (inferred from the bound when omitted).
    #[arg(long, value_enum)]
    bound_type: Option<BoundTypeArg>,
    /// Number of candidates to scan.
    #[arg(long, value_name = "N")]
    page_size: Option<usize>,
    /// Number of candidates to keep from the scanned page.
    #[arg(long, value_name = "N")]
    sample_size: Option<usize>,
}

/// Bound types accepted on the command line.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum BoundTypeArg {
    /// Keys greater than or equal to the bound.
    InclusiveLower,
    /// Keys strictly greater than the bound.
    ExclusiveLower,
    /// Keys less than or equal to the bound.
    InclusiveUpper,
    /// Keys strictly less than the bound.
    ExclusiveUpper,
}

impl From<BoundTypeArg> for BoundType {
    fn from(value: BoundTypeArg) -> Self {
        match value {
            BoundTypeArg::InclusiveLower => Self::InclusiveLower,
            BoundTypeArg::ExclusiveLower => Self::ExclusiveLower,
            BoundTypeArg::InclusiveUpper => Self::InclusiveUpper,
            BoundTypeArg::ExclusiveUpper => Self::ExclusiveUpper,
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Maps a report failure into a CLI error.
fn report_error(error: &SqliteReportError) -> CliError {
    CliError::new(format!("report failed: {error}"))
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Loads config, runs the command, and writes its output.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = DatamartConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    init_tracing(config.logging.level)?;
    let output = execute(&cli.command, &config)?;
    write_json(&output, cli.pretty)?;
    Ok(ExitCode::SUCCESS)
}

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(level: LogLevel) -> CliResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| CliError::new(format!("failed to initialize logging: {err}")))
}

// ============================================================================
// SECTION: Command Dispatch
// ============================================================================

/// Executes a command and returns its JSON result.
fn execute(command: &Commands, config: &DatamartConfig) -> CliResult<Value> {
    if matches!(command, Commands::InitSchema) {
        return command_init_schema(config);
    }
    let connection = datamart_store_sqlite::open_connection(&config.store_config())
        .map_err(|err| report_error(&err))?;
    let catalog = config
        .data_source_catalog()
        .map_err(|err| CliError::new(format!("failed to load catalog: {err}")))?;
    execute_report(command, &connection, &catalog, config.paging)
}

/// Executes a read-only report command.
fn execute_report(
    command: &Commands,
    connection: &Connection,
    catalog: &DataSourceCatalog,
    paging: PagingConfig,
) -> CliResult<Value> {
    match command {
        Commands::InitSchema => Err(CliError::new("init-schema needs a writable store".to_string())),
        Commands::LoadedStats => {
            debug!("running loaded stats report");
            to_json(&datamart_store_sqlite::loaded_stats(connection, catalog))
        }
        Commands::SizeBreakdown {
            size,
        } => match size {
            Some(size) => to_json(&datamart_store_sqlite::entity_size_count(connection, *size)),
            None => to_json(&datamart_store_sqlite::entity_size_breakdown(connection)),
        },
        Commands::RelationBreakdown {
            count,
        } => match count {
            Some(count) => {
                to_json(&datamart_store_sqlite::entity_relations_count(connection, *count))
            }
            None => to_json(&datamart_store_sqlite::entity_relations_breakdown(connection)),
        },
        Commands::SourceSummary(command) => to_json(&datamart_store_sqlite::source_summary(
            connection,
            catalog,
            &command.data_source,
            command.dimensions.match_key.as_deref(),
            command.dimensions.principle.as_deref(),
        )),
        Commands::CrossSummary(command) => to_json(&datamart_store_sqlite::cross_source_summary(
            connection,
            catalog,
            &command.data_source,
            &command.versus,
            command.dimensions.match_key.as_deref(),
            command.dimensions.principle.as_deref(),
        )),
        Commands::Entities(command) => {
            let report_key = resolve_report_key(command, catalog)?;
            let request = build_page_request(&command.paging, paging)?;
            debug!(report_key = %report_key, "running entity page report");
            to_json(&datamart_store_sqlite::retrieve_entities_page(
                connection,
                &report_key,
                &request,
            ))
        }
        Commands::Relations(command) => {
            let report_key = resolve_report_key(command, catalog)?;
            let request = build_page_request(&command.paging, paging)?;
            debug!(report_key = %report_key, "running relation page report");
            to_json(&datamart_store_sqlite::retrieve_relations_page(
                connection,
                &report_key,
                &request,
            ))
        }
    }
}

/// Executes `init-schema` against a writable connection.
fn command_init_schema(config: &DatamartConfig) -> CliResult<Value> {
    let mut store = config.store_config();
    store.read_only = false;
    let connection =
        datamart_store_sqlite::open_connection(&store).map_err(|err| report_error(&err))?;
    datamart_store_sqlite::initialize_schema(&connection).map_err(|err| report_error(&err))?;
    Ok(serde_json::json!({
        "initialized": true,
        "path": store.path.display().to_string(),
    }))
}

// ============================================================================
// SECTION: Argument Resolution
// ============================================================================

/// Builds the report scope key named by page arguments.
fn resolve_report_key(command: &PageCommand, catalog: &DataSourceCatalog) -> CliResult<ReportKey> {
    let invalid = |err: datamart_core::ReportError| CliError::new(format!("invalid report: {err}"));
    match command.report {
        ReportArg::Esb | ReportArg::Erb => {
            let value = command.statistic.trim().parse::<i64>().map_err(|_| {
                CliError::new(format!(
                    "breakdown statistic must be an integer: {}",
                    command.statistic
                ))
            })?;
            if command.report == ReportArg::Esb {
                ReportKey::entity_size(value).map_err(invalid)
            } else {
                ReportKey::entity_relations(value).map_err(invalid)
            }
        }
        ReportArg::Dss => {
            let data_source = require_arg(command.data_source.as_deref(), "--data-source")?;
            let data_source = catalog.require(data_source).map_err(invalid)?;
            let statistic = StatisticKey::decode(&command.statistic).map_err(invalid)?;
            Ok(ReportKey::data_source_summary(data_source, statistic))
        }
        ReportArg::Css => {
            let data_source = require_arg(command.data_source.as_deref(), "--data-source")?;
            let versus = require_arg(command.versus.as_deref(), "--versus")?;
            Ok(ReportKey::cross_source_summary(
                catalog.require(data_source).map_err(invalid)?,
                catalog.require(versus).map_err(invalid)?,
                StatisticKey::decode(&command.statistic).map_err(invalid)?,
            ))
        }
    }
}

/// Returns a required report argument or a usage error.
fn require_arg<'a>(value: Option<&'a str>, flag: &str) -> CliResult<&'a str> {
    value.ok_or_else(|| CliError::new(format!("{flag} is required for this report")))
}

/// Builds a page request, applying config defaults and limits.
fn build_page_request(args: &PagingArgs, paging: PagingConfig) -> CliResult<PageRequest> {
    let page_size = match (args.page_size, args.sample_size) {
        (None, None) => Some(paging.default_page_size),
        (page_size, _) => page_size,
    };
    let plan = PagePlan::new(page_size, args.sample_size)
        .map_err(|err| CliError::new(format!("invalid paging: {err}")))?;
    paging
        .check_page_size(plan.page_size())
        .map_err(|err| CliError::new(format!("invalid paging: {err}")))?;

    let mut request = PageRequest::new();
    if let Some(bound) = &args.bound {
        request = request.with_bound(bound.clone());
    }
    if let Some(bound_type) = args.bound_type {
        request = request.with_bound_type(bound_type.into());
    }
    if let Some(page_size) = page_size {
        request = request.with_page_size(page_size);
    }
    if let Some(sample_size) = args.sample_size {
        request = request.with_sample_size(sample_size);
    }
    Ok(request)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Converts a report result into a JSON value.
fn to_json<T: Serialize>(result: &Result<T, SqliteReportError>) -> CliResult<Value> {
    match result {
        Ok(report) => serde_json::to_value(report)
            .map_err(|err| CliError::new(format!("failed to serialize report: {err}"))),
        Err(err) => Err(report_error(err)),
    }
}

/// Renders a JSON value as compact canonical JSON or pretty JSON.
fn render_json(value: &Value, pretty: bool) -> CliResult<Vec<u8>> {
    let rendered = if pretty { serde_json::to_vec_pretty(value) } else { serde_jcs::to_vec(value) };
    let mut bytes =
        rendered.map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Writes a JSON value to stdout.
fn write_json(value: &Value, pretty: bool) -> CliResult<()> {
    let bytes = render_json(value, pretty)?;
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
