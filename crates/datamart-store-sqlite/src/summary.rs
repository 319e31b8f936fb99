// crates/datamart-store-sqlite/src/summary.rs
// ============================================================================
// Module: Summary Reports
// Description: Breakdown, source summary, and loaded statistics reports.
// Purpose: Classify per-source summary rows into count buckets.
// Dependencies: datamart-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! Summary reports read `sz_dm_report`, one row per stored statistic key.
//! Cross-source summaries classify rows into the five buckets by base
//! statistic and admit them through the requested match key and principle
//! dimensions. A bucket with no admitted row still appears, as a zero bucket
//! keyed by the requested dimensions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use datamart_core::BucketKey;
use datamart_core::CrossSourceSummary;
use datamart_core::DataSourceCatalog;
use datamart_core::DataSourceCode;
use datamart_core::DataSourceCounts;
use datamart_core::EntityRelationsCount;
use datamart_core::EntitySizeCount;
use datamart_core::KeyDimension;
use datamart_core::LoadedStats;
use datamart_core::MatchCounts;
use datamart_core::RelationCounts;
use datamart_core::RelationCountsSet;
use datamart_core::ReportCode;
use datamart_core::ReportKey;
use datamart_core::ReportStatistic;
use datamart_core::SourceSummary;
use datamart_core::StatisticKey;
use datamart_core::SummaryBucket;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::params;
use tracing::debug;
use tracing::warn;

use crate::store::SqliteReportError;
use crate::store::db_error;

// ============================================================================
// SECTION: Summary Rows
// ============================================================================

/// One decoded `sz_dm_report` row.
struct SummaryRow {
    /// Stored statistic key.
    statistic: StatisticKey,
    /// Entity count.
    entity_count: i64,
    /// Record count.
    record_count: i64,
    /// Relation count.
    relation_count: i64,
}

impl SummaryRow {
    /// Returns the bucket identity of the stored dimensions.
    fn bucket_key(&self) -> BucketKey {
        (
            self.statistic.match_key().value().map(str::to_string),
            self.statistic.principle().value().map(str::to_string),
        )
    }
}

/// Reads the summary rows of one report category and data source pair.
fn summary_rows(
    connection: &Connection,
    code: ReportCode,
    data_source: &DataSourceCode,
    versus: &DataSourceCode,
) -> Result<Vec<SummaryRow>, SqliteReportError> {
    debug!(report = %code, data_source = %data_source, versus = %versus, "querying summary rows");
    let mut statement = connection
        .prepare(
            "SELECT statistic, entity_count, record_count, relation_count FROM sz_dm_report \
             WHERE report = ?1 AND data_source1 = ?2 AND data_source2 = ?3 ORDER BY statistic",
        )
        .map_err(|err| db_error(&err))?;
    let rows = statement
        .query_map(params![code.as_str(), data_source.as_str(), versus.as_str()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })
        .map_err(|err| db_error(&err))?;
    let mut decoded = Vec::new();
    for row in rows {
        let (token, entity_count, record_count, relation_count) =
            row.map_err(|err| db_error(&err))?;
        decoded.push(SummaryRow {
            statistic: decode_stored_statistic(&token)?,
            entity_count,
            record_count,
            relation_count,
        });
    }
    Ok(decoded)
}

/// Decodes a stored statistic token, treating failures as corrupt data.
fn decode_stored_statistic(token: &str) -> Result<StatisticKey, SqliteReportError> {
    StatisticKey::decode(token)
        .map_err(|err| SqliteReportError::Corrupt(format!("stored statistic {token}: {err}")))
}

// ============================================================================
// SECTION: Breakdowns
// ============================================================================

/// Reads every breakdown row of a category as `(value, entities, records)`.
fn breakdown_rows(
    connection: &Connection,
    code: ReportCode,
) -> Result<Vec<(i64, i64, i64)>, SqliteReportError> {
    debug!(report = %code, "querying breakdown rows");
    let mut statement = connection
        .prepare("SELECT statistic, entity_count, record_count FROM sz_dm_report WHERE report = ?1")
        .map_err(|err| db_error(&err))?;
    let rows = statement
        .query_map(params![code.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, i64>(2)?))
        })
        .map_err(|err| db_error(&err))?;
    let mut breakdown = Vec::new();
    for row in rows {
        let (statistic, entity_count, record_count) = row.map_err(|err| db_error(&err))?;
        let value = statistic.parse::<i64>().map_err(|_| {
            SqliteReportError::Corrupt(format!("{code} statistic is not a count: {statistic}"))
        })?;
        breakdown.push((value, entity_count, record_count));
    }
    breakdown.sort_unstable();
    Ok(breakdown)
}

/// Reads the `(entities, records)` of one breakdown key, if stored.
fn breakdown_row(
    connection: &Connection,
    report_key: &ReportKey,
) -> Result<Option<(i64, i64)>, SqliteReportError> {
    connection
        .query_row(
            "SELECT entity_count, record_count FROM sz_dm_report WHERE report_key = ?1",
            params![report_key.encode()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|err| db_error(&err))
}

/// Lists entity counts by entity size, ascending by size.
///
/// # Errors
///
/// Returns [`SqliteReportError::Db`] when the query fails and
/// [`SqliteReportError::Corrupt`] when a stored size is not an integer.
pub fn entity_size_breakdown(
    connection: &Connection,
) -> Result<Vec<EntitySizeCount>, SqliteReportError> {
    Ok(breakdown_rows(connection, ReportCode::EntitySizeBreakdown)?
        .into_iter()
        .map(|(entity_size, entity_count, record_count)| EntitySizeCount {
            entity_size,
            entity_count,
            record_count,
        })
        .collect())
}

/// Returns the entity count for one entity size, zero when not stored.
///
/// # Errors
///
/// Returns [`SqliteReportError::Invalid`] when the size is less than one and
/// [`SqliteReportError::Db`] when the query fails.
pub fn entity_size_count(
    connection: &Connection,
    entity_size: i64,
) -> Result<EntitySizeCount, SqliteReportError> {
    let report_key = ReportKey::entity_size(entity_size)?;
    let (entity_count, record_count) = breakdown_row(connection, &report_key)?.unwrap_or((0, 0));
    Ok(EntitySizeCount {
        entity_size,
        entity_count,
        record_count,
    })
}

/// Lists entity counts by relation count, ascending by relation count.
///
/// # Errors
///
/// Returns [`SqliteReportError::Db`] when the query fails and
/// [`SqliteReportError::Corrupt`] when a stored count is not an integer.
pub fn entity_relations_breakdown(
    connection: &Connection,
) -> Result<Vec<EntityRelationsCount>, SqliteReportError> {
    Ok(breakdown_rows(connection, ReportCode::EntityRelationBreakdown)?
        .into_iter()
        .map(|(relation_count, entity_count, record_count)| EntityRelationsCount {
            relation_count,
            entity_count,
            record_count,
        })
        .collect())
}

/// Returns the entity count for one relation count, zero when not stored.
///
/// # Errors
///
/// Returns [`SqliteReportError::Invalid`] when the count is negative and
/// [`SqliteReportError::Db`] when the query fails.
pub fn entity_relations_count(
    connection: &Connection,
    relation_count: i64,
) -> Result<EntityRelationsCount, SqliteReportError> {
    let report_key = ReportKey::entity_relations(relation_count)?;
    let (entity_count, record_count) = breakdown_row(connection, &report_key)?.unwrap_or((0, 0));
    Ok(EntityRelationsCount {
        relation_count,
        entity_count,
        record_count,
    })
}

// ============================================================================
// SECTION: Cross Source Summary
// ============================================================================

/// Returns the relation bucket set for a non-match bucket.
fn relation_buckets(
    summary: &mut CrossSourceSummary,
    bucket: SummaryBucket,
) -> Option<&mut RelationCountsSet> {
    match bucket {
        SummaryBucket::Matched => None,
        SummaryBucket::AmbiguousMatch => Some(&mut summary.ambiguous_matches),
        SummaryBucket::PossibleMatch => Some(&mut summary.possible_matches),
        SummaryBucket::PossibleRelation => Some(&mut summary.possible_relations),
        SummaryBucket::DisclosedRelation => Some(&mut summary.disclosed_relations),
    }
}

/// Adds an admitted row to its bucket.
fn insert_row(summary: &mut CrossSourceSummary, bucket: SummaryBucket, row: &SummaryRow) {
    let (match_key, principle) = row.bucket_key();
    match relation_buckets(summary, bucket) {
        Some(set) => set.insert(RelationCounts {
            match_key,
            principle,
            entity_count: row.entity_count,
            record_count: row.record_count,
            relation_count: row.relation_count,
        }),
        None => summary.matches.insert(MatchCounts {
            match_key,
            principle,
            entity_count: row.entity_count,
            record_count: row.record_count,
        }),
    }
}

/// Adds a zero bucket for the requested dimensions.
fn insert_zero(summary: &mut CrossSourceSummary, bucket: SummaryBucket, key: BucketKey) {
    match relation_buckets(summary, bucket) {
        Some(set) => set.insert_zero_if_missing(key),
        None => summary.matches.insert_zero_if_missing(key),
    }
}

/// Builds a cross summary from already validated inputs.
fn build_cross_source_summary(
    connection: &Connection,
    data_source: DataSourceCode,
    versus: DataSourceCode,
    match_key: &KeyDimension,
    principle: &KeyDimension,
) -> Result<CrossSourceSummary, SqliteReportError> {
    let rows = summary_rows(connection, ReportCode::CrossSourceSummary, &data_source, &versus)?;
    let mut summary = CrossSourceSummary::empty(data_source, versus);
    let zero_key: BucketKey =
        (match_key.value().map(str::to_string), principle.value().map(str::to_string));
    for statistic in ReportStatistic::BUCKETED {
        let Some(bucket) = statistic.bucket() else {
            continue;
        };
        let query = StatisticKey::of(statistic).with_dimensions(match_key.clone(), principle.clone());
        let mut admitted = false;
        for row in rows.iter().filter(|row| query.admits(&row.statistic)) {
            insert_row(&mut summary, bucket, row);
            admitted = true;
        }
        if !admitted {
            insert_zero(&mut summary, bucket, zero_key.clone());
        }
    }
    Ok(summary)
}

/// Summarizes matches and relations between two data sources.
///
/// `match_key` and `principle` select the dimensions: `None` for the
/// dimensionless totals, a value for one bucket, `*` for every stored value.
///
/// # Errors
///
/// Returns [`SqliteReportError::Invalid`] for data sources outside the catalog
/// or malformed dimensions (before any query runs),
/// [`SqliteReportError::Corrupt`] for undecodable stored statistics, and
/// [`SqliteReportError::Db`] when the query fails.
pub fn cross_source_summary(
    connection: &Connection,
    catalog: &DataSourceCatalog,
    data_source: &str,
    versus: &str,
    match_key: Option<&str>,
    principle: Option<&str>,
) -> Result<CrossSourceSummary, SqliteReportError> {
    let data_source = catalog.require(data_source)?;
    let versus = catalog.require(versus)?;
    let match_key = KeyDimension::from_optional(match_key)?;
    let principle = KeyDimension::from_optional(principle)?;
    build_cross_source_summary(connection, data_source, versus, &match_key, &principle)
}

// ============================================================================
// SECTION: Source Summary
// ============================================================================

/// Summarizes one data source and compares it with every catalog source.
///
/// # Errors
///
/// See [`cross_source_summary`].
pub fn source_summary(
    connection: &Connection,
    catalog: &DataSourceCatalog,
    data_source: &str,
    match_key: Option<&str>,
    principle: Option<&str>,
) -> Result<SourceSummary, SqliteReportError> {
    let data_source = catalog.require(data_source)?;
    let match_key = KeyDimension::from_optional(match_key)?;
    let principle = KeyDimension::from_optional(principle)?;

    let rows = summary_rows(connection, ReportCode::DataSourceSummary, &data_source, &data_source)?;
    let entity_key = StatisticKey::of(ReportStatistic::EntityCount);
    let unmatched_key = StatisticKey::of(ReportStatistic::UnmatchedCount);
    let (entity_count, record_count) =
        match rows.iter().find(|row| row.statistic == entity_key) {
            Some(row) => (row.entity_count, row.record_count),
            None => {
                warn!(data_source = %data_source, "data source summary row missing");
                (0, 0)
            }
        };
    let unmatched_record_count =
        rows.iter().find(|row| row.statistic == unmatched_key).map_or(0, |row| row.record_count);

    let mut cross_source_summaries = Vec::with_capacity(catalog.len());
    for versus in catalog.iter() {
        cross_source_summaries.push(build_cross_source_summary(
            connection,
            data_source.clone(),
            versus.clone(),
            &match_key,
            &principle,
        )?);
    }
    Ok(SourceSummary {
        data_source,
        entity_count,
        record_count,
        unmatched_record_count,
        cross_source_summaries,
    })
}

// ============================================================================
// SECTION: Loaded Statistics
// ============================================================================

/// Reports loaded record and entity counts for every catalog data source.
///
/// # Errors
///
/// Returns [`SqliteReportError::Db`] when a query fails and
/// [`SqliteReportError::Corrupt`] for undecodable stored rows.
pub fn loaded_stats(
    connection: &Connection,
    catalog: &DataSourceCatalog,
) -> Result<LoadedStats, SqliteReportError> {
    let total_record_count: i64 = connection
        .query_row("SELECT COUNT(*) FROM sz_dm_record", params![], |row| row.get(0))
        .map_err(|err| db_error(&err))?;
    let total_entity_count: i64 = connection
        .query_row("SELECT COUNT(*) FROM sz_dm_entity", params![], |row| row.get(0))
        .map_err(|err| db_error(&err))?;

    let entity_key = StatisticKey::of(ReportStatistic::EntityCount);
    let unmatched_key = StatisticKey::of(ReportStatistic::UnmatchedCount);
    let mut counts: BTreeMap<DataSourceCode, DataSourceCounts> = BTreeMap::new();
    {
        let mut statement = connection
            .prepare(
                "SELECT data_source1, statistic, entity_count, record_count FROM sz_dm_report \
                 WHERE report = ?1 AND data_source1 = data_source2",
            )
            .map_err(|err| db_error(&err))?;
        let rows = statement
            .query_map(params![ReportCode::DataSourceSummary.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, i64>(3)?,
                ))
            })
            .map_err(|err| db_error(&err))?;
        for row in rows {
            let (raw_source, token, entity_count, record_count) =
                row.map_err(|err| db_error(&err))?;
            let data_source = DataSourceCode::parse(&raw_source).map_err(|err| {
                SqliteReportError::Corrupt(format!("stored data source {raw_source}: {err}"))
            })?;
            if !catalog.contains(&data_source) {
                debug!(data_source = %data_source, "skipping summary row outside the catalog");
                continue;
            }
            let statistic = decode_stored_statistic(&token)?;
            let entry = counts.entry(data_source.clone()).or_insert_with(|| DataSourceCounts {
                data_source,
                record_count: 0,
                entity_count: 0,
                unmatched_record_count: 0,
            });
            if statistic == entity_key {
                entry.entity_count = entity_count;
                entry.record_count = record_count;
            } else if statistic == unmatched_key {
                entry.unmatched_record_count = record_count;
            }
        }
    }

    let mut data_source_counts = Vec::with_capacity(catalog.len());
    for code in catalog.iter() {
        let entry = counts.remove(code).unwrap_or_else(|| {
            warn!(data_source = %code, "no summary rows for catalog data source");
            DataSourceCounts {
                data_source: code.clone(),
                record_count: 0,
                entity_count: 0,
                unmatched_record_count: 0,
            }
        });
        data_source_counts.push(entry);
    }
    let total_unmatched_record_count =
        data_source_counts.iter().map(|entry| entry.unmatched_record_count).sum();
    Ok(LoadedStats {
        total_record_count,
        total_entity_count,
        total_unmatched_record_count,
        data_source_counts,
    })
}
