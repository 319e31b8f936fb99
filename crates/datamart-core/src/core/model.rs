// crates/datamart-core/src/core/model.rs
// ============================================================================
// Module: Report Models
// Description: Result objects returned by report retrieval.
// Purpose: Provide immutable, serializable page and summary shapes.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Every model here is built fresh per call from query results. Pages carry
//! both the displayed items and the window boundaries of the candidate set
//! they were drawn from, so sampled pages still continue correctly.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::core::bound::BoundType;
use crate::core::error::ReportError;
use crate::core::identifiers::DataSourceCode;
use crate::core::identifiers::EntityId;

// ============================================================================
// SECTION: Records and Entities
// ============================================================================

/// One record as it contributes to a reported entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRecord {
    /// Data source code of the record.
    pub data_source: String,
    /// Record identifier within the data source.
    pub record_id: String,
    /// Why the record merged into its entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_key: Option<String>,
    /// Resolution rule that merged the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principle: Option<String>,
}

impl ReportRecord {
    /// Returns the ordering key `(data_source, record_id)`.
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.data_source, &self.record_id)
    }
}

/// An entity as shown in a report page.
///
/// # Invariants
/// - `records` is ordered and unique by [`ReportRecord::key`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntity {
    /// Entity identifier.
    pub entity_id: EntityId,
    /// Best display name for the entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    /// Number of records in the entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record_count: Option<i64>,
    /// Number of relations the entity participates in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation_count: Option<i64>,
    /// Constituent records.
    #[serde(default)]
    pub records: Vec<ReportRecord>,
}

impl ReportEntity {
    /// Creates an entity with no summary fields or records.
    #[must_use]
    pub const fn new(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            entity_name: None,
            record_count: None,
            relation_count: None,
            records: Vec::new(),
        }
    }

    /// Adds a record, replacing any record with the same key.
    pub fn add_record(&mut self, record: ReportRecord) {
        let position =
            self.records.binary_search_by(|existing| existing.key().cmp(&record.key()));
        match position {
            Ok(index) => self.records[index] = record,
            Err(index) => self.records.insert(index, record),
        }
    }
}

// ============================================================================
// SECTION: Relations
// ============================================================================

/// Relation categories stored in the relation summary table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    /// Ambiguous match.
    AmbiguousMatch,
    /// Possible match.
    PossibleMatch,
    /// Possible relation.
    PossibleRelation,
    /// Disclosed relation.
    DisclosedRelation,
}

impl RelationType {
    /// Returns the stored label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AmbiguousMatch => "AMBIGUOUS_MATCH",
            Self::PossibleMatch => "POSSIBLE_MATCH",
            Self::PossibleRelation => "POSSIBLE_RELATION",
            Self::DisclosedRelation => "DISCLOSED_RELATION",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = ReportError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "AMBIGUOUS_MATCH" => Ok(Self::AmbiguousMatch),
            "POSSIBLE_MATCH" => Ok(Self::PossibleMatch),
            "POSSIBLE_RELATION" => Ok(Self::PossibleRelation),
            "DISCLOSED_RELATION" => Ok(Self::DisclosedRelation),
            other => Err(ReportError::Corrupt(format!("unknown relation type: {other}"))),
        }
    }
}

/// A relation between two entities as shown in a report page.
///
/// # Invariants
/// - `match_key` is expressed from `entity` toward `related_entity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRelation {
    /// Primary side of the relation.
    pub entity: ReportEntity,
    /// Related side of the relation.
    pub related_entity: ReportEntity,
    /// Relation category.
    pub relation_type: RelationType,
    /// Direction-normalized match key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_key: Option<String>,
    /// Resolution rule that produced the relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principle: Option<String>,
}

impl ReportRelation {
    /// Returns the `(entity_id, related_id)` ordering key.
    #[must_use]
    pub const fn key(&self) -> (EntityId, EntityId) {
        (self.entity.entity_id, self.related_entity.entity_id)
    }
}

// ============================================================================
// SECTION: Pages
// ============================================================================

/// One page of entities from a report slice.
///
/// # Invariants
/// - `entities` is ascending by entity id.
/// - `before_page_count + candidate_count + after_page_count == total_entity_count`
///   whenever the underlying store did not change between queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitiesPage {
    /// Effective bound text.
    pub bound: String,
    /// Effective bound type.
    pub bound_type: BoundType,
    /// Page size used for the candidate scan.
    pub page_size: usize,
    /// Requested sample size, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<usize>,
    /// Smallest entity id among the candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_minimum_value: Option<EntityId>,
    /// Largest entity id among the candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_maximum_value: Option<EntityId>,
    /// Entities in the whole report slice.
    pub total_entity_count: i64,
    /// Entities ordered before the page window.
    pub before_page_count: i64,
    /// Entities ordered after the page window.
    pub after_page_count: i64,
    /// Displayed entities.
    pub entities: Vec<ReportEntity>,
    /// Entities matched before sampling.
    #[serde(skip)]
    pub candidate_count: usize,
}

impl EntitiesPage {
    /// Smallest displayed entity id.
    #[must_use]
    pub fn minimum_value(&self) -> Option<EntityId> {
        self.entities.first().map(|entity| entity.entity_id)
    }

    /// Largest displayed entity id.
    #[must_use]
    pub fn maximum_value(&self) -> Option<EntityId> {
        self.entities.last().map(|entity| entity.entity_id)
    }

    /// Returns true when no further entities exist in the scan direction.
    #[must_use]
    pub const fn is_last_page(&self) -> bool {
        self.candidate_count < self.page_size
    }
}

/// One page of relations from a report slice.
///
/// # Invariants
/// - `relations` is ascending by `(entity_id, related_id)`.
/// - Bound and window values use the `entity:related` grammar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationsPage {
    /// Effective bound text.
    pub bound: String,
    /// Effective bound type.
    pub bound_type: BoundType,
    /// Page size used for the candidate scan.
    pub page_size: usize,
    /// Requested sample size, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_size: Option<usize>,
    /// Smallest relation key among the candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_minimum_value: Option<String>,
    /// Largest relation key among the candidates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_maximum_value: Option<String>,
    /// Relations in the whole report slice.
    pub total_relation_count: i64,
    /// Relations ordered before the page window.
    pub before_page_count: i64,
    /// Relations ordered after the page window.
    pub after_page_count: i64,
    /// Displayed relations.
    pub relations: Vec<ReportRelation>,
    /// Relations matched before sampling.
    #[serde(skip)]
    pub candidate_count: usize,
}

impl RelationsPage {
    /// Returns true when no further relations exist in the scan direction.
    #[must_use]
    pub const fn is_last_page(&self) -> bool {
        self.candidate_count < self.page_size
    }
}

// ============================================================================
// SECTION: Count Buckets
// ============================================================================

/// `(match_key, principle)` identity of a count bucket.
pub type BucketKey = (Option<String>, Option<String>);

/// Shared behaviour of match and relation count buckets.
pub trait CountsBucket {
    /// Returns the bucket identity.
    fn bucket_key(&self) -> BucketKey;

    /// Returns a zero-valued bucket for the identity.
    fn zero(key: BucketKey) -> Self;
}

/// Entity and record counts for one `(match_key, principle)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchCounts {
    /// Match key, if the bucket is keyed by one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_key: Option<String>,
    /// Principle, if the bucket is keyed by one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principle: Option<String>,
    /// Entity count.
    pub entity_count: i64,
    /// Record count.
    pub record_count: i64,
}

impl CountsBucket for MatchCounts {
    fn bucket_key(&self) -> BucketKey {
        (self.match_key.clone(), self.principle.clone())
    }

    fn zero(key: BucketKey) -> Self {
        Self {
            match_key: key.0,
            principle: key.1,
            entity_count: 0,
            record_count: 0,
        }
    }
}

/// Entity, record, and relation counts for one `(match_key, principle)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationCounts {
    /// Match key, if the bucket is keyed by one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_key: Option<String>,
    /// Principle, if the bucket is keyed by one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principle: Option<String>,
    /// Entity count.
    pub entity_count: i64,
    /// Record count.
    pub record_count: i64,
    /// Relation count.
    pub relation_count: i64,
}

impl CountsBucket for RelationCounts {
    fn bucket_key(&self) -> BucketKey {
        (self.match_key.clone(), self.principle.clone())
    }

    fn zero(key: BucketKey) -> Self {
        Self {
            match_key: key.0,
            principle: key.1,
            entity_count: 0,
            record_count: 0,
            relation_count: 0,
        }
    }
}

/// Buckets keyed by `(match_key, principle)`.
///
/// # Invariants
/// - At most one bucket per key; a later insert replaces the earlier one.
/// - Serializes as a list ordered by key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSet<T> {
    /// Buckets by identity.
    buckets: BTreeMap<BucketKey, T>,
}

impl<T: CountsBucket> BucketSet<T> {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buckets: BTreeMap::new(),
        }
    }

    /// Inserts a bucket, replacing any bucket with the same key.
    pub fn insert(&mut self, bucket: T) {
        self.buckets.insert(bucket.bucket_key(), bucket);
    }

    /// Inserts a zero bucket for the key unless one is already present.
    pub fn insert_zero_if_missing(&mut self, key: BucketKey) {
        self.buckets.entry(key.clone()).or_insert_with(|| T::zero(key));
    }

    /// Returns the bucket for a key.
    #[must_use]
    pub fn get(&self, match_key: Option<&str>, principle: Option<&str>) -> Option<&T> {
        self.buckets.get(&(match_key.map(str::to_string), principle.map(str::to_string)))
    }

    /// Iterates buckets in key order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buckets.values()
    }

    /// Returns the number of buckets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Returns true when the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

impl<T: CountsBucket> Default for BucketSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CountsBucket> FromIterator<T> for BucketSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::new();
        for bucket in iter {
            set.insert(bucket);
        }
        set
    }
}

impl<T: Serialize> Serialize for BucketSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.buckets.values())
    }
}

impl<'de, T: Deserialize<'de> + CountsBucket> Deserialize<'de> for BucketSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let buckets = Vec::<T>::deserialize(deserializer)?;
        Ok(buckets.into_iter().collect())
    }
}

/// Match buckets.
pub type MatchCountsSet = BucketSet<MatchCounts>;

/// Relation buckets.
pub type RelationCountsSet = BucketSet<RelationCounts>;

// ============================================================================
// SECTION: Summaries
// ============================================================================

/// Match and relation statistics between two data sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossSourceSummary {
    /// Primary data source.
    pub data_source: DataSourceCode,
    /// Data source compared against (equal for self-comparison).
    pub versus_data_source: DataSourceCode,
    /// Matched records.
    pub matches: MatchCountsSet,
    /// Ambiguous matches.
    pub ambiguous_matches: RelationCountsSet,
    /// Possible matches.
    pub possible_matches: RelationCountsSet,
    /// Possible relations.
    pub possible_relations: RelationCountsSet,
    /// Disclosed relations.
    pub disclosed_relations: RelationCountsSet,
}

impl CrossSourceSummary {
    /// Creates a summary with no buckets.
    #[must_use]
    pub const fn empty(data_source: DataSourceCode, versus_data_source: DataSourceCode) -> Self {
        Self {
            data_source,
            versus_data_source,
            matches: BucketSet::new(),
            ambiguous_matches: BucketSet::new(),
            possible_matches: BucketSet::new(),
            possible_relations: BucketSet::new(),
            disclosed_relations: BucketSet::new(),
        }
    }
}

/// Summary statistics for one data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    /// Summarized data source.
    pub data_source: DataSourceCode,
    /// Entities with at least one record from the data source.
    pub entity_count: i64,
    /// Records loaded from the data source.
    pub record_count: i64,
    /// Records that did not match any other record.
    pub unmatched_record_count: i64,
    /// One comparison per catalog data source.
    pub cross_source_summaries: Vec<CrossSourceSummary>,
}

/// Loaded counts for one data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceCounts {
    /// Data source.
    pub data_source: DataSourceCode,
    /// Records loaded.
    pub record_count: i64,
    /// Entities with records from the data source.
    pub entity_count: i64,
    /// Records that did not match any other record.
    pub unmatched_record_count: i64,
}

/// Repository-wide loaded counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedStats {
    /// Records across all data sources.
    pub total_record_count: i64,
    /// Entities across all data sources.
    pub total_entity_count: i64,
    /// Unmatched records across catalog data sources.
    pub total_unmatched_record_count: i64,
    /// Per data source counts in catalog order.
    pub data_source_counts: Vec<DataSourceCounts>,
}

/// Entity and record counts for one entity size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySizeCount {
    /// Records per entity.
    pub entity_size: i64,
    /// Entities of that size.
    pub entity_count: i64,
    /// Records held by those entities.
    #[serde(default)]
    pub record_count: i64,
}

/// Entity and record counts for one relation count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityRelationsCount {
    /// Relations per entity.
    pub relation_count: i64,
    /// Entities with that many relations.
    pub entity_count: i64,
    /// Records held by those entities.
    #[serde(default)]
    pub record_count: i64,
}
