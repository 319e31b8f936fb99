// crates/datamart-core/src/runtime/grouper.rs
// ============================================================================
// Module: Row Grouper
// Description: Folds flattened, key-ordered join rows into aggregate objects.
// Purpose: Rebuild entities and relations from outer-join result rows.
// Dependencies: none
// ============================================================================

//! ## Overview
//! Outer expansion queries return one row per (key, detail) combination,
//! ordered by key. The grouper scans those rows once, accumulating
//! consecutive rows with the same key into one group and emitting the group
//! when the key changes. It stops as soon as the page quota of emitted groups
//! is reached; a group that had only started when the quota filled is
//! discarded.

// ============================================================================
// SECTION: Row Contract
// ============================================================================

/// A flattened row that belongs to one keyed group.
pub trait GroupRow {
    /// Ordering key of the group.
    type Key: Ord + Copy;
    /// Aggregate built from the rows.
    type Group;

    /// Returns the group key of this row.
    fn key(&self) -> Self::Key;

    /// Starts a new group from the first row of a key.
    fn start(self) -> Self::Group;

    /// Folds a subsequent row of the same key into its group.
    fn merge_into(self, group: &mut Self::Group);
}

// ============================================================================
// SECTION: Grouped Page
// ============================================================================

/// Groups emitted by a scan together with the candidate key window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupedPage<K, G> {
    /// Emitted groups in scan order.
    pub groups: Vec<(K, G)>,
    /// Smallest emitted key.
    pub minimum: Option<K>,
    /// Largest emitted key.
    pub maximum: Option<K>,
}

impl<K, G> GroupedPage<K, G> {
    /// Number of groups emitted before any sampling.
    #[must_use]
    pub fn candidate_count(&self) -> usize {
        self.groups.len()
    }
}

// ============================================================================
// SECTION: Grouper
// ============================================================================

/// Grouper scan state.
enum GroupState<K, G> {
    /// No group is open.
    Idle,
    /// Rows for `key` are being folded into `group`.
    Accumulating {
        /// Key of the open group.
        key: K,
        /// Open group.
        group: G,
    },
}

/// Incremental grouper with a page quota.
pub struct RowGrouper<R: GroupRow> {
    /// Current scan state.
    state: GroupState<R::Key, R::Group>,
    /// Maximum number of groups to emit.
    quota: usize,
    /// Emitted groups in scan order.
    groups: Vec<(R::Key, R::Group)>,
    /// Smallest emitted key.
    minimum: Option<R::Key>,
    /// Largest emitted key.
    maximum: Option<R::Key>,
}

impl<R: GroupRow> RowGrouper<R> {
    /// Creates a grouper that emits at most `quota` groups.
    #[must_use]
    pub fn new(quota: usize) -> Self {
        Self {
            state: GroupState::Idle,
            quota,
            groups: Vec::with_capacity(quota.min(1_024)),
            minimum: None,
            maximum: None,
        }
    }

    /// Returns true once the quota of emitted groups is reached.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.groups.len() >= self.quota
    }

    /// Feeds the next row; returns `false` once no further rows are accepted.
    pub fn push(&mut self, row: R) -> bool {
        if self.is_full() {
            return false;
        }
        let key = row.key();
        match std::mem::replace(&mut self.state, GroupState::Idle) {
            GroupState::Idle => {
                self.state = GroupState::Accumulating {
                    key,
                    group: row.start(),
                };
            }
            GroupState::Accumulating {
                key: open_key,
                mut group,
            } if open_key == key => {
                row.merge_into(&mut group);
                self.state = GroupState::Accumulating {
                    key,
                    group,
                };
            }
            GroupState::Accumulating {
                key: open_key,
                group,
            } => {
                self.emit(open_key, group);
                if self.is_full() {
                    return false;
                }
                self.state = GroupState::Accumulating {
                    key,
                    group: row.start(),
                };
            }
        }
        true
    }

    /// Flushes the open group (if the quota allows) and returns the page.
    #[must_use]
    pub fn finish(mut self) -> GroupedPage<R::Key, R::Group> {
        if let GroupState::Accumulating {
            key,
            group,
        } = std::mem::replace(&mut self.state, GroupState::Idle)
            && !self.is_full()
        {
            self.emit(key, group);
        }
        GroupedPage {
            groups: self.groups,
            minimum: self.minimum,
            maximum: self.maximum,
        }
    }

    /// Emits a completed group and widens the key window.
    fn emit(&mut self, key: R::Key, group: R::Group) {
        self.minimum = Some(self.minimum.map_or(key, |current| current.min(key)));
        self.maximum = Some(self.maximum.map_or(key, |current| current.max(key)));
        self.groups.push((key, group));
    }
}

/// Groups a fallible row stream with a page quota.
///
/// # Errors
///
/// Returns the first row error encountered before the quota fills.
pub fn group_rows<R, E, I>(rows: I, quota: usize) -> Result<GroupedPage<R::Key, R::Group>, E>
where
    R: GroupRow,
    I: IntoIterator<Item = Result<R, E>>,
{
    let mut grouper = RowGrouper::new(quota);
    for row in rows {
        if !grouper.push(row?) {
            break;
        }
    }
    Ok(grouper.finish())
}
