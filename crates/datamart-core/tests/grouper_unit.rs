// crates/datamart-core/tests/grouper_unit.rs
// ============================================================================
// Module: Row Grouper and Sampler Unit Tests
// Description: Grouping of flattened rows and sampling of candidates.
// Purpose: Validate quota handling, window tracking, and sample uniformity.
// ============================================================================

//! Unit tests for row grouping and candidate sampling.

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

use std::collections::BTreeMap;
use std::convert::Infallible;

use datamart_core::GroupRow;
use datamart_core::RowGrouper;
use datamart_core::group_rows;
use datamart_core::sample_groups;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// `(key, detail)` row.
struct Row(i64, &'static str);

impl GroupRow for Row {
    type Group = Vec<&'static str>;
    type Key = i64;

    fn key(&self) -> i64 {
        self.0
    }

    fn start(self) -> Self::Group {
        vec![self.1]
    }

    fn merge_into(self, group: &mut Self::Group) {
        group.push(self.1);
    }
}

fn ok_rows(rows: Vec<Row>) -> impl Iterator<Item = Result<Row, Infallible>> {
    rows.into_iter().map(Ok)
}

// ============================================================================
// SECTION: Grouping
// ============================================================================

#[test]
fn consecutive_rows_fold_into_one_group() {
    let rows = vec![Row(1, "a"), Row(1, "b"), Row(2, "c"), Row(3, "d"), Row(3, "e")];
    let page = group_rows(ok_rows(rows), 10).unwrap();
    assert_eq!(
        page.groups,
        vec![(1, vec!["a", "b"]), (2, vec!["c"]), (3, vec!["d", "e"])]
    );
    assert_eq!(page.minimum, Some(1));
    assert_eq!(page.maximum, Some(3));
    assert_eq!(page.candidate_count(), 3);
}

#[test]
fn quota_discards_the_partially_started_group() {
    let rows = vec![Row(1, "a"), Row(2, "b"), Row(2, "c"), Row(3, "d"), Row(3, "e")];
    let page = group_rows(ok_rows(rows), 2).unwrap();
    assert_eq!(page.groups, vec![(1, vec!["a"]), (2, vec!["b", "c"])]);
    assert_eq!(page.maximum, Some(2));
}

#[test]
fn grouper_stops_accepting_rows_once_full() {
    let mut grouper = RowGrouper::<Row>::new(1);
    assert!(grouper.push(Row(5, "a")));
    assert!(grouper.push(Row(5, "b")));
    assert!(!grouper.push(Row(6, "c")));
    assert!(grouper.is_full());
    assert!(!grouper.push(Row(7, "d")));
    let page = grouper.finish();
    assert_eq!(page.groups, vec![(5, vec!["a", "b"])]);
}

#[test]
fn descending_scan_tracks_window_extremes() {
    let rows = vec![Row(9, "a"), Row(7, "b"), Row(4, "c")];
    let page = group_rows(ok_rows(rows), 5).unwrap();
    assert_eq!(page.minimum, Some(4));
    assert_eq!(page.maximum, Some(9));
}

#[test]
fn empty_rows_produce_empty_page() {
    let page = group_rows(ok_rows(Vec::new()), 5).unwrap();
    assert!(page.groups.is_empty());
    assert_eq!(page.minimum, None);
    assert_eq!(page.maximum, None);
}

#[test]
fn row_errors_propagate() {
    let rows: Vec<Result<Row, &str>> = vec![Ok(Row(1, "a")), Err("broken")];
    assert_eq!(group_rows(rows, 5).unwrap_err(), "broken");
}

// ============================================================================
// SECTION: Sampling
// ============================================================================

#[test]
fn sampling_keeps_requested_count_in_original_order() {
    let mut rng = StdRng::seed_from_u64(7);
    let candidates: Vec<i64> = (1 ..= 50).collect();
    let sample = sample_groups(candidates, Some(10), &mut rng);
    assert_eq!(sample.len(), 10);
    assert!(sample.windows(2).all(|pair| pair[0] < pair[1]));
    assert!(sample.iter().all(|value| (1 ..= 50).contains(value)));
}

#[test]
fn sampling_is_skipped_when_candidates_do_not_exceed_sample() {
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(sample_groups(vec![1, 2, 3], Some(3), &mut rng), vec![1, 2, 3]);
    assert_eq!(sample_groups(vec![1, 2], Some(5), &mut rng), vec![1, 2]);
    assert_eq!(sample_groups(vec![1, 2], None, &mut rng), vec![1, 2]);
}

#[test]
fn sampling_reaches_every_candidate() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut hits: BTreeMap<i64, usize> = BTreeMap::new();
    for _ in 0 .. 2_000 {
        for value in sample_groups((0 .. 10).collect::<Vec<i64>>(), Some(3), &mut rng) {
            *hits.entry(value).or_default() += 1;
        }
    }
    assert_eq!(hits.len(), 10);
    // Expected 600 hits per candidate.
    assert!(hits.values().all(|count| (450 .. 750).contains(count)));
}
