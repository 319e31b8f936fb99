// crates/datamart-store-sqlite/tests/proptest_pages.rs
// ============================================================================
// Module: Page Scan Property-Based Tests
// Description: Property tests for entity page windows over random slices.
// Purpose: Check window contents and count partitions against a model.
// ============================================================================

//! Property-based tests for entity page scans.

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

use std::collections::BTreeSet;

use datamart_core::BoundType;
use datamart_core::PageRequest;
use datamart_store_sqlite::retrieve_entities_page;
use proptest::prelude::*;

use crate::common::insert_entity;
use crate::common::insert_entity_detail;
use crate::common::insert_record;
use crate::common::memory_mart;
use crate::common::size_key;

fn bound_type_strategy() -> impl Strategy<Value = BoundType> {
    prop_oneof![
        Just(BoundType::ExclusiveLower),
        Just(BoundType::InclusiveLower),
        Just(BoundType::ExclusiveUpper),
        Just(BoundType::InclusiveUpper),
    ]
}

/// Expected window from the sorted id set.
fn model_window(ids: &BTreeSet<i64>, bound: i64, bound_type: BoundType, page: usize) -> Vec<i64> {
    let mut window: Vec<i64> = match bound_type {
        BoundType::ExclusiveLower => ids.range(bound + 1 ..).take(page).copied().collect(),
        BoundType::InclusiveLower => ids.range(bound ..).take(page).copied().collect(),
        BoundType::ExclusiveUpper => ids.range(.. bound).rev().take(page).copied().collect(),
        BoundType::InclusiveUpper => ids.range(..= bound).rev().take(page).copied().collect(),
    };
    window.sort_unstable();
    window
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn entity_pages_match_the_ordered_model(
        ids in prop::collection::btree_set(1_i64 .. 200, 0 .. 40),
        bound in 0_i64 .. 210,
        bound_type in bound_type_strategy(),
        page_size in 1_usize .. 12,
    ) {
        let connection = memory_mart();
        let key = size_key(1);
        for &entity_id in &ids {
            insert_entity(&connection, entity_id, 1);
            insert_record(&connection, "CUSTOMERS", &format!("C{entity_id}"), entity_id, None);
            insert_entity_detail(&connection, &key, entity_id);
        }

        let request = PageRequest::new()
            .with_bound(bound.to_string())
            .with_bound_type(bound_type)
            .with_page_size(page_size);
        let page = retrieve_entities_page(&connection, &key, &request).unwrap();

        let expected = model_window(&ids, bound, bound_type, page_size);
        let actual: Vec<i64> = page.entities.iter().map(|entity| entity.entity_id).collect();
        prop_assert_eq!(&actual, &expected);

        let total = i64::try_from(ids.len()).unwrap();
        let candidates = i64::try_from(page.candidate_count).unwrap();
        prop_assert_eq!(page.total_entity_count, total);
        prop_assert_eq!(page.before_page_count + candidates + page.after_page_count, total);
        if let Some(minimum) = expected.first() {
            let before = i64::try_from(ids.range(.. *minimum).count()).unwrap();
            prop_assert_eq!(page.before_page_count, before);
        }
    }
}
