//! Property tests for catalog ordering.

use proptest::prelude::*;
use tabnorm_catalog::{Catalog, Record, RowDetector};
use tabnorm_model::ScorePatch;

fn build(records: &[(i32, String)]) -> Vec<String> {
    let mut catalog = Catalog::new();
    for (priority, origin) in records {
        catalog
            .register_row_detector(
                RowDetector::new(origin.clone(), "header", |_| Ok(ScorePatch::none()))
                    .with_priority(*priority),
            )
            .unwrap();
    }
    catalog.finalize();
    catalog
        .row_detectors()
        .iter()
        .map(|d| format!("{}:{}", d.priority(), d.origin()))
        .collect()
}

proptest! {
    #[test]
    fn ordering_is_a_function_of_priority_and_origin(
        records in prop::collection::vec((-3i32..3, "[a-d]::[a-d]{1,3}"), 0..12),
        seed in any::<u64>(),
    ) {
        let first = build(&records);

        let mut shuffled = records.clone();
        let len = shuffled.len();
        if len > 1 {
            let rotate = (seed as usize) % len;
            shuffled.rotate_left(rotate);
            shuffled.reverse();
        }
        let second = build(&shuffled);

        prop_assert_eq!(&first, &second);

        let keys: Vec<(i32, String)> = first
            .iter()
            .map(|entry| {
                let (priority, origin) = entry.split_once(':').unwrap();
                (-priority.parse::<i32>().unwrap(), origin.to_string())
            })
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        prop_assert_eq!(keys, sorted);
    }
}
