//! Property tests for score accumulation.

use proptest::prelude::*;
use tabnorm_model::{ScorePatch, ScoreTable};

const TARGETS: [&str; 3] = ["data", "header", "notes"];

fn patch_strategy() -> impl Strategy<Value = ScorePatch> {
    prop_oneof![
        (-16i32..16).prop_map(|d| ScorePatch::Delta(f64::from(d) / 8.0)),
        prop::collection::btree_map(
            prop::sample::select(vec!["data", "header", "notes", "footer"]),
            -16i32..16,
            0..3,
        )
        .prop_map(|map| {
            ScorePatch::Targets(
                map.into_iter()
                    .map(|(k, v)| (k.to_string(), f64::from(v) / 8.0))
                    .collect(),
            )
        }),
    ]
}

fn fold(patches: &[ScorePatch]) -> (ScoreTable, usize) {
    let mut table = ScoreTable::new(TARGETS);
    let mut rejected = 0;
    for patch in patches {
        rejected += table.apply(patch.clone(), Some("header")).len();
    }
    (table, rejected)
}

proptest! {
    #[test]
    fn accumulation_ignores_patch_order(patches in prop::collection::vec(patch_strategy(), 0..12)) {
        let mut reversed = patches.clone();
        reversed.reverse();
        prop_assert_eq!(fold(&patches), fold(&reversed));
    }

    #[test]
    fn unknown_targets_never_enter_the_table(
        patches in prop::collection::vec(patch_strategy(), 0..12)
    ) {
        let (table, _) = fold(&patches);
        prop_assert_eq!(table.len(), TARGETS.len());
        prop_assert_eq!(table.get("footer"), 0.0);
    }
}
