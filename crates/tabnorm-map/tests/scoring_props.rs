//! Property tests: accumulated scores do not depend on detector run order.

use proptest::prelude::*;
use tabnorm_catalog::{Catalog, ColumnDetector};
use tabnorm_map::ColumnMapper;
use tabnorm_model::{EngineSettings, RowClassification, RunState, ScorePatch, Sheet, SourceTable};

const FIELDS: [&str; 3] = ["a", "b", "c"];

fn catalog(deltas: &[(usize, i32)], origin_order: &[usize]) -> Catalog {
    let mut catalog = Catalog::new();
    for (slot, (field, delta)) in origin_order.iter().zip(deltas) {
        let field = FIELDS[*field];
        // Quarter steps keep every partial sum exact.
        let delta = f64::from(*delta) / 4.0;
        catalog
            .register_column_detector(ColumnDetector::new(
                format!("props::d{slot:03}"),
                field,
                move |_| Ok(ScorePatch::Delta(delta)),
            ))
            .unwrap();
    }
    catalog.finalize();
    catalog
}

fn table() -> SourceTable {
    let sheet = Sheet::from_text("s", vec![vec!["x", "y"], vec!["1", "2"]]);
    let classification = RowClassification {
        header_row: Some(0),
        data_rows: vec![1],
        rows: Vec::new(),
    };
    SourceTable::from_sheet(&sheet, &classification)
}

proptest! {
    #[test]
    fn scores_are_order_independent(
        deltas in prop::collection::vec((0usize..3, -8i32..8), 1..10),
        seed in any::<u64>(),
    ) {
        let forward: Vec<usize> = (0..deltas.len()).collect();
        let mut shuffled = forward.clone();
        let rotate = (seed as usize) % shuffled.len();
        shuffled.rotate_left(rotate);
        shuffled.reverse();

        let settings = EngineSettings::default();
        let table = table();
        let a = catalog(&deltas, &forward);
        let b = catalog(&deltas, &shuffled);
        let score = |catalog: &Catalog| {
            ColumnMapper::new(catalog, &settings).score(
                &table,
                &mut RunState::new(),
                &mut Vec::new(),
            )
        };
        let scores_a = score(&a);
        let scores_b = score(&b);
        prop_assert_eq!(scores_a, scores_b);
    }
}
