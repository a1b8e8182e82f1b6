//! Row classification: labels every sheet row and picks the header row.

use tabnorm_catalog::{Catalog, Record, RowDetector, RowDetectorContext, ScopedLogger, guarded};
use tabnorm_model::diagnostics::codes;
use tabnorm_model::{
    DATA, HEADER, Issue, RejectedDelta, RowClassification, RowScore, RunState, ScoreTable, Sheet,
    Stage,
};
use tracing::{debug, warn};

/// Runs the catalog's row detectors over a sheet.
pub struct RowClassifier<'a> {
    catalog: &'a Catalog,
    header_scan_rows: usize,
}

impl<'a> RowClassifier<'a> {
    pub fn new(catalog: &'a Catalog, header_scan_rows: usize) -> Self {
        Self {
            catalog,
            header_scan_rows,
        }
    }

    /// Scores every row, selects the header and collects the data rows.
    ///
    /// The header is the row with the highest positive `header` score among
    /// the first `header_scan_rows` rows; ties go to the earliest row. When no
    /// candidate scores above zero the sheet is headerless.
    pub fn classify(
        &self,
        sheet: &Sheet,
        state: &mut RunState,
        issues: &mut Vec<Issue>,
    ) -> RowClassification {
        let detectors: Vec<(&RowDetector, ScopedLogger)> = self
            .catalog
            .row_detectors()
            .iter()
            .filter(|d| d.is_enabled())
            .map(|d| (d, ScopedLogger::new(d.origin())))
            .collect();

        let tables: Vec<ScoreTable> = (0..sheet.rows.len())
            .map(|index| self.score_row(sheet, index, &detectors, state, issues))
            .collect();

        let header_row = select_header(&tables, self.header_scan_rows);
        let mut data_rows = Vec::new();
        let rows: Vec<RowScore> = tables
            .into_iter()
            .enumerate()
            .map(|(index, table)| {
                let below_header = header_row.is_some_and(|header| index > header);
                let label = if Some(index) == header_row {
                    HEADER.to_string()
                } else {
                    label_row(&table, below_header)
                };
                let in_table = header_row.is_none_or(|header| index > header);
                if in_table && label == DATA {
                    data_rows.push(index);
                }
                RowScore {
                    index,
                    label,
                    scores: table.into_map(),
                }
            })
            .collect();

        debug!(
            sheet = %sheet.name,
            header_row = ?header_row,
            data_rows = data_rows.len(),
            "rows classified"
        );
        RowClassification {
            header_row,
            data_rows,
            rows,
        }
    }

    fn score_row(
        &self,
        sheet: &Sheet,
        index: usize,
        detectors: &[(&RowDetector, ScopedLogger)],
        state: &mut RunState,
        issues: &mut Vec<Issue>,
    ) -> ScoreTable {
        let mut table = ScoreTable::new(self.catalog.row_kinds().iter().cloned());
        for (detector, logger) in detectors {
            let mut ctx = RowDetectorContext {
                sheet: &sheet.name,
                row_index: index,
                row: &sheet.rows[index],
                rows: &sheet.rows,
                state: &mut *state,
                logger,
            };
            match guarded(|| detector.detect(&mut ctx)) {
                Ok(patch) => {
                    let rejected = table.apply(patch, Some(detector.kind()));
                    for delta in rejected {
                        let issue = ignored_delta(
                            Stage::RowClassification,
                            detector.origin(),
                            &sheet.name,
                            &delta,
                        );
                        issues.push(issue.with_row(index));
                    }
                }
                Err(err) => {
                    warn!(
                        origin = detector.origin(),
                        sheet = %sheet.name,
                        row = index,
                        error = %err,
                        "row detector failed"
                    );
                    issues.push(
                        Issue::warning(
                            Stage::RowClassification,
                            codes::DETECTOR_FAILED,
                            format!("row detector '{}' failed: {err:#}", detector.origin()),
                        )
                        .with_origin(detector.origin())
                        .with_sheet(&sheet.name)
                        .with_row(index),
                    );
                }
            }
        }
        table
    }
}

fn select_header(tables: &[ScoreTable], scan_rows: usize) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, table) in tables.iter().enumerate().take(scan_rows) {
        let score = table.get(HEADER);
        if score <= 0.0 {
            continue;
        }
        match best {
            Some((_, top)) if score <= top => {}
            _ => best = Some((index, score)),
        }
    }
    best.map(|(index, _)| index)
}

/// Highest-scoring kind for a row; ties prefer `data`, then key order.
/// Rows below the chosen header never take the `header` label.
fn label_row(table: &ScoreTable, below_header: bool) -> String {
    let candidates = table
        .as_map()
        .iter()
        .filter(|(kind, _)| !(below_header && kind.as_str() == HEADER));
    let top = candidates
        .clone()
        .map(|(_, score)| *score)
        .fold(f64::NEG_INFINITY, f64::max);
    if table.get(DATA) >= top {
        return DATA.to_string();
    }
    candidates
        .into_iter()
        .find(|(_, score)| **score >= top)
        .map_or_else(|| DATA.to_string(), |(kind, _)| kind.clone())
}

/// Warning issue for a delta a score table refused.
pub(crate) fn ignored_delta(
    stage: Stage,
    origin: &str,
    sheet: &str,
    delta: &RejectedDelta,
) -> Issue {
    let target = delta.target.as_deref().unwrap_or("<default>");
    warn!(
        origin,
        sheet,
        target,
        delta = delta.delta,
        reason = delta.reason.description(),
        "score delta ignored"
    );
    Issue::warning(
        stage,
        codes::SCORE_IGNORED,
        format!(
            "ignored delta {} for '{target}' from '{origin}': {}",
            delta.delta,
            delta.reason.description()
        ),
    )
    .with_origin(origin)
    .with_sheet(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabnorm_model::ScorePatch;

    fn catalog_with(detectors: Vec<RowDetector>) -> Catalog {
        let mut catalog = Catalog::new();
        for detector in detectors {
            catalog.register_row_detector(detector).unwrap();
        }
        catalog.finalize();
        catalog
    }

    fn text_header_detector() -> RowDetector {
        RowDetector::new("test::text", HEADER, |ctx| {
            let numeric = ctx.row.iter().any(|c| c.as_number().is_some());
            let filled = ctx.row.iter().filter(|c| !c.is_missing()).count();
            if filled == 0 {
                return Ok(ScorePatch::none());
            }
            Ok(if numeric {
                ScorePatch::target(DATA, 1.0)
            } else {
                ScorePatch::target(HEADER, 1.0).and(DATA, 0.5)
            })
        })
    }

    #[test]
    fn picks_header_and_data_rows() {
        let catalog = catalog_with(vec![text_header_detector()]);
        let sheet = Sheet::from_text(
            "people",
            vec![vec!["Name", "Age"], vec!["Ada", "36"], vec!["Alan", "41"]],
        );
        let mut issues = Vec::new();
        let result = RowClassifier::new(&catalog, 10).classify(
            &sheet,
            &mut RunState::new(),
            &mut issues,
        );
        assert_eq!(result.header_row, Some(0));
        assert_eq!(result.data_rows, vec![1, 2]);
        assert!(issues.is_empty());
    }

    #[test]
    fn text_rows_below_header_are_data() {
        let catalog = catalog_with(vec![text_header_detector()]);
        let sheet = Sheet::from_text(
            "people",
            vec![vec!["First", "Last"], vec!["Ada", "Lovelace"], vec!["Alan", "Turing"]],
        );
        let result = RowClassifier::new(&catalog, 10).classify(
            &sheet,
            &mut RunState::new(),
            &mut Vec::new(),
        );
        assert_eq!(result.header_row, Some(0));
        assert_eq!(result.data_rows, vec![1, 2]);
        assert_eq!(result.row(1).unwrap().label, DATA);
    }

    #[test]
    fn no_positive_header_means_headerless() {
        let catalog = catalog_with(vec![text_header_detector()]);
        let sheet = Sheet::from_text("numbers", vec![vec!["1", "2"], vec!["3", "4"]]);
        let result = RowClassifier::new(&catalog, 10).classify(
            &sheet,
            &mut RunState::new(),
            &mut Vec::new(),
        );
        assert!(result.is_headerless());
        assert_eq!(result.data_rows, vec![0, 1]);
    }

    #[test]
    fn header_outside_scan_window_is_ignored() {
        let catalog = catalog_with(vec![text_header_detector()]);
        let sheet = Sheet::from_text("late", vec![vec!["1"], vec!["2"], vec!["Name"], vec!["3"]]);
        let result = RowClassifier::new(&catalog, 2).classify(
            &sheet,
            &mut RunState::new(),
            &mut Vec::new(),
        );
        assert!(result.is_headerless());
        assert_eq!(result.data_rows, vec![0, 1, 3]);
    }

    #[test]
    fn tied_header_scores_pick_earliest_row() {
        let catalog = catalog_with(vec![text_header_detector()]);
        let sheet = Sheet::from_text(
            "tied",
            vec![vec!["Name", "Age"], vec!["First", "Second"], vec!["1", "2"]],
        );
        let result = RowClassifier::new(&catalog, 10).classify(
            &sheet,
            &mut RunState::new(),
            &mut Vec::new(),
        );
        assert_eq!(result.rows[0].scores[HEADER], result.rows[1].scores[HEADER]);
        assert_eq!(result.header_row, Some(0));
        assert_eq!(result.data_rows, vec![1, 2]);
    }

    #[test]
    fn stronger_header_past_window_loses_to_candidate_inside() {
        let catalog = catalog_with(vec![RowDetector::new("test::width", HEADER, |ctx| {
            let text = ctx
                .row
                .iter()
                .filter(|c| c.as_text().is_some_and(|t| t.parse::<f64>().is_err()))
                .count();
            Ok(ScorePatch::Delta(text as f64))
        })]);
        let sheet = Sheet::from_text(
            "late",
            vec![vec!["Note", ""], vec!["1", "2"], vec!["Name", "Age"]],
        );
        let classify = |scan_rows| {
            RowClassifier::new(&catalog, scan_rows).classify(
                &sheet,
                &mut RunState::new(),
                &mut Vec::new(),
            )
        };
        assert_eq!(classify(2).header_row, Some(0));
        assert_eq!(classify(3).header_row, Some(2));
    }

    #[test]
    fn failing_detector_is_reported_and_skipped() {
        let catalog = catalog_with(vec![
            text_header_detector(),
            RowDetector::new("test::broken", HEADER, |_| anyhow::bail!("boom")),
            RowDetector::new("test::panics", HEADER, |_| panic!("kaboom")),
        ]);
        let sheet = Sheet::from_text("s", vec![vec!["Name"], vec!["1"]]);
        let mut issues = Vec::new();
        let result = RowClassifier::new(&catalog, 10).classify(
            &sheet,
            &mut RunState::new(),
            &mut issues,
        );
        assert_eq!(result.header_row, Some(0));
        let failed: Vec<_> = issues
            .iter()
            .filter(|i| i.code == codes::DETECTOR_FAILED)
            .collect();
        assert_eq!(failed.len(), 4);
    }

    #[test]
    fn unknown_kind_and_nan_are_ignored() {
        let catalog = catalog_with(vec![RowDetector::new("test::odd", HEADER, |_| {
            Ok(ScorePatch::from([("footer", 1.0), (HEADER, f64::NAN)]))
        })]);
        let sheet = Sheet::from_text("s", vec![vec!["x"]]);
        let mut issues = Vec::new();
        let result = RowClassifier::new(&catalog, 10).classify(
            &sheet,
            &mut RunState::new(),
            &mut issues,
        );
        assert!(result.is_headerless());
        assert_eq!(
            issues
                .iter()
                .filter(|i| i.code == codes::SCORE_IGNORED)
                .count(),
            2
        );
    }

    #[test]
    fn disabled_detectors_do_not_run() {
        let catalog = catalog_with(vec![
            RowDetector::new("test::off", HEADER, |_| Ok(ScorePatch::Delta(5.0))).disabled(),
        ]);
        let sheet = Sheet::from_text("s", vec![vec!["x"]]);
        let result = RowClassifier::new(&catalog, 10).classify(
            &sheet,
            &mut RunState::new(),
            &mut Vec::new(),
        );
        assert!(result.is_headerless());
    }
}
