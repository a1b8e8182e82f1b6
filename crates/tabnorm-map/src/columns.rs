//! Column scoring and mapping.

use tabnorm_catalog::{
    Catalog, ColumnDetector, ColumnDetectorContext, Record, ScopedLogger, guarded,
};
use tabnorm_model::diagnostics::codes;
use tabnorm_model::{
    CellValue, EngineSettings, Issue, Mapping, RunState, ScoreTable, SourceColumn, SourceTable,
    Stage, TieResolution,
};
use tracing::{debug, info, warn};

use crate::resolve::{ColumnScores, Conflict, resolve};
use crate::rows::ignored_delta;

/// Scores every input column against every known field and resolves the
/// scores into a mapping.
pub struct ColumnMapper<'a> {
    catalog: &'a Catalog,
    sample_size: usize,
    tie_resolution: TieResolution,
}

impl<'a> ColumnMapper<'a> {
    pub fn new(catalog: &'a Catalog, settings: &EngineSettings) -> Self {
        Self {
            catalog,
            sample_size: settings.sample_size,
            tie_resolution: settings.mapping_tie_resolution,
        }
    }

    pub fn with_tie_resolution(mut self, tie_resolution: TieResolution) -> Self {
        self.tie_resolution = tie_resolution;
        self
    }

    /// Runs every enabled column detector over every column.
    pub fn score(
        &self,
        table: &SourceTable,
        state: &mut RunState,
        issues: &mut Vec<Issue>,
    ) -> Vec<ColumnScores> {
        let detectors: Vec<(&ColumnDetector, ScopedLogger)> = self
            .catalog
            .column_detectors()
            .iter()
            .filter(|d| d.is_enabled())
            .map(|d| (d, ScopedLogger::new(d.origin())))
            .collect();

        table
            .columns
            .iter()
            .map(|column| ColumnScores {
                column_index: column.index,
                header: column.header.clone(),
                scores: self.score_column(&table.sheet, column, &detectors, state, issues),
            })
            .collect()
    }

    fn score_column(
        &self,
        sheet: &str,
        column: &SourceColumn,
        detectors: &[(&ColumnDetector, ScopedLogger)],
        state: &mut RunState,
        issues: &mut Vec<Issue>,
    ) -> ScoreTable {
        let fields = self.catalog.fields();
        let mut scores = ScoreTable::new(fields.keys().cloned());
        let sample = sample_values(&column.values, self.sample_size);

        for (detector, logger) in detectors {
            let mut ctx = ColumnDetectorContext {
                sheet,
                column_index: column.index,
                header: column.header.as_deref(),
                values: &column.values,
                sample: &sample,
                fields,
                field: detector.field().and_then(|name| fields.get(name)),
                state: &mut *state,
                logger,
            };
            match guarded(|| detector.detect(&mut ctx)) {
                Ok(patch) => {
                    for delta in scores.apply(patch, detector.field()) {
                        let issue =
                            ignored_delta(Stage::ColumnMapping, detector.origin(), sheet, &delta);
                        issues.push(issue.with_column(column.index));
                    }
                }
                Err(err) => {
                    warn!(
                        origin = detector.origin(),
                        sheet,
                        column = column.index,
                        error = %err,
                        "column detector failed"
                    );
                    issues.push(
                        Issue::warning(
                            Stage::ColumnMapping,
                            codes::DETECTOR_FAILED,
                            format!("column detector '{}' failed: {err:#}", detector.origin()),
                        )
                        .with_origin(detector.origin())
                        .with_sheet(sheet)
                        .with_column(column.index),
                    );
                }
            }
        }
        scores
    }

    /// Scores the table and resolves a mapping, reporting tie conflicts and
    /// required fields left unmapped.
    pub fn map(
        &self,
        table: &SourceTable,
        state: &mut RunState,
        issues: &mut Vec<Issue>,
    ) -> Mapping {
        let scores = self.score(table, state, issues);
        let resolution = resolve(&scores, self.tie_resolution);

        for conflict in &resolution.conflicts {
            issues.push(conflict_issue(&table.sheet, conflict, self.tie_resolution));
        }
        for field in self.catalog.fields().values().filter(|f| f.required) {
            if resolution.mapping.column_for(&field.name).is_none() {
                warn!(sheet = %table.sheet, field = %field.name, "required field unmapped");
                issues.push(
                    Issue::error(
                        Stage::ColumnMapping,
                        codes::REQUIRED_FIELD_UNMAPPED,
                        format!("required field '{}' is not mapped", field.display_name()),
                    )
                    .with_sheet(&table.sheet)
                    .with_field(&field.name),
                );
            }
        }

        let mapping = resolution.mapping;
        info!(
            sheet = %table.sheet,
            columns = mapping.columns.len(),
            mapped = mapping.mapped().count(),
            conflicts = resolution.conflicts.len(),
            "columns mapped"
        );
        for column in &mapping.columns {
            debug!(
                column = column.column_index,
                header = ?column.header,
                field = ?column.field,
                score = column.score,
                "column decision"
            );
        }
        mapping
    }
}

/// Leading non-missing values, at most `size` of them.
pub fn sample_values(values: &[CellValue], size: usize) -> Vec<CellValue> {
    values
        .iter()
        .filter(|value| !value.is_missing())
        .take(size)
        .cloned()
        .collect()
}

fn conflict_issue(sheet: &str, conflict: &Conflict, policy: TieResolution) -> Issue {
    let columns = conflict
        .columns
        .iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let outcome = match conflict.winner {
        Some(column) => format!("kept column {column}"),
        None => "left all unmapped".to_string(),
    };
    warn!(
        sheet,
        field = %conflict.field,
        columns = %columns,
        policy = %policy,
        "mapping conflict"
    );
    Issue::warning(
        Stage::ColumnMapping,
        codes::MAPPING_CONFLICT,
        format!(
            "columns {columns} tie for '{}' at {}; {policy} {outcome}",
            conflict.field, conflict.score
        ),
    )
    .with_sheet(sheet)
    .with_field(&conflict.field)
}
