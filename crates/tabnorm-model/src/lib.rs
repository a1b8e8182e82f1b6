//! Core data model for the tabnorm detection-and-mapping engine.
//!
//! Every crate in the workspace speaks in terms of these types: raw input
//! workbooks, fields, score patches, mappings, validation results, rendered
//! output tables and the diagnostics report.

#![deny(unsafe_code)]

pub mod classification;
pub mod diagnostics;
pub mod error;
pub mod field;
pub mod mapping;
pub mod output;
pub mod score;
pub mod settings;
pub mod state;
pub mod table;
pub mod validation;
pub mod value;

pub use classification::{DATA, HEADER, RowClassification, RowScore};
pub use diagnostics::{DiagnosticsReport, Issue, IssueSeverity, Stage};
pub use error::{ModelError, Result};
pub use field::{Field, FieldType};
pub use mapping::{ColumnMapping, Mapping, TieResolution};
pub use output::{ColumnSource, OutputColumn, OutputTable, OutputWorkbook};
pub use score::{RejectReason, RejectedDelta, ScorePatch, ScoreTable};
pub use settings::{EngineSettings, HookFailurePolicy};
pub use state::RunState;
pub use table::{Sheet, SourceColumn, SourceTable, Workbook};
pub use validation::{ValidationOutcome, ValidationResult};
pub use value::CellValue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_report_counts() {
        let mut report = DiagnosticsReport::default();
        report.push(
            Issue::error(Stage::Validation, "validation_failed", "Bad email")
                .with_field("email")
                .with_row(2),
        );
        report.push(Issue::warning(
            Stage::ColumnMapping,
            "mapping_conflict",
            "Columns 0 and 1 tie for email",
        ));
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert!(report.has_errors());
    }

    #[test]
    fn report_serializes() {
        let mut report = DiagnosticsReport::default();
        report.push(Issue::info(Stage::Render, "note", "ok"));
        let json = serde_json::to_string(&report).expect("serialize report");
        let round: DiagnosticsReport = serde_json::from_str(&json).expect("deserialize report");
        assert_eq!(round.issues.len(), 1);
        assert_eq!(round.issues[0].stage, Stage::Render);
    }
}
