//! `diagnostics.json` and the run summary it embeds.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tabnorm_core::{RunOutcome, SheetOutcome};
use tabnorm_model::{DiagnosticsReport, Issue};

pub const DIAGNOSTICS_FILE: &str = "diagnostics.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnReport {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tied_with: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SheetReport {
    pub sheet: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_row: Option<usize>,
    pub data_rows: usize,
    pub mapped: usize,
    pub unmapped: usize,
    pub tied: usize,
    pub output_columns: Vec<String>,
    pub columns: Vec<ColumnReport>,
}

/// What a run did, per sheet, plus issue counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub workbook: String,
    pub sheets: Vec<SheetReport>,
    pub errors: usize,
    pub warnings: usize,
}

impl RunSummary {
    pub fn from_outcome(outcome: &RunOutcome) -> Self {
        let sheets = outcome
            .sheets
            .iter()
            .map(|sheet| {
                let output_columns = outcome
                    .workbook
                    .table(&sheet.sheet)
                    .map(|table| table.column_names().into_iter().map(str::to_string).collect())
                    .unwrap_or_default();
                sheet_report(sheet, output_columns)
            })
            .collect();
        Self {
            workbook: outcome.workbook.name.clone(),
            sheets,
            errors: outcome.report.error_count(),
            warnings: outcome.report.warning_count(),
        }
    }
}

fn sheet_report(sheet: &SheetOutcome, output_columns: Vec<String>) -> SheetReport {
    SheetReport {
        sheet: sheet.sheet.clone(),
        header_row: sheet.classification.header_row,
        data_rows: sheet.classification.data_rows.len(),
        mapped: sheet.summary.mapped,
        unmapped: sheet.summary.unmapped,
        tied: sheet.summary.tied,
        output_columns,
        columns: sheet
            .summary
            .columns
            .iter()
            .map(|column| ColumnReport {
                index: column.column_index,
                header: column.header.clone(),
                field: column.field.clone(),
                tied_with: column.tied_with.clone(),
            })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
struct DiagnosticsFile<'a> {
    generated_at: DateTime<Utc>,
    package: &'a str,
    summary: &'a RunSummary,
    mappings: &'a [SheetOutcome],
    issues: &'a [Issue],
}

/// Writes `diagnostics.json` into `output_dir`.
pub fn write_diagnostics(
    output_dir: &Path,
    package: &str,
    summary: &RunSummary,
    outcome: &RunOutcome,
) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output dir: {}", output_dir.display()))?;
    let path = output_dir.join(DIAGNOSTICS_FILE);
    let file = DiagnosticsFile {
        generated_at: Utc::now(),
        package,
        summary,
        mappings: &outcome.sheets,
        issues: &outcome.report.issues,
    };
    let json = serde_json::to_string_pretty(&file).context("serialize diagnostics")?;
    fs::write(&path, json).with_context(|| format!("write {}", path.display()))?;
    Ok(path)
}

/// Issues sorted for display: errors first, then by sheet, row and code.
pub fn sorted_issues(report: &DiagnosticsReport) -> Vec<&Issue> {
    let mut issues: Vec<&Issue> = report.issues.iter().collect();
    issues.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.sheet.cmp(&b.sheet))
            .then_with(|| a.row.cmp(&b.row))
            .then_with(|| a.code.cmp(&b.code))
    });
    issues
}
