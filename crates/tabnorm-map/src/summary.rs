//! Per-sheet mapping summary for reports.

use serde::Serialize;
use tabnorm_model::Mapping;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column_index: usize,
    pub header: Option<String>,
    pub field: Option<String>,
    pub score: f64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tied_with: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MappingSummary {
    pub sheet: String,
    pub mapped: usize,
    pub unmapped: usize,
    /// Columns involved in at least one tie.
    pub tied: usize,
    pub columns: Vec<ColumnSummary>,
}

impl MappingSummary {
    pub fn from_mapping(sheet: impl Into<String>, mapping: &Mapping) -> Self {
        let columns: Vec<ColumnSummary> = mapping
            .columns
            .iter()
            .map(|column| ColumnSummary {
                column_index: column.column_index,
                header: column.header.clone(),
                field: column.field.clone(),
                score: column.score,
                tied_with: column.tied_with.clone(),
            })
            .collect();
        let mapped = columns.iter().filter(|c| c.field.is_some()).count();
        Self {
            sheet: sheet.into(),
            mapped,
            unmapped: columns.len() - mapped,
            tied: columns.iter().filter(|c| !c.tied_with.is_empty()).count(),
            columns,
        }
    }

    /// Share of columns that received a field.
    pub fn coverage(&self) -> f64 {
        if self.columns.is_empty() {
            0.0
        } else {
            self.mapped as f64 / self.columns.len() as f64
        }
    }
}
