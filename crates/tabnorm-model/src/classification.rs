use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Row kind for header rows.
pub const HEADER: &str = "header";
/// Row kind for data rows.
pub const DATA: &str = "data";

/// Final scores and label for one sheet row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowScore {
    pub index: usize,
    pub label: String,
    pub scores: BTreeMap<String, f64>,
}

impl RowScore {
    pub fn score(&self, kind: &str) -> f64 {
        self.scores.get(kind).copied().unwrap_or(0.0)
    }
}

/// Outcome of row classification for one sheet.
///
/// `header_row` and `data_rows` are what the column mapper consumes; hooks
/// running at table detection may rewrite them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowClassification {
    pub header_row: Option<usize>,
    pub data_rows: Vec<usize>,
    pub rows: Vec<RowScore>,
}

impl RowClassification {
    pub fn row(&self, index: usize) -> Option<&RowScore> {
        self.rows.iter().find(|row| row.index == index)
    }

    pub fn is_headerless(&self) -> bool {
        self.header_row.is_none()
    }
}
