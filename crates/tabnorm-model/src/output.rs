use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// Where an output column came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnSource {
    /// An input column mapped to a field.
    Mapped { field: String, column_index: usize },
    /// A field populated only by transforms.
    Derived { field: String },
    /// An input column that was not mapped.
    Unmapped { column_index: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputColumn {
    pub name: String,
    pub source: ColumnSource,
    pub values: Vec<CellValue>,
}

/// A rendered table, ready for a writer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputTable {
    pub sheet: String,
    pub columns: Vec<OutputColumn>,
    pub row_count: usize,
}

impl OutputTable {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&OutputColumn> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut OutputColumn> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Cells of one output row, in column order.
    pub fn row(&self, index: usize) -> Vec<&CellValue> {
        static MISSING: CellValue = CellValue::Missing;
        self.columns
            .iter()
            .map(|c| c.values.get(index).unwrap_or(&MISSING))
            .collect()
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&CellValue>> {
        (0..self.row_count).map(|index| self.row(index))
    }
}

/// Every rendered table of one run, in sheet order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OutputWorkbook {
    pub name: String,
    pub tables: Vec<OutputTable>,
}

impl OutputWorkbook {
    pub fn table(&self, sheet: &str) -> Option<&OutputTable> {
        self.tables.iter().find(|t| t.sheet == sheet)
    }
}
