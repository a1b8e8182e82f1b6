use serde::{Deserialize, Serialize};

use crate::classification::RowClassification;
use crate::value::CellValue;

/// One raw sheet as handed over by a reader: rows of cells, ragged allowed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Builds a sheet from raw text; blank strings become missing cells.
    pub fn from_text<R, S>(name: impl Into<String>, rows: impl IntoIterator<Item = R>) -> Self
    where
        R: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|cell| CellValue::from_raw(cell.as_ref()))
                    .collect()
            })
            .collect();
        Self::new(name, rows)
    }

    /// Number of columns, taken from the widest row.
    pub fn width(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    pub fn cell(&self, row: usize, column: usize) -> &CellValue {
        static MISSING: CellValue = CellValue::Missing;
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .unwrap_or(&MISSING)
    }
}

/// The input document: an ordered set of sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub name: String,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(name: impl Into<String>, sheets: Vec<Sheet>) -> Self {
        Self {
            name: name.into(),
            sheets,
        }
    }
}

/// One input column of a detected table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceColumn {
    pub index: usize,
    /// Header text, trimmed; `None` when the header cell is blank or the
    /// table has no header row.
    pub header: Option<String>,
    /// Values from the table's data rows, row-aligned.
    pub values: Vec<CellValue>,
}

/// A table region after row classification, viewed column by column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceTable {
    pub sheet: String,
    pub columns: Vec<SourceColumn>,
    /// Sheet row index of every data row, aligned with column values.
    pub row_indices: Vec<usize>,
}

impl SourceTable {
    /// Slices a sheet into columns using the header and data rows chosen by
    /// row classification.
    pub fn from_sheet(sheet: &Sheet, classification: &RowClassification) -> Self {
        let width = sheet.width();
        let columns = (0..width)
            .map(|index| {
                let header = classification
                    .header_row
                    .map(|row| sheet.cell(row, index))
                    .filter(|cell| !cell.is_missing())
                    .map(|cell| cell.to_string().trim().to_string());
                let values = classification
                    .data_rows
                    .iter()
                    .map(|row| sheet.cell(*row, index).clone())
                    .collect();
                SourceColumn {
                    index,
                    header,
                    values,
                }
            })
            .collect();
        Self {
            sheet: sheet.name.clone(),
            columns,
            row_indices: classification.data_rows.clone(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_indices.len()
    }

    pub fn column(&self, index: usize) -> Option<&SourceColumn> {
        self.columns.get(index)
    }

    pub fn headers(&self) -> Vec<Option<&str>> {
        self.columns.iter().map(|c| c.header.as_deref()).collect()
    }
}
