//! CSV input and output.
//!
//! Every input file becomes one sheet named after the file stem. Cells are
//! read verbatim except for a leading byte-order mark; blank cells become
//! missing values.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use tabnorm_core::render::sanitize;
use tabnorm_model::{CellValue, OutputTable, Sheet, Workbook};
use tracing::{debug, info};

pub fn read_sheet(path: &Path, name: impl Into<String>) -> Result<Sheet> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("read csv: {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("read record: {}", path.display()))?;
        rows.push(
            record
                .iter()
                .map(|cell| CellValue::from_raw(cell.trim_start_matches('\u{feff}')))
                .collect(),
        );
    }
    let sheet = Sheet::new(name, rows);
    debug!(path = %path.display(), rows = sheet.rows.len(), "read sheet");
    Ok(sheet)
}

/// Reads each file as one sheet. Repeated stems get `_2`, `_3`, ... suffixes.
pub fn read_workbook(name: impl Into<String>, paths: &[PathBuf]) -> Result<Workbook> {
    let mut taken = BTreeSet::new();
    let mut sheets = Vec::with_capacity(paths.len());
    for path in paths {
        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sheet".to_string());
        let mut sheet_name = stem.clone();
        let mut suffix = 2;
        while !taken.insert(sheet_name.clone()) {
            sheet_name = format!("{stem}_{suffix}");
            suffix += 1;
        }
        sheets.push(read_sheet(path, sheet_name)?);
    }
    Ok(Workbook::new(name, sheets))
}

/// Output file name for a sheet.
pub fn output_file_name(sheet: &str) -> String {
    let name = sanitize(sheet);
    if name.is_empty() {
        "sheet.csv".to_string()
    } else {
        format!("{name}.csv")
    }
}

pub fn write_table(table: &OutputTable, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("create output dir: {}", output_dir.display()))?;
    let path = output_dir.join(output_file_name(&table.sheet));
    let mut writer = WriterBuilder::new()
        .from_path(&path)
        .with_context(|| format!("create csv: {}", path.display()))?;
    writer
        .write_record(table.column_names())
        .with_context(|| format!("write header: {}", path.display()))?;
    for row in table.rows() {
        writer
            .write_record(row.iter().map(ToString::to_string))
            .with_context(|| format!("write record: {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush csv: {}", path.display()))?;
    info!(path = %path.display(), rows = table.row_count, "wrote table");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabnorm_model::{ColumnSource, OutputColumn};

    #[test]
    fn reads_ragged_rows_and_blank_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        fs::write(&path, "\u{feff}Name,Email\nAda,\nAlan,alan@example.com,extra\n").unwrap();

        let sheet = read_sheet(&path, "people").unwrap();
        assert_eq!(sheet.rows.len(), 3);
        assert_eq!(sheet.rows[0][0], CellValue::from("Name"));
        assert_eq!(sheet.rows[1][1], CellValue::Missing);
        assert_eq!(sheet.rows[2].len(), 3);
    }

    #[test]
    fn repeated_stems_get_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a").join("data.csv");
        let second = dir.path().join("b").join("data.csv");
        for path in [&first, &second] {
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "x\n1\n").unwrap();
        }
        let workbook = read_workbook("wb", &[first, second]).unwrap();
        let names: Vec<_> = workbook.sheets.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["data", "data_2"]);
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let table = OutputTable {
            sheet: "Staff List".to_string(),
            columns: vec![
                OutputColumn {
                    name: "email".to_string(),
                    source: ColumnSource::Mapped {
                        field: "email".to_string(),
                        column_index: 0,
                    },
                    values: vec![CellValue::from("ada@example.com"), CellValue::Missing],
                },
                OutputColumn {
                    name: "age".to_string(),
                    source: ColumnSource::Derived {
                        field: "age".to_string(),
                    },
                    values: vec![CellValue::Number(36.0), CellValue::Number(41.5)],
                },
            ],
            row_count: 2,
        };
        let path = write_table(&table, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "staff_list.csv");
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "email,age\nada@example.com,36\n,41.5\n"
        );
    }

    #[test]
    fn missing_file_names_path() {
        let err = read_sheet(Path::new("/nonexistent/input.csv"), "x").unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/input.csv"));
    }
}
