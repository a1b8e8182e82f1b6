use std::collections::{BTreeMap, BTreeSet};

use tabnorm_model::{CellValue, Field, Mapping, SourceTable};

/// Row-aligned values per field for one table.
///
/// Seeded from the mapped input columns; transforms may add derived fields
/// that have no input column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    row_count: usize,
    row_indices: Vec<usize>,
    columns: BTreeMap<String, usize>,
    values: BTreeMap<String, Vec<CellValue>>,
    derived: BTreeSet<String>,
    created: BTreeMap<String, Field>,
}

impl FieldValues {
    pub fn from_mapping(table: &SourceTable, mapping: &Mapping) -> Self {
        let mut columns = BTreeMap::new();
        let mut values = BTreeMap::new();
        for entry in mapping.mapped() {
            let (Some(field), Some(column)) = (&entry.field, table.column(entry.column_index))
            else {
                continue;
            };
            columns.insert(field.clone(), entry.column_index);
            values.insert(field.clone(), column.values.clone());
        }
        Self {
            row_count: table.row_count(),
            row_indices: table.row_indices.clone(),
            columns,
            values,
            derived: BTreeSet::new(),
            created: BTreeMap::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Sheet row index of a data row.
    pub fn sheet_row(&self, row: usize) -> Option<usize> {
        self.row_indices.get(row).copied()
    }

    pub fn get(&self, field: &str) -> Option<&[CellValue]> {
        self.values.get(field).map(Vec::as_slice)
    }

    /// Input column a mapped field came from.
    pub fn column_of(&self, field: &str) -> Option<usize> {
        self.columns.get(field).copied()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    pub fn is_derived(&self, field: &str) -> bool {
        self.derived.contains(field)
    }

    /// Mapped fields in field-name order.
    pub fn mapped_fields(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Fields populated only by transforms, in field-name order.
    pub fn derived_fields(&self) -> impl Iterator<Item = &str> {
        self.derived.iter().map(String::as_str)
    }

    /// Fields a transform output created because the catalog did not know
    /// them, in field-name order.
    pub fn created_fields(&self) -> impl Iterator<Item = &Field> {
        self.created.values()
    }

    pub(crate) fn create_field(&mut self, name: &str) {
        self.created
            .entry(name.to_string())
            .or_insert_with(|| Field::new(name));
        if !self.values.contains_key(name) {
            self.values
                .insert(name.to_string(), vec![CellValue::Missing; self.row_count]);
            self.derived.insert(name.to_string());
        }
    }

    /// Sets one cell, creating a derived field on first write. Returns the
    /// previous value.
    pub(crate) fn set(&mut self, field: &str, row: usize, value: CellValue) -> Option<CellValue> {
        if !self.values.contains_key(field) {
            self.values
                .insert(field.to_string(), vec![CellValue::Missing; self.row_count]);
            if !self.columns.contains_key(field) {
                self.derived.insert(field.to_string());
            }
        }
        let cells = self.values.get_mut(field)?;
        let cell = cells.get_mut(row)?;
        Some(std::mem::replace(cell, value))
    }
}
