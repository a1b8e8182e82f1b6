//! Output rendering.
//!
//! Column order is fixed:
//!
//! 1. Mapped columns, in table column order, named after their field
//! 2. Derived fields (set only by transforms), in field-name order
//! 3. Unmapped columns, in table column order, when enabled
//!
//! Rendering is a pure function of its inputs.

use std::collections::BTreeSet;

use tabnorm_model::{ColumnSource, EngineSettings, Mapping, OutputColumn, OutputTable, SourceTable};
use tabnorm_transform::FieldValues;

/// Lowercases text and collapses every run of non-alphanumeric characters
/// into a single `_`, trimming `_` from both ends.
pub fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for ch in raw.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    out
}

/// Output name for an unmapped column.
pub fn unmapped_name(prefix: &str, header: Option<&str>, column_index: usize) -> String {
    let sanitized = header.map(sanitize).unwrap_or_default();
    if sanitized.is_empty() {
        format!("{prefix}col_{column_index}")
    } else {
        format!("{prefix}{sanitized}")
    }
}

pub fn render(
    table: &SourceTable,
    mapping: &Mapping,
    column_order: &[usize],
    values: &FieldValues,
    settings: &EngineSettings,
) -> OutputTable {
    let raw_values = |column_index: usize| {
        table
            .column(column_index)
            .map(|column| column.values.clone())
            .unwrap_or_default()
    };

    let mut columns = Vec::new();
    for &column_index in column_order {
        if let Some(field) = mapping.field_for(column_index) {
            columns.push(OutputColumn {
                name: field.to_string(),
                source: ColumnSource::Mapped {
                    field: field.to_string(),
                    column_index,
                },
                values: values
                    .get(field)
                    .map_or_else(|| raw_values(column_index), <[_]>::to_vec),
            });
        }
    }

    for field in values.derived_fields() {
        columns.push(OutputColumn {
            name: field.to_string(),
            source: ColumnSource::Derived {
                field: field.to_string(),
            },
            values: values.get(field).map(<[_]>::to_vec).unwrap_or_default(),
        });
    }

    if settings.append_unmapped_columns {
        for &column_index in column_order {
            if mapping.field_for(column_index).is_some() {
                continue;
            }
            let header = table
                .column(column_index)
                .and_then(|column| column.header.as_deref());
            columns.push(OutputColumn {
                name: unmapped_name(&settings.unmapped_prefix, header, column_index),
                source: ColumnSource::Unmapped { column_index },
                values: raw_values(column_index),
            });
        }
    }

    dedupe_names(&mut columns);
    OutputTable {
        sheet: table.sheet.clone(),
        columns,
        row_count: table.row_count(),
    }
}

/// Suffixes repeated names with `_2`, `_3`, ... in output order.
fn dedupe_names(columns: &mut [OutputColumn]) {
    let mut taken: BTreeSet<String> = BTreeSet::new();
    for column in columns {
        if taken.insert(column.name.clone()) {
            continue;
        }
        let mut suffix = 2;
        let name = loop {
            let candidate = format!("{}_{suffix}", column.name);
            if !taken.contains(&candidate) {
                break candidate;
            }
            suffix += 1;
        };
        taken.insert(name.clone());
        column.name = name;
    }
}
