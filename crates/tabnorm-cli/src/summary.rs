use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use tabnorm_model::{Field, Issue, IssueSeverity};

use crate::commands::RunResult;
use crate::report::{SheetReport, sorted_issues};

pub fn print_summary(result: &RunResult) {
    println!("Workbook: {}", result.summary.workbook);
    if result.diagnostics.is_some() {
        println!("Output: {}", result.output_dir.display());
    } else {
        println!("Output: (dry run)");
    }
    println!("{}", sheet_table(&result.summary.sheets, result));
    for sheet in &result.summary.sheets {
        println!();
        println!("Sheet '{}':", sheet.sheet);
        println!("{}", mapping_table(sheet));
    }
    let issues = sorted_issues(&result.outcome.report);
    if !issues.is_empty() {
        println!();
        println!("Issues:");
        println!("{}", issue_table(&issues));
    }
}

pub fn print_fields(fields: &[Field]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Field"),
        header_cell("Label"),
        header_cell("Type"),
        header_cell("Required"),
        header_cell("Synonyms"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 3, CellAlignment::Center);
    for field in fields {
        table.add_row(vec![
            Cell::new(&field.name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            optional_cell(field.label.as_deref()),
            Cell::new(field.field_type.as_str()),
            if field.required {
                Cell::new("✓").fg(Color::Green).add_attribute(Attribute::Bold)
            } else {
                dim_cell("-")
            },
            if field.synonyms.is_empty() {
                dim_cell("-")
            } else {
                Cell::new(field.synonyms.join(", "))
            },
        ]);
    }
    println!("{table}");
}

fn sheet_table(sheets: &[SheetReport], result: &RunResult) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Sheet"),
        header_cell("Header"),
        header_cell("Rows"),
        header_cell("Mapped"),
        header_cell("Unmapped"),
        header_cell("Tied"),
        header_cell("Errors"),
        header_cell("Warnings"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..8 {
        align_column(&mut table, index, CellAlignment::Right);
    }
    let mut total_rows = 0;
    for sheet in sheets {
        total_rows += sheet.data_rows;
        let issues = result
            .outcome
            .report
            .issues
            .iter()
            .filter(|issue| issue.sheet.as_deref() == Some(sheet.sheet.as_str()));
        let (errors, warnings) = count_severities(issues);
        table.add_row(vec![
            Cell::new(&sheet.sheet)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            sheet
                .header_row
                .map_or_else(|| dim_cell("none"), Cell::new),
            Cell::new(sheet.data_rows),
            Cell::new(sheet.mapped),
            count_cell(sheet.unmapped, Color::Yellow),
            count_cell(sheet.tied, Color::Yellow),
            count_cell(errors, Color::Red),
            count_cell(warnings, Color::Yellow),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total_rows).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
        dim_cell("-"),
        count_cell(result.summary.errors, Color::Red).add_attribute(Attribute::Bold),
        count_cell(result.summary.warnings, Color::Yellow).add_attribute(Attribute::Bold),
    ]);
    table
}

fn mapping_table(sheet: &SheetReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Header"),
        header_cell("Field"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Right);
    for column in &sheet.columns {
        let field = match (&column.field, column.tied_with.is_empty()) {
            (Some(field), true) => Cell::new(field).fg(Color::Green),
            (Some(field), false) => Cell::new(format!("{field} (tie)")).fg(Color::Yellow),
            (None, false) => Cell::new("dropped (tie)").fg(Color::Yellow),
            (None, true) => dim_cell("-"),
        };
        table.add_row(vec![
            Cell::new(column.index),
            optional_cell(column.header.as_deref()),
            field,
        ]);
    }
    table
}

fn issue_table(issues: &[&Issue]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Severity"),
        header_cell("Sheet"),
        header_cell("Code"),
        header_cell("Field"),
        header_cell("Row"),
        header_cell("Message"),
    ]);
    apply_issue_table_style(&mut table);
    align_column(&mut table, 0, CellAlignment::Center);
    align_column(&mut table, 4, CellAlignment::Right);
    for issue in issues {
        table.add_row(vec![
            severity_cell(issue.severity),
            optional_cell(issue.sheet.as_deref()),
            Cell::new(&issue.code),
            optional_cell(issue.field.as_deref()),
            issue.row.map_or_else(|| dim_cell("-"), Cell::new),
            Cell::new(&issue.message),
        ]);
    }
    table
}

fn count_severities<'a>(issues: impl Iterator<Item = &'a Issue>) -> (usize, usize) {
    issues.fold((0, 0), |(errors, warnings), issue| match issue.severity {
        IssueSeverity::Error => (errors + 1, warnings),
        IssueSeverity::Warning => (errors, warnings + 1),
        IssueSeverity::Info => (errors, warnings),
    })
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_issue_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(160);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn severity_cell(severity: IssueSeverity) -> Cell {
    match severity {
        IssueSeverity::Error => Cell::new("ERROR")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        IssueSeverity::Warning => Cell::new("WARN").fg(Color::Yellow),
        IssueSeverity::Info => Cell::new("INFO").fg(Color::Cyan),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn optional_cell(value: Option<&str>) -> Cell {
    value.map_or_else(|| dim_cell("-"), Cell::new)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
