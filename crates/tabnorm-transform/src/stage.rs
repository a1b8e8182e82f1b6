//! Transform and validation passes over one table.

use std::collections::{BTreeMap, BTreeSet};

use tabnorm_catalog::{
    Catalog, Record, ScopedLogger, Transform, TransformContext, TransformOutput, ValidatorContext,
    guarded,
};
use tabnorm_model::diagnostics::codes;
use tabnorm_model::{Issue, Mapping, RunState, SourceTable, Stage};
use tracing::{debug, warn};

use crate::values::FieldValues;

/// Runs the catalog's transforms, then its validators.
pub struct TransformStage<'a> {
    catalog: &'a Catalog,
}

impl<'a> TransformStage<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self { catalog }
    }

    /// Transforms then validates. Returns the final field values.
    pub fn run(
        &self,
        table: &SourceTable,
        mapping: &Mapping,
        state: &mut RunState,
        issues: &mut Vec<Issue>,
    ) -> FieldValues {
        let values = self.transform(table, mapping, state, issues);
        self.validate(&table.sheet, &values, state, issues);
        values
    }

    /// Applies every enabled transform of every mapped field.
    ///
    /// Fields are visited in field-name order, transforms in catalog order.
    pub fn transform(
        &self,
        table: &SourceTable,
        mapping: &Mapping,
        state: &mut RunState,
        issues: &mut Vec<Issue>,
    ) -> FieldValues {
        let mut values = FieldValues::from_mapping(table, mapping);
        let mut writers: BTreeMap<(String, usize), String> = BTreeMap::new();
        let fields: Vec<String> = values.mapped_fields().map(str::to_string).collect();

        for field_name in &fields {
            let Some(field) = self.catalog.field(field_name) else {
                continue;
            };
            let Some(column_index) = values.column_of(field_name) else {
                continue;
            };
            for transform in self
                .catalog
                .transforms_for(field_name)
                .filter(|t| t.is_enabled())
            {
                let logger = ScopedLogger::new(transform.origin());
                let current = values.get(field_name).unwrap_or_default().to_vec();
                let mut ctx = TransformContext {
                    sheet: &table.sheet,
                    field,
                    column_index,
                    values: &current,
                    state: &mut *state,
                    logger: &logger,
                };
                let outputs = match guarded(|| transform.apply(&mut ctx)) {
                    Ok(outputs) => outputs,
                    Err(err) => {
                        warn!(
                            origin = transform.origin(),
                            field = %field_name,
                            error = %err,
                            "transform failed"
                        );
                        issues.push(
                            Issue::error(
                                Stage::Transform,
                                codes::TRANSFORM_FAILED,
                                format!("transform '{}' failed: {err:#}", transform.origin()),
                            )
                            .with_origin(transform.origin())
                            .with_sheet(&table.sheet)
                            .with_field(field_name)
                            .with_column(column_index),
                        );
                        continue;
                    }
                };
                if outputs.len() != values.row_count() {
                    warn!(
                        origin = transform.origin(),
                        field = %field_name,
                        expected = values.row_count(),
                        actual = outputs.len(),
                        "transform returned wrong row count"
                    );
                    issues.push(
                        Issue::error(
                            Stage::Transform,
                            codes::TRANSFORM_SHAPE,
                            format!(
                                "transform '{}' returned {} rows, expected {}; output discarded",
                                transform.origin(),
                                outputs.len(),
                                values.row_count()
                            ),
                        )
                        .with_origin(transform.origin())
                        .with_sheet(&table.sheet)
                        .with_field(field_name)
                        .with_column(column_index),
                    );
                    continue;
                }
                self.apply_outputs(
                    &table.sheet,
                    transform,
                    outputs,
                    &mut values,
                    &mut writers,
                    issues,
                );
            }
        }
        values
    }

    fn apply_outputs(
        &self,
        sheet: &str,
        transform: &Transform,
        outputs: Vec<TransformOutput>,
        values: &mut FieldValues,
        writers: &mut BTreeMap<(String, usize), String>,
        issues: &mut Vec<Issue>,
    ) {
        let own = transform.field();
        let mut unknown_reported = BTreeSet::new();
        for (row, output) in outputs.into_iter().enumerate() {
            let cells = match output {
                TransformOutput::Value(value) => BTreeMap::from([(own.to_string(), value)]),
                TransformOutput::Fields(map) if map.contains_key(own) => map,
                TransformOutput::Fields(_) => {
                    issues.push(
                        Issue::error(
                            Stage::Transform,
                            codes::TRANSFORM_SHAPE,
                            format!(
                                "transform '{}' row output lacks its own field '{own}'; row kept",
                                transform.origin()
                            ),
                        )
                        .with_origin(transform.origin())
                        .with_sheet(sheet)
                        .with_field(own)
                        .with_row(values.sheet_row(row).unwrap_or(row)),
                    );
                    continue;
                }
            };
            for (target, value) in cells {
                if self.catalog.field(&target).is_none() && !values.contains(&target) {
                    if self.catalog.auto_creates_fields() {
                        debug!(
                            origin = transform.origin(),
                            field = %target,
                            "auto-created field from transform output"
                        );
                        values.create_field(&target);
                    } else {
                        if unknown_reported.insert(target.clone()) {
                            warn!(
                                origin = transform.origin(),
                                field = %target,
                                "transform set unknown sibling field"
                            );
                            issues.push(
                                Issue::warning(
                                    Stage::Transform,
                                    codes::UNKNOWN_FIELD_REFERENCE,
                                    format!(
                                        "transform '{}' set unknown field '{target}'; dropped",
                                        transform.origin()
                                    ),
                                )
                                .with_origin(transform.origin())
                                .with_sheet(sheet)
                                .with_field(&target),
                            );
                        }
                        continue;
                    }
                }
                let key = (target.clone(), row);
                if let Some(previous) = writers.get(&key)
                    && previous != transform.origin()
                {
                    debug!(
                        field = %target,
                        row,
                        previous = %previous,
                        origin = transform.origin(),
                        "transform overwrote cell"
                    );
                }
                values.set(&target, row, value);
                writers.insert(key, transform.origin().to_string());
            }
        }
    }

    /// Runs every enabled validator of every mapped field over a read-only
    /// view of the values.
    pub fn validate(
        &self,
        sheet: &str,
        values: &FieldValues,
        state: &mut RunState,
        issues: &mut Vec<Issue>,
    ) {
        for field_name in values.mapped_fields() {
            let (Some(field), Some(column_index), Some(cells)) = (
                self.catalog.field(field_name),
                values.column_of(field_name),
                values.get(field_name),
            ) else {
                continue;
            };
            for validator in self
                .catalog
                .validators_for(field_name)
                .filter(|v| v.is_enabled())
            {
                let logger = ScopedLogger::new(validator.origin());
                let mut ctx = ValidatorContext {
                    sheet,
                    field,
                    column_index,
                    values: cells,
                    state: &mut *state,
                    logger: &logger,
                };
                let outcome = match guarded(|| validator.validate(&mut ctx)) {
                    Ok(outcome) => outcome,
                    Err(err) => {
                        warn!(
                            origin = validator.origin(),
                            field = field_name,
                            error = %err,
                            "validator failed"
                        );
                        issues.push(
                            Issue::warning(
                                Stage::Validation,
                                codes::VALIDATOR_FAILED,
                                format!("validator '{}' failed: {err:#}", validator.origin()),
                            )
                            .with_origin(validator.origin())
                            .with_sheet(sheet)
                            .with_field(field_name)
                            .with_column(column_index),
                        );
                        continue;
                    }
                };
                for failure in outcome.failures() {
                    let message = failure
                        .message
                        .unwrap_or_else(|| format!("'{}' failed validation", field.display_name()));
                    let mut issue =
                        Issue::error(Stage::Validation, codes::VALIDATION_FAILED, message)
                            .with_origin(validator.origin())
                            .with_sheet(sheet)
                            .with_field(field_name)
                            .with_column(failure.column_index.unwrap_or(column_index));
                    if let Some(row) = failure.row_index {
                        issue = issue.with_row(values.sheet_row(row).unwrap_or(row));
                    }
                    if let Some(value) = failure.value {
                        issue = issue.with_value(value);
                    }
                    issues.push(issue);
                }
            }
        }
    }
}
