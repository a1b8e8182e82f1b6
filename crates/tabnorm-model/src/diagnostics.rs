use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::CellValue;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Error,
    Warning,
    Info,
}

/// Pipeline stage an issue was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Discovery,
    RowClassification,
    ColumnMapping,
    Transform,
    Validation,
    Hook,
    Render,
}

impl Stage {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::RowClassification => "row_classification",
            Self::ColumnMapping => "column_mapping",
            Self::Transform => "transform",
            Self::Validation => "validation",
            Self::Hook => "hook",
            Self::Render => "render",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable issue codes.
pub mod codes {
    pub const UNKNOWN_FIELD_REFERENCE: &str = "unknown_field_reference";
    pub const DETECTOR_FAILED: &str = "detector_failed";
    pub const SCORE_IGNORED: &str = "score_ignored";
    pub const MAPPING_CONFLICT: &str = "mapping_conflict";
    pub const REQUIRED_FIELD_UNMAPPED: &str = "required_field_unmapped";
    pub const TRANSFORM_FAILED: &str = "transform_failed";
    pub const TRANSFORM_SHAPE: &str = "transform_shape";
    pub const VALIDATOR_FAILED: &str = "validator_failed";
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const HOOK_FAILED: &str = "hook_failed";
}

/// A non-fatal finding recorded during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub stage: Stage,
    pub severity: IssueSeverity,
    pub code: String,
    pub message: String,
    /// Origin of the callable or record that caused the issue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
}

impl Issue {
    pub fn new(
        stage: Stage,
        severity: IssueSeverity,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            severity,
            code: code.into(),
            message: message.into(),
            origin: None,
            sheet: None,
            field: None,
            row: None,
            column: None,
            value: None,
        }
    }

    pub fn error(stage: Stage, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(stage, IssueSeverity::Error, code, message)
    }

    pub fn warning(stage: Stage, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(stage, IssueSeverity::Warning, code, message)
    }

    pub fn info(stage: Stage, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(stage, IssueSeverity::Info, code, message)
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    #[must_use]
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    #[must_use]
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    #[must_use]
    pub fn with_column(mut self, column: usize) -> Self {
        self.column = Some(column);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: CellValue) -> Self {
        self.value = Some(value);
        self
    }
}

/// Every issue raised during one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub issues: Vec<Issue>,
}

impl DiagnosticsReport {
    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn error_count(&self) -> usize {
        self.count(IssueSeverity::Error)
    }

    pub fn warning_count(&self) -> usize {
        self.count(IssueSeverity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn by_stage(&self, stage: Stage) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.stage == stage)
    }

    pub fn with_code<'a>(&'a self, code: &'a str) -> impl Iterator<Item = &'a Issue> {
        self.issues.iter().filter(move |issue| issue.code == code)
    }

    fn count(&self, severity: IssueSeverity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }
}

impl Extend<Issue> for DiagnosticsReport {
    fn extend<T: IntoIterator<Item = Issue>>(&mut self, iter: T) {
        self.issues.extend(iter);
    }
}
