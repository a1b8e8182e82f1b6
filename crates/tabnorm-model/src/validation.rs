use serde::{Deserialize, Serialize};

use crate::value::CellValue;

/// Outcome of one validator check.
///
/// Only `passed = false` results are reported. Validators never change data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
}

impl ValidationResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            ..Self::default()
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_row(mut self, row_index: usize) -> Self {
        self.row_index = Some(row_index);
        self
    }

    #[must_use]
    pub fn with_column(mut self, column_index: usize) -> Self {
        self.column_index = Some(column_index);
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: CellValue) -> Self {
        self.value = Some(value);
        self
    }
}

/// What a validator returns: a single result or a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ValidationOutcome {
    One(ValidationResult),
    Many(Vec<ValidationResult>),
}

impl ValidationOutcome {
    pub fn into_results(self) -> Vec<ValidationResult> {
        match self {
            Self::One(result) => vec![result],
            Self::Many(results) => results,
        }
    }

    pub fn failures(self) -> impl Iterator<Item = ValidationResult> {
        self.into_results().into_iter().filter(|r| !r.passed)
    }
}

impl From<ValidationResult> for ValidationOutcome {
    fn from(result: ValidationResult) -> Self {
        Self::One(result)
    }
}

impl From<Vec<ValidationResult>> for ValidationOutcome {
    fn from(results: Vec<ValidationResult>) -> Self {
        Self::Many(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_failures_are_kept() {
        let outcome = ValidationOutcome::from(vec![
            ValidationResult::pass(),
            ValidationResult::fail("bad").with_row(3),
        ]);
        let failures: Vec<_> = outcome.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].row_index, Some(3));
    }
}
