//! Column-to-field mapping produced by the column mapper.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Policy for columns tying on the top score for the same field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieResolution {
    /// Lowest column index wins, the others stay unmapped.
    #[default]
    Leftmost,
    /// Every tied column stays unmapped.
    DropAll,
}

impl TieResolution {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Leftmost => "leftmost",
            Self::DropAll => "drop_all",
        }
    }
}

impl fmt::Display for TieResolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TieResolution {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "leftmost" => Ok(Self::Leftmost),
            "drop_all" => Ok(Self::DropAll),
            _ => Err(ModelError::InvalidSetting {
                name: "mapping_tie_resolution".to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Mapping decision and score trail for one input column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub column_index: usize,
    pub header: Option<String>,
    /// Assigned field, `None` when unmapped.
    pub field: Option<String>,
    /// Best score this column reached for any field.
    pub score: f64,
    /// Other columns that tied with this one for its best field.
    #[serde(default)]
    pub tied_with: Vec<usize>,
    /// Final score per field.
    #[serde(default)]
    pub scores: BTreeMap<String, f64>,
}

impl ColumnMapping {
    pub fn is_mapped(&self) -> bool {
        self.field.is_some()
    }
}

/// The resolved input-column -> field assignment for one table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mapping {
    pub columns: Vec<ColumnMapping>,
}

impl Mapping {
    pub fn field_for(&self, column: usize) -> Option<&str> {
        self.columns.get(column).and_then(|c| c.field.as_deref())
    }

    pub fn column_for(&self, field: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|c| c.field.as_deref() == Some(field))
            .map(|c| c.column_index)
    }

    pub fn mapped(&self) -> impl Iterator<Item = &ColumnMapping> {
        self.columns.iter().filter(|c| c.is_mapped())
    }

    pub fn unmapped(&self) -> impl Iterator<Item = &ColumnMapping> {
        self.columns.iter().filter(|c| !c.is_mapped())
    }

    /// Mapped field names, in column order.
    pub fn mapped_fields(&self) -> Vec<&str> {
        self.mapped().filter_map(|c| c.field.as_deref()).collect()
    }

    /// Assigns `field` to `column`, releasing any other column holding it so
    /// the mapping stays one-to-one.
    pub fn assign(&mut self, column: usize, field: impl Into<String>) -> Result<()> {
        let len = self.columns.len();
        if column >= len {
            return Err(ModelError::ColumnOutOfRange { index: column, len });
        }
        let field = field.into();
        if field.trim().is_empty() {
            return Err(ModelError::EmptyFieldName);
        }
        for entry in &mut self.columns {
            if entry.field.as_deref() == Some(field.as_str()) {
                entry.field = None;
            }
        }
        self.columns[column].field = Some(field);
        Ok(())
    }

    /// Clears the assignment of `column`.
    pub fn unassign(&mut self, column: usize) -> Result<Option<String>> {
        let len = self.columns.len();
        self.columns
            .get_mut(column)
            .map(|entry| entry.field.take())
            .ok_or(ModelError::ColumnOutOfRange { index: column, len })
    }
}
