//! Per-callable contexts.
//!
//! Each capability kind receives its own context type exposing only what is
//! valid at that point of the pipeline. Every context carries the run state
//! and a logger scoped to the callable's origin.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tabnorm_model::{
    CellValue, Field, Mapping, OutputTable, OutputWorkbook, RowClassification, RunState, Sheet,
    SourceTable, Workbook,
};

use crate::logger::ScopedLogger;

/// Context for a row detector call: one row of one sheet.
pub struct RowDetectorContext<'a> {
    pub sheet: &'a str,
    pub row_index: usize,
    pub row: &'a [CellValue],
    /// Every row of the sheet, for detectors that look at neighbours.
    pub rows: &'a [Vec<CellValue>],
    pub state: &'a mut RunState,
    pub logger: &'a ScopedLogger,
}

/// Context for a column detector call: one column of a detected table.
pub struct ColumnDetectorContext<'a> {
    pub sheet: &'a str,
    pub column_index: usize,
    pub header: Option<&'a str>,
    /// Every data value of the column.
    pub values: &'a [CellValue],
    /// Leading non-missing values, bounded by the sample size setting.
    pub sample: &'a [CellValue],
    pub fields: &'a BTreeMap<String, Field>,
    /// Field the detector is bound to, if any.
    pub field: Option<&'a Field>,
    pub state: &'a mut RunState,
    pub logger: &'a ScopedLogger,
}

/// Context for a transform call over one mapped field.
pub struct TransformContext<'a> {
    pub sheet: &'a str,
    pub field: &'a Field,
    pub column_index: usize,
    /// Current values, row-aligned.
    pub values: &'a [CellValue],
    pub state: &'a mut RunState,
    pub logger: &'a ScopedLogger,
}

/// Context for a validator call over one mapped field.
///
/// Values are exposed read-only.
pub struct ValidatorContext<'a> {
    pub sheet: &'a str,
    pub field: &'a Field,
    pub column_index: usize,
    pub values: &'a [CellValue],
    pub state: &'a mut RunState,
    pub logger: &'a ScopedLogger,
}

/// Per-row transform output.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformOutput {
    /// Sets the current field's value.
    Value(CellValue),
    /// Sets the current field (its key is required) plus sibling fields.
    Fields(BTreeMap<String, CellValue>),
}

impl TransformOutput {
    pub fn value(value: impl Into<CellValue>) -> Self {
        Self::Value(value.into())
    }

    pub fn fields<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CellValue>,
    {
        Self::Fields(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<CellValue> for TransformOutput {
    fn from(value: CellValue) -> Self {
        Self::Value(value)
    }
}

/// The six lifecycle points hooks can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookPoint {
    OnWorkbookStart,
    OnSheetStart,
    OnTableDetected,
    OnTableMapped,
    OnTableWritten,
    OnWorkbookBeforeSave,
}

impl HookPoint {
    pub const ALL: [HookPoint; 6] = [
        Self::OnWorkbookStart,
        Self::OnSheetStart,
        Self::OnTableDetected,
        Self::OnTableMapped,
        Self::OnTableWritten,
        Self::OnWorkbookBeforeSave,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnWorkbookStart => "on_workbook_start",
            Self::OnSheetStart => "on_sheet_start",
            Self::OnTableDetected => "on_table_detected",
            Self::OnTableMapped => "on_table_mapped",
            Self::OnTableWritten => "on_table_written",
            Self::OnWorkbookBeforeSave => "on_workbook_before_save",
        }
    }
}

impl fmt::Display for HookPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Objects a hook may mutate, one variant per lifecycle point.
pub enum HookStage<'a> {
    WorkbookStart {
        workbook: &'a mut Workbook,
    },
    SheetStart {
        sheet: &'a mut Sheet,
    },
    TableDetected {
        sheet: &'a Sheet,
        classification: &'a mut RowClassification,
    },
    TableMapped {
        table: &'a mut SourceTable,
        mapping: &'a mut Mapping,
        /// Input column indices in output order.
        column_order: &'a mut Vec<usize>,
    },
    TableWritten {
        table: &'a mut OutputTable,
    },
    WorkbookBeforeSave {
        workbook: &'a mut OutputWorkbook,
    },
}

impl HookStage<'_> {
    pub fn point(&self) -> HookPoint {
        match self {
            Self::WorkbookStart { .. } => HookPoint::OnWorkbookStart,
            Self::SheetStart { .. } => HookPoint::OnSheetStart,
            Self::TableDetected { .. } => HookPoint::OnTableDetected,
            Self::TableMapped { .. } => HookPoint::OnTableMapped,
            Self::TableWritten { .. } => HookPoint::OnTableWritten,
            Self::WorkbookBeforeSave { .. } => HookPoint::OnWorkbookBeforeSave,
        }
    }

    /// Shorter-lived copy of the stage so it can be lent to one hook at a time.
    pub fn reborrow(&mut self) -> HookStage<'_> {
        match self {
            Self::WorkbookStart { workbook } => HookStage::WorkbookStart {
                workbook: &mut **workbook,
            },
            Self::SheetStart { sheet } => HookStage::SheetStart {
                sheet: &mut **sheet,
            },
            Self::TableDetected {
                sheet,
                classification,
            } => HookStage::TableDetected {
                sheet: &**sheet,
                classification: &mut **classification,
            },
            Self::TableMapped {
                table,
                mapping,
                column_order,
            } => HookStage::TableMapped {
                table: &mut **table,
                mapping: &mut **mapping,
                column_order: &mut **column_order,
            },
            Self::TableWritten { table } => HookStage::TableWritten {
                table: &mut **table,
            },
            Self::WorkbookBeforeSave { workbook } => HookStage::WorkbookBeforeSave {
                workbook: &mut **workbook,
            },
        }
    }
}

/// Context handed to a hook.
pub struct HookContext<'a> {
    pub stage: HookStage<'a>,
    pub fields: &'a BTreeMap<String, Field>,
    pub state: &'a mut RunState,
    pub logger: &'a ScopedLogger,
}

impl HookContext<'_> {
    pub fn point(&self) -> HookPoint {
        self.stage.point()
    }
}
