//! Run orchestration.
//!
//! One run processes one workbook:
//!
//! 1. Discover the configured package into a fresh, frozen catalog
//! 2. `on_workbook_start`
//! 3. Per sheet: `on_sheet_start`, row classification, `on_table_detected`,
//!    column mapping, `on_table_mapped`, transforms and validators,
//!    rendering, `on_table_written`
//! 4. `on_workbook_before_save`
//!
//! Every run owns its catalog and run state; nothing is shared between runs.

use serde::Serialize;
use tabnorm_catalog::{Catalog, Discovery, HookStage, PackageIndex};
use tabnorm_map::{ColumnMapper, MappingSummary, RowClassifier};
use tabnorm_model::{
    DiagnosticsReport, EngineSettings, Issue, Mapping, OutputTable, OutputWorkbook,
    RowClassification, RunState, Sheet, SourceTable, Workbook,
};
use tabnorm_transform::TransformStage;
use tracing::{info, info_span};

use crate::error::EngineError;
use crate::hooks::HookRunner;
use crate::render::render;

/// What a run observed for one sheet.
#[derive(Debug, Clone, Serialize)]
pub struct SheetOutcome {
    pub sheet: String,
    pub classification: RowClassification,
    pub mapping: Mapping,
    /// Input column indices in output order.
    pub column_order: Vec<usize>,
    pub summary: MappingSummary,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub workbook: OutputWorkbook,
    pub report: DiagnosticsReport,
    pub sheets: Vec<SheetOutcome>,
    pub state: RunState,
}

/// Runs workbooks through the detection-and-mapping pipeline.
#[derive(Debug, Clone)]
pub struct Engine {
    settings: EngineSettings,
    index: PackageIndex,
}

impl Engine {
    pub fn new(settings: EngineSettings, index: PackageIndex) -> Self {
        Self { settings, index }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn index(&self) -> &PackageIndex {
        &self.index
    }

    /// Builds the catalog for the configured package.
    pub fn discover(&self) -> Result<(Catalog, DiagnosticsReport), EngineError> {
        let discovered = Discovery::new(&self.index).discover(&self.settings.config_package)?;
        let mut report = DiagnosticsReport::default();
        report.extend(discovered.issues);
        Ok((discovered.catalog, report))
    }

    /// Runs one workbook with a freshly discovered catalog.
    pub fn run(&self, workbook: Workbook) -> Result<RunOutcome, EngineError> {
        let span = info_span!(
            "run",
            package = %self.settings.config_package,
            workbook = %workbook.name
        );
        let _enter = span.enter();

        let (catalog, report) = self.discover()?;
        let mut outcome = self.run_with_catalog(&catalog, workbook)?;
        let mut merged = report;
        merged.extend(std::mem::take(&mut outcome.report.issues));
        outcome.report = merged;
        Ok(outcome)
    }

    /// Runs one workbook against a caller-supplied, finalized catalog.
    pub fn run_with_catalog(
        &self,
        catalog: &Catalog,
        mut workbook: Workbook,
    ) -> Result<RunOutcome, EngineError> {
        let settings = &self.settings;
        let hooks = HookRunner::new(catalog, settings.hook_failure);
        let mut state = RunState::new();
        let mut issues = Vec::new();

        hooks.run(
            HookStage::WorkbookStart {
                workbook: &mut workbook,
            },
            None,
            &mut state,
            &mut issues,
        )?;

        let mut output = OutputWorkbook {
            name: workbook.name.clone(),
            tables: Vec::new(),
        };
        let mut sheets = Vec::new();
        for sheet in &mut workbook.sheets {
            let span = info_span!("sheet", name = %sheet.name);
            let _enter = span.enter();
            let (table, outcome) =
                self.run_sheet(catalog, &hooks, sheet, &mut state, &mut issues)?;
            output.tables.push(table);
            sheets.push(outcome);
        }

        hooks.run(
            HookStage::WorkbookBeforeSave {
                workbook: &mut output,
            },
            None,
            &mut state,
            &mut issues,
        )?;

        let mut report = DiagnosticsReport::default();
        report.extend(issues);
        info!(
            sheets = sheets.len(),
            errors = report.error_count(),
            warnings = report.warning_count(),
            "run complete"
        );
        Ok(RunOutcome {
            workbook: output,
            report,
            sheets,
            state,
        })
    }

    fn run_sheet(
        &self,
        catalog: &Catalog,
        hooks: &HookRunner<'_>,
        sheet: &mut Sheet,
        state: &mut RunState,
        issues: &mut Vec<Issue>,
    ) -> Result<(OutputTable, SheetOutcome), EngineError> {
        let settings = &self.settings;
        let sheet_name = sheet.name.clone();

        hooks.run(
            HookStage::SheetStart { sheet: &mut *sheet },
            Some(&sheet_name),
            state,
            issues,
        )?;

        let mut classification =
            RowClassifier::new(catalog, settings.header_scan_rows).classify(sheet, state, issues);
        hooks.run(
            HookStage::TableDetected {
                sheet: &*sheet,
                classification: &mut classification,
            },
            Some(&sheet_name),
            state,
            issues,
        )?;
        info!(
            header_row = ?classification.header_row,
            data_rows = classification.data_rows.len(),
            "table detected"
        );

        let mut table = SourceTable::from_sheet(sheet, &classification);
        let mut mapping = ColumnMapper::new(catalog, settings).map(&table, state, issues);
        let mut column_order: Vec<usize> = table.columns.iter().map(|c| c.index).collect();
        hooks.run(
            HookStage::TableMapped {
                table: &mut table,
                mapping: &mut mapping,
                column_order: &mut column_order,
            },
            Some(&sheet_name),
            state,
            issues,
        )?;

        let values = TransformStage::new(catalog).run(&table, &mapping, state, issues);
        let mut rendered = render(&table, &mapping, &column_order, &values, settings);
        hooks.run(
            HookStage::TableWritten {
                table: &mut rendered,
            },
            Some(&sheet_name),
            state,
            issues,
        )?;
        info!(
            columns = rendered.columns.len(),
            rows = rendered.row_count,
            "table written"
        );

        let summary = MappingSummary::from_mapping(&sheet_name, &mapping);
        Ok((
            rendered,
            SheetOutcome {
                sheet: sheet_name,
                classification,
                mapping,
                column_order,
                summary,
            },
        ))
    }
}
