use std::path::PathBuf;

use anyhow::{Context, Result};
use tabnorm_catalog::{ExtensionPackage, PackageIndex};
use tabnorm_core::{Engine, FieldSchema, RunOutcome, SettingsLoader, SettingsOverrides};
use tabnorm_map::builtin;
use tabnorm_model::{EngineSettings, Field};
use tracing::{info, info_span, warn};

use crate::cli::{FieldsArgs, RunArgs, SettingsArgs};
use crate::io::{read_workbook, write_table};
use crate::report::{RunSummary, write_diagnostics};

/// Package the CLI runs: built-in detectors plus the `--schema` fields.
pub const CLI_PACKAGE: &str = "tabnorm";

#[derive(Debug)]
pub struct RunResult {
    pub outcome: RunOutcome,
    pub summary: RunSummary,
    pub output_dir: PathBuf,
    pub written: Vec<PathBuf>,
    pub diagnostics: Option<PathBuf>,
}

impl RunResult {
    pub fn has_errors(&self) -> bool {
        self.outcome.report.has_errors()
    }
}

/// Index holding the `builtin` package and the CLI package.
pub fn package_index(schema: Option<FieldSchema>) -> PackageIndex {
    let mut package = ExtensionPackage::new(CLI_PACKAGE).with_module(builtin::module());
    if let Some(schema) = schema {
        package = package.with_module(schema.into_module(format!("{CLI_PACKAGE}::schema")));
    }
    PackageIndex::new()
        .with_package(builtin::package())
        .with_package(package)
}

fn load_settings(args: &SettingsArgs, overrides: SettingsOverrides) -> Result<EngineSettings> {
    let mut loader = SettingsLoader::new().overrides(SettingsOverrides {
        config_package: Some(CLI_PACKAGE.to_string()),
        ..overrides
    });
    if let Some(path) = &args.config {
        loader = loader.defaults_file(path);
    }
    if let Some(path) = &args.env_file {
        loader = loader.env_file(path);
    }
    Ok(loader.load()?)
}

fn load_schema(args: &SettingsArgs) -> Result<Option<FieldSchema>> {
    let Some(path) = &args.schema else {
        warn!("no --schema given; only built-in detectors are loaded");
        return Ok(None);
    };
    let schema = FieldSchema::load(path)?;
    info!(path = %path.display(), fields = schema.fields.len(), "loaded field schema");
    Ok(Some(schema))
}

fn build_engine(args: &SettingsArgs, overrides: SettingsOverrides) -> Result<Engine> {
    let settings = load_settings(args, overrides)?;
    let schema = load_schema(args)?;
    Ok(Engine::new(settings, package_index(schema)))
}

/// Resolves the field catalog without processing any input.
pub fn run_fields(args: &FieldsArgs) -> Result<Vec<Field>> {
    let engine = build_engine(&args.settings, SettingsOverrides::default())?;
    let (catalog, report) = engine.discover().context("discover fields")?;
    for issue in &report.issues {
        warn!(code = %issue.code, "{}", issue.message);
    }
    Ok(catalog.fields().values().cloned().collect())
}

pub fn run_normalize(args: &RunArgs) -> Result<RunResult> {
    let workbook_name = args
        .inputs
        .first()
        .and_then(|path| path.file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    let span = info_span!("normalize", workbook = %workbook_name);
    let _guard = span.enter();

    let engine = build_engine(&args.settings, args.overrides())?;
    let workbook = read_workbook(&workbook_name, &args.inputs)?;
    let outcome = engine.run(workbook)?;
    let summary = RunSummary::from_outcome(&outcome);

    let mut written = Vec::new();
    let mut diagnostics = None;
    if args.dry_run {
        info!("dry run; no files written");
    } else {
        for table in &outcome.workbook.tables {
            written.push(write_table(table, &args.output_dir)?);
        }
        diagnostics = Some(write_diagnostics(
            &args.output_dir,
            &engine.settings().config_package,
            &summary,
            &outcome,
        )?);
    }

    Ok(RunResult {
        outcome,
        summary,
        output_dir: args.output_dir.clone(),
        written,
        diagnostics,
    })
}
