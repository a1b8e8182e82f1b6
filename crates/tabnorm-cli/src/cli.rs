//! CLI argument definitions for tabnorm.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Args, ColorChoice, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use tabnorm_core::SettingsOverrides;
use tabnorm_model::{HookFailurePolicy, TieResolution};
use tracing::level_filters::LevelFilter;

use crate::logging::{LogConfig, LogFormat};

#[derive(Parser)]
#[command(
    name = "tabnorm",
    version,
    about = "Normalize messy tabular files onto a known field schema",
    long_about = "Detect header and data rows, map columns onto declared fields,\n\
                  run transforms and validators, and write normalized CSV files\n\
                  with a diagnostics report."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging setup for these flags. `--log-level` beats `-v`/`-q`, and
    /// `RUST_LOG` is only honored when neither is given.
    pub fn log_config(&self) -> LogConfig {
        let level_filter = self
            .log_level
            .map_or_else(|| self.verbosity.tracing_level_filter(), LevelFilter::from);
        let with_ansi = match self.color.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.log_file.is_none() && io::stderr().is_terminal(),
        };
        LogConfig {
            level_filter,
            use_env_filter: !self.verbosity.is_present() && self.log_level.is_none(),
            with_ansi,
            format: self.log_format.into(),
            log_file: self.log_file.clone(),
            ..LogConfig::default()
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Normalize one or more CSV files.
    Run(RunArgs),

    /// List the fields the configured schema resolves to.
    Fields(FieldsArgs),
}

/// Settings sources shared by every command.
#[derive(Args, Clone, Default)]
pub struct SettingsArgs {
    /// TOML field schema (`[[field]]` tables).
    #[arg(long = "schema", value_name = "PATH")]
    pub schema: Option<PathBuf>,

    /// TOML file with engine setting defaults.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Env file in dotenv syntax with `TABNORM_*` settings.
    #[arg(long = "env-file", value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}

#[derive(Args, Clone)]
pub struct FieldsArgs {
    #[command(flatten)]
    pub settings: SettingsArgs,
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// CSV files to normalize; each file becomes one sheet.
    #[arg(value_name = "INPUT.csv", required = true)]
    pub inputs: Vec<PathBuf>,

    #[command(flatten)]
    pub settings: SettingsArgs,

    /// Directory for normalized CSV files and diagnostics.json.
    #[arg(long = "output-dir", value_name = "DIR", default_value = "tabnorm-output")]
    pub output_dir: PathBuf,

    /// Detect and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Leave unmapped input columns out of the output.
    #[arg(long = "no-unmapped")]
    pub no_unmapped: bool,

    /// Prefix for unmapped output column names.
    #[arg(long = "unmapped-prefix", value_name = "PREFIX")]
    pub unmapped_prefix: Option<String>,

    /// How to break ties when several columns score equally for one field.
    #[arg(long = "tie-resolution", value_enum)]
    pub tie_resolution: Option<TieResolutionArg>,

    /// What to do when a hook fails.
    #[arg(long = "hook-failure", value_enum)]
    pub hook_failure: Option<HookFailureArg>,

    /// Number of leading rows considered as header candidates.
    #[arg(long = "header-scan-rows", value_name = "N")]
    pub header_scan_rows: Option<usize>,
}

impl RunArgs {
    /// Flag values that take precedence over every other settings source.
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            append_unmapped_columns: self.no_unmapped.then_some(false),
            unmapped_prefix: self.unmapped_prefix.clone(),
            mapping_tie_resolution: self.tie_resolution.map(Into::into),
            header_scan_rows: self.header_scan_rows,
            hook_failure: self.hook_failure.map(Into::into),
            ..SettingsOverrides::default()
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum TieResolutionArg {
    Leftmost,
    DropAll,
}

impl From<TieResolutionArg> for TieResolution {
    fn from(value: TieResolutionArg) -> Self {
        match value {
            TieResolutionArg::Leftmost => Self::Leftmost,
            TieResolutionArg::DropAll => Self::DropAll,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum HookFailureArg {
    Fail,
    Warn,
}

impl From<HookFailureArg> for HookFailurePolicy {
    fn from(value: HookFailureArg) -> Self {
        match value {
            HookFailureArg::Fail => Self::Fail,
            HookFailureArg::Warn => Self::Warn,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(value: LogLevelArg) -> Self {
        match value {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "tabnorm",
            "run",
            "people.csv",
            "--no-unmapped",
            "--tie-resolution",
            "drop-all",
            "--unmapped-prefix",
            "src_",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run command");
        };
        let overrides = args.overrides();
        assert_eq!(overrides.append_unmapped_columns, Some(false));
        assert_eq!(overrides.mapping_tie_resolution, Some(TieResolution::DropAll));
        assert_eq!(overrides.unmapped_prefix.as_deref(), Some("src_"));
        assert_eq!(overrides.hook_failure, None);
        assert_eq!(args.output_dir, PathBuf::from("tabnorm-output"));
    }

    #[test]
    fn log_level_flag_beats_verbosity() {
        let cli = Cli::try_parse_from([
            "tabnorm",
            "-vv",
            "--log-level",
            "error",
            "--log-format",
            "json",
            "fields",
        ])
        .unwrap();
        let config = cli.log_config();
        assert_eq!(config.level_filter, LevelFilter::ERROR);
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.use_env_filter);
    }

    #[test]
    fn env_filter_only_without_flags() {
        let cli = Cli::try_parse_from(["tabnorm", "--color", "never", "fields"]).unwrap();
        let config = cli.log_config();
        assert!(config.use_env_filter);
        assert_eq!(config.level_filter, LevelFilter::WARN);
        assert!(!config.with_ansi);
    }

    #[test]
    fn run_requires_input() {
        assert!(Cli::try_parse_from(["tabnorm", "run"]).is_err());
    }
}
