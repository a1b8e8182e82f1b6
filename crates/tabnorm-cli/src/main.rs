//! tabnorm CLI.

use std::fmt::Display;
use std::process::ExitCode;

use clap::Parser;
use tabnorm_cli::cli::{Cli, Command};
use tabnorm_cli::commands::{run_fields, run_normalize};
use tabnorm_cli::logging::init_logging;
use tabnorm_cli::summary::{print_fields, print_summary};

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli.color.write_global();
    if let Err(error) = init_logging(&cli.log_config()) {
        return fail(format_args!("failed to initialize logging: {error}"));
    }
    match cli.command {
        Command::Run(args) => match run_normalize(&args) {
            Ok(result) => {
                print_summary(&result);
                if result.has_errors() {
                    ExitCode::FAILURE
                } else {
                    ExitCode::SUCCESS
                }
            }
            Err(error) => fail(format_args!("{error:#}")),
        },
        Command::Fields(args) => match run_fields(&args) {
            Ok(fields) => {
                print_fields(&fields);
                ExitCode::SUCCESS
            }
            Err(error) => fail(format_args!("{error:#}")),
        },
    }
}

fn fail(message: impl Display) -> ExitCode {
    eprintln!("error: {message}");
    ExitCode::FAILURE
}
