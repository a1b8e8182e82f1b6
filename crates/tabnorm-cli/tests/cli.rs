//! Command-level tests over real files.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tabnorm_cli::cli::{Cli, Command, FieldsArgs, RunArgs};
use tabnorm_cli::commands::{run_fields, run_normalize};
use tabnorm_cli::report::DIAGNOSTICS_FILE;
use tabnorm_core::SchemaError;
use tabnorm_model::diagnostics::codes;

const SCHEMA: &str = r#"
[[field]]
name = "first_name"
label = "First Name"

[[field]]
name = "email"
required = true
synonyms = ["e-mail", "mail"]

[[field]]
name = "age"
type = "integer"
"#;

const STAFF: &str = "\
Staff export,,
First Name,Employee Email,Favorite Color
Ada,ada@example.com,Blue
Alan,alan@example.com,Green
";

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("fields.toml"), SCHEMA).unwrap();
        fs::write(dir.path().join("staff.csv"), STAFF).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn out(&self) -> PathBuf {
        self.path("out")
    }

    fn parse(&self, args: &[&str]) -> Command {
        let schema = self.path("fields.toml");
        let mut argv = vec!["tabnorm".to_string()];
        argv.extend(args.iter().map(ToString::to_string));
        argv.push("--schema".to_string());
        argv.push(display(&schema));
        Cli::try_parse_from(argv).unwrap().command
    }

    fn run_args(&self, extra: &[&str]) -> RunArgs {
        let input = display(&self.path("staff.csv"));
        let out = display(&self.out());
        let mut args = vec!["run", input.as_str(), "--output-dir", out.as_str()];
        args.extend_from_slice(extra);
        match self.parse(&args) {
            Command::Run(args) => args,
            Command::Fields(_) => unreachable!(),
        }
    }

    fn fields_args(&self) -> FieldsArgs {
        match self.parse(&["fields"]) {
            Command::Fields(args) => args,
            Command::Run(_) => unreachable!(),
        }
    }
}

fn display(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

#[test]
fn run_writes_normalized_csv_and_summary() {
    let fixture = Fixture::new();
    let result = run_normalize(&fixture.run_args(&[])).unwrap();
    assert!(!result.has_errors());

    let written = fs::read_to_string(fixture.out().join("staff.csv")).unwrap();
    assert_eq!(
        written,
        "first_name,email,raw_favorite_color\n\
         Ada,ada@example.com,Blue\n\
         Alan,alan@example.com,Green\n"
    );
    assert_eq!(result.written, vec![fixture.out().join("staff.csv")]);

    insta::assert_snapshot!(serde_json::to_string_pretty(&result.summary).unwrap(), @r#"
    {
      "workbook": "staff",
      "sheets": [
        {
          "sheet": "staff",
          "header_row": 1,
          "data_rows": 2,
          "mapped": 2,
          "unmapped": 1,
          "tied": 0,
          "output_columns": [
            "first_name",
            "email",
            "raw_favorite_color"
          ],
          "columns": [
            {
              "index": 0,
              "header": "First Name",
              "field": "first_name"
            },
            {
              "index": 1,
              "header": "Employee Email",
              "field": "email"
            },
            {
              "index": 2,
              "header": "Favorite Color"
            }
          ]
        }
      ],
      "errors": 0,
      "warnings": 0
    }
    "#);
}

#[test]
fn diagnostics_file_has_timestamp_and_mappings() {
    let fixture = Fixture::new();
    let result = run_normalize(&fixture.run_args(&["--no-unmapped"])).unwrap();
    let path = result.diagnostics.unwrap();
    assert_eq!(path, fixture.out().join(DIAGNOSTICS_FILE));

    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
    let generated_at = json["generated_at"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(generated_at).is_ok());
    assert_eq!(json["package"], "tabnorm");
    assert_eq!(json["summary"]["sheets"][0]["output_columns"].as_array().unwrap().len(), 2);
    assert_eq!(json["mappings"][0]["mapping"]["columns"][1]["field"], "email");
    assert!(json["issues"].as_array().unwrap().is_empty());
}

#[test]
fn missing_required_field_is_an_error() {
    let fixture = Fixture::new();
    fs::write(
        fixture.path("fields.toml"),
        format!("{SCHEMA}\n[[field]]\nname = \"phone\"\nrequired = true\n"),
    )
    .unwrap();
    let result = run_normalize(&fixture.run_args(&[])).unwrap();
    assert!(result.has_errors());
    let issue = result
        .outcome
        .report
        .with_code(codes::REQUIRED_FIELD_UNMAPPED)
        .next()
        .unwrap();
    assert_eq!(issue.field.as_deref(), Some("phone"));
    assert_eq!(result.summary.errors, 1);
}

#[test]
fn dry_run_writes_nothing() {
    let fixture = Fixture::new();
    let result = run_normalize(&fixture.run_args(&["--dry-run"])).unwrap();
    assert!(result.written.is_empty());
    assert!(result.diagnostics.is_none());
    assert!(!fixture.out().exists());
}

#[test]
fn config_file_and_flags_combine() {
    let fixture = Fixture::new();
    fs::write(fixture.path("tabnorm.toml"), "unmapped_prefix = \"src_\"\n").unwrap();
    let config = display(&fixture.path("tabnorm.toml"));
    let result = run_normalize(&fixture.run_args(&["--config", config.as_str()])).unwrap();
    assert_eq!(
        result.summary.sheets[0].output_columns,
        vec!["first_name", "email", "src_favorite_color"]
    );

    let result = run_normalize(&fixture.run_args(&[
        "--config",
        config.as_str(),
        "--unmapped-prefix",
        "in_",
    ]))
    .unwrap();
    assert_eq!(
        result.summary.sheets[0].output_columns[2],
        "in_favorite_color"
    );
}

#[test]
fn fields_lists_schema_in_name_order() {
    let fixture = Fixture::new();
    let fields = run_fields(&fixture.fields_args()).unwrap();
    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["age", "email", "first_name"]);
    assert!(fields[1].required);
}

#[test]
fn invalid_schema_is_reported() {
    let fixture = Fixture::new();
    fs::write(fixture.path("fields.toml"), "[[field]]\nname = \"a\"\n[[field]]\nname = \"a\"\n")
        .unwrap();
    let err = run_fields(&fixture.fields_args()).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SchemaError>(),
        Some(SchemaError::DuplicateField { name }) if name == "a"
    ));
}
