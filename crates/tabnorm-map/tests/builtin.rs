//! End-to-end detection with the built-in package.

use tabnorm_catalog::registration::register_field;
use tabnorm_catalog::{Catalog, ExtensionModule, ExtensionPackage, PackageIndex, discover};
use tabnorm_map::builtin::{self, BLANK};
use tabnorm_map::{ColumnMapper, MappingSummary, RowClassifier};
use tabnorm_model::diagnostics::codes;
use tabnorm_model::{
    EngineSettings, Field, FieldType, Mapping, RunState, Sheet, SourceTable, TieResolution,
};

fn people_catalog() -> Catalog {
    let fields = ExtensionModule::new("people::fields", || {
        register_field(Field::new("first_name").with_label("First Name"))?;
        register_field(Field::new("email").with_synonyms(["e-mail", "mail"]))?;
        register_field(Field::new("age").with_type(FieldType::Integer))?;
        Ok(())
    });
    let index = PackageIndex::new().with_package(
        ExtensionPackage::new("people")
            .with_module(builtin::module())
            .with_module(fields),
    );
    let discovered = discover(&index, "people").expect("discover people");
    assert!(discovered.issues.is_empty());
    discovered.catalog
}

fn detect(catalog: &Catalog, sheet: &Sheet, settings: &EngineSettings) -> (Mapping, Vec<String>) {
    let mut state = RunState::new();
    let mut issues = Vec::new();
    let classification = RowClassifier::new(catalog, settings.header_scan_rows).classify(
        sheet,
        &mut state,
        &mut issues,
    );
    let table = SourceTable::from_sheet(sheet, &classification);
    let mapping = ColumnMapper::new(catalog, settings).map(&table, &mut state, &mut issues);
    (mapping, issues.into_iter().map(|i| i.code).collect())
}

#[test]
fn maps_people_headers() {
    let catalog = people_catalog();
    let sheet = Sheet::from_text(
        "staff",
        vec![
            vec!["First Name", "Employee Email", "Favorite Color"],
            vec!["Ada", "ada@example.com", "Blue"],
            vec!["Alan", "alan@example.com", "Green"],
        ],
    );
    let (mapping, codes) = detect(&catalog, &sheet, &EngineSettings::default());
    assert_eq!(mapping.field_for(0), Some("first_name"));
    assert_eq!(mapping.field_for(1), Some("email"));
    assert_eq!(mapping.field_for(2), None);
    assert!(codes.is_empty(), "unexpected issues: {codes:?}");
}

#[test]
fn title_and_blank_rows_are_skipped() {
    let catalog = people_catalog();
    let sheet = Sheet::from_text(
        "staff",
        vec![
            vec!["Staff export", "", ""],
            vec!["", "", ""],
            vec!["First Name", "Email", "Age"],
            vec!["Ada", "ada@example.com", "36"],
            vec!["", "", ""],
            vec!["Alan", "alan@example.com", "41"],
        ],
    );
    let mut issues = Vec::new();
    let classification =
        RowClassifier::new(&catalog, 10).classify(&sheet, &mut RunState::new(), &mut issues);
    assert_eq!(classification.header_row, Some(2));
    assert_eq!(classification.data_rows, vec![3, 5]);
    assert_eq!(classification.row(4).unwrap().label, BLANK);

    let (mapping, _) = detect(&catalog, &sheet, &EngineSettings::default());
    assert_eq!(mapping.mapped_fields(), vec!["first_name", "email", "age"]);
}

#[test]
fn duplicate_email_columns_follow_tie_policy() {
    let catalog = people_catalog();
    let sheet = Sheet::from_text(
        "dupes",
        vec![
            vec!["Email", "Email"],
            vec!["a@example.com", "b@example.com"],
        ],
    );

    let (leftmost, codes_left) = detect(&catalog, &sheet, &EngineSettings::default());
    assert_eq!(leftmost.field_for(0), Some("email"));
    assert_eq!(leftmost.field_for(1), None);
    assert!(codes_left.iter().any(|c| c == codes::MAPPING_CONFLICT));

    let drop_all = EngineSettings {
        mapping_tie_resolution: TieResolution::DropAll,
        ..EngineSettings::default()
    };
    let (dropped, codes_drop) = detect(&catalog, &sheet, &drop_all);
    assert_eq!(dropped.mapped().count(), 0);
    assert!(codes_drop.iter().any(|c| c == codes::MAPPING_CONFLICT));

    let summary = MappingSummary::from_mapping("dupes", &leftmost);
    assert_eq!(summary.tied, 2);
}

#[test]
fn headerless_email_column_maps_by_shape() {
    let catalog = people_catalog();
    let sheet = Sheet::from_text(
        "raw",
        vec![vec!["ada@example.com", "36"], vec!["alan@example.com", "41"]],
    );
    let mut issues = Vec::new();
    let classification =
        RowClassifier::new(&catalog, 10).classify(&sheet, &mut RunState::new(), &mut issues);
    assert!(classification.is_headerless());
    assert_eq!(classification.data_rows, vec![0, 1]);

    let (mapping, _) = detect(&catalog, &sheet, &EngineSettings::default());
    assert_eq!(mapping.field_for(0), Some("email"));
    assert_eq!(mapping.field_for(1), None);
}
