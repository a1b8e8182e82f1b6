//! Integration tests for extension discovery.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tabnorm_catalog::registration::{self, register_column_detector, register_field};
use tabnorm_catalog::{
    CatalogError, ColumnDetector, DiscoveryError, ExtensionModule, ExtensionPackage,
    PackageIndex, Record, RowDetector, discover,
};
use tabnorm_model::{Field, ScorePatch};

fn fields_module() -> ExtensionModule {
    ExtensionModule::new("acme::fields", || {
        register_field(Field::new("email").required())?;
        register_field(Field::new("first_name"))?;
        Ok(())
    })
}

fn detectors_module() -> ExtensionModule {
    ExtensionModule::new("acme::detectors", || {
        register_column_detector(ColumnDetector::new("acme::detectors::b", "email", |_| {
            Ok(ScorePatch::Delta(1.0))
        }))?;
        register_column_detector(
            ColumnDetector::new("acme::detectors::a", "email", |_| Ok(ScorePatch::Delta(1.0)))
                .with_priority(1),
        )?;
        registration::register_row_detector(RowDetector::new(
            "acme::detectors::row",
            "header",
            |_| Ok(ScorePatch::none()),
        ))?;
        Ok(())
    })
}

#[test]
fn discovers_package_tree() {
    let index = PackageIndex::new().with_package(
        ExtensionPackage::new("acme").with_module(
            ExtensionModule::namespace("acme")
                .with_child(fields_module())
                .with_child(detectors_module()),
        ),
    );

    let discovered = discover(&index, "acme").expect("discover acme");
    let catalog = discovered.catalog;

    assert!(catalog.is_frozen());
    assert_eq!(
        discovered.loaded_modules,
        vec!["acme", "acme::fields", "acme::detectors"]
    );
    assert!(catalog.field("email").unwrap().required);
    let origins: Vec<_> = catalog
        .column_detectors()
        .iter()
        .map(Record::origin)
        .collect();
    assert_eq!(origins, vec!["acme::detectors::a", "acme::detectors::b"]);
    assert_eq!(catalog.row_detectors().len(), 1);
    assert!(!registration::is_active());
}

#[test]
fn module_order_does_not_change_catalog_order() {
    let forward = PackageIndex::new().with_package(
        ExtensionPackage::new("acme")
            .with_module(fields_module())
            .with_module(detectors_module()),
    );
    let backward = PackageIndex::new().with_package(
        ExtensionPackage::new("acme")
            .with_module(detectors_module())
            .with_module(fields_module()),
    );

    let a = discover(&forward, "acme").unwrap().catalog;
    let b = discover(&backward, "acme").unwrap().catalog;

    let origins = |c: &tabnorm_catalog::Catalog| -> Vec<String> {
        c.column_detectors()
            .iter()
            .map(|d| d.origin().to_string())
            .collect()
    };
    assert_eq!(origins(&a), origins(&b));
    assert_eq!(
        a.fields().keys().collect::<Vec<_>>(),
        b.fields().keys().collect::<Vec<_>>()
    );
}

#[test]
fn shared_modules_load_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let shared = ExtensionModule::new("acme::shared", move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let index = PackageIndex::new().with_package(
        ExtensionPackage::new("acme")
            .with_module(ExtensionModule::namespace("acme::one").with_child(shared.clone()))
            .with_module(ExtensionModule::namespace("acme::two").with_child(shared)),
    );

    let discovered = discover(&index, "acme").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(discovered.loaded_modules.len(), 3);
}

#[test]
fn unknown_package_is_fatal() {
    let err = discover(&PackageIndex::new(), "missing").unwrap_err();
    assert!(matches!(err, DiscoveryError::UnknownPackage { .. }));
}

#[test]
fn duplicate_field_names_the_module() {
    let index = PackageIndex::new().with_package(
        ExtensionPackage::new("acme")
            .with_module(fields_module())
            .with_module(ExtensionModule::new("acme::again", || {
                register_field(Field::new("email"))?;
                Ok(())
            })),
    );

    let err = discover(&index, "acme").unwrap_err();
    match err {
        DiscoveryError::Registration { module, source } => {
            assert_eq!(module, "acme::again");
            assert_eq!(
                source,
                CatalogError::DuplicateField {
                    name: "email".to_string()
                }
            );
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!registration::is_active());
}

#[test]
fn broken_module_aborts_discovery() {
    let index = PackageIndex::new().with_package(
        ExtensionPackage::new("acme")
            .with_module(fields_module())
            .with_module(ExtensionModule::new("acme::broken", || {
                anyhow::bail!("syntax error in extension")
            })),
    );

    let err = discover(&index, "acme").unwrap_err();
    assert_eq!(err.module(), Some("acme::broken"));
    assert!(matches!(err, DiscoveryError::ModuleFailed { .. }));
}

#[test]
fn panicking_module_aborts_discovery() {
    let index = PackageIndex::new().with_package(
        ExtensionPackage::new("acme").with_module(ExtensionModule::new("acme::panics", || {
            panic!("extension blew up")
        })),
    );

    let err = discover(&index, "acme").unwrap_err();
    assert_eq!(err.module(), Some("acme::panics"));
    assert!(!registration::is_active());
}
