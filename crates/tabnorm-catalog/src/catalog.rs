//! The per-run capability catalog.

use std::collections::{BTreeMap, BTreeSet};

use tabnorm_model::diagnostics::codes;
use tabnorm_model::{DATA, Field, HEADER, Issue, Stage};
use tracing::{debug, warn};

use crate::context::HookPoint;
use crate::error::{CatalogError, Result};
use crate::record::{
    ColumnDetector, Hook, Record, RowDetector, Transform, Validator, sort_records,
};

/// All capability records registered for one run.
///
/// Created empty, populated while active, then frozen by [`Catalog::finalize`].
/// A catalog is never shared between runs.
#[derive(Debug)]
pub struct Catalog {
    fields: BTreeMap<String, Field>,
    explicit_fields: BTreeSet<String>,
    row_kinds: BTreeSet<String>,
    row_detectors: Vec<RowDetector>,
    column_detectors: Vec<ColumnDetector>,
    transforms: Vec<Transform>,
    validators: Vec<Validator>,
    hooks: BTreeMap<HookPoint, Vec<Hook>>,
    auto_create_fields: bool,
    frozen: bool,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    /// An empty catalog that knows the `header` and `data` row kinds.
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
            explicit_fields: BTreeSet::new(),
            row_kinds: [HEADER, DATA].into_iter().map(str::to_string).collect(),
            row_detectors: Vec::new(),
            column_detectors: Vec::new(),
            transforms: Vec::new(),
            validators: Vec::new(),
            hooks: BTreeMap::new(),
            auto_create_fields: true,
            frozen: false,
        }
    }

    /// Controls whether records referencing unknown fields create them.
    ///
    /// When disabled, such records are dropped with a warning at finalize.
    #[must_use]
    pub fn with_auto_create_fields(mut self, enabled: bool) -> Self {
        self.auto_create_fields = enabled;
        self
    }

    /// Whether unknown field references create fields with default metadata.
    pub fn auto_creates_fields(&self) -> bool {
        self.auto_create_fields
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    fn ensure_open(&self, kind: &'static str, origin: &str) -> Result<()> {
        if self.frozen {
            return Err(CatalogError::CatalogFrozen {
                kind,
                origin: origin.to_string(),
            });
        }
        Ok(())
    }

    /// Declares a field. Declaring the same name twice is fatal; declaring a
    /// name that was only auto-created replaces its default metadata.
    pub fn register_field(&mut self, field: Field) -> Result<()> {
        self.ensure_open("field", &field.name)?;
        if field.name.is_empty() {
            return Err(CatalogError::EmptyFieldName {
                kind: "field",
                origin: String::new(),
            });
        }
        if !self.explicit_fields.insert(field.name.clone()) {
            return Err(CatalogError::DuplicateField { name: field.name });
        }
        debug!(field = %field.name, "registered field");
        self.fields.insert(field.name.clone(), field);
        Ok(())
    }

    /// Adds a row kind beyond `header` and `data`.
    pub fn register_row_kind(&mut self, kind: impl Into<String>) -> Result<()> {
        let kind = kind.into();
        self.ensure_open("row kind", &kind)?;
        self.row_kinds.insert(kind);
        Ok(())
    }

    pub fn register_row_detector(&mut self, detector: RowDetector) -> Result<()> {
        self.ensure_open(RowDetector::KIND, detector.origin())?;
        self.row_detectors.push(detector);
        Ok(())
    }

    pub fn register_column_detector(&mut self, detector: ColumnDetector) -> Result<()> {
        self.ensure_open(ColumnDetector::KIND, detector.origin())?;
        if let Some(field) = detector.field() {
            self.reference_field(ColumnDetector::KIND, detector.origin(), field)?;
        }
        self.column_detectors.push(detector);
        Ok(())
    }

    pub fn register_transform(&mut self, transform: Transform) -> Result<()> {
        self.ensure_open(Transform::KIND, transform.origin())?;
        self.reference_field(Transform::KIND, transform.origin(), transform.field())?;
        self.transforms.push(transform);
        Ok(())
    }

    pub fn register_validator(&mut self, validator: Validator) -> Result<()> {
        self.ensure_open(Validator::KIND, validator.origin())?;
        self.reference_field(Validator::KIND, validator.origin(), validator.field())?;
        self.validators.push(validator);
        Ok(())
    }

    pub fn register_hook(&mut self, hook: Hook) -> Result<()> {
        self.ensure_open(Hook::KIND, hook.origin())?;
        self.hooks.entry(hook.point()).or_default().push(hook);
        Ok(())
    }

    fn reference_field(&mut self, kind: &'static str, origin: &str, field: &str) -> Result<()> {
        if field.trim().is_empty() {
            return Err(CatalogError::EmptyFieldName {
                kind,
                origin: origin.to_string(),
            });
        }
        if self.auto_create_fields && !self.fields.contains_key(field) {
            debug!(field, origin, "auto-created field");
            self.fields.insert(field.to_string(), Field::new(field));
        }
        Ok(())
    }

    /// Drops records bound to unknown fields, sorts every list, freezes.
    ///
    /// Returns one warning issue per dropped record. Finalizing a frozen
    /// catalog does nothing.
    pub fn finalize(&mut self) -> Vec<Issue> {
        if self.frozen {
            return Vec::new();
        }
        let mut issues = Vec::new();
        let fields = &self.fields;
        let mut drop_unknown = |kind: &str, origin: &str, field: Option<&str>| -> bool {
            match field {
                Some(name) if !fields.contains_key(name) => {
                    warn!(kind, origin, field = name, "dropping record bound to unknown field");
                    issues.push(
                        Issue::warning(
                            Stage::Discovery,
                            codes::UNKNOWN_FIELD_REFERENCE,
                            format!("{kind} '{origin}' references unknown field '{name}'"),
                        )
                        .with_origin(origin)
                        .with_field(name),
                    );
                    false
                }
                _ => true,
            }
        };
        self.column_detectors
            .retain(|d| drop_unknown(ColumnDetector::KIND, d.origin(), d.field()));
        self.transforms
            .retain(|t| drop_unknown(Transform::KIND, t.origin(), Some(t.field())));
        self.validators
            .retain(|v| drop_unknown(Validator::KIND, v.origin(), Some(v.field())));

        sort_records(&mut self.row_detectors);
        sort_records(&mut self.column_detectors);
        sort_records(&mut self.transforms);
        sort_records(&mut self.validators);
        for hooks in self.hooks.values_mut() {
            sort_records(hooks);
        }
        self.frozen = true;
        debug!(
            fields = self.fields.len(),
            row_detectors = self.row_detectors.len(),
            column_detectors = self.column_detectors.len(),
            transforms = self.transforms.len(),
            validators = self.validators.len(),
            hooks = self.hooks.values().map(Vec::len).sum::<usize>(),
            "catalog finalized"
        );
        issues
    }

    pub fn fields(&self) -> &BTreeMap<String, Field> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    pub fn row_kinds(&self) -> &BTreeSet<String> {
        &self.row_kinds
    }

    pub fn row_detectors(&self) -> &[RowDetector] {
        &self.row_detectors
    }

    pub fn column_detectors(&self) -> &[ColumnDetector] {
        &self.column_detectors
    }

    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn transforms_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Transform> {
        self.transforms.iter().filter(move |t| t.field() == field)
    }

    pub fn validators_for<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Validator> {
        self.validators.iter().filter(move |v| v.field() == field)
    }

    pub fn hooks(&self, point: HookPoint) -> &[Hook] {
        self.hooks.get(&point).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use tabnorm_model::ScorePatch;

    use super::*;

    fn noop_detector(origin: &str, field: &str) -> ColumnDetector {
        ColumnDetector::new(origin, field, |_| Ok(ScorePatch::none()))
    }

    #[test]
    fn duplicate_field_is_fatal() {
        let mut catalog = Catalog::new();
        catalog.register_field(Field::new("email")).unwrap();
        let err = catalog.register_field(Field::new("email")).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateField {
                name: "email".to_string()
            }
        );
    }

    #[test]
    fn explicit_declaration_upgrades_auto_created_field() {
        let mut catalog = Catalog::new();
        catalog
            .register_column_detector(noop_detector("a::detect", "email"))
            .unwrap();
        assert_eq!(catalog.field("email").unwrap().label, None);
        catalog
            .register_field(Field::new("email").with_label("Email"))
            .unwrap();
        assert_eq!(catalog.field("email").unwrap().label.as_deref(), Some("Email"));
    }

    #[test]
    fn finalize_drops_unknown_references_without_auto_create() {
        let mut catalog = Catalog::new().with_auto_create_fields(false);
        catalog.register_field(Field::new("email")).unwrap();
        catalog
            .register_column_detector(noop_detector("a::email", "email"))
            .unwrap();
        catalog
            .register_column_detector(noop_detector("a::phone", "phone"))
            .unwrap();
        let issues = catalog.finalize();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, codes::UNKNOWN_FIELD_REFERENCE);
        assert_eq!(issues[0].origin.as_deref(), Some("a::phone"));
        assert_eq!(catalog.column_detectors().len(), 1);
    }

    #[test]
    fn frozen_catalog_rejects_registration() {
        let mut catalog = Catalog::new();
        catalog.finalize();
        assert!(catalog.is_frozen());
        let err = catalog.register_field(Field::new("email")).unwrap_err();
        assert!(matches!(err, CatalogError::CatalogFrozen { .. }));
    }

    #[test]
    fn multi_target_detector_needs_no_field() {
        let mut catalog = Catalog::new();
        catalog
            .register_column_detector(ColumnDetector::multi("a::multi", |_| {
                Ok(ScorePatch::none())
            }))
            .unwrap();
        assert!(catalog.fields().is_empty());
        catalog.finalize();
        assert_eq!(catalog.column_detectors().len(), 1);
    }

    #[test]
    fn hooks_are_bucketed_by_point() {
        let mut catalog = Catalog::new();
        catalog
            .register_hook(Hook::new("a::late", HookPoint::OnTableMapped, |_| Ok(())))
            .unwrap();
        catalog
            .register_hook(
                Hook::new("b::early", HookPoint::OnTableMapped, |_| Ok(())).with_priority(5),
            )
            .unwrap();
        catalog.finalize();
        let origins: Vec<_> = catalog
            .hooks(HookPoint::OnTableMapped)
            .iter()
            .map(Record::origin)
            .collect();
        assert_eq!(origins, vec!["b::early", "a::late"]);
        assert!(catalog.hooks(HookPoint::OnTableWritten).is_empty());
    }
}
