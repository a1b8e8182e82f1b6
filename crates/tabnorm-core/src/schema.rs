//! Declarative field schemas.
//!
//! ```toml
//! [[field]]
//! name = "email"
//! label = "Email"
//! type = "string"
//! required = true
//! synonyms = ["e-mail", "mail"]
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::Deserialize;
use tabnorm_catalog::ExtensionModule;
use tabnorm_catalog::registration::register_field;
use tabnorm_model::Field;

use crate::error::SchemaError;

/// Fields declared in a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FieldSchema {
    #[serde(default, rename = "field")]
    pub fields: Vec<Field>,
}

impl FieldSchema {
    pub fn from_toml_str(text: &str) -> Result<Self, SchemaError> {
        let mut schema: Self = toml::from_str(text).map_err(|source| SchemaError::Toml { source })?;
        let mut seen = BTreeSet::new();
        for field in &mut schema.fields {
            field.name = field.name.trim().to_string();
            if field.name.is_empty() {
                return Err(SchemaError::EmptyFieldName);
            }
            if !seen.insert(field.name.clone()) {
                return Err(SchemaError::DuplicateField {
                    name: field.name.clone(),
                });
            }
        }
        Ok(schema)
    }

    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let text = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Discovery module registering every field of the schema.
    pub fn into_module(self, path: impl Into<String>) -> ExtensionModule {
        ExtensionModule::new(path, move || {
            for field in &self.fields {
                register_field(field.clone())?;
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabnorm_catalog::{ExtensionPackage, PackageIndex, discover};
    use tabnorm_model::FieldType;

    const SCHEMA: &str = r#"
[[field]]
name = "first_name"
label = "First Name"

[[field]]
name = "email"
type = "string"
required = true
synonyms = ["e-mail", "mail"]

[[field]]
name = "age"
type = "integer"
"#;

    #[test]
    fn parses_fields_with_defaults() {
        let schema = FieldSchema::from_toml_str(SCHEMA).unwrap();
        assert_eq!(
            schema.field_names().collect::<Vec<_>>(),
            vec!["first_name", "email", "age"]
        );
        assert!(schema.fields[1].required);
        assert_eq!(schema.fields[2].field_type, FieldType::Integer);
        assert!(schema.fields[0].synonyms.is_empty());
    }

    #[test]
    fn rejects_duplicates_and_blank_names() {
        let dup = "[[field]]\nname = \"a\"\n[[field]]\nname = \" a \"\n";
        assert!(matches!(
            FieldSchema::from_toml_str(dup),
            Err(SchemaError::DuplicateField { name }) if name == "a"
        ));
        assert!(matches!(
            FieldSchema::from_toml_str("[[field]]\nname = \"  \"\n"),
            Err(SchemaError::EmptyFieldName)
        ));
        assert!(matches!(
            FieldSchema::from_toml_str("[[field]]\nname = \"a\"\ntype = \"blob\"\n"),
            Err(SchemaError::Toml { .. })
        ));
    }

    #[test]
    fn module_registers_fields() {
        let schema = FieldSchema::from_toml_str(SCHEMA).unwrap();
        let index = PackageIndex::new().with_package(
            ExtensionPackage::new("schema").with_module(schema.into_module("schema::fields")),
        );
        let catalog = discover(&index, "schema").unwrap().catalog;
        assert_eq!(catalog.fields().len(), 3);
        assert!(catalog.field("email").unwrap().required);
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fields.toml");
        std::fs::write(&path, SCHEMA).unwrap();
        assert_eq!(FieldSchema::load(&path).unwrap().fields.len(), 3);
        assert!(matches!(
            FieldSchema::load(&dir.path().join("missing.toml")),
            Err(SchemaError::Io { .. })
        ));
    }
}
