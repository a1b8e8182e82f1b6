//! Error types for engine runs, settings and field schemas.

use std::path::PathBuf;

use tabnorm_catalog::{DiscoveryError, HookPoint};
use thiserror::Error;

/// Fatal errors that abort a run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// A hook failed while `hook_failure = fail`.
    #[error("hook '{origin}' failed at {point}: {source:#}")]
    Hook {
        point: HookPoint,
        origin: String,
        #[source]
        source: anyhow::Error,
    },
}

impl EngineError {
    /// Origin of the record or module responsible, when known.
    pub fn origin(&self) -> Option<&str> {
        match self {
            Self::Discovery(err) => err.module(),
            Self::Hook { origin, .. } => Some(origin),
        }
    }
}

/// Errors resolving engine settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to read env file {path}: {source}")]
    EnvFile {
        path: PathBuf,
        #[source]
        source: dotenvy::Error,
    },

    /// A value could not be parsed for its setting.
    #[error("invalid value '{value}' for {name} (from {origin})")]
    InvalidValue {
        name: String,
        value: String,
        origin: String,
    },
}

/// Errors loading a declarative field schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid schema TOML: {source}")]
    Toml {
        #[source]
        source: toml::de::Error,
    },

    #[error("schema declares field '{name}' more than once")]
    DuplicateField { name: String },

    #[error("schema contains a field with an empty name")]
    EmptyFieldName,
}
