//! Error types for registration and discovery.

use thiserror::Error;

/// Fatal registration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A registration call ran while no catalog was active on this thread.
    #[error("no active catalog: registration must happen during discovery")]
    NoActiveCatalog,

    /// A catalog is already active on this thread.
    #[error("a catalog is already active on this thread")]
    AlreadyActive,

    /// The catalog was finalized and no longer accepts records.
    #[error("catalog is frozen; cannot register {kind} '{origin}'")]
    CatalogFrozen { kind: &'static str, origin: String },

    /// The same field name was declared twice.
    #[error("duplicate field declaration: {name}")]
    DuplicateField { name: String },

    /// A field name or record field reference was blank.
    #[error("empty field name in {kind} '{origin}'")]
    EmptyFieldName { kind: &'static str, origin: String },
}

/// Fatal discovery errors.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("unknown extension package: {package}")]
    UnknownPackage { package: String },

    /// A module's registration calls failed.
    #[error("registration failed in module {module}: {source}")]
    Registration {
        module: String,
        #[source]
        source: CatalogError,
    },

    /// A module failed to load for any other reason.
    #[error("failed to load module {module}: {source}")]
    ModuleFailed {
        module: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DiscoveryError {
    /// Module path responsible for the failure, when known.
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::UnknownPackage { .. } => None,
            Self::Registration { module, .. } | Self::ModuleFailed { module, .. } => Some(module),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
