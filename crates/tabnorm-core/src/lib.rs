//! Run orchestration for tabnorm.
//!
//! [`Engine`] ties the pieces together: it discovers the configured
//! extension package, classifies rows, maps columns, runs transforms and
//! validators, renders output tables and fires hooks at each lifecycle point.
//! Settings come from [`SettingsLoader`]; declarative fields from
//! [`FieldSchema`].

#![deny(unsafe_code)]

mod engine;
mod error;
mod hooks;
pub mod render;
mod schema;
pub mod settings;

pub use engine::{Engine, RunOutcome, SheetOutcome};
pub use error::{EngineError, SchemaError, SettingsError};
pub use hooks::HookRunner;
pub use render::render;
pub use schema::FieldSchema;
pub use settings::{ENV_PREFIX, SettingsLoader, SettingsOverrides};
