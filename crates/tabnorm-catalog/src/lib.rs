//! Capability catalog for the tabnorm engine.
//!
//! This crate holds everything extension authors touch:
//!
//! - **Records**: row detectors, column detectors, transforms, validators and
//!   hooks, each wrapping a user callable with priority, origin and enabled flag
//! - **Catalog**: the per-run container, frozen and ordered at finalize
//! - **Registration API**: free functions writing into the thread's active catalog
//! - **Discovery**: loads an extension package's module tree into a fresh catalog
//!
//! # Example
//!
//! ```ignore
//! use tabnorm_catalog::{ExtensionModule, ExtensionPackage, PackageIndex, discover};
//!
//! let index = PackageIndex::new().with_package(
//!     ExtensionPackage::new("acme").with_module(ExtensionModule::new("acme::fields", load)),
//! );
//! let discovered = discover(&index, "acme")?;
//! ```

#![deny(unsafe_code)]

mod catalog;
mod context;
mod discovery;
mod error;
mod invoke;
mod logger;
mod record;
pub mod registration;

// === Catalog ===
pub use catalog::Catalog;

// === Contexts ===
pub use context::{
    ColumnDetectorContext, HookContext, HookPoint, HookStage, RowDetectorContext,
    TransformContext, TransformOutput, ValidatorContext,
};

// === Discovery ===
pub use discovery::{
    Discovered, Discovery, ExtensionModule, ExtensionPackage, PackageIndex, discover,
};

// === Errors ===
pub use error::{CatalogError, DiscoveryError, Result};

// === Records ===
pub use record::{ColumnDetector, Hook, Record, RecordMeta, RowDetector, Transform, Validator};

// === Utilities ===
pub use invoke::guarded;
pub use logger::ScopedLogger;
