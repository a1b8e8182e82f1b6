//! Registration API for extension authors.
//!
//! Extension modules call the free functions in this module while discovery
//! holds a catalog active on the current thread. Calling them at any other
//! time fails with [`CatalogError::NoActiveCatalog`], which catches modules
//! that were loaded but never meant to register anything.
//!
//! The active slot is thread-local and cleared when the [`ActiveCatalog`]
//! guard is dropped, so concurrent runs on different threads never see each
//! other's catalog.
//!
//! # Example
//!
//! ```ignore
//! use tabnorm_catalog::{registration, origin, ColumnDetector};
//! use tabnorm_model::Field;
//!
//! fn load() -> anyhow::Result<()> {
//!     registration::register_field(Field::new("email").with_synonyms(["e-mail"]))?;
//!     registration::register_column_detector(ColumnDetector::new(
//!         origin!("email_header"),
//!         "email",
//!         |ctx| Ok(if ctx.header == Some("Email") { 1.0 } else { 0.0 }.into()),
//!     ))?;
//!     Ok(())
//! }
//! ```

use std::cell::RefCell;
use std::marker::PhantomData;

use tabnorm_model::Field;

use crate::catalog::Catalog;
use crate::error::{CatalogError, Result};
use crate::record::{ColumnDetector, Hook, RowDetector, Transform, Validator};

thread_local! {
    static ACTIVE: RefCell<Option<Catalog>> = const { RefCell::new(None) };
}

/// Guard for the catalog active on the current thread.
///
/// Not `Send`: the catalog lives in this thread's slot.
#[must_use = "dropping the guard discards the active catalog"]
pub struct ActiveCatalog {
    released: bool,
    _thread_bound: PhantomData<*const ()>,
}

/// Makes `catalog` the target of registration calls on this thread.
pub fn activate(catalog: Catalog) -> Result<ActiveCatalog> {
    if catalog.is_frozen() {
        return Err(CatalogError::CatalogFrozen {
            kind: "catalog",
            origin: "activate".to_string(),
        });
    }
    ACTIVE.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_some() {
            return Err(CatalogError::AlreadyActive);
        }
        *slot = Some(catalog);
        Ok(ActiveCatalog {
            released: false,
            _thread_bound: PhantomData,
        })
    })
}

impl ActiveCatalog {
    /// Takes the catalog back out of the thread's slot.
    pub fn deactivate(mut self) -> Result<Catalog> {
        self.released = true;
        ACTIVE
            .with(|slot| slot.borrow_mut().take())
            .ok_or(CatalogError::NoActiveCatalog)
    }
}

impl Drop for ActiveCatalog {
    fn drop(&mut self) {
        if !self.released {
            ACTIVE.with(|slot| slot.borrow_mut().take());
        }
    }
}

/// True when a catalog is active on this thread.
pub fn is_active() -> bool {
    ACTIVE.with(|slot| slot.borrow().is_some())
}

/// Runs `f` against the active catalog.
pub fn with_active<R>(f: impl FnOnce(&mut Catalog) -> Result<R>) -> Result<R> {
    ACTIVE.with(|slot| match slot.borrow_mut().as_mut() {
        Some(catalog) => f(catalog),
        None => Err(CatalogError::NoActiveCatalog),
    })
}

pub fn register_field(field: Field) -> Result<()> {
    with_active(|catalog| catalog.register_field(field))
}

pub fn register_row_kind(kind: impl Into<String>) -> Result<()> {
    let kind = kind.into();
    with_active(|catalog| catalog.register_row_kind(kind))
}

pub fn register_row_detector(detector: RowDetector) -> Result<()> {
    with_active(|catalog| catalog.register_row_detector(detector))
}

pub fn register_column_detector(detector: ColumnDetector) -> Result<()> {
    with_active(|catalog| catalog.register_column_detector(detector))
}

pub fn register_transform(transform: Transform) -> Result<()> {
    with_active(|catalog| catalog.register_transform(transform))
}

pub fn register_validator(validator: Validator) -> Result<()> {
    with_active(|catalog| catalog.register_validator(validator))
}

pub fn register_hook(hook: Hook) -> Result<()> {
    with_active(|catalog| catalog.register_hook(hook))
}
