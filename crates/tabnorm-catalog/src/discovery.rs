//! Extension discovery.
//!
//! An extension package is a tree of modules. Discovery activates a fresh
//! catalog, loads every module reachable from the package root exactly once
//! (loading a module runs its registration calls), then finalizes the
//! catalog. Load order never affects the result because finalize sorts
//! every record list.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use tabnorm_model::Issue;
use tracing::{debug, info, info_span};

use crate::catalog::Catalog;
use crate::error::{CatalogError, DiscoveryError};
use crate::invoke::guarded;
use crate::registration::activate;

type LoadFn = dyn Fn() -> anyhow::Result<()> + Send + Sync;

/// One loadable unit of an extension package.
#[derive(Clone)]
pub struct ExtensionModule {
    path: String,
    load: Arc<LoadFn>,
    children: Vec<ExtensionModule>,
}

impl ExtensionModule {
    pub fn new<F>(path: impl Into<String>, load: F) -> Self
    where
        F: Fn() -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            load: Arc::new(load),
            children: Vec::new(),
        }
    }

    /// A module with no registration calls of its own, only children.
    pub fn namespace(path: impl Into<String>) -> Self {
        Self::new(path, || Ok(()))
    }

    #[must_use]
    pub fn with_child(mut self, child: ExtensionModule) -> Self {
        self.children.push(child);
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: impl IntoIterator<Item = ExtensionModule>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn children(&self) -> &[ExtensionModule] {
        &self.children
    }
}

impl fmt::Debug for ExtensionModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtensionModule")
            .field("path", &self.path)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// A named extension package: the root of a module tree.
#[derive(Debug, Clone)]
pub struct ExtensionPackage {
    name: String,
    modules: Vec<ExtensionModule>,
}

impl ExtensionPackage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modules: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_module(mut self, module: ExtensionModule) -> Self {
        self.modules.push(module);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn modules(&self) -> &[ExtensionModule] {
        &self.modules
    }
}

/// Every package a process knows about, by identifier.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    packages: BTreeMap<String, ExtensionPackage>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a package, replacing any package with the same name.
    pub fn insert(&mut self, package: ExtensionPackage) {
        self.packages.insert(package.name.clone(), package);
    }

    #[must_use]
    pub fn with_package(mut self, package: ExtensionPackage) -> Self {
        self.insert(package);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ExtensionPackage> {
        self.packages.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }
}

/// A finalized catalog plus what discovery observed.
#[derive(Debug)]
pub struct Discovered {
    pub catalog: Catalog,
    /// Module paths in load order.
    pub loaded_modules: Vec<String>,
    /// Finalize warnings.
    pub issues: Vec<Issue>,
}

/// Discovery options.
#[derive(Debug, Clone, Copy)]
pub struct Discovery<'a> {
    index: &'a PackageIndex,
    auto_create_fields: bool,
}

impl<'a> Discovery<'a> {
    pub fn new(index: &'a PackageIndex) -> Self {
        Self {
            index,
            auto_create_fields: true,
        }
    }

    #[must_use]
    pub fn auto_create_fields(mut self, enabled: bool) -> Self {
        self.auto_create_fields = enabled;
        self
    }

    /// Builds and finalizes the catalog for `package`.
    pub fn discover(&self, package: &str) -> Result<Discovered, DiscoveryError> {
        let span = info_span!("discovery", package);
        let _enter = span.enter();

        let root = self
            .index
            .get(package)
            .ok_or_else(|| DiscoveryError::UnknownPackage {
                package: package.to_string(),
            })?;
        let catalog = Catalog::new().with_auto_create_fields(self.auto_create_fields);
        let guard = activate(catalog).map_err(|source| DiscoveryError::Registration {
            module: package.to_string(),
            source,
        })?;

        let mut seen = BTreeSet::new();
        let mut loaded = Vec::new();
        for module in root.modules() {
            load_tree(module, &mut seen, &mut loaded)?;
        }

        let mut catalog = guard
            .deactivate()
            .map_err(|source| DiscoveryError::Registration {
                module: package.to_string(),
                source,
            })?;
        let issues = catalog.finalize();
        info!(
            modules = loaded.len(),
            fields = catalog.fields().len(),
            dropped = issues.len(),
            "extension package discovered"
        );
        Ok(Discovered {
            catalog,
            loaded_modules: loaded,
            issues,
        })
    }
}

/// Shorthand for [`Discovery::discover`] with default options.
pub fn discover(index: &PackageIndex, package: &str) -> Result<Discovered, DiscoveryError> {
    Discovery::new(index).discover(package)
}

fn load_tree(
    module: &ExtensionModule,
    seen: &mut BTreeSet<String>,
    loaded: &mut Vec<String>,
) -> Result<(), DiscoveryError> {
    if !seen.insert(module.path.clone()) {
        debug!(module = %module.path, "module already loaded");
        return Ok(());
    }
    debug!(module = %module.path, "loading module");
    guarded(|| (module.load)()).map_err(|error| match error.downcast::<CatalogError>() {
        Ok(source) => DiscoveryError::Registration {
            module: module.path.clone(),
            source,
        },
        Err(source) => DiscoveryError::ModuleFailed {
            module: module.path.clone(),
            source,
        },
    })?;
    loaded.push(module.path.clone());
    for child in &module.children {
        load_tree(child, seen, loaded)?;
    }
    Ok(())
}
