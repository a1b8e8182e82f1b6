//! Capability records.
//!
//! Every record wraps a user callable with a priority, a stable origin and an
//! enabled flag. Column-scoped kinds are also bound to a field name. Records
//! are immutable once registered; the catalog orders them at finalize by
//! `(priority descending, origin ascending)`.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use tabnorm_model::{ScorePatch, ValidationOutcome};

use crate::context::{
    ColumnDetectorContext, HookContext, HookPoint, RowDetectorContext, TransformContext,
    TransformOutput, ValidatorContext,
};

pub type RowDetectorFn = dyn Fn(&mut RowDetectorContext<'_>) -> Result<ScorePatch> + Send + Sync;
pub type ColumnDetectorFn =
    dyn Fn(&mut ColumnDetectorContext<'_>) -> Result<ScorePatch> + Send + Sync;
pub type TransformFn =
    dyn Fn(&mut TransformContext<'_>) -> Result<Vec<TransformOutput>> + Send + Sync;
pub type ValidatorFn =
    dyn Fn(&mut ValidatorContext<'_>) -> Result<ValidationOutcome> + Send + Sync;
pub type HookFn = dyn Fn(&mut HookContext<'_>) -> Result<()> + Send + Sync;

/// Builds an origin string from the calling module path and a name.
///
/// ```ignore
/// let origin = tabnorm_catalog::origin!("email_header");
/// ```
#[macro_export]
macro_rules! origin {
    ($name:literal) => {
        concat!(module_path!(), "::", $name)
    };
}

/// Metadata shared by every record kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMeta {
    /// Module path plus qualified name; only used to order records.
    pub origin: String,
    /// Higher runs first.
    pub priority: i32,
    pub enabled: bool,
}

impl RecordMeta {
    fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            priority: 0,
            enabled: true,
        }
    }

    /// Catalog ordering: priority descending, then origin ascending.
    pub fn order(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.origin.cmp(&other.origin))
    }
}

/// Access to a record's metadata, used for ordering.
pub trait Record {
    const KIND: &'static str;

    fn meta(&self) -> &RecordMeta;

    fn origin(&self) -> &str {
        &self.meta().origin
    }

    fn priority(&self) -> i32 {
        self.meta().priority
    }

    fn is_enabled(&self) -> bool {
        self.meta().enabled
    }
}

pub(crate) fn sort_records<R: Record>(records: &mut [R]) {
    records.sort_by(|a, b| a.meta().order(b.meta()));
}

macro_rules! record_builders {
    ($ty:ident) => {
        impl $ty {
            #[must_use]
            pub fn with_priority(mut self, priority: i32) -> Self {
                self.meta.priority = priority;
                self
            }

            #[must_use]
            pub fn enabled(mut self, enabled: bool) -> Self {
                self.meta.enabled = enabled;
                self
            }

            #[must_use]
            pub fn disabled(self) -> Self {
                self.enabled(false)
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("origin", &self.meta.origin)
                    .field("priority", &self.meta.priority)
                    .field("enabled", &self.meta.enabled)
                    .finish_non_exhaustive()
            }
        }
    };
}

/// Scores one row against row kinds.
#[derive(Clone)]
pub struct RowDetector {
    meta: RecordMeta,
    kind: String,
    func: Arc<RowDetectorFn>,
}

impl RowDetector {
    /// `kind` is the default target for shorthand score returns.
    pub fn new<F>(origin: impl Into<String>, kind: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut RowDetectorContext<'_>) -> Result<ScorePatch> + Send + Sync + 'static,
    {
        Self {
            meta: RecordMeta::new(origin),
            kind: kind.into(),
            func: Arc::new(func),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn detect(&self, ctx: &mut RowDetectorContext<'_>) -> Result<ScorePatch> {
        (self.func)(ctx)
    }
}

record_builders!(RowDetector);

impl Record for RowDetector {
    const KIND: &'static str = "row detector";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

/// Scores one column against fields.
#[derive(Clone)]
pub struct ColumnDetector {
    meta: RecordMeta,
    field: Option<String>,
    func: Arc<ColumnDetectorFn>,
}

impl ColumnDetector {
    /// A detector bound to `field`; shorthand returns score that field.
    pub fn new<F>(origin: impl Into<String>, field: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut ColumnDetectorContext<'_>) -> Result<ScorePatch> + Send + Sync + 'static,
    {
        Self {
            meta: RecordMeta::new(origin),
            field: Some(field.into()),
            func: Arc::new(func),
        }
    }

    /// A detector with no bound field; it must return explicit target maps.
    pub fn multi<F>(origin: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut ColumnDetectorContext<'_>) -> Result<ScorePatch> + Send + Sync + 'static,
    {
        Self {
            meta: RecordMeta::new(origin),
            field: None,
            func: Arc::new(func),
        }
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    pub fn detect(&self, ctx: &mut ColumnDetectorContext<'_>) -> Result<ScorePatch> {
        (self.func)(ctx)
    }
}

record_builders!(ColumnDetector);

impl Record for ColumnDetector {
    const KIND: &'static str = "column detector";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

/// Rewrites the values of one field, optionally setting sibling fields.
#[derive(Clone)]
pub struct Transform {
    meta: RecordMeta,
    field: String,
    func: Arc<TransformFn>,
}

impl Transform {
    pub fn new<F>(origin: impl Into<String>, field: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut TransformContext<'_>) -> Result<Vec<TransformOutput>> + Send + Sync + 'static,
    {
        Self {
            meta: RecordMeta::new(origin),
            field: field.into(),
            func: Arc::new(func),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn apply(&self, ctx: &mut TransformContext<'_>) -> Result<Vec<TransformOutput>> {
        (self.func)(ctx)
    }
}

record_builders!(Transform);

impl Record for Transform {
    const KIND: &'static str = "transform";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

/// Checks the values of one field without changing them.
#[derive(Clone)]
pub struct Validator {
    meta: RecordMeta,
    field: String,
    func: Arc<ValidatorFn>,
}

impl Validator {
    pub fn new<F>(origin: impl Into<String>, field: impl Into<String>, func: F) -> Self
    where
        F: Fn(&mut ValidatorContext<'_>) -> Result<ValidationOutcome> + Send + Sync + 'static,
    {
        Self {
            meta: RecordMeta::new(origin),
            field: field.into(),
            func: Arc::new(func),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn validate(&self, ctx: &mut ValidatorContext<'_>) -> Result<ValidationOutcome> {
        (self.func)(ctx)
    }
}

record_builders!(Validator);

impl Record for Validator {
    const KIND: &'static str = "validator";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

/// A lifecycle callback.
#[derive(Clone)]
pub struct Hook {
    meta: RecordMeta,
    point: HookPoint,
    func: Arc<HookFn>,
}

impl Hook {
    pub fn new<F>(origin: impl Into<String>, point: HookPoint, func: F) -> Self
    where
        F: Fn(&mut HookContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Self {
            meta: RecordMeta::new(origin),
            point,
            func: Arc::new(func),
        }
    }

    pub fn point(&self) -> HookPoint {
        self.point
    }

    pub fn call(&self, ctx: &mut HookContext<'_>) -> Result<()> {
        (self.func)(ctx)
    }
}

record_builders!(Hook);

impl Record for Hook {
    const KIND: &'static str = "hook";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_priority_then_origin() {
        let mut records = vec![
            RowDetector::new("b::low", "header", |_| Ok(ScorePatch::none())),
            RowDetector::new("z::high", "header", |_| Ok(ScorePatch::none())).with_priority(10),
            RowDetector::new("a::low", "header", |_| Ok(ScorePatch::none())),
        ];
        sort_records(&mut records);
        let origins: Vec<_> = records.iter().map(Record::origin).collect();
        assert_eq!(origins, vec!["z::high", "a::low", "b::low"]);
    }

    #[test]
    fn origin_macro_includes_module_path() {
        let origin = origin!("thing");
        assert!(origin.ends_with("::thing"));
        assert!(origin.starts_with("tabnorm_catalog"));
    }
}
