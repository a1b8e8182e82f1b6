//! Hook invocation at the six lifecycle points.

use tabnorm_catalog::{Catalog, HookContext, HookStage, Record, ScopedLogger, guarded};
use tabnorm_model::diagnostics::codes;
use tabnorm_model::{HookFailurePolicy, Issue, RunState, Stage};
use tracing::{debug, error, warn};

use crate::error::EngineError;

/// Runs a point's hooks in catalog order under the configured failure policy.
pub struct HookRunner<'a> {
    catalog: &'a Catalog,
    policy: HookFailurePolicy,
}

impl<'a> HookRunner<'a> {
    pub fn new(catalog: &'a Catalog, policy: HookFailurePolicy) -> Self {
        Self { catalog, policy }
    }

    /// Lends `stage` to every enabled hook registered for its point.
    ///
    /// A failing hook aborts the run under [`HookFailurePolicy::Fail`]; under
    /// [`HookFailurePolicy::Warn`] it becomes a warning and the next hook runs.
    pub fn run(
        &self,
        mut stage: HookStage<'_>,
        sheet: Option<&str>,
        state: &mut RunState,
        issues: &mut Vec<Issue>,
    ) -> Result<(), EngineError> {
        let point = stage.point();
        for hook in self.catalog.hooks(point).iter().filter(|h| h.is_enabled()) {
            debug!(%point, origin = hook.origin(), "running hook");
            let logger = ScopedLogger::new(hook.origin());
            let mut ctx = HookContext {
                stage: stage.reborrow(),
                fields: self.catalog.fields(),
                state: &mut *state,
                logger: &logger,
            };
            let Err(source) = guarded(|| hook.call(&mut ctx)) else {
                continue;
            };
            match self.policy {
                HookFailurePolicy::Fail => {
                    error!(%point, origin = hook.origin(), error = %source, "hook failed");
                    return Err(EngineError::Hook {
                        point,
                        origin: hook.origin().to_string(),
                        source,
                    });
                }
                HookFailurePolicy::Warn => {
                    warn!(
                        %point,
                        origin = hook.origin(),
                        error = %source,
                        "hook failed; continuing"
                    );
                    let mut issue = Issue::warning(
                        Stage::Hook,
                        codes::HOOK_FAILED,
                        format!("hook '{}' failed at {point}: {source:#}", hook.origin()),
                    )
                    .with_origin(hook.origin());
                    if let Some(sheet) = sheet {
                        issue = issue.with_sheet(sheet);
                    }
                    issues.push(issue);
                }
            }
        }
        Ok(())
    }
}
