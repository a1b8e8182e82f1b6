//! Guarded invocation of user callables.

use std::panic::{AssertUnwindSafe, catch_unwind};

/// Runs a user callable, turning a panic into an error.
///
/// User code is opaque; a panic inside a detector must be reported the same
/// way as a returned error.
pub fn guarded<R>(call: impl FnOnce() -> anyhow::Result<R>) -> anyhow::Result<R> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic payload".to_string());
            Err(anyhow::anyhow!("panicked: {message}"))
        }
    }
}
