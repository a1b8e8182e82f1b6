use std::fmt::Display;

/// Logger handle given to user callables, tagged with the callable's origin.
#[derive(Debug, Clone)]
pub struct ScopedLogger {
    origin: String,
}

impl ScopedLogger {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn trace(&self, message: impl Display) {
        tracing::trace!(origin = %self.origin, "{message}");
    }

    pub fn debug(&self, message: impl Display) {
        tracing::debug!(origin = %self.origin, "{message}");
    }

    pub fn info(&self, message: impl Display) {
        tracing::info!(origin = %self.origin, "{message}");
    }

    pub fn warn(&self, message: impl Display) {
        tracing::warn!(origin = %self.origin, "{message}");
    }

    pub fn error(&self, message: impl Display) {
        tracing::error!(origin = %self.origin, "{message}");
    }
}
