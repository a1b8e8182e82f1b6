use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::mapping::TieResolution;

/// What to do when a hook fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookFailurePolicy {
    /// Abort the run.
    #[default]
    Fail,
    /// Record a warning issue and keep going.
    Warn,
}

impl HookFailurePolicy {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Warn => "warn",
        }
    }
}

impl fmt::Display for HookFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HookFailurePolicy {
    type Err = ModelError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "warn" => Ok(Self::Warn),
            _ => Err(ModelError::InvalidSetting {
                name: "hook_failure".to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Resolved engine settings as consumed by the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Extension package to discover.
    pub config_package: String,
    /// Emit unmapped input columns after mapped ones.
    pub append_unmapped_columns: bool,
    /// Prefix for unmapped output column names.
    pub unmapped_prefix: String,
    pub mapping_tie_resolution: TieResolution,
    /// Header candidates are the first N rows of a sheet.
    pub header_scan_rows: usize,
    /// Values per column handed to column detectors as a sample.
    pub sample_size: usize,
    pub hook_failure: HookFailurePolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            config_package: "builtin".to_string(),
            append_unmapped_columns: true,
            unmapped_prefix: "raw_".to_string(),
            mapping_tie_resolution: TieResolution::Leftmost,
            header_scan_rows: 10,
            sample_size: 100,
            hook_failure: HookFailurePolicy::Fail,
        }
    }
}
