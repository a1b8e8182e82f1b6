//! Engine settings resolution.
//!
//! Precedence, highest first:
//!
//! 1. Explicit overrides (CLI flags, embedding code)
//! 2. Environment variables prefixed `TABNORM_`
//! 3. An env file in dotenv syntax
//! 4. A TOML defaults file
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tabnorm_model::{EngineSettings, HookFailurePolicy, TieResolution};
use tracing::{debug, warn};

use crate::error::SettingsError;

pub const ENV_PREFIX: &str = "TABNORM_";

/// Individually optional settings; `Some` values win over every other source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SettingsOverrides {
    pub config_package: Option<String>,
    pub append_unmapped_columns: Option<bool>,
    pub unmapped_prefix: Option<String>,
    pub mapping_tie_resolution: Option<TieResolution>,
    pub header_scan_rows: Option<usize>,
    pub sample_size: Option<usize>,
    pub hook_failure: Option<HookFailurePolicy>,
}

impl SettingsOverrides {
    fn apply(&self, settings: &mut EngineSettings) {
        if let Some(value) = &self.config_package {
            settings.config_package.clone_from(value);
        }
        if let Some(value) = self.append_unmapped_columns {
            settings.append_unmapped_columns = value;
        }
        if let Some(value) = &self.unmapped_prefix {
            settings.unmapped_prefix.clone_from(value);
        }
        if let Some(value) = self.mapping_tie_resolution {
            settings.mapping_tie_resolution = value;
        }
        if let Some(value) = self.header_scan_rows {
            settings.header_scan_rows = value;
        }
        if let Some(value) = self.sample_size {
            settings.sample_size = value;
        }
        if let Some(value) = self.hook_failure {
            settings.hook_failure = value;
        }
    }
}

#[derive(Debug, Clone, Default)]
enum EnvSource {
    #[default]
    Process,
    Vars(Vec<(String, String)>),
    Disabled,
}

/// Builder resolving [`EngineSettings`] from layered sources.
#[derive(Debug, Clone, Default)]
pub struct SettingsLoader {
    defaults_file: Option<PathBuf>,
    env_file: Option<PathBuf>,
    env: EnvSource,
    overrides: SettingsOverrides,
}

impl SettingsLoader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn defaults_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.defaults_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Reads these variables instead of the process environment.
    #[must_use]
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = EnvSource::Vars(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    #[must_use]
    pub fn without_env(mut self) -> Self {
        self.env = EnvSource::Disabled;
        self
    }

    #[must_use]
    pub fn overrides(mut self, overrides: SettingsOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn load(&self) -> Result<EngineSettings, SettingsError> {
        let mut settings = match &self.defaults_file {
            Some(path) => read_defaults_file(path)?,
            None => EngineSettings::default(),
        };

        if let Some(path) = &self.env_file {
            let vars = read_env_file(path)?;
            apply_env(&mut settings, vars, &path.display().to_string())?;
        }

        match &self.env {
            EnvSource::Process => {
                let vars = std::env::vars_os().filter_map(|(key, value)| {
                    Some((key.into_string().ok()?, value.into_string().ok()?))
                });
                apply_env(&mut settings, vars, "environment")?;
            }
            EnvSource::Vars(vars) => apply_env(&mut settings, vars.iter().cloned(), "environment")?,
            EnvSource::Disabled => {}
        }

        self.overrides.apply(&mut settings);
        debug!(?settings, "settings resolved");
        Ok(settings)
    }
}

fn read_defaults_file(path: &Path) -> Result<EngineSettings, SettingsError> {
    let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| SettingsError::Toml {
        path: path.to_path_buf(),
        source,
    })
}

fn read_env_file(path: &Path) -> Result<Vec<(String, String)>, SettingsError> {
    let to_error = |source| SettingsError::EnvFile {
        path: path.to_path_buf(),
        source,
    };
    dotenvy::from_path_iter(path)
        .map_err(to_error)?
        .map(|item| item.map_err(to_error))
        .collect()
}

fn apply_env(
    settings: &mut EngineSettings,
    vars: impl IntoIterator<Item = (String, String)>,
    origin: &str,
) -> Result<(), SettingsError> {
    for (key, value) in vars {
        let Some(name) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let name = name.to_ascii_lowercase();
        let invalid = || SettingsError::InvalidValue {
            name: name.clone(),
            value: value.clone(),
            origin: origin.to_string(),
        };
        match name.as_str() {
            "config_package" => settings.config_package = value.trim().to_string(),
            "append_unmapped_columns" => {
                settings.append_unmapped_columns = parse_bool(&value).ok_or_else(invalid)?;
            }
            "unmapped_prefix" => settings.unmapped_prefix.clone_from(&value),
            "mapping_tie_resolution" => {
                settings.mapping_tie_resolution = value.trim().parse().map_err(|_| invalid())?;
            }
            "header_scan_rows" => {
                settings.header_scan_rows = value.trim().parse().map_err(|_| invalid())?;
            }
            "sample_size" => settings.sample_size = value.trim().parse().map_err(|_| invalid())?,
            "hook_failure" => {
                settings.hook_failure = value.trim().parse().map_err(|_| invalid())?;
            }
            // Logging variables belong to the binary.
            "log" | "log_format" | "log_file" => {}
            _ => warn!(key = %key, origin, "ignoring unknown setting"),
        }
    }
    Ok(())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
