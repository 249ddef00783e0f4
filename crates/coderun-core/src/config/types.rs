//! Configuration type definitions
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working runner that evaluates JavaScript in-process and looks for
//! `python3`/`python` on `PATH` the first time Python is run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::errors::RunnerError;
use crate::language::Language;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RunnerConfig {
    #[serde(default)]
    pub default_language: Language,
    #[serde(default)]
    pub python: RuntimeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How the managed Python runtime is located and started.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Interpreter name or path; `python3` then `python` on `PATH` when unset.
    #[serde(default)]
    pub interpreter: Option<PathBuf>,
    /// Extra module directory exposed to snippets through `PYTHONPATH`.
    #[serde(default)]
    pub asset_base: Option<PathBuf>,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

impl RunnerConfig {
    pub fn validate(&self) -> Result<(), RunnerError> {
        if let Some(interpreter) = &self.python.interpreter {
            if interpreter.as_os_str().is_empty() {
                return Err(RunnerError::ConfigError(
                    "python.interpreter cannot be empty".to_string(),
                ));
            }
        }

        if let Some(asset_base) = &self.python.asset_base {
            if !asset_base.is_dir() {
                return Err(RunnerError::ConfigError(format!(
                    "python.asset_base '{}' is not a directory",
                    asset_base.display()
                )));
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(RunnerError::ConfigError(format!(
                "Unknown log level '{}', expected one of: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        Ok(())
    }
}
