//! Configuration loader for YAML files and environment overrides

use std::env;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::config::types::*;
use crate::errors::RunnerError;
use crate::language::Language;

pub const PYTHON_ENV: &str = "CODERUN_PYTHON";
pub const DEFAULT_LANGUAGE_ENV: &str = "CODERUN_DEFAULT_LANGUAGE";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<RunnerConfig, RunnerError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await.map_err(|e| {
            RunnerError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_str(&content, path.parent())
    }

    /// Load configuration from a YAML string. Relative paths are resolved
    /// against `base_dir` when given.
    pub fn from_str(content: &str, base_dir: Option<&Path>) -> Result<RunnerConfig, RunnerError> {
        let mut config: RunnerConfig = if content.trim().is_empty() {
            RunnerConfig::default()
        } else {
            serde_yaml::from_str(content).map_err(|e| {
                RunnerError::ConfigError(format!("Failed to parse YAML config: {}", e))
            })?
        };

        if let Some(base_dir) = base_dir {
            Self::resolve_paths(&mut config, base_dir);
        }
        Self::apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(config)
    }

    /// Defaults plus environment overrides, for running without a file.
    pub fn defaults() -> Result<RunnerConfig, RunnerError> {
        Self::from_str("", None)
    }

    fn resolve_paths(config: &mut RunnerConfig, base_dir: &Path) {
        if let Some(asset_base) = &config.python.asset_base {
            if asset_base.is_relative() {
                config.python.asset_base = Some(base_dir.join(asset_base));
            }
        }
        // Bare names like `python3.12` are looked up on PATH, not next to the file.
        if let Some(interpreter) = &config.python.interpreter {
            if interpreter.is_relative() && interpreter.components().count() > 1 {
                config.python.interpreter = Some(base_dir.join(interpreter));
            }
        }
    }

    fn apply_env_overrides(config: &mut RunnerConfig) -> Result<(), RunnerError> {
        if let Ok(interpreter) = env::var(PYTHON_ENV) {
            if !interpreter.is_empty() {
                log::debug!("Using Python interpreter from {}", PYTHON_ENV);
                config.python.interpreter = Some(PathBuf::from(interpreter));
            }
        }

        if let Ok(language) = env::var(DEFAULT_LANGUAGE_ENV) {
            if !language.is_empty() {
                config.default_language = language.parse::<Language>()?;
            }
        }

        Ok(())
    }
}
