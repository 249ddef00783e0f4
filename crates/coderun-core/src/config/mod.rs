//! Configuration for the snippet runner
//!
//! Configuration comes from an optional YAML file, with a couple of
//! environment variables layered on top.

pub mod loader;
pub mod types;

pub use loader::*;
pub use types::*;

#[cfg(test)]
mod tests;

use crate::errors::RunnerError;
use std::path::{Path, PathBuf};

/// Load a configuration from a YAML file
pub async fn load_config<P: AsRef<Path>>(path: P) -> Result<RunnerConfig, RunnerError> {
    ConfigLoader::from_file(path).await
}

/// Load `path` if it exists, otherwise fall back to defaults.
pub async fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<RunnerConfig, RunnerError> {
    let path = path.as_ref();
    if tokio::fs::try_exists(path).await? {
        ConfigLoader::from_file(path).await
    } else {
        log::debug!("No config at {}, using defaults", path.display());
        ConfigLoader::defaults()
    }
}

/// `~/.coderun/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".coderun").join("config.yaml"))
}
