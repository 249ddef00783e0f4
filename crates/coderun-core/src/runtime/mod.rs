//! Managed runtimes for languages that cannot be evaluated in-process.
//!
//! A [`RuntimeLoader`] knows how to fetch and start a runtime; the
//! [`Bootstrapper`](bootstrap::Bootstrapper) makes sure that happens once per
//! session and hands out the resulting [`ManagedRuntime`] handle.

use async_trait::async_trait;

use crate::config::RuntimeConfig;
use crate::errors::{EnvironmentLoadError, RuntimeError};

pub mod bootstrap;
pub mod python_process;

/// Handle to a started runtime. Source snippets share one namespace.
#[async_trait]
pub trait ManagedRuntime: Send + Sync {
    /// Executes a setup snippet.
    async fn run_source(&self, code: &str) -> Result<(), RuntimeError>;

    /// Executes user source, allowing top-level `await`.
    async fn run_source_async(&self, code: &str) -> Result<(), RuntimeError>;

    /// Evaluates an expression and returns its string form.
    async fn eval_source(&self, expr: &str) -> Result<String, RuntimeError>;

    fn version(&self) -> &str;
}

/// Two-step bootstrap: fetch the loader resource, then initialize from it.
#[async_trait]
pub trait RuntimeLoader: Send + Sync + 'static {
    type Script: Send + 'static;
    type Runtime: ManagedRuntime + 'static;

    async fn load_script(&self, config: &RuntimeConfig)
        -> Result<Self::Script, EnvironmentLoadError>;

    async fn initialize(
        &self,
        script: Self::Script,
        config: &RuntimeConfig,
    ) -> Result<Self::Runtime, EnvironmentLoadError>;
}
