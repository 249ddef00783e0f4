//! Error types for the snippet runner
//!
//! Failures fall into two groups. Construction and configuration problems are
//! returned to the caller as [`RunnerError`]. Everything that happens during a
//! run (user code raising, the Python environment failing to load, the
//! interpreter process dying) is caught at the adapter boundary and rendered
//! into the output panel, so those types mostly travel as messages.

use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("I/O error: {0}")]
    IoError(String),
    #[error("JavaScript engine error: {0}")]
    EngineError(String),
}

impl From<std::io::Error> for RunnerError {
    fn from(err: std::io::Error) -> Self {
        RunnerError::IoError(err.to_string())
    }
}

impl From<rquickjs::Error> for RunnerError {
    fn from(err: rquickjs::Error) -> Self {
        RunnerError::EngineError(err.to_string())
    }
}

/// Raised by user-submitted source in either language.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The managed runtime could not be located, started or initialized.
///
/// Cloneable because every caller waiting on the same in-flight bootstrap
/// receives the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentLoadError {
    #[error("No Python interpreter found (tried: {candidates})")]
    InterpreterNotFound { candidates: String },
    #[error("Failed to load runtime from '{location}': {reason}")]
    LoaderFailed { location: String, reason: String },
    #[error("Runtime initialization failed: {0}")]
    InitializationFailed(String),
}

/// Failures reported by a managed runtime while serving a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("{message}")]
    Raised { kind: String, message: String },
    #[error("Runtime protocol error: {0}")]
    Protocol(String),
    #[error("Python runtime exited unexpectedly")]
    Exited,
    #[error("I/O error talking to runtime: {0}")]
    Io(String),
}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RuntimeError {
    fn from(err: serde_json::Error) -> Self {
        RuntimeError::Protocol(err.to_string())
    }
}

impl From<RuntimeError> for ExecutionError {
    fn from(err: RuntimeError) -> Self {
        ExecutionError::new(err.to_string())
    }
}

impl From<EnvironmentLoadError> for ExecutionError {
    fn from(err: EnvironmentLoadError) -> Self {
        ExecutionError::new(err.to_string())
    }
}
