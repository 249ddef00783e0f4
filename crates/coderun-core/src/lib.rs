//! Core library for running small JavaScript and Python snippets.
//!
//! The runner keeps one editable source buffer and one output slot. Running a
//! snippet captures everything it prints and renders either that output or the
//! error it raised. The two languages are hosted differently:
//!
//! - **JavaScript** is evaluated synchronously inside an embedded QuickJS
//!   context, with `console.log` captured for the duration of the call
//! - **Python** runs inside a managed interpreter process that is started
//!   lazily on the first Python run and reused for the rest of the session
//!
//! [`CodeRunner`] ties the pieces together and is the entry point most callers
//! want.

pub mod adapters;
pub mod config;
pub mod controller;
pub mod editor;
pub mod errors;
pub mod highlight;
pub mod language;
pub mod output;
pub mod runtime;

pub use adapters::{JavaScriptAdapter, PythonAdapter};
pub use config::*;
pub use controller::CodeRunner;
pub use editor::SourceBuffer;
pub use errors::{EnvironmentLoadError, ExecutionError, RunnerError, RuntimeError};
pub use highlight::Highlighter;
pub use language::Language;
pub use output::{OutputSink, RunRequest, RunResult};
pub use runtime::bootstrap::{BootPhase, Bootstrapper};
pub use runtime::python_process::{PythonLoader, PythonProcess};
pub use runtime::{ManagedRuntime, RuntimeLoader};

#[cfg(test)]
pub mod test_utils;
