//! Language adapters: run one snippet and report what it printed.
//!
//! Adapters never fail outright. Whatever goes wrong inside user code or the
//! runtime is folded into a [`RunResult::Failure`](crate::output::RunResult).

pub mod javascript;
pub mod python;

pub use javascript::JavaScriptAdapter;
pub use python::PythonAdapter;
