//! In-memory runtime and loader used by unit tests.
//!
//! `FakeRuntime` understands a tiny line-based script instead of Python:
//! `print:<text>` appends `<text>\n` to its captured stdout and
//! `raise:<message>` fails the run. The stdout reset snippet clears the
//! capture, which is what the output-reset tests rely on.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::adapters::python::{READ_STDOUT, RESET_STDOUT};
use crate::config::RuntimeConfig;
use crate::errors::{EnvironmentLoadError, RuntimeError};
use crate::runtime::{ManagedRuntime, RuntimeLoader};

#[derive(Debug, Default)]
pub struct FakeRuntime {
    stdout: Mutex<String>,
}

impl FakeRuntime {
    fn interpret(&self, code: &str) -> Result<(), RuntimeError> {
        for line in code.lines() {
            if let Some(text) = line.strip_prefix("print:") {
                let mut stdout = self.stdout.lock().unwrap();
                stdout.push_str(text);
                stdout.push('\n');
            } else if let Some(message) = line.strip_prefix("raise:") {
                return Err(RuntimeError::Raised {
                    kind: "Exception".to_string(),
                    message: message.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ManagedRuntime for FakeRuntime {
    async fn run_source(&self, code: &str) -> Result<(), RuntimeError> {
        if code == RESET_STDOUT {
            self.stdout.lock().unwrap().clear();
            return Ok(());
        }
        self.interpret(code)
    }

    async fn run_source_async(&self, code: &str) -> Result<(), RuntimeError> {
        tokio::task::yield_now().await;
        self.interpret(code)
    }

    async fn eval_source(&self, expr: &str) -> Result<String, RuntimeError> {
        assert_eq!(expr, READ_STDOUT);
        Ok(self.stdout.lock().unwrap().clone())
    }

    fn version(&self) -> &str {
        "fake-1.0"
    }
}

#[derive(Clone, Default)]
pub struct LoaderCounters {
    loads: Arc<AtomicUsize>,
    initializations: Arc<AtomicUsize>,
}

impl LoaderCounters {
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn initializations(&self) -> usize {
        self.initializations.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct FakeLoader {
    counters: LoaderCounters,
    failures_left: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl FakeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `count` script loads fail.
    pub fn failing_loads(self, count: usize) -> Self {
        self.failures_left.store(count, Ordering::SeqCst);
        self
    }

    /// Holds every script load until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn counters(&self) -> LoaderCounters {
        self.counters.clone()
    }
}

#[async_trait]
impl RuntimeLoader for FakeLoader {
    type Script = ();
    type Runtime = FakeRuntime;

    async fn load_script(&self, _config: &RuntimeConfig) -> Result<(), EnvironmentLoadError> {
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        match &self.gate {
            Some(gate) => gate.notified().await,
            None => tokio::task::yield_now().await,
        }
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(EnvironmentLoadError::LoaderFailed {
                location: "fake://loader".to_string(),
                reason: "network unreachable".to_string(),
            });
        }
        Ok(())
    }

    async fn initialize(
        &self,
        _script: (),
        _config: &RuntimeConfig,
    ) -> Result<FakeRuntime, EnvironmentLoadError> {
        self.counters.initializations.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;
        Ok(FakeRuntime::default())
    }
}
