//! Python adapter driving a [`ManagedRuntime`].
//!
//! Every run resets the runtime's `sys.stdout` to a fresh buffer, executes the
//! snippet and reads the buffer back, so output from one run never shows up
//! in the next.

use tokio::sync::Mutex;

use crate::errors::{ExecutionError, RuntimeError};
use crate::output::RunResult;
use crate::runtime::ManagedRuntime;

pub const RESET_STDOUT: &str = "import sys\nfrom io import StringIO\nsys.stdout = StringIO()\n";
pub const READ_STDOUT: &str = "sys.stdout.getvalue()";

#[derive(Default)]
pub struct PythonAdapter {
    // reset/run/read must not interleave with another run on the same runtime
    gate: Mutex<()>,
}

impl PythonAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn execute<R>(&self, source: &str, runtime: &R) -> RunResult
    where
        R: ManagedRuntime + ?Sized,
    {
        let _turn = self.gate.lock().await;
        match Self::run(source, runtime).await {
            Ok(output) => RunResult::from_output(output),
            Err(err) => {
                log::debug!("Python run failed: {}", err);
                RunResult::Failure(ExecutionError::from(err).message)
            }
        }
    }

    async fn run<R>(source: &str, runtime: &R) -> Result<String, RuntimeError>
    where
        R: ManagedRuntime + ?Sized,
    {
        runtime.run_source(RESET_STDOUT).await?;
        runtime.run_source_async(source).await?;
        runtime.eval_source(READ_STDOUT).await
    }
}
