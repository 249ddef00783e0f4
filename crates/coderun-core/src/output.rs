//! Run requests, run results and the output slot they are rendered into.

use tokio::sync::watch;

use crate::language::Language;

pub const RUNNING_PLACEHOLDER: &str = "Running...\n";
pub const LOADING_PLACEHOLDER: &str = "Loading Python environment...\n";
pub const NO_OUTPUT_SENTINEL: &str = "Code executed successfully (no output)\n";

/// Snapshot of what to run, taken when the run is triggered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub language: Language,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunResult {
    Success(String),
    Failure(String),
}

impl RunResult {
    /// Maps captured text to a success, substituting the sentinel for empty output.
    pub fn from_output(output: String) -> Self {
        if output.is_empty() {
            RunResult::Success(NO_OUTPUT_SENTINEL.to_string())
        } else {
            RunResult::Success(output)
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunResult::Success(_))
    }

    /// Text shown in the output panel.
    pub fn render(&self) -> String {
        match self {
            RunResult::Success(output) => output.clone(),
            RunResult::Failure(message) => format!("Error: {}\n", message),
        }
    }
}

/// Single text slot with last-write-wins semantics.
///
/// Writers replace the whole contents. Observers can [`subscribe`](Self::subscribe)
/// to follow transitions such as placeholder to result.
#[derive(Debug, Clone)]
pub struct OutputSink {
    slot: watch::Sender<String>,
}

impl OutputSink {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(String::new());
        Self { slot }
    }

    pub fn write(&self, text: impl Into<String>) {
        self.slot.send_replace(text.into());
    }

    pub fn clear(&self) {
        self.write(String::new());
    }

    pub fn contents(&self) -> String {
        self.slot.borrow().clone()
    }

    pub fn render(&self, result: &RunResult) {
        self.write(result.render());
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.slot.subscribe()
    }
}

impl Default for OutputSink {
    fn default() -> Self {
        Self::new()
    }
}
