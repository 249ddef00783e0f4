//! The code runner: language selection, source buffer and run orchestration.

use std::ops::Range;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::adapters::{JavaScriptAdapter, PythonAdapter};
use crate::config::RunnerConfig;
use crate::editor::SourceBuffer;
use crate::errors::{ExecutionError, RunnerError};
use crate::highlight::Highlighter;
use crate::language::Language;
use crate::output::{OutputSink, RunRequest, RunResult, LOADING_PLACEHOLDER, RUNNING_PLACEHOLDER};
use crate::runtime::bootstrap::{BootPhase, Bootstrapper};
use crate::runtime::python_process::PythonLoader;
use crate::runtime::RuntimeLoader;

struct Session {
    language: Language,
    source: SourceBuffer,
}

/// Owns the session state and drives one run at a time into the output sink.
///
/// Runs are not cancelled or sequenced: when two Python runs overlap, whichever
/// finishes last owns the output.
///
/// Not `Send`: the JavaScript context is bound to the thread that created it.
pub struct CodeRunner<L: RuntimeLoader = PythonLoader> {
    session: Mutex<Session>,
    sink: OutputSink,
    javascript: JavaScriptAdapter,
    python: PythonAdapter,
    bootstrapper: Bootstrapper<L>,
    highlighter: Option<Box<dyn Highlighter>>,
}

impl CodeRunner<PythonLoader> {
    pub fn new(config: &RunnerConfig) -> Result<Self, RunnerError> {
        Self::with_loader(PythonLoader::new(), config)
    }
}

impl<L: RuntimeLoader> CodeRunner<L> {
    pub fn with_loader(loader: L, config: &RunnerConfig) -> Result<Self, RunnerError> {
        let language = config.default_language;
        Ok(Self {
            session: Mutex::new(Session {
                language,
                source: SourceBuffer::new(language.sample()),
            }),
            sink: OutputSink::new(),
            javascript: JavaScriptAdapter::new()?,
            python: PythonAdapter::new(),
            bootstrapper: Bootstrapper::new(loader, config.python.clone()),
            highlighter: None,
        })
    }

    pub fn with_highlighter(mut self, highlighter: impl Highlighter + 'static) -> Self {
        self.highlighter = Some(Box::new(highlighter));
        self.rehighlight();
        self
    }

    pub fn language(&self) -> Language {
        self.session().language
    }

    pub fn source(&self) -> String {
        self.session().source.text().to_string()
    }

    pub fn selection(&self) -> Range<usize> {
        self.session().source.selection()
    }

    pub fn output(&self) -> &OutputSink {
        &self.sink
    }

    pub fn boot_phase(&self) -> BootPhase {
        self.bootstrapper.phase()
    }

    pub fn runtime_handle(&self) -> Option<Arc<L::Runtime>> {
        self.bootstrapper.handle()
    }

    /// Switches tabs: loads the language's sample and clears the output.
    /// Runs already in flight are unaffected.
    pub fn select_language(&self, language: Language) {
        {
            let mut session = self.session();
            session.language = language;
            session.source.replace(language.sample());
        }
        log::debug!("Selected language {}", language);
        self.sink.clear();
        self.rehighlight();
    }

    pub fn set_source(&self, text: impl Into<String>) {
        self.session().source.replace(text);
        self.rehighlight();
    }

    pub fn select(&self, range: Range<usize>) {
        self.session().source.select(range);
    }

    /// Tab key in the editor.
    pub fn insert_indent(&self) {
        self.session().source.insert_indent();
        self.rehighlight();
    }

    pub fn paste(&self, text: &str) {
        self.session().source.paste(text);
        self.rehighlight();
    }

    /// Snapshot of what a run started now would execute.
    pub fn request(&self) -> RunRequest {
        let session = self.session();
        RunRequest {
            language: session.language,
            source: session.source.text().to_string(),
        }
    }

    /// Runs the current source in the current language and renders the
    /// result into the output sink.
    pub async fn run_current(&self) -> RunResult {
        let request = self.request();
        self.run(request).await
    }

    pub async fn run(&self, request: RunRequest) -> RunResult {
        log::debug!(
            "Running {} snippet ({} bytes)",
            request.language,
            request.source.len()
        );
        self.sink.write(RUNNING_PLACEHOLDER);

        let result = match request.language {
            Language::JavaScript => self.javascript.execute(&request.source),
            Language::Python => self.run_python(&request.source).await,
        };

        self.sink.render(&result);
        result
    }

    async fn run_python(&self, source: &str) -> RunResult {
        if !self.bootstrapper.is_ready() {
            self.sink.write(LOADING_PLACEHOLDER);
        }
        match self.bootstrapper.ensure_ready().await {
            Ok(runtime) => self.python.execute(source, runtime.as_ref()).await,
            Err(err) => RunResult::Failure(ExecutionError::from(err).message),
        }
    }

    fn rehighlight(&self) {
        if let Some(highlighter) = &self.highlighter {
            let (language, source) = {
                let session = self.session();
                (session.language, session.source.text().to_string())
            };
            highlighter.highlight(language, &source);
        }
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
