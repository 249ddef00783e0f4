//! Synchronous JavaScript adapter backed by an embedded QuickJS context.
//!
//! The context lives as long as the adapter, so globals written by one run are
//! visible to the next. Only `console.log` output is captured; the other
//! console methods always go to the host logger.

use std::cell::RefCell;
use std::rc::Rc;

use log::Level;
use rquickjs::convert::Coerced;
use rquickjs::{Context, Ctx, Function, Object, Runtime, Value};

use crate::errors::{ExecutionError, RunnerError};
use crate::output::RunResult;

const JS_LOG_TARGET: &str = "coderun::js";

/// Builds a `console.log` replacement that formats its arguments, hands the
/// line to `sink` and then forwards to `original` when it is callable.
const LOGGER_FACTORY: &str = r#"(function (sink, original) {
  function render(value) {
    if (typeof value === 'object' && value !== null) {
      try {
        var json = JSON.stringify(value);
        if (json !== undefined) return json;
      } catch (e) {}
    }
    return String(value);
  }
  return function log() {
    var args = Array.prototype.slice.call(arguments);
    sink(args.map(render).join(' '));
    if (typeof original === 'function') {
      original.apply(this, args);
    }
  };
})"#;

pub struct JavaScriptAdapter {
    runtime: Runtime,
    context: Context,
}

impl JavaScriptAdapter {
    pub fn new() -> Result<Self, RunnerError> {
        let runtime = Runtime::new()?;
        let context = Context::full(&runtime)?;
        context.with(|ctx| install_host_console(&ctx).map(|_| ()))?;
        Ok(Self { runtime, context })
    }

    /// Evaluates `source` as a full program and returns what it printed.
    ///
    /// Never fails: anything thrown by the program becomes a
    /// [`RunResult::Failure`].
    pub fn execute(&self, source: &str) -> RunResult {
        let outcome = self.context.with(|ctx| evaluate(&ctx, source));
        self.drain_pending_jobs();
        match outcome {
            Ok(output) => RunResult::from_output(output),
            Err(err) => {
                log::debug!("JavaScript run failed: {}", err);
                RunResult::Failure(err.message)
            }
        }
    }

    // Promise callbacks run after the capture is released, like microtasks
    // queued by a synchronous event handler.
    fn drain_pending_jobs(&self) {
        loop {
            match self.runtime.execute_pending_job() {
                Ok(true) => {}
                Ok(false) => break,
                Err(_) => log::warn!("A pending JavaScript job threw an exception"),
            }
        }
    }
}

fn evaluate(ctx: &Ctx<'_>, source: &str) -> Result<String, ExecutionError> {
    let capture = ConsoleCapture::install(ctx).map_err(|err| thrown_error(ctx, err))?;
    // Indirect eval: `var` and function declarations land on the shared
    // global object, `let`/`const` stay scoped to this run.
    let eval: Function = ctx
        .globals()
        .get("eval")
        .map_err(|err| thrown_error(ctx, err))?;
    match eval.call::<_, Value>((source,)) {
        Ok(_) => Ok(capture.output()),
        Err(err) => Err(thrown_error(ctx, err)),
    }
}

/// Swaps `console.log` for a capturing logger until dropped.
struct ConsoleCapture<'js> {
    console: Object<'js>,
    original: Value<'js>,
    buffer: Rc<RefCell<String>>,
}

impl<'js> ConsoleCapture<'js> {
    fn install(ctx: &Ctx<'js>) -> rquickjs::Result<Self> {
        let console = match ctx.globals().get::<_, Option<Object>>("console")? {
            Some(console) => console,
            None => install_host_console(ctx)?,
        };
        let original: Value = console.get("log")?;

        let buffer = Rc::new(RefCell::new(String::new()));
        let sink = {
            let buffer = Rc::clone(&buffer);
            Function::new(ctx.clone(), move |line: String| {
                let mut buffer = buffer.borrow_mut();
                buffer.push_str(&line);
                buffer.push('\n');
            })?
        };
        let capturing = make_logger(ctx, sink, original.clone())?;
        console.set("log", capturing)?;

        Ok(Self {
            console,
            original,
            buffer,
        })
    }

    fn output(&self) -> String {
        self.buffer.borrow().clone()
    }
}

impl Drop for ConsoleCapture<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.console.set("log", self.original.clone()) {
            log::error!("Failed to restore console.log: {}", err);
        }
    }
}

fn make_logger<'js>(
    ctx: &Ctx<'js>,
    sink: Function<'js>,
    original: Value<'js>,
) -> rquickjs::Result<Function<'js>> {
    let factory: Function = ctx.eval(LOGGER_FACTORY)?;
    factory.call((sink, original))
}

fn install_host_console<'js>(ctx: &Ctx<'js>) -> rquickjs::Result<Object<'js>> {
    let console = Object::new(ctx.clone())?;
    for (name, level) in [
        ("log", Level::Info),
        ("info", Level::Info),
        ("debug", Level::Debug),
        ("warn", Level::Warn),
        ("error", Level::Error),
    ] {
        let sink = Function::new(ctx.clone(), move |line: String| {
            log::log!(target: JS_LOG_TARGET, level, "{}", line);
        })?;
        let undefined = Value::new_undefined(ctx.clone());
        console.set(name, make_logger(ctx, sink, undefined)?)?;
    }
    ctx.globals().set("console", console.clone())?;
    Ok(console)
}

/// Turns an engine error into the message a user should see.
fn thrown_error(ctx: &Ctx<'_>, err: rquickjs::Error) -> ExecutionError {
    if !matches!(err, rquickjs::Error::Exception) {
        return ExecutionError::new(err.to_string());
    }
    let thrown = ctx.catch();
    if let Some(object) = thrown.as_object() {
        if let Ok(Some(message)) = object.get::<_, Option<String>>("message") {
            return ExecutionError::new(message);
        }
    }
    match thrown.get::<Coerced<String>>() {
        Ok(Coerced(text)) => ExecutionError::new(text),
        Err(_) => ExecutionError::new("Uncaught exception"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::Language;
    use crate::output::NO_OUTPUT_SENTINEL;

    fn adapter() -> JavaScriptAdapter {
        JavaScriptAdapter::new().expect("engine should start")
    }

    fn eval_bool(adapter: &JavaScriptAdapter, source: &str) -> bool {
        adapter
            .context
            .with(|ctx| ctx.eval::<bool, _>(source))
            .unwrap()
    }

    #[test]
    fn test_captures_console_log() {
        let result = adapter().execute("console.log(1+1)");
        assert_eq!(result, RunResult::Success("2\n".to_string()));
    }

    #[test]
    fn test_arguments_are_space_joined_in_call_order() {
        let result = adapter().execute(
            "console.log('a', 1, {x: 1}, [1, 2]);\nconsole.log(null, undefined);\nconsole.log();",
        );
        assert_eq!(
            result,
            RunResult::Success("a 1 {\"x\":1} [1,2]\nnull undefined\n\n".to_string())
        );
    }

    #[test]
    fn test_cyclic_object_falls_back_to_string() {
        let result = adapter().execute("var o = {}; o.self = o; console.log(o);");
        assert_eq!(result, RunResult::Success("[object Object]\n".to_string()));
    }

    #[test]
    fn test_no_output_returns_sentinel() {
        let result = adapter().execute("var x = 1 + 1;");
        assert_eq!(result, RunResult::Success(NO_OUTPUT_SENTINEL.to_string()));
    }

    #[test]
    fn test_thrown_error_reports_message_and_restores_console() {
        let adapter = adapter();
        adapter
            .context
            .with(|ctx| ctx.eval::<(), _>("globalThis.__hostLog = console.log;"))
            .unwrap();

        let result = adapter.execute("console.log('partial'); throw new Error(\"boom\")");
        assert_eq!(result, RunResult::Failure("boom".to_string()));
        assert!(eval_bool(&adapter, "console.log === globalThis.__hostLog"));

        let next = adapter.execute("console.log('clean')");
        assert_eq!(next, RunResult::Success("clean\n".to_string()));
    }

    #[test]
    fn test_thrown_non_error_value_is_coerced() {
        let result = adapter().execute("throw 'plain'");
        assert_eq!(result, RunResult::Failure("plain".to_string()));
    }

    #[test]
    fn test_syntax_error_is_a_failure() {
        let result = adapter().execute("console.log(");
        match result {
            RunResult::Failure(message) => assert!(!message.is_empty()),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_saved_capture_does_not_leak_into_later_runs() {
        let adapter = adapter();
        let first = adapter.execute("globalThis.saved = console.log; throw new Error('x')");
        assert_eq!(first, RunResult::Failure("x".to_string()));

        let second = adapter.execute("saved('leak')");
        assert_eq!(second, RunResult::Success(NO_OUTPUT_SENTINEL.to_string()));
    }

    #[test]
    fn test_globals_are_shared_between_runs() {
        let adapter = adapter();
        adapter.execute("var counter = 41;");
        let result = adapter.execute("console.log(counter + 1)");
        assert_eq!(result, RunResult::Success("42\n".to_string()));
    }

    #[test]
    fn test_sample_can_run_twice() {
        let adapter = adapter();
        let expected = RunResult::Success("[5,4,3,2,1]\nFactorial of 5: 120\n".to_string());
        assert_eq!(adapter.execute(Language::JavaScript.sample()), expected);
        assert_eq!(adapter.execute(Language::JavaScript.sample()), expected);
    }

    #[test]
    fn test_promise_callbacks_are_not_captured() {
        let result = adapter()
            .execute("Promise.resolve().then(() => console.log('later')); console.log('now');");
        assert_eq!(result, RunResult::Success("now\n".to_string()));
    }

    #[test]
    fn test_deleted_console_is_reinstalled() {
        let adapter = adapter();
        adapter.execute("delete globalThis.console;");
        let result = adapter.execute("console.log('back')");
        assert_eq!(result, RunResult::Success("back\n".to_string()));
    }
}
