//! Python runtime hosted in a long-lived interpreter child process.
//!
//! The interpreter runs a small driver script (`driver.py`) that keeps one
//! `__main__` namespace alive for the whole session and answers requests over
//! stdin/stdout, one JSON object per line:
//!
//! ```text
//! -> {"id": 3, "op": "exec", "code": "print('hi')", "allow_await": true}
//! <- {"id": 3, "ok": true, "value": null}
//! -> {"id": 4, "op": "eval", "code": "sys.stdout.getvalue()", "allow_await": false}
//! <- {"id": 4, "ok": true, "value": "hi\n"}
//! ```
//!
//! Failed requests answer `{"ok": false, "kind": "ZeroDivisionError",
//! "error": "ZeroDivisionError: division by zero"}`. Before serving requests
//! the driver announces itself with `{"ready": true, "version": "3.11.7"}`.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;

use super::{ManagedRuntime, RuntimeLoader};
use crate::config::RuntimeConfig;
use crate::errors::{EnvironmentLoadError, RuntimeError};

const DRIVER_SOURCE: &str = include_str!("driver.py");
const DEFAULT_INTERPRETERS: [&str; 2] = ["python3", "python"];
const MIN_MINOR_VERSION: u32 = 8;
const PYTHON_LOG_TARGET: &str = "coderun::python";

#[derive(Debug, Serialize)]
struct Request<'a> {
    id: u64,
    op: &'a str,
    code: &'a str,
    allow_await: bool,
}

#[derive(Debug, Deserialize)]
struct Response {
    id: Option<u64>,
    ok: bool,
    #[serde(default)]
    value: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Handshake {
    ready: bool,
    version: String,
}

/// A verified interpreter, ready to be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpreter {
    pub path: PathBuf,
    pub version: String,
}

/// Locates a Python interpreter and starts the driver process.
#[derive(Debug, Default, Clone)]
pub struct PythonLoader;

impl PythonLoader {
    pub fn new() -> Self {
        Self
    }

    fn resolve_interpreter(config: &RuntimeConfig) -> Result<PathBuf, EnvironmentLoadError> {
        if let Some(interpreter) = &config.interpreter {
            return which::which(interpreter).map_err(|_| {
                EnvironmentLoadError::InterpreterNotFound {
                    candidates: interpreter.display().to_string(),
                }
            });
        }

        DEFAULT_INTERPRETERS
            .iter()
            .find_map(|candidate| which::which(candidate).ok())
            .ok_or_else(|| EnvironmentLoadError::InterpreterNotFound {
                candidates: DEFAULT_INTERPRETERS.join(", "),
            })
    }
}

#[async_trait]
impl RuntimeLoader for PythonLoader {
    type Script = Interpreter;
    type Runtime = PythonProcess;

    async fn load_script(
        &self,
        config: &RuntimeConfig,
    ) -> Result<Interpreter, EnvironmentLoadError> {
        let path = Self::resolve_interpreter(config)?;
        let location = path.display().to_string();
        log::debug!("Verifying Python interpreter at {}", location);

        let output = Command::new(&path)
            .arg("--version")
            .output()
            .await
            .map_err(|e| EnvironmentLoadError::LoaderFailed {
                location: location.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(EnvironmentLoadError::LoaderFailed {
                location,
                reason: format!(
                    "--version exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }

        // Python 2 prints its version on stderr.
        let banner = if output.stdout.is_empty() {
            String::from_utf8_lossy(&output.stderr).trim().to_string()
        } else {
            String::from_utf8_lossy(&output.stdout).trim().to_string()
        };
        let version = parse_version(&banner).ok_or_else(|| EnvironmentLoadError::LoaderFailed {
            location: location.clone(),
            reason: format!("unrecognized version banner '{}'", banner),
        })?;
        if !is_supported(&version) {
            return Err(EnvironmentLoadError::LoaderFailed {
                location,
                reason: format!("Python 3.{}+ is required, found {}", MIN_MINOR_VERSION, version),
            });
        }

        Ok(Interpreter { path, version })
    }

    async fn initialize(
        &self,
        script: Interpreter,
        config: &RuntimeConfig,
    ) -> Result<PythonProcess, EnvironmentLoadError> {
        let mut command = Command::new(&script.path);
        command
            .arg("-u")
            .arg("-c")
            .arg(DRIVER_SOURCE)
            .env("PYTHONIOENCODING", "utf-8")
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(asset_base) = &config.asset_base {
            command.env("PYTHONPATH", asset_base);
        }

        log::info!(
            "Starting Python {} runtime from {}",
            script.version,
            script.path.display()
        );
        let mut child = command
            .spawn()
            .map_err(|e| EnvironmentLoadError::InitializationFailed(e.to_string()))?;

        let stdin = child.stdin.take().ok_or_else(|| {
            EnvironmentLoadError::InitializationFailed("child stdin unavailable".to_string())
        })?;
        let stdout = child.stdout.take().ok_or_else(|| {
            EnvironmentLoadError::InitializationFailed("child stdout unavailable".to_string())
        })?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log::debug!(target: PYTHON_LOG_TARGET, "{}", line);
                }
            });
        }

        let mut stdout = BufReader::new(stdout).lines();
        let line = stdout
            .next_line()
            .await
            .map_err(|e| EnvironmentLoadError::InitializationFailed(e.to_string()))?
            .ok_or_else(|| {
                EnvironmentLoadError::InitializationFailed(
                    "Python runtime exited before completing its handshake".to_string(),
                )
            })?;
        let handshake: Handshake = serde_json::from_str(&line).map_err(|e| {
            EnvironmentLoadError::InitializationFailed(format!(
                "invalid handshake '{}': {}",
                line, e
            ))
        })?;
        if !handshake.ready {
            return Err(EnvironmentLoadError::InitializationFailed(
                "Python runtime reported it is not ready".to_string(),
            ));
        }

        Ok(PythonProcess {
            version: handshake.version,
            next_id: AtomicU64::new(1),
            channel: Mutex::new(Channel {
                _child: child,
                stdin,
                stdout,
            }),
        })
    }
}

struct Channel {
    _child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
}

/// Handle to a running driver process. Requests are served one at a time.
pub struct PythonProcess {
    version: String,
    next_id: AtomicU64,
    channel: Mutex<Channel>,
}

impl PythonProcess {
    async fn request(
        &self,
        op: &str,
        code: &str,
        allow_await: bool,
    ) -> Result<Option<String>, RuntimeError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut payload = serde_json::to_string(&Request {
            id,
            op,
            code,
            allow_await,
        })?;
        payload.push('\n');

        let mut channel = self.channel.lock().await;
        channel
            .stdin
            .write_all(payload.as_bytes())
            .await
            .map_err(broken_pipe_as_exit)?;
        channel.stdin.flush().await.map_err(broken_pipe_as_exit)?;

        // A request dropped after its payload was written still gets answered;
        // those replies carry older ids and are discarded here.
        let response = loop {
            let line = channel
                .stdout
                .next_line()
                .await?
                .ok_or(RuntimeError::Exited)?;
            let response: Response = serde_json::from_str(&line)?;
            match response.id {
                Some(reply) if reply == id => break response,
                Some(reply) if reply < id => {
                    log::debug!("Discarding reply to abandoned request {}", reply);
                }
                other => {
                    return Err(RuntimeError::Protocol(format!(
                        "expected reply to request {}, got {:?}",
                        id, other
                    )));
                }
            }
        };

        if response.ok {
            Ok(response.value)
        } else {
            Err(RuntimeError::Raised {
                kind: response.kind.unwrap_or_else(|| "Exception".to_string()),
                message: response
                    .error
                    .unwrap_or_else(|| "unknown Python error".to_string()),
            })
        }
    }
}

#[async_trait]
impl ManagedRuntime for PythonProcess {
    async fn run_source(&self, code: &str) -> Result<(), RuntimeError> {
        self.request("exec", code, false).await.map(|_| ())
    }

    async fn run_source_async(&self, code: &str) -> Result<(), RuntimeError> {
        self.request("exec", code, true).await.map(|_| ())
    }

    async fn eval_source(&self, expr: &str) -> Result<String, RuntimeError> {
        Ok(self.request("eval", expr, false).await?.unwrap_or_default())
    }

    fn version(&self) -> &str {
        &self.version
    }
}

fn broken_pipe_as_exit(err: std::io::Error) -> RuntimeError {
    if err.kind() == std::io::ErrorKind::BrokenPipe {
        RuntimeError::Exited
    } else {
        err.into()
    }
}

/// Extracts `X.Y.Z` from a banner such as `Python 3.11.7`.
fn parse_version(banner: &str) -> Option<String> {
    let version = banner.strip_prefix("Python ")?.split_whitespace().next()?;
    version
        .split('.')
        .next()
        .and_then(|major| major.parse::<u32>().ok())
        .map(|_| version.to_string())
}

fn is_supported(version: &str) -> bool {
    let mut parts = version.split('.').map(|p| p.parse::<u32>().ok());
    match (parts.next().flatten(), parts.next().flatten()) {
        (Some(major), Some(minor)) => major > 3 || (major == 3 && minor >= MIN_MINOR_VERSION),
        _ => false,
    }
}
