use std::io::Write;
use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::mpsc;

use crate::config::PythonSettings;
use crate::runner::assembler::{Progress, StepAssembler};
use crate::runner::error::TraceError;
use crate::runner::runner::{Language, TraceRequest, TraceRunner};
use crate::runner::stream::{HarnessEvent, JsonlStreamParser};
use crate::trace::Trace;

/// Harness executed by the interpreter; reads the program on stdin, writes JSONL events.
pub const TRACER_SCRIPT: &str = include_str!("tracer.py");

/// Trailing no-op statement whose `line` event captures the state after the last user line.
const EPILOGUE: &str = "\npass";

pub struct PythonTraceRunner {
    binary_path: PathBuf,
    settings: PythonSettings,
}

impl PythonTraceRunner {
    pub fn new(settings: PythonSettings) -> Self {
        Self {
            binary_path: Self::find_binary().unwrap_or_else(|| PathBuf::from("python3")),
            settings,
        }
    }

    pub fn with_binary_path(binary_path: PathBuf, settings: PythonSettings) -> Self {
        Self {
            binary_path,
            settings,
        }
    }

    fn find_binary() -> Option<PathBuf> {
        which::which("python3")
            .or_else(|_| which::which("python"))
            .ok()
    }

    fn build_command(&self, script: &std::path::Path) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.arg("-u").arg(script);
        cmd.env("PYTHONIOENCODING", "utf-8");
        cmd.env("PYTHONDONTWRITEBYTECODE", "1");
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        cmd
    }

    fn write_script() -> Result<tempfile::NamedTempFile, TraceError> {
        let mut script = tempfile::Builder::new()
            .prefix("steptrace-tracer-")
            .suffix(".py")
            .tempfile()?;
        script.write_all(TRACER_SCRIPT.as_bytes())?;
        script.flush()?;
        Ok(script)
    }
}

impl Default for PythonTraceRunner {
    fn default() -> Self {
        Self::new(PythonSettings::default())
    }
}

#[async_trait]
impl TraceRunner for PythonTraceRunner {
    fn language(&self) -> Language {
        Language::Python
    }

    async fn trace(&self, request: TraceRequest) -> Result<Trace, TraceError> {
        // Removed when dropped, on every return path
        let script = Self::write_script()?;
        let timeout = request.timeout.unwrap_or(self.settings.timeout);

        let mut child = self
            .build_command(script.path())
            .spawn()
            .map_err(|source| TraceError::ProcessSpawnFailed {
                binary: self.binary_path.clone(),
                source,
            })?;

        tracing::debug!(
            pid = child.id(),
            bytes = request.code.len(),
            "Started python tracer"
        );

        // The harness reads all of stdin before producing output.
        let mut stdin = child
            .stdin
            .take()
            .ok_or(TraceError::StdioCaptureFailed("stdin"))?;
        stdin.write_all(request.code.as_bytes()).await?;
        stdin.write_all(EPILOGUE.as_bytes()).await?;
        drop(stdin);

        let stdout = child
            .stdout
            .take()
            .ok_or(TraceError::StdioCaptureFailed("stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or(TraceError::StdioCaptureFailed("stderr"))?;

        let stderr_handle = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let (tx, mut rx) = mpsc::channel::<HarnessEvent>(256);
        let parse_handle =
            tokio::spawn(async move { JsonlStreamParser::parse_stream(stdout, tx).await });

        let mut assembler = StepAssembler::new(self.settings.max_steps);
        let outcome = tokio::time::timeout(timeout, async {
            while let Some(event) = rx.recv().await {
                match assembler.push(event) {
                    Progress::Continue => {}
                    progress => return Some(progress),
                }
            }
            None
        })
        .await;
        drop(rx);

        let trace = match outcome {
            Err(_) => {
                tracing::info!(timeout_secs = timeout.as_secs(), "Python trace timed out");
                let _ = child.kill().await;
                let _ = parse_handle.await;
                assembler.abort(format!(
                    "Execution timed out after {}s",
                    timeout.as_secs()
                ))
            }
            Ok(Some(Progress::LimitReached)) => {
                tracing::info!(max_steps = self.settings.max_steps, "Python step limit reached");
                let _ = child.kill().await;
                let _ = parse_handle.await;
                assembler.into_trace()
            }
            Ok(_) => {
                match parse_handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "Tracer output stream failed");
                        let _ = child.kill().await;
                        return Err(e);
                    }
                    Err(e) => tracing::warn!(error = %e, "Tracer output task failed"),
                }
                let status = child.wait().await?;
                if !status.success() {
                    let stderr = stderr_handle.await.unwrap_or_default();
                    return Err(TraceError::ProcessFailed {
                        binary: self.binary_path.clone(),
                        code: status.code(),
                        stderr: stderr.trim().to_string(),
                    });
                }
                if !assembler.is_done() {
                    return Err(TraceError::MalformedOutput(
                        "tracer exited without a final event".into(),
                    ));
                }
                assembler.into_trace()
            }
        };

        Ok(trace)
    }

    fn is_available(&self) -> bool {
        self.binary_path.exists() || Self::find_binary().is_some()
    }

    fn binary_path(&self) -> Option<PathBuf> {
        if self.binary_path.exists() {
            Some(self.binary_path.clone())
        } else {
            Self::find_binary()
        }
    }
}
