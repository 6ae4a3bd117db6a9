use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::SandboxSettings;
use crate::runner::error::TraceError;
use crate::runner::runner::{Language, TraceRequest, TraceRunner};
use crate::runner::sandbox::{BuildOutcome, RunOutcome, Sandbox};
use crate::trace::Trace;
use crate::transcript::{Markers, SourceHints, TranscriptParser};

pub const SOURCE_FILE: &str = "main.cpp";
pub const SCRIPT_FILE: &str = "session.gdb";
const PROGRAM: &str = "program";
const WORKDIR: &str = "/sandbox";

/// How a sandbox session ended, before the transcript is interpreted.
enum Session {
    CompileFailed(String),
    Finished(RunOutcome),
}

pub struct CppTraceRunner {
    docker_path: PathBuf,
    settings: SandboxSettings,
    parser: TranscriptParser,
}

impl CppTraceRunner {
    pub fn new(settings: SandboxSettings) -> Self {
        let docker_path = Self::find_binary().unwrap_or_else(|| PathBuf::from("docker"));
        Self::with_binary_path(docker_path, settings)
    }

    pub fn with_binary_path(docker_path: PathBuf, settings: SandboxSettings) -> Self {
        let parser = TranscriptParser::new(SOURCE_FILE, &settings.entry_function)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Invalid entry function, falling back to main");
                TranscriptParser::default()
            });
        Self {
            docker_path,
            settings,
            parser,
        }
    }

    fn find_binary() -> Option<PathBuf> {
        which::which("docker").ok()
    }

    async fn run_session(
        &self,
        sandbox: &Sandbox,
        transcript: &mut Vec<u8>,
    ) -> Result<Session, TraceError> {
        match sandbox.build().await? {
            BuildOutcome::CompileFailed(diagnostics) => Ok(Session::CompileFailed(diagnostics)),
            BuildOutcome::Built => {
                let outcome = sandbox.run(&self.settings, transcript).await?;
                Ok(Session::Finished(outcome))
            }
        }
    }

    /// Turn a finished transcript into a trace; `None` means the session was cut short after
    /// `timeout`.
    fn interpret(
        &self,
        transcript: &str,
        source: &str,
        outcome: Option<RunOutcome>,
        timeout: Duration,
    ) -> Trace {
        let hints = SourceHints::from_source(source);
        let session = self.parser.parse_session_with(transcript, &hints);
        let mut trace = Trace::from_steps(session.steps);

        match outcome {
            None => {
                trace.push_error(format!(
                    "Execution timed out after {}s",
                    timeout.as_secs()
                ));
            }
            Some(RunOutcome::Truncated) => {
                trace.push_error("Execution produced too much debugger output");
            }
            Some(RunOutcome::Exited(status)) => {
                if let Some(signal) = session.signal {
                    trace.push_error(signal);
                } else if trace.is_empty() && !status.success() && !session.saw_records {
                    trace.push_error(format!("Execution failed: {}", tail(transcript, 10)));
                } else {
                    trace.finish();
                }
            }
        }
        trace
    }
}

impl Default for CppTraceRunner {
    fn default() -> Self {
        Self::new(SandboxSettings::default())
    }
}

#[async_trait]
impl TraceRunner for CppTraceRunner {
    fn language(&self) -> Language {
        Language::Cpp
    }

    async fn trace(&self, request: TraceRequest) -> Result<Trace, TraceError> {
        let timeout = request.timeout.unwrap_or(self.settings.timeout);
        let script = session_script(&request.code, self.parser.markers());
        let dockerfile = dockerfile(&self.settings);

        let sandbox = Sandbox::provision(
            self.docker_path.clone(),
            &[
                (SOURCE_FILE, request.code.as_str()),
                (SCRIPT_FILE, script.as_str()),
                ("Dockerfile", dockerfile.as_str()),
            ],
        )?;

        let mut transcript = Vec::new();
        let result =
            tokio::time::timeout(timeout, self.run_session(&sandbox, &mut transcript)).await;
        sandbox.release().await;

        let text = String::from_utf8_lossy(&transcript);
        match result {
            Err(_) => {
                tracing::info!(timeout_secs = timeout.as_secs(), "C++ trace timed out");
                Ok(self.interpret(&text, &request.code, None, timeout))
            }
            Ok(Err(e)) => Err(e),
            Ok(Ok(Session::CompileFailed(diagnostics))) => {
                tracing::debug!("Compilation failed");
                Ok(Trace::failed(format!("Compilation failed:\n{diagnostics}")))
            }
            Ok(Ok(Session::Finished(outcome))) => {
                Ok(self.interpret(&text, &request.code, Some(outcome), timeout))
            }
        }
    }

    fn is_available(&self) -> bool {
        self.docker_path.exists() || Self::find_binary().is_some()
    }

    fn binary_path(&self) -> Option<PathBuf> {
        if self.docker_path.exists() {
            Some(self.docker_path.clone())
        } else {
            Self::find_binary()
        }
    }
}

/// gdb command file: a breakpoint on every source line, then snapshot-and-step until the
/// program is gone.
pub fn session_script(source: &str, markers: &Markers) -> String {
    let line_count = source.lines().count().max(1);

    let mut script = String::new();
    script.push_str("set pagination off\n");
    script.push_str("set confirm off\n");
    script.push_str("set print elements 0\n");
    script.push_str("set print repeats unlimited\n");
    script.push_str("set breakpoint pending on\n");
    let _ = writeln!(script, "file {WORKDIR}/{PROGRAM}");
    for line in 1..=line_count {
        let _ = writeln!(script, "break {SOURCE_FILE}:{line}");
    }
    script.push_str("run\n");
    script.push_str("while 1\n");
    let _ = writeln!(script, "  echo {}\\n", markers.begin);
    script.push_str("  frame\n");
    script.push_str("  info locals\n");
    let _ = writeln!(script, "  echo {}\\n", markers.end);
    script.push_str("  step\n");
    script.push_str("end\n");
    script
}

/// Build context: toolchain + gdb layer (cached), then compile the program with debug info.
pub fn dockerfile(settings: &SandboxSettings) -> String {
    format!(
        "FROM {image}\n\
         RUN apt-get update && apt-get install -y --no-install-recommends gdb && rm -rf /var/lib/apt/lists/*\n\
         WORKDIR {WORKDIR}\n\
         COPY {SOURCE_FILE} {SCRIPT_FILE} ./\n\
         RUN g++ {flags} -o {PROGRAM} {SOURCE_FILE}\n\
         CMD [\"sh\", \"-c\", \"gdb -q -batch -nx -x {SCRIPT_FILE} 2>&1\"]\n",
        image = settings.image,
        flags = settings.compiler_flags.join(" "),
    )
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
