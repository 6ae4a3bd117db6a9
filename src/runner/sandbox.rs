//! Ephemeral Docker sandbox for one debugger session.
//!
//! A [`Sandbox`] owns a scratch directory, an image tag and a container name, all unique per
//! request. [`Sandbox::release`] removes the container and image; if a sandbox is dropped
//! without being released, the same cleanup runs synchronously.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use uuid::Uuid;

use crate::config::SandboxSettings;
use crate::runner::error::TraceError;

const TAG_PREFIX: &str = "steptrace-sandbox-";

/// Result of `docker build`.
#[derive(Debug)]
pub enum BuildOutcome {
    Built,
    /// The compiler rejected the program; carries its diagnostics
    CompileFailed(String),
}

/// Result of `docker run`; the transcript is written into the caller's buffer.
#[derive(Debug, Clone, Copy)]
pub enum RunOutcome {
    Exited(ExitStatus),
    /// The transcript limit was reached and the run was stopped
    Truncated,
}

pub struct Sandbox {
    dir: TempDir,
    docker: PathBuf,
    tag: String,
    container: String,
    released: bool,
}

impl Sandbox {
    /// Create the scratch directory and write the build context into it.
    pub fn provision(docker: PathBuf, files: &[(&str, &str)]) -> Result<Self, TraceError> {
        let dir = tempfile::Builder::new()
            .prefix("steptrace-cpp-")
            .tempdir()
            .map_err(|e| TraceError::Sandbox(format!("failed to create scratch directory: {e}")))?;

        for (name, contents) in files {
            std::fs::write(dir.path().join(name), contents).map_err(|e| {
                TraceError::Sandbox(format!("failed to write {name}: {e}"))
            })?;
        }

        let id = Uuid::new_v4().simple().to_string();
        let sandbox = Self {
            dir,
            docker,
            tag: format!("{TAG_PREFIX}{id}"),
            container: format!("{TAG_PREFIX}{id}-run"),
            released: false,
        };
        tracing::debug!(
            dir = %sandbox.dir.path().display(),
            tag = %sandbox.tag,
            "Provisioned sandbox"
        );
        Ok(sandbox)
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.docker);
        cmd.stdin(Stdio::null());
        cmd.kill_on_drop(true);
        cmd
    }

    /// Build the image. The Dockerfile compiles the program, so compiler errors surface here.
    pub async fn build(&self) -> Result<BuildOutcome, TraceError> {
        let output = self
            .command()
            .env("DOCKER_BUILDKIT", "1")
            .arg("build")
            .arg("--progress=plain")
            .arg("--tag")
            .arg(&self.tag)
            .arg(self.dir.path())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| TraceError::ProcessSpawnFailed {
                binary: self.docker.clone(),
                source,
            })?;

        if output.status.success() {
            return Ok(BuildOutcome::Built);
        }

        let log = format!(
            "{}{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        match compiler_diagnostics(&log) {
            Some(diagnostics) => Ok(BuildOutcome::CompileFailed(diagnostics)),
            None => Err(TraceError::Sandbox(format!(
                "docker build failed: {}",
                tail(&log, 20)
            ))),
        }
    }

    /// Run the session container, appending its combined output to `transcript`.
    ///
    /// Output is buffered as it arrives so a caller-side timeout keeps the partial transcript.
    pub async fn run(
        &self,
        settings: &SandboxSettings,
        transcript: &mut Vec<u8>,
    ) -> Result<RunOutcome, TraceError> {
        let mut child = self
            .command()
            .arg("run")
            .arg("--rm")
            .arg("--name")
            .arg(&self.container)
            .arg("--network")
            .arg("none")
            .arg("--memory")
            .arg(&settings.memory)
            .arg("--pids-limit")
            .arg(settings.pids_limit.to_string())
            .arg("--cap-add")
            .arg("SYS_PTRACE")
            .arg(&self.tag)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| TraceError::ProcessSpawnFailed {
                binary: self.docker.clone(),
                source,
            })?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or(TraceError::StdioCaptureFailed("stdout"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or(TraceError::StdioCaptureFailed("stderr"))?;
        let stderr_handle = tokio::spawn(async move {
            let mut buf = Vec::new();
            let _ = stderr.read_to_end(&mut buf).await;
            buf
        });

        let mut chunk = [0u8; 8192];
        loop {
            let n = stdout.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            transcript.extend_from_slice(&chunk[..n]);
            if transcript.len() >= settings.max_transcript_bytes {
                tracing::info!(
                    bytes = transcript.len(),
                    "Transcript limit reached, stopping sandbox run"
                );
                let _ = child.kill().await;
                return Ok(RunOutcome::Truncated);
            }
        }

        let status = child.wait().await?;
        if let Ok(stderr) = stderr_handle.await {
            transcript.extend_from_slice(&stderr);
        }
        Ok(RunOutcome::Exited(status))
    }

    /// Remove the container and image. The scratch directory goes with `self`.
    pub async fn release(mut self) {
        self.released = true;
        for args in self.cleanup_args() {
            match self
                .command()
                .args(&args)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
            {
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, command = ?args, "Sandbox cleanup failed"),
            }
        }
        tracing::debug!(tag = %self.tag, "Released sandbox");
    }

    fn cleanup_args(&self) -> [Vec<String>; 2] {
        [
            vec!["rm".into(), "-f".into(), self.container.clone()],
            vec!["rmi".into(), "-f".into(), self.tag.clone()],
        ]
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        for args in self.cleanup_args() {
            let _ = std::process::Command::new(&self.docker)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
        }
    }
}

/// Compiler diagnostics from a build log, when the build failed in the compiler.
pub fn compiler_diagnostics(log: &str) -> Option<String> {
    let lines: Vec<&str> = log
        .lines()
        .map(strip_build_prefix)
        .filter(|line| line.starts_with("main.cpp:"))
        .collect();

    if lines.iter().any(|line| line.contains("error:")) {
        Some(lines.join("\n"))
    } else {
        None
    }
}

/// BuildKit plain progress prefixes each line with `#<step> <seconds> `.
fn strip_build_prefix(line: &str) -> &str {
    let Some(rest) = line.strip_prefix('#') else {
        return line;
    };
    let mut parts = rest.splitn(3, ' ');
    let step = parts.next().unwrap_or_default();
    let seconds = parts.next().unwrap_or_default();
    match parts.next() {
        Some(text)
            if step.chars().all(|c| c.is_ascii_digit())
                && seconds.parse::<f64>().is_ok() =>
        {
            text
        }
        _ => line,
    }
}

fn tail(text: &str, lines: usize) -> String {
    let all: Vec<&str> = text.lines().collect();
    all[all.len().saturating_sub(lines)..].join("\n")
}
