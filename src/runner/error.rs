use std::path::PathBuf;

use thiserror::Error;

/// Errors that prevent a trackable trace from being produced.
///
/// Failures of the traced program itself (exceptions, compiler diagnostics, timeouts) are not
/// errors at this level; they travel inside the trace as error records.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("No code provided.")]
    EmptyCode,
    #[error("Unsupported language specified.")]
    UnsupportedLanguage(String),
    #[error("{0} binary not found")]
    BinaryNotFound(String),
    #[error("Failed to start {binary}: {source}")]
    ProcessSpawnFailed {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to capture {0} of child process")]
    StdioCaptureFailed(&'static str),
    #[error("{binary} exited with status {code:?}: {stderr}")]
    ProcessFailed {
        binary: PathBuf,
        code: Option<i32>,
        stderr: String,
    },
    #[error("Sandbox provisioning failed: {0}")]
    Sandbox(String),
    #[error("Malformed tracer output: {0}")]
    MalformedOutput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TraceError {
    /// Request-shape errors are rejected before any process is started.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            TraceError::EmptyCode | TraceError::UnsupportedLanguage(_)
        )
    }
}
