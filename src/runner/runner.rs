use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::runner::error::TraceError;
use crate::trace::Trace;

/// Source language of a traced program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 2] = [Language::Python, Language::Cpp];

    /// Wire identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Cpp => "cpp",
        }
    }

    /// Parse a wire identifier. Unknown identifiers are rejected, never defaulted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "python" | "python3" | "py" => Some(Language::Python),
            "cpp" | "c++" | "cxx" => Some(Language::Cpp),
            _ => None,
        }
    }

    /// Guess the language from a source file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "py" => Some(Language::Python),
            "cpp" | "cc" | "cxx" | "c++" => Some(Language::Cpp),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Cpp => "C++",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A single request to trace a program
#[derive(Debug, Clone)]
pub struct TraceRequest {
    pub code: String,
    pub language: Language,
    /// Overrides the runner's configured wall-clock limit
    pub timeout: Option<Duration>,
}

impl TraceRequest {
    pub fn new(code: impl Into<String>, language: Language) -> Self {
        Self {
            code: code.into(),
            language,
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Trait for backends that execute a program and capture its trace
#[async_trait]
pub trait TraceRunner: Send + Sync {
    /// Language this runner handles
    fn language(&self) -> Language;

    /// Run the program to completion (or failure) and return its trace
    async fn trace(&self, request: TraceRequest) -> Result<Trace, TraceError>;

    /// Check if the backing tool is available
    fn is_available(&self) -> bool;

    /// Get the path to the backing tool
    fn binary_path(&self) -> Option<PathBuf>;
}
