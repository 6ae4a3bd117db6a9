//! Request dispatch shared by the HTTP server and the CLI.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::config::Config;
use crate::runner::{
    CppTraceRunner, Language, PythonTraceRunner, TraceError, TraceRequest, TraceRunner,
};
use crate::trace::Trace;
use crate::util::{Tool, ToolAvailability};

/// Language entry reported by `GET /api/languages`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub available: bool,
    /// Interpreter or docker binary backing the runner
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binary: Option<PathBuf>,
}

/// Owns the configuration, tool availability and one runner per language.
pub struct TraceCore {
    config: Config,
    tools: ToolAvailability,
    runners: HashMap<Language, Arc<dyn TraceRunner>>,
}

impl TraceCore {
    /// Create runners for every language, using configured tool paths when available.
    pub fn new(config: Config, tools: ToolAvailability) -> Self {
        let python: Arc<dyn TraceRunner> = match tools.path(Tool::Python) {
            Some(path) => Arc::new(PythonTraceRunner::with_binary_path(
                path.clone(),
                config.python.clone(),
            )),
            None => Arc::new(PythonTraceRunner::new(config.python.clone())),
        };
        let cpp: Arc<dyn TraceRunner> = match tools.path(Tool::Docker) {
            Some(path) => Arc::new(CppTraceRunner::with_binary_path(
                path.clone(),
                config.sandbox.clone(),
            )),
            None => Arc::new(CppTraceRunner::new(config.sandbox.clone())),
        };

        Self::with_runners(config, tools, vec![python, cpp])
    }

    /// Create a core with explicit runners (one per language; later entries win).
    pub fn with_runners(
        config: Config,
        tools: ToolAvailability,
        runners: Vec<Arc<dyn TraceRunner>>,
    ) -> Self {
        let runners = runners
            .into_iter()
            .map(|runner| (runner.language(), runner))
            .collect();
        Self {
            config,
            tools,
            runners,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tools(&self) -> &ToolAvailability {
        &self.tools
    }

    pub fn runner(&self, language: Language) -> Option<&Arc<dyn TraceRunner>> {
        self.runners.get(&language)
    }

    /// Supported languages with the availability of their backing tool.
    pub fn languages(&self) -> Vec<LanguageInfo> {
        Language::ALL
            .iter()
            .filter_map(|language| {
                let runner = self.runners.get(language)?;
                Some(LanguageInfo {
                    id: language.as_str(),
                    name: language.display_name(),
                    available: runner.is_available(),
                    binary: runner.binary_path(),
                })
            })
            .collect()
    }

    /// Validate a raw request and run it.
    ///
    /// Missing or empty code and unknown languages are rejected before any runner is invoked.
    pub async fn trace(
        &self,
        code: Option<&str>,
        language: Option<&str>,
    ) -> Result<Trace, TraceError> {
        let code = match code {
            Some(code) if !code.is_empty() => code,
            _ => return Err(TraceError::EmptyCode),
        };
        let raw_language = language.unwrap_or_default();
        let language = Language::parse(raw_language)
            .ok_or_else(|| TraceError::UnsupportedLanguage(raw_language.to_string()))?;
        let runner = self
            .runners
            .get(&language)
            .ok_or_else(|| TraceError::UnsupportedLanguage(raw_language.to_string()))?;

        tracing::info!(language = %language.as_str(), bytes = code.len(), "Tracing program");
        let trace = runner.trace(TraceRequest::new(code, language)).await?;
        tracing::debug!(entries = trace.len(), error = ?trace.error(), "Trace complete");
        Ok(trace)
    }
}
