//! Mock trace runner for deterministic testing
//!
//! Implements `TraceRunner` by returning a pre-configured trace without spawning any
//! interpreter or container. Requests are captured for later assertions.
//!
//! # Example
//! ```no_run
//! use steptrace::runner::mock::{MockConfig, MockTraceBuilder, MockTraceRunner};
//! use steptrace::runner::Language;
//!
//! let trace = MockTraceBuilder::new()
//!     .step(1, &[("x", 1)])
//!     .step(2, &[("x", 2)])
//!     .finished();
//!
//! let runner = MockTraceRunner::new(Language::Python)
//!     .with_config(MockConfig::default().with_trace(trace));
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::runner::error::TraceError;
use crate::runner::runner::{Language, TraceRequest, TraceRunner};
use crate::trace::{Locals, Step, Trace, Value};

/// Type of error to simulate
#[derive(Clone, Debug)]
pub enum MockTraceError {
    BinaryNotFound(String),
    ProcessFailed { code: Option<i32>, stderr: String },
    Sandbox(String),
    MalformedOutput(String),
}

impl MockTraceError {
    fn into_trace_error(self) -> TraceError {
        match self {
            MockTraceError::BinaryNotFound(msg) => TraceError::BinaryNotFound(msg),
            MockTraceError::ProcessFailed { code, stderr } => TraceError::ProcessFailed {
                binary: PathBuf::from("/mock/tracer"),
                code,
                stderr,
            },
            MockTraceError::Sandbox(msg) => TraceError::Sandbox(msg),
            MockTraceError::MalformedOutput(msg) => TraceError::MalformedOutput(msg),
        }
    }
}

/// Configuration for mock runner behavior
#[derive(Clone, Default)]
pub struct MockConfig {
    /// Trace returned by every call
    pub trace: Trace,
    /// Delay before returning (simulates a slow run)
    pub delay: Duration,
    /// Error to return instead of a trace
    pub error: Option<MockTraceError>,
}

impl MockConfig {
    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.trace = trace;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Configure the mock to fail with an infrastructure error
    pub fn failing(mut self) -> Self {
        self.error = Some(MockTraceError::Sandbox("mock-failure".into()));
        self
    }

    pub fn failing_with(mut self, error: MockTraceError) -> Self {
        self.error = Some(error);
        self
    }
}

pub struct MockTraceRunner {
    language: Language,
    config: MockConfig,
    captured_requests: Arc<Mutex<Vec<TraceRequest>>>,
}

impl MockTraceRunner {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            config: MockConfig::default(),
            captured_requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_config(mut self, config: MockConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_trace(mut self, trace: Trace) -> Self {
        self.config.trace = trace;
        self
    }

    /// Get captured requests for assertions
    pub fn captured_requests(&self) -> Vec<TraceRequest> {
        self.captured_requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<TraceRequest> {
        self.captured_requests.lock().last().cloned()
    }

    pub fn call_count(&self) -> usize {
        self.captured_requests.lock().len()
    }

    pub fn reset(&self) {
        self.captured_requests.lock().clear();
    }
}

#[async_trait]
impl TraceRunner for MockTraceRunner {
    fn language(&self) -> Language {
        self.language
    }

    async fn trace(&self, request: TraceRequest) -> Result<Trace, TraceError> {
        self.captured_requests.lock().push(request);

        if self.config.delay > Duration::ZERO {
            tokio::time::sleep(self.config.delay).await;
        }

        if let Some(error) = self.config.error.clone() {
            return Err(error.into_trace_error());
        }
        Ok(self.config.trace.clone())
    }

    fn is_available(&self) -> bool {
        true
    }

    fn binary_path(&self) -> Option<PathBuf> {
        Some(PathBuf::from("/mock/tracer"))
    }
}

/// Fluent builder for realistic traces
#[derive(Default)]
pub struct MockTraceBuilder {
    steps: Vec<Step>,
}

impl MockTraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a step with integer locals
    pub fn step(mut self, line: u32, locals: &[(&str, i64)]) -> Self {
        let locals: Locals = locals
            .iter()
            .map(|(name, value)| (name.to_string(), Value::from(*value)))
            .collect();
        self.steps.push(Step::new(line, locals));
        self
    }

    /// Attach program output to the most recent step
    pub fn output(mut self, text: &str) -> Self {
        if let Some(last) = self.steps.last_mut() {
            last.output.push_str(text);
        }
        self
    }

    /// A completed run: steps followed by the `end` step
    pub fn finished(self) -> Trace {
        let mut trace = Trace::from_steps(self.steps);
        trace.finish();
        trace
    }

    /// A failed run: steps followed by an error record
    pub fn failed(self, message: &str) -> Trace {
        let mut trace = Trace::from_steps(self.steps);
        trace.push_error(message);
        trace
    }
}
