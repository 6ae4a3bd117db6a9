use serde::{Deserialize, Serialize};

use crate::trace::value::Locals;

/// Kind of a captured step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepEvent {
    #[default]
    Line,
    End,
}

/// One executed-line snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub line: u32,
    #[serde(default)]
    pub event: StepEvent,
    #[serde(default)]
    pub locals: Locals,
    #[serde(default)]
    pub output: String,
}

impl Step {
    pub fn new(line: u32, locals: Locals) -> Self {
        Self {
            line,
            event: StepEvent::Line,
            locals,
            output: String::new(),
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// Terminal copy of this step.
    pub fn to_end(&self) -> Self {
        Self {
            event: StepEvent::End,
            ..self.clone()
        }
    }

    /// Same line and structurally equal locals.
    pub fn same_state(&self, line: u32, locals: &Locals) -> bool {
        self.line == line && &self.locals == locals
    }
}

/// Target-program failure surfaced inside a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub error: String,
}

/// A trace element: a step or an error record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TraceEntry {
    Error(ErrorRecord),
    Step(Step),
}

/// Ordered sequence of entries for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
    entries: Vec<TraceEntry>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<Step>) -> Self {
        Self {
            entries: steps.into_iter().map(TraceEntry::Step).collect(),
        }
    }

    /// A trace consisting of a single error record.
    pub fn failed(message: impl Into<String>) -> Self {
        let mut trace = Self::new();
        trace.push_error(message);
        trace
    }

    pub fn push_step(&mut self, step: Step) {
        self.entries.push(TraceEntry::Step(step));
    }

    pub fn push_error(&mut self, message: impl Into<String>) {
        self.entries.push(TraceEntry::Error(ErrorRecord {
            error: message.into(),
        }));
    }

    /// Append the `end` duplicate of the last step, if the trace ends in one.
    pub fn finish(&mut self) {
        if let Some(TraceEntry::Step(last)) = self.entries.last() {
            if last.event != StepEvent::End {
                let end = last.to_end();
                self.entries.push(TraceEntry::Step(end));
            }
        }
    }

    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.entries.iter().filter_map(|entry| match entry {
            TraceEntry::Step(step) => Some(step),
            TraceEntry::Error(_) => None,
        })
    }

    pub fn last_step_mut(&mut self) -> Option<&mut Step> {
        self.entries.iter_mut().rev().find_map(|entry| match entry {
            TraceEntry::Step(step) => Some(step),
            TraceEntry::Error(_) => None,
        })
    }

    /// Message of the trailing error record, if any.
    pub fn error(&self) -> Option<&str> {
        match self.entries.last() {
            Some(TraceEntry::Error(record)) => Some(&record.error),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
