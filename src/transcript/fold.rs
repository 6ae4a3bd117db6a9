//! State carry and step coalescing.

use crate::trace::{Locals, Step};

/// Variables not printed by a record keep their previous value.
pub fn overlay(previous: &Locals, extracted: Locals) -> Locals {
    let mut next = previous.clone();
    next.extend(extracted);
    next
}

/// Accumulates steps, skipping records that repeat the last emitted state.
#[derive(Debug, Default)]
pub struct StepFold {
    steps: Vec<Step>,
    state: Locals,
    pending_output: String,
}

impl StepFold {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program output produced before the next emitted step.
    pub fn add_output(&mut self, output: &str) {
        self.pending_output.push_str(output);
    }

    /// Fold one record into the current state. Returns whether a step was emitted.
    pub fn record(&mut self, line: u32, extracted: Locals) -> bool {
        self.state = overlay(&self.state, extracted);

        if let Some(last) = self.steps.last() {
            if last.same_state(line, &self.state) {
                return false;
            }
        }

        let output = std::mem::take(&mut self.pending_output);
        self.steps
            .push(Step::new(line, self.state.clone()).with_output(output));
        true
    }

    /// Remove the last emitted step, keeping its output for the step before it.
    pub fn drop_last(&mut self) {
        if let Some(last) = self.steps.pop() {
            let mut output = last.output;
            output.push_str(&self.pending_output);
            self.pending_output = output;
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Finished steps; unattributed output goes to the last one.
    pub fn into_steps(mut self) -> Vec<Step> {
        if !self.pending_output.is_empty() {
            if let Some(last) = self.steps.last_mut() {
                last.output.push_str(&self.pending_output);
            }
        }
        self.steps
    }
}
