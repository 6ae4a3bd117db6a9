//! Turns the tracer harness event stream into a trace.
//!
//! The harness reports a line just before it runs. A step records the state *after* a line
//! ran, so each frame keeps its pending line until the frame reports the next line or returns.
//! The module frame's return is the appended `pass` epilogue and never produces a step.

use std::collections::HashMap;

use crate::runner::stream::{FrameEvent, HarnessEvent};
use crate::serialize::serialize_locals;
use crate::trace::{Step, Trace};

/// What the consumer should do after feeding an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Continue,
    /// The harness reported a terminal event
    Finished,
    /// The step cap was hit; the process should be stopped
    LimitReached,
}

pub struct StepAssembler {
    trace: Trace,
    pending: HashMap<u64, u32>,
    carried_output: String,
    max_steps: usize,
    steps: usize,
    done: bool,
}

impl StepAssembler {
    pub fn new(max_steps: usize) -> Self {
        Self {
            trace: Trace::new(),
            pending: HashMap::new(),
            carried_output: String::new(),
            max_steps,
            steps: 0,
            done: false,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn push(&mut self, event: HarnessEvent) -> Progress {
        if self.done {
            return Progress::Finished;
        }

        match event {
            HarnessEvent::Line(frame) => {
                self.carried_output.push_str(&frame.output);
                if let Some(previous) = self.pending.insert(frame.frame, frame.line) {
                    return self.emit(previous, &frame);
                }
                Progress::Continue
            }
            HarnessEvent::Return(frame) => {
                self.carried_output.push_str(&frame.output);
                match self.pending.remove(&frame.frame) {
                    Some(previous) if !frame.module => self.emit(previous, &frame),
                    _ => Progress::Continue,
                }
            }
            HarnessEvent::Error { message, output } => {
                self.carried_output.push_str(&output);
                self.flush_output();
                self.trace.push_error(message);
                self.done = true;
                Progress::Finished
            }
            HarnessEvent::Finished { output } => {
                self.carried_output.push_str(&output);
                self.flush_output();
                self.trace.finish();
                self.done = true;
                Progress::Finished
            }
            HarnessEvent::Unknown => Progress::Continue,
        }
    }

    /// Stop early with an error record, keeping every step captured so far.
    pub fn abort(mut self, message: impl Into<String>) -> Trace {
        if !self.done {
            self.flush_output();
            self.trace.push_error(message);
        }
        self.trace
    }

    pub fn into_trace(self) -> Trace {
        self.trace
    }

    fn emit(&mut self, line: u32, frame: &FrameEvent) -> Progress {
        let locals = serialize_locals(&frame.locals, &frame.heap);
        let output = std::mem::take(&mut self.carried_output);
        self.trace.push_step(Step::new(line, locals).with_output(output));
        self.steps += 1;

        if self.steps >= self.max_steps {
            self.trace
                .push_error(format!("Step limit of {} exceeded", self.max_steps));
            self.done = true;
            return Progress::LimitReached;
        }
        Progress::Continue
    }

    /// Output produced after the last step belongs to that step.
    fn flush_output(&mut self) {
        if self.carried_output.is_empty() {
            return;
        }
        let output = std::mem::take(&mut self.carried_output);
        if let Some(last) = self.trace.last_step_mut() {
            last.output.push_str(&output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::{HeapSnapshot, ObjectRef};
    use crate::trace::{Primitive, StepEvent, TraceEntry, Value};
    use std::collections::BTreeMap;

    fn frame(id: u64, module: bool, line: u32, locals: &[(&str, i64)]) -> FrameEvent {
        FrameEvent {
            frame: id,
            module,
            line,
            locals: locals
                .iter()
                .map(|(k, v)| (k.to_string(), ObjectRef::Primitive(Primitive::Number((*v).into()))))
                .collect::<BTreeMap<_, _>>(),
            heap: HeapSnapshot::new(),
            output: String::new(),
        }
    }

    fn line(id: u64, module: bool, line: u32, locals: &[(&str, i64)]) -> HarnessEvent {
        HarnessEvent::Line(frame(id, module, line, locals))
    }

    #[test]
    fn test_two_assignments_then_finish() {
        // x = 1 / x = 2 / pass
        let mut assembler = StepAssembler::new(100);
        assembler.push(line(1, true, 1, &[]));
        assembler.push(line(1, true, 2, &[("x", 1)]));
        assembler.push(line(1, true, 3, &[("x", 2)]));
        assembler.push(HarnessEvent::Return(frame(1, true, 3, &[("x", 2)])));
        let progress = assembler.push(HarnessEvent::Finished {
            output: String::new(),
        });
        assert_eq!(progress, Progress::Finished);

        let trace = assembler.into_trace();
        let steps: Vec<_> = trace.steps().collect();
        assert_eq!(steps.len(), 3);
        assert_eq!(steps[0].line, 1);
        assert_eq!(steps[0].locals["x"], Value::from(1));
        assert_eq!(steps[1].line, 2);
        assert_eq!(steps[1].locals["x"], Value::from(2));
        assert_eq!(steps[2].event, StepEvent::End);
        assert_eq!(steps[2].locals["x"], Value::from(2));
    }

    #[test]
    fn test_raise_on_first_line_yields_only_error() {
        let mut assembler = StepAssembler::new(100);
        assembler.push(line(1, true, 1, &[]));
        assembler.push(HarnessEvent::Return(frame(1, true, 1, &[])));
        assembler.push(HarnessEvent::Error {
            message: "boom".into(),
            output: String::new(),
        });

        let trace = assembler.into_trace();
        assert_eq!(
            trace.entries(),
            &[TraceEntry::Error(crate::trace::ErrorRecord {
                error: "boom".into()
            })]
        );
    }

    #[test]
    fn test_function_frames_are_tracked_separately() {
        // 1: def f(a):
        // 2:     b = a + 1
        // 3:     return b
        // 4: y = f(1)
        let mut assembler = StepAssembler::new(100);
        assembler.push(line(1, true, 1, &[]));
        assembler.push(line(1, true, 4, &[]));
        assembler.push(line(2, false, 2, &[("a", 1)]));
        assembler.push(line(2, false, 3, &[("a", 1), ("b", 2)]));
        assembler.push(HarnessEvent::Return(frame(2, false, 3, &[("a", 1), ("b", 2)])));
        assembler.push(line(1, true, 5, &[("y", 2)]));
        assembler.push(HarnessEvent::Finished {
            output: String::new(),
        });

        let lines: Vec<u32> = assembler.into_trace().steps().map(|s| s.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4, 4]);
    }

    #[test]
    fn test_output_is_attributed_to_next_step() {
        let mut assembler = StepAssembler::new(100);
        assembler.push(line(1, true, 1, &[]));
        let mut second = frame(1, true, 2, &[]);
        second.output = "hello\n".into();
        assembler.push(HarnessEvent::Line(second));
        assembler.push(HarnessEvent::Finished {
            output: "bye\n".into(),
        });

        let trace = assembler.into_trace();
        let steps: Vec<_> = trace.steps().collect();
        assert_eq!(steps[0].output, "hello\nbye\n");
        assert_eq!(steps[1].event, StepEvent::End);
    }

    #[test]
    fn test_step_limit() {
        let mut assembler = StepAssembler::new(2);
        assembler.push(line(1, true, 1, &[]));
        assembler.push(line(1, true, 2, &[]));
        assert_eq!(assembler.push(line(1, true, 1, &[])), Progress::LimitReached);
        assert!(assembler.is_done());
        assert_eq!(assembler.push(line(1, true, 2, &[])), Progress::Finished);

        let trace = assembler.into_trace();
        assert_eq!(trace.steps().count(), 2);
        assert_eq!(trace.error(), Some("Step limit of 2 exceeded"));
    }

    #[test]
    fn test_abort_keeps_prefix() {
        let mut assembler = StepAssembler::new(100);
        assembler.push(line(1, true, 1, &[]));
        assembler.push(line(1, true, 2, &[("i", 0)]));
        let trace = assembler.abort("Execution timed out after 1s");
        assert_eq!(trace.steps().count(), 1);
        assert_eq!(trace.error(), Some("Execution timed out after 1s"));
    }
}
