//! Fixtures shared by the integration tests

use std::sync::Arc;

use steptrace::runner::mock::MockTraceRunner;
use steptrace::transcript::Markers;
use steptrace::util::{Tool, ToolAvailability, ToolPaths};
use steptrace::{Config, Language, TraceCore, TraceRunner};

/// One snapshot block as the session script prints it.
pub fn record(markers: &Markers, line: u32, locals: &str, trailing: &str) -> String {
    format!(
        "{}\n#0  main () at main.cpp:{line}\n{line}\t  // source\n{locals}{}\n{trailing}",
        markers.begin, markers.end
    )
}

/// Banner gdb prints before the first breakpoint is hit.
pub fn preamble() -> String {
    "Reading symbols from /sandbox/program...\nBreakpoint 1 at 0x1149: file main.cpp, line 3.\n"
        .to_string()
}

pub fn exit_line() -> &'static str {
    "[Inferior 1 (process 42) exited normally]\n"
}

/// A core whose runners are mocks, returned alongside the mocks for assertions.
pub fn mock_core(
    python: MockTraceRunner,
    cpp: MockTraceRunner,
) -> (TraceCore, Arc<MockTraceRunner>, Arc<MockTraceRunner>) {
    let python = Arc::new(python);
    let cpp = Arc::new(cpp);
    let runners: Vec<Arc<dyn TraceRunner>> = vec![python.clone(), cpp.clone()];
    let core = TraceCore::with_runners(Config::default(), ToolAvailability::default(), runners);
    (core, python, cpp)
}

pub fn default_mocks() -> (TraceCore, Arc<MockTraceRunner>, Arc<MockTraceRunner>) {
    mock_core(
        MockTraceRunner::new(Language::Python),
        MockTraceRunner::new(Language::Cpp),
    )
}

/// Returns true when a python interpreter is on PATH; tests needing one return early otherwise.
pub fn python_available() -> bool {
    let tools = ToolAvailability::detect(&ToolPaths::default());
    if tools.is_available(Tool::Python) {
        true
    } else {
        eprintln!("python not found, skipping");
        false
    }
}
