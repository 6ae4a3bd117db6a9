//! End-to-end tests for the instrumented Python path
//!
//! These run the embedded harness under a real interpreter and skip when none is installed.

use super::common::fixtures::python_available;
use serde_json::json;
use steptrace::trace::{Kind, StepEvent, Value};
use steptrace::util::{ToolAvailability, ToolPaths};
use steptrace::{Config, TraceCore};

fn real_core() -> TraceCore {
    let config = Config::default();
    let tools = ToolAvailability::detect(&ToolPaths::default());
    TraceCore::new(config, tools)
}

#[tokio::test]
async fn test_assignments_trace_as_json() {
    if !python_available() {
        return;
    }
    let trace = real_core()
        .trace(Some("x = 1\nx = 2"), Some("python"))
        .await
        .expect("trace succeeds");

    let json = serde_json::to_value(&trace).unwrap();
    assert_eq!(
        json,
        json!([
            {"line": 1, "event": "line", "locals": {"x": 1}, "output": ""},
            {"line": 2, "event": "line", "locals": {"x": 2}, "output": ""},
            {"line": 2, "event": "end", "locals": {"x": 2}, "output": ""}
        ])
    );
}

#[tokio::test]
async fn test_uncaught_exception_is_error_record() {
    if !python_available() {
        return;
    }
    let trace = real_core()
        .trace(Some("raise Exception(\"boom\")"), Some("python"))
        .await
        .expect("trace succeeds");

    assert_eq!(serde_json::to_value(&trace).unwrap(), json!([{"error": "boom"}]));
}

#[tokio::test]
async fn test_printed_output_is_attributed() {
    if !python_available() {
        return;
    }
    let trace = real_core()
        .trace(Some("print('hi')\nx = 1"), Some("py"))
        .await
        .expect("trace succeeds");

    let printed: String = trace
        .steps()
        .filter(|s| s.event == StepEvent::Line)
        .map(|s| s.output.as_str())
        .collect();
    assert_eq!(printed, "hi\n");
    assert!(trace.error().is_none());
}

#[tokio::test]
async fn test_self_referencing_list_is_circular() {
    if !python_available() {
        return;
    }
    let trace = real_core()
        .trace(Some("a = [1, 2]\na.append(a)\nb = 0"), Some("python"))
        .await
        .expect("trace succeeds");

    let last = trace
        .steps()
        .filter(|s| s.event == StepEvent::Line)
        .last()
        .expect("at least one step");
    let list = &last.locals["a"];
    assert_eq!(list.kind(), Some(Kind::List));
    let values = list.elements_of().unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0], Value::from(1));
    assert_eq!(values[2].kind(), Some(Kind::CircularRef));
}

#[tokio::test]
async fn test_dict_keys_are_stringified() {
    if !python_available() {
        return;
    }
    let trace = real_core()
        .trace(Some("d = {'b': 2, 1: 'one'}\npass"), Some("python"))
        .await
        .expect("trace succeeds");

    let first = trace.steps().next().expect("a step");
    let entries = first.locals["d"].entries_of().expect("dict entries");
    assert_eq!(entries["b"], Value::from(2));
    assert_eq!(entries["1"], Value::from("one"));
}
