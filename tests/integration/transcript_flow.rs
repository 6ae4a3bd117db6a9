//! Integration tests for debugger transcript parsing
//!
//! Feeds whole gdb-shaped transcripts through `TranscriptParser` and checks the resulting steps.

use super::common::fixtures::{exit_line, preamble, record};
use proptest::prelude::*;
use steptrace::trace::{Kind, StepEvent, Value};
use steptrace::TranscriptParser;

#[test]
fn test_map_local_is_classified() {
    let parser = TranscriptParser::default();
    let m = parser.markers().clone();
    let transcript = [
        preamble(),
        record(&m, 5, "m = std::map with 2 elements = {[a] = 1, [b] = 2}\n", ""),
    ]
    .concat();

    let steps = parser.parse(&transcript);
    assert_eq!(steps.len(), 2);
    let map = &steps[0].locals["m"];
    assert_eq!(map.kind(), Some(Kind::Map));
    let entries = map.entries_of().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries["a"], Value::text("1"));
    assert_eq!(entries["b"], Value::text("2"));

    let json = serde_json::to_value(map).unwrap();
    assert_eq!(json["kind"], "map");
    assert_eq!(json["values"]["a"], "1");
}

#[test]
fn test_bitset_local_is_classified() {
    let parser = TranscriptParser::default();
    let m = parser.markers().clone();
    let transcript = record(&m, 4, "bits = std::bitset<4> = 101\n", "");

    let steps = parser.parse(&transcript);
    let bits = &steps[0].locals["bits"];
    assert_eq!(bits.kind(), Some(Kind::Bitset));
    let json = serde_json::to_value(bits).unwrap();
    assert_eq!(json["values"], serde_json::json!(["0", "1", "0", "1"]));
}

#[test]
fn test_unprinted_variables_carry_over() {
    let parser = TranscriptParser::default();
    let m = parser.markers().clone();
    let transcript = [
        record(&m, 3, "x = 0\ny = 7\n", ""),
        record(&m, 4, "x = 1\n", ""),
        record(&m, 5, "No locals.\n", ""),
    ]
    .concat();

    let steps = parser.parse_session(&transcript).steps;
    assert_eq!(steps.len(), 3);
    assert_eq!(steps[1].locals["x"], Value::text("1"));
    assert_eq!(steps[1].locals["y"], Value::text("7"));
    assert_eq!(steps[2].locals, steps[1].locals);
    assert_eq!(steps[2].line, 5);
}

#[test]
fn test_repeated_state_collapses() {
    let parser = TranscriptParser::default();
    let m = parser.markers().clone();
    let transcript = [
        record(&m, 6, "i = 0\n", ""),
        record(&m, 6, "i = 0\n", ""),
        record(&m, 7, "i = 0\n", ""),
        record(&m, 6, "i = 1\n", ""),
    ]
    .concat();

    let lines: Vec<u32> = parser
        .parse_session(&transcript)
        .steps
        .iter()
        .map(|s| s.line)
        .collect();
    assert_eq!(lines, vec![6, 7, 6]);
}

#[test]
fn test_exit_drops_closing_record_and_keeps_output() {
    let parser = TranscriptParser::default();
    let m = parser.markers().clone();
    let transcript = [
        preamble(),
        record(&m, 3, "x = 0\n", ""),
        record(&m, 4, "x = 2\n", "2\n"),
        record(&m, 5, "x = 2\n", exit_line()),
    ]
    .concat();

    let session = parser.parse_session(&transcript);
    assert!(session.exited);
    assert!(session.signal.is_none());
    assert_eq!(session.steps.len(), 2);
    assert_eq!(session.steps[1].output, "2\n");
}

#[test]
fn test_empty_transcript() {
    let parser = TranscriptParser::default();
    assert!(parser.parse("").is_empty());
    assert!(parser.parse(&preamble()).is_empty());
}

fn arb_records() -> impl Strategy<Value = Vec<(u32, u8)>> {
    prop::collection::vec((1u32..6, 0u8..3), 1..25)
}

proptest! {
    #[test]
    fn prop_end_step_duplicates_last(records in arb_records()) {
        let parser = TranscriptParser::default();
        let m = parser.markers().clone();
        let transcript: String = records
            .iter()
            .map(|(line, x)| record(&m, *line, &format!("x = {x}\n"), ""))
            .collect();

        let steps = parser.parse(&transcript);
        let (end, body) = steps.split_last().unwrap();
        prop_assert_eq!(end.event, StepEvent::End);
        let last = body.last().unwrap();
        prop_assert_eq!(end.line, last.line);
        prop_assert_eq!(&end.locals, &last.locals);
        prop_assert!(body.iter().all(|s| s.event == StepEvent::Line));
    }

    #[test]
    fn prop_consecutive_states_are_distinct(records in arb_records()) {
        let parser = TranscriptParser::default();
        let m = parser.markers().clone();
        let transcript: String = records
            .iter()
            .map(|(line, x)| record(&m, *line, &format!("x = {x}\n"), ""))
            .collect();

        let steps = parser.parse_session(&transcript).steps;
        let mut runs = records.clone();
        runs.dedup();
        prop_assert_eq!(steps.len(), runs.len());
        for pair in steps.windows(2) {
            prop_assert!(!pair[1].same_state(pair[0].line, &pair[0].locals));
        }
    }
}
