//! Parser for sandboxed debugger transcripts.
//!
//! The session script makes gdb print a marker-delimited snapshot (`frame` + `info locals`)
//! before every `step`. This module turns that transcript into steps: records are split on the
//! markers, the current line and locals are extracted, values are classified, unprinted
//! variables carry over, and repeated states collapse.

pub mod classify;
pub mod fold;
pub mod hints;
pub mod locals;
pub mod segment;

use regex::Regex;

pub use classify::classify;
pub use fold::{overlay, StepFold};
pub use hints::SourceHints;
pub use segment::Markers;

use crate::trace::Step;

/// Steps recovered from a transcript, plus how the session ended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSession {
    pub steps: Vec<Step>,
    /// The inferior process exited
    pub exited: bool,
    /// Fatal signal reported by gdb
    pub signal: Option<String>,
    /// At least one snapshot marker was printed
    pub saw_records: bool,
}

#[derive(Debug, Clone)]
pub struct TranscriptParser {
    markers: Markers,
    location: Regex,
    entry: Regex,
}

impl TranscriptParser {
    pub const DEFAULT_SOURCE_FILE: &'static str = "main.cpp";
    pub const DEFAULT_ENTRY_FUNCTION: &'static str = "main";

    pub fn new(source_file: &str, entry_function: &str) -> Result<Self, regex::Error> {
        let location = Regex::new(&format!(
            r"\bat\s+(?:\S*/)?{}:(\d+)",
            regex::escape(source_file)
        ))?;
        let entry = Regex::new(&format!(
            r"(?m)^#0\s+(?:0x[0-9a-fA-F]+\s+in\s+)?{}\s*\(",
            regex::escape(entry_function)
        ))?;
        Ok(Self {
            markers: Markers::default(),
            location,
            entry,
        })
    }

    pub fn with_markers(mut self, markers: Markers) -> Self {
        self.markers = markers;
        self
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    /// Parse a transcript into steps, with the `end` duplicate appended when any step exists.
    pub fn parse(&self, transcript: &str) -> Vec<Step> {
        let mut steps = self.parse_session(transcript).steps;
        if let Some(last) = steps.last() {
            let end = last.to_end();
            steps.push(end);
        }
        steps
    }

    /// Parse a transcript without appending the `end` step.
    pub fn parse_session(&self, transcript: &str) -> ParsedSession {
        self.parse_session_with(transcript, &SourceHints::default())
    }

    /// Parse a transcript, completing locals with facts read from the traced source.
    pub fn parse_session_with(&self, transcript: &str, hints: &SourceHints) -> ParsedSession {
        let records = segment::split_records(transcript, &self.markers);
        let saw_records = !records.is_empty();
        let start = records
            .iter()
            .position(|record| self.entry.is_match(record.frame))
            .unwrap_or(records.len());

        let mut fold = StepFold::new();
        let mut carried = "";
        for record in &records[start..] {
            fold.add_output(&segment::program_output(carried));
            carried = record.trailing;

            let Some(line) = self.line_of(record.frame) else {
                tracing::trace!("Skipping record outside the traced source");
                continue;
            };
            let mut extracted = locals::extract_locals(self.locals_block(record.frame));
            hints.apply(&mut extracted);
            fold.record(line, extracted);
        }
        fold.add_output(&segment::program_output(carried));

        let exited = segment::inferior_exited(transcript);
        if exited {
            fold.drop_last();
        }

        tracing::debug!(
            records = records.len(),
            skipped = start,
            steps = fold.len(),
            exited,
            "Parsed debugger transcript"
        );

        ParsedSession {
            steps: fold.into_steps(),
            exited,
            signal: segment::fatal_signal(transcript),
            saw_records,
        }
    }

    fn line_of(&self, frame: &str) -> Option<u32> {
        self.location
            .captures(frame)
            .and_then(|c| c[1].parse::<u32>().ok())
    }

    /// Region after the frame summary line.
    fn locals_block<'a>(&self, frame: &'a str) -> &'a str {
        match self.location.find(frame) {
            Some(m) => {
                let rest = &frame[m.end()..];
                match rest.find('\n') {
                    Some(i) => &rest[i + 1..],
                    None => "",
                }
            }
            None => frame,
        }
    }
}

impl Default for TranscriptParser {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SOURCE_FILE, Self::DEFAULT_ENTRY_FUNCTION)
            .expect("default transcript patterns are valid")
    }
}
