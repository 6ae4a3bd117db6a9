//! Splitting a debugger transcript into per-step records.

use std::sync::LazyLock;

use regex::Regex;

/// Echoed by the session script around each snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers {
    pub begin: String,
    pub end: String,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            begin: "<<<STEPTRACE_STEP_BEGIN>>>".into(),
            end: "<<<STEPTRACE_STEP_END>>>".into(),
        }
    }
}

/// One snapshot: the text between the markers, plus what the following `step` printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    pub frame: &'a str,
    pub trailing: &'a str,
}

/// Split on the begin marker. Text before the first marker is session preamble and is dropped;
/// a record cut off before its end marker keeps everything it has.
pub fn split_records<'a>(transcript: &'a str, markers: &Markers) -> Vec<RawRecord<'a>> {
    transcript
        .split(markers.begin.as_str())
        .skip(1)
        .map(|chunk| match chunk.split_once(markers.end.as_str()) {
            Some((frame, trailing)) => RawRecord { frame, trailing },
            None => RawRecord {
                frame: chunk,
                trailing: "",
            },
        })
        .collect()
}

static INFERIOR_EXITED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[Inferior \d+ \(process \d+\) exited").expect("valid exit regex")
});
static SIGNAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Program (?:received|terminated with) signal (\w+), ([^\r\n]+)")
        .expect("valid signal regex")
});

/// Lines gdb prints while stepping that are not program output.
static NOISE: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^\d+\t",
        r"^Breakpoint \d+,? ",
        r"^Breakpoint \d+ at ",
        r"^\[Inferior \d+ ",
        r"^\[(?:New )?Thread ",
        r"^\[Thread debugging",
        r"^Using host libthread_db",
        r"^0x[0-9a-fA-F]+ in ",
        r"^[A-Za-z_~][\w:~<>, ]*\s*\(.*\)\s+at\s+\S+:\d+$",
        r"^[A-Za-z_~][\w:~<>, ]*\s*\(.*\)\s+from\s+\S+$",
        r": No such file or directory\.$",
        r"^warning: ",
        r"^Run till exit",
        r"^The program is not being run\.",
        r"^No stack\.",
        r"^Single stepping until exit",
        r"^Continuing\.",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("valid noise regex"))
    .collect()
});

/// Whether the transcript shows the inferior process exiting.
pub fn inferior_exited(transcript: &str) -> bool {
    INFERIOR_EXITED.is_match(transcript)
}

/// `"Program received signal SIGSEGV, Segmentation fault."` when the inferior was signalled.
pub fn fatal_signal(transcript: &str) -> Option<String> {
    SIGNAL.captures(transcript).map(|c| {
        format!(
            "Program received signal {}, {}",
            &c[1],
            c[2].trim_end()
        )
    })
}

/// Program output contained in the text printed by a `step` command.
pub fn program_output(trailing: &str) -> String {
    let mut output = String::new();
    for line in trailing.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || NOISE.iter().any(|noise| noise.is_match(line)) {
            continue;
        }
        if SIGNAL.is_match(line) {
            continue;
        }
        output.push_str(line);
        output.push('\n');
    }
    output
}
