use std::collections::BTreeMap;

use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;

use crate::runner::error::TraceError;
use crate::serialize::{HeapSnapshot, ObjectRef};

/// Generic JSONL stream parser
pub struct JsonlStreamParser;

impl JsonlStreamParser {
    /// Parse JSONL from a reader and send each decoded line to the channel.
    ///
    /// A line that does not decode ends the stream with [`TraceError::MalformedOutput`]; events
    /// decoded before it have already been sent.
    pub async fn parse_stream<R, T>(reader: R, tx: mpsc::Sender<T>) -> Result<(), TraceError>
    where
        R: AsyncRead + Unpin,
        T: for<'de> Deserialize<'de> + Send + 'static,
    {
        let reader = BufReader::new(reader);
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            tracing::trace!("JSONL raw line: {}", &line);

            match serde_json::from_str::<T>(&line) {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        // Receiver dropped, exit gracefully
                        break;
                    }
                }
                Err(e) => {
                    let preview: String = line.chars().take(200).collect();
                    tracing::warn!("Failed to parse JSONL line: {e}. Line: {preview}");
                    return Err(TraceError::MalformedOutput(format!(
                        "undecodable tracer event ({e}): {preview}"
                    )));
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// Tracer harness events (raw from tracer.py)
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HarnessEvent {
    /// A target frame is about to execute `line`
    Line(FrameEvent),

    /// A target frame is returning; `line` is its last executed line
    Return(FrameEvent),

    /// The program raised an uncaught exception
    Error {
        message: String,
        #[serde(default)]
        output: String,
    },

    /// The program ran to completion
    Finished {
        #[serde(default)]
        output: String,
    },

    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameEvent {
    /// Identity of the frame object, stable while the frame is alive
    pub frame: u64,
    /// Whether the frame is the module-level frame of the program
    #[serde(default)]
    pub module: bool,
    pub line: u32,
    #[serde(default)]
    pub locals: BTreeMap<String, ObjectRef>,
    #[serde(default)]
    pub heap: HeapSnapshot,
    /// Program output produced since the previous event
    #[serde(default)]
    pub output: String,
}
