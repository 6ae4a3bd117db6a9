pub mod config;
pub mod core;
pub mod runner;
pub mod serialize;
pub mod trace;
pub mod transcript;
pub mod util;
pub mod web;

pub use config::Config;
pub use core::{LanguageInfo, TraceCore};
pub use runner::{
    CppTraceRunner, Language, PythonTraceRunner, TraceError, TraceRequest, TraceRunner,
};
pub use trace::{Step, StepEvent, Trace, TraceEntry, Value};
pub use transcript::TranscriptParser;
