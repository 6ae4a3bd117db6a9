//! Core module containing the request dispatch shared by the web server and the CLI.

mod trace_core;

pub use trace_core::{LanguageInfo, TraceCore};
