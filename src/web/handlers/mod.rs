//! HTTP request handlers for the trace API.

pub mod visualize;
