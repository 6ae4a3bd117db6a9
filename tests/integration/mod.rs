//! Integration tests for steptrace
//!
//! These tests verify that multiple components work together correctly.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli;
pub mod python_flow;
pub mod serializer_laws;
pub mod service_flow;
pub mod transcript_flow;
