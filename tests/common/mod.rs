//! Shared test utilities for steptrace
//!
//! - Debugger transcript fixtures
//! - Mock-backed trace cores
//! - Tool guards for tests that need a real interpreter

pub mod fixtures;
