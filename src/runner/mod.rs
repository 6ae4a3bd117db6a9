pub mod assembler;
pub mod cpp;
pub mod error;
pub mod mock;
pub mod python;
pub mod runner;
pub mod sandbox;
pub mod stream;

pub use cpp::CppTraceRunner;
pub use error::TraceError;
pub use python::PythonTraceRunner;
pub use runner::{Language, TraceRequest, TraceRunner};
