//! Step and value model shared by the instrumented and debugger-session paths.

pub mod step;
pub mod value;

pub use step::{ErrorRecord, Step, StepEvent, Trace, TraceEntry};
pub use value::{Body, Complex, Identity, Kind, Locals, Primitive, Value};
