//! Execution: the stack VM and the errors it reports.

pub mod runtime_error;
pub mod vm;
