//! loxim: a single-pass bytecode compiler and stack VM for Lox
//! expressions.
//!
//! ```
//! use loxim::runtime::vm::{Vm, VmConfig};
//!
//! let mut vm = Vm::with_output(VmConfig::default(), Vec::new());
//! vm.interpret("(1 + 2) * 3").unwrap();
//! assert_eq!(vm.output(), b"9\n");
//! ```

pub mod bytecode;
pub mod frontend;
pub mod lang;
pub mod logging;
pub mod runtime;

pub use bytecode::Chunk;
pub use lang::value::Value;
pub use runtime::runtime_error::{InterpretError, RuntimeError};
pub use runtime::vm::{Vm, VmConfig};
