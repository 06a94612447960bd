use std::io;

use crate::bytecode::compile_error::CompileError;
use crate::lang::source::Snippet;

/// What went wrong while executing a chunk.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeErrorKind {
    #[error("Operands must be numbers.")]
    OperandsMustBeNumbers,
    #[error("Operand must be a number.")]
    OperandMustBeNumber,
    #[error("Stack overflow.")]
    StackOverflow,
    #[error("Stack underflow.")]
    StackUnderflow,
    #[error("Unknown opcode {0}.")]
    InvalidOpcode(u8),
    #[error("Constant {0} is out of range.")]
    ConstantOutOfRange(usize),
    #[error("Instruction operand runs past the end of the chunk.")]
    TruncatedInstruction,
    #[error("Cannot write result: {0}")]
    Output(#[from] io::Error),
}

/// A runtime failure, located at the instruction that raised it.
#[derive(Debug)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: usize,
    pub column: usize,
    pub snippet: Option<Snippet>,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, line: usize, column: usize) -> Self {
        RuntimeError {
            kind,
            line,
            column,
            snippet: None,
        }
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.snippet = Snippet::capture(source, self.line, self.column);
        self
    }
}

impl std::fmt::Display for RuntimeError {
    /// ```text
    /// Runtime error: Operands must be numbers.
    /// Line 1, column 6
    ///
    ///     1 | true + 1
    ///              ^-- Here.
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Runtime error: {}", self.kind)?;
        write!(f, "Line {}, column {}", self.line, self.column)?;

        if let Some(snippet) = &self.snippet {
            write!(f, "\n\n{}", snippet)?;
        }
        Ok(())
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            RuntimeErrorKind::Output(e) => Some(e),
            _ => None,
        }
    }
}

/// Outcome of a failed compile-then-run cycle.
#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    #[error("{}", render_compile_errors(.0))]
    Compile(Vec<CompileError>),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl InterpretError {
    /// Process exit status for this failure (sysexits `EX_DATAERR` /
    /// `EX_SOFTWARE`).
    pub fn exit_code(&self) -> u8 {
        match self {
            InterpretError::Compile(_) => 65,
            InterpretError::Runtime(_) => 70,
        }
    }
}

impl From<Vec<CompileError>> for InterpretError {
    fn from(errors: Vec<CompileError>) -> Self {
        InterpretError::Compile(errors)
    }
}

fn render_compile_errors(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n\n")
}
