use std::io::{self, Write};

use log::{Level, log_enabled, trace};

use crate::bytecode::compile::compile;
use crate::bytecode::disasm::{disassemble_chunk, disassemble_instruction};
use crate::bytecode::{Chunk, Op};
use crate::lang::value::Value;
use crate::runtime::runtime_error::{InterpretError, RuntimeError, RuntimeErrorKind};

#[derive(Debug, Clone)]
pub struct VmConfig {
    /// Maximum number of values on the stack.
    pub stack_max: usize,
    /// Write the disassembly of each compiled chunk before running it.
    pub print_code: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            stack_max: 256,
            print_code: false,
        }
    }
}

impl VmConfig {
    pub fn stack_max(mut self, stack_max: usize) -> Self {
        self.stack_max = stack_max;
        self
    }

    pub fn print_code(mut self, print_code: bool) -> Self {
        self.print_code = print_code;
        self
    }
}

/// Stack machine executing one [`Chunk`] at a time.
///
/// Results of `RETURN` are written to `out`.
pub struct Vm<W: Write = io::Stdout> {
    config: VmConfig,
    stack: Vec<Value>,
    out: W,
}

impl Vm<io::Stdout> {
    pub fn new() -> Self {
        Self::with_config(VmConfig::default())
    }

    pub fn with_config(config: VmConfig) -> Self {
        Self::with_output(config, io::stdout())
    }
}

impl Default for Vm<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

/// Read cursor over a chunk's code.
struct Frame<'a> {
    chunk: &'a Chunk,
    ip: usize,
}

impl Frame<'_> {
    fn read_byte(&mut self) -> Option<u8> {
        let byte = self.chunk.read_byte(self.ip)?;
        self.ip += 1;
        Some(byte)
    }

    /// Little-endian 24-bit operand of `CONSTANT_LONG`.
    fn read_u24(&mut self) -> Option<usize> {
        let bytes = self.chunk.code().get(self.ip..self.ip + 3)?;
        self.ip += 3;
        Some(bytes[0] as usize | (bytes[1] as usize) << 8 | (bytes[2] as usize) << 16)
    }
}

impl<W: Write> Vm<W> {
    pub fn with_output(config: VmConfig, out: W) -> Self {
        Self {
            stack: Vec::with_capacity(config.stack_max),
            config,
            out,
        }
    }

    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Compiles `source` and, if that succeeds, runs it.
    pub fn interpret(&mut self, source: &str) -> Result<Value, InterpretError> {
        let mut chunk = Chunk::new();
        compile(source, &mut chunk)?;

        if self.config.print_code {
            write!(self.out, "{}", disassemble_chunk(&chunk, "code"))
                .map_err(|e| RuntimeError::new(RuntimeErrorKind::Output(e), 0, 0))?;
        }

        Ok(self.run(&chunk, Some(source))?)
    }

    /// Executes `chunk` until `RETURN`. `source` is only used to attach a
    /// snippet to runtime errors.
    ///
    /// On failure the stack is left as it was when the error was raised;
    /// the next `run` starts from an empty stack.
    pub fn run(&mut self, chunk: &Chunk, source: Option<&str>) -> Result<Value, RuntimeError> {
        self.stack.clear();

        self.exec(chunk).map_err(|(kind, offset)| {
            let line = chunk.line_for(offset).unwrap_or(0);
            let column = chunk.column_for(offset).unwrap_or(0);
            let err = RuntimeError::new(kind, line, column);
            match source {
                Some(source) => err.with_source(source),
                None => err,
            }
        })
    }

    /// Dispatch loop. Errors carry the offset of the failing instruction.
    fn exec(&mut self, chunk: &Chunk) -> Result<Value, (RuntimeErrorKind, usize)> {
        let mut frame = Frame { chunk, ip: 0 };

        loop {
            let start = frame.ip;

            if log_enabled!(Level::Trace) {
                let slots: String = self.stack.iter().map(|v| format!("[ {} ]", v)).collect();
                trace!("          {}", slots);
                trace!("{}", disassemble_instruction(chunk, start).0);
            }

            let fail = |kind| (kind, start);

            let byte = frame
                .read_byte()
                .ok_or_else(|| fail(RuntimeErrorKind::TruncatedInstruction))?;
            let op = Op::try_from(byte).map_err(|b| fail(RuntimeErrorKind::InvalidOpcode(b)))?;

            match op {
                Op::Constant | Op::ConstantLong => {
                    let operand = match op {
                        Op::Constant => frame.read_byte().map(usize::from),
                        _ => frame.read_u24(),
                    };
                    let index =
                        operand.ok_or_else(|| fail(RuntimeErrorKind::TruncatedInstruction))?;

                    let value = chunk
                        .constant(index)
                        .ok_or_else(|| fail(RuntimeErrorKind::ConstantOutOfRange(index)))?;
                    self.push(value).map_err(fail)?;
                }
                Op::Nil => self.push(Value::Nil).map_err(fail)?,
                Op::True => self.push(Value::Bool(true)).map_err(fail)?,
                Op::False => self.push(Value::Bool(false)).map_err(fail)?,

                Op::Add => self.binary_op(|a, b| a + b).map_err(fail)?,
                Op::Subtract => self.binary_op(|a, b| a - b).map_err(fail)?,
                Op::Multiply => self.binary_op(|a, b| a * b).map_err(fail)?,
                Op::Divide => self.binary_op(|a, b| a / b).map_err(fail)?,

                Op::Negate => {
                    let top = self
                        .stack
                        .last_mut()
                        .ok_or_else(|| fail(RuntimeErrorKind::StackUnderflow))?;
                    let n = top
                        .as_number()
                        .ok_or_else(|| fail(RuntimeErrorKind::OperandMustBeNumber))?;
                    *top = Value::Number(-n);
                }

                Op::Return => {
                    let value = self.pop().map_err(fail)?;
                    writeln!(self.out, "{}", value)
                        .map_err(|e| fail(RuntimeErrorKind::Output(e)))?;
                    return Ok(value);
                }
            }
        }
    }

    fn push(&mut self, value: Value) -> Result<(), RuntimeErrorKind> {
        if self.stack.len() >= self.config.stack_max {
            return Err(RuntimeErrorKind::StackOverflow);
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Result<Value, RuntimeErrorKind> {
        self.stack.pop().ok_or(RuntimeErrorKind::StackUnderflow)
    }

    /// Both operands are checked before either is popped.
    fn binary_op(&mut self, f: impl Fn(f64, f64) -> f64) -> Result<(), RuntimeErrorKind> {
        let len = self.stack.len();
        if len < 2 {
            return Err(RuntimeErrorKind::StackUnderflow);
        }

        match (self.stack[len - 2].as_number(), self.stack[len - 1].as_number()) {
            (Some(a), Some(b)) => {
                self.stack.truncate(len - 2);
                self.stack.push(Value::Number(f(a, b)));
                Ok(())
            }
            _ => Err(RuntimeErrorKind::OperandsMustBeNumbers),
        }
    }
}
