use serde::{Deserialize, Serialize};

use crate::bytecode::buffer::GrowableBuffer;
use crate::bytecode::op::Op;
use crate::lang::value::Value;

/// Constant indices below this use the one-byte `Constant` form.
pub const LONG_CONSTANT_THRESHOLD: usize = 256;

/// A three-byte operand addresses at most this many constants.
pub const MAX_CONSTANTS: usize = 1 << 24;

/// First code offset produced by a source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineStart {
    pub offset: usize,
    pub line: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("constant pool is full")]
    TooManyConstants,
    #[error("cannot encode chunk: {0}")]
    Encode(#[source] postcard::Error),
    #[error("cannot decode chunk: {0}")]
    Decode(#[source] postcard::Error),
    #[error("malformed chunk: {0}")]
    Malformed(&'static str),
}

/// A compiled unit: bytecode, its constant pool and debug positions.
///
/// `lines` is run-length encoded: one entry per run of bytes emitted from
/// the same source line. `columns` holds one entry per code byte.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    code: GrowableBuffer<u8>,
    constants: GrowableBuffer<Value>,
    lines: GrowableBuffer<LineStart>,
    columns: GrowableBuffer<usize>,
}

impl Chunk {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one byte and returns its offset.
    pub fn write(&mut self, byte: u8, line: usize, column: usize) -> usize {
        let offset = self.code.push(byte);
        self.columns.push(column);

        if self.lines.last().is_none_or(|last| last.line != line) {
            self.lines.push(LineStart { offset, line });
        }

        offset
    }

    pub fn write_op(&mut self, op: Op, line: usize, column: usize) -> usize {
        self.write(op.byte(), line, column)
    }

    /// Adds `value` to the constant pool. Repeated values are not shared.
    pub fn add_constant(&mut self, value: Value) -> usize {
        self.constants.push(value)
    }

    /// Adds `value` to the pool and emits the instruction that loads it.
    ///
    /// Indices below [`LONG_CONSTANT_THRESHOLD`] get `Constant` with a
    /// one-byte operand, the rest `ConstantLong` with three bytes,
    /// little-endian. Returns the constant's index.
    pub fn write_constant(
        &mut self,
        value: Value,
        line: usize,
        column: usize,
    ) -> Result<usize, ChunkError> {
        if self.constants.len() >= MAX_CONSTANTS {
            return Err(ChunkError::TooManyConstants);
        }

        let index = self.add_constant(value);
        if index < LONG_CONSTANT_THRESHOLD {
            self.write_op(Op::Constant, line, column);
            self.write(index as u8, line, column);
        } else {
            self.write_op(Op::ConstantLong, line, column);
            for byte in &(index as u32).to_le_bytes()[..3] {
                self.write(*byte, line, column);
            }
        }

        Ok(index)
    }

    /// Source line of the byte at `offset`.
    ///
    /// Binary search for the last run starting at or before `offset`.
    pub fn line_for(&self, offset: usize) -> Option<usize> {
        if offset >= self.code.len() {
            return None;
        }
        let runs = self.lines.as_slice();
        let after = runs.partition_point(|start| start.offset <= offset);
        after.checked_sub(1).map(|i| runs[i].line)
    }

    pub fn column_for(&self, offset: usize) -> Option<usize> {
        self.columns.get(offset).copied()
    }

    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    pub fn constant(&self, index: usize) -> Option<Value> {
        self.constants.get(index).copied()
    }

    pub fn code(&self) -> &[u8] {
        self.code.as_slice()
    }

    pub fn constants(&self) -> &[Value] {
        self.constants.as_slice()
    }

    pub fn lines(&self) -> &[LineStart] {
        self.lines.as_slice()
    }

    pub fn columns(&self) -> &[usize] {
        self.columns.as_slice()
    }

    pub fn code_capacity(&self) -> usize {
        self.code.capacity()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    /// Encodes the chunk with postcard.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ChunkError> {
        postcard::to_allocvec(self).map_err(ChunkError::Encode)
    }

    /// Decodes a chunk written by [`Chunk::to_bytes`] and checks that its
    /// debug tables still describe its code.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ChunkError> {
        let chunk: Chunk = postcard::from_bytes(bytes).map_err(ChunkError::Decode)?;
        chunk.validate()?;
        Ok(chunk)
    }

    fn validate(&self) -> Result<(), ChunkError> {
        if self.columns.len() != self.code.len() {
            return Err(ChunkError::Malformed("column table does not match code"));
        }
        if self.constants.len() > MAX_CONSTANTS {
            return Err(ChunkError::Malformed("too many constants"));
        }

        let runs = self.lines.as_slice();
        match runs.first() {
            None if !self.code.is_empty() => {
                return Err(ChunkError::Malformed("missing line table"));
            }
            Some(first) if first.offset != 0 => {
                return Err(ChunkError::Malformed("line table does not start at 0"));
            }
            _ => {}
        }
        if runs.windows(2).any(|w| w[0].offset >= w[1].offset) {
            return Err(ChunkError::Malformed("line offsets not increasing"));
        }
        if runs.last().is_some_and(|last| last.offset >= self.code.len()) {
            return Err(ChunkError::Malformed("line offset past end of code"));
        }

        Ok(())
    }
}
