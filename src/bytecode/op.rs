// =============================================================================
// OP - Bytecode instructions
// =============================================================================

/// One-byte instruction tag.
///
/// The instruction stream stores the discriminant byte, followed by the
/// operand bytes listed in [`Op::operand_width`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Op {
    // literals
    /// Push `constants[u8]`.
    Constant = 0,
    /// Push `constants[u24 little-endian]`.
    ConstantLong = 1,
    Nil = 2,
    True = 3,
    False = 4,

    // arithmetic: pop b, pop a, push a op b
    Add = 5,
    Subtract = 6,
    Multiply = 7,
    Divide = 8,
    Negate = 9,

    /// Pop and print the top of the stack, then halt.
    Return = 10,
}

impl Op {
    pub const ALL: [Op; 11] = [
        Op::Constant,
        Op::ConstantLong,
        Op::Nil,
        Op::True,
        Op::False,
        Op::Add,
        Op::Subtract,
        Op::Multiply,
        Op::Divide,
        Op::Negate,
        Op::Return,
    ];

    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Number of operand bytes following the opcode.
    pub fn operand_width(self) -> usize {
        match self {
            Op::Constant => 1,
            Op::ConstantLong => 3,
            _ => 0,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Op::Constant => "OP_CONSTANT",
            Op::ConstantLong => "OP_CONSTANT_LONG",
            Op::Nil => "OP_NIL",
            Op::True => "OP_TRUE",
            Op::False => "OP_FALSE",
            Op::Add => "OP_ADD",
            Op::Subtract => "OP_SUBTRACT",
            Op::Multiply => "OP_MULTIPLY",
            Op::Divide => "OP_DIVIDE",
            Op::Negate => "OP_NEGATE",
            Op::Return => "OP_RETURN",
        }
    }
}

impl TryFrom<u8> for Op {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, u8> {
        Op::ALL.get(byte as usize).copied().ok_or(byte)
    }
}

impl From<Op> for u8 {
    fn from(op: Op) -> u8 {
        op.byte()
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}
