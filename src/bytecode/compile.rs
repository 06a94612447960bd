use log::debug;

use crate::{
    bytecode::{Op, chunk::Chunk, compile_error::CompileError},
    frontend::{
        lexer::Lexer,
        token::{Span, Token, TokenKind},
    },
    lang::value::Value,
};

/// Parenthesis/unary nesting beyond this is rejected instead of recursing
/// further.
pub const MAX_NESTING: usize = 512;

/// Compiles `source` into `chunk`.
///
/// Parsing does not stop at the first error; whatever can still be parsed
/// is emitted, but a chunk that comes back with `Err` must not be run.
pub fn compile(source: &str, chunk: &mut Chunk) -> Result<(), Vec<CompileError>> {
    Compiler::new(source, chunk).compile()
}

/// Single-pass compiler: recursive descent over the token stream, emitting
/// bytecode as each rule is recognized. There is no syntax tree.
///
/// Grammar:
///
/// ```text
/// expression := term (("+" | "-") term)*
/// term       := factor (("*" | "/") factor)*
/// factor     := NUMBER | "(" expression ")" | ("!" | "-" | "+") factor | literal
/// literal    := "true" | "false" | "nil"
/// ```
pub struct Compiler<'src, 'c> {
    lexer: Lexer<'src>,
    source: &'src str,
    chunk: &'c mut Chunk,

    current: Token<'src>,
    previous: Token<'src>,

    diagnostics: Vec<CompileError>,
    /// Set by the first diagnostic. Nothing clears it: expressions have no
    /// statement boundary to resynchronize at.
    panic_mode: bool,
    depth: usize,
}

impl<'src, 'c> Compiler<'src, 'c> {
    pub fn new(source: &'src str, chunk: &'c mut Chunk) -> Self {
        Self {
            lexer: Lexer::new(source),
            source,
            chunk,
            current: Token::synthetic(),
            previous: Token::synthetic(),
            diagnostics: Vec::new(),
            panic_mode: false,
            depth: 0,
        }
    }

    pub fn compile(mut self) -> Result<(), Vec<CompileError>> {
        self.advance();
        self.expression();
        self.consume(TokenKind::Eof, "Expected end of expression.");
        self.end_compiler();

        if self.diagnostics.is_empty() {
            debug!(
                "compiled {} bytes, {} constants, {} line entries",
                self.chunk.len(),
                self.chunk.constants().len(),
                self.chunk.lines().len()
            );
            Ok(())
        } else {
            Err(self.diagnostics)
        }
    }

    // =========================================================================
    // Token stream
    // =========================================================================

    fn advance(&mut self) {
        self.previous = self.current;

        loop {
            self.current = self.lexer.scan_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let message = self.current.lexeme;
            self.error_at_current(message);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
            return;
        }
        self.error_at_current(message);
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    fn error_at(&mut self, token: Token<'src>, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        self.diagnostics
            .push(CompileError::at_token(&token, message, self.source));
    }

    fn error(&mut self, message: &str) {
        self.error_at(self.previous, message);
    }

    fn error_at_current(&mut self, message: &str) {
        self.error_at(self.current, message);
    }

    // =========================================================================
    // Emission
    // =========================================================================

    fn emit_op(&mut self, op: Op, span: Span) {
        self.chunk.write_op(op, span.line, span.col);
    }

    fn emit_constant(&mut self, value: Value, span: Span) {
        if self.chunk.write_constant(value, span.line, span.col).is_err() {
            self.error("Too many constants in one chunk.");
        }
    }

    fn end_compiler(&mut self) {
        let span = self.previous.span;
        self.emit_op(Op::Return, span);
    }

    // =========================================================================
    // Grammar rules
    // =========================================================================

    fn expression(&mut self) {
        self.term();

        while self.check(TokenKind::Plus) || self.check(TokenKind::Minus) {
            let operator = self.current;
            self.advance();
            self.term();
            let op = if operator.kind == TokenKind::Plus {
                Op::Add
            } else {
                Op::Subtract
            };
            // the operator's own position, not the right operand's
            self.emit_op(op, operator.span);
        }
    }

    fn term(&mut self) {
        self.factor();

        while self.check(TokenKind::Star) || self.check(TokenKind::Slash) {
            let operator = self.current;
            self.advance();
            self.factor();
            let op = if operator.kind == TokenKind::Star {
                Op::Multiply
            } else {
                Op::Divide
            };
            self.emit_op(op, operator.span);
        }
    }

    fn factor(&mut self) {
        if self.depth >= MAX_NESTING {
            self.error_at_current("Expression nests too deeply.");
            return;
        }
        self.depth += 1;

        match self.current.kind {
            TokenKind::Number => {
                self.advance();
                self.number();
            }
            TokenKind::LeftParen => {
                self.advance();
                self.grouping();
            }
            TokenKind::Bang | TokenKind::Minus | TokenKind::Plus => {
                self.advance();
                self.unary();
            }
            _ => self.literal(),
        }

        self.depth -= 1;
    }

    fn number(&mut self) {
        let token = self.previous;
        match token.lexeme.parse::<f64>() {
            Ok(value) => self.emit_constant(Value::Number(value), token.span),
            Err(_) => self.error("Invalid number literal."),
        }
    }

    fn grouping(&mut self) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expected ')' after expression.");
    }

    fn unary(&mut self) {
        let operator = self.previous;

        // Compile the operand first.
        self.factor();

        // `!` and unary `+` are accepted but emit nothing yet.
        if operator.kind == TokenKind::Minus {
            self.emit_op(Op::Negate, operator.span);
        }
    }

    fn literal(&mut self) {
        let token = self.current;
        let op = match token.kind {
            TokenKind::True => Op::True,
            TokenKind::False => Op::False,
            TokenKind::Nil => Op::Nil,
            _ => {
                self.error_at_current("Expected an expression.");
                return;
            }
        };
        self.emit_op(op, token.span);
        self.advance();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::compile_error::ErrorLocation;

    fn compile_ok(source: &str) -> Chunk {
        let mut chunk = Chunk::new();
        match compile(source, &mut chunk) {
            Ok(()) => chunk,
            Err(errors) => panic!("compile failed for {:?}: {:?}", source, errors),
        }
    }

    fn compile_err(source: &str) -> Vec<CompileError> {
        let mut chunk = Chunk::new();
        compile(source, &mut chunk).expect_err("compile should fail")
    }

    fn b(op: Op) -> u8 {
        op.byte()
    }

    // =========================================================================
    // Code generation
    // =========================================================================

    #[test]
    fn test_precedence_emits_postfix_order() {
        let chunk = compile_ok("1 + 2 * 3");
        assert_eq!(
            chunk.code(),
            &[
                b(Op::Constant),
                0,
                b(Op::Constant),
                1,
                b(Op::Constant),
                2,
                b(Op::Multiply),
                b(Op::Add),
                b(Op::Return)
            ]
        );
        assert_eq!(
            chunk.constants(),
            &[Value::Number(1.0), Value::Number(2.0), Value::Number(3.0)]
        );
    }

    #[test]
    fn test_grouping_overrides_precedence() {
        let chunk = compile_ok("(1 + 2) * 3");
        assert_eq!(
            chunk.code(),
            &[
                b(Op::Constant),
                0,
                b(Op::Constant),
                1,
                b(Op::Add),
                b(Op::Constant),
                2,
                b(Op::Multiply),
                b(Op::Return)
            ]
        );
    }

    #[test]
    fn test_left_associative_subtraction_and_division() {
        let chunk = compile_ok("8 - 4 - 2");
        assert_eq!(
            chunk.code(),
            &[
                b(Op::Constant),
                0,
                b(Op::Constant),
                1,
                b(Op::Subtract),
                b(Op::Constant),
                2,
                b(Op::Subtract),
                b(Op::Return)
            ]
        );

        let chunk = compile_ok("8 / 4 / 2");
        assert_eq!(chunk.code()[4], b(Op::Divide));
        assert_eq!(chunk.code()[7], b(Op::Divide));
    }

    #[test]
    fn test_literals() {
        let chunk = compile_ok("true");
        assert_eq!(chunk.code(), &[b(Op::True), b(Op::Return)]);

        let chunk = compile_ok("false");
        assert_eq!(chunk.code(), &[b(Op::False), b(Op::Return)]);

        let chunk = compile_ok("nil");
        assert_eq!(chunk.code(), &[b(Op::Nil), b(Op::Return)]);
    }

    #[test]
    fn test_negate_applies_to_a_factor() {
        // -1 * 2 is (-1) * 2
        let chunk = compile_ok("-1 * 2");
        assert_eq!(
            chunk.code(),
            &[
                b(Op::Constant),
                0,
                b(Op::Negate),
                b(Op::Constant),
                1,
                b(Op::Multiply),
                b(Op::Return)
            ]
        );
    }

    #[test]
    fn test_unary_bang_and_plus_emit_nothing() {
        let chunk = compile_ok("!true");
        assert_eq!(chunk.code(), &[b(Op::True), b(Op::Return)]);

        let chunk = compile_ok("+5");
        assert_eq!(chunk.code(), &[b(Op::Constant), 0, b(Op::Return)]);
    }

    #[test]
    fn test_fractional_number() {
        let chunk = compile_ok("2.75");
        assert_eq!(chunk.constants(), &[Value::Number(2.75)]);
    }

    #[test]
    fn test_operator_column_is_operator_token() {
        //          123456789
        let chunk = compile_ok("10 +  2*3");
        // CONSTANT 10 @1, CONSTANT 2 @7, CONSTANT 3 @9, MUL @8, ADD @4, RETURN @EOF
        assert_eq!(chunk.columns(), &[1, 1, 7, 7, 9, 9, 8, 4, 10]);
    }

    #[test]
    fn test_operator_line_is_operator_token() {
        let chunk = compile_ok("1 +\n2");
        // ADD is at offset 4, emitted after the operand on line 2
        assert_eq!(chunk.code()[4], b(Op::Add));
        assert_eq!(chunk.line_for(4), Some(1));
        assert_eq!(chunk.line_for(2), Some(2));
    }

    #[test]
    fn test_multi_line_expression_line_table() {
        let chunk = compile_ok("1\n+\n2");
        // CONSTANT 1 (line 1), CONSTANT 2 (line 3), ADD (line 2), RETURN (line 3: at EOF)
        let lines: Vec<usize> = chunk.lines().iter().map(|l| l.line).collect();
        assert_eq!(lines, vec![1, 3, 2, 3]);
    }

    #[test]
    fn test_many_literals_switch_to_long_constants() {
        let source = vec!["1"; 300].join(" + ");
        let chunk = compile_ok(&source);

        assert_eq!(chunk.constants().len(), 300);
        assert!(
            chunk
                .code()
                .windows(4)
                .any(|w| w == [b(Op::ConstantLong), 0x00, 0x01, 0x00])
        );
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    #[test]
    fn test_missing_operand() {
        let errors = compile_err("1 +");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Expected an expression.");
        assert_eq!(errors[0].location, ErrorLocation::AtEnd);
        assert_eq!((errors[0].line, errors[0].column), (1, 4));
    }

    #[test]
    fn test_unclosed_paren() {
        let errors = compile_err("(1 + 2");
        assert_eq!(errors[0].message, "Expected ')' after expression.");
    }

    #[test]
    fn test_trailing_tokens() {
        let errors = compile_err("1 2");
        assert_eq!(errors[0].message, "Expected end of expression.");
        assert_eq!(errors[0].location, ErrorLocation::AtLexeme("2".to_string()));
        assert_eq!(errors[0].column, 3);
    }

    #[test]
    fn test_unsupported_token_is_not_an_expression() {
        let errors = compile_err("1 + \"str\"");
        assert_eq!(errors[0].message, "Expected an expression.");
        assert_eq!(
            errors[0].location,
            ErrorLocation::AtLexeme("\"str\"".to_string())
        );
    }

    #[test]
    fn test_lexical_error_is_reported() {
        let errors = compile_err("1 + @");
        assert_eq!(errors[0].message, "Unexpected character.");
        assert_eq!(errors[0].location, ErrorLocation::Lexical);
        assert_eq!(errors[0].column, 5);
    }

    #[test]
    fn test_panic_mode_keeps_only_first_error() {
        // ')' is unexpected, then '@' and the trailing '(' would each error
        let errors = compile_err(") @ (");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "Expected an expression.");
    }

    #[test]
    fn test_empty_source_is_an_error() {
        let errors = compile_err("");
        assert_eq!(errors[0].message, "Expected an expression.");
    }

    #[test]
    fn test_error_carries_source_line() {
        let errors = compile_err("1 +\n* 2");
        assert_eq!(errors[0].line, 2);
        let snippet = errors[0].snippet.as_ref().unwrap();
        assert_eq!(snippet.text, "* 2");
    }

    #[test]
    fn test_nesting_limit() {
        let source = format!("{}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        let errors = compile_err(&source);
        assert_eq!(errors[0].message, "Expression nests too deeply.");

        let source = format!("{}1{}", "(".repeat(100), ")".repeat(100));
        compile_ok(&source);
    }
}
