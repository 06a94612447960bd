use crate::frontend::token::{Token, TokenKind};
use crate::lang::source::Snippet;

/// Where on its line a compile error points.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorLocation {
    /// The parser ran out of tokens.
    AtEnd,
    /// A well-formed token in the wrong place.
    AtLexeme(String),
    /// The scanner rejected the text itself; the message says why.
    Lexical,
}

/// A syntax error with source position and the offending source line.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub location: ErrorLocation,
    pub snippet: Option<Snippet>,
}

impl CompileError {
    /// Builds the error for `token`, capturing its source line from
    /// `source`.
    pub fn at_token(token: &Token<'_>, message: impl Into<String>, source: &str) -> Self {
        let location = match token.kind {
            TokenKind::Eof => ErrorLocation::AtEnd,
            TokenKind::Error => ErrorLocation::Lexical,
            _ => ErrorLocation::AtLexeme(token.lexeme.to_string()),
        };

        CompileError {
            message: message.into(),
            line: token.span.line,
            column: token.span.col,
            location,
            snippet: Snippet::capture(source, token.span.line, token.span.col),
        }
    }
}

impl std::fmt::Display for CompileError {
    /// ```text
    /// Error: Expected an expression.
    /// Line 1, at end of file
    ///
    ///     1 | 1 +
    ///            ^-- Here.
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Error: {}", self.message)?;
        match &self.location {
            ErrorLocation::AtEnd => writeln!(f, "Line {}, at end of file", self.line)?,
            ErrorLocation::AtLexeme(lexeme) => {
                writeln!(f, "Line {}, at '{}'", self.line, lexeme)?
            }
            ErrorLocation::Lexical => writeln!(f, "Line {}, column {}", self.line, self.column)?,
        }

        match &self.snippet {
            Some(snippet) => write!(f, "\n{}", snippet),
            None => write!(f, "\n(source line unavailable)"),
        }
    }
}

impl std::error::Error for CompileError {}
