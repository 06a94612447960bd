use std::fmt::Write;

use crate::frontend::token::{Token, TokenKind};

/// Prints a token stream, one token per line, for `--tokens`.
pub struct TokenDumper {
    pub color: bool,
    pub show_debug_repr: bool, // if false, prints the lexeme instead of the kind's Debug form
}

impl Default for TokenDumper {
    fn default() -> Self {
        Self {
            color: true,
            show_debug_repr: true,
        }
    }
}

impl TokenDumper {
    // ANSI colors
    const RESET: &'static str = "\x1b[0m";
    const DIM: &'static str = "\x1b[2m";
    const RED: &'static str = "\x1b[31m";
    const GRN: &'static str = "\x1b[32m";
    const YEL: &'static str = "\x1b[33m";
    const CYN: &'static str = "\x1b[36m";
    const MAG: &'static str = "\x1b[35m";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn no_color(mut self) -> Self {
        self.color = false;
        self
    }

    pub fn pretty(mut self) -> Self {
        self.show_debug_repr = false;
        self
    }

    pub fn dump(&self, tokens: &[Token<'_>]) {
        print!("{}", self.render(tokens));
    }

    pub fn render(&self, tokens: &[Token<'_>]) -> String {
        let mut out = String::new();
        for token in tokens {
            self.render_one(&mut out, token);
        }
        out
    }

    fn render_one(&self, out: &mut String, t: &Token<'_>) {
        let line = t.span.line;
        let col = t.span.col;

        let kind = self.kind(t.kind);
        let colr = if self.color { self.color(t.kind) } else { "" };
        let reset = if self.color { Self::RESET } else { "" };

        // Writing into a String cannot fail.
        let _ = if self.show_debug_repr {
            writeln!(
                out,
                "[{:02}:{:02}] {}{:<8} {:?} {:?}{}",
                line, col, colr, kind, t.kind, t.lexeme, reset
            )
        } else {
            match t.kind {
                TokenKind::Error => writeln!(
                    out,
                    "[{:02}:{:02}] {}{:<8} {}{}",
                    line, col, colr, kind, t.lexeme, reset
                ),
                TokenKind::Eof => writeln!(
                    out,
                    "[{:02}:{:02}] {}{:<8}{}",
                    line, col, colr, kind, reset
                ),
                _ => writeln!(
                    out,
                    "[{:02}:{:02}] {}{:<8} {}{}",
                    line, col, colr, kind, t.lexeme, reset
                ),
            }
        };
    }

    fn kind(&self, k: TokenKind) -> &'static str {
        use TokenKind::*;
        match k {
            // common specials
            Eof => "EOF",
            Error => "ERROR",

            // literals
            Number => "NUMBER",
            String => "STRING",
            True | False | Nil => "LITERAL",

            // names
            Identifier => "IDENT",

            // structure
            LeftParen | RightParen => "PAREN",
            LeftBracket | RightBracket => "BRACKET",
            LeftBrace | RightBrace => "BRACE",
            Semicolon | Comma | Dot => "PUNCT",

            // ops / comparisons
            Plus | Minus | Star | Slash | Bang => "OP",
            Equal | EqualEqual | BangEqual | Less | LessEqual | Greater | GreaterEqual => "CMP",

            _ if k.is_keyword() => "KEYWORD",
            _ => "TOKEN",
        }
    }

    fn color(&self, k: TokenKind) -> &'static str {
        use TokenKind::*;
        match k {
            Eof => Self::DIM,
            Error => Self::RED,
            String => Self::GRN,
            Number | True | False | Nil => Self::CYN,
            Identifier => Self::YEL,
            Plus | Minus | Star | Slash | Bang => Self::MAG,
            Equal | EqualEqual | BangEqual | Less | LessEqual | Greater | GreaterEqual => {
                Self::MAG
            }
            _ => Self::RESET,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::Lexer;

    #[test]
    fn test_pretty_plain_output() {
        let tokens = Lexer::new("1 + nil").tokenize();
        let out = TokenDumper::new().no_color().pretty().render(&tokens);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "[01:01] NUMBER   1");
        assert_eq!(lines[1], "[01:03] OP       +");
        assert_eq!(lines[2], "[01:05] LITERAL  nil");
        assert_eq!(lines[3], "[01:08] EOF     ");
    }

    #[test]
    fn test_debug_repr_shows_kind_and_lexeme() {
        let tokens = Lexer::new("@").tokenize();
        let out = TokenDumper::new().no_color().render(&tokens);
        assert!(out.starts_with("[01:01] ERROR    Error \"Unexpected character.\""), "{}", out);
    }

    #[test]
    fn test_color_wraps_each_line() {
        let tokens = Lexer::new("x").tokenize();
        let out = TokenDumper::new().render(&tokens);
        assert!(out.contains("\x1b[33mIDENT"));
        assert!(out.lines().all(|l| l.ends_with("\x1b[0m")));
    }
}
