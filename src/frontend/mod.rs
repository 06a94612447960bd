//! Source text to tokens: the scanner the compiler pulls from, and the
//! dumper behind `--tokens`.

pub mod lexer;
pub mod token;
pub mod token_dumper;
