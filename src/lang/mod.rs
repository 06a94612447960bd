//! # Language values and source text
//!
//! `value` holds the runtime [`Value`](value::Value) sum type together with
//! its printed form. `source` rebuilds source lines for diagnostics; both
//! compile and runtime errors render their caret snippets through it.

pub mod source;
pub mod value;
