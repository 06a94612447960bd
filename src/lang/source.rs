/// Width of the gutter printed before a source line: `%5d | `.
const GUTTER: usize = 7;

/// Returns the text of the 1-based `line` of `source`, without its line
/// terminator.
///
/// Scans from the start of the source on every call; only error paths
/// use it.
pub fn source_line(source: &str, line: usize) -> Option<&str> {
    if line == 0 {
        return None;
    }
    source
        .split('\n')
        .nth(line - 1)
        .map(|text| text.strip_suffix('\r').unwrap_or(text))
}

/// A reconstructed source line with a caret under one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Snippet {
    pub line: usize,
    pub column: usize,
    pub text: String,
}

impl Snippet {
    /// Extracts `line` from `source`; `None` if the source has no such line.
    pub fn capture(source: &str, line: usize, column: usize) -> Option<Self> {
        source_line(source, line).map(|text| Snippet {
            line,
            column,
            text: text.to_string(),
        })
    }
}

impl std::fmt::Display for Snippet {
    /// ```text
    ///     3 | 1 + * 2
    ///             ^-- Here.
    /// ```
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{:5} | {}", self.line, self.text)?;
        write!(f, "{:width$}^-- Here.", "", width = GUTTER + self.column)
    }
}
