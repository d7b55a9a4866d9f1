use crate::remap::Position;
use regex::Regex;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// `<source>:<line>:<col>: <rest>`, as printed by flake8 and friends.
static CHECKER_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<source>[^:]+):(?P<line>\d+):(?P<col>\d+): (?P<rest>.*)$")
        .expect("checker line pattern is valid")
});

/// One line of checker output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckerLine<'a> {
    /// A diagnostic with a snippet-local position.
    Located {
        source: &'a str,
        position: Position,
        rest: &'a str,
    },
    /// Anything else, such as a traceback from a crashing checker.
    Unparsed(&'a str),
}

pub fn parse_checker_line(line: &str) -> CheckerLine<'_> {
    let Some(captures) = CHECKER_LINE.captures(line) else {
        return CheckerLine::Unparsed(line);
    };

    // The pattern guarantees digits, but they can still overflow usize.
    let (Ok(line_no), Ok(column)) = (
        captures["line"].parse::<usize>(),
        captures["col"].parse::<usize>(),
    ) else {
        return CheckerLine::Unparsed(line);
    };

    // Both groups are mandatory in the pattern.
    let group = |name: &str| captures.name(name).map_or("", |m| m.as_str());
    CheckerLine::Located {
        source: group("source"),
        position: Position::new(line_no, column),
        rest: group("rest"),
    }
}

/// A finding reported against a Markdown document.
///
/// Located diagnostics print as `<path>:<line>:<column>: <message>`.
/// Checker output that could not be parsed keeps no position and prints
/// exactly as the checker wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub file_path: PathBuf,
    pub position: Option<Position>,
    pub message: String,
}

impl Diagnostic {
    pub fn located(file_path: &Path, position: Position, message: &str) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
            position: Some(position),
            message: message.to_string(),
        }
    }

    pub fn verbatim(file_path: &Path, line: &str) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
            position: None,
            message: line.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.position {
            Some(position) => write!(
                f,
                "{}:{}:{}: {}",
                self.file_path.display(),
                position.line,
                position.column,
                self.message
            ),
            None => f.write_str(&self.message),
        }
    }
}
