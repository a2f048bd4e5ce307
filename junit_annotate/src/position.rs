//! Best-effort recovery of a test's source file and line.
//!
//! Reports only sometimes carry `file`/`line` attributes. When they don't, the
//! failure text is scanned for a `name:line` token. Each ecosystem renders its
//! frames differently, so resolution is a prioritized list of strategies and
//! the first one that produces a position wins.

use regex::Regex;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    pub file_name: String,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationStrategy {
    /// Both `file` and a parseable `line` were given by the report.
    ExplicitAttributes,
    /// The last ` …<name>…:<digits>` token of the failure output.
    StackTraceScan,
    /// The candidate file name with the explicit line, or line 1.
    Fallback,
}

pub const STRATEGIES: [LocationStrategy; 3] = [
    LocationStrategy::ExplicitAttributes,
    LocationStrategy::StackTraceScan,
    LocationStrategy::Fallback,
];

#[derive(Debug, Clone, Copy)]
pub struct LocationQuery<'a> {
    pub file: Option<&'a str>,
    pub line: Option<&'a str>,
    /// Fully qualified class or module path, e.g. `a.b.FooTest` or `crate::module`.
    pub identifier: &'a str,
    pub output: &'a str,
}

impl LocationQuery<'_> {
    fn explicit_file(&self) -> Option<&str> {
        self.file.map(str::trim).filter(|f| !f.is_empty())
    }

    fn explicit_line(&self) -> Option<u32> {
        self.line.and_then(parse_line_number)
    }

    /// The explicit file, else the last dot-separated segment of the identifier.
    pub fn candidate(&self) -> String {
        match self.explicit_file() {
            Some(file) => file.to_string(),
            None => self
                .identifier
                .rsplit('.')
                .next()
                .unwrap_or_default()
                .to_string(),
        }
    }

    fn fallback(&self) -> Position {
        Position {
            file_name: self.candidate(),
            line: self.explicit_line().unwrap_or(1),
        }
    }
}

impl LocationStrategy {
    pub fn resolve(self, query: &LocationQuery<'_>) -> Option<Position> {
        match self {
            LocationStrategy::ExplicitAttributes => {
                let file_name = query.explicit_file()?.to_string();
                let line = query.explicit_line()?;
                Some(Position { file_name, line })
            }
            LocationStrategy::StackTraceScan => scan_output(query),
            LocationStrategy::Fallback => Some(query.fallback()),
        }
    }
}

pub fn resolve_file_and_line(
    file: Option<&str>,
    line: Option<&str>,
    identifier: &str,
    output: &str,
) -> Position {
    let query = LocationQuery {
        file,
        line,
        identifier,
        output,
    };
    resolve_position(&query)
}

pub fn resolve_position(query: &LocationQuery<'_>) -> Position {
    STRATEGIES
        .iter()
        .find_map(|strategy| {
            let position = strategy.resolve(query)?;
            debug!(
                "Resolved file {} and line {} ({strategy:?})",
                position.file_name, position.line
            );
            Some(position)
        })
        .unwrap_or_else(|| query.fallback())
}

fn scan_output(query: &LocationQuery<'_>) -> Option<Position> {
    let candidate = query.candidate();
    if candidate.is_empty() || query.output.is_empty() {
        return None;
    }

    // Rust reports `module::submodule` where the frames carry `module/submodule`.
    let escaped = regex::escape(&candidate).replace("::", "/");
    let pattern = match Regex::new(&format!(" [^ ]*{escaped}.*?:\\d+")) {
        Ok(pattern) => pattern,
        Err(err) => {
            warn!(
                "Failed to resolve file ({:?}) and/or line ({:?}) for {} ({err})",
                query.file, query.line, query.identifier
            );
            return None;
        }
    };

    let last_match = pattern.find_iter(query.output).last()?.as_str();
    let mut tokens = last_match.rsplit(':');
    let line = tokens
        .next()
        .and_then(parse_line_number)
        .or(query.explicit_line())
        .unwrap_or(1);

    // Rust panics name the crate/module as "class"; the real test file follows later.
    let file_name = match tokens.next() {
        Some(prefix) if prefix.ends_with(".rs") => prefix
            .split_whitespace()
            .last()
            .unwrap_or(prefix)
            .to_string(),
        _ => candidate,
    };

    Some(Position { file_name, line })
}

/// Leading-digit parse; zero is treated as "no line".
fn parse_line_number(raw: &str) -> Option<u32> {
    let digits: String = raw
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u32>().ok().filter(|line| *line > 0)
}
