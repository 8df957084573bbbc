//! Script errors

use std::fmt;

/// The kind of script error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Script file missing or unreadable
    FileNotFound,
    /// Script has no lines at all
    EmptyScript,
    /// Target process could not be launched, or a stream handle was unavailable
    Spawn,
    /// Stdout closed while an expectation was pending
    NoResponse,
    /// Regex expectation failed to compile
    InvalidPattern,
    /// IO error on one of the target's streams
    Io,
}

/// A script error with file/line context
#[derive(Debug)]
pub struct ScriptError {
    pub kind: ErrorKind,
    pub message: String,
    pub file: Option<String>,
    pub line: Option<usize>,
}

impl ScriptError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            file: None,
            line: None,
        }
    }

    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn spawn(program: &str, err: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Spawn, format!("failed to execute '{}': {}", program, err))
    }

    pub fn no_response(line: usize) -> Self {
        Self::new(ErrorKind::NoResponse, "no response from the program").with_line(line)
    }

    pub fn invalid_pattern(pattern: &str, err: impl fmt::Display) -> Self {
        Self::new(ErrorKind::InvalidPattern, format!("invalid regex /{}/: {}", pattern, err))
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref file) = self.file {
            write!(f, "{}:", file)?;
        }
        if let Some(line) = self.line {
            write!(f, "{}:", line)?;
        }
        if self.file.is_some() || self.line.is_some() {
            write!(f, " ")?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ScriptError {}

impl From<std::io::Error> for ScriptError {
    fn from(e: std::io::Error) -> Self {
        Self::new(ErrorKind::Io, e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_location() {
        let err = ScriptError::no_response(4).with_file("greet.script");
        assert_eq!(err.to_string(), "greet.script:4: no response from the program");
    }

    #[test]
    fn test_display_without_location() {
        let err = ScriptError::new(ErrorKind::EmptyScript, "empty script");
        assert_eq!(err.to_string(), "empty script");
    }

    #[test]
    fn test_invalid_pattern_message() {
        let err = ScriptError::invalid_pattern("a(", "unclosed group").with_line(2);
        assert_eq!(err.kind, ErrorKind::InvalidPattern);
        assert_eq!(err.to_string(), "2: invalid regex /a(/: unclosed group");
    }
}
