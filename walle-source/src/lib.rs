//! Source code representation and error management.

use std::{cell::RefCell, fmt};

use thiserror::Error as ThisError;

/// Represents source code.
pub struct Source<'a> {
    /// Original source code.
    pub content: &'a str,
    /// Accumulated errors.
    pub errors: ErrorReporter,
    /// Byte offset of the first character of every line.
    line_starts: Vec<usize>,
}

impl<'a> Source<'a> {
    /// Create a new `Source` with the specified `content`.
    pub fn new(content: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            content,
            errors: ErrorReporter::new(),
            line_starts,
        }
    }

    /// Returns `true` if `Source` has no accumulated errors. Returns `false` otherwise.
    pub fn has_no_errors(&self) -> bool {
        self.errors.is_empty()
    }

    /// Converts a byte `offset` into a 1-based line and column.
    /// Columns count characters, not bytes.
    pub fn location(&self, offset: usize) -> CodeLocation {
        let offset = offset.min(self.content.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self.content[line_start..offset].chars().count() + 1;
        CodeLocation::new(line + 1, column)
    }
}

impl<'a> From<&'a str> for Source<'a> {
    fn from(content: &'a str) -> Self {
        Source::new(content)
    }
}

/// A position in source code. Ordered line major, column minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CodeLocation {
    pub line: usize,
    pub column: usize,
}

impl CodeLocation {
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl Default for CodeLocation {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl fmt::Display for CodeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Every error the pipeline can produce, from malformed tokens to failures while drawing.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    #[error("[{location}] Lexical error: {message}")]
    Lexical {
        location: CodeLocation,
        message: String,
    },
    #[error("[{location}] Syntax error: {message}")]
    Syntax {
        location: CodeLocation,
        message: String,
        /// Text of the offending token.
        found: String,
        /// Human-readable descriptions of what would have been accepted.
        expected: Vec<String>,
    },
    #[error("[{location}] Semantic error: {message}")]
    Semantic {
        location: CodeLocation,
        message: String,
    },
    #[error("[{location}] Runtime error: {message}")]
    Runtime {
        location: CodeLocation,
        message: String,
    },
    /// Boundary I/O failure (unreadable file, undecodable image...). Has no location.
    #[error("Import error: {message}")]
    Import { message: String },
}

impl Error {
    pub fn lexical(location: CodeLocation, message: impl ToString) -> Self {
        Self::Lexical {
            location,
            message: message.to_string(),
        }
    }

    pub fn syntax(
        location: CodeLocation,
        message: impl ToString,
        found: impl ToString,
        expected: Vec<String>,
    ) -> Self {
        Self::Syntax {
            location,
            message: message.to_string(),
            found: found.to_string(),
            expected,
        }
    }

    pub fn semantic(location: CodeLocation, message: impl ToString) -> Self {
        Self::Semantic {
            location,
            message: message.to_string(),
        }
    }

    pub fn runtime(location: CodeLocation, message: impl ToString) -> Self {
        Self::Runtime {
            location,
            message: message.to_string(),
        }
    }

    pub fn import(message: impl ToString) -> Self {
        Self::Import {
            message: message.to_string(),
        }
    }

    /// Returns the location of the error or `None` for [`Error::Import`].
    pub fn location(&self) -> Option<CodeLocation> {
        match self {
            Error::Lexical { location, .. }
            | Error::Syntax { location, .. }
            | Error::Semantic { location, .. }
            | Error::Runtime { location, .. } => Some(*location),
            Error::Import { .. } => None,
        }
    }

    /// Returns the message without location and kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Error::Lexical { message, .. }
            | Error::Syntax { message, .. }
            | Error::Semantic { message, .. }
            | Error::Runtime { message, .. }
            | Error::Import { message } => message,
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, Error::Runtime { .. })
    }
}

/// Manages all the errors.
pub struct ErrorReporter {
    errors: RefCell<Vec<Error>>,
}

impl ErrorReporter {
    /// Create an empty `ErrorReporter`.
    pub fn new() -> Self {
        Self {
            errors: RefCell::new(Vec::new()),
        }
    }

    /// Adds an error to the `ErrorReporter`.
    /// This method uses the interior mutability pattern. This does not require mutability for ergonomics.
    pub fn add_error(&self, error: Error) {
        // This should be the only place where self.errors is borrowed mutably.
        self.errors.borrow_mut().push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.borrow().len()
    }

    /// Returns a copy of all the errors reported so far, in reporting order.
    pub fn errors(&self) -> Vec<Error> {
        self.errors.borrow().clone()
    }

    /// Removes and returns all the accumulated errors.
    pub fn take(&self) -> Vec<Error> {
        self.errors.borrow_mut().drain(..).collect()
    }
}

impl Default for ErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ErrorReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors.borrow();
        for error in errors.iter() {
            writeln!(f, "{}", error)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location() {
        let source = Source::new("ab\ncd\n\né");
        assert_eq!(source.location(0), CodeLocation::new(1, 1));
        assert_eq!(source.location(1), CodeLocation::new(1, 2));
        assert_eq!(source.location(2), CodeLocation::new(1, 3));
        assert_eq!(source.location(3), CodeLocation::new(2, 1));
        assert_eq!(source.location(6), CodeLocation::new(3, 1));
        assert_eq!(source.location(7), CodeLocation::new(4, 1));
        // end of input, after a multibyte character
        assert_eq!(source.location(9), CodeLocation::new(4, 2));
    }

    #[test]
    fn test_location_ordering() {
        assert!(CodeLocation::new(1, 9) < CodeLocation::new(2, 1));
        assert!(CodeLocation::new(2, 1) < CodeLocation::new(2, 3));
    }

    #[test]
    fn test_error_display() {
        let error = Error::runtime(CodeLocation::new(3, 7), "Division by zero.");
        assert_eq!(error.to_string(), "[3:7] Runtime error: Division by zero.");
        assert_eq!(
            Error::import("missing file").to_string(),
            "Import error: missing file"
        );
        assert_eq!(error.location(), Some(CodeLocation::new(3, 7)));
        assert_eq!(Error::import("x").location(), None);
    }

    #[test]
    fn test_reporter() {
        let source = Source::new("");
        assert!(source.has_no_errors());
        source
            .errors
            .add_error(Error::semantic(CodeLocation::new(1, 1), "first"));
        source
            .errors
            .add_error(Error::semantic(CodeLocation::new(2, 1), "second"));
        assert!(!source.has_no_errors());
        assert_eq!(source.errors.len(), 2);
        assert_eq!(
            source.errors.to_string(),
            "[1:1] Semantic error: first\n[2:1] Semantic error: second\n"
        );
        assert_eq!(source.errors.take().len(), 2);
        assert!(source.errors.is_empty());
    }
}
