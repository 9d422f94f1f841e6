//! Parse error types

use std::fmt;

/// 1-based source position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    /// Line number, starting at 1
    pub line: usize,
    /// Column (byte offset within the line), starting at 1
    pub column: usize,
}

impl Position {
    #[inline]
    #[must_use]
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl From<tree_sitter::Point> for Position {
    fn from(point: tree_sitter::Point) -> Self {
        Self {
            line: point.row + 1,
            column: point.column + 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Errors while turning source text into a [`Module`](crate::Module)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Grammar could not be loaded
    #[error("parser initialization failed: {0}")]
    ParserInit(String),

    /// Parser produced no tree
    #[error("parse failed")]
    ParseFailed,

    /// Source is not valid Python
    #[error("syntax error at {position}: {message}")]
    Syntax { message: String, position: Position },

    /// Valid Python outside the supported node set
    #[error("unsupported syntax at {position}: {construct}")]
    Unsupported { construct: String, position: Position },

    /// Nesting exceeds the configured depth limit
    #[error("nesting deeper than {limit} levels at {position}")]
    TooDeep { limit: usize, position: Position },
}

impl ParseError {
    /// Create syntax error at position
    pub fn syntax(message: impl Into<String>, position: Position) -> Self {
        Self::Syntax {
            message: message.into(),
            position,
        }
    }

    /// Create unsupported-construct error at position
    pub fn unsupported(construct: impl Into<String>, position: Position) -> Self {
        Self::Unsupported {
            construct: construct.into(),
            position,
        }
    }

    /// Location of the failure, when the parser reported one
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Syntax { position, .. }
            | Self::Unsupported { position, .. }
            | Self::TooDeep { position, .. } => Some(*position),
            Self::ParserInit(_) | Self::ParseFailed => None,
        }
    }
}
