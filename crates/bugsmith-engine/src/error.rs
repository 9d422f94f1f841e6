//! Engine error types

use bugsmith_syntax::ParseError;
use serde::{Deserialize, Serialize};

/// Rejected run configuration
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Chaos level outside the accepted range
    #[error("chaos level must be between {min} and {max}, got {level}")]
    LevelOutOfRange { level: i64, min: u8, max: u8 },

    /// A limit that must be positive was zero
    #[error("{name} must be greater than zero")]
    ZeroLimit { name: &'static str },
}

/// Failure of a single injection run
///
/// A failed run never produces partial output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InjectError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("source text is empty")]
    EmptyInput,

    #[error("source is {size} bytes, limit is {limit}")]
    SourceTooLarge { size: usize, limit: usize },

    #[error("invalid syntax: {0}")]
    InvalidSyntax(ParseError),

    /// Valid Python outside the supported node set
    #[error("{0}")]
    UnsupportedSyntax(ParseError),

    /// Nesting beyond the parser's depth limit
    #[error("source too complex: {0}")]
    SourceTooComplex(ParseError),

    /// The rendered mutant did not parse
    #[error("mutated program is not valid source: {0}")]
    InternalConsistency(String),
}

impl From<ParseError> for InjectError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Unsupported { .. } => Self::UnsupportedSyntax(err),
            ParseError::TooDeep { .. } => Self::SourceTooComplex(err),
            ParseError::Syntax { .. } | ParseError::ParserInit(_) | ParseError::ParseFailed => {
                Self::InvalidSyntax(err)
            }
        }
    }
}

impl InjectError {
    /// Parser error behind a rejected source
    #[must_use]
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            Self::InvalidSyntax(err) | Self::UnsupportedSyntax(err) | Self::SourceTooComplex(err) => {
                Some(err)
            }
            _ => None,
        }
    }

    /// Machine-readable error category
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            Self::EmptyInput => ErrorKind::EmptyInput,
            Self::SourceTooLarge { .. } => ErrorKind::SourceTooLarge,
            Self::InvalidSyntax(_) => ErrorKind::InvalidSyntax,
            Self::UnsupportedSyntax(_) => ErrorKind::UnsupportedSyntax,
            Self::SourceTooComplex(_) => ErrorKind::SourceTooComplex,
            Self::InternalConsistency(_) => ErrorKind::InternalConsistencyFailure,
        }
    }

    /// Caller supplied bad input (as opposed to an engine defect)
    #[inline]
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        !matches!(self, Self::InternalConsistency(_))
    }
}

/// Error category as reported on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidConfiguration,
    EmptyInput,
    SourceTooLarge,
    InvalidSyntax,
    UnsupportedSyntax,
    SourceTooComplex,
    InternalConsistencyFailure,
}

impl ErrorKind {
    /// Wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidConfiguration => "invalid_configuration",
            Self::EmptyInput => "empty_input",
            Self::SourceTooLarge => "source_too_large",
            Self::InvalidSyntax => "invalid_syntax",
            Self::UnsupportedSyntax => "unsupported_syntax",
            Self::SourceTooComplex => "source_too_complex",
            Self::InternalConsistencyFailure => "internal_consistency_failure",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bugsmith_syntax::Position;

    #[test]
    fn config_error_converts_into_inject_error() {
        let err: InjectError = ConfigError::LevelOutOfRange {
            level: 11,
            min: 1,
            max: 10,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
        assert_eq!(
            err.to_string(),
            "invalid configuration: chaos level must be between 1 and 10, got 11"
        );
    }

    #[test]
    fn syntax_error_message_is_kept() {
        let parse = ParseError::syntax("unexpected `=`", Position::new(1, 5));
        let err = InjectError::from(parse.clone());
        assert_eq!(err.kind(), ErrorKind::InvalidSyntax);
        assert!(err.to_string().ends_with(&parse.to_string()));
    }

    #[test]
    fn parse_failures_are_categorized() {
        let position = Position::new(2, 1);
        let unsupported = InjectError::from(ParseError::unsupported("type parameters", position));
        assert_eq!(unsupported.kind(), ErrorKind::UnsupportedSyntax);
        assert_eq!(
            unsupported.to_string(),
            "unsupported syntax at line 2, column 1: type parameters"
        );

        let deep = InjectError::from(ParseError::TooDeep { limit: 256, position });
        assert_eq!(deep.kind(), ErrorKind::SourceTooComplex);
        assert!(deep.is_user_error());
        assert_eq!(deep.parse_error().and_then(ParseError::position), Some(position));

        assert_eq!(InjectError::from(ParseError::ParseFailed).kind(), ErrorKind::InvalidSyntax);
        assert_eq!(InjectError::EmptyInput.parse_error(), None);
    }

    #[test]
    fn kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&ErrorKind::InternalConsistencyFailure).unwrap();
        assert_eq!(json, "\"internal_consistency_failure\"");
        assert_eq!(ErrorKind::SourceTooLarge.as_str(), "source_too_large");
        assert_eq!(
            serde_json::to_string(&ErrorKind::SourceTooComplex).unwrap(),
            "\"source_too_complex\""
        );
    }

    #[test]
    fn only_consistency_failures_are_engine_errors() {
        assert!(InjectError::EmptyInput.is_user_error());
        assert!(!InjectError::InternalConsistency("boom".into()).is_user_error());
    }
}
