//! Engine configuration

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default input size limit (16 MiB)
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 16 * 1024 * 1024;

/// Limits and output options shared by every run of a [`BugInjector`](crate::BugInjector)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest accepted source text, in bytes
    pub max_source_bytes: usize,
    /// Deepest accepted syntactic nesting
    pub max_nesting_depth: usize,
    /// Prepend the metadata docstring to the mutated text
    pub include_header: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
            max_nesting_depth: bugsmith_syntax::DEFAULT_MAX_DEPTH,
            include_header: true,
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With input size limit
    #[inline]
    #[must_use]
    pub fn with_max_source_bytes(mut self, bytes: usize) -> Self {
        self.max_source_bytes = bytes;
        self
    }

    /// With nesting depth limit
    #[inline]
    #[must_use]
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// With or without the metadata header
    #[inline]
    #[must_use]
    pub fn with_header(mut self, include: bool) -> Self {
        self.include_header = include;
        self
    }

    /// Check limits
    ///
    /// # Errors
    /// Returns [`ConfigError::ZeroLimit`] if a limit is zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_source_bytes == 0 {
            return Err(ConfigError::ZeroLimit {
                name: "max_source_bytes",
            });
        }
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::ZeroLimit {
                name: "max_nesting_depth",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_source_bytes, 16 * 1024 * 1024);
        assert_eq!(config.max_nesting_depth, 256);
        assert!(config.include_header);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_limits_are_rejected() {
        assert!(EngineConfig::new().with_max_source_bytes(0).validate().is_err());
        assert!(EngineConfig::new().with_max_nesting_depth(0).validate().is_err());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"include_header": false}"#).unwrap();
        assert!(!config.include_header);
        assert_eq!(config.max_source_bytes, DEFAULT_MAX_SOURCE_BYTES);
    }
}
