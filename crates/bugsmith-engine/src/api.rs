//! Run results and wire types
//!
//! [`MutationResult`] is what a run returns in-process; the request,
//! response and error types are its serde-facing shapes.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, InjectError};
use crate::log::BugLog;
use crate::policy::{ChaosLevel, DEFAULT_LEVEL};

/// Output of a successful run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationResult {
    /// Mutated program, metadata header included when enabled
    pub mutated_text: String,
    /// Applied mutations in traversal order
    pub bug_log: BugLog,
    /// Level the run used
    pub chaos_level: ChaosLevel,
}

impl MutationResult {
    /// Number of applied mutations
    #[inline]
    #[must_use]
    pub fn bug_count(&self) -> usize {
        self.bug_log.len()
    }
}

/// Injection request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRequest {
    pub source_text: String,
    /// Unvalidated level; checked by the run
    #[serde(default = "default_level")]
    pub chaos_level: i64,
}

fn default_level() -> i64 {
    i64::from(DEFAULT_LEVEL)
}

impl MutationRequest {
    /// Create request at the default level
    #[must_use]
    pub fn new(source_text: impl Into<String>) -> Self {
        Self {
            source_text: source_text.into(),
            chaos_level: default_level(),
        }
    }

    /// With chaos level
    #[inline]
    #[must_use]
    pub fn with_level(mut self, level: i64) -> Self {
        self.chaos_level = level;
        self
    }
}

/// Successful injection response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResponse {
    pub mutated_text: String,
    pub bug_log: Vec<String>,
    pub chaos_level: u8,
    pub bug_count: usize,
}

impl From<MutationResult> for MutationResponse {
    fn from(result: MutationResult) -> Self {
        Self {
            bug_count: result.bug_count(),
            bug_log: result.bug_log.descriptions(),
            chaos_level: result.chaos_level.get(),
            mutated_text: result.mutated_text,
        }
    }
}

/// Failed injection response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error_kind: ErrorKind,
    pub message: String,
}

impl From<&InjectError> for ErrorResponse {
    fn from(err: &InjectError) -> Self {
        Self {
            error_kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<InjectError> for ErrorResponse {
    fn from(err: InjectError) -> Self {
        Self::from(&err)
    }
}
