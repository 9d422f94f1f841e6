//! Bug log
//!
//! Append-only, ordered record of every applied mutation. Records are never
//! removed or reordered; the log of a run is in traversal (pre-)order.

use serde::{Deserialize, Serialize};

use crate::rules::RuleKind;

/// One applied mutation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    /// Rule that produced the mutation
    pub kind: RuleKind,
    /// Human-readable description
    pub description: String,
}

impl MutationRecord {
    /// Create record
    #[inline]
    #[must_use]
    pub fn new(kind: RuleKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }
}

impl std::fmt::Display for MutationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)
    }
}

/// Ordered mutation records of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BugLog {
    records: Vec<MutationRecord>,
}

impl BugLog {
    /// Create empty log
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record
    pub fn record(&mut self, kind: RuleKind, description: impl Into<String>) {
        self.records.push(MutationRecord::new(kind, description));
    }

    /// Number of records
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if no mutation was applied
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records in order
    pub fn iter(&self) -> std::slice::Iter<'_, MutationRecord> {
        self.records.iter()
    }

    /// Records as a slice
    #[inline]
    #[must_use]
    pub fn records(&self) -> &[MutationRecord] {
        &self.records
    }

    /// Descriptions in order
    #[must_use]
    pub fn descriptions(&self) -> Vec<String> {
        self.records.iter().map(|r| r.description.clone()).collect()
    }

    /// Number of records produced by `kind`
    #[must_use]
    pub fn count_of(&self, kind: RuleKind) -> usize {
        self.records.iter().filter(|r| r.kind == kind).count()
    }
}

impl<'a> IntoIterator for &'a BugLog {
    type Item = &'a MutationRecord;
    type IntoIter = std::slice::Iter<'a, MutationRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_keep_insertion_order() {
        let mut log = BugLog::new();
        log.record(RuleKind::Rename, "Renamed variable 'x' to 'x_bug'");
        log.record(RuleKind::ConstantShift, "Changed constant 1 to 2");

        assert_eq!(log.len(), 2);
        assert_eq!(
            log.descriptions(),
            vec!["Renamed variable 'x' to 'x_bug'", "Changed constant 1 to 2"]
        );
        assert_eq!(log.count_of(RuleKind::Rename), 1);
        assert_eq!(log.count_of(RuleKind::StatementWrap), 0);
    }

    #[test]
    fn serializes_as_list_of_records() {
        let mut log = BugLog::new();
        log.record(RuleKind::OperatorSwap, "Swapped '+' to '-' in expression");
        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"kind": "operator_swap", "description": "Swapped '+' to '-' in expression"}
            ])
        );
    }
}
