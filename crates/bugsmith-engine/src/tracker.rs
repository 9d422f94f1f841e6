//! Rename tracker
//!
//! Run-scoped mapping from an original identifier to its mutated spelling.
//! Entries are write-once, so every later occurrence of a renamed variable
//! is rewritten to the same new name.

use std::collections::HashMap;

/// Original identifier → mutated identifier, for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenameTracker {
    renames: HashMap<String, String>,
}

impl RenameTracker {
    /// Create empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mutated spelling of `original`, if it was renamed
    #[inline]
    #[must_use]
    pub fn get(&self, original: &str) -> Option<&str> {
        self.renames.get(original).map(String::as_str)
    }

    /// Check if `original` has been renamed
    #[inline]
    #[must_use]
    pub fn contains(&self, original: &str) -> bool {
        self.renames.contains_key(original)
    }

    /// Record a rename; returns false (keeping the first entry) if one exists
    pub fn record(&mut self, original: impl Into<String>, renamed: impl Into<String>) -> bool {
        use std::collections::hash_map::Entry;

        match self.renames.entry(original.into()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(renamed.into());
                true
            }
        }
    }

    /// Number of renamed identifiers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.renames.len()
    }

    /// Check if nothing has been renamed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }

    /// Iterate over `(original, renamed)` pairs in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.renames.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_write_once() {
        let mut tracker = RenameTracker::new();
        assert!(tracker.record("total", "total_bug"));
        assert!(!tracker.record("total", "total_oops"));
        assert_eq!(tracker.get("total"), Some("total_bug"));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn unknown_names_are_absent() {
        let tracker = RenameTracker::new();
        assert!(tracker.is_empty());
        assert!(!tracker.contains("x"));
        assert_eq!(tracker.get("x"), None);
    }
}
