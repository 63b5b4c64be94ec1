//! Types for the batch module.

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;

use crate::converter::ConversionResult;

/// Per-file results of one directory batch, ordered by file name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchResult {
    results: BTreeMap<String, ConversionResult>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the result for `name`, replacing any earlier entry.
    pub fn insert(&mut self, name: impl Into<String>, result: ConversionResult) {
        self.results.insert(name.into(), result);
    }

    pub fn get(&self, name: &str) -> Option<&ConversionResult> {
        self.results.get(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// File names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(|k| k.as_str())
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, ConversionResult> {
        self.results.iter()
    }

    /// Entries that converted successfully.
    pub fn succeeded(&self) -> impl Iterator<Item = (&String, &ConversionResult)> {
        self.results.iter().filter(|(_, r)| r.success())
    }

    /// Entries that failed.
    pub fn failed(&self) -> impl Iterator<Item = (&String, &ConversionResult)> {
        self.results.iter().filter(|(_, r)| !r.success())
    }

    pub fn success_count(&self) -> usize {
        self.succeeded().count()
    }

    pub fn failure_count(&self) -> usize {
        self.failed().count()
    }

    /// True when no entry failed (vacuously true for an empty batch).
    pub fn all_succeeded(&self) -> bool {
        self.results.values().all(|r| r.success())
    }
}

impl FromIterator<(String, ConversionResult)> for BatchResult {
    fn from_iter<I: IntoIterator<Item = (String, ConversionResult)>>(iter: I) -> Self {
        Self {
            results: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = (&'a String, &'a ConversionResult);
    type IntoIter = btree_map::Iter<'a, String, ConversionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

impl IntoIterator for BatchResult {
    type Item = (String, ConversionResult);
    type IntoIter = btree_map::IntoIter<String, ConversionResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}
