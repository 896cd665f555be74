//! Types for the metadata module.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One value of a keyword, with its comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordEntry {
    pub value: String,
    pub comment: String,
}

impl KeywordEntry {
    pub fn new(value: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            comment: comment.into(),
        }
    }
}

/// Keyword → entries, in first-seen keyword order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    keywords: Vec<(String, Vec<KeywordEntry>)>,
    index: HashMap<String, usize>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry under `keyword`.
    pub fn push(&mut self, keyword: impl Into<String>, entry: KeywordEntry) {
        let keyword = keyword.into();
        match self.index.get(&keyword) {
            Some(&idx) => self.keywords[idx].1.push(entry),
            None => {
                self.index.insert(keyword.clone(), self.keywords.len());
                self.keywords.push((keyword, vec![entry]));
            }
        }
    }

    pub fn get(&self, keyword: &str) -> Option<&[KeywordEntry]> {
        self.index
            .get(keyword)
            .map(|&idx| self.keywords[idx].1.as_slice())
    }

    /// Iterates keywords with their entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[KeywordEntry])> {
        self.keywords
            .iter()
            .map(|(keyword, entries)| (keyword.as_str(), entries.as_slice()))
    }

    /// Number of distinct keywords.
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    /// Total number of entries over all keywords.
    pub fn entry_count(&self) -> usize {
        self.keywords.iter().map(|(_, entries)| entries.len()).sum()
    }
}
