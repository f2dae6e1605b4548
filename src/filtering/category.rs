//! Category name relevance filtering.
use std::collections::HashSet;

use crate::constants::{REMOVE_PREPOSITIONS, REMOVE_WORDS};

use super::Filter;

/// Keeps categories whose name looks like a topic.
///
/// A name is rejected when its lowercase form contains one of `prepositions` surrounded by spaces
/// (`"Sports by country"`), or any of `words` as a substring (`"Lists of sportspeople"`).
#[derive(Debug, Clone)]
pub struct NameFilter {
    prepositions: Vec<String>,
    words: Vec<String>,
}

impl NameFilter {
    pub fn new(prepositions: Vec<String>, words: Vec<String>) -> Self {
        Self {
            prepositions: prepositions
                .into_iter()
                .map(|p| format!(" {} ", p.to_lowercase()))
                .collect(),
            words: words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Keep the significant names of `names`, dropping repetitions.
    ///
    /// First occurrences are kept, in input order.
    pub fn clean<I, S>(&self, names: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        names
            .into_iter()
            .filter(|name| self.detect(name.as_ref()))
            .filter(|name| seen.insert(name.as_ref().to_string()))
            .map(|name| name.as_ref().to_string())
            .collect()
    }
}

impl Filter<&str> for NameFilter {
    fn detect(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        !(self.prepositions.iter().any(|p| name.contains(p.as_str()))
            || self.words.iter().any(|w| name.contains(w.as_str())))
    }
}

impl Default for NameFilter {
    /// inits the filter with the crate-wide banned prepositions and words.
    fn default() -> Self {
        Self::new(
            REMOVE_PREPOSITIONS.iter().map(|s| s.to_string()).collect(),
            REMOVE_WORDS.iter().map(|s| s.to_string()).collect(),
        )
    }
}
