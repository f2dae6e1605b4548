//! Classified category records and the tree holding them.
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::constants::{AMBIGUOUS_CAT_NAME, BAD_CAT_NAME, INSGFNT_CAT_NAME, SGFNT_CAT_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    /// Passes the name filter, expanded at the next level.
    #[serde(rename = "SGFNT")]
    Significant,
    #[serde(rename = "INSGFNT")]
    Insignificant,
    /// Reached from several parents during a single level expansion.
    #[serde(rename = "AMBIGUOUS")]
    Ambiguous,
    #[serde(rename = "bad cat")]
    Bad,
}

impl Classification {
    /// marker standing for this classification in subcategory maps.
    pub fn marker(self) -> &'static str {
        match self {
            Classification::Significant => SGFNT_CAT_NAME,
            Classification::Insignificant => INSGFNT_CAT_NAME,
            Classification::Ambiguous => AMBIGUOUS_CAT_NAME,
            Classification::Bad => BAD_CAT_NAME,
        }
    }
}

/// A category node. Its name is its key in [CategoryTree].
///
/// Roots have no parents. Every other node has exactly one parent,
/// except [Classification::Ambiguous] ones which keep all the parents they were reached from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub level: usize,
    pub class: Classification,
    pub parents: BTreeSet<String>,
}

impl Category {
    pub fn root() -> Self {
        Self {
            level: 0,
            class: Classification::Significant,
            parents: BTreeSet::new(),
        }
    }

    pub fn child(level: usize, class: Classification, parent: &str) -> Self {
        let mut parents = BTreeSet::new();
        parents.insert(parent.to_string());
        Self {
            level,
            class,
            parents,
        }
    }
}

/// Category name -> classified record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryTree {
    nodes: BTreeMap<String, Category>,
}

impl CategoryTree {
    pub fn from_roots<I, S>(roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: roots
                .into_iter()
                .map(|root| (root.into(), Category::root()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Category> {
        self.nodes.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Category)> {
        self.nodes.iter()
    }

    /// names of the `class` categories at `level`, in name order.
    pub fn at_level(&self, level: usize, class: Classification) -> Vec<&str> {
        self.nodes
            .iter()
            .filter(|(_, c)| c.level == level && c.class == class)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn count(&self, level: usize, class: Classification) -> usize {
        self.nodes
            .values()
            .filter(|c| c.level == level && c.class == class)
            .count()
    }

    /// deepest level of the tree.
    pub fn last_level(&self) -> usize {
        self.nodes.values().map(|c| c.level).max().unwrap_or(0)
    }

    /// Add the records of a level expansion.
    ///
    /// Records already present are left untouched.
    pub fn merge(&mut self, level: BTreeMap<String, Category>) {
        for (name, category) in level {
            self.nodes.entry(name).or_insert(category);
        }
    }

    /// (child, parent) pairs where the parent is unknown or not exactly one level above its child.
    pub fn inconsistencies(&self) -> Vec<(&str, &str)> {
        self.nodes
            .iter()
            .flat_map(|(name, category)| {
                category
                    .parents
                    .iter()
                    .filter(move |parent| match self.nodes.get(parent.as_str()) {
                        Some(p) => p.level + 1 != category.level,
                        None => true,
                    })
                    .map(move |parent| (name.as_str(), parent.as_str()))
            })
            .collect()
    }
}
