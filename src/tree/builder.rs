//! Level by level category tree construction.
use std::collections::BTreeMap;
use std::path::PathBuf;

use glob::glob;
use log::{debug, info, warn};

use crate::constants::MEMBER_LIMIT;
use crate::error::Error;
use crate::fetch::WikiSource;
use crate::filtering::{Filter, NameFilter};
use crate::io::{json, TreeLayout};

use super::{Category, CategoryTree, Classification};

#[derive(Debug, Clone)]
pub struct TreeParams {
    /// deepest level that is expanded into.
    pub max_level: usize,
    /// write a checkpoint after each level.
    pub backup: bool,
    pub member_limit: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_level: 25,
            backup: true,
            member_limit: MEMBER_LIMIT,
        }
    }
}

/// Breadth-first classification of the category graph.
///
/// Each level, the subcategories of the significant categories of the level are fetched
/// and classified with a [NameFilter].
/// When a [TreeLayout] is set, each new level is checkpointed before the next one is expanded,
/// and the final tree replaces the checkpoints once construction is over.
pub struct TreeBuilder<'a, S: WikiSource> {
    source: &'a S,
    filter: NameFilter,
    params: TreeParams,
    layout: Option<TreeLayout>,
}

impl<'a, S: WikiSource> TreeBuilder<'a, S> {
    pub fn new(source: &'a S, params: TreeParams) -> Self {
        Self {
            source,
            filter: NameFilter::default(),
            params,
            layout: None,
        }
    }

    pub fn with_filter(mut self, filter: NameFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_layout(mut self, layout: TreeLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Build the tree from scratch.
    pub fn build<I, R>(&self, roots: I) -> Result<CategoryTree, Error>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.grow(CategoryTree::from_roots(roots), 0)
    }

    /// Continue a partial tree, expanding the significant categories of `start_level` first.
    pub fn resume(&self, tree: CategoryTree, start_level: usize) -> Result<CategoryTree, Error> {
        let inconsistent = tree.inconsistencies();
        if !inconsistent.is_empty() {
            warn!(
                "resuming a tree with {} inconsistent parent links (first: {:?})",
                inconsistent.len(),
                inconsistent[0]
            );
        }
        self.grow(tree, start_level)
    }

    /// Rebuild a partial tree from the checkpoints left by an interrupted run.
    ///
    /// Returns the tree and the level to resume from.
    /// Without checkpoints, the tree only holds `roots` and construction starts over.
    pub fn recover<I, R>(&self, roots: I) -> Result<(CategoryTree, usize), Error>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        let layout = self
            .layout
            .as_ref()
            .ok_or_else(|| Error::Custom("no tree location to recover from".to_string()))?;

        let mut tree = CategoryTree::from_roots(roots);
        let checkpoints = glob(&layout.checkpoint_pattern())?.collect::<Result<Vec<PathBuf>, _>>()?;
        for checkpoint in &checkpoints {
            let level: BTreeMap<String, Category> = json::load(checkpoint)?;
            tree.merge(level);
        }

        let start = tree.last_level();
        info!(
            "recovered {} categories from {} checkpoints, resuming at level {}",
            tree.len(),
            checkpoints.len(),
            start
        );
        Ok((tree, start))
    }

    fn grow(&self, mut tree: CategoryTree, mut level: usize) -> Result<CategoryTree, Error> {
        while level < self.params.max_level {
            let discovered = match self.expand(&tree, level) {
                Some(d) => d,
                None => {
                    info!("no significant category at level {}, stopping", level);
                    break;
                }
            };
            level += 1;

            if let (Some(layout), true) = (&self.layout, self.params.backup) {
                let path = layout.checkpoint(level);
                if path.exists() {
                    warn!("overwriting checkpoint {:?}", path);
                }
                json::save(&discovered, &path)?;
            }
            tree.merge(discovered);

            info!(
                "level={} SGFNT={} INSGFNT={} AMBIGUOUS={}",
                level,
                tree.count(level, Classification::Significant),
                tree.count(level, Classification::Insignificant),
                tree.count(level, Classification::Ambiguous),
            );
        }

        if let Some(layout) = &self.layout {
            json::save(&tree, &layout.tree(tree.last_level()))?;
            for checkpoint in glob(&layout.checkpoint_pattern())? {
                let checkpoint = checkpoint?;
                debug!("removing checkpoint {:?}", checkpoint);
                std::fs::remove_file(checkpoint)?;
            }
        }

        Ok(tree)
    }

    /// Classify the subcategories of the significant categories at `level`.
    ///
    /// Returns [None] if there is no significant category to expand.
    fn expand(&self, tree: &CategoryTree, level: usize) -> Option<BTreeMap<String, Category>> {
        let current = tree.at_level(level, Classification::Significant);
        if current.is_empty() {
            return None;
        }

        let mut discovered: BTreeMap<String, Category> = BTreeMap::new();
        for parent in current {
            let members = match self.source.category_members(parent, self.params.member_limit) {
                Ok(m) => m,
                Err(e) => {
                    e.log(&format!("subcategories of {}", parent));
                    continue;
                }
            };

            for name in members.subcategories {
                // known from an earlier level, keep the existing record
                if tree.contains(&name) {
                    continue;
                }

                match discovered.get_mut(&name) {
                    Some(node) if !node.parents.contains(parent) => match node.class {
                        Classification::Significant | Classification::Ambiguous => {
                            node.class = Classification::Ambiguous;
                            node.parents.insert(parent.to_string());
                        }
                        _ => debug!("{} already found insignificant, ignoring {}", name, parent),
                    },
                    Some(_) => (),
                    None => {
                        let class = if self.filter.detect(name.as_str()) {
                            Classification::Significant
                        } else {
                            Classification::Insignificant
                        };
                        discovered.insert(name, Category::child(level + 1, class, parent));
                    }
                }
            }
        }

        Some(discovered)
    }
}
