//! Category tree pipeline
//!
//! Builds (or resumes) the classified category tree, then maps it onto a primary level.
//! Writes the final tree, the subcategory map and the primary category list under the destination folder.
use std::path::PathBuf;

use log::info;

use crate::error::Error;
use crate::fetch::WikiSource;
use crate::io::{json, TreeLayout};
use crate::tree::{save_mapping, Mapping, SubcategoryMapper, TreeBuilder, TreeParams};

use super::Pipeline;

/// Where an interrupted construction resumes from.
#[derive(Debug, Clone)]
pub enum Resume {
    /// a saved partial tree, expanded from `start_level`.
    File { path: PathBuf, start_level: usize },
    /// the checkpoints left in the destination folder.
    Checkpoints,
}

pub struct TreePipeline<'a, S: WikiSource> {
    source: &'a S,
    roots: Vec<String>,
    dst: PathBuf,
    name: String,
    params: TreeParams,
    primary_level: usize,
    resume: Option<Resume>,
}

impl<'a, S: WikiSource> TreePipeline<'a, S> {
    pub fn new(
        source: &'a S,
        roots: Vec<String>,
        dst: PathBuf,
        name: String,
        params: TreeParams,
        primary_level: usize,
    ) -> Self {
        Self {
            source,
            roots,
            dst,
            name,
            params,
            primary_level,
            resume: None,
        }
    }

    pub fn with_resume(mut self, resume: Option<Resume>) -> Self {
        self.resume = resume;
        self
    }
}

impl<'a, S: WikiSource> Pipeline<Mapping> for TreePipeline<'a, S> {
    fn run(&self) -> Result<Mapping, Error> {
        let layout = TreeLayout::new(&self.dst, &self.name);
        let builder = TreeBuilder::new(self.source, self.params.clone()).with_layout(layout.clone());

        let tree = match &self.resume {
            None => builder.build(self.roots.iter().cloned())?,
            Some(Resume::File { path, start_level }) => {
                info!("resuming {:?} at level {}", path, start_level);
                builder.resume(json::load(path)?, *start_level)?
            }
            Some(Resume::Checkpoints) => {
                let (partial, start_level) = builder.recover(self.roots.iter().cloned())?;
                builder.resume(partial, start_level)?
            }
        };
        info!(
            "tree {}: {} categories over {} levels",
            self.name,
            tree.len(),
            tree.last_level() + 1
        );

        let mapping = SubcategoryMapper::new(self.primary_level)
            .with_max_level(self.params.max_level)
            .map(&tree);
        save_mapping(&mapping, &layout, tree.last_level(), self.primary_level)?;
        Ok(mapping)
    }
}
