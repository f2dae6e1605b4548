//! File naming of persisted run state.
//!
//! Tree files live under a tree directory:
//! ```text
//! <dst>/backup/tree_<name>_level_<L>.json     per-level checkpoint
//! <dst>/tree_<name>_levels_0-<L>.json         final tree
//! <dst>/subcat2cat_<L>-<P>.json               subcategory -> primary category map
//! <dst>/categories_level_<P>_<n>.json         primary categories
//! ```
//! Corpus files live under `<dst>/dataset_<id>/`:
//! ```text
//! categories_main_<l1>-<l2>_<id>.json          selected category quota
//! backup/<partition>_bk.json                  raw documents of a partition
//! label2cat_<l1>-<l2>_<id>.json
//! cat2label_<l1>-<l2>_<id>.json
//! wikipedia_<lang>_<id>.json                  final corpus of a language
//! ```
use std::path::{Path, PathBuf};

use glob::Pattern;

#[derive(Debug, Clone)]
pub struct TreeLayout {
    root: PathBuf,
    name: String,
}

impl TreeLayout {
    pub fn new(root: &Path, name: &str) -> Self {
        Self {
            root: root.to_path_buf(),
            name: name.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join("backup")
    }

    pub fn checkpoint(&self, level: usize) -> PathBuf {
        self.backup_dir()
            .join(format!("tree_{}_level_{}.json", self.name, level))
    }

    /// glob pattern matching every checkpoint of this tree.
    pub fn checkpoint_pattern(&self) -> String {
        format!(
            "{}/tree_{}_level_*.json",
            Pattern::escape(&self.backup_dir().to_string_lossy()),
            Pattern::escape(&self.name)
        )
    }

    pub fn tree(&self, last_level: usize) -> PathBuf {
        self.root
            .join(format!("tree_{}_levels_0-{}.json", self.name, last_level))
    }

    pub fn subcat_map(&self, max_level: usize, primary_level: usize) -> PathBuf {
        self.root
            .join(format!("subcat2cat_{}-{}.json", max_level, primary_level))
    }

    pub fn primary_categories(&self, primary_level: usize, count: usize) -> PathBuf {
        self.root
            .join(format!("categories_level_{}_{}.json", primary_level, count))
    }
}

#[derive(Debug, Clone)]
pub struct DatasetLayout {
    dir: PathBuf,
    id: String,
    pair: String,
}

impl DatasetLayout {
    pub fn new(root: &Path, id: &str, lang1: &str, lang2: &str) -> Self {
        Self {
            dir: Self::dataset_dir(root, id),
            id: id.to_string(),
            pair: format!("{}-{}", lang1, lang2),
        }
    }

    /// directory holding every file of corpus `id`.
    pub fn dataset_dir(root: &Path, id: &str) -> PathBuf {
        root.join(format!("dataset_{}", id))
    }

    /// glob pattern matching the quota files of corpus `id`, whatever its languages.
    pub fn quota_pattern(root: &Path, id: &str) -> String {
        format!(
            "{}/categories_main_*-*_{}.json",
            Pattern::escape(&Self::dataset_dir(root, id).to_string_lossy()),
            Pattern::escape(id)
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.dir.join("backup")
    }

    pub fn quota(&self) -> PathBuf {
        self.dir
            .join(format!("categories_main_{}_{}.json", self.pair, self.id))
    }

    pub fn partition_backup(&self, partition: &str) -> PathBuf {
        self.backup_dir().join(format!("{}_bk.json", partition))
    }

    pub fn label2cat(&self) -> PathBuf {
        self.dir
            .join(format!("label2cat_{}_{}.json", self.pair, self.id))
    }

    pub fn cat2label(&self) -> PathBuf {
        self.dir
            .join(format!("cat2label_{}_{}.json", self.pair, self.id))
    }

    pub fn corpus(&self, lang: &str) -> PathBuf {
        self.dir
            .join(format!("wikipedia_{}_{}.json", lang, self.id))
    }
}
