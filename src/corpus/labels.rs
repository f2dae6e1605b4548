//! Category labels.
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::io::json;

use super::PartitionDocs;

/// Append-only bijection between categories and integer labels.
///
/// A label is the index of its category in `label2cat`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSpace {
    label2cat: Vec<String>,
    cat2label: HashMap<String, u32>,
}

/// `label2cat` file content.
///
/// Saved as a list, but label-keyed objects are accepted too.
#[derive(Deserialize)]
#[serde(untagged)]
enum Label2Cat {
    List(Vec<String>),
    Map(BTreeMap<String, String>),
}

impl LabelSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.label2cat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.label2cat.is_empty()
    }

    /// label of `category`, bound to the next free label if `category` is new.
    pub fn label(&mut self, category: &str) -> u32 {
        if let Some(label) = self.cat2label.get(category) {
            return *label;
        }
        let label = self.label2cat.len() as u32;
        self.label2cat.push(category.to_string());
        self.cat2label.insert(category.to_string(), label);
        label
    }

    pub fn get(&self, category: &str) -> Option<u32> {
        self.cat2label.get(category).copied()
    }

    pub fn category(&self, label: u32) -> Option<&str> {
        self.label2cat.get(label as usize).map(String::as_str)
    }

    /// categories, in label order.
    pub fn categories(&self) -> &[String] {
        &self.label2cat
    }

    /// New space holding the `kept` labels only, renumbered in their original order.
    ///
    /// Returns the new space and the old -> new label map.
    pub fn compact(&self, kept: &BTreeSet<u32>) -> (LabelSpace, BTreeMap<u32, u32>) {
        let mut compacted = LabelSpace::new();
        let mut remap = BTreeMap::new();
        for (old, category) in self.label2cat.iter().enumerate() {
            let old = old as u32;
            if kept.contains(&old) {
                remap.insert(old, compacted.label(category));
            }
        }
        (compacted, remap)
    }

    pub fn save(&self, label2cat: &Path, cat2label: &Path) -> Result<(), Error> {
        json::save(&self.label2cat, label2cat)?;
        let sorted: BTreeMap<&String, &u32> = self.cat2label.iter().collect();
        json::save(&sorted, cat2label)
    }

    /// Load a saved space, checking that both files describe the same bijection.
    pub fn load(label2cat: &Path, cat2label: &Path) -> Result<Self, Error> {
        let categories = match json::load::<Label2Cat>(label2cat)? {
            Label2Cat::List(categories) => categories,
            Label2Cat::Map(map) => {
                let mut by_label = BTreeMap::new();
                for (label, category) in map {
                    let label: u32 = label
                        .parse()
                        .map_err(|_| Error::Custom(format!("invalid label {:?}", label)))?;
                    by_label.insert(label, category);
                }
                if by_label.keys().copied().ne(0..by_label.len() as u32) {
                    return Err(Error::Custom(format!(
                        "labels of {:?} are not contiguous",
                        label2cat
                    )));
                }
                by_label.into_values().collect()
            }
        };

        let mut space = LabelSpace::new();
        for category in &categories {
            space.label(category);
        }
        if space.len() != categories.len() {
            return Err(Error::Custom(format!(
                "duplicate categories in {:?}",
                label2cat
            )));
        }

        let expected: HashMap<String, u32> = json::load(cat2label)?;
        if expected != space.cat2label {
            return Err(Error::Custom(format!(
                "{:?} and {:?} disagree",
                label2cat, cat2label
            )));
        }
        Ok(space)
    }
}

/// Label the documents of `partitions` in order, extending `space` with their new categories.
pub fn assign_labels(partitions: &mut [PartitionDocs], mut space: LabelSpace) -> LabelSpace {
    for partition in partitions.iter_mut() {
        for doc in partition.documents.iter_mut() {
            doc.labels = doc.categories.iter().map(|c| space.label(c)).collect();
        }
    }
    debug!("{} labels assigned", space.len());
    space
}

/// Restrict `space` to the `kept` labels and renumber the labels of `partitions` accordingly.
///
/// Labels outside `kept` are removed from the documents, along with their categories.
pub fn compact_labels(
    partitions: &mut [PartitionDocs],
    space: &LabelSpace,
    kept: &BTreeSet<u32>,
) -> LabelSpace {
    let (compacted, remap) = space.compact(kept);
    for partition in partitions.iter_mut() {
        for doc in partition.documents.iter_mut() {
            doc.labels = doc
                .labels
                .iter()
                .filter_map(|label| remap.get(label).copied())
                .collect();
            doc.categories = doc
                .labels
                .iter()
                .filter_map(|label| compacted.category(*label).map(String::from))
                .collect();
        }
    }
    compacted
}

#[cfg(test)]
mod tests {
    use crate::corpus::{Document, PartitionDocs};

    use super::*;

    fn doc(pageid: u64, categories: &[&str]) -> Document {
        Document {
            pageid,
            title: pageid.to_string(),
            text: BTreeMap::new(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
            labels: Vec::new(),
            partition: "common".to_string(),
        }
    }

    fn partitions() -> Vec<PartitionDocs> {
        let mut common = PartitionDocs::new("common", &[]);
        common.documents = vec![doc(1, &["Physics", "Science"]), doc(2, &["Sports"])];
        let mut only_en = PartitionDocs::new("only_en", &[]);
        only_en.documents = vec![doc(3, &["Science", "Law"])];
        vec![common, only_en]
    }

    #[test]
    fn test_assign() {
        let mut parts = partitions();
        let space = assign_labels(&mut parts, LabelSpace::new());
        assert_eq!(space.categories(), &["Physics", "Science", "Sports", "Law"]);
        assert_eq!(parts[0].documents[0].labels, vec![0, 1]);
        assert_eq!(parts[1].documents[0].labels, vec![1, 3]);
    }

    #[test]
    fn test_labels_are_stable() {
        let mut space = LabelSpace::new();
        space.label("Law");
        let mut parts = partitions();
        let space = assign_labels(&mut parts, space);
        assert_eq!(space.get("Law"), Some(0));
        assert_eq!(space.get("Physics"), Some(1));

        // same inputs again: nothing moves
        let again = assign_labels(&mut partitions(), space.clone());
        assert_eq!(again, space);
        for (label, category) in space.categories().iter().enumerate() {
            assert_eq!(space.get(category), Some(label as u32));
        }
    }

    #[test]
    fn test_compact() {
        let mut parts = partitions();
        let space = assign_labels(&mut parts, LabelSpace::new());
        let kept: BTreeSet<u32> = vec![1, 3].into_iter().collect();
        let compacted = compact_labels(&mut parts, &space, &kept);

        assert_eq!(compacted.categories(), &["Science", "Law"]);
        assert_eq!(parts[0].documents[0].labels, vec![0]);
        assert_eq!(parts[0].documents[0].categories, vec!["Science"]);
        assert_eq!(parts[1].documents[0].labels, vec![0, 1]);
        // the original space is left as is
        assert_eq!(space.len(), 4);
    }

    #[test]
    fn test_save_load() {
        let dir = tempfile::tempdir().unwrap();
        let l2c = dir.path().join("label2cat.json");
        let c2l = dir.path().join("cat2label.json");
        let space = assign_labels(&mut partitions(), LabelSpace::new());
        space.save(&l2c, &c2l).unwrap();
        assert_eq!(LabelSpace::load(&l2c, &c2l).unwrap(), space);

        // string keyed label maps
        std::fs::write(&l2c, r#"{"1": "Science", "0": "Physics", "2": "Sports", "3": "Law"}"#).unwrap();
        assert_eq!(LabelSpace::load(&l2c, &c2l).unwrap(), space);

        std::fs::write(&l2c, r#"["Physics", "Science"]"#).unwrap();
        assert!(LabelSpace::load(&l2c, &c2l).is_err());
    }
}
