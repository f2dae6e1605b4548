//! Rare label removal.
use std::collections::{BTreeMap, BTreeSet};

use log::info;

use crate::constants::COMMON_PARTITION;

use super::PartitionDocs;

/// Weight of a document of `partition` in label frequencies.
///
/// Documents of the bilingual partition are counted once per language.
fn weight(partition: &str) -> usize {
    if partition == COMMON_PARTITION {
        2
    } else {
        1
    }
}

/// Weighted number of documents of each label.
pub fn label_weights(partitions: &[PartitionDocs]) -> BTreeMap<u32, usize> {
    let mut weights = BTreeMap::new();
    for partition in partitions {
        let w = weight(&partition.name);
        for doc in &partition.documents {
            for label in &doc.labels {
                *weights.entry(*label).or_insert(0) += w;
            }
        }
    }
    weights
}

/// Remove labels whose weight is below `min_weight`, then the documents left without labels.
///
/// Returns the labels kept. Document categories are not updated, see [super::compact_labels].
pub fn drop_rare_labels(partitions: &mut [PartitionDocs], min_weight: usize) -> BTreeSet<u32> {
    let weights = label_weights(partitions);
    let kept: BTreeSet<u32> = weights
        .iter()
        .filter(|(_, w)| **w >= min_weight)
        .map(|(label, _)| *label)
        .collect();

    for partition in partitions.iter_mut() {
        let before = partition.documents.len();
        for doc in partition.documents.iter_mut() {
            doc.labels.retain(|label| kept.contains(label));
        }
        partition.documents.retain(|doc| !doc.labels.is_empty());
        info!(
            "{}: kept {} of {} documents",
            partition.name,
            partition.documents.len(),
            before
        );
    }
    info!(
        "kept {} of {} labels weighing at least {}",
        kept.len(),
        weights.len(),
        min_weight
    );
    kept
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::corpus::Document;

    use super::*;

    fn doc(pageid: u64, labels: &[u32]) -> Document {
        Document {
            pageid,
            title: pageid.to_string(),
            text: BTreeMap::new(),
            categories: Vec::new(),
            labels: labels.to_vec(),
            partition: String::new(),
        }
    }

    fn partitions() -> Vec<PartitionDocs> {
        let mut common = PartitionDocs::new("common", &[]);
        common.documents = vec![doc(1, &[0, 1])];
        let mut only_en = PartitionDocs::new("only_en", &[]);
        only_en.documents = vec![doc(2, &[0]), doc(3, &[2])];
        vec![common, only_en]
    }

    #[test]
    fn test_weights() {
        let weights = label_weights(&partitions());
        assert_eq!(weights.get(&0), Some(&3));
        assert_eq!(weights.get(&1), Some(&2));
        assert_eq!(weights.get(&2), Some(&1));
    }

    #[test_log::test]
    fn test_threshold_is_inclusive() {
        let mut parts = partitions();
        let kept = drop_rare_labels(&mut parts, 3);
        assert_eq!(kept, vec![0].into_iter().collect());
        assert_eq!(parts[0].documents[0].labels, vec![0]);
        assert_eq!(parts[1].documents.len(), 1);
        assert_eq!(parts[1].documents[0].pageid, 2);

        for (_, w) in label_weights(&parts) {
            assert!(w >= 3);
        }
    }
}
