//! Per-language corpus files.
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::{monolingual_partition, COMMON_PARTITION};
use crate::error::Error;
use crate::fetch::PageId;

use super::PartitionDocs;

/// Columnar corpus of a single language: the i-th entry of each column describes the i-th document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCorpus {
    pub language: String,
    pub id: Vec<PageId>,
    pub title: Vec<String>,
    pub text: Vec<String>,
    pub categories: Vec<Vec<String>>,
    pub label: Vec<Vec<u32>>,
    pub partition: Vec<String>,
}

impl LanguageCorpus {
    pub fn len(&self) -> usize {
        self.id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}

/// Build the corpus of `language` from its monolingual partition followed by the bilingual one.
pub fn restructure(partitions: &[PartitionDocs], language: &str) -> Result<LanguageCorpus, Error> {
    let mut corpus = LanguageCorpus {
        language: language.to_string(),
        ..Default::default()
    };

    for name in [monolingual_partition(language), COMMON_PARTITION.to_string()] {
        let partition = partitions
            .iter()
            .find(|p| p.name == name)
            .ok_or_else(|| Error::MissingPartition(name.clone()))?;

        for doc in &partition.documents {
            let text = match doc.text.get(language) {
                Some(text) => text.clone(),
                None => {
                    warn!("{} has no {} text, skipping", doc.title, language);
                    continue;
                }
            };
            corpus.id.push(doc.pageid);
            corpus.title.push(doc.title.clone());
            corpus.text.push(text);
            corpus.categories.push(doc.categories.clone());
            corpus.label.push(doc.labels.clone());
            corpus.partition.push(partition.name.clone());
        }
    }

    info!("{} corpus: {} documents", language, corpus.len());
    Ok(corpus)
}
