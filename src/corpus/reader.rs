//! Reading back a finished corpus.
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::glob;
use itertools::Itertools;
use log::{info, warn};

use crate::error::Error;
use crate::io::{json, DatasetLayout};
use crate::selection::CategoryQuota;

use super::{LabelSpace, LanguageCorpus};

/// A document of the dataset, in either language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<'a> {
    pub id: u64,
    pub text: &'a str,
    pub labels: &'a [u32],
    /// 0 for the first language, 1 for the second one.
    pub language: usize,
}

/// Labels split by the languages they appear in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterTypes {
    /// first language only.
    pub mono1: BTreeSet<u32>,
    pub bi: BTreeSet<u32>,
    /// second language only.
    pub mono2: BTreeSet<u32>,
}

impl ClusterTypes {
    /// 0 for mono1, 1 for bi, 2 for mono2, -1 for unknown labels.
    pub fn type_of(&self, label: u32) -> i8 {
        if self.bi.contains(&label) {
            1
        } else if self.mono1.contains(&label) {
            0
        } else if self.mono2.contains(&label) {
            2
        } else {
            -1
        }
    }
}

/// Read only access to the files of a finished corpus.
#[derive(Debug)]
pub struct CorpusReader {
    id: String,
    languages: [String; 2],
    corpora: [LanguageCorpus; 2],
    labels: LabelSpace,
    quota: CategoryQuota,
}

impl CorpusReader {
    /// Open corpus `id` stored under `dir`.
    ///
    /// The languages are read from the quota files of the corpus.
    /// A quota file is only trusted when its name matches the languages it holds.
    pub fn open(dir: &Path, id: &str) -> Result<Self, Error> {
        let paths = glob(&DatasetLayout::quota_pattern(dir, id))?
            .collect::<Result<Vec<PathBuf>, _>>()?;
        let mut quotas: Vec<CategoryQuota> = Vec::with_capacity(paths.len());
        for path in &paths {
            let quota = match CategoryQuota::load(path) {
                Ok(quota) => quota,
                Err(e) => {
                    warn!("skipping quota file {:?}: {}", path, e);
                    continue;
                }
            };
            let expected = DatasetLayout::new(dir, id, &quota.lang1, &quota.lang2).quota();
            if expected.file_name() != path.file_name() {
                warn!(
                    "skipping quota file {:?}: it holds {}-{}",
                    path, quota.lang1, quota.lang2
                );
                continue;
            }
            quotas.push(quota);
        }

        let languages: Vec<String> = quotas
            .iter()
            .flat_map(|q| vec![q.lang1.clone(), q.lang2.clone()])
            .unique()
            .collect();
        if languages.len() > 2 {
            return Err(Error::TooManyLanguages(languages));
        }
        if quotas.len() > 1 {
            warn!(
                "several quota files for corpus {}, using {}-{}",
                id, quotas[0].lang1, quotas[0].lang2
            );
        }
        let quota = quotas
            .into_iter()
            .next()
            .ok_or_else(|| Error::Custom(format!("no corpus {} in {:?}", id, dir)))?;
        let (lang1, lang2) = (quota.lang1.clone(), quota.lang2.clone());

        let layout = DatasetLayout::new(dir, id, &lang1, &lang2);
        let corpus1: LanguageCorpus = json::load(&layout.corpus(&lang1))?;
        let corpus2: LanguageCorpus = json::load(&layout.corpus(&lang2))?;
        let labels = LabelSpace::load(&layout.label2cat(), &layout.cat2label())?;

        info!(
            "corpus {}: {} {} documents, {} {} documents, {} labels",
            id,
            corpus1.len(),
            lang1,
            corpus2.len(),
            lang2,
            labels.len()
        );
        Ok(Self {
            id: id.to_string(),
            languages: [lang1, lang2],
            corpora: [corpus1, corpus2],
            labels,
            quota,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn languages(&self) -> (&str, &str) {
        (&self.languages[0], &self.languages[1])
    }

    pub fn corpus(&self, language: &str) -> Option<&LanguageCorpus> {
        self.corpora.iter().find(|c| c.language == language)
    }

    pub fn labels(&self) -> &LabelSpace {
        &self.labels
    }

    /// Documents of the first language followed by the ones of the second language.
    pub fn dataset(&self) -> Vec<Entry<'_>> {
        self.corpora
            .iter()
            .enumerate()
            .flat_map(|(language, corpus)| {
                corpus
                    .id
                    .iter()
                    .zip(corpus.text.iter())
                    .zip(corpus.label.iter())
                    .map(move |((id, text), labels)| Entry {
                        id: *id,
                        text: text.as_str(),
                        labels: labels.as_slice(),
                        language,
                    })
            })
            .collect()
    }

    /// Labels of the selected categories.
    pub fn primary_labels(&self) -> BTreeSet<u32> {
        self.quota
            .all_categories()
            .iter()
            .filter_map(|category| self.labels.get(category))
            .collect()
    }

    /// Labels of each document, restricted to [CorpusReader::primary_labels], in dataset order.
    pub fn primary_targets(&self) -> Vec<Vec<u32>> {
        let primary = self.primary_labels();
        self.dataset()
            .iter()
            .map(|entry| {
                entry
                    .labels
                    .iter()
                    .copied()
                    .filter(|label| primary.contains(label))
                    .collect()
            })
            .collect()
    }

    pub fn cluster_types(&self) -> ClusterTypes {
        let sets: Vec<BTreeSet<u32>> = self
            .corpora
            .iter()
            .map(|corpus| corpus.label.iter().flatten().copied().collect())
            .collect();
        ClusterTypes {
            mono1: sets[0].difference(&sets[1]).copied().collect(),
            bi: sets[0].intersection(&sets[1]).copied().collect(),
            mono2: sets[1].difference(&sets[0]).copied().collect(),
        }
    }

    /// Cluster type of the first label of each document, in dataset order; -1 for documents without labels.
    pub fn type_mask(&self) -> Vec<i8> {
        let types = self.cluster_types();
        self.dataset()
            .iter()
            .map(|entry| match entry.labels.first() {
                Some(label) => types.type_of(*label),
                None => -1,
            })
            .collect()
    }
}
