//! Bilingual corpus pipeline
//!
//! # Processing
//! 1. Candidate categories are split into the `only_<lang1>`, `only_<lang2>` and `common` partitions.
//! 1. Partitions are processed one after the other. For each category of a partition, pages are searched
//!   for with a [PageFinder], either one category at a time or one worker per category.
//!   Categories of the other partitions, and categories found on the pages of the partitions already processed,
//!   are forbidden.
//! 1. Page categories are turned into labels, rare labels are dropped.
//! 1. Documents are laid out per language and written in the dataset folder.
//!
//! Pages are never found twice in a run, but in parallel mode workers of a same partition do not see
//! each other's pages: pages found by several workers are kept under the first category only,
//! leaving the other ones short.
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::time::Instant;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::constants::{COMMON_PARTITION, ROOT_CATEGORY};
use crate::corpus::{
    assign_labels, compact_labels, drop_rare_labels, restructure, Document, LabelSpace,
    LanguageCorpus, PartitionDocs,
};
use crate::error::Error;
use crate::fetch::{PageId, WikiSource};
use crate::finder::{FinderParams, FoundPage, PageFinder, Search};
use crate::io::{json, DatasetLayout};
use crate::selection::{select, CandidateSource, CategoryQuota, Partition, QuotaRequest, SizeDistribution};
use crate::tree::SubcatMap;

use super::Pipeline;

/// Order in which partitions are processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartitionOrder {
    /// first language, second language, common.
    Default,
    /// common, second language, first language.
    Reversed,
    Explicit(Vec<String>),
}

impl PartitionOrder {
    /// names of the partitions of `quota`, in processing order.
    pub fn resolve(&self, quota: &CategoryQuota) -> Result<Vec<String>, Error> {
        let order = match self {
            PartitionOrder::Default => quota.default_order(),
            PartitionOrder::Reversed => quota.default_order().into_iter().rev().collect(),
            PartitionOrder::Explicit(order) => order.clone(),
        };

        for name in &order {
            quota.get(name)?;
        }
        let distinct: BTreeSet<&String> = order.iter().collect();
        if distinct.len() != order.len() || distinct.len() != quota.partitions.len() {
            return Err(Error::Custom(format!(
                "partition order {:?} must hold each partition once",
                order
            )));
        }
        Ok(order)
    }
}

#[derive(Debug, Clone)]
pub struct CorpusParams {
    /// corpus identifier, used in file names.
    pub id: String,
    pub lang1: String,
    pub lang2: String,
    pub candidates: CandidateSource,
    pub quota: QuotaRequest,
    /// number of pages searched for, per category.
    pub cluster_size: SizeDistribution,
    pub finder: FinderParams,
    /// labels weighing less are dropped.
    pub min_label_weight: usize,
    pub workers: usize,
    /// also forbid the other categories of the partition being processed, and the categories found so far in it.
    /// Only available with a single worker.
    pub strict: bool,
    pub order: PartitionOrder,
    pub seed: Option<u64>,
}

impl Default for CorpusParams {
    fn default() -> Self {
        Self {
            id: "v0_1".to_string(),
            lang1: "en".to_string(),
            lang2: "fr".to_string(),
            candidates: CandidateSource::Generate {
                roots: vec![ROOT_CATEGORY.to_string()],
                max_level: 3,
                max_num: 3000,
                clean: true,
            },
            quota: QuotaRequest::default(),
            cluster_size: SizeDistribution::uniform(vec![10]),
            finder: FinderParams::default(),
            min_label_weight: 2,
            workers: 1,
            strict: false,
            order: PartitionOrder::Default,
            seed: None,
        }
    }
}

/// What a corpus run produced.
#[derive(Debug, Clone)]
pub struct CorpusOutput {
    pub quota: CategoryQuota,
    /// documents, in processing order.
    pub partitions: Vec<PartitionDocs>,
    pub labels: LabelSpace,
    pub corpora: Vec<LanguageCorpus>,
}

/// Pages found by a worker, not yet checked against the other workers of its batch.
#[derive(Debug, Clone)]
pub struct Candidates {
    pub category: String,
    pub pages: Vec<FoundPage>,
    /// pages the worker looked at.
    pub visited: HashSet<PageId>,
}

/// Keep each page under the first category that found it, in batch order.
///
/// Pages visited by the workers are added to `reviewed`.
pub fn dedup_batch(
    batch: Vec<Candidates>,
    reviewed: &mut HashSet<PageId>,
) -> Vec<(String, Vec<FoundPage>)> {
    let mut used = HashSet::new();
    let mut kept = Vec::with_capacity(batch.len());
    for candidates in batch {
        let before = candidates.pages.len();
        let pages: Vec<FoundPage> = candidates
            .pages
            .into_iter()
            .filter(|f| used.insert(f.page.pageid))
            .collect();
        if pages.len() < before {
            warn!(
                "{}: removed {} pages found under an earlier category",
                candidates.category,
                before - pages.len()
            );
        }
        reviewed.extend(candidates.visited);
        kept.push((candidates.category, pages));
    }
    kept
}

pub struct CorpusAssembler<'a, S: WikiSource> {
    source: &'a S,
    dst: PathBuf,
    map: Option<SubcatMap>,
    params: CorpusParams,
}

impl<'a, S: WikiSource> CorpusAssembler<'a, S> {
    pub fn new(source: &'a S, dst: PathBuf, params: CorpusParams) -> Self {
        Self {
            source,
            dst,
            map: None,
            params,
        }
    }

    pub fn with_map(mut self, map: Option<SubcatMap>) -> Self {
        self.map = map;
        self
    }

    fn workers(&self) -> usize {
        if self.params.strict && self.params.workers > 1 {
            warn!(
                "strict mode needs a single worker, ignoring the {} requested",
                self.params.workers
            );
            1
        } else {
            self.params.workers.max(1)
        }
    }

    /// Search and fetch pages of a partition, one category at a time.
    ///
    /// `reviewed` is updated after each category.
    #[allow(clippy::too_many_arguments)]
    fn collect_sequential(
        &self,
        finder: &PageFinder<S>,
        name: &str,
        partition: &Partition,
        targets: &[usize],
        forbidden: &BTreeSet<String>,
        reviewed: &mut HashSet<PageId>,
        rng: &mut StdRng,
    ) -> PartitionDocs {
        let mut docs = PartitionDocs::new(name, &partition.languages);
        let mut found_within = BTreeSet::new();

        for (category, target) in partition.categories.iter().zip(targets) {
            let strict_forbidden;
            let forbidden_here = if self.params.strict {
                let mut f = forbidden.clone();
                f.extend(partition.categories.iter().cloned());
                f.extend(found_within.iter().cloned());
                f.remove(category);
                strict_forbidden = f;
                &strict_forbidden
            } else {
                forbidden
            };

            let search = Search {
                category,
                target: *target,
                languages: &partition.languages,
                forbidden_categories: forbidden_here,
            };
            let found = finder.find(&search, reviewed, rng);
            let fetched: Vec<Document> = found
                .into_iter()
                .filter_map(|f| Document::fetch(self.source, f, &partition.languages, name))
                .collect();
            debug!("{}: {} documents", category, fetched.len());

            if self.params.strict {
                found_within.extend(fetched.iter().flat_map(|d| d.categories.iter().cloned()));
            }
            docs.documents.extend(fetched);
        }
        docs
    }

    /// Search pages of a partition with one task per category, then fetch them.
    ///
    /// Every task starts from the same copy of `reviewed`;
    /// duplicates are removed once the whole batch is over (see [dedup_batch]).
    #[allow(clippy::too_many_arguments)]
    fn collect_parallel(
        &self,
        finder: &PageFinder<S>,
        name: &str,
        partition: &Partition,
        targets: &[usize],
        forbidden: &BTreeSet<String>,
        reviewed: &mut HashSet<PageId>,
        rng: &mut StdRng,
        workers: usize,
    ) -> Result<PartitionDocs, Error> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| Error::Custom(format!("could not build thread pool: {}", e)))?;
        let seeds: Vec<u64> = partition.categories.iter().map(|_| rng.gen()).collect();
        let snapshot: &HashSet<PageId> = reviewed;

        let batch: Vec<Candidates> = pool.install(|| {
            partition
                .categories
                .par_iter()
                .zip(targets.par_iter())
                .zip(seeds.par_iter())
                .map(|((category, target), seed)| {
                    let mut visited = snapshot.clone();
                    let mut rng = StdRng::seed_from_u64(*seed);
                    let search = Search {
                        category,
                        target: *target,
                        languages: &partition.languages,
                        forbidden_categories: forbidden,
                    };
                    let pages = finder.find(&search, &mut visited, &mut rng);
                    Candidates {
                        category: category.clone(),
                        pages,
                        visited,
                    }
                })
                .collect()
        });

        let kept: Vec<FoundPage> = dedup_batch(batch, reviewed)
            .into_iter()
            .flat_map(|(_, pages)| pages)
            .collect();

        let mut docs = PartitionDocs::new(name, &partition.languages);
        docs.documents = pool.install(|| {
            kept.into_par_iter()
                .filter_map(|f| Document::fetch(self.source, f, &partition.languages, name))
                .collect()
        });
        Ok(docs)
    }
}

impl<'a, S: WikiSource> Pipeline<CorpusOutput> for CorpusAssembler<'a, S> {
    fn run(&self) -> Result<CorpusOutput, Error> {
        let params = &self.params;
        let mut rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let layout = DatasetLayout::new(&self.dst, &params.id, &params.lang1, &params.lang2);

        // category selection
        let pool = params
            .candidates
            .candidates(self.source, params.finder.member_limit)?;
        let quota = select(&pool, &params.quota, &params.lang1, &params.lang2, &mut rng)?;
        json::save(&quota, &layout.quota())?;
        let order = params.order.resolve(&quota)?;

        let workers = self.workers();
        let finder = PageFinder::new(self.source, params.finder.clone()).with_map(self.map.as_ref());
        let all_categories = quota.all_categories();
        let mut overflow: BTreeSet<String> = BTreeSet::new();
        let mut reviewed: HashSet<PageId> = HashSet::new();
        let mut partitions = Vec::with_capacity(order.len());

        for name in &order {
            let partition = quota.get(name)?;
            let own: BTreeSet<&String> = partition.categories.iter().collect();
            let forbidden: BTreeSet<String> = all_categories
                .iter()
                .chain(overflow.iter())
                .filter(|c| !own.contains(c))
                .cloned()
                .collect();
            let targets = partition
                .categories
                .iter()
                .map(|_| params.cluster_size.sample(&mut rng))
                .collect::<Result<Vec<usize>, Error>>()?;
            info!(
                "{}: {} categories, pages per category: {:?}",
                name,
                partition.categories.len(),
                targets
            );

            let start = Instant::now();
            let docs = if workers > 1 {
                self.collect_parallel(
                    &finder,
                    name,
                    partition,
                    &targets,
                    &forbidden,
                    &mut reviewed,
                    &mut rng,
                    workers,
                )?
            } else {
                self.collect_sequential(
                    &finder,
                    name,
                    partition,
                    &targets,
                    &forbidden,
                    &mut reviewed,
                    &mut rng,
                )
            };
            info!(
                "{}: {} documents in {:.1?}",
                name,
                docs.len(),
                start.elapsed()
            );

            overflow.extend(
                docs.documents
                    .iter()
                    .flat_map(|d| d.categories.iter())
                    .filter(|c| !own.contains(c))
                    .cloned(),
            );
            json::save(&docs, &layout.partition_backup(name))?;
            partitions.push(docs);
        }

        // labels
        let labels = assign_labels(&mut partitions, LabelSpace::new());
        let kept = drop_rare_labels(&mut partitions, params.min_label_weight);
        let labels = compact_labels(&mut partitions, &labels, &kept);
        labels.save(&layout.label2cat(), &layout.cat2label())?;

        let mut corpora = Vec::with_capacity(2);
        for language in [&params.lang1, &params.lang2] {
            let corpus = restructure(&partitions, language)?;
            json::save(&corpus, &layout.corpus(language))?;
            corpora.push(corpus);
        }

        let common = partitions
            .iter()
            .find(|p| p.name == COMMON_PARTITION)
            .map_or(0, PartitionDocs::len);
        info!(
            "corpus {}: {} {} documents, {} {} documents ({} common), {} labels",
            params.id,
            corpora[0].len(),
            params.lang1,
            corpora[1].len(),
            params.lang2,
            common,
            labels.len()
        );

        let backup = layout.backup_dir();
        if backup.exists() {
            std::fs::remove_dir_all(backup)?;
        }

        Ok(CorpusOutput {
            quota,
            partitions,
            labels,
            corpora,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use crate::fetch::PageMetadata;

    use super::*;

    fn found(pageid: PageId) -> FoundPage {
        FoundPage {
            page: PageMetadata {
                pageid,
                title: pageid.to_string(),
                categories: Vec::new(),
                hidden_categories: Vec::new(),
                languages: BTreeMap::new(),
            },
            categories: BTreeSet::new(),
        }
    }

    #[test_log::test]
    fn test_dedup_batch() {
        let batch = vec![
            Candidates {
                category: "Sports".to_string(),
                pages: vec![found(1), found(2)],
                visited: vec![1, 2, 3].into_iter().collect(),
            },
            Candidates {
                category: "Science".to_string(),
                pages: vec![found(2), found(4)],
                visited: vec![2, 4].into_iter().collect(),
            },
        ];
        let mut reviewed = HashSet::new();
        let kept = dedup_batch(batch, &mut reviewed);

        assert_eq!(kept[0].1.len(), 2);
        let science: Vec<PageId> = kept[1].1.iter().map(|f| f.page.pageid).collect();
        assert_eq!(science, vec![4]);
        assert_eq!(reviewed.len(), 4);
    }

    #[test]
    fn test_partition_order() {
        let quota = CategoryQuota::new("en", "fr", vec![], vec![], vec![]);
        assert_eq!(
            PartitionOrder::Default.resolve(&quota).unwrap(),
            vec!["only_en", "only_fr", "common"]
        );
        assert_eq!(
            PartitionOrder::Reversed.resolve(&quota).unwrap(),
            vec!["common", "only_fr", "only_en"]
        );
        let explicit = PartitionOrder::Explicit(vec![
            "only_fr".to_string(),
            "common".to_string(),
            "only_en".to_string(),
        ]);
        assert_eq!(explicit.resolve(&quota).unwrap()[0], "only_fr");

        let unknown = PartitionOrder::Explicit(vec!["only_de".to_string()]);
        assert!(matches!(unknown.resolve(&quota), Err(Error::MissingPartition(_))));
        let partial = PartitionOrder::Explicit(vec!["common".to_string()]);
        assert!(partial.resolve(&quota).is_err());
    }
}
