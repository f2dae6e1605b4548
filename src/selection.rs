/*! Category selection

A pool of candidate categories ([CandidateSource]) is split into three disjoint partitions:
categories whose pages must only be in the first language, only in the second one, and in both ([CategoryQuota]).
Partition sizes are drawn from [SizeDistribution]s, and shrunk when the pool is too small.
!*/
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use itertools::Itertools;
use log::{info, warn};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{monolingual_partition, COMMON_PARTITION};
use crate::error::Error;
use crate::fetch::WikiSource;
use crate::filtering::NameFilter;
use crate::io::json;

/// Categories of a partition and the languages their pages must exist in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partition {
    pub categories: Vec<String>,
    pub languages: Vec<String>,
}

/// Selected categories, by partition name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryQuota {
    pub lang1: String,
    pub lang2: String,
    pub partitions: BTreeMap<String, Partition>,
}

impl CategoryQuota {
    pub fn new(
        lang1: &str,
        lang2: &str,
        only1: Vec<String>,
        only2: Vec<String>,
        common: Vec<String>,
    ) -> Self {
        let mut partitions = BTreeMap::new();
        partitions.insert(
            monolingual_partition(lang1),
            Partition {
                categories: only1,
                languages: vec![lang1.to_string()],
            },
        );
        partitions.insert(
            monolingual_partition(lang2),
            Partition {
                categories: only2,
                languages: vec![lang2.to_string()],
            },
        );
        partitions.insert(
            COMMON_PARTITION.to_string(),
            Partition {
                categories: common,
                languages: vec![lang1.to_string(), lang2.to_string()],
            },
        );
        Self {
            lang1: lang1.to_string(),
            lang2: lang2.to_string(),
            partitions,
        }
    }

    pub fn get(&self, name: &str) -> Result<&Partition, Error> {
        self.partitions
            .get(name)
            .ok_or_else(|| Error::MissingPartition(name.to_string()))
    }

    /// partition names, first language first and common last.
    pub fn default_order(&self) -> Vec<String> {
        vec![
            monolingual_partition(&self.lang1),
            monolingual_partition(&self.lang2),
            COMMON_PARTITION.to_string(),
        ]
    }

    /// categories of every partition but `name`.
    pub fn forbidden_for(&self, name: &str) -> BTreeSet<String> {
        self.partitions
            .iter()
            .filter(|(partition, _)| partition.as_str() != name)
            .flat_map(|(_, p)| p.categories.iter().cloned())
            .collect()
    }

    pub fn all_categories(&self) -> BTreeSet<String> {
        self.partitions
            .values()
            .flat_map(|p| p.categories.iter().cloned())
            .collect()
    }

    pub fn load(path: &std::path::Path) -> Result<Self, Error> {
        json::load(path)
    }
}

/// Values to draw a size from, uniformly or by weight.
#[derive(Debug, Clone, PartialEq)]
pub struct SizeDistribution {
    pub values: Vec<usize>,
    pub weights: Option<Vec<f64>>,
}

impl SizeDistribution {
    pub fn uniform(values: Vec<usize>) -> Self {
        Self {
            values,
            weights: None,
        }
    }

    pub fn weighted(values: Vec<usize>, weights: Vec<f64>) -> Self {
        Self {
            values,
            weights: Some(weights),
        }
    }

    /// five values drawn in `[1, 5)`.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::uniform((0..5).map(|_| rng.gen_range(1..5)).collect())
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> Result<usize, Error> {
        match &self.weights {
            Some(weights) => {
                if weights.len() != self.values.len() {
                    return Err(Error::Custom(format!(
                        "{} weights for {} values",
                        weights.len(),
                        self.values.len()
                    )));
                }
                let index = WeightedIndex::new(weights)
                    .map_err(|e| Error::Custom(format!("invalid weights: {}", e)))?;
                Ok(self.values[index.sample(rng)])
            }
            None => self
                .values
                .choose(rng)
                .copied()
                .ok_or_else(|| Error::Custom("empty size distribution".to_string())),
        }
    }
}

/// How many categories go in each partition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuotaRequest {
    /// distribution shared by the partitions that have none of their own.
    pub shared: Option<SizeDistribution>,
    pub lang1: Option<Vec<usize>>,
    pub lang2: Option<Vec<usize>>,
    pub common: Option<Vec<usize>>,
    /// sizes used as is, in (lang1, lang2, common) order.
    pub fixed: Option<[usize; 3]>,
}

impl QuotaRequest {
    pub fn fixed(lang1: usize, lang2: usize, common: usize) -> Self {
        Self {
            fixed: Some([lang1, lang2, common]),
            ..Default::default()
        }
    }

    /// Draw the (lang1, lang2, common) sizes.
    pub fn sizes<R: Rng>(&self, rng: &mut R) -> Result<[usize; 3], Error> {
        if let Some(fixed) = self.fixed {
            return Ok(fixed);
        }
        let shared = match &self.shared {
            Some(shared) => shared.clone(),
            None => SizeDistribution::random(rng),
        };
        let mut sizes = [0; 3];
        for (size, own) in sizes
            .iter_mut()
            .zip([&self.lang1, &self.lang2, &self.common])
        {
            *size = match own {
                Some(values) => SizeDistribution::uniform(values.clone()).sample(rng)?,
                None => shared.sample(rng)?,
            };
        }
        Ok(sizes)
    }
}

/// Where the candidate categories come from.
#[derive(Debug, Clone)]
pub enum CandidateSource {
    /// descend from `roots` until `max_num` categories or `max_level` levels are reached.
    Generate {
        roots: Vec<String>,
        max_level: usize,
        max_num: usize,
        clean: bool,
    },
    Choose(Vec<String>),
    /// JSON list of category names.
    Load(PathBuf),
}

impl CandidateSource {
    pub fn candidates<S: WikiSource>(
        &self,
        source: &S,
        member_limit: usize,
    ) -> Result<Vec<String>, Error> {
        match self {
            CandidateSource::Choose(list) => Ok(list.clone()),
            CandidateSource::Load(path) => json::load(path),
            CandidateSource::Generate {
                roots,
                max_level,
                max_num,
                clean,
            } => {
                let mut pool = roots.clone();
                let mut level = 0;
                while pool.len() < *max_num && level < *max_level {
                    let mut next = Vec::new();
                    for category in &pool {
                        match source.category_members(category, member_limit) {
                            Ok(members) => next.extend(members.subcategories),
                            Err(e) => e.log(&format!("subcategories of {}", category)),
                        }
                    }
                    if next.is_empty() {
                        break;
                    }
                    pool = next.into_iter().unique().collect();
                    level += 1;
                }
                info!("generated {} candidates in {} levels", pool.len(), level);

                if *clean {
                    Ok(NameFilter::default().clean(pool))
                } else {
                    Ok(pool)
                }
            }
        }
    }
}

/// Split `pool` into three disjoint random windows sized after `request`.
///
/// If the pool is too small, each size is reduced by a third of the excess (rounded up)
/// until the windows fit.
pub fn select<R: Rng>(
    pool: &[String],
    request: &QuotaRequest,
    lang1: &str,
    lang2: &str,
    rng: &mut R,
) -> Result<CategoryQuota, Error> {
    if lang1 == lang2 {
        return Err(Error::Custom(format!(
            "corpus languages must differ, got {} twice",
            lang1
        )));
    }

    let mut pool: Vec<String> = pool.iter().unique().cloned().collect();
    let [mut n1, mut n2, mut nc] = request.sizes(rng)?;
    info!("requested {}/{}/{} categories", n1, n2, nc);

    while n1 + n2 + nc > pool.len() {
        let excess = n1 + n2 + nc - pool.len();
        let delta = (excess + 2) / 3;
        warn!(
            "{} categories requested out of {}, shrinking each partition by {}",
            n1 + n2 + nc,
            pool.len(),
            delta
        );
        n1 = n1.saturating_sub(delta);
        n2 = n2.saturating_sub(delta);
        nc = nc.saturating_sub(delta);
    }

    pool.shuffle(rng);
    let mut pool = pool.into_iter();
    let only1: Vec<String> = pool.by_ref().take(n1).collect();
    let only2: Vec<String> = pool.by_ref().take(n2).collect();
    let common: Vec<String> = pool.take(nc).collect();

    info!(
        "selected {}={} {}={} {}={}",
        monolingual_partition(lang1),
        only1.len(),
        monolingual_partition(lang2),
        only2.len(),
        COMMON_PARTITION,
        common.len()
    );
    Ok(CategoryQuota::new(lang1, lang2, only1, only2, common))
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::fetch::StaticSource;

    use super::*;

    fn pool(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Category {}", i)).collect()
    }

    #[test_log::test]
    fn test_shrink() {
        let mut rng = StdRng::seed_from_u64(42);
        let quota = select(&pool(10), &QuotaRequest::fixed(5, 5, 5), "en", "fr", &mut rng).unwrap();

        for name in ["only_en", "only_fr", "common"] {
            assert_eq!(quota.get(name).unwrap().categories.len(), 3);
        }
        assert_eq!(quota.all_categories().len(), 9);
    }

    #[test]
    fn test_disjoint_partitions() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut candidates = pool(20);
        candidates.extend(pool(5));
        let quota = select(&candidates, &QuotaRequest::fixed(4, 6, 10), "en", "fr", &mut rng).unwrap();

        assert_eq!(quota.all_categories().len(), 20);
        assert_eq!(quota.get("common").unwrap().languages, vec!["en", "fr"]);
        assert_eq!(quota.get("only_fr").unwrap().languages, vec!["fr"]);
        let forbidden = quota.forbidden_for("only_en");
        assert_eq!(forbidden.len(), 16);
        for category in &quota.get("only_en").unwrap().categories {
            assert!(!forbidden.contains(category));
        }
        assert!(matches!(quota.get("only_de"), Err(Error::MissingPartition(_))));
    }

    #[test]
    fn test_same_seed() {
        let a = select(&pool(30), &QuotaRequest::default(), "en", "fr", &mut StdRng::seed_from_u64(7)).unwrap();
        let b = select(&pool(30), &QuotaRequest::default(), "en", "fr", &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_same_language() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(select(&pool(3), &QuotaRequest::fixed(1, 1, 1), "en", "en", &mut rng).is_err());
    }

    #[test]
    fn test_sizes() {
        let mut rng = StdRng::seed_from_u64(3);
        let request = QuotaRequest {
            shared: Some(SizeDistribution::weighted(vec![1, 100], vec![1.0, 0.0])),
            common: Some(vec![7]),
            ..Default::default()
        };
        assert_eq!(request.sizes(&mut rng).unwrap(), [1, 1, 7]);

        let bad = SizeDistribution::weighted(vec![1, 2], vec![1.0]);
        assert!(bad.sample(&mut rng).is_err());
        assert!(SizeDistribution::uniform(vec![]).sample(&mut rng).is_err());

        let random = SizeDistribution::random(&mut rng);
        assert_eq!(random.values.len(), 5);
        assert!(random.values.iter().all(|v| (1..5).contains(v)));
    }

    #[test]
    fn test_generate() {
        let source = StaticSource::new()
            .with_category("Root", &[], &["Science", "Sports"])
            .with_category("Science", &[], &["Physics", "Lists of scientists"])
            .with_category("Sports", &[], &["Football", "Physics"]);

        let generate = CandidateSource::Generate {
            roots: vec!["Root".to_string()],
            max_level: 5,
            max_num: 3,
            clean: true,
        };
        let candidates = generate.candidates(&source, 500).unwrap();
        assert_eq!(candidates, vec!["Physics", "Football"]);

        let shallow = CandidateSource::Generate {
            roots: vec!["Root".to_string()],
            max_level: 1,
            max_num: 100,
            clean: false,
        };
        assert_eq!(shallow.candidates(&source, 500).unwrap(), vec!["Science", "Sports"]);
    }
}
