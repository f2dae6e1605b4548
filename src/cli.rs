//! Command line arguments and parameters management/parsing.
use std::path::PathBuf;

use structopt::StructOpt;
use wikicorpus::constants::{MEMBER_LIMIT, ROOT_CATEGORY};
use wikicorpus::error::Error;
use wikicorpus::finder::FinderParams;
use wikicorpus::pipelines::{CorpusParams, PartitionOrder, Resume};
use wikicorpus::selection::{CandidateSource, QuotaRequest, SizeDistribution};
use wikicorpus::tree::{ExcludedCategories, TreeParams};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "wikicorpus",
    about = "labeled bilingual corpora from the Wikipedia category graph."
)]
/// Holds every command that is callable by the `wikicorpus` command.
pub enum Wikicorpus {
    #[structopt(about = "Build the category tree and map it onto primary categories")]
    Tree(Tree),
    #[structopt(about = "Collect a bilingual corpus")]
    Corpus(Corpus),
}

#[derive(Debug, StructOpt)]
pub struct Tree {
    #[structopt(parse(from_os_str), help = "destination folder")]
    pub dst: PathBuf,
    #[structopt(long = "roots", help = "root categories (default: main topic classifications)")]
    pub roots: Vec<String>,
    #[structopt(long = "max-level", default_value = "25")]
    pub max_level: usize,
    #[structopt(
        long = "primary-level",
        default_value = "2",
        help = "level of the categories everything is mapped onto"
    )]
    pub primary_level: usize,
    #[structopt(long = "name", default_value = "main", help = "tree name, used in file names")]
    pub name: String,
    #[structopt(long = "resume", parse(from_os_str), help = "partial tree file to resume from")]
    pub resume: Option<PathBuf>,
    #[structopt(long = "start-level", default_value = "0", help = "level to resume from")]
    pub start_level: usize,
    #[structopt(long = "recover", help = "resume from the checkpoints of an interrupted run")]
    pub recover: bool,
    #[structopt(long = "no-backup", help = "do not checkpoint levels")]
    pub no_backup: bool,
    #[structopt(long = "api-lang", default_value = "en")]
    pub api_lang: String,
}

impl Tree {
    pub fn roots(&self) -> Vec<String> {
        if self.roots.is_empty() {
            vec![ROOT_CATEGORY.to_string()]
        } else {
            self.roots.clone()
        }
    }

    pub fn params(&self) -> TreeParams {
        TreeParams {
            max_level: self.max_level,
            backup: !self.no_backup,
            member_limit: MEMBER_LIMIT,
        }
    }

    pub fn resume(&self) -> Option<Resume> {
        match (&self.resume, self.recover) {
            (Some(path), _) => Some(Resume::File {
                path: path.clone(),
                start_level: self.start_level,
            }),
            (None, true) => Some(Resume::Checkpoints),
            (None, false) => None,
        }
    }
}

#[derive(Debug, StructOpt)]
pub struct Corpus {
    #[structopt(help = "corpus identifier (ex. v0_1)")]
    pub id: String,
    #[structopt(parse(from_os_str), help = "destination folder")]
    pub dst: PathBuf,
    #[structopt(short = "1", long = "lang1", default_value = "en")]
    pub lang1: String,
    #[structopt(short = "2", long = "lang2", default_value = "fr")]
    pub lang2: String,

    #[structopt(
        long = "candidates",
        parse(from_os_str),
        help = "JSON list of candidate categories"
    )]
    pub candidates: Option<PathBuf>,
    #[structopt(long = "choose", use_delimiter = true, help = "candidate categories")]
    pub choose: Vec<String>,
    #[structopt(long = "roots", help = "categories candidates are generated from")]
    pub roots: Vec<String>,
    #[structopt(long = "candidate-levels", default_value = "3")]
    pub candidate_levels: usize,
    #[structopt(long = "max-candidates", default_value = "3000")]
    pub max_candidates: usize,
    #[structopt(long = "no-clean", help = "keep generated candidates that do not look like topics")]
    pub no_clean: bool,

    #[structopt(long = "num-cat", use_delimiter = true, help = "categories per partition")]
    pub num_cat: Vec<usize>,
    #[structopt(long = "num-cat-weights", use_delimiter = true)]
    pub num_cat_weights: Vec<f64>,
    #[structopt(long = "num-cat-lang1", use_delimiter = true)]
    pub num_cat_lang1: Vec<usize>,
    #[structopt(long = "num-cat-lang2", use_delimiter = true)]
    pub num_cat_lang2: Vec<usize>,
    #[structopt(long = "num-cat-common", use_delimiter = true)]
    pub num_cat_common: Vec<usize>,
    #[structopt(
        long = "cluster-size",
        use_delimiter = true,
        default_value = "10",
        help = "pages per category"
    )]
    pub cluster_size: Vec<usize>,
    #[structopt(long = "cluster-size-weights", use_delimiter = true)]
    pub cluster_size_weights: Vec<f64>,

    #[structopt(long = "map", parse(from_os_str), help = "subcategory map file")]
    pub map: Option<PathBuf>,
    #[structopt(long = "min-cat", default_value = "1")]
    pub min_cat: usize,
    #[structopt(long = "max-cat", default_value = "10")]
    pub max_cat: usize,
    #[structopt(long = "min-label-weight", default_value = "2")]
    pub min_label_weight: usize,
    #[structopt(long = "rounds", default_value = "20", help = "page search rounds")]
    pub rounds: usize,
    #[structopt(long = "workers", default_value = "1")]
    pub workers: usize,
    #[structopt(long = "strict", help = "forbid pages of other categories of the same partition")]
    pub strict: bool,
    #[structopt(
        long = "excluded",
        default_value = "default",
        help = "categories ignored on pages: none, default or a comma separated list"
    )]
    pub excluded: ExcludedCategories,
    #[structopt(long = "keep-unmapped")]
    pub keep_unmapped: bool,
    #[structopt(long = "hidden", help = "use hidden categories of pages")]
    pub hidden: bool,
    #[structopt(long = "reversed", help = "process the common partition first")]
    pub reversed: bool,
    #[structopt(long = "order", use_delimiter = true, help = "partition processing order")]
    pub order: Vec<String>,
    #[structopt(long = "seed")]
    pub seed: Option<u64>,
    #[structopt(long = "api-lang", help = "edition queried for categories (default: lang1)")]
    pub api_lang: Option<String>,
}

/// Distribution given by `--<option>` values and `--<option>-weights`.
fn distribution(
    option: &str,
    values: &[usize],
    weights: &[f64],
) -> Result<Option<SizeDistribution>, Error> {
    match (values.is_empty(), weights.is_empty()) {
        (true, true) => Ok(None),
        (true, false) => Err(Error::Custom(format!(
            "--{}-weights given without --{} values",
            option, option
        ))),
        (false, true) => Ok(Some(SizeDistribution::uniform(values.to_vec()))),
        (false, false) => Ok(Some(SizeDistribution::weighted(
            values.to_vec(),
            weights.to_vec(),
        ))),
    }
}

fn non_empty(values: &[usize]) -> Option<Vec<usize>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}

impl Corpus {
    pub fn api_lang(&self) -> &str {
        self.api_lang.as_deref().unwrap_or(&self.lang1)
    }

    fn candidate_source(&self) -> CandidateSource {
        if let Some(path) = &self.candidates {
            return CandidateSource::Load(path.clone());
        }
        if !self.choose.is_empty() {
            return CandidateSource::Choose(self.choose.clone());
        }
        let roots = if self.roots.is_empty() {
            vec![ROOT_CATEGORY.to_string()]
        } else {
            self.roots.clone()
        };
        CandidateSource::Generate {
            roots,
            max_level: self.candidate_levels,
            max_num: self.max_candidates,
            clean: !self.no_clean,
        }
    }

    fn order(&self) -> PartitionOrder {
        if !self.order.is_empty() {
            PartitionOrder::Explicit(self.order.clone())
        } else if self.reversed {
            PartitionOrder::Reversed
        } else {
            PartitionOrder::Default
        }
    }

    pub fn params(&self) -> Result<CorpusParams, Error> {
        Ok(CorpusParams {
            id: self.id.clone(),
            lang1: self.lang1.clone(),
            lang2: self.lang2.clone(),
            candidates: self.candidate_source(),
            quota: QuotaRequest {
                shared: distribution("num-cat", &self.num_cat, &self.num_cat_weights)?,
                lang1: non_empty(&self.num_cat_lang1),
                lang2: non_empty(&self.num_cat_lang2),
                common: non_empty(&self.num_cat_common),
                fixed: None,
            },
            cluster_size: distribution(
                "cluster-size",
                &self.cluster_size,
                &self.cluster_size_weights,
            )?
            .unwrap_or_else(|| SizeDistribution::uniform(vec![10])),
            finder: FinderParams {
                min_categories: self.min_cat,
                max_categories: self.max_cat,
                max_rounds: self.rounds,
                hidden_categories: self.hidden,
                excluded: self.excluded.clone(),
                keep_unmapped: self.keep_unmapped,
                member_limit: MEMBER_LIMIT,
            },
            min_label_weight: self.min_label_weight,
            workers: self.workers,
            strict: self.strict,
            order: self.order(),
            seed: self.seed,
        })
    }
}
