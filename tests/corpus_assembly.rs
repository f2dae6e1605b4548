// collect a corpus from an in-memory category graph
// read it back from disk
// ensure that pages are never collected twice and that labels are consistent

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use wikicorpus::corpus::CorpusReader;
use wikicorpus::error::Error;
use wikicorpus::fetch::{PageId, StaticSource};
use wikicorpus::finder::FinderParams;
use wikicorpus::io::{json, DatasetLayout};
use wikicorpus::pipelines::{CorpusAssembler, CorpusOutput, CorpusParams, Pipeline};
use wikicorpus::selection::{CandidateSource, QuotaRequest, SizeDistribution};

const CATEGORIES: [&str; 3] = ["Music", "Science", "Sports"];

/// three categories of three pages each, plus a page listed everywhere.
fn source() -> StaticSource {
    source_sharing(&[])
}

/// same as [source], every category also listing the `shared` pages.
fn source_sharing(shared: &[(PageId, &str)]) -> StaticSource {
    let mut source = StaticSource::new();
    for (i, category) in CATEGORIES.into_iter().enumerate() {
        let first = 3 * i as PageId + 1;
        let mut pages = vec![first, first + 1, first + 2, 10];
        pages.extend(shared.iter().map(|(pageid, _)| *pageid));
        source = source.with_category(category, &pages, &[]);
        for pageid in &pages[..3] {
            source = source.with_page(
                *pageid,
                &format!("{} page {}", category, pageid),
                &[category],
                &["en", "fr"],
            );
        }
    }
    for (pageid, category) in shared {
        source = source.with_page(*pageid, category, &[*category], &["en", "fr"]);
    }
    source.with_page(10, "Everything", &CATEGORIES, &["en", "fr"])
}

fn params(seed: u64) -> CorpusParams {
    CorpusParams {
        id: "v0_1".to_string(),
        candidates: CandidateSource::Choose(CATEGORIES.iter().map(|c| c.to_string()).collect()),
        quota: QuotaRequest::fixed(1, 1, 1),
        cluster_size: SizeDistribution::uniform(vec![5]),
        finder: FinderParams::default(),
        min_label_weight: 1,
        seed: Some(seed),
        ..Default::default()
    }
}

fn run(source: &StaticSource, dst: &Path, params: CorpusParams) -> CorpusOutput {
    CorpusAssembler::new(source, dst.to_path_buf(), params)
        .run()
        .unwrap()
}

fn page_ids(output: &CorpusOutput) -> Vec<PageId> {
    output
        .partitions
        .iter()
        .flat_map(|p| p.documents.iter().map(|d| d.pageid))
        .collect()
}

#[test_log::test]
fn reviewed_pages_cross_partitions() {
    let dst = tempfile::tempdir().unwrap();
    let source = source_sharing(&[(11, "Featured articles")]);
    let output = run(&source, dst.path(), params(1));

    // shared pages are looked at in the first partition only
    let requested = source.requested_pages();
    assert_eq!(requested.iter().filter(|id| **id == 10).count(), 1);
    assert_eq!(requested.iter().filter(|id| **id == 11).count(), 1);
    let distinct: BTreeSet<&PageId> = requested.iter().collect();
    assert_eq!(distinct.len(), requested.len());

    // page 10 has categories of every partition, so it is never admitted
    let ids = page_ids(&output);
    assert_eq!(ids.len(), 10);
    assert!(!ids.contains(&10));

    // page 11 is admitted in the first partition and never again
    assert_eq!(output.partitions[0].name, "only_en");
    assert!(output.partitions[0]
        .documents
        .iter()
        .any(|d| d.pageid == 11));
    for partition in &output.partitions[1..] {
        assert!(partition.documents.iter().all(|d| d.pageid != 11));
    }
}

#[test]
fn labels_and_files() {
    let dst = tempfile::tempdir().unwrap();
    let source = source();
    let output = run(&source, dst.path(), params(2));

    // one label per selected category, bound in partition order
    assert_eq!(output.labels.len(), 3);
    for (label, partition) in output.partitions.iter().enumerate() {
        let category = &output.quota.get(&partition.name).unwrap().categories[0];
        assert_eq!(output.labels.get(category), Some(label as u32));
        for doc in &partition.documents {
            assert_eq!(doc.labels, vec![label as u32]);
            assert_eq!(&doc.categories, &vec![category.clone()]);
        }
    }

    assert_eq!(output.corpora[0].language, "en");
    assert_eq!(output.corpora[0].len(), 6);
    assert_eq!(output.corpora[1].len(), 6);
    assert!(output.corpora[1].text[0].ends_with("[fr]"));

    let layout = DatasetLayout::new(dst.path(), "v0_1", "en", "fr");
    assert!(!layout.backup_dir().exists());
    assert!(layout.quota().exists());

    let reader = CorpusReader::open(dst.path(), "v0_1").unwrap();
    assert_eq!(reader.languages(), ("en", "fr"));
    assert_eq!(reader.labels(), &output.labels);
    assert_eq!(reader.corpus("fr"), Some(&output.corpora[1]));
    assert_eq!(reader.dataset().len(), 12);
    assert_eq!(reader.primary_labels().len(), 3);

    let types = reader.cluster_types();
    assert_eq!(
        (types.mono1.len(), types.bi.len(), types.mono2.len()),
        (1, 1, 1)
    );
    let mut counts: HashMap<i8, usize> = HashMap::new();
    for t in reader.type_mask() {
        *counts.entry(t).or_insert(0) += 1;
    }
    assert_eq!(counts.get(&0), Some(&3));
    assert_eq!(counts.get(&1), Some(&6));
    assert_eq!(counts.get(&2), Some(&3));
}

#[test]
fn same_seed_same_corpus() {
    let source = source();
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let first = run(&source, a.path(), params(3));
    let second = run(&source, b.path(), params(3));

    assert_eq!(first.quota, second.quota);
    assert_eq!(first.corpora, second.corpora);
    assert_eq!(first.labels, second.labels);
}

#[test]
fn parallel_workers() {
    let dst = tempfile::tempdir().unwrap();
    let source = source();
    let params = CorpusParams {
        workers: 3,
        ..params(4)
    };
    let output = run(&source, dst.path(), params);

    let ids = page_ids(&output);
    let distinct: BTreeSet<&PageId> = ids.iter().collect();
    assert_eq!(distinct.len(), ids.len());
    assert_eq!(ids.len(), 9);
}

#[test]
fn strict_mode_is_sequential() {
    let source = source();
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let sequential = run(
        &source,
        a.path(),
        CorpusParams {
            strict: true,
            ..params(5)
        },
    );
    let fallback = run(
        &source,
        b.path(),
        CorpusParams {
            strict: true,
            workers: 4,
            ..params(5)
        },
    );
    assert_eq!(sequential.corpora, fallback.corpora);
}

#[test]
fn shrunk_quota() {
    let dst = tempfile::tempdir().unwrap();
    let source = source();
    let params = CorpusParams {
        quota: QuotaRequest::fixed(3, 3, 3),
        ..params(6)
    };
    let output = run(&source, dst.path(), params);
    // 9 categories asked from 3: each partition shrinks to 1
    for partition in output.quota.partitions.values() {
        assert_eq!(partition.categories.len(), 1);
    }
}

#[test]
fn too_many_languages() {
    let dst = tempfile::tempdir().unwrap();
    let source = source();
    run(&source, dst.path(), params(7));

    let other = DatasetLayout::new(dst.path(), "v0_1", "de", "fr");
    let first = DatasetLayout::new(dst.path(), "v0_1", "en", "fr");
    let mut quota: serde_json::Value = json::load(&first.quota()).unwrap();
    quota["lang1"] = serde_json::Value::from("de");
    json::save(&quota, &other.quota()).unwrap();

    match CorpusReader::open(dst.path(), "v0_1") {
        Err(Error::TooManyLanguages(languages)) => assert_eq!(languages.len(), 3),
        result => panic!("expected too many languages, got {:?}", result.map(|_| ())),
    }
}
