/*! Page search

A [PageFinder] looks for pages of a category that satisfy a [Search]:
pages must exist in every required language, must not be in a forbidden category,
and must have a sensible number of categories.

The search goes down the category graph round by round:
each round lists the pages of the current frontier, reviews them in random order,
then moves the frontier to the subcategories that still belong to the searched category.
!*/
use std::collections::{BTreeSet, HashSet};

use log::{debug, log_enabled, warn, Level};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::MEMBER_LIMIT;
use crate::fetch::{PageId, PageMetadata, WikiSource};
use crate::filtering::{Filter, NameFilter};
use crate::tree::{ExcludedCategories, SubcatMap};

#[derive(Debug, Clone)]
pub struct FinderParams {
    /// minimum number of resolved categories on an admitted page.
    pub min_categories: usize,
    /// maximum number of resolved categories on an admitted page.
    pub max_categories: usize,
    pub max_rounds: usize,
    /// also consider hidden categories of pages.
    pub hidden_categories: bool,
    pub excluded: ExcludedCategories,
    /// keep categories the map does not know, as [crate::constants::UNMAPPED_CAT_NAME].
    pub keep_unmapped: bool,
    pub member_limit: usize,
}

impl Default for FinderParams {
    fn default() -> Self {
        Self {
            min_categories: 1,
            max_categories: 10,
            max_rounds: 20,
            hidden_categories: false,
            excluded: ExcludedCategories::DefaultSet,
            keep_unmapped: false,
            member_limit: MEMBER_LIMIT,
        }
    }
}

/// What to look for.
#[derive(Debug, Clone)]
pub struct Search<'a> {
    pub category: &'a str,
    pub target: usize,
    pub languages: &'a [String],
    pub forbidden_categories: &'a BTreeSet<String>,
}

/// An admitted page and its resolved categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundPage {
    pub page: PageMetadata,
    pub categories: BTreeSet<String>,
}

pub struct PageFinder<'a, S: WikiSource> {
    source: &'a S,
    map: Option<&'a SubcatMap>,
    filter: NameFilter,
    params: FinderParams,
}

impl<'a, S: WikiSource> PageFinder<'a, S> {
    pub fn new(source: &'a S, params: FinderParams) -> Self {
        Self {
            source,
            map: None,
            filter: NameFilter::default(),
            params,
        }
    }

    /// Resolve page categories through `map`, and only follow subcategories mapped to the searched category.
    pub fn with_map(mut self, map: Option<&'a SubcatMap>) -> Self {
        self.map = map;
        self
    }

    pub fn params(&self) -> &FinderParams {
        &self.params
    }

    /// Categories of `page`, resolved through the map if there is one.
    pub fn resolve(&self, page: &PageMetadata) -> BTreeSet<String> {
        let raw = page.raw_categories(self.params.hidden_categories);
        match self.map {
            Some(map) => map.resolve(&raw, &self.params.excluded, self.params.keep_unmapped),
            None => raw,
        }
    }

    /// Find at most `search.target` pages.
    ///
    /// Pages in `reviewed` are never considered, and every page looked at is added to it.
    /// Fewer pages are returned when the rounds run out or there is no subcategory left to go down to.
    pub fn find<R: Rng>(
        &self,
        search: &Search,
        reviewed: &mut HashSet<PageId>,
        rng: &mut R,
    ) -> Vec<FoundPage> {
        let mut found = Vec::new();
        let mut frontier = vec![search.category.to_string()];
        let mut visited: HashSet<String> = frontier.iter().cloned().collect();
        let mut round = 0;

        while found.len() < search.target && round < self.params.max_rounds && !frontier.is_empty() {
            let mut seen = HashSet::new();
            let mut candidates: Vec<PageId> = Vec::new();
            let mut subcategories = Vec::new();
            for category in &frontier {
                match self.source.category_members(category, self.params.member_limit) {
                    Ok(members) => {
                        candidates.extend(
                            members
                                .pages
                                .iter()
                                .map(|p| p.pageid)
                                .filter(|id| !reviewed.contains(id) && seen.insert(*id)),
                        );
                        subcategories.extend(members.subcategories);
                    }
                    Err(e) => e.log(&format!("members of {}", category)),
                }
            }

            // listing order is not random
            candidates.shuffle(rng);
            debug!(
                "{}: round={} found={} frontier={} candidates={}",
                search.category,
                round,
                found.len(),
                frontier.len(),
                candidates.len()
            );

            for pageid in candidates {
                if found.len() >= search.target {
                    break;
                }
                reviewed.insert(pageid);
                let page = match self.source.page_metadata(pageid) {
                    Ok(page) => page,
                    Err(e) => {
                        e.log(&format!("page {}", pageid));
                        continue;
                    }
                };
                if let Some(categories) = self.admit(&page, search) {
                    found.push(FoundPage { page, categories });
                }
            }

            frontier = subcategories
                .into_iter()
                .filter(|sub| self.follows(sub, search.category))
                .filter(|sub| visited.insert(sub.clone()))
                .collect();
            round += 1;
        }

        if found.len() < search.target {
            warn!(
                "{}: found {} of {} pages in {} rounds",
                search.category,
                found.len(),
                search.target,
                round
            );
        }
        found
    }

    /// resolved categories of `page` if it can be admitted.
    fn admit(&self, page: &PageMetadata, search: &Search) -> Option<BTreeSet<String>> {
        if !page.available_in(search.languages) {
            debug!("{} rejected: missing languages", page.title);
            return None;
        }

        let categories = self.resolve(page);
        if !categories.is_disjoint(search.forbidden_categories) {
            if log_enabled!(Level::Debug) {
                let forbidden: Vec<&String> =
                    categories.intersection(search.forbidden_categories).collect();
                debug!("{} rejected: forbidden categories {:?}", page.title, forbidden);
            }
            return None;
        }

        let n = categories.len();
        if n < self.params.min_categories || n > self.params.max_categories {
            debug!("{} rejected: {} categories", page.title, n);
            return None;
        }
        Some(categories)
    }

    /// whether the search goes down into `subcategory`.
    fn follows(&self, subcategory: &str, category: &str) -> bool {
        match self.map {
            Some(map) => map.get(subcategory) == Some(category),
            None => self.filter.detect(subcategory),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::fetch::StaticSource;

    use super::*;

    fn fruits() -> StaticSource {
        StaticSource::new()
            .with_category("Fruit", &[1, 2], &["Citrus"])
            .with_category("Citrus", &[2, 3], &[])
            .with_page(1, "Apple", &["Fruit"], &["en", "fr"])
            .with_page(2, "Orange", &["Fruit", "Citrus"], &["en"])
            .with_page(3, "Lemon", &["Citrus"], &["en"])
    }

    fn en() -> Vec<String> {
        vec!["en".to_string()]
    }

    #[test_log::test]
    fn test_target_met_first_round() {
        let source = fruits();
        let languages = en();
        let forbidden = BTreeSet::new();
        let search = Search {
            category: "Fruit",
            target: 2,
            languages: &languages,
            forbidden_categories: &forbidden,
        };
        let mut reviewed = HashSet::new();
        let found = PageFinder::new(&source, FinderParams::default()).find(
            &search,
            &mut reviewed,
            &mut StdRng::seed_from_u64(1),
        );

        let titles: BTreeSet<&str> = found.iter().map(|f| f.page.title.as_str()).collect();
        assert_eq!(titles, vec!["Apple", "Orange"].into_iter().collect());
        assert_eq!(source.listed_categories(), vec!["Fruit".to_string()]);
        assert_eq!(reviewed.len(), 2);
    }

    #[test]
    fn test_goes_down() {
        let source = fruits();
        let languages = en();
        let forbidden = BTreeSet::new();
        let search = Search {
            category: "Fruit",
            target: 5,
            languages: &languages,
            forbidden_categories: &forbidden,
        };
        let mut reviewed = HashSet::new();
        let found = PageFinder::new(&source, FinderParams::default()).find(
            &search,
            &mut reviewed,
            &mut StdRng::seed_from_u64(1),
        );
        // Orange is listed twice but only found once
        assert_eq!(found.len(), 3);
        assert_eq!(source.listed_categories(), vec!["Fruit", "Citrus"]);
    }

    #[test]
    fn test_reviewed_pages() {
        let source = fruits();
        let languages = en();
        let forbidden = BTreeSet::new();
        let search = Search {
            category: "Fruit",
            target: 3,
            languages: &languages,
            forbidden_categories: &forbidden,
        };
        let mut reviewed: HashSet<PageId> = vec![1].into_iter().collect();
        let finder = PageFinder::new(&source, FinderParams::default());
        let found = finder.find(&search, &mut reviewed, &mut StdRng::seed_from_u64(1));
        assert!(found.len() <= 3);
        assert!(found.iter().all(|f| f.page.pageid != 1));

        // nothing left for a second search
        let again = finder.find(&search, &mut reviewed, &mut StdRng::seed_from_u64(1));
        assert!(again.is_empty());
    }

    #[test]
    fn test_constraints() {
        let source = fruits();
        let both = vec!["en".to_string(), "fr".to_string()];
        let forbidden = BTreeSet::new();
        let search = Search {
            category: "Fruit",
            target: 3,
            languages: &both,
            forbidden_categories: &forbidden,
        };
        let finder = PageFinder::new(&source, FinderParams::default());
        let found = finder.find(&search, &mut HashSet::new(), &mut StdRng::seed_from_u64(1));
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].page.title, "Apple");

        let languages = en();
        let forbidden: BTreeSet<String> = vec!["Citrus".to_string()].into_iter().collect();
        let search = Search {
            category: "Fruit",
            target: 3,
            languages: &languages,
            forbidden_categories: &forbidden,
        };
        let found = finder.find(&search, &mut HashSet::new(), &mut StdRng::seed_from_u64(1));
        assert_eq!(found.len(), 1);

        let params = FinderParams {
            max_categories: 1,
            ..Default::default()
        };
        let forbidden = BTreeSet::new();
        let search = Search {
            category: "Fruit",
            target: 3,
            languages: &languages,
            forbidden_categories: &forbidden,
        };
        let found = PageFinder::new(&source, params).find(
            &search,
            &mut HashSet::new(),
            &mut StdRng::seed_from_u64(1),
        );
        assert!(found.iter().all(|f| f.page.title != "Orange"));
    }

    #[test]
    fn test_map() {
        let source = StaticSource::new()
            .with_category("Fruit", &[1], &["Citrus", "Fruit trade"])
            .with_category("Citrus", &[2], &[])
            .with_category("Fruit trade", &[3], &[])
            .with_page(1, "Apple", &["Apples"], &["en"])
            .with_page(2, "Lemon", &["Citrus", "Unmapped"], &["en"])
            .with_page(3, "Banana Inc", &["Fruit trade"], &["en"]);
        let mut map = SubcatMap::new();
        map.insert("Apples".to_string(), "Fruit".to_string());
        map.insert("Citrus".to_string(), "Fruit".to_string());
        map.insert("Fruit trade".to_string(), "Economy".to_string());

        let languages = en();
        let forbidden = BTreeSet::new();
        let search = Search {
            category: "Fruit",
            target: 10,
            languages: &languages,
            forbidden_categories: &forbidden,
        };
        let finder = PageFinder::new(&source, FinderParams::default()).with_map(Some(&map));
        let found = finder.find(&search, &mut HashSet::new(), &mut StdRng::seed_from_u64(1));

        assert_eq!(found.len(), 2);
        for f in &found {
            assert_eq!(f.categories, vec!["Fruit".to_string()].into_iter().collect());
        }
        assert!(!source.listed_categories().contains(&"Fruit trade".to_string()));
    }

    #[test]
    fn test_max_rounds() {
        let source = fruits();
        let languages = en();
        let forbidden = BTreeSet::new();
        let search = Search {
            category: "Fruit",
            target: 5,
            languages: &languages,
            forbidden_categories: &forbidden,
        };
        let params = FinderParams {
            max_rounds: 1,
            ..Default::default()
        };
        let found = PageFinder::new(&source, params).find(
            &search,
            &mut HashSet::new(),
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(found.len(), 2);
        assert_eq!(source.listed_categories(), vec!["Fruit"]);
    }

    #[test]
    fn test_failing_page() {
        let source = StaticSource::new()
            .with_category("Fruit", &[1, 2, 3, 4], &[])
            .with_page(1, "Apple", &["Fruit"], &["en"])
            .with_page(2, "Pear", &["Fruit"], &["en"])
            .with_page(3, "Plum", &["Fruit"], &["en"])
            .with_page(4, "Fig", &["Fruit"], &["en"])
            .with_failing_page(2);
        let languages = en();
        let forbidden = BTreeSet::new();
        let search = Search {
            category: "Fruit",
            target: 3,
            languages: &languages,
            forbidden_categories: &forbidden,
        };
        let mut reviewed = HashSet::new();
        let found = PageFinder::new(&source, FinderParams::default()).find(
            &search,
            &mut reviewed,
            &mut StdRng::seed_from_u64(1),
        );

        let ids: BTreeSet<PageId> = found.iter().map(|f| f.page.pageid).collect();
        assert_eq!(ids, vec![1, 3, 4].into_iter().collect());
        assert!(source.requested_pages().contains(&2));
        assert!(reviewed.contains(&2));
    }

    #[test]
    fn test_hidden_categories() {
        let source = StaticSource::new()
            .with_category("Fruit", &[1], &[])
            .with_page(1, "Apple", &["Fruit"], &["en"])
            .with_hidden(1, &["Articles needing cleanup"]);
        let languages = en();
        let forbidden: BTreeSet<String> = vec!["Articles needing cleanup".to_string()]
            .into_iter()
            .collect();
        let search = Search {
            category: "Fruit",
            target: 1,
            languages: &languages,
            forbidden_categories: &forbidden,
        };

        let found = PageFinder::new(&source, FinderParams::default()).find(
            &search,
            &mut HashSet::new(),
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].categories.len(), 1);

        let params = FinderParams {
            hidden_categories: true,
            ..Default::default()
        };
        let found = PageFinder::new(&source, params).find(
            &search,
            &mut HashSet::new(),
            &mut StdRng::seed_from_u64(1),
        );
        assert!(found.is_empty());
    }
}
