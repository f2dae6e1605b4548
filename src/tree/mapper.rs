//! Projection of categories onto primary categories.
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::str::FromStr;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::constants::{BAD_CAT_NAME, EXCLUDED_CATS, GLOB_CAT_NAME, UNMAPPED_CAT_NAME};
use crate::error::Error;
use crate::fetch::WikiSource;
use crate::io::json;

use super::{CategoryTree, Classification};

/// Categories removed from a resolved category set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExcludedCategories {
    None,
    /// the marker categories, see [EXCLUDED_CATS].
    DefaultSet,
    Custom(BTreeSet<String>),
}

impl ExcludedCategories {
    pub fn contains(&self, category: &str) -> bool {
        match self {
            ExcludedCategories::None => false,
            ExcludedCategories::DefaultSet => EXCLUDED_CATS.contains(category),
            ExcludedCategories::Custom(set) => set.contains(category),
        }
    }
}

impl Default for ExcludedCategories {
    fn default() -> Self {
        ExcludedCategories::DefaultSet
    }
}

impl FromStr for ExcludedCategories {
    type Err = Error;

    /// `none`, `default`, or a comma separated list of category names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "none" => Ok(ExcludedCategories::None),
            "default" => Ok(ExcludedCategories::DefaultSet),
            "" => Err(Error::Custom("empty excluded category list".to_string())),
            list => Ok(ExcludedCategories::Custom(
                list.split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect(),
            )),
        }
    }
}

/// Subcategory -> primary category (or marker) map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubcatMap(BTreeMap<String, String>);

impl SubcatMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, category: &str) -> Option<&str> {
        self.0.get(category).map(String::as_str)
    }

    pub fn insert(&mut self, category: String, primary: String) {
        self.0.insert(category, primary);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        json::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<(), Error> {
        json::save(self, path)
    }

    /// Load the map at `path` if any.
    ///
    /// A missing file is not an error: a warning is emitted and pages keep their raw categories.
    pub fn load_optional(path: Option<&Path>) -> Result<Option<Self>, Error> {
        match path {
            None => Ok(None),
            Some(p) if !p.exists() => {
                warn!("no category map at {:?}, using raw categories", p);
                Ok(None)
            }
            Some(p) => {
                let map = Self::load(p)?;
                info!("loaded {} category mappings from {:?}", map.len(), p);
                Ok(Some(map))
            }
        }
    }

    /// Map raw categories onto primary categories.
    ///
    /// Unknown categories resolve to [UNMAPPED_CAT_NAME], kept only if `keep_unmapped` is set.
    pub fn resolve<I, S>(
        &self,
        categories: I,
        excluded: &ExcludedCategories,
        keep_unmapped: bool,
    ) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        categories
            .into_iter()
            .map(|c| self.get(c.as_ref()).unwrap_or(UNMAPPED_CAT_NAME))
            .filter(|c| keep_unmapped || *c != UNMAPPED_CAT_NAME)
            .filter(|c| !excluded.contains(c))
            .map(String::from)
            .collect()
    }
}

/// Result of a tree projection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub subcat2cat: SubcatMap,
    /// distinct primary categories, markers excluded.
    pub primary: Vec<String>,
}

impl Mapping {
    fn from_map(subcat2cat: SubcatMap) -> Self {
        let primary: BTreeSet<&str> = subcat2cat
            .iter()
            .map(|(_, primary)| primary.as_str())
            .filter(|primary| !EXCLUDED_CATS.contains(primary))
            .collect();
        let primary = primary.into_iter().map(String::from).collect();
        Self {
            subcat2cat,
            primary,
        }
    }
}

/// Projects the categories of a [CategoryTree] onto their ancestor at `primary_level`.
pub struct SubcategoryMapper {
    primary_level: usize,
    max_level: Option<usize>,
}

impl SubcategoryMapper {
    pub fn new(primary_level: usize) -> Self {
        Self {
            primary_level,
            max_level: None,
        }
    }

    /// Ignore categories deeper than `max_level`.
    pub fn with_max_level(mut self, max_level: usize) -> Self {
        self.max_level = Some(max_level);
        self
    }

    pub fn map(&self, tree: &CategoryTree) -> Mapping {
        let mut subcat2cat = SubcatMap::new();
        for (name, category) in tree.iter() {
            if self.max_level.map_or(false, |max| category.level > max) {
                continue;
            }
            subcat2cat.insert(name.clone(), self.primary_of(tree, name));
        }
        let mapping = Mapping::from_map(subcat2cat);
        info!(
            "mapped {} categories onto {} primary categories of level {}",
            mapping.subcat2cat.len(),
            mapping.primary.len(),
            self.primary_level
        );
        mapping
    }

    fn primary_of(&self, tree: &CategoryTree, name: &str) -> String {
        let mut node = match tree.get(name) {
            Some(node) => node,
            None => return BAD_CAT_NAME.to_string(),
        };
        if node.level < self.primary_level {
            return GLOB_CAT_NAME.to_string();
        }
        if node.class != Classification::Significant {
            return node.class.marker().to_string();
        }

        let mut current = name;
        while node.level > self.primary_level {
            if node.parents.len() > 1 {
                warn!(
                    "{} has several parents {:?}, following the first one",
                    current, node.parents
                );
            }
            let parent = match node.parents.iter().next() {
                Some(parent) => parent.as_str(),
                None => {
                    warn!("{} has no parent above level {}", current, node.level);
                    return BAD_CAT_NAME.to_string();
                }
            };
            match tree.get(parent) {
                Some(p) if p.level < node.level => {
                    current = parent;
                    node = p;
                }
                _ => {
                    warn!("parent {} of {} is unknown or misplaced", parent, current);
                    return BAD_CAT_NAME.to_string();
                }
            }
        }
        current.to_string()
    }
}

/// Map every category reachable from `roots` onto the root it was first reached from.
///
/// A category reached again at the same depth from another root is mapped to [BAD_CAT_NAME]
/// and not expanded further.
/// Returns the map and the depth of each category.
pub fn map_from_roots<S: WikiSource>(
    source: &S,
    roots: &[String],
    max_level: usize,
    member_limit: usize,
) -> (SubcatMap, BTreeMap<String, usize>) {
    let mut map = SubcatMap::new();
    let mut depth: BTreeMap<String, usize> = BTreeMap::new();
    for root in roots {
        map.insert(root.clone(), root.clone());
        depth.insert(root.clone(), 0);
    }

    for level in 0..max_level {
        let current: Vec<(String, String)> = depth
            .iter()
            .filter(|(_, d)| **d == level)
            .filter_map(|(name, _)| match map.get(name) {
                Some(BAD_CAT_NAME) | None => None,
                Some(main) => Some((name.clone(), main.to_string())),
            })
            .collect();
        if current.is_empty() {
            break;
        }

        for (name, main) in current {
            let members = match source.category_members(&name, member_limit) {
                Ok(m) => m,
                Err(e) => {
                    e.log(&format!("subcategories of {}", name));
                    continue;
                }
            };
            for sub in members.subcategories {
                match depth.get(&sub) {
                    None => {
                        map.insert(sub.clone(), main.clone());
                        depth.insert(sub, level + 1);
                    }
                    Some(d) if *d == level + 1 && map.get(&sub) != Some(main.as_str()) => {
                        debug!("{} reached from several roots", sub);
                        map.insert(sub, BAD_CAT_NAME.to_string());
                    }
                    Some(_) => (),
                }
            }
        }
        info!(
            "level={} mapped={}",
            level + 1,
            depth.values().filter(|d| **d == level + 1).count()
        );
    }

    (map, depth)
}

/// Save a [Mapping] where [crate::io::TreeLayout] puts it.
pub fn save_mapping(
    mapping: &Mapping,
    layout: &crate::io::TreeLayout,
    max_level: usize,
    primary_level: usize,
) -> Result<(), Error> {
    mapping
        .subcat2cat
        .save(&layout.subcat_map(max_level, primary_level))?;
    json::save(
        &mapping.primary,
        &layout.primary_categories(primary_level, mapping.primary.len()),
    )
}
