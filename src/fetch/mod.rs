/*! Category graph and page access

Everything the crawler knows about the encyclopedia comes through the [WikiSource] trait:
- category listings (member pages and subcategories),
- page metadata (categories, hidden categories, available languages),
- page body text, per language.

[WikiApi] implements it over the MediaWiki action API, [StaticSource] over an in-memory graph.

A failed fetch is never fatal for the crawl: callers reject the candidate and move on,
but log the three [FetchError] kinds differently (see [FetchError::log]).
!*/
mod api;
mod fixture;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use log::{debug, error};
use serde::{Deserialize, Serialize};

pub use api::WikiApi;
pub use fixture::StaticSource;

pub type PageId = u64;

/// A page as listed in a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub pageid: PageId,
    pub title: String,
}

/// Direct members of a category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryMembers {
    pub pages: Vec<PageRef>,
    /// subcategory names, without namespace prefix.
    pub subcategories: Vec<String>,
}

/// What is known about a page before its text is fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub pageid: PageId,
    pub title: String,
    pub categories: Vec<String>,
    pub hidden_categories: Vec<String>,
    /// language code -> page title in that language.
    pub languages: BTreeMap<String, String>,
}

impl PageMetadata {
    /// true if the page exists in every language of `languages`.
    pub fn available_in<S: AsRef<str>>(&self, languages: &[S]) -> bool {
        languages
            .iter()
            .all(|lang| self.languages.contains_key(lang.as_ref()))
    }

    /// Normal categories, followed by hidden ones if `with_hidden` is set.
    pub fn raw_categories(&self, with_hidden: bool) -> BTreeSet<String> {
        let hidden: &[String] = if with_hidden {
            self.hidden_categories.as_slice()
        } else {
            &[]
        };
        self.categories.iter().chain(hidden).cloned().collect()
    }
}

#[derive(Debug)]
pub enum FetchError {
    /// The page, category or language version does not exist.
    NotFound(String),
    /// Network or HTTP level failure.
    Transient(reqwest::Error),
    /// The response could not be understood.
    Malformed(String),
}

impl FetchError {
    /// Log the failure of fetching `what`.
    ///
    /// Absent content is expected while crawling and only logged at debug level.
    pub fn log(&self, what: &str) {
        match self {
            FetchError::NotFound(_) => debug!("{}: {}", what, self),
            FetchError::Transient(_) | FetchError::Malformed(_) => error!("{}: {}", what, self),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::NotFound(what) => write!(f, "not found: {}", what),
            FetchError::Transient(e) => write!(f, "transient fetch error: {}", e),
            FetchError::Malformed(e) => write!(f, "malformed response: {}", e),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Malformed(err.to_string())
        } else {
            FetchError::Transient(err)
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Malformed(err.to_string())
    }
}

/// Read access to the category graph.
///
/// Implementors must be [Sync]: parallel page searches share one source.
pub trait WikiSource: Sync {
    /// Direct member pages and subcategories of `category`, at most `limit` of each.
    fn category_members(&self, category: &str, limit: usize)
        -> Result<CategoryMembers, FetchError>;

    /// Categories and language versions of a page.
    fn page_metadata(&self, pageid: PageId) -> Result<PageMetadata, FetchError>;

    /// Body text of `page` in `language`.
    fn page_text(&self, page: &PageMetadata, language: &str) -> Result<String, FetchError>;
}
