//! In-memory category graph.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

use super::{CategoryMembers, FetchError, PageId, PageMetadata, PageRef, WikiSource};

/// A [WikiSource] over a graph held in memory.
///
/// Page texts are synthesized as `"<title in language> [<language>]"`.
/// Category listings and metadata requests are recorded, so that callers can check what was looked at.
#[derive(Default)]
pub struct StaticSource {
    categories: HashMap<String, (Vec<PageId>, Vec<String>)>,
    pages: HashMap<PageId, PageMetadata>,
    failing: HashSet<PageId>,
    listed: Mutex<Vec<String>>,
    requested: Mutex<Vec<PageId>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category with its member pages and subcategories.
    pub fn with_category(mut self, name: &str, pages: &[PageId], subcategories: &[&str]) -> Self {
        self.categories.insert(
            name.to_string(),
            (
                pages.to_vec(),
                subcategories.iter().map(|s| s.to_string()).collect(),
            ),
        );
        self
    }

    /// Add a page, available in `languages` under the same title.
    pub fn with_page(
        mut self,
        pageid: PageId,
        title: &str,
        categories: &[&str],
        languages: &[&str],
    ) -> Self {
        let languages: BTreeMap<String, String> = languages
            .iter()
            .map(|lang| (lang.to_string(), title.to_string()))
            .collect();
        self.pages.insert(
            pageid,
            PageMetadata {
                pageid,
                title: title.to_string(),
                categories: categories.iter().map(|s| s.to_string()).collect(),
                hidden_categories: Vec::new(),
                languages,
            },
        );
        self
    }

    /// Set the hidden categories of an already added page.
    pub fn with_hidden(mut self, pageid: PageId, hidden: &[&str]) -> Self {
        if let Some(page) = self.pages.get_mut(&pageid) {
            page.hidden_categories = hidden.iter().map(|s| s.to_string()).collect();
        }
        self
    }

    /// Make metadata requests on `pageid` fail with a malformed response.
    pub fn with_failing_page(mut self, pageid: PageId) -> Self {
        self.failing.insert(pageid);
        self
    }

    /// Categories listed so far, in request order.
    pub fn listed_categories(&self) -> Vec<String> {
        self.listed
            .lock()
            .map(|listed| listed.clone())
            .unwrap_or_default()
    }

    /// Pages whose metadata was requested so far, in request order.
    pub fn requested_pages(&self) -> Vec<PageId> {
        self.requested
            .lock()
            .map(|requested| requested.clone())
            .unwrap_or_default()
    }
}

impl WikiSource for StaticSource {
    fn category_members(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<CategoryMembers, FetchError> {
        if let Ok(mut listed) = self.listed.lock() {
            listed.push(category.to_string());
        }

        let (pages, subcategories) = self
            .categories
            .get(category)
            .ok_or_else(|| FetchError::NotFound(format!("category {}", category)))?;

        let pages: Vec<PageRef> = pages
            .iter()
            .take(limit)
            .map(|id| PageRef {
                pageid: *id,
                title: self
                    .pages
                    .get(id)
                    .map(|p| p.title.clone())
                    .unwrap_or_else(|| id.to_string()),
            })
            .collect();
        let subcategories = subcategories
            .iter()
            .take(limit)
            .cloned()
            .collect();

        Ok(CategoryMembers {
            pages,
            subcategories,
        })
    }

    fn page_metadata(&self, pageid: PageId) -> Result<PageMetadata, FetchError> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(pageid);
        }
        if self.failing.contains(&pageid) {
            return Err(FetchError::Malformed(format!("page {}", pageid)));
        }
        self.pages
            .get(&pageid)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("page {}", pageid)))
    }

    fn page_text(&self, page: &PageMetadata, language: &str) -> Result<String, FetchError> {
        page.languages
            .get(language)
            .map(|title| format!("{} [{}]", title, language))
            .ok_or_else(|| FetchError::NotFound(format!("page {} in {}", page.pageid, language)))
    }
}
