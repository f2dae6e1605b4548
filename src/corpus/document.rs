//! Collected documents.
use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::fetch::{PageId, WikiSource};
use crate::finder::FoundPage;

/// A page with its text in the languages of its partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub pageid: PageId,
    pub title: String,
    /// language -> body text.
    pub text: BTreeMap<String, String>,
    /// resolved categories, sorted.
    pub categories: Vec<String>,
    /// labels of `categories`, filled in once every partition is collected.
    #[serde(default)]
    pub labels: Vec<u32>,
    pub partition: String,
}

impl Document {
    /// Fetch the texts of an admitted page.
    ///
    /// Returns [None] if the text is unavailable in one of `languages`.
    pub fn fetch<S: WikiSource>(
        source: &S,
        found: FoundPage,
        languages: &[String],
        partition: &str,
    ) -> Option<Self> {
        let mut text = BTreeMap::new();
        for language in languages {
            match source.page_text(&found.page, language) {
                Ok(body) => {
                    text.insert(language.clone(), body);
                }
                Err(e) => {
                    e.log(&format!("text of {} in {}", found.page.title, language));
                    warn!("dropping {}: no {} text", found.page.title, language);
                    return None;
                }
            }
        }

        Some(Self {
            pageid: found.page.pageid,
            title: found.page.title,
            text,
            categories: found.categories.into_iter().collect(),
            labels: Vec::new(),
            partition: partition.to_string(),
        })
    }
}

/// Documents collected for a partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionDocs {
    pub name: String,
    pub languages: Vec<String>,
    pub documents: Vec<Document>,
}

impl PartitionDocs {
    pub fn new(name: &str, languages: &[String]) -> Self {
        Self {
            name: name.to_string(),
            languages: languages.to_vec(),
            documents: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use crate::fetch::StaticSource;

    use super::*;

    fn found(source: &StaticSource, pageid: PageId) -> FoundPage {
        let page = source.page_metadata(pageid).unwrap();
        let categories: BTreeSet<String> = page.categories.iter().cloned().collect();
        FoundPage { page, categories }
    }

    #[test]
    fn test_fetch() {
        let source = StaticSource::new().with_page(1, "Apple", &["Pome", "Fruit"], &["en", "fr"]);
        let languages = vec!["en".to_string(), "fr".to_string()];
        let doc = Document::fetch(&source, found(&source, 1), &languages, "common").unwrap();

        assert_eq!(doc.text.get("fr").unwrap(), "Apple [fr]");
        assert_eq!(doc.categories, vec!["Fruit", "Pome"]);
        assert_eq!(doc.partition, "common");
    }

    #[test]
    fn test_missing_text() {
        let source = StaticSource::new().with_page(1, "Apple", &["Fruit"], &["en"]);
        let languages = vec!["en".to_string(), "fr".to_string()];
        assert!(Document::fetch(&source, found(&source, 1), &languages, "common").is_none());
    }
}
