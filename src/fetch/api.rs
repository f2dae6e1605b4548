//! MediaWiki action API client.
use std::collections::BTreeMap;

use log::debug;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::error::Error;

use super::{CategoryMembers, FetchError, PageId, PageMetadata, PageRef, WikiSource};

/// canonical namespace name, understood by every language edition.
const CATEGORY_PREFIX: &str = "Category:";
const NS_ARTICLE: i64 = 0;
const NS_CATEGORY: i64 = 14;
/// most members a single `list=categorymembers` request returns.
const MAX_BATCH: usize = 500;

#[derive(Deserialize)]
struct Response<T> {
    query: Option<T>,
    error: Option<ApiError>,
    #[serde(rename = "continue")]
    next: Option<Continue>,
}

#[derive(Deserialize)]
struct Continue {
    cmcontinue: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    code: String,
    info: String,
}

#[derive(Deserialize)]
struct MembersQuery {
    #[serde(default)]
    categorymembers: Vec<Member>,
}

#[derive(Deserialize)]
struct Member {
    pageid: PageId,
    title: String,
}

#[derive(Deserialize)]
struct PagesQuery {
    #[serde(default)]
    pages: Vec<RawPage>,
}

#[derive(Deserialize)]
struct RawPage {
    pageid: Option<PageId>,
    title: String,
    #[serde(default)]
    missing: bool,
    #[serde(default)]
    categories: Vec<RawCategory>,
    #[serde(default)]
    langlinks: Vec<LangLink>,
    extract: Option<String>,
}

#[derive(Deserialize)]
struct RawCategory {
    title: String,
    #[serde(default)]
    hidden: bool,
}

#[derive(Deserialize)]
struct LangLink {
    lang: String,
    title: String,
}

/// name of a category page title, whatever the localized namespace prefix (`Category:`, `Catégorie:`).
fn strip_category_prefix(title: &str) -> String {
    match title.split_once(':') {
        Some((_, name)) => name.to_string(),
        None => title.to_string(),
    }
}

/// Blocking client for one language edition's `api.php`.
///
/// Category listings and page metadata come from the edition of `language`;
/// texts in other languages are fetched from their own edition, through the page's language links.
pub struct WikiApi {
    client: Client,
    language: String,
    endpoint: Url,
}

impl WikiApi {
    pub fn new(language: &str) -> Result<Self, Error> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()
            .map_err(FetchError::from)?;

        Ok(Self {
            client,
            language: language.to_string(),
            endpoint: Self::endpoint(language)?,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    fn endpoint(language: &str) -> Result<Url, FetchError> {
        Url::parse(&format!("https://{}.wikipedia.org/w/api.php", language))
            .map_err(|e| FetchError::Malformed(format!("language {:?}: {}", language, e)))
    }

    /// fire a blocking `action=query` request and decode its `query` field.
    fn query<T: DeserializeOwned>(
        &self,
        endpoint: &Url,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        self.query_continued(endpoint, params).map(|(query, _)| query)
    }

    /// same as [WikiApi::query], also returning the continuation of a listing.
    fn query_continued<T: DeserializeOwned>(
        &self,
        endpoint: &Url,
        params: &[(&str, &str)],
    ) -> Result<(T, Option<Continue>), FetchError> {
        debug!("querying {} with {:?}", endpoint, params);
        let body = self
            .client
            .get(endpoint.clone())
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params)
            .send()?
            .error_for_status()?
            .text()?;

        let response: Response<T> = serde_json::from_str(&body)?;
        if let Some(e) = response.error {
            return Err(FetchError::Malformed(format!("{}: {}", e.code, e.info)));
        }
        let next = response.next;
        response
            .query
            .map(|query| (query, next))
            .ok_or_else(|| FetchError::Malformed("response has no query field".to_string()))
    }

    /// list at most `limit` members of `category` in `namespace`, following continuations.
    ///
    /// Pages and subcategories are listed separately, so that neither crowds the other out.
    fn members(&self, category: &str, namespace: i64, limit: usize) -> Result<Vec<Member>, FetchError> {
        let title = format!("{}{}", CATEGORY_PREFIX, category);
        let cmtype = if namespace == NS_CATEGORY { "subcat" } else { "page" };
        let namespace = namespace.to_string();
        let mut members = Vec::new();
        let mut from: Option<String> = None;
        while members.len() < limit {
            let batch = (limit - members.len()).min(MAX_BATCH).to_string();
            let mut params = vec![
                ("list", "categorymembers"),
                ("cmtitle", title.as_str()),
                ("cmtype", cmtype),
                ("cmnamespace", namespace.as_str()),
                ("cmlimit", batch.as_str()),
            ];
            if let Some(from) = &from {
                params.push(("cmcontinue", from.as_str()));
            }
            let (query, next): (MembersQuery, _) = self.query_continued(&self.endpoint, &params)?;
            members.extend(query.categorymembers);
            match next.and_then(|next| next.cmcontinue) {
                Some(next) => from = Some(next),
                None => break,
            }
        }
        members.truncate(limit);
        Ok(members)
    }

    /// get the single page of a `prop=` query, failing on missing pages.
    fn single_page(query: PagesQuery, what: &str) -> Result<RawPage, FetchError> {
        match query.pages.into_iter().next() {
            Some(page) if !page.missing => Ok(page),
            _ => Err(FetchError::NotFound(what.to_string())),
        }
    }
}

impl WikiSource for WikiApi {
    fn category_members(
        &self,
        category: &str,
        limit: usize,
    ) -> Result<CategoryMembers, FetchError> {
        let pages = self
            .members(category, NS_ARTICLE, limit)?
            .into_iter()
            .map(|member| PageRef {
                pageid: member.pageid,
                title: member.title,
            })
            .collect();
        let subcategories = self
            .members(category, NS_CATEGORY, limit)?
            .iter()
            .map(|member| strip_category_prefix(&member.title))
            .collect();
        Ok(CategoryMembers {
            pages,
            subcategories,
        })
    }

    fn page_metadata(&self, pageid: PageId) -> Result<PageMetadata, FetchError> {
        let id = pageid.to_string();
        let query: PagesQuery = self.query(
            &self.endpoint,
            &[
                ("pageids", id.as_str()),
                ("prop", "categories|langlinks"),
                ("clprop", "hidden"),
                ("cllimit", "max"),
                ("lllimit", "max"),
            ],
        )?;
        let page = Self::single_page(query, &format!("page {}", pageid))?;

        let (hidden, normal): (Vec<_>, Vec<_>) =
            page.categories.into_iter().partition(|c| c.hidden);

        let mut languages: BTreeMap<String, String> = page
            .langlinks
            .into_iter()
            .map(|link| (link.lang, link.title))
            .collect();
        languages.insert(self.language.clone(), page.title.clone());

        Ok(PageMetadata {
            pageid: page.pageid.unwrap_or(pageid),
            title: page.title,
            categories: normal
                .iter()
                .map(|c| strip_category_prefix(&c.title))
                .collect(),
            hidden_categories: hidden
                .iter()
                .map(|c| strip_category_prefix(&c.title))
                .collect(),
            languages,
        })
    }

    fn page_text(&self, page: &PageMetadata, language: &str) -> Result<String, FetchError> {
        let what = format!("page {} in {}", page.pageid, language);
        let query: PagesQuery = if language == self.language {
            let id = page.pageid.to_string();
            let params = [
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("pageids", id.as_str()),
            ];
            self.query(&self.endpoint, &params)?
        } else {
            let title = page
                .languages
                .get(language)
                .ok_or_else(|| FetchError::NotFound(what.clone()))?;
            let params = [
                ("prop", "extracts"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", title.as_str()),
            ];
            self.query(&Self::endpoint(language)?, &params)?
        };

        Self::single_page(query, &what)?
            .extract
            .ok_or(FetchError::NotFound(what))
    }
}
