//! Listing page controller
//!
//! The first page is fetched when the listing is rendered. Further pages are
//! appended through "load more", which follows the `next_page` cursor and
//! returns a new [`ListingState`] instead of mutating the current one.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cms::{ContentApi, Cursor, Direction, Query, Result, SearchResponse};
use crate::cms::query::FIRST_PUBLICATION_DATE;
use crate::config::CmsConfig;
use crate::content::PostSummary;
use crate::helpers::{post_path, DateFormatter};

/// A post ready for display in the listing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListedPost {
    pub uid: String,
    pub path: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    /// Publication date in the site's display format
    pub date: String,
    /// Publication date as RFC 3339, empty when unpublished
    pub datetime: String,
    #[serde(skip)]
    pub first_publication_date: Option<DateTime<Utc>>,
}

impl ListedPost {
    pub fn new(summary: PostSummary, formatter: &DateFormatter) -> Self {
        Self {
            path: post_path(&summary.uid),
            date: formatter.format_opt(summary.first_publication_date.as_ref()),
            datetime: summary
                .first_publication_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            first_publication_date: summary.first_publication_date,
            uid: summary.uid,
            title: summary.title,
            subtitle: summary.subtitle,
            author: summary.author,
        }
    }
}

/// One page of the listing, as served to the load-more button
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostPagination {
    pub next_page: Option<Cursor>,
    pub results: Vec<ListedPost>,
}

impl PostPagination {
    fn from_response(response: SearchResponse, formatter: &DateFormatter) -> Result<Self> {
        let mut results = Vec::with_capacity(response.results.len());
        for doc in &response.results {
            let summary = PostSummary::try_from(doc)?;
            if summary.uid.is_empty() {
                tracing::warn!("Skipping document {} without uid", doc.id);
                continue;
            }
            results.push(ListedPost::new(summary, formatter));
        }

        Ok(Self {
            next_page: response.next_page,
            results,
        })
    }
}

/// A listing page as fetched by the load-more button
///
/// `next_url` is where the button goes next: the server's load-more route,
/// or a pre-rendered file in the static site.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadMoreResponse {
    pub results: Vec<ListedPost>,
    pub next_page: Option<Cursor>,
    pub next_url: Option<String>,
}

impl PostPagination {
    pub fn with_next_url(self, next_url: Option<String>) -> LoadMoreResponse {
        LoadMoreResponse {
            results: self.results,
            next_page: self.next_page,
            next_url,
        }
    }
}

/// The listing query: newest posts first
pub fn listing_query(cms: &CmsConfig, revision: Option<&str>) -> Query {
    Query::by_type(&cms.document_type)
        .page_size(cms.page_size)
        .revision(revision)
        .order_by(FIRST_PUBLICATION_DATE, Direction::Desc)
}

/// Fetch the first page of posts
pub async fn first_page(
    api: &dyn ContentApi,
    cms: &CmsConfig,
    revision: Option<&str>,
    formatter: &DateFormatter,
) -> Result<PostPagination> {
    let response = api.query(&listing_query(cms, revision)).await?;
    PostPagination::from_response(response, formatter)
}

/// Fetch the page a cursor points to
pub async fn fetch_more(
    api: &dyn ContentApi,
    cursor: &Cursor,
    formatter: &DateFormatter,
) -> Result<PostPagination> {
    tracing::debug!("Loading more posts from {}", cursor);
    let response = api.next_page(cursor).await?;
    PostPagination::from_response(response, formatter)
}

/// Posts shown so far and the cursor to the next page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListingState {
    posts: Vec<ListedPost>,
    next_page: Option<Cursor>,
    preview: bool,
}

impl ListingState {
    pub fn new(first: PostPagination, preview: bool) -> Self {
        Self {
            posts: first.results,
            next_page: first.next_page,
            preview,
        }
    }

    /// Fetch the first page and start a listing from it
    pub async fn load(
        api: &dyn ContentApi,
        cms: &CmsConfig,
        revision: Option<&str>,
        formatter: &DateFormatter,
    ) -> Result<Self> {
        let first = first_page(api, cms, revision, formatter).await?;
        Ok(Self::new(first, revision.is_some()))
    }

    pub fn posts(&self) -> &[ListedPost] {
        &self.posts
    }

    pub fn next_page(&self) -> Option<&Cursor> {
        self.next_page.as_ref()
    }

    /// The "load more" control is offered only while a cursor remains
    pub fn can_load_more(&self) -> bool {
        self.next_page.is_some()
    }

    pub fn is_preview(&self) -> bool {
        self.preview
    }

    /// A new state with `page` appended and its cursor in place
    pub fn appended(&self, page: PostPagination) -> Self {
        let mut posts = self.posts.clone();
        posts.extend(page.results);
        Self {
            posts,
            next_page: page.next_page,
            preview: self.preview,
        }
    }

    /// Fetch the next page and return the extended listing
    ///
    /// With no cursor left the current state is returned unchanged.
    pub async fn load_more(
        &self,
        api: &dyn ContentApi,
        formatter: &DateFormatter,
    ) -> Result<Self> {
        let Some(cursor) = &self.next_page else {
            return Ok(self.clone());
        };
        let page = fetch_more(api, cursor, formatter).await?;
        Ok(self.appended(page))
    }

    /// Follow the cursor until the listing is exhausted
    pub async fn load_all(self, api: &dyn ContentApi, formatter: &DateFormatter) -> Result<Self> {
        let mut state = self;
        while let Some(cursor) = state.next_page.clone() {
            let next = state.load_more(api, formatter).await?;
            if next.next_page.as_ref() == Some(&cursor) {
                tracing::warn!("Cursor {} repeated itself, stopping", cursor);
                return Ok(Self {
                    next_page: None,
                    ..next
                });
            }
            state = next;
        }
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{parse_date, Document, MemoryApi};

    fn post(uid: &str, date: &str) -> Document {
        Document {
            id: format!("id-{}", uid),
            uid: Some(uid.to_string()),
            doc_type: "posts".to_string(),
            first_publication_date: parse_date(date),
            last_publication_date: parse_date(date),
            data: serde_json::json!({
                "title": format!("Post {}", uid),
                "subtitle": "Subtítulo",
                "author": "Joseph Oliveira"
            }),
        }
    }

    fn api() -> MemoryApi {
        MemoryApi::new(vec![
            post("um", "2021-01-01T12:00:00+0000"),
            post("dois", "2021-02-01T12:00:00+0000"),
            post("tres", "2021-03-05T12:00:00+0000"),
        ])
    }

    #[tokio::test]
    async fn test_first_page_is_newest_first() {
        let api = api();
        let state = ListingState::load(&api, &CmsConfig::default(), None, &DateFormatter::default())
            .await
            .unwrap();

        let uids: Vec<_> = state.posts().iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, ["tres", "dois"]);
        assert_eq!(state.posts()[0].date, "05 Mar 2021");
        assert_eq!(state.posts()[0].path, "/post/tres");
        assert!(state.can_load_more());
        assert!(!state.is_preview());
    }

    #[tokio::test]
    async fn test_load_more_appends_and_replaces_cursor() {
        let api = api();
        let formatter = DateFormatter::default();
        let state = ListingState::load(&api, &CmsConfig::default(), None, &formatter)
            .await
            .unwrap();

        let more = state.load_more(&api, &formatter).await.unwrap();
        assert!(more.posts().len() > state.posts().len());
        assert_eq!(more.posts()[2].uid, "um");
        assert_ne!(more.next_page(), state.next_page());
        assert!(!more.can_load_more());

        // the previous state is untouched
        assert_eq!(state.posts().len(), 2);
    }

    #[tokio::test]
    async fn test_exhausted_listing_offers_no_load_more() {
        let api = api();
        let formatter = DateFormatter::default();
        let cms = CmsConfig {
            page_size: 10,
            ..Default::default()
        };
        let state = ListingState::load(&api, &cms, None, &formatter).await.unwrap();
        assert_eq!(state.posts().len(), 3);
        assert!(!state.can_load_more());

        let same = state.load_more(&api, &formatter).await.unwrap();
        assert_eq!(same, state);
    }

    #[tokio::test]
    async fn test_load_all() {
        let api = api();
        let formatter = DateFormatter::default();
        let cms = CmsConfig {
            page_size: 1,
            ..Default::default()
        };
        let state = ListingState::load(&api, &cms, None, &formatter)
            .await
            .unwrap()
            .load_all(&api, &formatter)
            .await
            .unwrap();
        assert_eq!(state.posts().len(), 3);
        assert!(state.next_page().is_none());
    }

    #[tokio::test]
    async fn test_documents_without_uid_are_skipped() {
        let mut orphan = post("orfao", "2021-04-01T12:00:00+0000");
        orphan.uid = None;
        let api = MemoryApi::new(vec![orphan, post("um", "2021-01-01T12:00:00+0000")]);

        let state = ListingState::load(&api, &CmsConfig::default(), None, &DateFormatter::default())
            .await
            .unwrap();
        let uids: Vec<_> = state.posts().iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, ["um"]);
    }

    #[test]
    fn test_listing_query() {
        let query = listing_query(&CmsConfig::default(), Some("preview-ref"));
        assert_eq!(query.page_size, 2);
        assert_eq!(query.revision.as_deref(), Some("preview-ref"));
        assert_eq!(
            query.ordering.as_ref().map(|o| o.render()),
            Some("[document.first_publication_date desc]".to_string())
        );
    }
}
