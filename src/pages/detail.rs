//! Detail page controller

use chrono::{DateTime, Utc};

use crate::cms::query::FIRST_PUBLICATION_DATE;
use crate::cms::{ContentApi, Direction, Document, Query, Result};
use crate::config::{CmsConfig, SiteConfig};
use crate::content::{read_timing, AdjacentPost, PostDetail};
use crate::helpers::is_canonical_slug;

/// Page size used when walking every post for static paths
const PATHS_PAGE_SIZE: u32 = 100;

/// Whether a page shows published content or a preview revision
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderMode {
    Published,
    Preview { revision: String },
}

impl RenderMode {
    pub fn revision(&self) -> Option<&str> {
        match self {
            RenderMode::Published => None,
            RenderMode::Preview { revision } => Some(revision),
        }
    }

    pub fn is_preview(&self) -> bool {
        matches!(self, RenderMode::Preview { .. })
    }
}

/// What the detail controller needs from the site configuration
#[derive(Debug, Clone)]
pub struct PostSettings {
    pub document_type: String,
    pub words_per_minute: u32,
}

impl From<&SiteConfig> for PostSettings {
    fn from(config: &SiteConfig) -> Self {
        Self {
            document_type: config.cms.document_type.clone(),
            words_per_minute: config.reading.words_per_minute,
        }
    }
}

/// A resolved post with everything its page displays
#[derive(Debug, Clone, PartialEq)]
pub struct PostPage {
    pub post: PostDetail,
    /// Estimated minutes to read
    pub read_timing: u32,
    pub next: Option<AdjacentPost>,
    pub previous: Option<AdjacentPost>,
    pub preview: bool,
}

/// Resolve a post by slug
///
/// Adjacent posts are looked up only for published posts that carry a
/// publication date.
pub async fn resolve(
    api: &dyn ContentApi,
    settings: &PostSettings,
    slug: &str,
    mode: &RenderMode,
) -> Result<PostPage> {
    let doc = api
        .get_by_uid(&settings.document_type, slug, mode.revision())
        .await?;
    let post = PostDetail::try_from(&doc)?;
    let read_timing = read_timing(&post.content, settings.words_per_minute);

    let (next, previous) = match (mode, post.first_publication_date) {
        (RenderMode::Published, Some(date)) => {
            adjacent_posts(api, &settings.document_type, date).await?
        }
        _ => (None, None),
    };

    Ok(PostPage {
        post,
        read_timing,
        next,
        previous,
        preview: mode.is_preview(),
    })
}

/// The posts published right after and right before `date`
pub async fn adjacent_posts(
    api: &dyn ContentApi,
    doc_type: &str,
    date: DateTime<Utc>,
) -> Result<(Option<AdjacentPost>, Option<AdjacentPost>)> {
    let next_query = Query::by_type(doc_type)
        .date_after(FIRST_PUBLICATION_DATE, date)
        .order_by(FIRST_PUBLICATION_DATE, Direction::Asc)
        .page_size(1);
    let previous_query = Query::by_type(doc_type)
        .date_before(FIRST_PUBLICATION_DATE, date)
        .order_by(FIRST_PUBLICATION_DATE, Direction::Desc)
        .page_size(1);

    let (next, previous) = tokio::try_join!(api.query(&next_query), api.query(&previous_query))?;

    let first = |docs: &[Document]| -> Result<Option<AdjacentPost>> {
        docs.first().map(AdjacentPost::try_from).transpose()
    };
    Ok((first(&next.results)?, first(&previous.results)?))
}

/// Slugs of every post that can be pre-rendered
///
/// Documents without a uid, or whose uid is not in slug form, are left for
/// the on-demand render path.
pub async fn static_paths(api: &dyn ContentApi, cms: &CmsConfig) -> Result<Vec<String>> {
    let query = Query::by_type(&cms.document_type)
        .page_size(PATHS_PAGE_SIZE)
        .order_by(FIRST_PUBLICATION_DATE, Direction::Desc);

    let mut response = api.query(&query).await?;
    let mut slugs = Vec::new();

    loop {
        for doc in &response.results {
            match doc.uid.as_deref() {
                Some(uid) if is_canonical_slug(uid) => slugs.push(uid.to_string()),
                Some(uid) => tracing::warn!("Skipping malformed slug {:?} ({})", uid, doc.id),
                None => tracing::warn!("Skipping document {} without uid", doc.id),
            }
        }

        match &response.next_page {
            Some(cursor) => response = api.next_page(cursor).await?,
            None => break,
        }
    }

    Ok(slugs)
}
