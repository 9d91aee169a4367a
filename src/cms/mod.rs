//! Content client for the headless CMS
//!
//! [`ContentApi`] is the seam the page controllers talk to. [`PrismicClient`]
//! implements it over HTTP and [`MemoryApi`] over an in-memory document set.

mod error;
mod memory;
mod prismic;
pub mod query;
mod richtext;
mod types;

use async_trait::async_trait;

pub use error::{CmsError, Result};
pub use memory::MemoryApi;
pub use prismic::PrismicClient;
pub use query::{Direction, Ordering, Predicate, Query};
pub use richtext::{RichText, RichTextBlock, Span, SpanData};
pub use types::{parse_date, Cursor, Document, SearchResponse};

/// Read access to the content repository
///
/// Every call is a single request: failures propagate to the caller with no
/// retry, timeout or cancellation.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// Run a search
    async fn query(&self, query: &Query) -> Result<SearchResponse>;

    /// Fetch the page a previous search pointed to with `next_page`
    async fn next_page(&self, cursor: &Cursor) -> Result<SearchResponse>;

    /// Fetch one document by its type and uid
    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        revision: Option<&str>,
    ) -> Result<Document>;

    /// Fetch one document by id
    async fn get_by_id(&self, id: &str, revision: Option<&str>) -> Result<Document>;
}
