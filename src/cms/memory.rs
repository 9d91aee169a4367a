//! In-memory content API
//!
//! Evaluates the same predicates, orderings and pagination as the remote API
//! over a fixed document set. Used for offline runs (`--fixtures`) and tests.

use async_trait::async_trait;
use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use super::query::{
    Direction, Ordering, Predicate, Query, DOCUMENT_ID, DOCUMENT_TYPE, FIRST_PUBLICATION_DATE,
    LAST_PUBLICATION_DATE,
};
use super::{CmsError, ContentApi, Cursor, Document, Result, SearchResponse};

const CURSOR_PREFIX: &str = "memory://documents/search";

/// Content API over documents held in memory
#[derive(Default)]
pub struct MemoryApi {
    documents: Vec<Document>,
    /// Preview revisions: ref -> documents replacing or adding to the published set
    revisions: HashMap<String, Vec<Document>>,
    /// Queries handed out through cursors
    issued: Mutex<Vec<Query>>,
}

impl MemoryApi {
    pub fn new(documents: Vec<Document>) -> Self {
        Self {
            documents,
            ..Default::default()
        }
    }

    /// Load documents from a JSON file holding an array of documents
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let documents: Vec<Document> = serde_json::from_str(&content)?;
        Ok(Self::new(documents))
    }

    /// Register a preview revision
    pub fn with_revision(mut self, reference: &str, documents: Vec<Document>) -> Self {
        self.revisions.insert(reference.to_string(), documents);
        self
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Documents visible under a revision
    fn visible(&self, revision: Option<&str>) -> Vec<Document> {
        let mut docs = self.documents.clone();
        if let Some(overrides) = revision.and_then(|r| self.revisions.get(r)) {
            for doc in overrides {
                match docs.iter_mut().find(|d| d.id == doc.id) {
                    Some(existing) => *existing = doc.clone(),
                    None => docs.push(doc.clone()),
                }
            }
        }
        docs
    }

    fn run(&self, query: &Query) -> SearchResponse {
        let mut matches: Vec<Document> = self
            .visible(query.revision.as_deref())
            .into_iter()
            .filter(|doc| query.predicates.iter().all(|p| matches_predicate(doc, p)))
            .collect();

        if let Some(ordering) = &query.ordering {
            matches.sort_by(|a, b| compare(a, b, ordering));
        }

        let page_size = query.page_size.max(1);
        let total = matches.len() as u32;
        let total_pages = total.div_ceil(page_size);
        // pages past the end come back empty
        let start = u64::from(query.page.max(1) - 1) * u64::from(page_size);
        let start = usize::try_from(start).unwrap_or(usize::MAX);

        let results: Vec<Document> = matches
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        let next_page = if query.page < total_pages {
            Some(self.issue_cursor(query, query.page + 1))
        } else {
            None
        };

        SearchResponse {
            page: query.page,
            results_per_page: results.len() as u32,
            total_results_size: total,
            total_pages,
            next_page,
            results,
        }
    }

    fn issue_cursor(&self, query: &Query, page: u32) -> Cursor {
        let mut issued = self.issued.lock().unwrap_or_else(|e| e.into_inner());
        let index = match issued.iter().position(|q| q == query) {
            Some(index) => index,
            None => {
                issued.push(query.clone());
                issued.len() - 1
            }
        };
        Cursor::new(format!("{}?query={}&page={}", CURSOR_PREFIX, index, page))
    }

    fn resolve_cursor(&self, cursor: &Cursor) -> Result<Query> {
        let invalid = || CmsError::InvalidCursor(cursor.to_string());

        let params = cursor
            .as_str()
            .strip_prefix(CURSOR_PREFIX)
            .and_then(|rest| rest.strip_prefix('?'))
            .ok_or_else(invalid)?;

        let mut index = None;
        let mut page = None;
        for pair in params.split('&') {
            match pair.split_once('=') {
                Some(("query", v)) => index = v.parse::<usize>().ok(),
                Some(("page", v)) => page = v.parse::<u32>().ok(),
                _ => {}
            }
        }

        let (index, page) = index.zip(page).ok_or_else(invalid)?;
        let issued = self.issued.lock().unwrap_or_else(|e| e.into_inner());
        let query = issued.get(index).cloned().ok_or_else(invalid)?;
        Ok(query.page(page))
    }

    fn first(&self, query: Query, doc_type: &str, key: &str) -> Result<Document> {
        self.run(&query)
            .results
            .into_iter()
            .next()
            .ok_or_else(|| CmsError::NotFound {
                doc_type: doc_type.to_string(),
                uid: key.to_string(),
            })
    }
}

fn matches_predicate(doc: &Document, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::At { field, value } => match field.as_str() {
            DOCUMENT_TYPE => doc.doc_type == *value,
            DOCUMENT_ID => doc.id == *value,
            field => match field
                .strip_prefix("my.")
                .and_then(|rest| rest.split_once('.'))
            {
                Some((doc_type, "uid")) => {
                    doc.doc_type == doc_type && doc.uid.as_deref() == Some(value.as_str())
                }
                Some((doc_type, name)) => {
                    doc.doc_type == doc_type
                        && doc.data.get(name).and_then(|v| v.as_str()) == Some(value.as_str())
                }
                None => false,
            },
        },
        Predicate::DateAfter { field, instant } => {
            date_field(doc, field).is_some_and(|date| date > *instant)
        }
        Predicate::DateBefore { field, instant } => {
            date_field(doc, field).is_some_and(|date| date < *instant)
        }
    }
}

fn date_field(doc: &Document, field: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    match field {
        FIRST_PUBLICATION_DATE => doc.first_publication_date,
        LAST_PUBLICATION_DATE => doc.last_publication_date,
        _ => None,
    }
}

/// Undated documents sort last in either direction
fn compare(a: &Document, b: &Document, ordering: &Ordering) -> CmpOrdering {
    let (a, b) = (date_field(a, &ordering.field), date_field(b, &ordering.field));
    match (a, b) {
        (Some(a), Some(b)) => match ordering.direction {
            Direction::Asc => a.cmp(&b),
            Direction::Desc => b.cmp(&a),
        },
        (Some(_), None) => CmpOrdering::Less,
        (None, Some(_)) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

#[async_trait]
impl ContentApi for MemoryApi {
    async fn query(&self, query: &Query) -> Result<SearchResponse> {
        Ok(self.run(query))
    }

    async fn next_page(&self, cursor: &Cursor) -> Result<SearchResponse> {
        let query = self.resolve_cursor(cursor)?;
        Ok(self.run(&query))
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        revision: Option<&str>,
    ) -> Result<Document> {
        let query = Query::by_type(doc_type)
            .at(&super::query::uid_field(doc_type), uid)
            .page_size(1)
            .revision(revision);
        self.first(query, doc_type, uid)
    }

    async fn get_by_id(&self, id: &str, revision: Option<&str>) -> Result<Document> {
        let query = Query::new().at(DOCUMENT_ID, id).page_size(1).revision(revision);
        self.first(query, "document", id)
    }
}
