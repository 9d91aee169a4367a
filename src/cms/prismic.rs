//! Prismic REST API (v2) client

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use super::query::{uid_field, Query, DOCUMENT_ID};
use super::{CmsError, ContentApi, Cursor, Document, Result, SearchResponse};

/// Content API backed by a Prismic repository
#[derive(Clone)]
pub struct PrismicClient {
    endpoint: Url,
    access_token: Option<String>,
    http: reqwest::Client,
}

/// API root document; only the refs are needed
#[derive(Debug, Deserialize)]
struct ApiRoot {
    #[serde(default)]
    refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    reference: String,
    #[serde(rename = "isMasterRef", default)]
    is_master_ref: bool,
}

impl PrismicClient {
    /// Create a client for an endpoint such as `https://repo.cdn.prismic.io/api/v2`
    pub fn new(endpoint: &str, access_token: Option<String>) -> Result<Self> {
        let endpoint = Url::parse(endpoint.trim())?;
        if endpoint.cannot_be_a_base() || !matches!(endpoint.scheme(), "http" | "https") {
            return Err(CmsError::InvalidEndpoint(endpoint.to_string()));
        }

        Ok(Self {
            endpoint,
            access_token: access_token.filter(|t| !t.is_empty()),
            http: reqwest::Client::new(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Add the access token unless the URL already carries one
    fn authorize(&self, url: &mut Url) {
        if let Some(token) = &self.access_token {
            if !url.query_pairs().any(|(key, _)| key == "access_token") {
                url.query_pairs_mut().append_pair("access_token", token);
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        tracing::debug!("CMS request: {}{}", url.origin().ascii_serialization(), url.path());

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CmsError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Resolve the ref of the published content
    async fn master_ref(&self) -> Result<String> {
        let mut url = self.endpoint.clone();
        self.authorize(&mut url);

        let root: ApiRoot = self.get_json(url).await?;
        root.refs
            .into_iter()
            .find(|r| r.is_master_ref)
            .map(|r| r.reference)
            .ok_or(CmsError::NoMasterRef)
    }

    fn search_url(&self, query: &Query, reference: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| CmsError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .push("documents")
            .push("search");

        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("ref", reference);
            pairs.append_pair("q", &query.render_q());
            pairs.append_pair("page", &query.page.to_string());
            pairs.append_pair("pageSize", &query.page_size.to_string());
            if let Some(ordering) = &query.ordering {
                pairs.append_pair("orderings", &ordering.render());
            }
        }

        self.authorize(&mut url);
        Ok(url)
    }

    /// Reject cursors that would send the request (and token) elsewhere
    fn check_cursor(&self, cursor: &Cursor) -> Result<Url> {
        let url = Url::parse(cursor.as_str())
            .map_err(|_| CmsError::InvalidCursor(cursor.to_string()))?;

        let same_origin = url.scheme() == self.endpoint.scheme()
            && url.host_str() == self.endpoint.host_str()
            && url.port_or_known_default() == self.endpoint.port_or_known_default();

        if !same_origin {
            return Err(CmsError::InvalidCursor(cursor.to_string()));
        }

        Ok(url)
    }

    async fn first_result(&self, query: &Query, doc_type: &str, uid: &str) -> Result<Document> {
        let response = self.query(query).await?;
        response
            .results
            .into_iter()
            .next()
            .ok_or_else(|| CmsError::NotFound {
                doc_type: doc_type.to_string(),
                uid: uid.to_string(),
            })
    }
}

/// Drop the access token the API echoes back in `next_page`
///
/// Cursors end up in rendered pages; `next_page` adds the token again when
/// the cursor is followed.
fn without_token(mut response: SearchResponse) -> SearchResponse {
    response.next_page = response.next_page.map(strip_access_token);
    response
}

fn strip_access_token(cursor: Cursor) -> Cursor {
    let Ok(mut url) = Url::parse(cursor.as_str()) else {
        return cursor;
    };
    if !url.query_pairs().any(|(key, _)| key == "access_token") {
        return cursor;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "access_token")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    Cursor::new(url.to_string())
}

#[async_trait]
impl ContentApi for PrismicClient {
    async fn query(&self, query: &Query) -> Result<SearchResponse> {
        let reference = match &query.revision {
            Some(revision) => revision.clone(),
            None => self.master_ref().await?,
        };

        let url = self.search_url(query, &reference)?;
        let response: SearchResponse = self.get_json(url).await?;
        Ok(without_token(response))
    }

    async fn next_page(&self, cursor: &Cursor) -> Result<SearchResponse> {
        let mut url = self.check_cursor(cursor)?;
        self.authorize(&mut url);
        let response: SearchResponse = self.get_json(url).await?;
        Ok(without_token(response))
    }

    async fn get_by_uid(
        &self,
        doc_type: &str,
        uid: &str,
        revision: Option<&str>,
    ) -> Result<Document> {
        let query = Query::by_type(doc_type)
            .at(&uid_field(doc_type), uid)
            .page_size(1)
            .revision(revision);
        self.first_result(&query, doc_type, uid).await
    }

    async fn get_by_id(&self, id: &str, revision: Option<&str>) -> Result<Document> {
        let query = Query::new().at(DOCUMENT_ID, id).page_size(1).revision(revision);
        self.first_result(&query, "document", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_endpoints() {
        assert!(PrismicClient::new("not a url", None).is_err());
        assert!(matches!(
            PrismicClient::new("mailto:cms@example.com", None),
            Err(CmsError::InvalidEndpoint(_))
        ));
        assert!(PrismicClient::new("https://blog.cdn.prismic.io/api/v2", None).is_ok());
    }

    #[test]
    fn test_search_url() {
        let client =
            PrismicClient::new("https://blog.cdn.prismic.io/api/v2/", Some("tok".to_string()))
                .unwrap();
        let query = Query::by_type("posts").page_size(2);
        let url = client.search_url(&query, "master-ref").unwrap();

        assert_eq!(url.path(), "/api/v2/documents/search");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("ref".to_string(), "master-ref".to_string())));
        assert!(pairs.contains(&("q".to_string(), r#"[[at(document.type, "posts")]]"#.to_string())));
        assert!(pairs.contains(&("pageSize".to_string(), "2".to_string())));
        assert!(pairs.contains(&("access_token".to_string(), "tok".to_string())));
    }

    #[test]
    fn test_cursor_must_match_endpoint() {
        let client = PrismicClient::new("https://blog.cdn.prismic.io/api/v2", None).unwrap();

        let ok = Cursor::new("https://blog.cdn.prismic.io/api/v2/documents/search?page=2");
        assert!(client.check_cursor(&ok).is_ok());

        for bad in [
            "https://evil.example.com/api/v2/documents/search?page=2",
            "http://blog.cdn.prismic.io/api/v2/documents/search?page=2",
            "https://blog.cdn.prismic.io:8443/api/v2/documents/search",
            "garbage",
        ] {
            assert!(matches!(
                client.check_cursor(&Cursor::new(bad)),
                Err(CmsError::InvalidCursor(_))
            ));
        }
    }

    #[test]
    fn test_strip_access_token() {
        let cursor = strip_access_token(Cursor::new(
            "https://blog.cdn.prismic.io/api/v2/documents/search?ref=abc&access_token=tok&page=2",
        ));
        assert!(!cursor.as_str().contains("tok"));
        let url = Url::parse(cursor.as_str()).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("ref".to_string(), "abc".to_string()),
                ("page".to_string(), "2".to_string())
            ]
        );

        let only_token = strip_access_token(Cursor::new(
            "https://blog.cdn.prismic.io/api/v2/documents/search?access_token=tok",
        ));
        assert_eq!(
            only_token.as_str(),
            "https://blog.cdn.prismic.io/api/v2/documents/search"
        );

        let untouched = "https://blog.cdn.prismic.io/api/v2/documents/search?page=2";
        assert_eq!(strip_access_token(Cursor::new(untouched)).as_str(), untouched);
    }

    #[test]
    fn test_token_is_not_duplicated() {
        let client =
            PrismicClient::new("https://blog.cdn.prismic.io/api/v2", Some("tok".to_string()))
                .unwrap();
        let mut url =
            Url::parse("https://blog.cdn.prismic.io/api/v2/documents/search?access_token=tok")
                .unwrap();
        client.authorize(&mut url);
        assert_eq!(url.query_pairs().filter(|(k, _)| k == "access_token").count(), 1);
    }
}
