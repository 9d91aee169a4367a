//! Wire types returned by the content API

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Absolute URL of the next page of a search, as handed out by the API
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A CMS document with untyped custom data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,

    #[serde(default)]
    pub uid: Option<String>,

    #[serde(rename = "type")]
    pub doc_type: String,

    #[serde(default, with = "publication_date")]
    pub first_publication_date: Option<DateTime<Utc>>,

    #[serde(default, with = "publication_date")]
    pub last_publication_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub data: serde_json::Value,
}

/// One page of search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default = "first_page")]
    pub page: u32,

    #[serde(default)]
    pub results_per_page: u32,

    #[serde(default)]
    pub total_results_size: u32,

    #[serde(default)]
    pub total_pages: u32,

    /// `None` once the listing is exhausted (the API sends `null`)
    #[serde(default, deserialize_with = "non_empty_cursor")]
    pub next_page: Option<Cursor>,

    #[serde(default)]
    pub results: Vec<Document>,
}

fn first_page() -> u32 {
    1
}

fn non_empty_cursor<'de, D>(deserializer: D) -> Result<Option<Cursor>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .filter(|url| !url.trim().is_empty())
        .map(Cursor::new))
}

/// Parse a publication date as written by the API (`2021-03-25T19:25:28+0000`)
///
/// RFC 3339 and bare `YYYY-MM-DD` dates are accepted as well.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

mod publication_date {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_some(&date.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => super::parse_date(&s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid publication date: {}", s))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_prismic_date() {
        let dt = parse_date("2021-03-25T19:25:28+0000").unwrap();
        assert_eq!(dt.to_rfc3339(), "2021-03-25T19:25:28+00:00");

        let dt = parse_date("2021-03-25T19:25:28-03:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2021-03-25T22:25:28+00:00");

        let dt = parse_date("2021-03-05").unwrap();
        assert_eq!(dt.to_rfc3339(), "2021-03-05T00:00:00+00:00");

        assert!(parse_date("yesterday").is_none());
    }

    #[test]
    fn test_deserialize_search_response() {
        let json = r#"{
            "page": 1,
            "results_per_page": 2,
            "total_results_size": 3,
            "total_pages": 2,
            "next_page": "https://blog.cdn.prismic.io/api/v2/documents/search?page=2",
            "results": [{
                "id": "YFzr",
                "uid": "como-utilizar-hooks",
                "type": "posts",
                "first_publication_date": "2021-03-15T19:25:28+0000",
                "last_publication_date": null,
                "data": { "title": "Como utilizar Hooks" }
            }]
        }"#;

        let response: SearchResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.total_pages, 2);
        assert_eq!(
            response.next_page.as_ref().map(Cursor::as_str),
            Some("https://blog.cdn.prismic.io/api/v2/documents/search?page=2")
        );
        let doc = &response.results[0];
        assert_eq!(doc.uid.as_deref(), Some("como-utilizar-hooks"));
        assert_eq!(doc.doc_type, "posts");
        assert!(doc.first_publication_date.is_some());
        assert!(doc.last_publication_date.is_none());
    }

    #[test]
    fn test_empty_next_page_is_none() {
        let response: SearchResponse =
            serde_json::from_str(r#"{"next_page": "", "results": []}"#).unwrap();
        assert!(response.next_page.is_none());
        assert_eq!(response.page, 1);

        let response: SearchResponse =
            serde_json::from_str(r#"{"next_page": null, "results": []}"#).unwrap();
        assert!(response.next_page.is_none());
    }

    #[test]
    fn test_document_date_serializes_in_api_format() {
        let doc = Document {
            id: "a".to_string(),
            uid: None,
            doc_type: "posts".to_string(),
            first_publication_date: parse_date("2021-01-01"),
            last_publication_date: None,
            data: serde_json::Value::Null,
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["first_publication_date"], "2021-01-01T00:00:00+0000");
        assert!(json["last_publication_date"].is_null());
    }
}
