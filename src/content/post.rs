//! Post models projected from CMS documents

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::cms::{CmsError, Document, RichText};

/// A post as listed on the home page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// A full post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub last_publication_date: Option<DateTime<Utc>>,
    pub title: String,
    pub banner_url: Option<String>,
    pub author: String,
    pub content: Vec<ContentSection>,
}

/// A heading followed by its rich-text body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentSection {
    #[serde(default, deserialize_with = "null_as_default")]
    pub heading: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub body: RichText,
}

/// The post published right before or after another one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacentPost {
    pub uid: String,
    pub title: String,
}

/// Custom fields of a `posts` document
#[derive(Debug, Default, Deserialize)]
struct PostFields {
    #[serde(default, deserialize_with = "null_as_default")]
    title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    subtitle: String,

    #[serde(default, deserialize_with = "null_as_default")]
    author: String,

    #[serde(default, deserialize_with = "null_as_default")]
    banner: Banner,

    #[serde(default, deserialize_with = "null_as_default")]
    content: Vec<ContentSection>,
}

#[derive(Debug, Default, Deserialize)]
struct Banner {
    #[serde(default)]
    url: Option<String>,
}

/// The API sends `null` for empty fields
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn fields(doc: &Document) -> Result<PostFields, CmsError> {
    if doc.data.is_null() {
        return Ok(PostFields::default());
    }
    Ok(PostFields::deserialize(&doc.data)?)
}

impl TryFrom<&Document> for PostSummary {
    type Error = CmsError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        let fields = fields(doc)?;
        Ok(Self {
            uid: doc.uid.clone().unwrap_or_default(),
            first_publication_date: doc.first_publication_date,
            title: fields.title,
            subtitle: fields.subtitle,
            author: fields.author,
        })
    }
}

impl TryFrom<&Document> for PostDetail {
    type Error = CmsError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        let fields = fields(doc)?;
        Ok(Self {
            uid: doc.uid.clone().unwrap_or_default(),
            first_publication_date: doc.first_publication_date,
            last_publication_date: doc.last_publication_date,
            title: fields.title,
            banner_url: fields.banner.url.filter(|u| !u.is_empty()),
            author: fields.author,
            content: fields.content,
        })
    }
}

impl TryFrom<&Document> for AdjacentPost {
    type Error = CmsError;

    fn try_from(doc: &Document) -> Result<Self, Self::Error> {
        Ok(Self {
            uid: doc.uid.clone().unwrap_or_default(),
            title: fields(doc)?.title,
        })
    }
}
