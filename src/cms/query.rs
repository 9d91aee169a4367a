//! Query builder rendering to the Prismic predicate language

use chrono::{DateTime, Utc};

/// Field holding a document's custom type
pub const DOCUMENT_TYPE: &str = "document.type";
/// Field holding a document's id
pub const DOCUMENT_ID: &str = "document.id";
/// Field holding a document's first publication date
pub const FIRST_PUBLICATION_DATE: &str = "document.first_publication_date";
/// Field holding a document's last publication date
pub const LAST_PUBLICATION_DATE: &str = "document.last_publication_date";

/// Page size the API applies when none is given
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// UID field of a custom type (`my.posts.uid`)
pub fn uid_field(doc_type: &str) -> String {
    format!("my.{}.uid", doc_type)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    At { field: String, value: String },
    DateAfter { field: String, instant: DateTime<Utc> },
    DateBefore { field: String, instant: DateTime<Utc> },
}

impl Predicate {
    /// Render as a single predicate, e.g. `[at(document.type, "posts")]`
    pub fn render(&self) -> String {
        match self {
            Predicate::At { field, value } => {
                format!("[at({}, \"{}\")]", field, escape_quoted(value))
            }
            Predicate::DateAfter { field, instant } => {
                format!("[date.after({}, {})]", field, instant.timestamp_millis())
            }
            Predicate::DateBefore { field, instant } => {
                format!("[date.before({}, {})]", field, instant.timestamp_millis())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ordering {
    pub field: String,
    pub direction: Direction,
}

impl Ordering {
    /// Render as the `orderings` parameter, e.g. `[document.first_publication_date desc]`
    pub fn render(&self) -> String {
        match self.direction {
            Direction::Asc => format!("[{}]", self.field),
            Direction::Desc => format!("[{} desc]", self.field),
        }
    }
}

/// A document search
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub predicates: Vec<Predicate>,
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    /// Preview revision; `None` means the published master ref
    pub revision: Option<String>,
    pub ordering: Option<Ordering>,
}

impl Default for Query {
    fn default() -> Self {
        Self {
            predicates: Vec::new(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            revision: None,
            ordering: None,
        }
    }
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// All documents of a custom type
    pub fn by_type(doc_type: &str) -> Self {
        Self::new().at(DOCUMENT_TYPE, doc_type)
    }

    pub fn at(mut self, field: &str, value: &str) -> Self {
        self.predicates.push(Predicate::At {
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn date_after(mut self, field: &str, instant: DateTime<Utc>) -> Self {
        self.predicates.push(Predicate::DateAfter {
            field: field.to_string(),
            instant,
        });
        self
    }

    pub fn date_before(mut self, field: &str, instant: DateTime<Utc>) -> Self {
        self.predicates.push(Predicate::DateBefore {
            field: field.to_string(),
            instant,
        });
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn revision(mut self, revision: Option<&str>) -> Self {
        self.revision = revision.map(str::to_string);
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.ordering = Some(Ordering {
            field: field.to_string(),
            direction,
        });
        self
    }

    /// Render the `q` parameter
    pub fn render_q(&self) -> String {
        let predicates: String = self.predicates.iter().map(Predicate::render).collect();
        format!("[{}]", predicates)
    }
}

fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
