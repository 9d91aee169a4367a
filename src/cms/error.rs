//! Content client errors

use thiserror::Error;

/// Errors raised while talking to the content API
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("CMS request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("CMS returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to decode CMS response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid CMS endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("CMS API did not advertise a master ref")]
    NoMasterRef,

    #[error("Pagination cursor does not belong to the CMS endpoint: {0}")]
    InvalidCursor(String),

    #[error("No {doc_type} document with uid {uid:?}")]
    NotFound { doc_type: String, uid: String },

    #[error("Failed to read fixtures: {0}")]
    Io(#[from] std::io::Error),
}

impl CmsError {
    /// True when the requested document does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, CmsError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, CmsError>;
