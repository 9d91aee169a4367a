//! Content module - typed posts and reading-time estimation

mod post;
pub mod reading;

pub use post::{AdjacentPost, ContentSection, PostDetail, PostSummary};
pub use reading::read_timing;
