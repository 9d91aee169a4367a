//! Helper functions shared by the page renderers
//!
//! Date formatting, HTML escaping and route building.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
