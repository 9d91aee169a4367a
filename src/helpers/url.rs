//! URL helper functions

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters escaped inside a single path segment
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Characters escaped inside a query value
const QUERY_VALUE: &AsciiSet = &PATH_SEGMENT.add(b'&').add(b'=').add(b'+');

/// Route of a post detail page
///
/// # Examples
/// ```ignore
/// post_path("como-utilizar-hooks") // -> "/post/como-utilizar-hooks"
/// ```
pub fn post_path(slug: &str) -> String {
    format!("/post/{}", utf8_percent_encode(slug, PATH_SEGMENT))
}

/// Route of the load-more endpoint for a cursor
pub fn load_more_path(cursor: &str) -> String {
    format!("/api/posts?cursor={}", utf8_percent_encode(cursor, QUERY_VALUE))
}

/// Route of a pre-rendered listing page in the static site
pub fn static_page_path(page: u32) -> String {
    format!("/api/posts/page-{}.json", page)
}

/// Whether a slug is already in canonical slug form
///
/// Anything else is left out of the pre-rendered set and rendered on demand.
pub fn is_canonical_slug(slug: &str) -> bool {
    !slug.is_empty() && slug::slugify(slug) == slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_path() {
        assert_eq!(post_path("como-utilizar-hooks"), "/post/como-utilizar-hooks");
        assert_eq!(post_path("a/b c"), "/post/a%2Fb%20c");
    }

    #[test]
    fn test_load_more_path() {
        assert_eq!(
            load_more_path("https://x.prismic.io/api/v2/documents/search?page=2&pageSize=2"),
            "/api/posts?cursor=https:%2F%2Fx.prismic.io%2Fapi%2Fv2%2Fdocuments%2Fsearch%3Fpage%3D2%26pageSize%3D2"
        );
    }

    #[test]
    fn test_static_page_path() {
        assert_eq!(static_page_path(2), "/api/posts/page-2.json");
    }

    #[test]
    fn test_canonical_slug() {
        assert!(is_canonical_slug("criando-um-app-cra-do-zero"));
        assert!(!is_canonical_slug("Criando Um App"));
        assert!(!is_canonical_slug(""));
        assert!(!is_canonical_slug("../etc"));
    }
}
