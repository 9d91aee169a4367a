//! HTML helper functions

/// Escape HTML special characters
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Keep an href only if it points somewhere harmless
///
/// Relative paths, fragments and `http`, `https` and `mailto` URLs pass;
/// anything else (`javascript:`, `data:`) becomes `#`.
pub fn safe_href(url: &str) -> String {
    let trimmed = url.trim();
    let lower = trimmed.to_ascii_lowercase();

    let allowed = lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("mailto:")
        || lower.starts_with('/')
        || lower.starts_with('#')
        || !lower.contains(':');

    if allowed {
        trimmed.to_string()
    } else {
        "#".to_string()
    }
}

/// Generate an element with escaped attributes and no content
///
/// # Examples
/// ```ignore
/// empty_element("script", &[("src", "https://utteranc.es/client.js")])
/// // -> <script src="https://utteranc.es/client.js"></script>
/// ```
pub fn empty_element(tag: &str, attrs: &[(&str, &str)]) -> String {
    let mut html = format!("<{}", tag);
    for (name, value) in attrs {
        html.push_str(&format!(r#" {}="{}""#, name, html_escape(value)));
    }
    html.push_str(&format!("></{}>", tag));
    html
}

/// Generate an image tag
pub fn image_tag(src: &str, alt: Option<&str>) -> String {
    format!(
        r#"<img src="{}" alt="{}">"#,
        html_escape(&safe_href(src)),
        html_escape(alt.unwrap_or(""))
    )
}
