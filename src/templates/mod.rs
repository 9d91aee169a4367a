//! Built-in site templates using the Tera template engine
//!
//! All templates are embedded directly in the binary. Autoescaping stays on
//! for every `.html` template; only pre-escaped fragments (rich text and the
//! comment embed) are marked `safe`.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::i18n::I18n;
use crate::pages::ListedPost;

/// Template renderer with the embedded site templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Register all templates
        tera.add_raw_templates(vec![
            ("layout.html", include_str!("site/layout.html")),
            ("index.html", include_str!("site/index.html")),
            ("post.html", include_str!("site/post.html")),
            ("loading.html", include_str!("site/loading.html")),
            ("404.html", include_str!("site/404.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("site/partials/header.html"),
            ),
            (
                "partials/post_info.html",
                include_str!("site/partials/post_info.html"),
            ),
            (
                "partials/post_item.html",
                include_str!("site/partials/post_item.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
}

/// Interface strings in the site's language
#[derive(Debug, Clone, Serialize)]
pub struct Labels {
    pub load_more: String,
    pub exit_preview: String,
    pub loading: String,
    pub minutes: String,
    pub previous: String,
    pub next: String,
    pub not_found: String,
    pub edited: String,
}

impl Labels {
    pub fn new(i18n: &I18n) -> Self {
        Self {
            load_more: i18n.get("listing.load_more"),
            exit_preview: i18n.get("listing.exit_preview"),
            loading: i18n.get("post.loading"),
            minutes: i18n.get("post.minutes"),
            previous: i18n.get("post.previous"),
            next: i18n.get("post.next"),
            not_found: i18n.get("post.not_found"),
            edited: i18n.get("post.edited"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingData {
    pub posts: Vec<ListedPost>,
    /// Where the load-more button fetches from; absent once exhausted
    pub load_more_url: Option<String>,
    pub preview: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostData {
    pub uid: String,
    pub title: String,
    pub banner_url: Option<String>,
    pub author: String,
    pub date: String,
    pub datetime: String,
    pub edited: Option<String>,
    pub read_time: Option<String>,
    pub sections: Vec<SectionData>,
    pub previous: Option<NavPost>,
    pub next: Option<NavPost>,
    pub comments_html: String,
    pub preview: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionData {
    pub heading: String,
    /// Already escaped by the rich-text renderer
    pub html: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(title: &str) -> Context {
        let mut context = Context::new();
        context.insert(
            "site",
            &SiteData {
                title: title.to_string(),
                language: "pt-BR".to_string(),
            },
        );
        context.insert("labels", &Labels::new(&I18n::default()));
        context
    }

    #[test]
    fn test_all_templates_parse() {
        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer.render("404.html", &context("Ignite")).unwrap();
        assert!(html.contains("<title>404 | Ignite</title>"));
        assert!(html.contains("Post não encontrado"));
    }

    #[test]
    fn test_autoescape_is_on() {
        let renderer = TemplateRenderer::new().unwrap();
        let html = renderer
            .render("404.html", &context("<script>alert(1)</script>"))
            .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_loading_page_refreshes() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut ctx = context("Ignite");
        ctx.insert("refresh_seconds", &2);
        let html = renderer.render("loading.html", &ctx).unwrap();
        assert!(html.contains(r#"<meta http-equiv="refresh" content="2">"#));
        assert!(html.contains("<h1>Carregando...</h1>"));
        assert!(html.contains("<title>Loading | Ignite</title>"));
    }
}
