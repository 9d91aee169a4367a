//! Page controllers and the renderer that turns their output into HTML

pub mod detail;
pub mod listing;

use anyhow::Result;
use tera::Context;

use crate::comments::embed_for;
use crate::config::{CommentsConfig, SiteConfig};
use crate::content::AdjacentPost;
use crate::helpers::{load_more_path, post_path, static_page_path, DateFormatter};
use crate::i18n::I18n;
use crate::templates::{
    Labels, ListingData, NavPost, PostData, SectionData, SiteData, TemplateRenderer,
};

pub use detail::{adjacent_posts, resolve, static_paths, PostPage, PostSettings, RenderMode};
pub use listing::{
    fetch_more, first_page, ListedPost, ListingState, LoadMoreResponse, PostPagination,
};

/// Seconds before the loading placeholder reloads itself
const LOADING_REFRESH_SECONDS: u32 = 2;

/// Renders listing, post and placeholder pages
pub struct PageRenderer {
    templates: TemplateRenderer,
    site: SiteData,
    labels: Labels,
    formatter: DateFormatter,
    comments: CommentsConfig,
    exit_preview_url: String,
}

impl PageRenderer {
    pub fn new(config: &SiteConfig, i18n: &I18n) -> Result<Self> {
        Ok(Self {
            templates: TemplateRenderer::new()?,
            site: SiteData {
                title: config.title.clone(),
                language: config.language.clone(),
            },
            labels: Labels::new(i18n),
            formatter: DateFormatter::new(config.tz(), &config.date_format, i18n.clone()),
            comments: config.comments.clone(),
            exit_preview_url: config.preview.exit_route.clone(),
        })
    }

    /// Formatter for publication dates in the site's timezone and language
    pub fn formatter(&self) -> &DateFormatter {
        &self.formatter
    }

    fn context(&self) -> Context {
        let mut context = Context::new();
        context.insert("site", &self.site);
        context.insert("labels", &self.labels);
        context.insert("exit_preview_url", &self.exit_preview_url);
        context
    }

    /// The home page as served, loading more through the server
    pub fn listing(&self, state: &ListingState) -> Result<String> {
        let load_more_url = state.next_page().map(|c| load_more_path(c.as_str()));
        self.render_listing(state, load_more_url)
    }

    /// The home page of the static site, loading more from pre-rendered pages
    pub fn static_listing(&self, state: &ListingState) -> Result<String> {
        let load_more_url = state.can_load_more().then(|| static_page_path(2));
        self.render_listing(state, load_more_url)
    }

    fn render_listing(&self, state: &ListingState, load_more_url: Option<String>) -> Result<String> {
        let data = ListingData {
            posts: state.posts().to_vec(),
            load_more_url,
            preview: state.is_preview(),
        };

        let mut context = self.context();
        context.insert("listing", &data);
        self.templates.render("index.html", &context)
    }

    /// A post page
    pub fn post(&self, page: &PostPage) -> Result<String> {
        let post = &page.post;
        let first = post.first_publication_date.as_ref();

        let edited = match (first, post.last_publication_date.as_ref()) {
            (Some(first), Some(last)) if last > first => Some(self.formatter.format(last)),
            _ => None,
        };

        let read_time = (page.read_timing > 0)
            .then(|| format!("{} {}", page.read_timing, self.labels.minutes));

        let data = PostData {
            uid: post.uid.clone(),
            title: post.title.clone(),
            banner_url: post.banner_url.clone(),
            author: post.author.clone(),
            date: self.formatter.format_opt(first),
            datetime: first.map(|d| d.to_rfc3339()).unwrap_or_default(),
            edited,
            read_time,
            sections: post
                .content
                .iter()
                .map(|section| SectionData {
                    heading: section.heading.clone(),
                    html: section.body.as_html(),
                })
                .collect(),
            previous: page.previous.as_ref().map(nav_post),
            next: page.next.as_ref().map(nav_post),
            comments_html: embed_for(&self.comments, &post.uid),
            preview: page.preview,
        };

        let mut context = self.context();
        context.insert("post", &data);
        self.templates.render("post.html", &context)
    }

    /// Placeholder served while a post is rendered in the background
    pub fn loading(&self) -> Result<String> {
        let mut context = self.context();
        context.insert("refresh_seconds", &LOADING_REFRESH_SECONDS);
        self.templates.render("loading.html", &context)
    }

    pub fn not_found(&self) -> Result<String> {
        self.templates.render("404.html", &self.context())
    }
}

fn nav_post(post: &AdjacentPost) -> NavPost {
    NavPost {
        title: post.title.clone(),
        path: post_path(&post.uid),
    }
}
