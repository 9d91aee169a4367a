//! Generator module - renders the site to static HTML files

use anyhow::{Context as _, Result};
use std::fs;
use std::path::PathBuf;

use crate::cms::{CmsError, Cursor};
use crate::helpers::static_page_path;
use crate::pages::{self, ListingState, PageRenderer, PostSettings, RenderMode};
use crate::Blog;

/// What a generation run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateReport {
    /// Post pages written
    pub posts: usize,
    /// Listing pages written for the load-more button, after the first
    pub listing_pages: usize,
    /// Slugs that disappeared between listing and rendering
    pub skipped: Vec<String>,
}

/// Static site generator
pub struct Generator {
    blog: Blog,
    renderer: PageRenderer,
}

impl Generator {
    /// Create a new generator
    pub fn new(blog: &Blog) -> Result<Self> {
        Ok(Self {
            blog: blog.clone(),
            renderer: blog.renderer()?,
        })
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<GenerateReport> {
        // Ensure public directory exists
        fs::create_dir_all(&self.blog.public_dir)?;

        let listing_pages = self.generate_index().await?;
        let mut report = self.generate_post_pages().await?;
        report.listing_pages = listing_pages;
        self.generate_not_found()?;

        Ok(report)
    }

    /// Generate the listing page and the pages its load-more button fetches
    async fn generate_index(&self) -> Result<usize> {
        let state = ListingState::load(
            self.blog.api.as_ref(),
            &self.blog.config.cms,
            None,
            self.renderer.formatter(),
        )
        .await
        .context("Failed to load the post listing")?;

        let html = self.renderer.static_listing(&state)?;
        self.write_page("index.html", &html)?;
        tracing::info!("Generated index with {} posts", state.posts().len());

        self.generate_listing_pages(state.next_page().cloned()).await
    }

    /// Follow the cursor and write each page where `static_page_path` points
    async fn generate_listing_pages(&self, mut cursor: Option<Cursor>) -> Result<usize> {
        let mut number = 2;
        let mut written = 0;

        while let Some(current) = cursor {
            let page = pages::fetch_more(self.blog.api.as_ref(), &current, self.renderer.formatter())
                .await
                .with_context(|| format!("Failed to load listing page {}", number))?;

            cursor = match page.next_page.clone() {
                Some(next) if next == current => {
                    tracing::warn!("Cursor {} repeated itself, stopping", current);
                    None
                }
                next => next,
            };

            let next_url = cursor.as_ref().map(|_| static_page_path(number + 1));
            let json = serde_json::to_string(&page.with_next_url(next_url))?;
            let path = static_page_path(number);
            self.write_page(path.trim_start_matches('/'), &json)?;
            tracing::debug!("Generated listing page {}", path);

            written += 1;
            number += 1;
        }

        Ok(written)
    }

    /// Generate a page for every post with a canonical slug
    async fn generate_post_pages(&self) -> Result<GenerateReport> {
        let api = self.blog.api.as_ref();
        let settings = PostSettings::from(&self.blog.config);

        let slugs = pages::static_paths(api, &self.blog.config.cms)
            .await
            .context("Failed to list post slugs")?;

        let mut report = GenerateReport::default();
        for slug in slugs {
            let page = match pages::resolve(api, &settings, &slug, &RenderMode::Published).await {
                Ok(page) => page,
                Err(CmsError::NotFound { .. }) => {
                    tracing::warn!("Post {} disappeared while generating, skipping", slug);
                    report.skipped.push(slug);
                    continue;
                }
                Err(e) => {
                    return Err(e).with_context(|| format!("Failed to render post {}", slug));
                }
            };

            let html = self.renderer.post(&page)?;
            let output_path = self.write_page(&format!("post/{}/index.html", slug), &html)?;
            tracing::debug!("Generated post: {:?}", output_path);
            report.posts += 1;
        }

        tracing::info!("Generated {} post pages", report.posts);
        Ok(report)
    }

    /// Generate the not-found page
    fn generate_not_found(&self) -> Result<()> {
        let html = self.renderer.not_found()?;
        self.write_page("404.html", &html)?;
        Ok(())
    }

    fn write_page(&self, relative: &str, html: &str) -> Result<PathBuf> {
        let output_path = self.blog.public_dir.join(relative);
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }
        fs::write(&output_path, html)
            .with_context(|| format!("Failed to write {:?}", output_path))?;
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{parse_date, Document, MemoryApi};
    use crate::config::SiteConfig;
    use std::sync::Arc;

    fn post(uid: &str, date: &str) -> Document {
        Document {
            id: format!("id-{}", uid),
            uid: Some(uid.to_string()),
            doc_type: "posts".to_string(),
            first_publication_date: parse_date(date),
            last_publication_date: parse_date(date),
            data: serde_json::json!({ "title": uid, "author": "Danilo Vieira" }),
        }
    }

    #[tokio::test]
    async fn test_generate_writes_every_page() {
        let dir = tempfile::tempdir().unwrap();
        let api = MemoryApi::new(vec![
            post("um", "2021-01-01T00:00:00+0000"),
            post("dois", "2021-02-01T00:00:00+0000"),
            post("Fora Do Padrao", "2021-03-01T00:00:00+0000"),
        ]);
        let blog = Blog::with_api(dir.path(), SiteConfig::default(), Arc::new(api));

        let report = Generator::new(&blog).unwrap().generate().await.unwrap();
        assert_eq!(report.posts, 2);
        assert_eq!(report.listing_pages, 1);
        assert!(report.skipped.is_empty());

        let public = dir.path().join("public");
        assert!(public.join("index.html").exists());
        assert!(public.join("404.html").exists());
        assert!(public.join("post/um/index.html").exists());
        assert!(public.join("post/dois/index.html").exists());
        assert!(!public.join("post/Fora Do Padrao").exists());

        let index = fs::read_to_string(public.join("index.html")).unwrap();
        assert!(index.contains("page-2.json"));

        let page: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(public.join("api/posts/page-2.json")).unwrap())
                .unwrap();
        assert_eq!(page["results"][0]["uid"], "um");
        assert!(page["next_url"].is_null());
    }

    #[tokio::test]
    async fn test_listing_pages_chain() {
        let dir = tempfile::tempdir().unwrap();
        let api = MemoryApi::new(vec![
            post("um", "2021-01-01T00:00:00+0000"),
            post("dois", "2021-02-01T00:00:00+0000"),
            post("tres", "2021-03-01T00:00:00+0000"),
            post("quatro", "2021-04-01T00:00:00+0000"),
            post("cinco", "2021-05-01T00:00:00+0000"),
        ]);
        let blog = Blog::with_api(dir.path(), SiteConfig::default(), Arc::new(api));

        let report = Generator::new(&blog).unwrap().generate().await.unwrap();
        assert_eq!(report.listing_pages, 2);

        let posts = dir.path().join("public/api/posts");
        let second: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(posts.join("page-2.json")).unwrap()).unwrap();
        assert_eq!(second["next_url"], "/api/posts/page-3.json");
        assert_eq!(second["results"][0]["uid"], "tres");

        let third: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(posts.join("page-3.json")).unwrap()).unwrap();
        assert_eq!(third["results"][0]["uid"], "um");
        assert!(third["next_url"].is_null());
    }
}
