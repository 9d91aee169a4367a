//! ignite-blog: a blog front-end over a headless CMS
//!
//! Posts are fetched from a Prismic-style content API and rendered with
//! built-in Tera templates, either to static files or on demand by the
//! bundled HTTP server.

pub mod cache;
pub mod cms;
pub mod commands;
pub mod comments;
pub mod config;
pub mod content;
pub mod generator;
pub mod helpers;
pub mod i18n;
pub mod pages;
pub mod server;
pub mod templates;

use anyhow::{Context as _, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cms::{ContentApi, MemoryApi, PrismicClient};

/// The main blog application
#[derive(Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
    /// Interface strings and month names
    pub i18n: i18n::I18n,
    /// Where the content comes from
    pub api: Arc<dyn ContentApi>,
}

impl Blog {
    /// Create a blog reading from the configured CMS endpoint
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let config = Self::load_config(base_dir.as_ref())?;
        if config.cms.endpoint.is_empty() {
            anyhow::bail!(
                "No CMS endpoint configured. Set cms.endpoint in _config.yml or {}",
                config::ENDPOINT_ENV
            );
        }

        let client = PrismicClient::new(&config.cms.endpoint, config.cms.access_token.clone())?;
        Ok(Self::with_api(base_dir, config, Arc::new(client)))
    }

    /// Create a blog reading documents from a JSON fixture file
    pub fn from_fixtures<P: AsRef<Path>, F: AsRef<Path>>(base_dir: P, fixtures: F) -> Result<Self> {
        let config = Self::load_config(base_dir.as_ref())?;
        let api = MemoryApi::from_file(fixtures.as_ref())
            .with_context(|| format!("Failed to load fixtures from {:?}", fixtures.as_ref()))?;
        if api.is_empty() {
            tracing::warn!("No documents in {:?}, the site will be empty", fixtures.as_ref());
        } else {
            tracing::info!("Loaded {} documents from fixtures", api.len());
        }
        Ok(Self::with_api(base_dir, config, Arc::new(api)))
    }

    /// Create a blog over any content API
    pub fn with_api<P: AsRef<Path>>(
        base_dir: P,
        config: config::SiteConfig,
        api: Arc<dyn ContentApi>,
    ) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);

        let mut i18n = i18n::I18n::new(&config.language);
        if let Err(e) = i18n.load_languages(base_dir.join(&config.languages_dir)) {
            tracing::warn!("Failed to load languages: {}", e);
        }

        Self {
            config,
            base_dir,
            public_dir,
            i18n,
            api,
        }
    }

    /// Read `_config.yml` if present and apply environment overrides
    pub fn load_config(base_dir: &Path) -> Result<config::SiteConfig> {
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Renderer configured for this site
    pub fn renderer(&self) -> Result<pages::PageRenderer> {
        pages::PageRenderer::new(&self.config, &self.i18n)
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<generator::GenerateReport> {
        generator::Generator::new(self)?.generate().await
    }
}
