//! Site configuration (_config.yml)

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding `cms.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";
/// Environment variable overriding `cms.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Routes the server always registers
const RESERVED_ROUTES: &[&str] = &["", "/api/posts", "/api/preview", "/post"];

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,
    pub date_format: String,

    // Directory
    pub public_dir: String,
    pub languages_dir: String,

    /// Seconds before a cached listing page is rendered again
    pub revalidate: u64,

    #[serde(default)]
    pub cms: CmsConfig,
    #[serde(default)]
    pub reading: ReadingConfig,
    #[serde(default)]
    pub comments: CommentsConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Ignite".to_string(),
            language: "pt-BR".to_string(),
            timezone: String::new(),
            date_format: "dd MMM yyyy".to_string(),

            public_dir: "public".to_string(),
            languages_dir: "languages".to_string(),

            revalidate: 60 * 30,

            cms: CmsConfig::default(),
            reading: ReadingConfig::default(),
            comments: CommentsConfig::default(),
            preview: PreviewConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {:?}", path))?;
        let config: SiteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config {:?}", path))?;
        config
            .validate()
            .with_context(|| format!("Invalid config {:?}", path))?;
        Ok(config)
    }

    /// Check the values the server builds routes from
    pub fn validate(&self) -> Result<()> {
        let route = self.preview.exit_route.as_str();
        if !route.starts_with('/') || route.len() < 2 {
            anyhow::bail!("preview.exit_route must be an absolute path, got {:?}", route);
        }
        if route.chars().any(char::is_whitespace)
            || route
                .split('/')
                .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
        {
            anyhow::bail!("preview.exit_route must be a plain path, got {:?}", route);
        }
        let trimmed = route.trim_end_matches('/');
        if RESERVED_ROUTES.contains(&trimmed) || route.starts_with("/post/") {
            anyhow::bail!("preview.exit_route {:?} clashes with a built-in route", route);
        }
        if self.preview.cookie.is_empty() {
            anyhow::bail!("preview.cookie must not be empty");
        }
        Ok(())
    }

    /// Apply `PRISMIC_API_ENDPOINT` / `PRISMIC_ACCESS_TOKEN` from the environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(ACCESS_TOKEN_ENV).ok(),
        );
    }

    fn apply_overrides(&mut self, endpoint: Option<String>, token: Option<String>) {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            tracing::debug!("Using CMS endpoint from {}", ENDPOINT_ENV);
            self.cms.endpoint = endpoint;
        }
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.cms.access_token = Some(token);
        }
    }

    /// Resolve the configured display timezone, falling back to UTC
    pub fn tz(&self) -> chrono_tz::Tz {
        if self.timezone.is_empty() {
            return chrono_tz::UTC;
        }
        match self.timezone.parse::<chrono_tz::Tz>() {
            Ok(tz) => tz,
            Err(e) => {
                tracing::warn!("Unknown timezone {:?} ({}), using UTC", self.timezone, e);
                chrono_tz::UTC
            }
        }
    }
}

/// Headless CMS connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    pub endpoint: String,
    pub access_token: Option<String>,
    pub document_type: String,
    pub page_size: u32,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            document_type: "posts".to_string(),
            page_size: 2,
        }
    }
}

/// Reading-time estimation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadingConfig {
    pub words_per_minute: u32,
}

impl Default for ReadingConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 180,
        }
    }
}

/// utterances comment widget
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentsConfig {
    pub enable: bool,
    pub src: String,
    pub repo: String,
    pub issue_term: String,
    pub theme: String,
    pub anchor_id: String,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            enable: true,
            src: "https://utteranc.es/client.js".to_string(),
            repo: "Vitor-Franco/utteranc-comments-field".to_string(),
            issue_term: "pathname".to_string(),
            theme: "github-dark".to_string(),
            anchor_id: "comments-utterance".to_string(),
        }
    }
}

/// Preview mode routes and cookie
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewConfig {
    pub exit_route: String,
    pub cookie: String,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            exit_route: "/api/exit-preview".to_string(),
            cookie: "preview_ref".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "Ignite");
        assert_eq!(config.cms.document_type, "posts");
        assert_eq!(config.cms.page_size, 2);
        assert_eq!(config.reading.words_per_minute, 180);
        assert_eq!(config.revalidate, 1800);
        assert_eq!(config.comments.issue_term, "pathname");
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Space Traveling
timezone: America/Sao_Paulo
cms:
  endpoint: https://spacetraveling.cdn.prismic.io/api/v2
  page_size: 5
comments:
  theme: github-light
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Space Traveling");
        assert_eq!(
            config.cms.endpoint,
            "https://spacetraveling.cdn.prismic.io/api/v2"
        );
        assert_eq!(config.cms.page_size, 5);
        assert_eq!(config.cms.document_type, "posts");
        assert_eq!(config.comments.theme, "github-light");
        assert_eq!(config.comments.repo, "Vitor-Franco/utteranc-comments-field");
        assert_eq!(config.tz(), chrono_tz::America::Sao_Paulo);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SiteConfig::default();
        config.apply_overrides(
            Some("https://repo.cdn.prismic.io/api/v2".to_string()),
            Some("secret".to_string()),
        );
        assert_eq!(config.cms.endpoint, "https://repo.cdn.prismic.io/api/v2");
        assert_eq!(config.cms.access_token.as_deref(), Some("secret"));

        config.apply_overrides(Some("  ".to_string()), None);
        assert_eq!(config.cms.endpoint, "https://repo.cdn.prismic.io/api/v2");
    }

    #[test]
    fn test_exit_route_validation() {
        assert!(SiteConfig::default().validate().is_ok());

        for bad in [
            "",
            "/",
            "api/exit-preview",
            "/api/posts",
            "/api/posts/",
            "/api/preview",
            "/post/sair",
            "/sair/:modo",
            "/sair/*resto",
            "/sair agora",
        ] {
            let mut config = SiteConfig::default();
            config.preview.exit_route = bad.to_string();
            assert!(config.validate().is_err(), "{:?} should be rejected", bad);
        }

        let mut config = SiteConfig::default();
        config.preview.exit_route = "/preview/sair".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_bad_exit_route() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("_config.yml");
        fs::write(&path, "preview:\n  exit_route: exit-preview\n").unwrap();
        let err = SiteConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("exit_route"));
    }

    #[test]
    fn test_unknown_timezone_falls_back_to_utc() {
        let config = SiteConfig {
            timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert_eq!(config.tz(), chrono_tz::UTC);
    }
}
