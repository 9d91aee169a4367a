//! Initialize a new blog

use anyhow::Result;
use std::fs;
use std::path::Path;

const CONFIG: &str = r#"# Ignite blog configuration

# Site
title: Ignite
language: pt-BR
timezone: ''
date_format: dd MMM yyyy

# Directory
public_dir: public
languages_dir: languages

# Seconds before the cached home page is rendered again
revalidate: 1800

# Headless CMS
## PRISMIC_API_ENDPOINT and PRISMIC_ACCESS_TOKEN override these
cms:
  endpoint: ''
  access_token:
  document_type: posts
  page_size: 2

reading:
  words_per_minute: 180

# utterances comments
comments:
  enable: true
  src: https://utteranc.es/client.js
  repo: Vitor-Franco/utteranc-comments-field
  issue_term: pathname
  theme: github-dark
  anchor_id: comments-utterance

preview:
  exit_route: /api/exit-preview
  cookie: preview_ref
"#;

const FIXTURES: &str = r#"[
  {
    "id": "hello-world",
    "uid": "hello-world",
    "type": "posts",
    "first_publication_date": "2021-03-15T19:25:28+0000",
    "last_publication_date": "2021-03-15T19:25:28+0000",
    "data": {
      "title": "Hello World",
      "subtitle": "Your very first post",
      "author": "Ignite",
      "banner": { "url": null },
      "content": [
        {
          "heading": "Quick Start",
          "body": [
            {
              "type": "paragraph",
              "text": "Run ignite-blog server --fixtures fixtures.json to browse this post.",
              "spans": [{ "start": 4, "end": 46, "type": "strong" }]
            }
          ]
        }
      ]
    }
  }
]
"#;

/// Initialize a new blog in the given directory
///
/// Existing files are left untouched.
pub fn init_site(target_dir: &Path) -> Result<()> {
    // Create directory structure
    fs::create_dir_all(target_dir)?;
    fs::create_dir_all(target_dir.join("languages"))?;

    write_if_missing(&target_dir.join("_config.yml"), CONFIG)?;
    write_if_missing(&target_dir.join("fixtures.json"), FIXTURES)?;

    Ok(())
}

fn write_if_missing(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        tracing::warn!("{:?} already exists, leaving it as is", path);
        return Ok(());
    }
    fs::write(path, content)?;
    tracing::debug!("Created {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::MemoryApi;
    use crate::config::SiteConfig;

    #[test]
    fn test_init_writes_loadable_files() {
        let dir = tempfile::tempdir().unwrap();
        init_site(dir.path()).unwrap();

        let config = SiteConfig::load(dir.path().join("_config.yml")).unwrap();
        assert_eq!(config.cms.page_size, 2);
        assert_eq!(config.comments.theme, "github-dark");
        assert_eq!(config.revalidate, 1800);

        let api = MemoryApi::from_file(dir.path().join("fixtures.json")).unwrap();
        assert_eq!(api.len(), 1);
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_config.yml"), "title: Mine\n").unwrap();
        init_site(dir.path()).unwrap();

        let config = SiteConfig::load(dir.path().join("_config.yml")).unwrap();
        assert_eq!(config.title, "Mine");
    }
}
