//! utterances comment embed
//!
//! The widget lives under a fixed anchor element. Mounting it for a post
//! clears whatever was injected under the anchor and appends a fresh script
//! tag, so the comment thread always follows the current page path.

use crate::config::CommentsConfig;
use crate::helpers::{empty_element, html_escape};

/// A script tag injected under the anchor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptTag {
    pub attrs: Vec<(String, String)>,
}

impl ScriptTag {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn to_html(&self) -> String {
        let attrs: Vec<(&str, &str)> = self
            .attrs
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        empty_element("script", &attrs)
    }
}

/// The anchor element and what has been injected into it
#[derive(Debug, Clone)]
pub struct CommentsField {
    config: CommentsConfig,
    mounted_slug: Option<String>,
    children: Vec<ScriptTag>,
}

impl CommentsField {
    pub fn new(config: CommentsConfig) -> Self {
        Self {
            config,
            mounted_slug: None,
            children: Vec::new(),
        }
    }

    /// Mount the widget for a post
    ///
    /// Returns `true` when the anchor was cleared and a new script injected;
    /// mounting the slug that is already mounted changes nothing.
    pub fn mount(&mut self, slug: &str) -> bool {
        if !self.config.enable || self.mounted_slug.as_deref() == Some(slug) {
            return false;
        }

        self.children.clear();
        self.children.push(self.script());
        self.mounted_slug = Some(slug.to_string());
        tracing::debug!("Mounted comments for {}", slug);
        true
    }

    /// Injected children, oldest first
    pub fn children(&self) -> &[ScriptTag] {
        &self.children
    }

    pub fn mounted_slug(&self) -> Option<&str> {
        self.mounted_slug.as_deref()
    }

    /// The anchor element with its injected script; empty when disabled
    pub fn render_html(&self) -> String {
        if !self.config.enable {
            return String::new();
        }

        let scripts: String = self.children.iter().map(ScriptTag::to_html).collect();
        format!(
            r#"<div id="{}">{}</div>"#,
            html_escape(&self.config.anchor_id),
            scripts
        )
    }

    fn script(&self) -> ScriptTag {
        let attrs = [
            ("src", self.config.src.as_str()),
            ("crossorigin", "anonymous"),
            ("repo", self.config.repo.as_str()),
            ("issue-term", self.config.issue_term.as_str()),
            ("theme", self.config.theme.as_str()),
        ];
        ScriptTag {
            attrs: attrs
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// Render the embed for a single post page
pub fn embed_for(config: &CommentsConfig, slug: &str) -> String {
    let mut field = CommentsField::new(config.clone());
    field.mount(slug);
    field.render_html()
}
