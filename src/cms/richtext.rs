//! Structured rich text as delivered by the API, with text and HTML conversion
//!
//! Every piece of text and every attribute is escaped on the way out, so the
//! resulting HTML can be injected into a page as-is.

use serde::{Deserialize, Serialize};

use crate::helpers::{html_escape, image_tag, safe_href};

/// An ordered sequence of rich-text blocks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText(pub Vec<RichTextBlock>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub block_type: String,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Image blocks only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Image blocks only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

impl RichTextBlock {
    pub fn paragraph(text: &str) -> Self {
        Self {
            block_type: "paragraph".to_string(),
            text: text.to_string(),
            spans: Vec::new(),
            url: None,
            alt: None,
        }
    }
}

/// Inline formatting over a character range of a block's text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,

    #[serde(rename = "type")]
    pub span_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub target: Option<String>,

    /// Label spans carry their class name here
    #[serde(default)]
    pub label: Option<String>,
}

impl RichText {
    pub fn blocks(&self) -> &[RichTextBlock] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Plain text, blocks joined by a single space
    pub fn as_text(&self) -> String {
        self.0
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Escaped HTML
    pub fn as_html(&self) -> String {
        let mut html = String::new();
        let mut open_list: Option<&'static str> = None;

        for block in &self.0 {
            let list = match block.block_type.as_str() {
                "list-item" => Some("ul"),
                "o-list-item" => Some("ol"),
                _ => None,
            };

            if open_list != list {
                if let Some(tag) = open_list {
                    html.push_str(&format!("</{}>", tag));
                }
                if let Some(tag) = list {
                    html.push_str(&format!("<{}>", tag));
                }
                open_list = list;
            }

            html.push_str(&render_block(block));
        }

        if let Some(tag) = open_list {
            html.push_str(&format!("</{}>", tag));
        }

        html
    }
}

fn render_block(block: &RichTextBlock) -> String {
    let inner = || render_spans(&block.text, &block.spans);

    match block.block_type.as_str() {
        "heading1" => format!("<h1>{}</h1>", inner()),
        "heading2" => format!("<h2>{}</h2>", inner()),
        "heading3" => format!("<h3>{}</h3>", inner()),
        "heading4" => format!("<h4>{}</h4>", inner()),
        "heading5" => format!("<h5>{}</h5>", inner()),
        "heading6" => format!("<h6>{}</h6>", inner()),
        "preformatted" => format!("<pre>{}</pre>", html_escape(&block.text)),
        "list-item" | "o-list-item" => format!("<li>{}</li>", inner()),
        "image" => match &block.url {
            Some(url) => format!(
                r#"<p class="block-img">{}</p>"#,
                image_tag(url, block.alt.as_deref())
            ),
            None => String::new(),
        },
        // Embeds carry provider HTML that is not ours to inject
        "embed" => String::new(),
        _ => format!("<p>{}</p>", inner()),
    }
}

/// Render text with its spans applied; overlapping spans are split per segment
fn render_spans(text: &str, spans: &[Span]) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    let mut bounds = vec![0, len];
    for span in spans {
        bounds.push(span.start.min(len));
        bounds.push(span.end.min(len));
    }
    bounds.sort_unstable();
    bounds.dedup();

    let mut out = String::new();
    for window in bounds.windows(2) {
        let (from, to) = (window[0], window[1]);
        if from >= to {
            continue;
        }

        let segment: String = chars[from..to].iter().collect();
        let mut inner = html_escape(&segment).replace('\n', "<br />");

        let active: Vec<&Span> = spans
            .iter()
            .filter(|s| s.start <= from && s.end >= to)
            .collect();
        for span in active.iter().rev() {
            inner = wrap_span(span, inner);
        }

        out.push_str(&inner);
    }

    out
}

fn wrap_span(span: &Span, inner: String) -> String {
    match span.span_type.as_str() {
        "strong" => format!("<strong>{}</strong>", inner),
        "em" => format!("<em>{}</em>", inner),
        "hyperlink" => {
            let data = span.data.as_ref();
            let href = data
                .and_then(|d| d.url.as_deref())
                .map(safe_href)
                .unwrap_or_else(|| "#".to_string());
            let target = match data.and_then(|d| d.target.as_deref()) {
                Some(target) => format!(
                    r#" target="{}" rel="noopener noreferrer""#,
                    html_escape(target)
                ),
                None => String::new(),
            };
            format!(r#"<a href="{}"{}>{}</a>"#, html_escape(&href), target, inner)
        }
        "label" => {
            let class = span
                .data
                .as_ref()
                .and_then(|d| d.label.as_deref())
                .unwrap_or("");
            format!(r#"<span class="{}">{}</span>"#, html_escape(class), inner)
        }
        _ => inner,
    }
}
