//! Readable-text extraction from HTML pages.

use regex::Regex;
use scraper::{Html, Node, Selector};
use std::sync::LazyLock;

/// Containers that usually hold the article body, most specific first.
const MAIN_SELECTORS: &[&str] = &[
    "main",
    "article",
    "[role='main']",
    "#content",
    "#main",
    ".post-content",
    ".entry-content",
    "body",
];

/// Elements whose text is never part of the readable content.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "form", "svg", "template",
    "iframe",
];

/// Elements that start a new line of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "section", "article", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6",
    "tr", "blockquote", "pre", "table", "dd", "dt",
];

static INLINE_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{a0}\r\f\v]+").expect("valid whitespace regex"));

/// Text pulled out of a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Contents of `<title>`, if any.
    pub title: Option<String>,
    /// Readable text, one block per line.
    pub text: String,
}

/// Extract the readable text of an HTML document.
#[must_use]
pub fn extract_readable(html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|selector| {
        document
            .select(&selector)
            .next()
            .map(|el| normalize_whitespace(&el.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    });

    let root = MAIN_SELECTORS.iter().find_map(|s| {
        let selector = Selector::parse(s).ok()?;
        document.select(&selector).next()
    });

    let mut raw = String::new();
    if let Some(root) = root {
        for node in root.descendants() {
            match node.value() {
                Node::Element(element) if BLOCK_ELEMENTS.contains(&element.name()) => {
                    raw.push('\n');
                }
                Node::Text(text) => {
                    let skipped = node.ancestors().any(|ancestor| {
                        ancestor
                            .value()
                            .as_element()
                            .is_some_and(|e| SKIPPED_ELEMENTS.contains(&e.name()))
                    });
                    if !skipped {
                        raw.push_str(text);
                        raw.push(' ');
                    }
                }
                _ => {}
            }
        }
    }

    ExtractedPage {
        title,
        text: normalize_whitespace(&raw),
    }
}

/// Collapse runs of spaces within lines and drop blank lines.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(|line| INLINE_WHITESPACE.replace_all(line, " ").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Truncate to at most `max_chars` characters, preferring to end on a line or
/// sentence boundary in the second half of the window.
#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text.to_string();
    };

    let window = &text[..cut];
    let half = window.len() / 2;

    let boundary = window
        .rfind('\n')
        .filter(|&i| i >= half)
        .or_else(|| window.rfind(". ").filter(|&i| i >= half).map(|i| i + 1));

    window[..boundary.unwrap_or(cut)].trim_end().to_string()
}
