//! Link research.
//!
//! Fetches each requested link once, extracts readable text and bounds it.
//! A failing link is skipped and reported; it never aborts the request.

mod extract;
mod fetcher;
mod search;

pub use extract::{extract_readable, normalize_whitespace, truncate_text, ExtractedPage};
pub use fetcher::{FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use search::{ModelWebSearcher, WebSearcher, WEB_SEARCH_SOURCE};

use serde::Serialize;
use std::sync::Arc;
use url::Url;

use crate::config::ResearchConfig;

/// Text gathered from one source.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchSource {
    /// Source URL (or [`WEB_SEARCH_SOURCE`]).
    pub url: String,
    /// Page title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Extracted, truncated text.
    #[serde(skip)]
    pub text: String,
}

/// A source that could not be used.
#[derive(Debug, Clone, Serialize)]
pub struct ResearchFailure {
    pub url: String,
    pub reason: String,
}

/// Outcome of the research stage.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResearchResult {
    /// Usable sources, in request order.
    pub sources: Vec<ResearchSource>,
    /// Sources that failed, in request order.
    pub failures: Vec<ResearchFailure>,
}

impl ResearchResult {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Gathers research context for a post.
pub struct Researcher {
    fetcher: Arc<dyn PageFetcher>,
    searcher: Option<Arc<dyn WebSearcher>>,
    config: ResearchConfig,
}

impl Researcher {
    /// Create a researcher that only fetches the given links.
    pub fn new(fetcher: Arc<dyn PageFetcher>, config: ResearchConfig) -> Self {
        Self {
            fetcher,
            searcher: None,
            config,
        }
    }

    /// Also run a web search on the topic.
    #[must_use]
    pub fn with_searcher(mut self, searcher: Arc<dyn WebSearcher>) -> Self {
        self.searcher = Some(searcher);
        self
    }

    /// Research a topic from its links (and optionally the web).
    pub async fn research(&self, topic: &str, links: &[Url]) -> ResearchResult {
        let mut result = ResearchResult::default();

        for (index, url) in links.iter().enumerate() {
            if index >= self.config.max_links {
                tracing::warn!(url = %url, max_links = self.config.max_links, "Skipping link over limit");
                result.failures.push(ResearchFailure {
                    url: url.to_string(),
                    reason: format!("link limit of {} exceeded", self.config.max_links),
                });
                continue;
            }

            match self.fetcher.fetch(url).await {
                Ok(page) => {
                    let text = truncate_text(&page.text, self.config.max_chars);
                    tracing::info!(url = %url, chars = text.chars().count(), "Fetched research link");
                    result.sources.push(ResearchSource {
                        url: url.to_string(),
                        title: page.title,
                        text,
                    });
                }
                Err(e) => {
                    tracing::warn!(url = %url, error = %e, "Failed to fetch research link");
                    result.failures.push(ResearchFailure {
                        url: url.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if let Some(searcher) = &self.searcher {
            match searcher.search(topic).await {
                Ok(text) => {
                    tracing::info!("Web search added to research");
                    result.sources.push(ResearchSource {
                        url: WEB_SEARCH_SOURCE.to_string(),
                        title: Some(format!("Web search: {topic}")),
                        text: truncate_text(&text, self.config.max_chars),
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Web search failed");
                    result.failures.push(ResearchFailure {
                        url: WEB_SEARCH_SOURCE.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        result
    }
}
