//! Generic web search on the post topic.

use async_trait::async_trait;
use std::sync::Arc;

use crate::ai::{clean_model_text, AIMessage, AIProvider, GenerateOptions};
use crate::error::UpstreamError;

/// Pseudo-URL recorded for web search sources.
pub const WEB_SEARCH_SOURCE: &str = "web-search";

/// Searches the web and returns a digest of findings.
#[async_trait]
pub trait WebSearcher: Send + Sync {
    async fn search(&self, topic: &str) -> Result<String, UpstreamError>;
}

/// Web search through a search-capable chat model.
pub struct ModelWebSearcher {
    provider: Arc<dyn AIProvider>,
    model: String,
}

impl ModelWebSearcher {
    pub fn new(provider: Arc<dyn AIProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }
}

#[async_trait]
impl WebSearcher for ModelWebSearcher {
    async fn search(&self, topic: &str) -> Result<String, UpstreamError> {
        let messages = vec![
            AIMessage::system(SEARCH_INSTRUCTIONS),
            AIMessage::user(format!("Topic: {topic}")),
        ];

        let options = GenerateOptions {
            web_search: true,
            ..Default::default()
        };

        let response = self
            .provider
            .generate_text(&self.model, &messages, &options)
            .await?;

        let text = clean_model_text(&response.text);
        if text.is_empty() {
            return Err(UpstreamError::InvalidResponse {
                service: "OpenAI",
                reason: "web search returned no text".to_string(),
            });
        }

        tracing::debug!(
            model = %response.model,
            tokens = response.usage.total_tokens,
            "Web search complete"
        );

        Ok(text)
    }
}

const SEARCH_INSTRUCTIONS: &str = "You are a research analyst gathering material for a LinkedIn post. \
Search the web for recent, authoritative information on the topic. \
Return up to 8 short factual bullet points, each ending with the full source URL in parentheses, \
followed by a summary of at most 120 words. Never invent numbers or dates.";
