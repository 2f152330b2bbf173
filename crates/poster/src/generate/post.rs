//! Post text generation.

use serde::Serialize;
use std::sync::Arc;

use crate::ai::{clean_model_text, AIMessage, AIProvider, GenerateOptions};
use crate::config::{OpenAIConfig, PostConfig};
use crate::error::UpstreamError;
use crate::research::ResearchResult;

use super::prompts::{PromptManager, POST_TEMPLATE, WRITER_SYSTEM_PROMPT};

/// Share of the window searched for a word boundary when truncating.
const BACKOFF_FRACTION: usize = 5;

#[derive(Serialize)]
struct PromptSource<'a> {
    /// 1-based, as shown to the model.
    number: usize,
    url: &'a str,
    title: Option<&'a str>,
    text: &'a str,
}

#[derive(Serialize)]
struct PostPromptData<'a> {
    topic: &'a str,
    max_length: usize,
    max_hashtags: usize,
    sources: Vec<PromptSource<'a>>,
}

/// Writes the post body with a text model.
pub struct PostWriter {
    provider: Arc<dyn AIProvider>,
    prompts: Arc<PromptManager>,
    openai: OpenAIConfig,
    post: PostConfig,
}

impl PostWriter {
    pub fn new(
        provider: Arc<dyn AIProvider>,
        prompts: Arc<PromptManager>,
        openai: OpenAIConfig,
        post: PostConfig,
    ) -> Self {
        Self {
            provider,
            prompts,
            openai,
            post,
        }
    }

    /// Generate a post of at most `max_length` characters.
    ///
    /// `max_length` must already be clamped.
    pub async fn write(
        &self,
        topic: &str,
        research: &ResearchResult,
        max_length: usize,
    ) -> Result<String, UpstreamError> {
        let data = PostPromptData {
            topic,
            max_length,
            max_hashtags: self.post.max_hashtags,
            sources: research
                .sources
                .iter()
                .enumerate()
                .map(|(i, s)| PromptSource {
                    number: i + 1,
                    url: &s.url,
                    title: s.title.as_deref(),
                    text: &s.text,
                })
                .collect(),
        };

        let prompt = self.prompts.render(POST_TEMPLATE, &data)?;
        let messages = vec![AIMessage::system(WRITER_SYSTEM_PROMPT), AIMessage::user(prompt)];
        let options = GenerateOptions {
            temperature: Some(self.openai.temperature),
            max_tokens: Some(self.openai.max_tokens),
            web_search: false,
        };

        tracing::debug!(
            provider = self.provider.name(),
            model = %self.openai.model,
            sources = research.sources.len(),
            "Requesting post body"
        );

        let response = self
            .provider
            .generate_text(&self.openai.model, &messages, &options)
            .await?;

        let body = clean_model_text(&response.text);
        if body.is_empty() {
            return Err(UpstreamError::InvalidResponse {
                service: "OpenAI",
                reason: "model returned an empty post".to_string(),
            });
        }

        let generated_chars = body.chars().count();
        let body = truncate_post(&body, max_length);

        tracing::info!(
            model = %response.model,
            tokens = response.usage.total_tokens,
            generated_chars,
            final_chars = body.chars().count(),
            "Post body generated"
        );

        Ok(body)
    }
}

/// Truncate a post to at most `max_length` characters.
///
/// Backs off to the last whitespace if one lies in the final fifth of the
/// window, so words are not cut in half.
#[must_use]
pub fn truncate_post(text: &str, max_length: usize) -> String {
    let Some((cut, _)) = text.char_indices().nth(max_length) else {
        return text.to_string();
    };

    let window = &text[..cut];
    if text[cut..].starts_with(char::is_whitespace) {
        return window.trim_end().to_string();
    }

    let floor = max_length - max_length / BACKOFF_FRACTION;
    let boundary = window
        .char_indices()
        .rev()
        .take_while(|(_, c)| !c.is_whitespace())
        .last()
        .map(|(i, _)| i)
        .filter(|&i| i > 0 && window[..i].chars().count() > floor);

    let truncated = match boundary {
        Some(i) => &window[..i],
        None => window,
    };

    truncated.trim_end().to_string()
}
